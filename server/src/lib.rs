//! TraceScope: trace analytics for LLM agent runs
//!
//! - `domain` - pure analytics engine (tree, timeline, metrics, filters, sessions)
//! - `data` - span types and trace sources (HTTP upstream, JSON fixture)
//! - `api` - axum query API
//! - `core` - configuration, CLI, shutdown

pub mod api;
pub mod app;
pub mod core;
pub mod data;
pub mod domain;
pub mod utils;
