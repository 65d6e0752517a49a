//! Span attribute bag with typed, total accessors
//!
//! Attributes are an open, ordered mapping from string keys to arbitrary JSON
//! values. Lookups never panic and never coerce: a string `"42"` is not a number.

use serde::{Deserialize, Serialize};
use serde_json::{Map as JsonMap, Value as JsonValue};

/// Well-known attribute keys, grouped by namespace
pub mod keys {
    // model.*
    pub const MODEL_NAME: &str = "model.name";
    pub const GEN_AI_REQUEST_MODEL: &str = "gen_ai.request.model";
    pub const GEN_AI_RESPONSE_MODEL: &str = "gen_ai.response.model";
    pub const LLM_MODEL: &str = "llm.model";

    // session.* / conversation.*
    pub const SESSION_ID: &str = "session.id";
    pub const CONVERSATION_ID: &str = "conversation.id";

    /// Model identifier keys, in priority order
    pub const MODEL_KEYS: &[&str] = &[
        MODEL_NAME,
        GEN_AI_REQUEST_MODEL,
        GEN_AI_RESPONSE_MODEL,
        LLM_MODEL,
    ];

    /// Token-count keys, in priority order (total first, completion last)
    pub const TOKEN_KEYS: &[&str] = &[
        "llm.usage.total_tokens",
        "gen_ai.usage.total_tokens",
        "tokens",
        "llm.usage.completion_tokens",
        "gen_ai.usage.output_tokens",
    ];
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Attributes(JsonMap<String, JsonValue>);

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<JsonValue>) {
        self.0.insert(key.into(), value.into());
    }

    /// String value; other JSON types yield `None`
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(JsonValue::as_str)
    }

    /// Numeric value; strings are not parsed
    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.0
            .get(key)
            .and_then(JsonValue::as_f64)
            .filter(|v| v.is_finite())
    }

    /// First non-empty string among `keys`
    pub fn first_str(&self, keys: &[&str]) -> Option<&str> {
        keys.iter()
            .filter_map(|k| self.get_str(k))
            .map(str::trim)
            .find(|s| !s.is_empty())
    }

    /// First numeric value among `keys`; non-numeric entries are skipped
    pub fn first_f64(&self, keys: &[&str]) -> Option<f64> {
        keys.iter().find_map(|k| self.get_f64(k))
    }

    pub fn model(&self) -> Option<&str> {
        self.first_str(keys::MODEL_KEYS)
    }

    pub fn session_id(&self) -> Option<&str> {
        self.first_str(&[keys::SESSION_ID])
    }

    pub fn conversation_id(&self) -> Option<&str> {
        self.first_str(&[keys::CONVERSATION_ID])
    }

    /// Token count from the first numeric key in [`keys::TOKEN_KEYS`]
    pub fn token_count(&self) -> Option<f64> {
        self.first_f64(keys::TOKEN_KEYS).filter(|v| *v >= 0.0)
    }

    /// String-valued entries only, in insertion order
    pub fn string_values(&self) -> impl Iterator<Item = &str> {
        self.0.values().filter_map(JsonValue::as_str)
    }
}

impl FromIterator<(String, JsonValue)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (String, JsonValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
