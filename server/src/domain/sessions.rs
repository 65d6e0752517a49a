//! Session grouping of trace summaries

use std::collections::HashMap;

use serde::Serialize;

use crate::data::types::{SessionSummary, Timestamp, TraceSummary};
use crate::utils::string::{PREVIEW_MAX_LENGTH, non_empty, truncate_preview};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraceSessionSummary {
    pub session_id: String,
    pub title: Option<String>,
    pub first_trace_at: Timestamp,
    pub last_trace_at: Timestamp,
    pub trace_count: usize,
    pub span_count: u64,
    pub total_duration_ms: f64,
    pub message_count: Option<u64>,
    pub trace_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionGrouping {
    pub sessions: Vec<TraceSessionSummary>,
    /// Traces without a session id, in input order
    pub ungrouped: Vec<String>,
}

/// Group traces by session id and label each group from `sessions`.
///
/// Groups are ordered by most recent trace first, then session id.
pub fn group_by_session(traces: &[TraceSummary], sessions: &[SessionSummary]) -> SessionGrouping {
    let labels: HashMap<&str, &SessionSummary> = sessions
        .iter()
        .map(|s| (s.session_id.as_str(), s))
        .collect();

    let mut slots: HashMap<&str, usize> = HashMap::new();
    let mut grouping = SessionGrouping::default();

    for trace in traces {
        let Some(session_id) = non_empty(trace.session_id.as_deref()) else {
            grouping.ungrouped.push(trace.trace_id.clone());
            continue;
        };

        let slot = *slots.entry(session_id).or_insert_with(|| {
            let label = labels.get(session_id).copied();
            grouping.sessions.push(TraceSessionSummary {
                session_id: session_id.to_string(),
                title: label.and_then(session_title),
                first_trace_at: trace.start_time,
                last_trace_at: trace.start_time,
                trace_count: 0,
                span_count: 0,
                total_duration_ms: 0.0,
                message_count: label.map(|l| l.message_count),
                trace_ids: Vec::new(),
            });
            grouping.sessions.len() - 1
        });

        let group = &mut grouping.sessions[slot];
        group.trace_count += 1;
        group.span_count += trace.span_count;
        group.total_duration_ms += trace.duration_ms();
        group.trace_ids.push(trace.trace_id.clone());
        if trace.start_time.is_parsed()
            && (!group.first_trace_at.is_parsed() || trace.start_time < group.first_trace_at)
        {
            group.first_trace_at = trace.start_time;
        }
        if trace.start_time > group.last_trace_at {
            group.last_trace_at = trace.start_time;
        }
    }

    grouping.sessions.sort_by(|a, b| {
        b.last_trace_at
            .cmp(&a.last_trace_at)
            .then_with(|| a.session_id.cmp(&b.session_id))
    });

    tracing::debug!(
        sessions = grouping.sessions.len(),
        ungrouped = grouping.ungrouped.len(),
        "Grouped traces by session"
    );
    grouping
}

/// Explicit title, else a preview of the first message
fn session_title(label: &SessionSummary) -> Option<String> {
    non_empty(label.title.as_deref())
        .map(str::to_string)
        .or_else(|| {
            non_empty(label.first_message.as_deref())
                .map(|m| truncate_preview(m, PREVIEW_MAX_LENGTH))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_trace(id: &str, session: Option<&str>, start: i64, duration: i64) -> TraceSummary {
        let trace = TraceSummary::new(
            id,
            "chat.send_message",
            Timestamp::from_millis(start),
            Timestamp::from_millis(start + duration),
        )
        .with_span_count(2);
        match session {
            Some(s) => trace.with_session(s),
            None => trace,
        }
    }

    fn make_label(id: &str, title: Option<&str>, first_message: Option<&str>) -> SessionSummary {
        SessionSummary {
            session_id: id.to_string(),
            title: title.map(str::to_string),
            first_message: first_message.map(str::to_string),
            created_at: Timestamp::from_millis(0),
            message_count: 4,
        }
    }

    #[test]
    fn test_groups_and_ungrouped() {
        let traces = vec![
            make_trace("t1", Some("s1"), 1_000, 100),
            make_trace("t2", None, 2_000, 100),
            make_trace("t3", Some("s2"), 5_000, 100),
            make_trace("t4", Some("s1"), 9_000, 300),
            make_trace("t5", Some(""), 3_000, 100),
        ];
        let grouping = group_by_session(&traces, &[]);

        assert_eq!(grouping.ungrouped, vec!["t2", "t5"]);
        let ids: Vec<&str> = grouping.sessions.iter().map(|s| s.session_id.as_str()).collect();
        assert_eq!(ids, vec!["s1", "s2"]);

        let s1 = &grouping.sessions[0];
        assert_eq!(s1.trace_count, 2);
        assert_eq!(s1.span_count, 4);
        assert_eq!(s1.total_duration_ms, 400.0);
        assert_eq!(s1.first_trace_at, Timestamp::from_millis(1_000));
        assert_eq!(s1.last_trace_at, Timestamp::from_millis(9_000));
        assert_eq!(s1.trace_ids, vec!["t1", "t4"]);
        assert_eq!(s1.title, None);
        assert_eq!(s1.message_count, None);
    }

    #[test]
    fn test_title_resolution() {
        let long = "x".repeat(80);
        let traces = vec![
            make_trace("t1", Some("titled"), 0, 1),
            make_trace("t2", Some("untitled"), 0, 1),
            make_trace("t3", Some("blank"), 0, 1),
        ];
        let labels = vec![
            make_label("titled", Some("Trip planning"), Some("hello")),
            make_label("untitled", Some("  "), Some(&long)),
            make_label("blank", None, None),
        ];
        let grouping = group_by_session(&traces, &labels);
        let title_of = |id: &str| {
            grouping
                .sessions
                .iter()
                .find(|s| s.session_id == id)
                .and_then(|s| s.title.clone())
        };

        assert_eq!(title_of("titled").as_deref(), Some("Trip planning"));
        assert_eq!(title_of("untitled"), Some(format!("{}...", "x".repeat(60))));
        assert_eq!(title_of("blank"), None);
        assert_eq!(grouping.sessions[0].message_count, Some(4));
    }

    #[test]
    fn test_ties_ordered_by_session_id() {
        let traces = vec![
            make_trace("t1", Some("b"), 100, 1),
            make_trace("t2", Some("a"), 100, 1),
        ];
        let ids: Vec<String> = group_by_session(&traces, &[])
            .sessions
            .into_iter()
            .map(|s| s.session_id)
            .collect();
        assert_eq!(ids, vec!["a", "b"]);
    }
}
