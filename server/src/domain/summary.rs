//! Trace index derived from raw spans

use std::collections::HashMap;

use crate::data::types::{Span, Timestamp, TraceSummary};

/// One summary per trace id, newest start first (ties by trace id).
///
/// The root name is taken from the earliest-starting span; session and
/// conversation ids from the last span that carries them.
pub fn summarize_traces(spans: &[Span]) -> Vec<TraceSummary> {
    let mut slots: HashMap<&str, usize> = HashMap::new();
    let mut summaries: Vec<TraceSummary> = Vec::new();

    for span in spans {
        let bounds = span.bounds();
        let start = bounds.map(|(s, _)| Timestamp::from_datetime(s)).unwrap_or_default();
        let end = bounds.map(|(_, e)| Timestamp::from_datetime(e)).unwrap_or_default();

        let slot = match slots.get(span.trace_id.as_str()) {
            Some(&slot) => {
                let summary = &mut summaries[slot];
                summary.span_count += 1;
                if start.is_parsed() && (!summary.start_time.is_parsed() || start < summary.start_time) {
                    summary.start_time = start;
                    summary.root_span_name = span.name.clone();
                }
                if end > summary.end_time {
                    summary.end_time = end;
                }
                slot
            }
            None => {
                slots.insert(span.trace_id.as_str(), summaries.len());
                summaries.push(TraceSummary::new(
                    span.trace_id.clone(),
                    span.name.clone(),
                    start,
                    end,
                ));
                summaries.len() - 1
            }
        };

        let summary = &mut summaries[slot];
        if let Some(session_id) = span.attributes.session_id() {
            summary.session_id = Some(session_id.to_string());
        }
        if let Some(conversation_id) = span.attributes.conversation_id() {
            summary.conversation_id = Some(conversation_id.to_string());
        }
    }

    summaries.sort_by(|a, b| {
        b.start_time
            .cmp(&a.start_time)
            .then_with(|| a.trace_id.cmp(&b.trace_id))
    });
    summaries
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_span(trace: &str, id: &str, name: &str, start: i64, end: i64) -> Span {
        Span::new(trace, id, name).with_times(Timestamp::from_millis(start), Timestamp::from_millis(end))
    }

    #[test]
    fn test_empty() {
        assert!(summarize_traces(&[]).is_empty());
    }

    #[test]
    fn test_bounds_and_root_name() {
        let spans = vec![
            make_span("t1", "b", "provider.call", 20, 80),
            make_span("t1", "a", "chat.send_message", 10, 50),
            make_span("t1", "c", "storage.save", 60, 120),
        ];
        let traces = summarize_traces(&spans);
        assert_eq!(traces.len(), 1);
        let t = &traces[0];
        assert_eq!(t.root_span_name, "chat.send_message");
        assert_eq!(t.start_time, Timestamp::from_millis(10));
        assert_eq!(t.end_time, Timestamp::from_millis(120));
        assert_eq!(t.span_count, 3);
        assert_eq!(t.duration_ms(), 110.0);
    }

    #[test]
    fn test_root_name_tie_keeps_first() {
        let spans = vec![
            make_span("t1", "a", "first", 10, 20),
            make_span("t1", "b", "second", 10, 30),
        ];
        assert_eq!(summarize_traces(&spans)[0].root_span_name, "first");
    }

    #[test]
    fn test_session_and_conversation_last_wins() {
        let spans = vec![
            make_span("t1", "a", "x", 0, 1).with_attribute("session.id", "s-old"),
            make_span("t1", "b", "y", 1, 2)
                .with_attribute("session.id", "s-new")
                .with_attribute("conversation.id", "c-1"),
            make_span("t1", "c", "z", 2, 3),
        ];
        let t = &summarize_traces(&spans)[0];
        assert_eq!(t.session_id.as_deref(), Some("s-new"));
        assert_eq!(t.conversation_id.as_deref(), Some("c-1"));
    }

    #[test]
    fn test_sorted_newest_first_with_id_tiebreak() {
        let spans = vec![
            make_span("old", "a", "x", 0, 1),
            make_span("new-b", "b", "x", 100, 101),
            make_span("new-a", "c", "x", 100, 101),
        ];
        let ids: Vec<String> = summarize_traces(&spans)
            .into_iter()
            .map(|t| t.trace_id)
            .collect();
        assert_eq!(ids, vec!["new-a", "new-b", "old"]);
    }

    #[test]
    fn test_unparsed_span_does_not_take_root_name() {
        let spans = vec![
            Span::new("t1", "ghost", "ghost"),
            make_span("t1", "real", "real", 5, 10),
        ];
        let t = &summarize_traces(&spans)[0];
        assert_eq!(t.root_span_name, "real");
        assert_eq!(t.start_time, Timestamp::from_millis(5));
        assert_eq!(t.span_count, 2);
    }
}
