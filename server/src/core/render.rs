//! Terminal output for CLI commands

use anyhow::{Context, Result};
use serde::Serialize;

use crate::domain::{TimelineLayout, TimelineOptions};
use crate::utils::time::format_duration_ms;

/// Narrowest chart that still leaves room for labels and bars
pub const MIN_TEXT_TIMELINE_WIDTH: usize = 40;

/// Label column never exceeds this many characters
const MAX_LABEL_COLUMNS: usize = 40;

/// Room reserved right of the track for the duration label
const DURATION_COLUMNS: usize = 10;

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}

/// Layout options in character cells for a chart `width` columns wide
pub fn text_timeline_options(width: usize) -> TimelineOptions {
    let width = width.max(MIN_TEXT_TIMELINE_WIDTH);
    let label = (width / 3).min(MAX_LABEL_COLUMNS);
    TimelineOptions {
        viewport_width: (width - DURATION_COLUMNS) as f64,
        label_width: label as f64,
        min_bar_width: 1.0,
        row_height: 1.0,
        indent_per_depth: 2.0,
        max_ticks: 5,
    }
}

/// Gantt chart: label column, bar track, duration. Failed spans use a lighter bar.
pub fn render_text_timeline(layout: &TimelineLayout, options: &TimelineOptions) -> String {
    let label_cols = options.label_width as usize;
    let track_cols = (layout.track_width.round() as usize).max(1);
    let mut out = String::new();

    out.push_str(&pad(&String::new(), label_cols));
    out.push_str(&axis_line(layout, track_cols));
    out.push('\n');

    for row in &layout.rows {
        let marker = match (row.has_children, row.collapsed) {
            (true, true) => "+ ",
            (true, false) => "- ",
            _ => "  ",
        };
        let label = format!(
            "{}{}{}",
            " ".repeat(row.indent as usize),
            marker,
            row.name
        );
        out.push_str(&pad(&label, label_cols));

        let fill = if row.status_code.is_failure() { '░' } else { '█' };
        let start = (row.left.round() as usize).min(track_cols - 1);
        let len = (row.width.round() as usize).max(1);
        let end = (start + len).min(track_cols);
        let mut track = vec![' '; track_cols];
        for cell in &mut track[start..end] {
            *cell = fill;
        }
        out.extend(track);

        out.push(' ');
        out.push_str(&format_duration_ms(row.duration_ms));
        if row.status_code.is_failure() {
            out.push_str(&format!(" [{}]", row.status_code));
        }
        out.push('\n');
    }

    out.push_str(&format!(
        "{} spans, total {}\n",
        layout.span_count,
        format_duration_ms(layout.total_duration_ms)
    ));
    out
}

/// Tick labels placed at their x offsets, skipping any that would overlap
fn axis_line(layout: &TimelineLayout, track_cols: usize) -> String {
    let mut line = vec![' '; track_cols + DURATION_COLUMNS];
    let mut next_free = 0;
    for tick in &layout.ticks {
        let col = tick.x.round() as usize;
        let label: Vec<char> = format!("|{}", tick.label).chars().collect();
        if col < next_free || col + label.len() > line.len() {
            continue;
        }
        line[col..col + label.len()].copy_from_slice(&label);
        next_free = col + label.len() + 1;
    }
    line.into_iter().collect::<String>().trim_end().to_string()
}

/// Truncate or right-pad to exactly `cols` characters, keeping one gap column
fn pad(text: &str, cols: usize) -> String {
    let keep = cols.saturating_sub(1);
    let mut out: String = text.chars().take(keep).collect();
    let used = out.chars().count();
    out.push_str(&" ".repeat(cols - used));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::types::{Span, StatusCode, Timestamp};
    use crate::domain::timeline::{CollapsedSet, layout};
    use crate::domain::tree::build_span_tree;

    fn sample_layout(width: usize, collapsed: &CollapsedSet) -> (TimelineLayout, TimelineOptions) {
        let spans = vec![
            Span::new("t", "root", "agent.run")
                .with_times(Timestamp::from_millis(0), Timestamp::from_millis(1_000)),
            Span::new("t", "call", "provider.call")
                .with_parent("root")
                .with_times(Timestamp::from_millis(500), Timestamp::from_millis(1_000))
                .with_status(StatusCode::Error),
        ];
        let forest = build_span_tree(&spans);
        let options = text_timeline_options(width);
        (layout(&forest, collapsed, &options), options)
    }

    #[test]
    fn test_options_clamp_narrow_width() {
        let options = text_timeline_options(10);
        assert_eq!(options.viewport_width, (MIN_TEXT_TIMELINE_WIDTH - DURATION_COLUMNS) as f64);
        assert_eq!(options.label_width, 13.0);
    }

    #[test]
    fn test_render_rows_and_bars() {
        let (layout, options) = sample_layout(100, &CollapsedSet::new());
        let text = render_text_timeline(&layout, &options);
        let lines: Vec<&str> = text.lines().collect();

        // axis, two rows, footer
        assert_eq!(lines.len(), 4);
        assert!(lines[0].contains("|0ms"));
        assert!(lines[1].starts_with("- agent.run"));
        assert!(lines[2].starts_with("    provider.call"));
        assert!(lines[2].ends_with("[ERROR]"));
        assert_eq!(lines[3], "2 spans, total 1s");

        let label_cols = options.label_width as usize;
        let root_bar: String = lines[1].chars().skip(label_cols).take_while(|c| *c == '█').collect();
        assert_eq!(root_bar.chars().count(), layout.track_width.round() as usize);

        // child starts halfway along the track
        let child_track: Vec<char> = lines[2].chars().skip(label_cols).collect();
        let first_fill = child_track.iter().position(|c| *c == '░').unwrap();
        assert_eq!(first_fill, (layout.track_width / 2.0).round() as usize);
    }

    #[test]
    fn test_render_collapsed() {
        let collapsed: CollapsedSet = ["root".to_string()].into_iter().collect();
        let (layout, options) = sample_layout(80, &collapsed);
        let text = render_text_timeline(&layout, &options);
        assert_eq!(text.lines().count(), 3);
        assert!(text.lines().nth(1).unwrap().starts_with("+ agent.run"));
    }
}
