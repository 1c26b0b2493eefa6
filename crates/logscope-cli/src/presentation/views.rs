use super::paint;
use logscope_types::{
    CorrelationTag, CorrelationTagKind, FrameSummary, RecurringErrorRecord, StackFrame,
};
use owo_colors::OwoColorize;
use std::fmt;

const SAMPLE_WIDTH: usize = 80;

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max.saturating_sub(1)).collect();
    format!("{}…", cut)
}

pub struct RecurringView<'a> {
    records: &'a [&'a RecurringErrorRecord],
    min_sessions: usize,
}

impl<'a> RecurringView<'a> {
    pub fn new(records: &'a [&'a RecurringErrorRecord], min_sessions: usize) -> Self {
        Self {
            records,
            min_sessions,
        }
    }
}

impl fmt::Display for RecurringView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.records.is_empty() {
            return writeln!(
                f,
                "No errors recur in {} or more sessions",
                self.min_sessions
            );
        }
        writeln!(f, "{:<8}  {:>8}  {:>11}  SAMPLE", "HASH", "SESSIONS", "OCCURRENCES")?;
        for record in self.records {
            writeln!(
                f,
                "{:<8}  {:>8}  {:>11}  {}",
                record.hash.as_str(),
                record.session_count,
                record.total_occurrences,
                truncate(&record.sample, SAMPLE_WIDTH)
            )?;
        }
        Ok(())
    }
}

pub struct FramesView<'a> {
    frames: &'a [StackFrame],
    summary: FrameSummary,
    color: bool,
}

impl<'a> FramesView<'a> {
    pub fn new(frames: &'a [StackFrame], summary: FrameSummary, color: bool) -> Self {
        Self {
            frames,
            summary,
            color,
        }
    }
}

impl fmt::Display for FramesView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for frame in self.frames {
            if frame.is_app {
                let marker = paint("app", self.color, |t| t.green().to_string());
                writeln!(f, "[{}] {}", marker, frame.text)?;
            } else {
                let line = format!("[fw ] {}", frame.text);
                writeln!(f, "{}", paint(&line, self.color, |t| t.dimmed().to_string()))?;
            }
        }
        writeln!(f, "{}", self.summary)
    }
}

pub struct TagsView<'a> {
    session: &'a str,
    tags: &'a [CorrelationTag],
}

impl<'a> TagsView<'a> {
    pub fn new(session: &'a str, tags: &'a [CorrelationTag]) -> Self {
        Self { session, tags }
    }
}

impl fmt::Display for TagsView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.tags.is_empty() {
            return writeln!(f, "{}: no correlation tags", self.session);
        }
        writeln!(f, "{}:", self.session)?;
        for tag in self.tags {
            let kind = match tag.kind {
                CorrelationTagKind::File => "file",
                CorrelationTagKind::Error => "error",
            };
            writeln!(f, "  {:<5}  {}  ({})", kind, tag.value, tag.count)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logscope_types::{ErrorFingerprint, TimelinePoint};

    #[test]
    fn test_recurring_view() {
        let record = RecurringErrorRecord {
            hash: ErrorFingerprint::new("1a2b3c4d"),
            session_count: 2,
            total_occurrences: 3,
            first_seen: "a.log".into(),
            last_seen: "b.log".into(),
            timeline: vec![
                TimelinePoint {
                    session: "a.log".into(),
                    count: 2,
                },
                TimelinePoint {
                    session: "b.log".into(),
                    count: 1,
                },
            ],
            sample: "StateError: Bad state".into(),
        };
        let records = vec![&record];
        insta::assert_snapshot!(RecurringView::new(&records, 2).to_string(), @r"
        HASH      SESSIONS  OCCURRENCES  SAMPLE
        1a2b3c4d         2            3  StateError: Bad state
        ");

        let empty: Vec<&RecurringErrorRecord> = vec![];
        assert_eq!(
            RecurringView::new(&empty, 3).to_string(),
            "No errors recur in 3 or more sessions\n"
        );
    }

    #[test]
    fn test_frames_view_plain() {
        let frames = vec![
            StackFrame {
                text: "#0 main (lib/main.dart:3:5)".into(),
                is_app: true,
                source_ref: None,
            },
            StackFrame {
                text: "#1 dart:async/zone.dart".into(),
                is_app: false,
                source_ref: None,
            },
        ];
        let summary = FrameSummary::from_frames(&frames);
        insta::assert_snapshot!(FramesView::new(&frames, summary, false).to_string(), @r"
        [app] #0 main (lib/main.dart:3:5)
        [fw ] #1 dart:async/zone.dart
        2 frames (1 app, 1 framework)
        ");
    }
}
