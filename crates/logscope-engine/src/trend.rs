use crate::fragment::{Fragment, FragmentKind};
use logscope_types::TrendSection;
use std::fmt::Write;

pub const TREND_TITLE: &str = "Trend";

const BARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

// A trend needs at least two points to show a direction
const MIN_POINTS: usize = 2;

/// One bar per value, scaled to the largest value.
pub fn sparkline(values: &[usize]) -> String {
    let max = values.iter().copied().max().unwrap_or(0);
    values
        .iter()
        .map(|&v| {
            if max == 0 {
                return BARS[0];
            }
            let level = (v as f64 / max as f64 * (BARS.len() - 1) as f64).round() as usize;
            BARS[level.min(BARS.len() - 1)]
        })
        .collect()
}

/// Trend visualization for the finalization phase.
///
/// Fewer than two timeline points (including no history at all) renders an
/// explicit placeholder rather than an empty chart.
pub fn render_trend(trend: Option<&TrendSection>) -> Fragment {
    let points = trend.map(TrendSection::point_count).unwrap_or(0);
    let record = trend.and_then(|t| t.record.as_ref());

    let record = match record {
        Some(record) if points >= MIN_POINTS => record,
        _ => {
            let body = match points {
                0 => "No history: this error has not been seen in any session".to_string(),
                _ => "No history: seen in only one session".to_string(),
            };
            return Fragment::standalone(TREND_TITLE, FragmentKind::Empty, body);
        }
    };

    let counts: Vec<usize> = record.timeline.iter().map(|p| p.count).collect();
    let mut body = format!(
        "{}  {} sessions, {} occurrences",
        sparkline(&counts),
        record.session_count,
        record.total_occurrences
    );
    let width = record
        .timeline
        .iter()
        .map(|p| p.session.chars().count())
        .max()
        .unwrap_or(0);
    for point in &record.timeline {
        let _ = write!(body, "\n  {:<width$}  {}", point.session, point.count, width = width);
    }

    Fragment::standalone(TREND_TITLE, FragmentKind::Content, body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use logscope_types::{ErrorFingerprint, RecurringErrorRecord, TimelinePoint};

    fn trend(points: &[(&str, usize)]) -> TrendSection {
        let fingerprint = ErrorFingerprint::new("3fa2b9c1");
        if points.is_empty() {
            return TrendSection {
                fingerprint,
                record: None,
            };
        }
        let timeline: Vec<TimelinePoint> = points
            .iter()
            .map(|(session, count)| TimelinePoint {
                session: session.to_string(),
                count: *count,
            })
            .collect();
        TrendSection {
            fingerprint: fingerprint.clone(),
            record: Some(RecurringErrorRecord {
                hash: fingerprint,
                session_count: timeline.len(),
                total_occurrences: timeline.iter().map(|p| p.count).sum(),
                first_seen: timeline[0].session.clone(),
                last_seen: timeline[timeline.len() - 1].session.clone(),
                timeline,
                sample: String::new(),
            }),
        }
    }

    #[test]
    fn test_sparkline_scales_to_max() {
        assert_eq!(sparkline(&[1, 4, 8]), "▂▅█");
        assert_eq!(sparkline(&[0, 0]), "▁▁");
        assert_eq!(sparkline(&[]), "");
    }

    #[test]
    fn test_trend_with_history() {
        let section = trend(&[("mon.log", 1), ("tue.log", 4), ("wednesday.log", 8)]);
        let fragment = render_trend(Some(&section));
        assert_eq!(fragment.kind, FragmentKind::Content);
        insta::assert_snapshot!(fragment.body, @r"
        ▂▅█  3 sessions, 13 occurrences
          mon.log        1
          tue.log        4
          wednesday.log  8
        ");
    }

    #[test]
    fn test_single_point_is_placeholder() {
        let section = trend(&[("mon.log", 3)]);
        let fragment = render_trend(Some(&section));
        assert_eq!(fragment.kind, FragmentKind::Empty);
        assert!(fragment.body.starts_with("No history"));
    }

    #[test]
    fn test_no_record_is_placeholder() {
        let fragment = render_trend(Some(&trend(&[])));
        assert_eq!(fragment.kind, FragmentKind::Empty);
        assert!(!fragment.body.is_empty());

        let fragment = render_trend(None);
        assert_eq!(fragment.kind, FragmentKind::Empty);
        assert_eq!(fragment.title, TREND_TITLE);
    }
}
