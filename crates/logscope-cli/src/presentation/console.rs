use super::paint;
use logscope_engine::{ExecutiveSummary, Fragment, FragmentKind};
use logscope_runtime::PanelEvent;
use owo_colors::OwoColorize;
use std::fmt;

/// Plain-text rendering of one panel event, printed as it arrives.
pub struct ConsoleEvent<'a> {
    event: &'a PanelEvent,
    color: bool,
}

impl<'a> ConsoleEvent<'a> {
    pub fn new(event: &'a PanelEvent, color: bool) -> Self {
        Self { event, color }
    }

    fn fragment(&self, f: &mut fmt::Formatter<'_>, fragment: &Fragment) -> fmt::Result {
        let title = format!("## {}", fragment.title);
        writeln!(f, "{}", paint(&title, self.color, |t| t.bold().to_string()))?;
        let body = match fragment.kind {
            FragmentKind::Content => fragment.body.clone(),
            FragmentKind::Empty | FragmentKind::Unavailable => {
                paint(&fragment.body, self.color, |t| t.dimmed().to_string())
            }
            FragmentKind::TimedOut => paint(&fragment.body, self.color, |t| t.yellow().to_string()),
            FragmentKind::Failed => paint(&fragment.body, self.color, |t| t.red().to_string()),
        };
        writeln!(f, "{}", body)?;
        writeln!(f)
    }

    fn summary(&self, f: &mut fmt::Formatter<'_>, summary: &ExecutiveSummary) -> fmt::Result {
        writeln!(f, "{}", paint("== Summary ==", self.color, |t| t.cyan().bold().to_string()))?;
        writeln!(f, "{}", paint(&summary.headline, self.color, |t| t.bold().to_string()))?;
        for finding in summary.findings.iter().skip(1) {
            writeln!(f, "  - {}", finding)?;
        }
        if !summary.collapse.is_empty() {
            let names: Vec<&str> = summary.collapse.iter().map(|t| t.title()).collect();
            let line = format!("Low relevance: {}", names.join(", "));
            writeln!(f, "{}", paint(&line, self.color, |t| t.dimmed().to_string()))?;
        }
        Ok(())
    }
}

impl fmt::Display for ConsoleEvent<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.event {
            PanelEvent::Shell { tasks, .. } => {
                let names: Vec<&str> = tasks.iter().map(|t| t.as_str()).collect();
                let line = format!("Running: {}", names.join(", "));
                writeln!(f, "{}", paint(&line, self.color, |t| t.dimmed().to_string()))?;
                writeln!(f)
            }
            PanelEvent::Section { fragment, .. } | PanelEvent::Trend { fragment, .. } => {
                self.fragment(f, fragment)
            }
            PanelEvent::Notice { message, .. } => {
                writeln!(f, "{}", paint(message, self.color, |t| t.yellow().to_string()))
            }
            PanelEvent::Summary { summary, .. } => self.summary(f, summary),
            PanelEvent::Complete { .. } => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logscope_types::{RequestId, TaskId};

    #[test]
    fn test_plain_section_and_notice() {
        let request = RequestId::new();
        let section = PanelEvent::Section {
            request,
            fragment: Fragment::timed_out(TaskId::Docs),
        };
        assert_eq!(
            ConsoleEvent::new(&section, false).to_string(),
            "## Documentation\nTimed out\n\n"
        );

        let notice = PanelEvent::Notice {
            request,
            message: "No analyzable tokens in this line".into(),
        };
        assert_eq!(
            ConsoleEvent::new(&notice, false).to_string(),
            "No analyzable tokens in this line\n"
        );
    }
}
