use logscope_types::{SectionData, TaskId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

/// Sections scoring below this are auto-collapsed.
pub const COLLAPSE_BELOW: u32 = 30;

const NO_LEADS: &str = "No strong leads; see the sections below";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelevanceScore {
    pub task: TaskId,
    pub score: u32,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutiveSummary {
    pub headline: String,
    pub findings: Vec<String>,
    /// Highest score first
    pub scores: Vec<RelevanceScore>,
    pub collapse: BTreeSet<TaskId>,
}

struct Assessment {
    score: u32,
    reason: String,
    finding: Option<String>,
}

impl Assessment {
    fn new(score: u32, reason: impl Into<String>) -> Self {
        Self {
            score: score.min(100),
            reason: reason.into(),
            finding: None,
        }
    }

    fn with_finding(mut self, finding: impl Into<String>) -> Self {
        self.finding = Some(finding.into());
        self
    }
}

type AssessFn = Box<dyn Fn(&SectionData) -> Option<Assessment> + Send + Sync>;

/// How much one section's contents matter for explaining the error.
pub struct Signal {
    pub task: TaskId,
    assess: AssessFn,
}

impl Signal {
    pub fn related() -> Self {
        Self {
            task: TaskId::Related,
            assess: Box::new(|data| {
                let related = data.related.as_ref()?;
                if related.total == 0 {
                    return Some(Assessment::new(5, "no related lines"));
                }
                let assessment = Assessment::new(
                    20 + related.total.min(30) as u32,
                    format!("{} lines share [{}]", related.total, related.tag),
                );
                Some(if related.total >= 3 {
                    assessment.with_finding(format!(
                        "{} other lines tagged [{}] in this log",
                        related.total, related.tag
                    ))
                } else {
                    assessment
                })
            }),
        }
    }

    pub fn source() -> Self {
        Self {
            task: TaskId::Source,
            assess: Box::new(|data| {
                let section = data.source.as_ref()?;
                let context = &section.context;
                let Some(path) = &context.resolved_path else {
                    return Some(Assessment::new(5, "file not in workspace"));
                };

                let mut score = 50;
                if section.blame.is_some() {
                    score += 20;
                }
                if !context.line_history.is_empty() {
                    score += 10;
                }
                if !context.annotations.is_empty() {
                    score += 10;
                }

                let assessment = Assessment::new(
                    score,
                    format!(
                        "found, {} annotations, {} nearby commits",
                        context.annotations.len(),
                        context.line_history.len()
                    ),
                );
                Some(match &section.blame {
                    Some(blame) => assessment.with_finding(format!(
                        "{} last changed by {} on {}: {}",
                        context.reference, blame.author, blame.date, blame.summary
                    )),
                    None => assessment.with_finding(format!("Source at {}", path.display())),
                })
            }),
        }
    }

    pub fn docs() -> Self {
        Self {
            task: TaskId::Docs,
            assess: Box::new(|data| {
                let docs = data.docs.as_ref()?;
                let Some(first) = docs.first() else {
                    return Some(Assessment::new(0, "no matches"));
                };
                Some(
                    Assessment::new(
                        (25 + 5 * docs.len() as u32).min(60),
                        format!("{} matches", docs.len()),
                    )
                    .with_finding(format!(
                        "`{}` is documented in {}:{}",
                        first.matched_token,
                        first.file.display(),
                        first.line
                    )),
                )
            }),
        }
    }

    pub fn symbols() -> Self {
        Self {
            task: TaskId::Symbols,
            assess: Box::new(|data| {
                let symbols = data.symbols.as_ref()?;
                let Some(first) = symbols.first() else {
                    return Some(Assessment::new(5, "no definitions"));
                };
                Some(
                    Assessment::new(55, format!("{} definitions", symbols.len())).with_finding(
                        format!("{} {} defined at {}", first.kind, first.name, first.location),
                    ),
                )
            }),
        }
    }

    pub fn tokens() -> Self {
        Self {
            task: TaskId::Tokens,
            assess: Box::new(|data| {
                let matches = data.tokens.as_ref()?;
                let sessions: HashSet<&str> = matches.iter().map(|m| m.session.as_str()).collect();
                if sessions.is_empty() {
                    return Some(Assessment::new(5, "not seen elsewhere"));
                }
                Some(
                    Assessment::new(
                        (30 + 10 * sessions.len() as u32).min(80),
                        format!("{} matches in {} sessions", matches.len(), sessions.len()),
                    )
                    .with_finding(format!(
                        "Tokens also appear in {} other sessions",
                        sessions.len()
                    )),
                )
            }),
        }
    }

    pub fn trend() -> Self {
        Self {
            task: TaskId::Trend,
            assess: Box::new(|data| {
                let trend = data.trend.as_ref()?;
                Some(match &trend.record {
                    None => Assessment::new(15, "first occurrence")
                        .with_finding("First time this error has been seen"),
                    Some(record) if record.session_count < 2 => {
                        Assessment::new(20, "seen in one session")
                    }
                    Some(record) => Assessment::new(
                        40 + 10 * record.session_count.min(6) as u32,
                        format!("recurs in {} sessions", record.session_count),
                    )
                    .with_finding(format!(
                        "Recurring: {} occurrences across {} sessions since {}",
                        record.total_occurrences, record.session_count, record.first_seen
                    )),
                })
            }),
        }
    }

    pub fn files() -> Self {
        Self {
            task: TaskId::Files,
            assess: Box::new(|data| {
                let files = data.files.as_ref()?;
                let existing = files.iter().filter(|f| f.exists).count();
                if existing == 0 {
                    return Some(Assessment::new(5, "no referenced file exists"));
                }
                let annotations: usize = files.iter().map(|f| f.annotation_count).sum();
                let assessment = Assessment::new(
                    (30 + 5 * existing as u32).min(60),
                    format!("{} of {} files found", existing, files.len()),
                );
                Some(if annotations > 0 {
                    assessment.with_finding(format!(
                        "{} TODO/FIXME annotations in referenced files",
                        annotations
                    ))
                } else {
                    assessment
                })
            }),
        }
    }

    pub fn github() -> Self {
        Self {
            task: TaskId::Github,
            assess: Box::new(|data| {
                let report = data.github.as_ref()?;
                if !report.available {
                    return Some(Assessment::new(0, "unavailable"));
                }
                if let Some(pr) = &report.introducing_pr {
                    return Some(
                        Assessment::new(95, "introducing PR found").with_finding(format!(
                            "Possibly introduced by PR #{}: {}",
                            pr.number, pr.title
                        )),
                    );
                }
                let count = report.file_prs.len() + report.issues.len();
                if count == 0 {
                    return Some(Assessment::new(5, "nothing related"));
                }
                Some(
                    Assessment::new(
                        (45 + 5 * count as u32).min(75),
                        format!("{} PRs, {} issues", report.file_prs.len(), report.issues.len()),
                    )
                    .with_finding(format!("{} related pull requests or issues", count)),
                )
            }),
        }
    }

    pub fn firebase() -> Self {
        Self {
            task: TaskId::Firebase,
            assess: Box::new(|data| {
                let report = data.firebase.as_ref()?;
                if !report.available {
                    return Some(Assessment::new(0, "unavailable"));
                }
                let Some(top) = report.issues.iter().max_by_key(|i| i.event_count) else {
                    return Some(Assessment::new(5, "no crash issues"));
                };
                Some(
                    Assessment::new(70, format!("{} crash issues", report.issues.len()))
                        .with_finding(format!(
                            "Crash reporting: {} ({} events, {} users)",
                            top.title, top.event_count, top.user_count
                        )),
                )
            }),
        }
    }

    pub fn all() -> Vec<Signal> {
        vec![
            Signal::related(),
            Signal::source(),
            Signal::docs(),
            Signal::symbols(),
            Signal::tokens(),
            Signal::trend(),
            Signal::files(),
            Signal::github(),
            Signal::firebase(),
        ]
    }
}

/// Score every announced section and build the executive summary.
///
/// A task that never contributed data scores zero and is collapsed.
pub fn score_sections(data: &SectionData, tasks: &[TaskId]) -> ExecutiveSummary {
    let mut scored: Vec<(RelevanceScore, Option<String>)> = Signal::all()
        .into_iter()
        .filter(|signal| tasks.contains(&signal.task))
        .map(|signal| match (signal.assess)(data) {
            Some(a) => (
                RelevanceScore {
                    task: signal.task,
                    score: a.score,
                    reason: a.reason,
                },
                a.finding,
            ),
            None => (
                RelevanceScore {
                    task: signal.task,
                    score: 0,
                    reason: "no data".to_string(),
                },
                None,
            ),
        })
        .collect();

    scored.sort_by(|(a, _), (b, _)| b.score.cmp(&a.score).then_with(|| a.task.cmp(&b.task)));

    let collapse = scored
        .iter()
        .filter(|(s, _)| s.score < COLLAPSE_BELOW)
        .map(|(s, _)| s.task)
        .collect();

    let findings: Vec<String> = scored.iter().filter_map(|(_, f)| f.clone()).collect();
    let headline = findings
        .first()
        .cloned()
        .unwrap_or_else(|| NO_LEADS.to_string());

    ExecutiveSummary {
        headline,
        findings,
        scores: scored.into_iter().map(|(s, _)| s).collect(),
        collapse,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logscope_types::{
        ErrorFingerprint, IssueReport, PullRequestRef, RecurringErrorRecord, TimelinePoint,
        TrendSection,
    };

    fn recurring_trend() -> TrendSection {
        TrendSection {
            fingerprint: ErrorFingerprint::new("0badf00d"),
            record: Some(RecurringErrorRecord {
                hash: ErrorFingerprint::new("0badf00d"),
                session_count: 2,
                total_occurrences: 5,
                first_seen: "mon.log".into(),
                last_seen: "tue.log".into(),
                timeline: vec![
                    TimelinePoint {
                        session: "mon.log".into(),
                        count: 2,
                    },
                    TimelinePoint {
                        session: "tue.log".into(),
                        count: 3,
                    },
                ],
                sample: String::new(),
            }),
        }
    }

    #[test]
    fn test_empty_data_collapses_everything() {
        let tasks = [TaskId::Docs, TaskId::Tokens, TaskId::Github];
        let summary = score_sections(&SectionData::default(), &tasks);

        assert_eq!(summary.headline, NO_LEADS);
        assert!(summary.findings.is_empty());
        assert_eq!(summary.collapse, BTreeSet::from(tasks));
        assert!(summary.scores.iter().all(|s| s.score == 0));
    }

    #[test]
    fn test_only_announced_tasks_are_scored() {
        let summary = score_sections(&SectionData::default(), &[TaskId::Trend]);
        assert_eq!(summary.scores.len(), 1);
        assert_eq!(summary.scores[0].task, TaskId::Trend);
    }

    #[test]
    fn test_introducing_pr_leads_the_summary() {
        let data = SectionData {
            trend: Some(recurring_trend()),
            github: Some(IssueReport {
                available: true,
                setup_hint: None,
                introducing_pr: Some(PullRequestRef {
                    number: 812,
                    title: "Lazy-load home items".into(),
                    url: String::new(),
                    state: "MERGED".into(),
                }),
                file_prs: vec![],
                issues: vec![],
            }),
            docs: Some(vec![]),
            ..Default::default()
        };
        let summary = score_sections(&data, &[TaskId::Docs, TaskId::Trend, TaskId::Github]);

        assert_eq!(summary.headline, "Possibly introduced by PR #812: Lazy-load home items");
        assert_eq!(
            summary.findings,
            vec![
                "Possibly introduced by PR #812: Lazy-load home items".to_string(),
                "Recurring: 5 occurrences across 2 sessions since mon.log".to_string(),
            ]
        );
        let order: Vec<_> = summary.scores.iter().map(|s| s.task).collect();
        assert_eq!(order, vec![TaskId::Github, TaskId::Trend, TaskId::Docs]);
        assert_eq!(summary.collapse, BTreeSet::from([TaskId::Docs]));
    }

    #[test]
    fn test_unavailable_collaborator_is_collapsed() {
        let data = SectionData {
            github: Some(IssueReport::unavailable("install gh")),
            ..Default::default()
        };
        let summary = score_sections(&data, &[TaskId::Github]);
        assert!(summary.collapse.contains(&TaskId::Github));
        assert_eq!(summary.scores[0].reason, "unavailable");
    }
}
