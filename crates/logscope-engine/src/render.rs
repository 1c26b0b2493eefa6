use crate::fragment::Fragment;
use logscope_types::{
    CrashReport, DocMatch, FileAnalysis, IssueReport, RelatedLines, SectionData, SourceSection,
    SymbolMatch, TaskId, TokenMatch, TrendSection,
};
use std::fmt::Write;

/// Render the section a task contributed to `data`.
///
/// A task that contributed nothing renders as an explicit empty state.
pub fn render_section(task: TaskId, data: &SectionData) -> Fragment {
    let rendered = match task {
        TaskId::Related => data.related.as_ref().map(render_related),
        TaskId::Source => data.source.as_ref().map(render_source),
        TaskId::Docs => data.docs.as_deref().map(render_docs),
        TaskId::Symbols => data.symbols.as_deref().map(render_symbols),
        TaskId::Tokens => data.tokens.as_deref().map(render_tokens),
        TaskId::Trend => data.trend.as_ref().map(render_recurrence),
        TaskId::Files => data.files.as_deref().map(render_files),
        TaskId::Github => data.github.as_ref().map(render_issues),
        TaskId::Firebase => data.firebase.as_ref().map(render_crashes),
    };
    rendered.unwrap_or_else(|| Fragment::empty(task, "No data"))
}

fn truncate(text: &str, max: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max.saturating_sub(1)).collect();
    format!("{}…", cut)
}

fn render_related(related: &RelatedLines) -> Fragment {
    if related.lines.is_empty() {
        return Fragment::empty(
            TaskId::Related,
            format!("No other lines tagged [{}]", related.tag),
        );
    }
    let mut body = format!("{} lines tagged [{}]", related.total, related.tag);
    if related.total > related.lines.len() {
        let _ = write!(body, " (showing {})", related.lines.len());
    }
    for line in &related.lines {
        let _ = write!(body, "\n  L{:<5} {}", line.line_index + 1, truncate(&line.text, 120));
    }
    Fragment::content(TaskId::Related, body)
}

fn render_source(section: &SourceSection) -> Fragment {
    let context = &section.context;
    let Some(path) = &context.resolved_path else {
        return Fragment::empty(
            TaskId::Source,
            format!("{} not found in workspace", context.reference.file_name()),
        );
    };

    let mut body = format!("{} ({} lines)", path.display(), context.line_count);
    for line in &context.preview {
        let marker = if line.is_target { '>' } else { ' ' };
        let _ = write!(body, "\n{} {:>5} | {}", marker, line.number, line.text);
    }

    if let Some(blame) = &section.blame {
        let short = blame.commit.get(..8).unwrap_or(&blame.commit);
        let _ = write!(
            body,
            "\nBlame: {} {} {} \"{}\"",
            short, blame.author, blame.date, blame.summary
        );
        if let Some(stat) = &section.blame_stat {
            let _ = write!(
                body,
                " ({} files, +{} -{})",
                stat.files_changed, stat.insertions, stat.deletions
            );
        }
    }

    if !context.line_history.is_empty() {
        body.push_str("\nNearby changes:");
        for commit in &context.line_history {
            let _ = write!(body, "\n  {} {} {}", commit.hash, commit.date, commit.summary);
        }
    } else if !context.file_history.is_empty() {
        body.push_str("\nFile history:");
        for commit in &context.file_history {
            let _ = write!(body, "\n  {} {} {}", commit.hash, commit.date, commit.summary);
        }
    }

    for annotation in &context.annotations {
        let _ = write!(
            body,
            "\n{} (line {}): {}",
            annotation.marker, annotation.line, annotation.text
        );
    }

    if !context.imports.is_empty() {
        let _ = write!(body, "\nImports: {}", context.imports.join(", "));
    }

    Fragment::content(TaskId::Source, body)
}

fn render_docs(docs: &[DocMatch]) -> Fragment {
    if docs.is_empty() {
        return Fragment::empty(TaskId::Docs, "No documentation mentions these tokens");
    }
    let mut lines = Vec::with_capacity(docs.len());
    for doc in docs {
        lines.push(format!(
            "{}:{} [{}] {}",
            doc.file.display(),
            doc.line,
            doc.matched_token,
            truncate(&doc.line_text, 100)
        ));
    }
    Fragment::content(TaskId::Docs, lines.join("\n"))
}

fn render_symbols(symbols: &[SymbolMatch]) -> Fragment {
    if symbols.is_empty() {
        return Fragment::empty(TaskId::Symbols, "No definitions found");
    }
    let body = symbols
        .iter()
        .map(|s| format!("{} {}  {}", s.kind, s.name, s.location))
        .collect::<Vec<_>>()
        .join("\n");
    Fragment::content(TaskId::Symbols, body)
}

fn render_tokens(matches: &[TokenMatch]) -> Fragment {
    if matches.is_empty() {
        return Fragment::empty(TaskId::Tokens, "Not seen in other sessions");
    }
    let mut sessions: Vec<&str> = matches.iter().map(|m| m.session.as_str()).collect();
    sessions.dedup();
    let mut body = format!("{} matches in {} sessions", matches.len(), sessions.len());
    for m in matches {
        let _ = write!(
            body,
            "\n  {}:{} [{}] {}",
            m.session,
            m.line_index + 1,
            m.token,
            truncate(&m.text, 100)
        );
    }
    Fragment::content(TaskId::Tokens, body)
}

fn render_recurrence(trend: &TrendSection) -> Fragment {
    match &trend.record {
        None => Fragment::empty(
            TaskId::Trend,
            format!("First occurrence of {}", trend.fingerprint),
        ),
        Some(record) => Fragment::content(
            TaskId::Trend,
            format!(
                "{}: {} occurrences in {} sessions (first {}, last {})",
                record.hash,
                record.total_occurrences,
                record.session_count,
                record.first_seen,
                record.last_seen
            ),
        ),
    }
}

fn render_files(files: &[FileAnalysis]) -> Fragment {
    if files.is_empty() {
        return Fragment::empty(TaskId::Files, "No referenced files");
    }
    let mut lines = Vec::with_capacity(files.len());
    for file in files {
        if !file.exists {
            lines.push(format!("{}  missing", file.reference));
            continue;
        }
        let mut line = format!(
            "{}  {} lines, {} annotations",
            file.reference, file.line_count, file.annotation_count
        );
        if let Some(commit) = &file.last_commit {
            let _ = write!(line, ", last change {} {}", commit.date, commit.summary);
        }
        lines.push(line);
    }
    Fragment::content(TaskId::Files, lines.join("\n"))
}

fn render_issues(report: &IssueReport) -> Fragment {
    if !report.available {
        return Fragment::unavailable(
            TaskId::Github,
            report
                .setup_hint
                .clone()
                .unwrap_or_else(|| "Issue tracker unavailable".to_string()),
        );
    }
    if report.is_empty() {
        return Fragment::empty(TaskId::Github, "No related pull requests or issues");
    }

    let mut body = String::new();
    if let Some(pr) = &report.introducing_pr {
        let _ = writeln!(body, "Introduced by #{} {} ({})", pr.number, pr.title, pr.url);
    }
    for pr in &report.file_prs {
        let _ = writeln!(body, "PR #{} [{}] {}", pr.number, pr.state, pr.title);
    }
    for issue in &report.issues {
        let _ = writeln!(body, "Issue #{} [{}] {}", issue.number, issue.state, issue.title);
    }
    Fragment::content(TaskId::Github, body.trim_end())
}

fn render_crashes(report: &CrashReport) -> Fragment {
    if !report.available {
        return Fragment::unavailable(
            TaskId::Firebase,
            report
                .setup_hint
                .clone()
                .unwrap_or_else(|| "Crash reporting unavailable".to_string()),
        );
    }
    if report.issues.is_empty() {
        return Fragment::empty(TaskId::Firebase, "No matching crash issues");
    }

    let mut body = String::new();
    for issue in &report.issues {
        let _ = writeln!(
            body,
            "{}  {} events, {} users  {}",
            issue.title, issue.event_count, issue.user_count, issue.subtitle
        );
    }
    if let Some(url) = &report.console_url {
        let _ = write!(body, "Console: {}", url);
    }
    Fragment::content(TaskId::Firebase, body.trim_end())
}
