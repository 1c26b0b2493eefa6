use logscope_engine::FragmentKind;
use logscope_runtime::{
    AnalysisRequest, AnalysisSettings, NO_TOKENS_NOTICE, Orchestrator, PanelEvent,
};
use logscope_testing::fixtures::{
    PLAIN_LINE, TAGGED_CONTEXT, TAGGED_ERROR, UNTAGGED_ERROR, session_log,
};
use logscope_testing::{Behavior, RecordingPresenter, Seam, StubCollaborators, TestWorld};
use logscope_types::{RequestId, RequestPhase, TaskId, TaskState};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

// Header lines written by `session_log`
const FIRST_LINE: usize = 3;

fn settings(task_timeout_ms: u64) -> AnalysisSettings {
    AnalysisSettings {
        task_timeout: Duration::from_millis(task_timeout_ms),
        ..AnalysisSettings::default()
    }
}

fn orchestrator(
    world: &TestWorld,
    stubs: StubCollaborators,
    settings: AnalysisSettings,
) -> (Orchestrator, Arc<RecordingPresenter>) {
    let presenter = RecordingPresenter::new();
    let orchestrator = Orchestrator::new(settings, stubs.build(), world.store(), presenter.clone());
    (orchestrator, presenter)
}

fn request(file: PathBuf, line: &str, line_index: usize) -> AnalysisRequest {
    AnalysisRequest {
        line: line.to_string(),
        file,
        line_index,
    }
}

/// Terminal section posts of `request`, keyed by task.
fn sections(events: &[PanelEvent], request: RequestId) -> BTreeMap<TaskId, FragmentKind> {
    let mut posted = BTreeMap::new();
    for event in events {
        if let PanelEvent::Section { request: r, fragment } = event
            && *r == request
        {
            let task = fragment.task.expect("section without task");
            assert!(
                posted.insert(task, fragment.kind).is_none(),
                "{} posted twice",
                task
            );
        }
    }
    posted
}

#[tokio::test]
async fn test_line_without_tokens_posts_single_notice() {
    let world = TestWorld::new();
    let file = world.write_session("a.log", &session_log("2024-05-01", &[PLAIN_LINE])).unwrap();
    let stubs = StubCollaborators::new();
    let calls = stubs.call_counter();
    let (orchestrator, presenter) = orchestrator(&world, stubs, settings(1000));

    let outcome = orchestrator
        .analyze(request(file, PLAIN_LINE, FIRST_LINE))
        .await;

    assert_eq!(outcome.phase, RequestPhase::Complete);
    assert!(outcome.tasks.is_empty());
    assert_eq!(
        presenter.events(),
        vec![PanelEvent::Notice {
            request: outcome.request,
            message: NO_TOKENS_NOTICE.to_string(),
        }]
    );
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_every_task_posts_once_then_finalizes() {
    let world = TestWorld::new();
    let file = world
        .write_session("a.log", &session_log("2024-05-01", &[UNTAGGED_ERROR]))
        .unwrap();
    let (orchestrator, presenter) = orchestrator(&world, StubCollaborators::new(), settings(2000));

    let outcome = orchestrator
        .analyze(request(file, UNTAGGED_ERROR, FIRST_LINE))
        .await;
    let events = presenter.events();

    let expected = vec![
        TaskId::Docs,
        TaskId::Tokens,
        TaskId::Trend,
        TaskId::Github,
        TaskId::Firebase,
    ];
    assert_eq!(
        events[0],
        PanelEvent::Shell {
            request: outcome.request,
            tasks: expected.clone(),
        }
    );
    let posted = sections(&events, outcome.request);
    assert_eq!(posted.keys().copied().collect::<Vec<_>>(), {
        let mut sorted = expected.clone();
        sorted.sort();
        sorted
    });

    let tail: Vec<_> = events[events.len() - 3..].to_vec();
    assert!(matches!(tail[0], PanelEvent::Trend { .. }));
    assert!(matches!(tail[1], PanelEvent::Summary { .. }));
    assert!(matches!(tail[2], PanelEvent::Complete { .. }));

    assert_eq!(outcome.phase, RequestPhase::Complete);
    assert!(outcome.tasks.values().all(|s| *s == TaskState::Done));
    assert_eq!(orchestrator.panel().phase(), RequestPhase::Complete);
    assert!(outcome.summary.is_some());
}

#[tokio::test]
async fn test_hanging_task_times_out_while_siblings_complete() {
    let world = TestWorld::new();
    let file = world
        .write_session("a.log", &session_log("2024-05-01", &[UNTAGGED_ERROR]))
        .unwrap();
    let stubs = StubCollaborators::new().with(Seam::Docs, Behavior::Hang);
    let (orchestrator, presenter) = orchestrator(&world, stubs, settings(200));

    let started = Instant::now();
    let outcome = orchestrator
        .analyze(request(file, UNTAGGED_ERROR, FIRST_LINE))
        .await;
    let elapsed = started.elapsed();

    assert!(elapsed < Duration::from_millis(200 + 1500), "took {:?}", elapsed);
    assert_eq!(outcome.phase, RequestPhase::Complete);
    assert_eq!(outcome.tasks[&TaskId::Docs], TaskState::TimedOut);
    assert_eq!(outcome.tasks[&TaskId::Github], TaskState::Done);

    let events = presenter.events();
    let posted = sections(&events, outcome.request);
    assert_eq!(posted[&TaskId::Docs], FragmentKind::TimedOut);
    assert_eq!(posted[&TaskId::Trend], FragmentKind::Content);

    // Siblings post as they finish, ahead of the timed-out section
    let position = |task: TaskId| {
        events
            .iter()
            .position(|e| matches!(e, PanelEvent::Section { fragment, .. } if fragment.task == Some(task)))
            .expect("section posted")
    };
    let docs = position(TaskId::Docs);
    for task in [TaskId::Tokens, TaskId::Trend, TaskId::Github, TaskId::Firebase] {
        assert!(position(task) < docs, "{} posted after the timeout", task);
    }
}

#[tokio::test]
async fn test_related_scan_timeout_keeps_original_tokens() {
    let world = TestWorld::new();
    let file = world
        .write_session(
            "a.log",
            &session_log("2024-05-01", &[TAGGED_CONTEXT, TAGGED_ERROR]),
        )
        .unwrap();
    let settings = AnalysisSettings {
        wave1_timeout: Duration::ZERO,
        ..settings(2000)
    };
    let (orchestrator, presenter) = orchestrator(&world, StubCollaborators::new(), settings);

    let outcome = orchestrator
        .analyze(request(file, TAGGED_ERROR, FIRST_LINE + 1))
        .await;

    assert_eq!(outcome.phase, RequestPhase::Complete);
    assert_eq!(outcome.tasks[&TaskId::Related], TaskState::TimedOut);
    assert!(
        outcome
            .tasks
            .iter()
            .filter(|(task, _)| **task != TaskId::Related)
            .all(|(_, state)| *state == TaskState::Done)
    );
    assert_eq!(outcome.tokens.error_types, vec!["StateError".to_string()]);
    assert!(outcome.sections.related.is_none());

    let posted = sections(&presenter.events(), outcome.request);
    assert_eq!(posted[&TaskId::Related], FragmentKind::TimedOut);
    let docs = outcome.sections.docs.expect("docs");
    assert!(docs.iter().all(|d| d.matched_token != "TimeoutException"));
}

#[tokio::test]
async fn test_closing_panel_cancels_running_tasks() {
    let world = TestWorld::new();
    let file = world
        .write_session("a.log", &session_log("2024-05-01", &[UNTAGGED_ERROR]))
        .unwrap();
    let stubs = StubCollaborators::new().with(Seam::Docs, Behavior::Hang);
    let (orchestrator, presenter) = orchestrator(&world, stubs, settings(5000));

    let running = {
        let orchestrator = orchestrator.clone();
        let request = request(file, UNTAGGED_ERROR, FIRST_LINE);
        tokio::spawn(async move { orchestrator.analyze(request).await })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;

    let started = Instant::now();
    orchestrator.panel().cancel();
    let posted_before_cancel = presenter.events();
    let outcome = running.await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert!(started.elapsed() < Duration::from_millis(2000));
    assert_eq!(outcome.phase, RequestPhase::Cancelled);
    assert_eq!(orchestrator.panel().phase(), RequestPhase::Cancelled);
    assert_eq!(outcome.tasks[&TaskId::Docs], TaskState::Running);

    let events = presenter.events();
    assert_eq!(events, posted_before_cancel);
    assert!(!sections(&events, outcome.request).contains_key(&TaskId::Docs));
    assert!(!events.iter().any(|e| matches!(
        e,
        PanelEvent::Trend { .. } | PanelEvent::Summary { .. } | PanelEvent::Complete { .. }
    )));
}

#[tokio::test]
async fn test_panicking_and_failing_tasks_are_isolated() {
    let world = TestWorld::new();
    let file = world
        .write_session("a.log", &session_log("2024-05-01", &[UNTAGGED_ERROR]))
        .unwrap();
    let stubs = StubCollaborators::new()
        .with(Seam::Crashes, Behavior::Panic)
        .with(Seam::Issues, Behavior::Fail);
    let (orchestrator, presenter) = orchestrator(&world, stubs, settings(2000));

    let outcome = orchestrator
        .analyze(request(file, UNTAGGED_ERROR, FIRST_LINE))
        .await;

    assert_eq!(outcome.phase, RequestPhase::Complete);
    assert_eq!(outcome.tasks[&TaskId::Firebase], TaskState::Errored);
    assert_eq!(outcome.tasks[&TaskId::Github], TaskState::Errored);
    assert_eq!(outcome.tasks[&TaskId::Docs], TaskState::Done);

    let events = presenter.events();
    let firebase = events.iter().find_map(|e| match e {
        PanelEvent::Section { fragment, .. } if fragment.task == Some(TaskId::Firebase) => {
            Some(fragment.clone())
        }
        _ => None,
    });
    let firebase = firebase.expect("firebase section");
    assert_eq!(firebase.kind, FragmentKind::Failed);
    assert_eq!(firebase.body, "Failed: task panicked");
    assert!(matches!(events.last(), Some(PanelEvent::Complete { .. })));
}

#[tokio::test]
async fn test_second_request_supersedes_first() {
    let world = TestWorld::new();
    let file = world
        .write_session("a.log", &session_log("2024-05-01", &[UNTAGGED_ERROR]))
        .unwrap();
    let stubs = StubCollaborators::new().with(Seam::Docs, Behavior::Delay(Duration::from_millis(300)));
    let (orchestrator, presenter) = orchestrator(&world, stubs, settings(2000));

    let first = {
        let orchestrator = orchestrator.clone();
        let request = request(file.clone(), UNTAGGED_ERROR, FIRST_LINE);
        tokio::spawn(async move { orchestrator.analyze(request).await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;

    let second = orchestrator
        .analyze(request(file, UNTAGGED_ERROR, FIRST_LINE))
        .await;
    let first = first.await.unwrap();

    assert_eq!(first.phase, RequestPhase::Cancelled);
    assert_eq!(second.phase, RequestPhase::Complete);

    let events = presenter.events();
    let second_shell = events
        .iter()
        .position(|e| matches!(e, PanelEvent::Shell { request, .. } if *request == second.request))
        .expect("second shell");
    assert!(events[..second_shell].iter().all(|e| e.request() == first.request));
    assert!(events[second_shell..].iter().all(|e| e.request() == second.request));
    assert!(
        !events
            .iter()
            .any(|e| matches!(e, PanelEvent::Complete { request } if *request == first.request))
    );
    assert_eq!(orchestrator.panel().active_request(), Some(second.request));
}

#[tokio::test]
async fn test_trend_needs_two_sessions() {
    let world = TestWorld::new();
    let file = world
        .write_session("a.log", &session_log("2024-05-01", &[UNTAGGED_ERROR, UNTAGGED_ERROR]))
        .unwrap();
    let (orchestrator, presenter) = orchestrator(&world, StubCollaborators::new(), settings(2000));

    let outcome = orchestrator
        .analyze(request(file.clone(), UNTAGGED_ERROR, FIRST_LINE))
        .await;
    let trend = presenter.events().into_iter().find_map(|e| match e {
        PanelEvent::Trend { fragment, .. } => Some(fragment),
        _ => None,
    });
    let trend = trend.expect("trend post");
    assert_eq!(trend.kind, FragmentKind::Empty);
    assert!(trend.body.starts_with("No history"));
    assert_eq!(outcome.sections.trend.as_ref().map(|t| t.point_count()), Some(1));

    world
        .write_session("b.log", &session_log("2024-05-02", &[UNTAGGED_ERROR]))
        .unwrap();
    let outcome = orchestrator
        .analyze(request(file, UNTAGGED_ERROR, FIRST_LINE))
        .await;
    let trend = presenter.events().into_iter().rev().find_map(|e| match e {
        PanelEvent::Trend { fragment, .. } => Some(fragment),
        _ => None,
    });
    let trend = trend.expect("trend post");
    assert_eq!(trend.kind, FragmentKind::Content);

    let record = outcome.sections.trend.and_then(|t| t.record).expect("record");
    assert_eq!(record.session_count, 2);
    assert_eq!(record.total_occurrences, 3);
}

#[tokio::test]
async fn test_related_lines_enrich_tokens() {
    let world = TestWorld::new();
    let file = world
        .write_session(
            "a.log",
            &session_log("2024-05-01", &[TAGGED_CONTEXT, TAGGED_ERROR, PLAIN_LINE]),
        )
        .unwrap();
    let (orchestrator, presenter) = orchestrator(&world, StubCollaborators::new(), settings(2000));

    let outcome = orchestrator
        .analyze(request(file, TAGGED_ERROR, FIRST_LINE + 1))
        .await;

    assert_eq!(outcome.phase, RequestPhase::Complete);
    assert_eq!(outcome.tasks[&TaskId::Related], TaskState::Done);
    assert!(outcome.tokens.error_types.contains(&"StateError".to_string()));
    assert!(outcome.tokens.error_types.contains(&"TimeoutException".to_string()));

    let related = outcome.sections.related.expect("related lines");
    assert_eq!(related.tag, "auth");
    assert_eq!(related.total, 1);
    assert_eq!(related.lines[0].line_index, FIRST_LINE);

    let events = presenter.events();
    match &events[0] {
        PanelEvent::Shell { tasks, .. } => {
            assert_eq!(tasks[0], TaskId::Related);
            assert!(tasks.contains(&TaskId::Source));
            assert!(tasks.contains(&TaskId::Symbols));
        }
        other => panic!("expected shell, got {:?}", other),
    }
    // Enriched tokens reach the docs stub: one match per search term
    let docs = outcome.sections.docs.expect("docs");
    assert!(docs.iter().any(|d| d.matched_token == "TimeoutException"));
}

#[tokio::test]
async fn test_identical_requests_yield_equivalent_reports() {
    let world = TestWorld::new();
    let file = world
        .write_session("a.log", &session_log("2024-05-01", &[TAGGED_CONTEXT, TAGGED_ERROR]))
        .unwrap();
    world
        .write_session("b.log", &session_log("2024-05-02", &[TAGGED_ERROR]))
        .unwrap();
    let (orchestrator, _presenter) = orchestrator(&world, StubCollaborators::new(), settings(2000));

    let first = orchestrator
        .analyze(request(file.clone(), TAGGED_ERROR, FIRST_LINE + 1))
        .await;
    let second = orchestrator
        .analyze(request(file, TAGGED_ERROR, FIRST_LINE + 1))
        .await;

    assert_ne!(first.request, second.request);
    assert_eq!(first.tasks, second.tasks);
    assert_eq!(first.sections, second.sections);
    assert_eq!(first.summary, second.summary);
}
