//! End-to-end walkthrough: build a timeline, filter it, analyze it.

use chrono::{DateTime, TimeZone, Utc};
use timegraph::{
    DependencyKind, DependencyRecord, Task, TaskPriority, TaskStatus, TimelineEngine,
    TimelineFilter,
};

fn d(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap()
}

fn task(id: &str, name: &str) -> Task {
    Task {
        id: id.to_string(),
        name: name.to_string(),
        project_id: "release-1".to_string(),
        status: TaskStatus::Ready,
        priority: TaskPriority::Medium,
        assignee: None,
        start_date: None,
        due_date: None,
        estimated_hours: 8.0,
        actual_hours: 0.0,
        labels: vec![],
        parent_id: None,
        depends_on: vec![],
        created_at: d(2025, 1, 1),
    }
}

fn dep(id: &str, pred: &str, succ: &str) -> DependencyRecord {
    DependencyRecord {
        id: id.to_string(),
        predecessor_id: pred.to_string(),
        successor_id: succ.to_string(),
        kind: DependencyKind::FinishToStart,
        lag_days: 0.0,
    }
}

/// A small release plan: design feeds both implementation tracks, which
/// merge into integration and release. The backend track is the long pole.
fn release_plan() -> (Vec<Task>, Vec<DependencyRecord>) {
    let mut design = task("design", "API design");
    design.status = TaskStatus::Done;
    design.assignee = Some("ada".to_string());
    design.start_date = Some(d(2025, 3, 3));
    design.due_date = Some(d(2025, 3, 7));

    let mut backend = task("backend", "Backend implementation");
    backend.status = TaskStatus::InProgress;
    backend.assignee = Some("grace".to_string());
    backend.estimated_hours = 80.0;
    backend.actual_hours = 24.0;
    backend.start_date = Some(d(2025, 3, 10));
    backend.due_date = Some(d(2025, 3, 24));
    backend.labels = vec!["backend".to_string()];

    let mut frontend = task("frontend", "Frontend implementation");
    frontend.status = TaskStatus::InProgress;
    frontend.estimated_hours = 40.0;
    frontend.actual_hours = 8.0;
    frontend.start_date = Some(d(2025, 3, 10));
    frontend.due_date = Some(d(2025, 3, 17));
    frontend.labels = vec!["frontend".to_string()];

    let mut integration = task("integration", "Integration testing");
    integration.estimated_hours = 24.0;

    let mut release = task("release", "Release");
    release.estimated_hours = 8.0;

    // Legacy inline dependency alongside the discrete records.
    integration.depends_on = vec!["frontend".to_string()];

    let deps = vec![
        dep("d1", "design", "backend"),
        dep("d2", "design", "frontend"),
        dep("d3", "backend", "integration"),
        dep("d4", "integration", "release"),
    ];

    (
        vec![design, backend, frontend, integration, release],
        deps,
    )
}

#[test]
fn build_filter_analyze_round_trip() {
    let engine = TimelineEngine::default();
    let (tasks, deps) = release_plan();
    let now = d(2025, 3, 20);

    let timeline = engine
        .build_timeline(&tasks, &deps, Some("release-1"), None, now)
        .unwrap();

    assert_eq!(timeline.tasks.len(), 5);
    // Inline frontend->integration edge merged with the four records.
    assert_eq!(timeline.edges.len(), 5);

    // The backend track is longer, so frontend is off the critical path.
    assert!(timeline.critical_ids.contains("backend"));
    assert!(timeline.critical_ids.contains("integration"));
    assert!(timeline.critical_ids.contains("release"));
    assert!(!timeline.critical_ids.contains("frontend"));

    // Completed design task yields a completion milestone before the
    // project deadline marker.
    assert!(timeline.milestones.len() >= 2);
    assert!(timeline.milestones.windows(2).all(|w| w[0].date <= w[1].date));

    // Chronological ordering with id tiebreak.
    for pair in timeline.tasks.windows(2) {
        assert!(
            pair[0].start < pair[1].start
                || (pair[0].start == pair[1].start && pair[0].id() <= pair[1].id())
        );
    }

    // Filtering to the backend label leaves a single-task graph whose
    // critical set is recomputed, not inherited.
    let filter = TimelineFilter {
        label: Some("backend".to_string()),
        ..Default::default()
    };
    let filtered = engine.filter_timeline(&timeline, &filter);
    assert_eq!(filtered.stats.total, 5);
    assert_eq!(filtered.stats.filtered, 1);
    assert_eq!(filtered.stats.critical, 1);
    assert!(filtered.data.critical_ids.contains("backend"));
    assert!(filtered.data.edges.is_empty());

    // Analysis covers every critical task and keeps scenarios ordered.
    let analysis = engine.analyze_critical_path(&timeline);
    assert_eq!(
        analysis.critical_tasks.len(),
        timeline.critical_ids.len()
    );
    let best = analysis.scenarios.best_case.as_ref().unwrap().date;
    let current = analysis.scenarios.current_trajectory.as_ref().unwrap().date;
    let worst = analysis.scenarios.worst_case.as_ref().unwrap().date;
    assert!(best <= current && current <= worst);

    // Recommendations are ranked critical-first.
    for pair in analysis.recommendations.windows(2) {
        assert!(pair[0].priority <= pair[1].priority);
    }
}

#[test]
fn cyclic_plan_is_rejected_with_cycle_detail() {
    let engine = TimelineEngine::default();
    let (mut tasks, mut deps) = release_plan();
    // Close a loop: release feeds back into design.
    deps.push(dep("loop", "release", "design"));
    tasks.push(task("spare", "Unrelated"));

    let err = engine
        .build_timeline(&tasks, &deps, None, None, d(2025, 3, 20))
        .unwrap_err();

    assert_eq!(err.cycles.len(), 1);
    let cycle = &err.cycles[0];
    assert!(cycle.contains(&"design".to_string()));
    assert!(cycle.contains(&"release".to_string()));
}

#[test]
fn timeline_serializes_for_the_host() {
    let engine = TimelineEngine::default();
    let (tasks, deps) = release_plan();

    let timeline = engine
        .build_timeline(&tasks, &deps, None, None, d(2025, 3, 20))
        .unwrap();

    let json = serde_json::to_string(&timeline).unwrap();
    let back: timegraph::TimelineData = serde_json::from_str(&json).unwrap();
    assert_eq!(timeline, back);

    let analysis = engine.analyze_critical_path(&timeline);
    let json = serde_json::to_string(&analysis).unwrap();
    assert!(json.contains("critical_tasks"));
}
