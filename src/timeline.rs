//! Timeline assembly: selection, duration resolution, and CPM composed
//! into a single view for presentation and analytics consumers.

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, Utc};
use rustc_hash::FxHashMap;
use thiserror::Error;
use tracing::debug;

use crate::config::EngineConfig;
use crate::cpm::run_cpm;
use crate::duration::{resolve_window, ResolvedWindow};
use crate::graph::{build_graph, detect_cycles, TimelineGraph};
use crate::models::{
    DateRange, DependencyRecord, Milestone, MilestoneSource, ScheduledTask, Task, TimelineData,
};

/// Scheduling failed because the dependency graph is not a DAG.
///
/// Reported as a value, never a panic: downstream consumers treat this as
/// "no critical path computable" and render the cycles.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("circular dependencies detected in task graph ({} cycle(s))", .cycles.len())]
pub struct CycleError {
    /// Each cycle as an ordered task-id sequence.
    pub cycles: Vec<Vec<String>>,
}

/// Build a timeline from raw task and dependency records.
///
/// Selection filters (project, window) are applied first; the resulting
/// graph is validated, duration-resolved, and run through the CPM passes.
/// No `ScheduledTask` set is produced for a cyclic graph.
pub fn build_timeline(
    tasks: &[Task],
    dependencies: &[DependencyRecord],
    project: Option<&str>,
    window: Option<&DateRange>,
    now: DateTime<Utc>,
    config: &EngineConfig,
) -> Result<TimelineData, CycleError> {
    let graph = build_graph(tasks, dependencies, project, window, config);
    assemble(&graph, now, config)
}

/// Validate a built graph and assemble the timeline view.
pub(crate) fn assemble(
    graph: &TimelineGraph,
    now: DateTime<Utc>,
    config: &EngineConfig,
) -> Result<TimelineData, CycleError> {
    let report = detect_cycles(graph);
    if !report.is_acyclic {
        return Err(CycleError {
            cycles: report.cycles,
        });
    }

    let windows: Vec<ResolvedWindow> = graph
        .tasks
        .iter()
        .map(|task| resolve_window(task, config))
        .collect();
    let durations: Vec<f64> = windows.iter().map(|w| w.duration_days).collect();

    // Validated acyclic above; the guard stays for the contract that this
    // stage can never loop or panic on bad input.
    let cpm = run_cpm(graph, &durations).map_err(|_| CycleError { cycles: Vec::new() })?;

    let epsilon = config.critical_float_epsilon;
    let mut scheduled: Vec<ScheduledTask> = graph
        .tasks
        .iter()
        .enumerate()
        .map(|(idx, task)| {
            let window = &windows[idx];
            let timing = &cpm.timings[idx];
            ScheduledTask {
                task: task.clone(),
                start: window.start,
                end: window.end,
                duration_days: window.duration_days,
                progress: window.progress,
                earliest_start: timing.earliest_start,
                earliest_finish: timing.earliest_finish,
                latest_start: timing.latest_start,
                latest_finish: timing.latest_finish,
                total_float: timing.total_float,
                is_critical: timing.is_critical(epsilon),
            }
        })
        .collect();

    scheduled.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| a.id().cmp(b.id())));

    let critical_ids: BTreeSet<String> = scheduled
        .iter()
        .filter(|t| t.is_critical)
        .map(|t| t.id().to_string())
        .collect();

    let milestones = build_milestones(&scheduled);
    let (range, schedule_origin) = effective_range(&scheduled, now, config);

    debug!(
        tasks = scheduled.len(),
        edges = graph.edges.len(),
        critical = critical_ids.len(),
        "timeline assembled"
    );

    Ok(TimelineData {
        tasks: scheduled,
        edges: graph.edges.clone(),
        critical_ids,
        milestones,
        range,
        schedule_origin,
        generated_at: now,
    })
}

/// Milestones: one per completed task at its resolved end, plus one
/// deadline marker per project at the latest resolved end of its tasks.
/// Ordered by date ascending, ties by id.
fn build_milestones(scheduled: &[ScheduledTask]) -> Vec<Milestone> {
    let mut milestones: Vec<Milestone> = Vec::new();

    for st in scheduled.iter().filter(|t| t.task.status.is_terminal()) {
        milestones.push(Milestone {
            id: format!("milestone-task-{}", st.id()),
            label: format!("{} completed", st.task.name),
            date: st.end,
            source: MilestoneSource::TaskCompletion,
            reference_id: st.id().to_string(),
        });
    }

    let mut project_ends: FxHashMap<&str, DateTime<Utc>> = FxHashMap::default();
    for st in scheduled {
        project_ends
            .entry(st.task.project_id.as_str())
            .and_modify(|end| {
                if st.end > *end {
                    *end = st.end;
                }
            })
            .or_insert(st.end);
    }
    let mut deadlines: Vec<(&str, DateTime<Utc>)> = project_ends.into_iter().collect();
    deadlines.sort_by(|a, b| a.0.cmp(b.0));
    for (project_id, end) in deadlines {
        milestones.push(Milestone {
            id: format!("milestone-project-{project_id}"),
            label: format!("{project_id} deadline"),
            date: end,
            source: MilestoneSource::ProjectDeadline,
            reference_id: project_id.to_string(),
        });
    }

    milestones.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));
    milestones
}

/// Effective date range and schedule origin.
///
/// Non-empty timelines pad the task extent by the configured margin; an
/// empty timeline falls back to a default window anchored at "now".
fn effective_range(
    scheduled: &[ScheduledTask],
    now: DateTime<Utc>,
    config: &EngineConfig,
) -> (DateRange, DateTime<Utc>) {
    let min_start = scheduled.iter().map(|t| t.start).min();
    let max_end = scheduled.iter().map(|t| t.end).max();

    match (min_start, max_end) {
        (Some(min_start), Some(max_end)) => {
            let padding = Duration::days(config.window_padding_days);
            (
                DateRange::new(min_start - padding, max_end + padding),
                min_start,
            )
        }
        _ => (
            DateRange::new(now, now + Duration::days(config.default_window_days)),
            now,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DependencyKind, TaskPriority, TaskStatus};
    use chrono::TimeZone;

    fn d(year: i32, month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap()
    }

    fn make_task(id: &str, duration_days: f64) -> Task {
        Task {
            id: id.to_string(),
            name: format!("Task {id}"),
            project_id: "p1".to_string(),
            status: TaskStatus::Ready,
            priority: TaskPriority::Medium,
            assignee: None,
            start_date: None,
            due_date: None,
            estimated_hours: duration_days * 8.0,
            actual_hours: 0.0,
            labels: vec![],
            parent_id: None,
            depends_on: vec![],
            created_at: d(2025, 1, 1),
        }
    }

    fn make_dep(pred: &str, succ: &str) -> DependencyRecord {
        DependencyRecord {
            id: format!("{pred}->{succ}"),
            predecessor_id: pred.to_string(),
            successor_id: succ.to_string(),
            kind: DependencyKind::FinishToStart,
            lag_days: 0.0,
        }
    }

    #[test]
    fn test_diamond_critical_set() {
        // a(1) -> b(3) -> d(1) and a -> c(1) -> d: the b-side is critical,
        // c carries two days of float.
        let tasks = vec![
            make_task("a", 1.0),
            make_task("b", 3.0),
            make_task("c", 1.0),
            make_task("d", 1.0),
        ];
        let deps = vec![
            make_dep("a", "b"),
            make_dep("a", "c"),
            make_dep("b", "d"),
            make_dep("c", "d"),
        ];
        let config = EngineConfig::default();

        let timeline =
            build_timeline(&tasks, &deps, None, None, d(2025, 2, 1), &config).unwrap();

        let critical: Vec<&str> = timeline.critical_ids.iter().map(String::as_str).collect();
        assert_eq!(critical, vec!["a", "b", "d"]);

        let c = timeline.task("c").unwrap();
        assert!((c.total_float - 2.0).abs() < 1e-9);
        assert!(!c.is_critical);
    }

    #[test]
    fn test_single_task_is_critical() {
        let tasks = vec![make_task("only", 2.0)];
        let config = EngineConfig::default();

        let timeline =
            build_timeline(&tasks, &[], None, None, d(2025, 2, 1), &config).unwrap();

        assert_eq!(timeline.tasks.len(), 1);
        assert!(timeline.critical_ids.contains("only"));
        let only = &timeline.tasks[0];
        assert!((only.total_float).abs() < 1e-9);
        assert!((only.duration_days - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_cycle_yields_error_with_sequences() {
        let tasks = vec![make_task("a", 1.0), make_task("b", 1.0)];
        let deps = vec![make_dep("a", "b"), make_dep("b", "a")];
        let config = EngineConfig::default();

        let err = build_timeline(&tasks, &deps, None, None, d(2025, 2, 1), &config)
            .unwrap_err();

        assert_eq!(err.cycles.len(), 1);
        assert_eq!(err.cycles[0].len(), 2);
    }

    #[test]
    fn test_tasks_sorted_by_start_then_id() {
        let mut early = make_task("zz", 1.0);
        early.start_date = Some(d(2025, 3, 1));
        let mut late = make_task("aa", 1.0);
        late.start_date = Some(d(2025, 3, 5));
        let mut tie = make_task("mm", 1.0);
        tie.start_date = Some(d(2025, 3, 1));
        let config = EngineConfig::default();

        let timeline = build_timeline(
            &[late, early, tie],
            &[],
            None,
            None,
            d(2025, 2, 1),
            &config,
        )
        .unwrap();

        let ids: Vec<&str> = timeline.tasks.iter().map(|t| t.id()).collect();
        assert_eq!(ids, vec!["mm", "zz", "aa"]);
    }

    #[test]
    fn test_range_padding() {
        let mut task = make_task("a", 1.0);
        task.start_date = Some(d(2025, 3, 10));
        task.due_date = Some(d(2025, 3, 12));
        let config = EngineConfig::default();

        let timeline =
            build_timeline(&[task], &[], None, None, d(2025, 2, 1), &config).unwrap();

        assert_eq!(timeline.range.start, d(2025, 3, 3));
        assert_eq!(timeline.range.end, d(2025, 3, 19));
        assert_eq!(timeline.schedule_origin, d(2025, 3, 10));
    }

    #[test]
    fn test_empty_input_default_window() {
        let config = EngineConfig::default();
        let now = d(2025, 2, 1);

        let timeline = build_timeline(&[], &[], None, None, now, &config).unwrap();

        assert!(timeline.tasks.is_empty());
        assert!(timeline.critical_ids.is_empty());
        assert!(timeline.milestones.is_empty());
        assert_eq!(timeline.range.start, now);
        assert_eq!(timeline.range.end, d(2025, 3, 3));
    }

    #[test]
    fn test_milestones_generated_and_ordered() {
        let mut done = make_task("done1", 1.0);
        done.status = TaskStatus::Done;
        done.start_date = Some(d(2025, 3, 1));
        done.due_date = Some(d(2025, 3, 2));
        let mut open = make_task("open1", 1.0);
        open.start_date = Some(d(2025, 3, 5));
        open.due_date = Some(d(2025, 3, 8));
        let config = EngineConfig::default();

        let timeline =
            build_timeline(&[done, open], &[], None, None, d(2025, 2, 1), &config).unwrap();

        // One completion milestone plus the p1 deadline.
        assert_eq!(timeline.milestones.len(), 2);
        assert_eq!(
            timeline.milestones[0].source,
            MilestoneSource::TaskCompletion
        );
        assert_eq!(timeline.milestones[0].date, d(2025, 3, 2));
        assert_eq!(
            timeline.milestones[1].source,
            MilestoneSource::ProjectDeadline
        );
        assert_eq!(timeline.milestones[1].date, d(2025, 3, 8));
        assert_eq!(timeline.milestones[1].reference_id, "p1");
    }

    #[test]
    fn test_idempotent_for_identical_inputs() {
        let tasks = vec![make_task("a", 2.0), make_task("b", 3.0)];
        let deps = vec![make_dep("a", "b")];
        let config = EngineConfig::default();
        let now = d(2025, 2, 1);

        let first = build_timeline(&tasks, &deps, None, None, now, &config).unwrap();
        let second = build_timeline(&tasks, &deps, None, None, now, &config).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_unknown_dependency_excluded_without_error() {
        let tasks = vec![make_task("a", 1.0)];
        let deps = vec![make_dep("a", "ghost")];
        let config = EngineConfig::default();

        let timeline =
            build_timeline(&tasks, &deps, None, None, d(2025, 2, 1), &config).unwrap();

        assert!(timeline.edges.is_empty());
        assert_eq!(timeline.tasks.len(), 1);
    }
}
