//! Post-hoc filtering of an assembled timeline.
//!
//! All supplied predicates apply conjunctively. The surviving tasks induce a
//! subgraph whose critical path is recomputed from scratch: removing nodes
//! changes float values, so the filtered critical set is never assumed to be
//! a subset of the unfiltered one.

use std::collections::BTreeSet;

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::EngineConfig;
use crate::graph::{build_graph, overlaps_window};
use crate::models::{
    DateRange, DependencyEdge, DependencyRecord, ScheduledTask, Task, TaskPriority, TaskStatus,
    TimelineData,
};
use crate::timeline::assemble;

/// Completion buckets derived from workflow status.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionBucket {
    Completed,
    InFlight,
    NotStarted,
}

/// Filter criteria; unset fields do not constrain.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TimelineFilter {
    pub assignee: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    /// Task-type facet; the origin carries task types as labels.
    pub label: Option<String>,
    /// Case-insensitive search over name, id, assignee, and labels.
    pub search: Option<String>,
    pub overdue_only: bool,
    pub date_range: Option<DateRange>,
    pub completion: Option<CompletionBucket>,
}

/// Counters describing what the filter kept.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterStats {
    pub total: usize,
    pub filtered: usize,
    pub overdue: usize,
    pub completed: usize,
    pub critical: usize,
}

/// A filtered timeline with its statistics.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FilteredTimeline {
    pub data: TimelineData,
    pub stats: FilterStats,
}

/// Overdue: resolved end before "now" and status not terminal.
pub(crate) fn is_overdue(task: &ScheduledTask, now: chrono::DateTime<chrono::Utc>) -> bool {
    task.end < now && !task.task.status.is_terminal()
}

fn completion_bucket(status: TaskStatus) -> CompletionBucket {
    if status.is_terminal() {
        CompletionBucket::Completed
    } else if status.is_started() {
        CompletionBucket::InFlight
    } else {
        CompletionBucket::NotStarted
    }
}

fn matches_search(task: &Task, needle: &str) -> bool {
    task.name.to_lowercase().contains(needle)
        || task.id.to_lowercase().contains(needle)
        || task
            .assignee
            .as_deref()
            .is_some_and(|a| a.to_lowercase().contains(needle))
        || task.labels.iter().any(|l| l.to_lowercase().contains(needle))
}

fn matches(
    st: &ScheduledTask,
    filter: &TimelineFilter,
    now: chrono::DateTime<chrono::Utc>,
    config: &EngineConfig,
) -> bool {
    if let Some(assignee) = &filter.assignee {
        if st.task.assignee.as_deref() != Some(assignee.as_str()) {
            return false;
        }
    }
    if let Some(status) = filter.status {
        if st.task.status != status {
            return false;
        }
    }
    if let Some(priority) = filter.priority {
        if st.task.priority != priority {
            return false;
        }
    }
    if let Some(label) = &filter.label {
        if !st.task.labels.iter().any(|l| l == label) {
            return false;
        }
    }
    if let Some(search) = &filter.search {
        let needle = search.trim().to_lowercase();
        if !needle.is_empty() && !matches_search(&st.task, &needle) {
            return false;
        }
    }
    if filter.overdue_only && !is_overdue(st, now) {
        return false;
    }
    if let Some(range) = &filter.date_range {
        if !overlaps_window(&st.task, range, config) {
            return false;
        }
    }
    if let Some(bucket) = filter.completion {
        if completion_bucket(st.task.status) != bucket {
            return false;
        }
    }
    true
}

/// Apply a filter to an assembled timeline.
///
/// The filtered view is reassembled with the same rules as the original
/// build (milestones, range, critical set), computed over the induced
/// subgraph only.
pub fn apply_filter(
    timeline: &TimelineData,
    filter: &TimelineFilter,
    config: &EngineConfig,
) -> FilteredTimeline {
    let now = timeline.generated_at;

    let surviving: Vec<&ScheduledTask> = timeline
        .tasks
        .iter()
        .filter(|st| matches(st, filter, now, config))
        .collect();

    let ids: FxHashSet<&str> = surviving.iter().map(|st| st.id()).collect();
    let edges: Vec<DependencyEdge> = timeline
        .edges
        .iter()
        .filter(|e| {
            ids.contains(e.predecessor_id.as_str()) && ids.contains(e.successor_id.as_str())
        })
        .cloned()
        .collect();

    let tasks: Vec<Task> = surviving.iter().map(|st| st.task.clone()).collect();
    let records: Vec<DependencyRecord> = edges
        .iter()
        .map(|e| DependencyRecord {
            id: format!("{}->{}", e.predecessor_id, e.successor_id),
            predecessor_id: e.predecessor_id.clone(),
            successor_id: e.successor_id.clone(),
            kind: e.kind,
            lag_days: e.lag_days,
        })
        .collect();

    let graph = build_graph(&tasks, &records, None, None, config);
    let data = match assemble(&graph, now, config) {
        Ok(data) => data,
        // An induced subgraph of a validated DAG cannot contain a cycle;
        // if it ever did, degrade to "no critical path computable".
        Err(_) => {
            let mut tasks: Vec<ScheduledTask> =
                surviving.iter().map(|&st| st.clone()).collect();
            for t in &mut tasks {
                t.is_critical = false;
            }
            TimelineData {
                tasks,
                edges,
                critical_ids: BTreeSet::new(),
                milestones: Vec::new(),
                range: timeline.range,
                schedule_origin: timeline.schedule_origin,
                generated_at: now,
            }
        }
    };

    let stats = FilterStats {
        total: timeline.tasks.len(),
        filtered: data.tasks.len(),
        overdue: data.tasks.iter().filter(|st| is_overdue(st, now)).count(),
        completed: data
            .tasks
            .iter()
            .filter(|st| st.task.status.is_terminal())
            .count(),
        critical: data.critical_ids.len(),
    };

    debug!(
        total = stats.total,
        filtered = stats.filtered,
        critical = stats.critical,
        "timeline filtered"
    );

    FilteredTimeline { data, stats }
}
