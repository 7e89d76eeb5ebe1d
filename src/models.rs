//! Core data types for the timeline engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Workflow states, ordered from least to most complete.
///
/// `Done` is the terminal state; everything else is considered open.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Backlog,
    Ready,
    InProgress,
    Review,
    Done,
}

impl TaskStatus {
    /// True for the terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Done)
    }

    /// True once work has begun (in-flight or finished).
    pub fn is_started(&self) -> bool {
        matches!(
            self,
            TaskStatus::InProgress | TaskStatus::Review | TaskStatus::Done
        )
    }
}

/// Task priority levels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
    Critical,
}

/// A task record as handed over by the host's persistence layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub name: String,
    pub project_id: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    #[serde(default)]
    pub assignee: Option<String>,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub estimated_hours: f64,
    #[serde(default)]
    pub actual_hours: f64,
    #[serde(default)]
    pub labels: Vec<String>,
    /// Hierarchy display only; never used in scheduling.
    #[serde(default)]
    pub parent_id: Option<String>,
    /// Legacy inline predecessor ids stored directly on the task.
    #[serde(default)]
    pub depends_on: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Dependency relationship kinds.
///
/// All four kinds are stored and carried on edges, but timing propagation is
/// finish-based for every kind (a documented simplification of the origin).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyKind {
    #[default]
    FinishToStart,
    StartToStart,
    FinishToFinish,
    StartToFinish,
}

/// A discrete dependency record between two tasks.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DependencyRecord {
    pub id: String,
    pub predecessor_id: String,
    pub successor_id: String,
    #[serde(rename = "type", default)]
    pub kind: DependencyKind,
    /// Signed offset in days applied when propagating timing; negative = lead.
    #[serde(default)]
    pub lag_days: f64,
}

/// A dependency as it arrives from the host, before normalization.
///
/// The legacy data model stored predecessor ids inline on the successor task;
/// newer data uses discrete records. Both shapes resolve to a
/// [`DependencyEdge`] before the graph is built, recorded edges taking
/// precedence over inline ones for the same (predecessor, successor) pair.
#[derive(Clone, Debug, PartialEq)]
pub enum DependencySource {
    Inline {
        predecessor_id: String,
        successor_id: String,
    },
    Recorded(DependencyRecord),
}

/// A normalized dependency edge between two selected tasks.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DependencyEdge {
    pub predecessor_id: String,
    pub successor_id: String,
    pub kind: DependencyKind,
    pub lag_days: f64,
}

/// A task with its resolved window and computed CPM timing.
///
/// Immutable once produced; CPM fields are f64 day offsets from the
/// timeline's `schedule_origin`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScheduledTask {
    pub task: Task,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub duration_days: f64,
    /// Completion percentage, 0-100.
    pub progress: f64,
    pub earliest_start: f64,
    pub earliest_finish: f64,
    pub latest_start: f64,
    pub latest_finish: f64,
    /// Slack: how far the start may slip without delaying the project.
    pub total_float: f64,
    pub is_critical: bool,
}

impl ScheduledTask {
    pub fn id(&self) -> &str {
        &self.task.id
    }
}

/// Where a milestone comes from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MilestoneSource {
    TaskCompletion,
    ProjectDeadline,
}

/// A read-only marker on the timeline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Milestone {
    pub id: String,
    pub label: String,
    pub date: DateTime<Utc>,
    pub source: MilestoneSource,
    /// Task id for completions, project id for deadlines.
    pub reference_id: String,
}

/// An inclusive date window.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant <= self.end
    }

    /// Interval overlap test: `start <= range_end && end >= range_start`.
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        start <= self.end && end >= self.start
    }
}

/// A fully assembled timeline view.
///
/// Tasks are sorted ascending by resolved start, ties broken by task id, so
/// identical inputs produce byte-identical output.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimelineData {
    pub tasks: Vec<ScheduledTask>,
    /// Dependency edges restricted to the selected task set.
    pub edges: Vec<DependencyEdge>,
    /// Ids of zero-float tasks. A set, not a chain: disjoint critical
    /// chains are possible and not distinguished.
    pub critical_ids: BTreeSet<String>,
    pub milestones: Vec<Milestone>,
    /// Effective date range: task extent padded by the configured margin,
    /// or a default window anchored at `generated_at` when empty.
    pub range: DateRange,
    /// Anchor for the CPM day offsets: minimum resolved start.
    pub schedule_origin: DateTime<Utc>,
    /// The injected "now" this timeline was computed against.
    pub generated_at: DateTime<Utc>,
}

impl TimelineData {
    /// Look up a scheduled task by id.
    pub fn task(&self, id: &str) -> Option<&ScheduledTask> {
        self.tasks.iter().find(|t| t.id() == id)
    }
}
