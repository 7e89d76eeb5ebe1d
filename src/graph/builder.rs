//! Graph construction from raw task and dependency records.

use rustc_hash::FxHashSet;
use tracing::debug;

use crate::config::EngineConfig;
use crate::duration::resolve_window;
use crate::models::{
    DateRange, DependencyEdge, DependencyKind, DependencyRecord, DependencySource, Task,
};

use super::index::{NodeId, TaskIndex};

/// An adjacency entry: the neighbor handle plus edge metadata.
#[derive(Clone, Copy, Debug)]
pub struct EdgeRef {
    pub node: NodeId,
    pub kind: DependencyKind,
    pub lag_days: f64,
}

/// Arena-backed dependency graph over the selected task set.
///
/// Nodes are indexed by dense integer handles; `tasks`, `successors` and
/// `predecessors` are all parallel to the handle space. String ids appear
/// only in [`TaskIndex`] and the normalized edge list.
#[derive(Debug)]
pub struct TimelineGraph {
    pub index: TaskIndex,
    /// Selected tasks, indexed by handle.
    pub tasks: Vec<Task>,
    /// Forward edges: predecessor -> successors.
    pub successors: Vec<Vec<EdgeRef>>,
    /// Reverse edges: successor -> predecessors.
    pub predecessors: Vec<Vec<EdgeRef>>,
    /// Normalized, deduplicated edge list in ingestion order.
    pub edges: Vec<DependencyEdge>,
}

impl TimelineGraph {
    pub fn node_count(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

/// Window-overlap test used when a date-range filter is given.
///
/// Tasks with both dates are kept on interval overlap; a single known date
/// must fall inside the range; undated tasks are tested on their resolved
/// (estimated) window.
pub(crate) fn overlaps_window(task: &Task, range: &DateRange, config: &EngineConfig) -> bool {
    match (task.start_date, task.due_date) {
        (Some(start), Some(due)) => range.overlaps(start, due),
        (Some(single), None) | (None, Some(single)) => range.contains(single),
        (None, None) => {
            let window = resolve_window(task, config);
            range.overlaps(window.start, window.end)
        }
    }
}

fn normalize(source: DependencySource) -> DependencyEdge {
    match source {
        DependencySource::Inline {
            predecessor_id,
            successor_id,
        } => DependencyEdge {
            predecessor_id,
            successor_id,
            kind: DependencyKind::FinishToStart,
            lag_days: 0.0,
        },
        DependencySource::Recorded(record) => DependencyEdge {
            predecessor_id: record.predecessor_id,
            successor_id: record.successor_id,
            kind: record.kind,
            lag_days: record.lag_days,
        },
    }
}

/// Build the dependency graph for the selected task set.
///
/// Tasks are selected by project (if given) and window overlap (if given).
/// Discrete dependency records are merged with legacy inline predecessor
/// lists; duplicate (predecessor, successor) pairs collapse with recorded
/// edges taking precedence. An edge with either endpoint outside the
/// selected set is dropped — accepted behavior, not an error.
pub fn build_graph(
    tasks: &[Task],
    dependencies: &[DependencyRecord],
    project: Option<&str>,
    window: Option<&DateRange>,
    config: &EngineConfig,
) -> TimelineGraph {
    let mut index = TaskIndex::with_capacity(tasks.len());
    let mut selected: Vec<Task> = Vec::with_capacity(tasks.len());

    for task in tasks {
        if let Some(project_id) = project {
            if task.project_id != project_id {
                continue;
            }
        }
        if let Some(range) = window {
            if !overlaps_window(task, range, config) {
                continue;
            }
        }
        // Duplicate task records: first one wins.
        if index.get(&task.id).is_some() {
            debug!(task_id = %task.id, "duplicate task record ignored");
            continue;
        }
        index.insert(&task.id);
        selected.push(task.clone());
    }

    let n = selected.len();
    let mut successors: Vec<Vec<EdgeRef>> = vec![Vec::new(); n];
    let mut predecessors: Vec<Vec<EdgeRef>> = vec![Vec::new(); n];
    let mut edges: Vec<DependencyEdge> = Vec::new();
    let mut seen: FxHashSet<(NodeId, NodeId)> = FxHashSet::default();

    // Recorded edges first so they win the dedup against inline ones.
    let recorded = dependencies
        .iter()
        .map(|record| DependencySource::Recorded(record.clone()));
    let inline = selected.iter().flat_map(|task| {
        task.depends_on.iter().map(|dep_id| DependencySource::Inline {
            predecessor_id: dep_id.clone(),
            successor_id: task.id.clone(),
        })
    });

    for source in recorded.chain(inline) {
        let edge = normalize(source);
        let (Some(pred), Some(succ)) = (
            index.get(&edge.predecessor_id),
            index.get(&edge.successor_id),
        ) else {
            debug!(
                predecessor = %edge.predecessor_id,
                successor = %edge.successor_id,
                "dependency references a task outside the selected set; dropped"
            );
            continue;
        };
        if !seen.insert((pred, succ)) {
            continue;
        }
        successors[pred as usize].push(EdgeRef {
            node: succ,
            kind: edge.kind,
            lag_days: edge.lag_days,
        });
        predecessors[succ as usize].push(EdgeRef {
            node: pred,
            kind: edge.kind,
            lag_days: edge.lag_days,
        });
        edges.push(edge);
    }

    TimelineGraph {
        index,
        tasks: selected,
        successors,
        predecessors,
        edges,
    }
}
