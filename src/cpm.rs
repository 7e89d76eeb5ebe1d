//! Critical-path-method passes over a validated dependency graph.
//!
//! Forward pass computes earliest start/finish, backward pass latest
//! start/finish, and total float falls out as their difference. Only
//! finish-to-start propagation is applied regardless of the stored edge
//! kind, matching the origin's documented simplification.

use std::collections::VecDeque;

use thiserror::Error;
use tracing::trace;

use crate::graph::{NodeId, TimelineGraph};

/// Errors from the CPM pass.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CpmError {
    #[error("circular dependency detected in task graph")]
    CircularDependency,
}

/// Per-task timing computed by the forward and backward passes.
///
/// All values are f64 day offsets from the schedule origin.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TaskTiming {
    pub earliest_start: f64,
    pub earliest_finish: f64,
    pub latest_start: f64,
    pub latest_finish: f64,
    /// Slack: `latest_start - earliest_start`.
    pub total_float: f64,
}

impl TaskTiming {
    /// Critical iff the float is zero within epsilon. The epsilon absorbs
    /// floating-point error from date-difference arithmetic.
    pub fn is_critical(&self, epsilon: f64) -> bool {
        self.total_float.abs() < epsilon
    }
}

/// Result of a full CPM computation.
#[derive(Clone, Debug, PartialEq)]
pub struct CpmResult {
    /// Timings indexed by node handle.
    pub timings: Vec<TaskTiming>,
    /// Project length: the maximum earliest finish.
    pub project_end: f64,
}

/// Topological order via Kahn's algorithm.
///
/// An incomplete order means the graph has a cycle; the iterative queue
/// cannot loop on cyclic input, which is the defensive guard required of
/// this pass even when validation was bypassed.
pub fn topological_order(graph: &TimelineGraph) -> Result<Vec<NodeId>, CpmError> {
    let n = graph.node_count();
    let mut in_degree: Vec<usize> = graph.predecessors.iter().map(Vec::len).collect();

    let mut queue: VecDeque<NodeId> = (0..n as NodeId)
        .filter(|&node| in_degree[node as usize] == 0)
        .collect();
    let mut order: Vec<NodeId> = Vec::with_capacity(n);

    while let Some(node) = queue.pop_front() {
        order.push(node);
        for edge in &graph.successors[node as usize] {
            let degree = &mut in_degree[edge.node as usize];
            *degree -= 1;
            if *degree == 0 {
                queue.push_back(edge.node);
            }
        }
    }

    if order.len() != n {
        return Err(CpmError::CircularDependency);
    }

    Ok(order)
}

/// Run the forward and backward passes.
///
/// `durations` is indexed by node handle and must already be clamped to the
/// one-day floor by the duration resolver.
pub fn run_cpm(graph: &TimelineGraph, durations: &[f64]) -> Result<CpmResult, CpmError> {
    let order = topological_order(graph)?;
    let n = graph.node_count();
    let mut timings = vec![TaskTiming::default(); n];

    // Forward pass: earliest start is the latest predecessor finish plus
    // lag, floored at the schedule origin.
    for &node in &order {
        let idx = node as usize;
        let mut earliest_start = 0.0_f64;
        for edge in &graph.predecessors[idx] {
            let dep_finish = timings[edge.node as usize].earliest_finish + edge.lag_days;
            if dep_finish > earliest_start {
                earliest_start = dep_finish;
            }
        }
        timings[idx].earliest_start = earliest_start;
        timings[idx].earliest_finish = earliest_start + durations[idx];
    }

    let project_end = timings
        .iter()
        .map(|t| t.earliest_finish)
        .fold(0.0, f64::max);

    // Backward pass in reverse topological order: sinks anchor at the
    // project end, everything else at its most demanding successor.
    for &node in order.iter().rev() {
        let idx = node as usize;
        let mut latest_finish = f64::MAX;
        for edge in &graph.successors[idx] {
            let required_finish = timings[edge.node as usize].latest_start - edge.lag_days;
            if required_finish < latest_finish {
                latest_finish = required_finish;
            }
        }
        if latest_finish == f64::MAX {
            latest_finish = project_end;
        }
        timings[idx].latest_finish = latest_finish;
        timings[idx].latest_start = latest_finish - durations[idx];
        timings[idx].total_float = timings[idx].latest_start - timings[idx].earliest_start;
    }

    trace!(nodes = n, project_end, "cpm passes complete");

    Ok(CpmResult {
        timings,
        project_end,
    })
}
