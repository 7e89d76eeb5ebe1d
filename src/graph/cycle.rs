//! Cycle detection over the dependency graph.

use tracing::warn;

use super::builder::TimelineGraph;
use super::index::NodeId;

/// Outcome of cycle validation.
///
/// Timing computation must not run unless `is_acyclic` is true.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CycleReport {
    pub is_acyclic: bool,
    /// Each cycle as an ordered task-id sequence, from the first repeated
    /// node through the node whose edge closes the loop.
    pub cycles: Vec<Vec<String>>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    Visiting,
    Visited,
}

/// Depth-first cycle detection with an explicit stack.
///
/// Visiting/visited marks follow the classic coloring scheme; the active
/// path is tracked so a closing edge can be reported as the full cyclic
/// subsequence. Descent stops at the closing edge, but remaining siblings
/// and other components are still checked, so several disjoint cycles can
/// be reported from one pass.
pub fn detect_cycles(graph: &TimelineGraph) -> CycleReport {
    let n = graph.node_count();
    let mut marks = vec![Mark::Unvisited; n];
    let mut cycles: Vec<Vec<String>> = Vec::new();

    // (node, cursor into its successor list)
    let mut stack: Vec<(NodeId, usize)> = Vec::new();
    let mut path: Vec<NodeId> = Vec::new();

    for root in 0..n as NodeId {
        if marks[root as usize] != Mark::Unvisited {
            continue;
        }
        marks[root as usize] = Mark::Visiting;
        stack.push((root, 0));
        path.push(root);

        while let Some(&(node, cursor)) = stack.last() {
            let succs = &graph.successors[node as usize];
            if cursor >= succs.len() {
                marks[node as usize] = Mark::Visited;
                path.pop();
                stack.pop();
                continue;
            }
            if let Some(frame) = stack.last_mut() {
                frame.1 += 1;
            }

            let next = succs[cursor].node;
            match marks[next as usize] {
                Mark::Unvisited => {
                    marks[next as usize] = Mark::Visiting;
                    stack.push((next, 0));
                    path.push(next);
                }
                Mark::Visiting => {
                    // Closing edge: the cycle runs from the first occurrence
                    // of `next` on the active path through `node`.
                    if let Some(pos) = path.iter().position(|&p| p == next) {
                        let cycle: Vec<String> = path[pos..]
                            .iter()
                            .filter_map(|&p| graph.index.resolve(p))
                            .map(str::to_string)
                            .collect();
                        warn!(cycle = ?cycle, "circular dependency detected");
                        cycles.push(cycle);
                    }
                }
                Mark::Visited => {}
            }
        }
    }

    CycleReport {
        is_acyclic: cycles.is_empty(),
        cycles,
    }
}
