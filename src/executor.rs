use crate::context::Context;
use crate::error::ExecutionError;
use crate::graph::{Graph, NodeIndex};
use crate::node::Outcome;

/// Counts of what happened during one traversal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Executions that continued into their children.
    pub executed: usize,
    /// Executions that pruned their branch.
    pub skipped: usize,
}

/// Runs `graph` from `start`, threading `context` through every node.
///
/// Depth-first over an explicit stack. Unlike validation, nodes are not
/// deduplicated: a node reachable from two parents runs once per arrival.
/// A node returning [`Outcome::Skip`] keeps its children off the stack.
/// The first error aborts the traversal.
pub fn run_graph(
    graph: &mut Graph,
    start: NodeIndex,
    context: &mut Context,
) -> Result<RunSummary, ExecutionError> {
    let mut summary = RunSummary::default();
    let mut stack = vec![start];

    while let Some(index) = stack.pop() {
        let node = graph.node_mut(index);
        match node.execute(context)? {
            Outcome::Skip => {
                tracing::debug!(id = node.id(), "Skip result, not continuing with this branch");
                summary.skipped += 1;
            }
            Outcome::Continue => {
                summary.executed += 1;
                stack.extend(node.children().iter().rev().copied());
            }
        }
    }

    Ok(summary)
}
