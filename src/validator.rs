use crate::error::CycleError;
use crate::graph::NodeRef;
use ahash::AHashSet;
use std::collections::BTreeSet;

/// The linear pre-order of a graph, with each nested node's inner content
/// inlined as a contiguous block right after it.
pub type Ordering<'g> = Vec<NodeRef<'g>>;

/// How unreachable nodes affect the validation outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Severity {
    /// Log the unreachable ids and still report the graph as valid.
    Warn,
    /// Report the graph as invalid.
    #[default]
    Error,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidatorConfig {
    pub unreachable: Severity,
}

/// Outcome of [`validate`].
#[derive(Debug, Clone)]
pub struct ValidationReport<'g> {
    pub ok: bool,
    pub ordering: Ordering<'g>,
    pub unreachable: BTreeSet<String>,
}

enum Visit<'g> {
    Enter(NodeRef<'g>),
    Exit(u64),
}

/// Walks the graph from `root` and returns its pre-order.
///
/// Iterative depth-first search over an explicit stack. A node reached
/// again while it is still on the current path closes a cycle. A node
/// reached again through another parent after it has been finished
/// (a diamond) is legal and keeps its first position in the ordering.
///
/// For nested nodes the inner start node is pushed last, so the inner
/// graph is walked immediately and lands as one contiguous block before
/// the nested node's own children.
pub fn check_for_cycles<'g>(root: NodeRef<'g>) -> Result<Ordering<'g>, CycleError> {
    let mut stack = vec![Visit::Enter(root)];
    let mut visited = AHashSet::new();
    let mut on_path = AHashSet::new();
    let mut ordering = Vec::new();

    while let Some(visit) = stack.pop() {
        let node = match visit {
            Visit::Enter(node) => node,
            Visit::Exit(n_id) => {
                on_path.remove(&n_id);
                continue;
            }
        };

        if on_path.contains(&node.n_id()) {
            tracing::error!(
                id = node.id(),
                "Cycle detected, node is referenced to create a cycle"
            );
            return Err(CycleError {
                node_id: node.id().to_string(),
            });
        }
        if !visited.insert(node.n_id()) {
            continue;
        }
        on_path.insert(node.n_id());
        ordering.push(node);
        stack.push(Visit::Exit(node.n_id()));

        stack.extend(node.children().rev().map(Visit::Enter));
        if let Some(inner_start) = node.inner_start() {
            stack.push(Visit::Enter(inner_start));
        }
    }

    Ok(ordering)
}

/// Declared ids that never appear in `ordering`.
pub fn unreachable_nodes(ordering: &[NodeRef<'_>], declared: &BTreeSet<String>) -> BTreeSet<String> {
    let reached: AHashSet<&str> = ordering.iter().map(|node| node.node().id()).collect();
    declared
        .iter()
        .filter(|id| !reached.contains(id.as_str()))
        .cloned()
        .collect()
}

pub fn has_unreachable_nodes(ordering: &[NodeRef<'_>], declared: &BTreeSet<String>) -> bool {
    !unreachable_nodes(ordering, declared).is_empty()
}

/// Checks for cycles, then for unreachable nodes.
///
/// A cycle is an error. Unreachable nodes make the report not ok unless
/// `config` downgrades them to a warning.
pub fn validate<'g>(
    root: NodeRef<'g>,
    declared: &BTreeSet<String>,
    config: &ValidatorConfig,
) -> Result<ValidationReport<'g>, CycleError> {
    let ordering = check_for_cycles(root)?;
    let unreachable = unreachable_nodes(&ordering, declared);

    let ok = match (unreachable.is_empty(), config.unreachable) {
        (true, _) => true,
        (false, Severity::Warn) => {
            tracing::warn!(?unreachable, "Found unreachable nodes");
            true
        }
        (false, Severity::Error) => {
            tracing::error!(?unreachable, "Found unreachable nodes");
            false
        }
    };

    Ok(ValidationReport {
        ok,
        ordering,
        unreachable,
    })
}
