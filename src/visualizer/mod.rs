//! Recovers the nesting of a flat execution ordering so it can be drawn
//! with one cluster per nested node.
//!
//! The validator inlines the inner content of every nested node right after
//! it. A nested node's content ends where its declared "next" node (its first
//! child) first shows up again, which gives one index range per nested node.
//! Because of the pre-order inlining these ranges telescope: two ranges are
//! either disjoint or one contains the other. Collapsing them from the
//! innermost outward yields the cluster tree.

use crate::error::VisualizationError;
use crate::graph::{Graph, NodeRef};

mod dot;

pub use dot::{DotOptions, format_attribute, generate_dot, render_dot};

/// One element of the clustered view: a plain node, or a nested node
/// together with the units that make up its inner content.
#[derive(Debug, Clone, PartialEq)]
pub enum VisualizationUnit<'g> {
    Node(NodeRef<'g>),
    Cluster {
        owner: NodeRef<'g>,
        members: Vec<VisualizationUnit<'g>>,
    },
}

impl<'g> VisualizationUnit<'g> {
    /// The node this unit is entered through.
    pub fn first_node(&self) -> NodeRef<'g> {
        match self {
            VisualizationUnit::Node(node) => *node,
            VisualizationUnit::Cluster { owner, .. } => *owner,
        }
    }

    /// The node this unit is left through.
    pub fn last_node(&self) -> NodeRef<'g> {
        match self {
            VisualizationUnit::Node(node) => *node,
            VisualizationUnit::Cluster { owner, members } => members
                .last()
                .map(VisualizationUnit::last_node)
                .unwrap_or(*owner),
        }
    }

    /// Whether the node with `n_id` appears anywhere inside this unit.
    pub fn contains(&self, n_id: u64) -> bool {
        match self {
            VisualizationUnit::Node(node) => node.n_id() == n_id,
            VisualizationUnit::Cluster { owner, members } => {
                owner.n_id() == n_id || members.iter().any(|member| member.contains(n_id))
            }
        }
    }
}

/// Half-open `[start, end)` range of the ordering covered by the nested
/// node at `start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Span {
    start: usize,
    end: usize,
}

impl Span {
    fn contains(&self, other: &Span) -> bool {
        other.start > self.start && other.end <= self.end
    }

    fn overlaps_end_of(&self, other: &Span) -> bool {
        other.start > self.start && other.start < self.end && other.end > self.end
    }
}

/// Builds the clustered view of `ordering`.
pub fn build_visualization<'g>(
    ordering: &[NodeRef<'g>],
) -> Result<Vec<VisualizationUnit<'g>>, VisualizationError> {
    let spans = discover_spans(ordering)?;
    let top_level = collapse(ordering, &spans)?;
    Ok(interleave(ordering, 0, ordering.len(), top_level))
}

fn discover_spans(ordering: &[NodeRef<'_>]) -> Result<Vec<Span>, VisualizationError> {
    let mut spans = Vec::new();

    for (start, node) in ordering.iter().enumerate() {
        if !node.is_nested() {
            continue;
        }
        // A childless nested node ends with its own content. Back-to-back
        // nesting therefore ends where the enclosing node's "next" appears.
        let end = match node.first_child() {
            Some(next) => (start..ordering.len())
                .find(|&j| ordering[j].n_id() == next.n_id())
                .ok_or_else(|| VisualizationError::NextNodeNotFound {
                    node_id: node.id().to_string(),
                    next_id: next.id().to_string(),
                })?,
            None => inner_extent(ordering, start),
        };
        spans.push(Span { start, end });
    }

    Ok(spans)
}

/// End of the inlined content of the nested node at `start`: the first
/// position holding a node from outside its inner graphs.
fn inner_extent(ordering: &[NodeRef<'_>], start: usize) -> usize {
    let mut graphs = Vec::new();
    if let Some(inner) = ordering[start].kind().inner() {
        collect_graphs(inner.graph(), &mut graphs);
    }
    (start + 1..ordering.len())
        .find(|&j| !graphs.iter().any(|graph| std::ptr::eq(ordering[j].graph(), *graph)))
        .unwrap_or(ordering.len())
}

fn collect_graphs<'g>(graph: &'g Graph, graphs: &mut Vec<&'g Graph>) {
    graphs.push(graph);
    for node in graph.nodes() {
        if let Some(inner) = node.kind().inner() {
            collect_graphs(inner.graph(), graphs);
        }
    }
}

fn collapse<'g>(
    ordering: &[NodeRef<'g>],
    spans: &[Span],
) -> Result<Vec<(Span, VisualizationUnit<'g>)>, VisualizationError> {
    let mut collapsed: Vec<(Span, VisualizationUnit<'g>)> = Vec::new();

    for span in spans.iter().rev() {
        if let Some((overlapping, _)) = collapsed
            .iter()
            .find(|(candidate, _)| span.overlaps_end_of(candidate))
        {
            return Err(VisualizationError::PartialOverlap {
                outer: ordering[span.start].id().to_string(),
                inner: ordering[overlapping.start].id().to_string(),
            });
        }

        let (contained, rest): (Vec<_>, Vec<_>) = collapsed
            .into_iter()
            .partition(|(candidate, _)| span.contains(candidate));
        collapsed = rest;

        let members = interleave(ordering, span.start + 1, span.end, contained);
        collapsed.push((
            *span,
            VisualizationUnit::Cluster {
                owner: ordering[span.start],
                members,
            },
        ));
    }

    Ok(collapsed)
}

/// Walks `ordering[from..to]`, emitting literal nodes and splicing in the
/// already collapsed clusters where their ranges begin.
fn interleave<'g>(
    ordering: &[NodeRef<'g>],
    from: usize,
    to: usize,
    mut clusters: Vec<(Span, VisualizationUnit<'g>)>,
) -> Vec<VisualizationUnit<'g>> {
    clusters.sort_by_key(|(span, _)| span.start);
    let mut clusters = clusters.into_iter().peekable();
    let mut units = Vec::new();
    let mut position = from;

    while position < to {
        match clusters.next_if(|(span, _)| span.start == position) {
            Some((span, cluster)) => {
                units.push(cluster);
                position = span.end;
            }
            None => {
                units.push(VisualizationUnit::Node(ordering[position]));
                position += 1;
            }
        }
    }

    units
}
