use super::{VisualizationUnit, build_visualization};
use crate::error::VisualizationError;
use crate::graph::NodeRef;
use ahash::AHashSet;
use itertools::Itertools;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

static HEX_COLOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^#(?:[0-9a-fA-F]{6}|[0-9a-fA-F]{8})$").expect("hex colour pattern is valid")
});

/// Graph-level settings of the rendered diagram.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DotOptions {
    pub graph_attributes: BTreeMap<String, String>,
}

impl Default for DotOptions {
    fn default() -> Self {
        let mut graph_attributes = BTreeMap::new();
        graph_attributes.insert("compound".to_string(), "true".to_string());
        Self { graph_attributes }
    }
}

/// Formats one `key=value` attribute. Colour literals are quoted, every
/// other value is emitted as is.
pub fn format_attribute(key: &str, value: &str) -> String {
    if HEX_COLOR.is_match(value) {
        format!("{}=\"{}\"", key, value)
    } else {
        format!("{}={}", key, value)
    }
}

fn quoted(text: &str) -> String {
    format!("\"{}\"", text.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Ordering-preserving set of `from -> to` edges.
#[derive(Default)]
struct Edges {
    seen: AHashSet<(u64, u64)>,
    ordered: Vec<(u64, u64)>,
}

impl Edges {
    fn add(&mut self, from: u64, to: u64) {
        if self.seen.insert((from, to)) {
            self.ordered.push((from, to));
        }
    }
}

/// Renders `ordering` as DOT text, clustering each nested node's content.
pub fn render_dot(
    ordering: &[NodeRef<'_>],
    options: &DotOptions,
) -> Result<String, VisualizationError> {
    let structure = build_visualization(ordering)?;
    Ok(generate_dot(ordering, &structure, options))
}

/// Renders an already clustered structure as DOT text.
pub fn generate_dot(
    ordering: &[NodeRef<'_>],
    structure: &[VisualizationUnit<'_>],
    options: &DotOptions,
) -> String {
    let mut dot = String::from("digraph {\n");
    for (key, value) in &options.graph_attributes {
        dot.push_str(&format!("\t{};\n", format_attribute(key, value)));
    }

    write_units(&mut dot, structure, 1);

    let mut edges = Edges::default();
    collect_edges(structure, &mut edges);
    connect_dangling(ordering, structure, &mut edges);
    for (from, to) in &edges.ordered {
        dot.push_str(&format!("\t{}->{};\n", from, to));
    }

    dot.push_str("}\n");
    dot
}

fn declare(dot: &mut String, node: NodeRef<'_>, depth: usize) {
    let attributes = node
        .draw_options()
        .iter()
        .map(|(key, value)| format_attribute(key, value))
        .chain(std::iter::once(format!("label={}", quoted(node.id()))))
        .join(", ");
    dot.push_str(&format!(
        "{}{} [{}];\n",
        "\t".repeat(depth),
        node.n_id(),
        attributes
    ));
}

fn write_units(dot: &mut String, units: &[VisualizationUnit<'_>], depth: usize) {
    let indent = "\t".repeat(depth);
    for unit in units {
        match unit {
            VisualizationUnit::Node(node) => declare(dot, *node, depth),
            VisualizationUnit::Cluster { owner, members } => {
                declare(dot, *owner, depth);
                let cluster_id = members
                    .first()
                    .map(|member| member.first_node().n_id())
                    .unwrap_or(owner.n_id());
                dot.push_str(&format!("{}subgraph cluster_{} {{\n", indent, cluster_id));
                dot.push_str(&format!("{}\tlabel={};\n", indent, quoted(owner.id())));
                write_units(dot, members, depth + 1);
                dot.push_str(&format!("{}}}\n", indent));
            }
        }
    }
}

fn collect_edges(units: &[VisualizationUnit<'_>], edges: &mut Edges) {
    for unit in units {
        match unit {
            VisualizationUnit::Node(node) => {
                if node.is_nested() {
                    continue;
                }
                for child in node.children() {
                    edges.add(node.n_id(), child.n_id());
                }
            }
            VisualizationUnit::Cluster { owner, members } => {
                if let Some(first) = members.first() {
                    edges.add(owner.n_id(), first.first_node().n_id());
                }
                collect_edges(members, edges);
                // The owner's own children hang off the end of its content.
                let exit = unit.last_node();
                for child in owner.children() {
                    edges.add(exit.n_id(), child.n_id());
                }
            }
        }
    }
}

/// Wires every node without an outgoing edge to the first node after the
/// last top-level cluster, so the drawing stays connected.
fn connect_dangling(
    ordering: &[NodeRef<'_>],
    structure: &[VisualizationUnit<'_>],
    edges: &mut Edges,
) {
    let Some(last) = ordering.last() else {
        return;
    };
    let Some(target) = structure
        .iter()
        .rposition(|unit| matches!(unit, VisualizationUnit::Cluster { .. }))
        .and_then(|position| structure.get(position + 1))
        .map(VisualizationUnit::first_node)
    else {
        return;
    };

    let sources: AHashSet<u64> = edges.ordered.iter().map(|(from, _)| *from).collect();
    let dangling: Vec<u64> = ordering
        .iter()
        .take_while(|node| node.n_id() != target.n_id())
        .map(|node| node.n_id())
        .filter(|n_id| *n_id != last.n_id() && !sources.contains(n_id))
        .collect();
    for n_id in dangling {
        edges.add(n_id, target.n_id());
    }
}
