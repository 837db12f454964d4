use crate::context::Context;
use crate::error::ExecutionError;
use crate::executor::{RunSummary, run_graph};
use crate::node::Node;
use ahash::AHashMap;
use std::fmt;
use std::ops::Deref;

mod builder;

pub use builder::BuildSession;

/// Position of a node inside the graph that owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeIndex(usize);

impl NodeIndex {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A built graph: every declared node, addressable by its string id.
///
/// Children are stored as indices into the same graph, so a node may be
/// the child of several parents and back-edges can be represented (and
/// later rejected by validation).
#[derive(Debug, Default)]
pub struct Graph {
    nodes: Vec<Node>,
    index: AHashMap<String, NodeIndex>,
}

impl Graph {
    pub(crate) fn push(&mut self, node: Node) -> NodeIndex {
        let index = NodeIndex(self.nodes.len());
        self.index.insert(node.id().to_string(), index);
        self.nodes.push(node);
        index
    }

    pub fn index_of(&self, id: &str) -> Option<NodeIndex> {
        self.index.get(id).copied()
    }

    pub fn get(&self, id: &str) -> Option<&Node> {
        self.index_of(id).map(|index| &self.nodes[index.0])
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Node> {
        let index = self.index_of(id)?;
        Some(&mut self.nodes[index.0])
    }

    pub fn node(&self, index: NodeIndex) -> &Node {
        &self.nodes[index.0]
    }

    pub fn node_mut(&mut self, index: NodeIndex) -> &mut Node {
        &mut self.nodes[index.0]
    }

    /// A traversable handle to the node declared under `id`.
    pub fn node_ref(&self, id: &str) -> Option<NodeRef<'_>> {
        self.index_of(id).map(|index| NodeRef { graph: self, index })
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Resets the arrival counters of every sink in this graph.
    pub fn rearm(&mut self) {
        self.nodes.iter_mut().for_each(Node::rearm);
    }
}

/// A borrowed node together with the graph that owns it, so children can
/// be followed without knowing which (possibly nested) graph it lives in.
#[derive(Clone, Copy)]
pub struct NodeRef<'g> {
    graph: &'g Graph,
    index: NodeIndex,
}

impl<'g> NodeRef<'g> {
    pub fn graph(&self) -> &'g Graph {
        self.graph
    }

    pub fn index(&self) -> NodeIndex {
        self.index
    }

    pub fn node(&self) -> &'g Node {
        &self.graph.nodes[self.index.0]
    }

    /// Declared children, in declaration order.
    pub fn children(&self) -> impl DoubleEndedIterator<Item = NodeRef<'g>> + use<'g> {
        let graph = self.graph;
        self.node()
            .children()
            .iter()
            .map(move |&index| NodeRef { graph, index })
    }

    pub fn first_child(&self) -> Option<NodeRef<'g>> {
        self.children().next()
    }

    /// Start node of the private inner graph, for nested kinds.
    pub fn inner_start(&self) -> Option<NodeRef<'g>> {
        self.node().kind().inner().map(Subgraph::start)
    }
}

impl<'g> Deref for NodeRef<'g> {
    type Target = Node;

    fn deref(&self) -> &Node {
        self.node()
    }
}

impl PartialEq for NodeRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.graph, other.graph) && self.index == other.index
    }
}

impl Eq for NodeRef<'_> {}

impl fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.id(), self.n_id())
    }
}

/// A privately owned inner graph together with its entry point.
#[derive(Debug)]
pub struct Subgraph {
    graph: Graph,
    start: NodeIndex,
}

impl Subgraph {
    pub(crate) fn new(graph: Graph, start: NodeIndex) -> Self {
        Self { graph, start }
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut Graph {
        &mut self.graph
    }

    pub fn start(&self) -> NodeRef<'_> {
        NodeRef {
            graph: &self.graph,
            index: self.start,
        }
    }

    pub fn start_index(&self) -> NodeIndex {
        self.start
    }

    /// Runs the inner graph from its start node as a fresh run.
    pub(crate) fn run(&mut self, context: &mut Context) -> Result<RunSummary, ExecutionError> {
        self.graph.rearm();
        run_graph(&mut self.graph, self.start, context)
    }
}
