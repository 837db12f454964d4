use crate::context::Context;
use crate::definition::DrawOptions;
use crate::error::{ExecutionError, OperationError};
use crate::graph::{NodeIndex, Subgraph};
use std::fmt;

mod leaf;
mod nested;
mod sink;

pub use leaf::{IdentityOperation, VariableOperation};
pub use nested::{EncapsulationNode, EncapsulationOutput, LoopNode, LoopOutput};
pub use sink::SinkNode;

/// What a node tells the executor after running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The context was (possibly) updated; continue into the children.
    Continue,
    /// Stop this branch. Not an error: children are simply not enqueued.
    Skip,
}

/// The type-specific computation behind a leaf node.
///
/// Implementations read their declared inputs from the context and write
/// their result back under their output key.
pub trait Operation: Send {
    fn execute(&mut self, context: &mut Context) -> Result<Outcome, OperationError>;
}

/// The closed set of node kinds.
pub enum NodeKind {
    Leaf(Box<dyn Operation>),
    Loop(LoopNode),
    Encapsulation(EncapsulationNode),
    Sink(SinkNode),
}

impl NodeKind {
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Leaf(_) => "Leaf",
            NodeKind::Loop(_) => "Loop",
            NodeKind::Encapsulation(_) => "Encapsulation",
            NodeKind::Sink(_) => "Sink",
        }
    }

    /// The private inner graph of a nested kind.
    pub fn inner(&self) -> Option<&Subgraph> {
        match self {
            NodeKind::Loop(node) => Some(node.inner()),
            NodeKind::Encapsulation(node) => Some(node.inner()),
            NodeKind::Leaf(_) | NodeKind::Sink(_) => None,
        }
    }

    pub fn is_nested(&self) -> bool {
        self.inner().is_some()
    }

    pub(crate) fn rearm(&mut self) {
        if let NodeKind::Sink(sink) = self {
            sink.rearm();
        }
    }
}

impl fmt::Debug for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A runtime execution unit.
#[derive(Debug)]
pub struct Node {
    id: String,
    n_id: u64,
    type_name: String,
    output_key: Option<String>,
    draw_options: DrawOptions,
    children: Vec<NodeIndex>,
    kind: NodeKind,
}

impl Node {
    pub(crate) fn new(
        id: String,
        n_id: u64,
        type_name: String,
        output_key: Option<String>,
        draw_options: DrawOptions,
        kind: NodeKind,
    ) -> Self {
        Self {
            id,
            n_id,
            type_name,
            output_key,
            draw_options,
            children: Vec::new(),
            kind,
        }
    }

    /// String identity, unique within one graph definition.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Numeric identity, unique within one build session.
    pub fn n_id(&self) -> u64 {
        self.n_id
    }

    /// The type tag this node was declared with.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn output_key(&self) -> Option<&str> {
        self.output_key.as_deref()
    }

    pub fn draw_options(&self) -> &DrawOptions {
        &self.draw_options
    }

    pub fn children(&self) -> &[NodeIndex] {
        &self.children
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn kind_mut(&mut self) -> &mut NodeKind {
        &mut self.kind
    }

    pub fn is_nested(&self) -> bool {
        self.kind.is_nested()
    }

    pub(crate) fn set_children(&mut self, children: Vec<NodeIndex>) {
        self.children = children;
    }

    pub(crate) fn rearm(&mut self) {
        self.kind.rearm();
    }

    /// Runs this node against the shared context.
    pub fn execute(&mut self, context: &mut Context) -> Result<Outcome, ExecutionError> {
        tracing::debug!(
            id = %self.id,
            kind = self.kind.name(),
            type_name = %self.type_name,
            "Executing node"
        );
        let node_id = self.id.as_str();
        match &mut self.kind {
            NodeKind::Leaf(operation) => {
                operation
                    .execute(context)
                    .map_err(|source| ExecutionError::Node {
                        node_id: node_id.to_string(),
                        source,
                    })
            }
            NodeKind::Sink(sink) => Ok(sink.arrive(node_id)),
            NodeKind::Loop(node) => node.execute(node_id, context),
            NodeKind::Encapsulation(node) => node.execute(node_id, context),
        }
    }
}
