use serde_json::Value;
use thiserror::Error;

/// Errors raised while turning a graph definition into a live graph.
///
/// All of these are fatal: they abort before any node executes.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    #[error("Failed to parse graph definition: {0}")]
    InvalidDefinition(String),

    #[error("Could not read '{path}': {message}")]
    Io { path: String, message: String },

    #[error("Node '{node_id}' has an unregistered node type: '{type_name}'")]
    UnknownType { node_id: String, type_name: String },

    #[error("Node '{child_id}' not found, which is declared as a child of node '{node_id}'")]
    DanglingChild { node_id: String, child_id: String },

    #[error("Root node '{0}' is not declared in the graph definition")]
    RootNotFound(String),

    #[error("Node '{node_id}' has invalid parameters: {message}")]
    InvalidParameters { node_id: String, message: String },

    #[error("Node '{node_id}' was configured with conflicting arguments: {message}")]
    ExclusiveArguments { node_id: String, message: String },

    #[error("Node '{node_id}' requires an 'output_key'")]
    MissingOutputKey { node_id: String },
}

/// A node was reached again while still on the current traversal path.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Cycle detected, node with id '{node_id}' is referenced to create a cycle")]
pub struct CycleError {
    pub node_id: String,
}

/// Errors raised by the computation behind a single node.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OperationError {
    #[error("Key '{0}' not found in the execution context")]
    MissingKey(String),

    #[error("Value under '{key}' cannot be iterated over: {found}")]
    NotIterable { key: String, found: Value },

    #[error("{0}")]
    Failed(String),
}

/// Errors raised while a graph is being executed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExecutionError {
    #[error("Node '{node_id}' failed: {source}")]
    Node {
        node_id: String,
        source: OperationError,
    },

    #[error("Inner graph of node '{node_id}' failed: {source}")]
    Nested {
        node_id: String,
        source: Box<ExecutionError>,
    },
}

impl ExecutionError {
    /// The id of the node that raised the error, looking through nesting.
    pub fn origin(&self) -> &str {
        match self {
            ExecutionError::Node { node_id, .. } => node_id,
            ExecutionError::Nested { source, .. } => source.origin(),
        }
    }
}

/// Errors raised while recovering clusters from an execution ordering.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VisualizationError {
    #[error(
        "The node '{next_id}' following nested node '{node_id}' was not found in the remaining ordering"
    )]
    NextNodeNotFound { node_id: String, next_id: String },

    #[error("Cluster of node '{inner}' partially overlaps the cluster of node '{outer}'")]
    PartialOverlap { outer: String, inner: String },
}

/// Any failure the pipeline facade can surface to a launcher.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Cycle(#[from] CycleError),

    #[error("Found unreachable nodes {0:?}")]
    Unreachable(Vec<String>),

    #[error(transparent)]
    Execution(#[from] ExecutionError),

    #[error(transparent)]
    Visualization(#[from] VisualizationError),
}
