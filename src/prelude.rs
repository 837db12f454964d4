//! Prelude module for convenient imports
//!
//! Re-exports the types needed to describe, build, check, draw and run a
//! pipeline, plus the seams for plugging in external node types.
//!
//! # Example
//!
//! ```rust,no_run
//! use aqp::prelude::*;
//!
//! # fn run_example() -> std::result::Result<(), PipelineError> {
//! let mut pipeline = Pipeline::from_file("data/pipeline.json", "load_files")?;
//! pipeline.check()?;
//! std::fs::write("pipeline.dot", pipeline.to_dot()?).ok();
//!
//! let mut context = Context::new();
//! let summary = pipeline.run(&mut context)?;
//! println!("{} nodes executed", summary.executed);
//! # Ok(())
//! # }
//! ```

// Facade
pub use crate::pipeline::{Pipeline, PipelineBuilder};

// Definitions and results
pub use crate::context::{Context, ITERATOR_ITEM};
pub use crate::definition::{DrawFamily, DrawOptions, GraphDefinition, NodeSpec};

// Graph and nodes
pub use crate::graph::{BuildSession, Graph, NodeRef};
pub use crate::node::{Node, NodeKind, Operation, Outcome};
pub use crate::registry::{FnOperationFactory, NodeType, OperationFactory, TypeRegistry};

// Checking, running and drawing
pub use crate::executor::{RunSummary, run_graph};
pub use crate::validator::{Severity, ValidationReport, ValidatorConfig, check_for_cycles, validate};
pub use crate::visualizer::{
    DotOptions, VisualizationUnit, build_visualization, generate_dot, render_dot,
};

// Error types
pub use crate::error::{
    ConfigurationError, CycleError, ExecutionError, OperationError, PipelineError,
    VisualizationError,
};
