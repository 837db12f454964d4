//! # AQP - Audio Quality Pipeline Engine
//!
//! **AQP** turns a declarative description of an audio quality evaluation
//! pipeline into a live graph of nodes, checks it, draws it and runs it.
//! A pipeline is a directed graph whose nodes share one mutable result
//! store, the [`Context`](context::Context). Besides plain computation
//! nodes there are three structural kinds:
//!
//! - **Loop** runs a private inner graph once per element of an iterable
//!   found in the context.
//! - **Encapsulation** runs a private inner graph once, as a single step.
//! - **Sink** waits until a configured number of upstream branches arrived.
//!
//! ## Core Workflow
//!
//! 1.  **Describe**: write the graph as JSON, a map of node id to node spec.
//! 2.  **Build**: `Pipeline::builder` (or `Pipeline::from_file`) turns it
//!     into nodes through a [`TypeRegistry`](registry::TypeRegistry).
//! 3.  **Validate**: reject cycles, report unreachable nodes.
//! 4.  **Visualize**: render DOT text with one cluster per nested node.
//! 5.  **Run**: depth-first execution threading one context through.
//!
//! ## Quick Start
//!
//! ```rust
//! use aqp::prelude::*;
//! use serde_json::json;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let definition = GraphDefinition::from_json(
//!     r#"{
//!         "files": {
//!             "type": "VariableNode",
//!             "variable_value": ["a.wav", "b.wav"],
//!             "output_key": "files",
//!             "children": ["per_file"]
//!         },
//!         "per_file": {
//!             "type": "LoopNode",
//!             "iterable_key": "files",
//!             "start_node": "tag",
//!             "output_key": "results",
//!             "node_data": {
//!                 "tag": { "type": "VariableNode", "variable_value": 1, "output_key": "seen" }
//!             }
//!         }
//!     }"#,
//! )?;
//!
//! let mut pipeline = Pipeline::builder(definition, "files").build()?;
//! pipeline.check()?;
//!
//! let mut context = Context::new();
//! pipeline.run(&mut context)?;
//! assert_eq!(context.get("results").and_then(|r| r.get("a.wav")).and_then(|r| r.get("seen")), Some(&json!(1)));
//!
//! let dot = pipeline.to_dot()?;
//! assert!(dot.starts_with("digraph {"));
//! # Ok(())
//! # }
//! ```

pub mod context;
pub mod definition;
pub mod error;
pub mod executor;
pub mod graph;
pub mod node;
pub mod pipeline;
pub mod prelude;
pub mod registry;
pub mod validator;
pub mod visualizer;
