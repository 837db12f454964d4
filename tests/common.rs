//! Common test utilities: graph definitions and test-only node types.
use aqp::prelude::*;
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;

/// `root -> {a, b}`, `a -> c`, `b -> c`, where `c` counts its executions.
#[allow(dead_code)]
pub const DIAMOND_JSON: &str = r#"{
    "root": { "type": "IdentityNode", "children": ["a", "b"] },
    "a": { "type": "IdentityNode", "children": ["c"] },
    "b": { "type": "IdentityNode", "children": ["c"] },
    "c": { "type": "CounterNode", "counter_key": "c_runs" }
}"#;

/// Three branches feeding a sink that waits for two of them.
#[allow(dead_code)]
pub const SINK_JSON: &str = r#"{
    "root": { "type": "IdentityNode", "children": ["left", "middle", "right"] },
    "left": { "type": "CounterNode", "counter_key": "arrived", "children": ["join"] },
    "middle": { "type": "CounterNode", "counter_key": "arrived", "children": ["join"] },
    "right": { "type": "CounterNode", "counter_key": "arrived", "children": ["join"] },
    "join": { "type": "SinkNode", "num_expected_results": 2, "children": ["after"] },
    "after": { "type": "CounterNode", "counter_key": "after_runs" }
}"#;

/// A loop over `[1, 2, 3]` whose inner run fails for element `2`.
#[allow(dead_code)]
pub const FAILING_LOOP_JSON: &str = r#"{
    "items": {
        "type": "VariableNode",
        "variable_value": [1, 2, 3],
        "output_key": "items",
        "children": ["each"]
    },
    "each": {
        "type": "LoopNode",
        "iterable_key": "items",
        "start_node": "process",
        "output_key": "results",
        "node_data": {
            "process": { "type": "FailOnNode", "fail_on": 2, "output_key": "processed" }
        }
    }
}"#;

/// `A -> L -> D` where the loop `L` runs `B -> C -> End` per element.
#[allow(dead_code)]
pub const CLUSTER_JSON: &str = r##"{
    "A": {
        "type": "VariableNode",
        "variable_value": ["x"],
        "output_key": "items",
        "children": ["L"]
    },
    "L": {
        "type": "LoopNode",
        "iterable_key": "items",
        "start_node": "B",
        "output_key": "per_item",
        "node_data": {
            "B": { "type": "IdentityNode", "children": ["C"] },
            "C": { "type": "IdentityNode", "children": ["End"], "draw_options": { "fillcolor": "#1a2b3c" } },
            "End": { "type": "IdentityNode" }
        },
        "children": ["D"]
    },
    "D": { "type": "IdentityNode" }
}"##;

/// An encapsulation inside a loop, both followed by further nodes.
#[allow(dead_code)]
pub const DEEP_NESTING_JSON: &str = r#"{
    "start": {
        "type": "VariableNode",
        "variable_value": ["ref.wav", "deg.wav"],
        "output_key": "files",
        "children": ["per_file"]
    },
    "per_file": {
        "type": "LoopNode",
        "iterable_key": "files",
        "start_node": "load",
        "output_key": "scores",
        "node_data": {
            "load": { "type": "RecordNode", "label": "load", "children": ["score"] },
            "score": {
                "type": "EncapsulationNode",
                "start_node": "mos",
                "output_key": "metric",
                "node_data": {
                    "mos": { "type": "VariableNode", "variable_value": 4.5, "output_key": "mos" }
                },
                "children": ["store"]
            },
            "store": { "type": "RecordNode", "label": "store" }
        },
        "children": ["report"]
    },
    "report": { "type": "RecordNode", "label": "report" }
}"#;

/// Increments the integer stored under `counter_key`.
pub struct Counter {
    key: String,
}

impl Operation for Counter {
    fn execute(&mut self, context: &mut Context) -> Result<Outcome, OperationError> {
        let current = context.get(&self.key).and_then(Value::as_u64).unwrap_or(0);
        context.insert(self.key.clone(), json!(current + 1));
        Ok(Outcome::Continue)
    }
}

/// Fails when the current loop element equals `fail_on`.
pub struct FailOn {
    value: Value,
    output_key: String,
}

impl Operation for FailOn {
    fn execute(&mut self, context: &mut Context) -> Result<Outcome, OperationError> {
        let item = context.require(ITERATOR_ITEM)?.clone();
        if item == self.value {
            return Err(OperationError::Failed(format!("cannot process {}", item)));
        }
        context.insert(self.output_key.clone(), json!(format!("processed {}", item)));
        Ok(Outcome::Continue)
    }
}

/// Appends its label to the `trace` array.
pub struct Record {
    label: String,
}

impl Operation for Record {
    fn execute(&mut self, context: &mut Context) -> Result<Outcome, OperationError> {
        let mut trace = match context.remove("trace") {
            Some(Value::Array(trace)) => trace,
            _ => Vec::new(),
        };
        trace.push(json!(self.label));
        context.insert("trace", Value::Array(trace));
        Ok(Outcome::Continue)
    }
}

#[derive(Deserialize)]
struct CounterParams {
    counter_key: String,
}

#[derive(Deserialize)]
struct FailOnParams {
    fail_on: Value,
}

#[derive(Deserialize)]
struct RecordParams {
    label: String,
}

fn create_counter(node_id: &str, spec: &NodeSpec) -> Result<Box<dyn Operation>, ConfigurationError> {
    let params: CounterParams = spec.parse_params(node_id)?;
    Ok(Box::new(Counter {
        key: params.counter_key,
    }))
}

fn create_fail_on(node_id: &str, spec: &NodeSpec) -> Result<Box<dyn Operation>, ConfigurationError> {
    let params: FailOnParams = spec.parse_params(node_id)?;
    let output_key = spec
        .output_key
        .clone()
        .ok_or_else(|| ConfigurationError::MissingOutputKey {
            node_id: node_id.to_string(),
        })?;
    Ok(Box::new(FailOn {
        value: params.fail_on,
        output_key,
    }))
}

fn create_record(node_id: &str, spec: &NodeSpec) -> Result<Box<dyn Operation>, ConfigurationError> {
    let params: RecordParams = spec.parse_params(node_id)?;
    Ok(Box::new(Record {
        label: params.label,
    }))
}

/// The built-in types plus the test-only node types above.
#[allow(dead_code)]
pub fn test_registry() -> Arc<TypeRegistry> {
    Arc::new(
        TypeRegistry::builder()
            .with_operation(FnOperationFactory::new("CounterNode", create_counter))
            .with_operation(FnOperationFactory::new("FailOnNode", create_fail_on))
            .with_operation(
                FnOperationFactory::new("RecordNode", create_record).with_family(DrawFamily::Visqol),
            )
            .build(),
    )
}

/// Builds `json` with the test registry, rooted at `root_id`.
#[allow(dead_code)]
pub fn build_pipeline(json: &str, root_id: &str) -> Pipeline {
    let definition = GraphDefinition::from_json(json).expect("Failed to parse definition");
    Pipeline::builder(definition, root_id)
        .with_registry(test_registry())
        .build()
        .expect("Failed to build pipeline")
}

/// The string ids of an ordering, in order.
#[allow(dead_code)]
pub fn ids(ordering: &[NodeRef<'_>]) -> Vec<String> {
    ordering.iter().map(|node| node.id().to_string()).collect()
}
