//! Tests for turning graph definitions into live graphs.
mod common;
use aqp::node::{EncapsulationOutput, LoopOutput};
use aqp::prelude::*;
use common::*;
use serde_json::json;
use std::fs;

fn session() -> BuildSession {
    BuildSession::new(TypeRegistry::builtin())
}

#[test]
fn test_build_all_resolves_forward_references() {
    let definition = GraphDefinition::from_json(
        r#"{
            "first": { "type": "IdentityNode", "children": ["second", "third"] },
            "second": { "type": "IdentityNode", "children": ["third"] },
            "third": { "type": "IdentityNode" }
        }"#,
    )
    .expect("Failed to parse definition");

    let graph = session().build_all(definition).expect("Failed to build graph");

    assert_eq!(graph.len(), 3);
    let first = graph.node_ref("first").expect("first is declared");
    let children: Vec<_> = first.children().map(|child| child.id().to_string()).collect();
    assert_eq!(children, ["second", "third"]);
    assert_eq!(
        first.first_child().map(|child| child.id().to_string()),
        Some("second".to_string())
    );
}

#[test]
fn test_n_ids_follow_declaration_order_across_inner_graphs() {
    let definition = GraphDefinition::from_json(CLUSTER_JSON).expect("Failed to parse definition");
    let mut session = session();
    let graph = session.build_all(definition).expect("Failed to build graph");

    let outer: Vec<u64> = graph.nodes().map(|node| node.n_id()).collect();
    assert_eq!(outer.len(), 3);

    let inner = graph
        .get("L")
        .and_then(|node| node.kind().inner())
        .expect("L owns an inner graph");
    let inner_ids: Vec<u64> = inner.graph().nodes().map(|node| node.n_id()).collect();

    let mut all: Vec<u64> = outer.iter().chain(&inner_ids).copied().collect();
    all.sort_unstable();
    all.dedup();
    assert_eq!(all.len(), 6, "n_ids must be unique within a build session");
    assert!(inner_ids.windows(2).all(|pair| pair[0] < pair[1]));
    assert_eq!(inner.start().id(), "B");

    let declared: Vec<&str> = session.declared_ids().iter().map(String::as_str).collect();
    assert_eq!(declared, ["A", "B", "C", "D", "End", "L"]);
}

#[test]
fn test_dangling_child_is_rejected() {
    let definition = GraphDefinition::new()
        .with_node("root", NodeSpec::new("IdentityNode").with_children(["ghost"]));

    let result = session().build_all(definition);
    assert_eq!(
        result.err(),
        Some(ConfigurationError::DanglingChild {
            node_id: "root".to_string(),
            child_id: "ghost".to_string(),
        })
    );
}

#[test]
fn test_unknown_type_is_rejected() {
    let definition = GraphDefinition::new().with_node("spectrum", NodeSpec::new("SpectrogramNode"));

    match session().build_all(definition) {
        Err(ConfigurationError::UnknownType { node_id, type_name }) => {
            assert_eq!(node_id, "spectrum");
            assert_eq!(type_name, "SpectrogramNode");
        }
        other => panic!("Expected UnknownType, got {:?}", other),
    }
}

#[test]
fn test_type_tags_ignore_case() {
    let definition = GraphDefinition::new()
        .with_node("a", NodeSpec::new("identitynode").with_children(["b"]))
        .with_node(
            "b",
            NodeSpec::new("VARIABLENODE")
                .with_output_key("value")
                .with_param("variable_value", json!(3)),
        );

    let graph = session().build_all(definition).expect("Failed to build graph");
    assert_eq!(graph.get("a").map(Node::type_name), Some("identitynode"));
    assert!(matches!(graph.get("b").map(Node::kind), Some(NodeKind::Leaf(_))));
}

#[test]
fn test_type_alias_maps_to_builtin_kind() {
    let registry = TypeRegistry::builder()
        .with_type_alias("Junction", NodeType::Identity)
        .build();
    let definition = GraphDefinition::new().with_node("j", NodeSpec::new("junction"));

    let graph = BuildSession::new(registry.into())
        .build_all(definition)
        .expect("Failed to build graph");
    assert_eq!(graph.get("j").map(Node::type_name), Some("junction"));
}

#[test]
fn test_external_operations_are_constructed() {
    let definition = GraphDefinition::from_json(DIAMOND_JSON).expect("Failed to parse definition");
    let graph = BuildSession::new(test_registry())
        .build_all(definition)
        .expect("Failed to build graph");
    assert!(matches!(graph.get("c").map(Node::kind), Some(NodeKind::Leaf(_))));
}

#[test]
fn test_build_rooted_requires_declared_root() {
    let definition = GraphDefinition::new().with_node("a", NodeSpec::new("IdentityNode"));
    let result = session().build_rooted(definition, "missing");
    assert_eq!(
        result.err(),
        Some(ConfigurationError::RootNotFound("missing".to_string()))
    );
}

#[test]
fn test_invalid_definition_json() {
    let result = GraphDefinition::from_json(r#"{ "a": { "children": [] } }"#);
    assert!(matches!(result, Err(ConfigurationError::InvalidDefinition(_))));
}

#[test]
fn test_variable_requires_value_and_output_key() {
    let missing_value = GraphDefinition::new()
        .with_node("v", NodeSpec::new("VariableNode").with_output_key("out"));
    assert!(matches!(
        session().build_all(missing_value),
        Err(ConfigurationError::InvalidParameters { .. })
    ));

    let missing_key = GraphDefinition::new()
        .with_node("v", NodeSpec::new("VariableNode").with_param("variable_value", json!(1)));
    assert_eq!(
        session().build_all(missing_key).err(),
        Some(ConfigurationError::MissingOutputKey {
            node_id: "v".to_string()
        })
    );
}

#[test]
fn test_sink_requires_positive_expectation() {
    let definition = GraphDefinition::new().with_node(
        "join",
        NodeSpec::new("SinkNode").with_param("num_expected_results", json!(0)),
    );
    assert!(matches!(
        session().build_all(definition),
        Err(ConfigurationError::InvalidParameters { node_id, .. }) if node_id == "join"
    ));
}

#[test]
fn test_loop_output_policy() {
    let inner = json!({ "noop": { "type": "IdentityNode" } });
    let looped = |flatten: bool, output_key: Option<&str>| {
        let mut spec = NodeSpec::new("LoopNode")
            .with_param("iterable_key", json!("items"))
            .with_param("start_node", json!("noop"))
            .with_param("node_data", inner.clone())
            .with_param("flatten_results", json!(flatten));
        if let Some(key) = output_key {
            spec = spec.with_output_key(key);
        }
        session().build_all(GraphDefinition::new().with_node("each", spec))
    };

    let stored = looped(false, Some("results")).expect("Failed to build graph");
    match stored.get("each").map(Node::kind) {
        Some(NodeKind::Loop(node)) => {
            assert_eq!(node.output(), &LoopOutput::Store("results".to_string()))
        }
        other => panic!("Expected a loop node, got {:?}", other),
    }

    let flattened = looped(true, None).expect("Failed to build graph");
    match flattened.get("each").map(Node::kind) {
        Some(NodeKind::Loop(node)) => assert_eq!(node.output(), &LoopOutput::Flatten),
        other => panic!("Expected a loop node, got {:?}", other),
    }

    assert!(matches!(
        looped(false, None),
        Err(ConfigurationError::MissingOutputKey { .. })
    ));
}

#[test]
fn test_encapsulation_requires_exactly_one_source() {
    let neither = NodeSpec::new("EncapsulationNode")
        .with_output_key("out")
        .with_param("start_node", json!("inner"));
    let both = neither
        .clone()
        .with_param("node_data", json!({ "inner": { "type": "IdentityNode" } }))
        .with_param("path_to_node_config", json!("inner.json"));

    for spec in [neither, both] {
        let result = session().build_all(GraphDefinition::new().with_node("enc", spec));
        assert!(
            matches!(result, Err(ConfigurationError::ExclusiveArguments { ref node_id, .. }) if node_id == "enc"),
            "Expected ExclusiveArguments, got {:?}",
            result
        );
    }
}

#[test]
fn test_encapsulation_loads_inner_graph_from_file() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    fs::write(
        dir.path().join("inner.json"),
        r#"{ "score": { "type": "VariableNode", "variable_value": 3.9, "output_key": "mos" } }"#,
    )
    .expect("Failed to write inner definition");

    let definition = GraphDefinition::new().with_node(
        "enc",
        NodeSpec::new("EncapsulationNode")
            .with_output_key("metric")
            .with_param("start_node", json!("score"))
            .with_param("path_to_node_config", json!("inner.json")),
    );

    let mut session = session().with_base_dir(dir.path());
    let graph = session.build_all(definition).expect("Failed to build graph");
    match graph.get("enc").map(Node::kind) {
        Some(NodeKind::Encapsulation(node)) => {
            assert_eq!(node.output(), &EncapsulationOutput::Nest("metric".to_string()));
            assert_eq!(node.inner().start().id(), "score");
        }
        other => panic!("Expected an encapsulation node, got {:?}", other),
    }
    assert!(session.declared_ids().contains("score"));
}

#[test]
fn test_encapsulation_missing_file() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let definition = GraphDefinition::new().with_node(
        "enc",
        NodeSpec::new("EncapsulationNode")
            .with_output_key("metric")
            .with_param("start_node", json!("score"))
            .with_param("path_to_node_config", json!("absent.json")),
    );

    let result = session().with_base_dir(dir.path()).build_all(definition);
    assert!(matches!(result, Err(ConfigurationError::Io { .. })));
}

#[test]
fn test_draw_options_are_layered() {
    let definition = GraphDefinition::from_json(
        r##"{
            "plain": { "type": "IdentityNode", "children": ["custom", "metric"] },
            "custom": { "type": "IdentityNode", "draw_options": { "shape": "ellipse", "penwidth": 2 } },
            "metric": { "type": "RecordNode", "label": "metric" }
        }"##,
    )
    .expect("Failed to parse definition");
    let graph = BuildSession::new(test_registry())
        .build_all(definition)
        .expect("Failed to build graph");

    let plain = graph.get("plain").map(Node::draw_options).expect("plain is declared");
    assert_eq!(plain.get("shape"), Some("box"));
    assert_eq!(plain.get("style"), Some("filled"));
    assert_eq!(plain.get("fillcolor"), Some("#ffffff"));

    let custom = graph.get("custom").map(Node::draw_options).expect("custom is declared");
    assert_eq!(custom.get("shape"), Some("ellipse"));
    assert_eq!(custom.get("penwidth"), Some("2"));

    let metric = graph.get("metric").map(Node::draw_options).expect("metric is declared");
    assert_eq!(metric.get("fillcolor"), Some("#56b3e9B3"));
}
