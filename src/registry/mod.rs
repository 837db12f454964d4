use crate::definition::{DrawFamily, DrawOptions, NodeSpec};
use crate::error::ConfigurationError;
use crate::graph::BuildSession;
use crate::node::{
    EncapsulationNode, IdentityOperation, LoopNode, Node, NodeKind, Operation, SinkNode,
    VariableOperation,
};
use ahash::AHashMap;
use serde::Deserialize;
use serde_json::Value;
use std::sync::{Arc, OnceLock};

/// The node types the engine itself provides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    Identity,
    Variable,
    Loop,
    Encapsulation,
    Sink,
}

impl NodeType {
    pub const ALL: [NodeType; 5] = [
        NodeType::Identity,
        NodeType::Variable,
        NodeType::Loop,
        NodeType::Encapsulation,
        NodeType::Sink,
    ];

    pub fn tag(self) -> &'static str {
        match self {
            NodeType::Identity => "IdentityNode",
            NodeType::Variable => "VariableNode",
            NodeType::Loop => "LoopNode",
            NodeType::Encapsulation => "EncapsulationNode",
            NodeType::Sink => "SinkNode",
        }
    }

    /// Case-insensitive lookup of a built-in tag.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|node_type| node_type.tag().eq_ignore_ascii_case(tag))
    }
}

/// Creates the computation behind an externally provided leaf node type.
pub trait OperationFactory: Send + Sync {
    fn type_name(&self) -> &str;

    fn family(&self) -> DrawFamily {
        DrawFamily::Aqp
    }

    fn create(
        &self,
        node_id: &str,
        spec: &NodeSpec,
    ) -> Result<Box<dyn Operation>, ConfigurationError>;
}

/// An [`OperationFactory`] backed by a closure.
pub struct FnOperationFactory<F> {
    type_name: String,
    family: DrawFamily,
    create: F,
}

impl<F> FnOperationFactory<F>
where
    F: Fn(&str, &NodeSpec) -> Result<Box<dyn Operation>, ConfigurationError> + Send + Sync,
{
    pub fn new(type_name: impl Into<String>, create: F) -> Self {
        Self {
            type_name: type_name.into(),
            family: DrawFamily::default(),
            create,
        }
    }

    pub fn with_family(mut self, family: DrawFamily) -> Self {
        self.family = family;
        self
    }
}

impl<F> OperationFactory for FnOperationFactory<F>
where
    F: Fn(&str, &NodeSpec) -> Result<Box<dyn Operation>, ConfigurationError> + Send + Sync,
{
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn family(&self) -> DrawFamily {
        self.family
    }

    fn create(
        &self,
        node_id: &str,
        spec: &NodeSpec,
    ) -> Result<Box<dyn Operation>, ConfigurationError> {
        (self.create)(node_id, spec)
    }
}

/// Maps a type tag to the way a node of that type is constructed.
///
/// Populated once through [`TypeRegistry::builder`] and read-only after
/// that; share it between builds with an `Arc`.
#[derive(Default)]
pub struct TypeRegistry {
    aliases: AHashMap<String, NodeType>,
    operations: AHashMap<String, Box<dyn OperationFactory>>,
}

pub struct TypeRegistryBuilder {
    aliases: AHashMap<String, NodeType>,
    operations: AHashMap<String, Box<dyn OperationFactory>>,
}

impl TypeRegistryBuilder {
    /// Lets `user_tag` stand for one of the built-in node types.
    pub fn with_type_alias(mut self, user_tag: &str, node_type: NodeType) -> Self {
        self.aliases.insert(user_tag.to_lowercase(), node_type);
        self
    }

    pub fn with_operation(mut self, factory: impl OperationFactory + 'static) -> Self {
        self.operations
            .insert(factory.type_name().to_lowercase(), Box::new(factory));
        self
    }

    pub fn build(self) -> TypeRegistry {
        TypeRegistry {
            aliases: self.aliases,
            operations: self.operations,
        }
    }
}

#[derive(Deserialize)]
struct VariableParams {
    variable_value: Value,
}

#[derive(Deserialize)]
struct SinkParams {
    num_expected_results: usize,
}

impl TypeRegistry {
    pub fn builder() -> TypeRegistryBuilder {
        TypeRegistryBuilder {
            aliases: AHashMap::new(),
            operations: AHashMap::new(),
        }
    }

    /// The process-wide registry holding only the built-in node types.
    pub fn builtin() -> Arc<TypeRegistry> {
        static BUILTIN: OnceLock<Arc<TypeRegistry>> = OnceLock::new();
        Arc::clone(BUILTIN.get_or_init(|| Arc::new(TypeRegistry::default())))
    }

    fn builtin_type(&self, tag: &str) -> Option<NodeType> {
        NodeType::from_tag(tag).or_else(|| self.aliases.get(&tag.to_lowercase()).copied())
    }

    /// Whether `tag` names a known node type, ignoring case.
    pub fn contains(&self, tag: &str) -> bool {
        self.builtin_type(tag).is_some() || self.operations.contains_key(&tag.to_lowercase())
    }

    /// Turns one node spec into a node. Nested kinds build their inner
    /// graphs through `session`.
    pub(crate) fn deserialize(
        &self,
        session: &mut BuildSession,
        id: String,
        n_id: u64,
        spec: &NodeSpec,
    ) -> Result<Node, ConfigurationError> {
        let (kind, family) = if let Some(node_type) = self.builtin_type(&spec.type_tag) {
            let kind = Self::build_builtin(node_type, session, &id, spec)?;
            (kind, DrawFamily::Aqp)
        } else if let Some(factory) = self.operations.get(&spec.type_tag.to_lowercase()) {
            (NodeKind::Leaf(factory.create(&id, spec)?), factory.family())
        } else {
            return Err(ConfigurationError::UnknownType {
                node_id: id,
                type_name: spec.type_tag.clone(),
            });
        };

        let draw_options = DrawOptions::layered(family, spec.draw_options.as_ref());
        Ok(Node::new(
            id,
            n_id,
            spec.type_tag.clone(),
            spec.output_key.clone(),
            draw_options,
            kind,
        ))
    }

    fn build_builtin(
        node_type: NodeType,
        session: &mut BuildSession,
        id: &str,
        spec: &NodeSpec,
    ) -> Result<NodeKind, ConfigurationError> {
        let kind = match node_type {
            NodeType::Identity => NodeKind::Leaf(Box::new(IdentityOperation)),
            NodeType::Variable => {
                let params: VariableParams = spec.parse_params(id)?;
                let output_key =
                    spec.output_key
                        .clone()
                        .ok_or_else(|| ConfigurationError::MissingOutputKey {
                            node_id: id.to_string(),
                        })?;
                NodeKind::Leaf(Box::new(VariableOperation::new(
                    output_key,
                    params.variable_value,
                )))
            }
            NodeType::Sink => {
                let params: SinkParams = spec.parse_params(id)?;
                if params.num_expected_results == 0 {
                    return Err(ConfigurationError::InvalidParameters {
                        node_id: id.to_string(),
                        message: "'num_expected_results' must be at least 1".to_string(),
                    });
                }
                NodeKind::Sink(SinkNode::new(params.num_expected_results))
            }
            NodeType::Loop => NodeKind::Loop(LoopNode::from_spec(session, id, spec)?),
            NodeType::Encapsulation => {
                NodeKind::Encapsulation(EncapsulationNode::from_spec(session, id, spec)?)
            }
        };
        Ok(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_tags_ignore_case() {
        assert_eq!(NodeType::from_tag("loopnode"), Some(NodeType::Loop));
        assert_eq!(NodeType::from_tag("SINKNODE"), Some(NodeType::Sink));
        assert_eq!(NodeType::from_tag("SpectrogramNode"), None);
    }

    #[test]
    fn test_alias_lookup() {
        let registry = TypeRegistry::builder()
            .with_type_alias("Repeat", NodeType::Loop)
            .build();
        assert!(registry.contains("repeat"));
        assert!(registry.contains("EncapsulationNode"));
        assert!(!registry.contains("unknown"));
    }
}
