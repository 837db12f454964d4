use crate::error::ConfigurationError;
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

/// The raw definition of a single node, as written in a graph config file.
///
/// Any field that is not one of the common ones below is kept verbatim in
/// `params` and handed to the factory of the node's type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSpec {
    #[serde(rename = "type")]
    pub type_tag: String,
    #[serde(default)]
    pub children: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub draw_options: Option<Map<String, Value>>,
    #[serde(flatten)]
    pub params: Map<String, Value>,
}

impl NodeSpec {
    pub fn new(type_tag: impl Into<String>) -> Self {
        Self {
            type_tag: type_tag.into(),
            children: Vec::new(),
            output_key: None,
            draw_options: None,
            params: Map::new(),
        }
    }

    pub fn with_children<I, S>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.children = children.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_output_key(mut self, key: impl Into<String>) -> Self {
        self.output_key = Some(key.into());
        self
    }

    pub fn with_param(mut self, name: impl Into<String>, value: Value) -> Self {
        self.params.insert(name.into(), value);
        self
    }

    /// Deserializes the type-specific parameters into `T`.
    pub fn parse_params<T: DeserializeOwned>(&self, node_id: &str) -> Result<T, ConfigurationError> {
        serde_json::from_value(Value::Object(self.params.clone())).map_err(|e| {
            ConfigurationError::InvalidParameters {
                node_id: node_id.to_string(),
                message: e.to_string(),
            }
        })
    }
}

/// A complete graph definition: node id to node spec, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GraphDefinition {
    nodes: IndexMap<String, NodeSpec>,
}

impl GraphDefinition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigurationError> {
        serde_json::from_str(json).map_err(|e| ConfigurationError::InvalidDefinition(e.to_string()))
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigurationError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| ConfigurationError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_json(&content)
    }

    /// Adds a node, replacing any earlier node declared under the same id.
    pub fn insert(&mut self, id: impl Into<String>, spec: NodeSpec) -> Option<NodeSpec> {
        self.nodes.insert(id.into(), spec)
    }

    pub fn with_node(mut self, id: impl Into<String>, spec: NodeSpec) -> Self {
        self.insert(id, spec);
        self
    }

    pub fn get(&self, id: &str) -> Option<&NodeSpec> {
        self.nodes.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &NodeSpec)> {
        self.nodes.iter()
    }
}

impl IntoIterator for GraphDefinition {
    type Item = (String, NodeSpec);
    type IntoIter = indexmap::map::IntoIter<String, NodeSpec>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.into_iter()
    }
}

impl FromIterator<(String, NodeSpec)> for GraphDefinition {
    fn from_iter<T: IntoIterator<Item = (String, NodeSpec)>>(iter: T) -> Self {
        Self {
            nodes: iter.into_iter().collect(),
        }
    }
}
