use super::{Graph, NodeIndex, Subgraph};
use crate::definition::GraphDefinition;
use crate::error::ConfigurationError;
use crate::registry::TypeRegistry;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// State threaded through one graph build, including every inner graph
/// built along the way.
///
/// The type registry is shared and read-only. The `n_id` counter and the
/// set of declared ids belong to this session alone.
pub struct BuildSession {
    registry: Arc<TypeRegistry>,
    next_n_id: u64,
    declared: BTreeSet<String>,
    base_dir: Option<PathBuf>,
}

impl BuildSession {
    pub fn new(registry: Arc<TypeRegistry>) -> Self {
        Self {
            registry,
            next_n_id: 0,
            declared: BTreeSet::new(),
            base_dir: None,
        }
    }

    /// Directory that relative `path_to_node_config` values resolve against.
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Every node id declared so far, inner graphs included.
    pub fn declared_ids(&self) -> &BTreeSet<String> {
        &self.declared
    }

    pub fn into_declared_ids(self) -> BTreeSet<String> {
        self.declared
    }

    fn next_n_id(&mut self) -> u64 {
        let n_id = self.next_n_id;
        self.next_n_id += 1;
        n_id
    }

    /// Builds every node of `definition` and wires up the children.
    ///
    /// Children are resolved only once every node exists, so forward
    /// references across the definition are legal.
    pub fn build_all(&mut self, definition: GraphDefinition) -> Result<Graph, ConfigurationError> {
        let registry = Arc::clone(&self.registry);
        let mut graph = Graph::default();
        let mut edges = Vec::with_capacity(definition.len());

        for (id, spec) in definition {
            let n_id = self.next_n_id();
            self.declared.insert(id.clone());
            tracing::info!(id = %id, n_id, type_name = %spec.type_tag, "Creating node");
            let node = registry.deserialize(self, id, n_id, &spec)?;
            graph.push(node);
            edges.push(spec.children);
        }

        for (position, child_ids) in edges.into_iter().enumerate() {
            let parent = NodeIndex(position);
            let children = child_ids
                .iter()
                .map(|child_id| {
                    graph
                        .index_of(child_id)
                        .ok_or_else(|| ConfigurationError::DanglingChild {
                            node_id: graph.node(parent).id().to_string(),
                            child_id: child_id.clone(),
                        })
                })
                .collect::<Result<Vec<_>, _>>()?;
            graph.node_mut(parent).set_children(children);
        }

        Ok(graph)
    }

    /// Builds `definition` and returns it together with the designated root.
    pub fn build_rooted(
        &mut self,
        definition: GraphDefinition,
        root_id: &str,
    ) -> Result<Subgraph, ConfigurationError> {
        if !definition.contains(root_id) {
            return Err(ConfigurationError::RootNotFound(root_id.to_string()));
        }
        let graph = self.build_all(definition)?;
        let start = graph
            .index_of(root_id)
            .ok_or_else(|| ConfigurationError::RootNotFound(root_id.to_string()))?;
        Ok(Subgraph::new(graph, start))
    }

    /// Loads a definition from disk, resolving relative paths against the
    /// session's base directory.
    pub fn load_definition(&self, path: &str) -> Result<GraphDefinition, ConfigurationError> {
        let path = Path::new(path);
        let resolved = match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        };
        tracing::debug!(path = %resolved.display(), "Loading inner graph definition");
        GraphDefinition::from_file(resolved)
    }
}
