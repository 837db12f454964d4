use super::Outcome;
use crate::context::{Context, ITERATOR_ITEM, item_key};
use crate::definition::{GraphDefinition, NodeSpec};
use crate::error::{ConfigurationError, ExecutionError, OperationError};
use crate::graph::{BuildSession, Subgraph};
use serde::Deserialize;
use serde_json::{Map, Value};

/// Where a loop puts its per-element results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopOutput {
    /// Store the element-keyed result map under this key.
    Store(String),
    /// Merge every per-element context into the outer context, in
    /// iteration order.
    Flatten,
}

/// Where an encapsulation puts the context of its inner run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncapsulationOutput {
    /// Store the inner context as an object under this key.
    Nest(String),
    /// Merge the inner context into the outer one.
    Merge,
}

#[derive(Deserialize)]
struct LoopParams {
    iterable_key: String,
    start_node: String,
    node_data: GraphDefinition,
    #[serde(default)]
    key_blacklist: Vec<String>,
    #[serde(default)]
    flatten_results: bool,
}

#[derive(Deserialize)]
struct EncapsulationParams {
    start_node: String,
    #[serde(default)]
    node_data: Option<GraphDefinition>,
    #[serde(default)]
    path_to_node_config: Option<String>,
    #[serde(default)]
    key_blacklist: Vec<String>,
    #[serde(default)]
    merge_results: bool,
}

/// Runs its inner graph once per element of an iterable found in the
/// context.
///
/// Each iteration sees a private copy of the context (minus the key
/// blacklist) with the element bound under [`ITERATOR_ITEM`]. A failing
/// iteration is recorded and skipped; the loop itself still succeeds.
#[derive(Debug)]
pub struct LoopNode {
    iterable_key: String,
    key_blacklist: Vec<String>,
    output: LoopOutput,
    inner: Subgraph,
    failures: Vec<Value>,
}

impl LoopNode {
    pub(crate) fn from_spec(
        session: &mut BuildSession,
        node_id: &str,
        spec: &NodeSpec,
    ) -> Result<Self, ConfigurationError> {
        let params: LoopParams = spec.parse_params(node_id)?;
        let output = match (params.flatten_results, &spec.output_key) {
            (true, _) => LoopOutput::Flatten,
            (false, Some(key)) => LoopOutput::Store(key.clone()),
            (false, None) => {
                return Err(ConfigurationError::MissingOutputKey {
                    node_id: node_id.to_string(),
                });
            }
        };
        let inner = session.build_rooted(params.node_data, &params.start_node)?;
        Ok(Self {
            iterable_key: params.iterable_key,
            key_blacklist: params.key_blacklist,
            output,
            inner,
            failures: Vec::new(),
        })
    }

    pub fn iterable_key(&self) -> &str {
        &self.iterable_key
    }

    pub fn output(&self) -> &LoopOutput {
        &self.output
    }

    pub fn inner(&self) -> &Subgraph {
        &self.inner
    }

    /// Elements whose inner run failed during the latest execution, or whose
    /// result key was already taken by an earlier element.
    pub fn failures(&self) -> &[Value] {
        &self.failures
    }

    fn items(&self, node_id: &str, context: &Context) -> Result<Vec<Value>, ExecutionError> {
        let to_error = |source| ExecutionError::Node {
            node_id: node_id.to_string(),
            source,
        };
        match context.require(&self.iterable_key).map_err(to_error)? {
            Value::Array(items) => Ok(items.clone()),
            Value::Object(map) => Ok(map.keys().cloned().map(Value::String).collect()),
            found => Err(to_error(OperationError::NotIterable {
                key: self.iterable_key.clone(),
                found: found.clone(),
            })),
        }
    }

    pub(crate) fn execute(
        &mut self,
        node_id: &str,
        context: &mut Context,
    ) -> Result<Outcome, ExecutionError> {
        let items = self.items(node_id, context)?;
        self.failures.clear();

        let mut results = Vec::with_capacity(items.len());
        for item in items {
            tracing::info!(id = node_id, item = %item, "Running on iterable entry");
            let mut scope = context.project(&self.key_blacklist);
            scope.insert(ITERATOR_ITEM, item.clone());
            match self.inner.run(&mut scope) {
                Ok(_) => results.push((item, scope)),
                Err(err) => {
                    tracing::warn!(id = node_id, item = %item, error = %err, "Iteration failed");
                    self.failures.push(item);
                }
            }
        }

        match &self.output {
            LoopOutput::Store(key) => {
                let mut stored = Map::new();
                for (item, scope) in results {
                    let entry = item_key(&item);
                    if stored.contains_key(&entry) {
                        tracing::warn!(
                            id = node_id,
                            item = %item,
                            key = %entry,
                            "Result key already taken, dropping element"
                        );
                        self.failures.push(item);
                        continue;
                    }
                    stored.insert(entry, scope.into_value());
                }
                context.insert(key.clone(), Value::Object(stored));
            }
            LoopOutput::Flatten => {
                for (_, scope) in results {
                    context.merge(scope);
                }
            }
        }
        Ok(Outcome::Continue)
    }
}

/// Groups an inner graph so it runs as a single atomic step.
#[derive(Debug)]
pub struct EncapsulationNode {
    key_blacklist: Vec<String>,
    output: EncapsulationOutput,
    inner: Subgraph,
}

impl EncapsulationNode {
    pub(crate) fn from_spec(
        session: &mut BuildSession,
        node_id: &str,
        spec: &NodeSpec,
    ) -> Result<Self, ConfigurationError> {
        let params: EncapsulationParams = spec.parse_params(node_id)?;
        let output = match (params.merge_results, &spec.output_key) {
            (true, _) => EncapsulationOutput::Merge,
            (false, Some(key)) => EncapsulationOutput::Nest(key.clone()),
            (false, None) => {
                return Err(ConfigurationError::MissingOutputKey {
                    node_id: node_id.to_string(),
                });
            }
        };
        let definition = match (params.node_data, params.path_to_node_config) {
            (Some(definition), None) => definition,
            (None, Some(path)) => session.load_definition(&path)?,
            (Some(_), Some(_)) | (None, None) => {
                return Err(ConfigurationError::ExclusiveArguments {
                    node_id: node_id.to_string(),
                    message: "exactly one of 'node_data' or 'path_to_node_config' must be set"
                        .to_string(),
                });
            }
        };
        let inner = session.build_rooted(definition, &params.start_node)?;
        Ok(Self {
            key_blacklist: params.key_blacklist,
            output,
            inner,
        })
    }

    pub fn output(&self) -> &EncapsulationOutput {
        &self.output
    }

    pub fn inner(&self) -> &Subgraph {
        &self.inner
    }

    pub(crate) fn execute(
        &mut self,
        node_id: &str,
        context: &mut Context,
    ) -> Result<Outcome, ExecutionError> {
        let mut scope = context.project(&self.key_blacklist);
        self.inner
            .run(&mut scope)
            .map_err(|source| ExecutionError::Nested {
                node_id: node_id.to_string(),
                source: Box::new(source),
            })?;
        match &self.output {
            EncapsulationOutput::Nest(key) => {
                context.insert(key.clone(), scope.into_value());
            }
            EncapsulationOutput::Merge => context.merge(scope),
        }
        Ok(Outcome::Continue)
    }
}
