//! The facade a launcher drives: build once, then validate, plot and run.

use crate::context::Context;
use crate::definition::GraphDefinition;
use crate::error::{ConfigurationError, CycleError, ExecutionError, PipelineError};
use crate::executor::RunSummary;
use crate::graph::{BuildSession, Graph, NodeRef, Subgraph};
use crate::registry::TypeRegistry;
use crate::validator::{Ordering, Severity, ValidationReport, ValidatorConfig, check_for_cycles, validate};
use crate::visualizer::{DotOptions, render_dot};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A fully built pipeline graph together with the settings used to check
/// and draw it.
#[derive(Debug)]
pub struct Pipeline {
    root: Subgraph,
    declared: BTreeSet<String>,
    validator: ValidatorConfig,
    dot_options: DotOptions,
}

/// A builder for creating a configured [`Pipeline`].
pub struct PipelineBuilder {
    definition: GraphDefinition,
    root_id: String,
    registry: Option<Arc<TypeRegistry>>,
    base_dir: Option<PathBuf>,
    validator: ValidatorConfig,
    dot_options: DotOptions,
}

impl PipelineBuilder {
    /// Uses `registry` instead of the built-in-only registry.
    pub fn with_registry(mut self, registry: Arc<TypeRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Directory that relative `path_to_node_config` values resolve against.
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    pub fn with_unreachable_severity(mut self, severity: Severity) -> Self {
        self.validator.unreachable = severity;
        self
    }

    pub fn with_dot_options(mut self, options: DotOptions) -> Self {
        self.dot_options = options;
        self
    }

    /// Builds every node, inner graphs included, and wires the children.
    pub fn build(self) -> Result<Pipeline, ConfigurationError> {
        let registry = self.registry.unwrap_or_else(TypeRegistry::builtin);
        let mut session = BuildSession::new(registry);
        if let Some(dir) = self.base_dir {
            session = session.with_base_dir(dir);
        }

        let root = session.build_rooted(self.definition, &self.root_id)?;
        let declared = session.into_declared_ids();
        tracing::info!(
            root = %self.root_id,
            nodes = declared.len(),
            "Pipeline graph built"
        );

        Ok(Pipeline {
            root,
            declared,
            validator: self.validator,
            dot_options: self.dot_options,
        })
    }
}

impl Pipeline {
    pub fn builder(definition: GraphDefinition, root_id: impl Into<String>) -> PipelineBuilder {
        PipelineBuilder {
            definition,
            root_id: root_id.into(),
            registry: None,
            base_dir: None,
            validator: ValidatorConfig::default(),
            dot_options: DotOptions::default(),
        }
    }

    /// Loads a definition file into a builder whose base directory is the
    /// file's own directory.
    pub fn builder_from_file(
        path: impl AsRef<Path>,
        root_id: impl Into<String>,
    ) -> Result<PipelineBuilder, ConfigurationError> {
        let path = path.as_ref();
        let definition = GraphDefinition::from_file(path)?;
        let builder = Self::builder(definition, root_id);
        Ok(match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => builder.with_base_dir(dir),
            _ => builder,
        })
    }

    /// Loads and builds a definition file using only the built-in types.
    pub fn from_file(
        path: impl AsRef<Path>,
        root_id: impl Into<String>,
    ) -> Result<Self, ConfigurationError> {
        Self::builder_from_file(path, root_id)?.build()
    }

    /// The graph the root node was declared in.
    pub fn graph(&self) -> &Graph {
        self.root.graph()
    }

    pub fn root(&self) -> NodeRef<'_> {
        self.root.start()
    }

    /// Every id declared anywhere in the pipeline, inner graphs included.
    pub fn declared_ids(&self) -> &BTreeSet<String> {
        &self.declared
    }

    /// Runs the configured validation and returns the full report.
    pub fn validate(&self) -> Result<ValidationReport<'_>, CycleError> {
        validate(self.root(), &self.declared, &self.validator)
    }

    /// Like [`validate`](Pipeline::validate), but a report that is not ok
    /// becomes an error.
    pub fn check(&self) -> Result<Ordering<'_>, PipelineError> {
        let report = self.validate()?;
        if !report.ok {
            return Err(PipelineError::Unreachable(
                report.unreachable.into_iter().collect(),
            ));
        }
        Ok(report.ordering)
    }

    /// Renders the pipeline as DOT text.
    pub fn to_dot(&self) -> Result<String, PipelineError> {
        let ordering = check_for_cycles(self.root())?;
        Ok(render_dot(&ordering, &self.dot_options)?)
    }

    /// Executes the pipeline from its root against `context`.
    ///
    /// Sink counters are reset first, so every call behaves as a fresh run.
    /// The graph is not checked here: a cyclic pipeline never terminates.
    /// Call [`check`](Pipeline::check) first, or use
    /// [`run_checked`](Pipeline::run_checked).
    pub fn run(&mut self, context: &mut Context) -> Result<RunSummary, ExecutionError> {
        self.root.run(context)
    }

    /// Rejects cyclic graphs, then runs like [`run`](Pipeline::run).
    pub fn run_checked(&mut self, context: &mut Context) -> Result<RunSummary, PipelineError> {
        check_for_cycles(self.root())?;
        Ok(self.run(context)?)
    }
}
