use aqp::prelude::*;
use clap::Parser;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitCode};
use std::time::Instant;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Builds, validates, plots and runs an audio quality evaluation pipeline
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Id of the node the pipeline starts from
    #[arg(long = "root_node_id")]
    root_node_id: String,

    /// Path to the pipeline definition JSON file
    #[arg(long = "graph_config_path")]
    graph_config_path: PathBuf,

    /// Render the pipeline graph
    #[arg(long = "plot_graph", requires = "graph_output_file")]
    plot_graph: bool,

    /// Path prefix for the rendered graph files
    #[arg(long = "graph_output_file")]
    graph_output_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,

    /// Only validate the pipeline, do not run it
    #[arg(long)]
    validate: bool,
}

#[derive(Error, Debug)]
enum LaunchError {
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("Failed to write '{path}': {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },
}

impl From<ConfigurationError> for LaunchError {
    fn from(err: ConfigurationError) -> Self {
        LaunchError::Pipeline(err.into())
    }
}

impl From<ExecutionError> for LaunchError {
    fn from(err: ExecutionError) -> Self {
        LaunchError::Pipeline(err.into())
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    match launch(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "Pipeline aborted");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn launch(cli: &Cli) -> Result<(), LaunchError> {
    let total_start = Instant::now();

    // --- 1. Build ---
    let build_start = Instant::now();
    let mut pipeline = Pipeline::from_file(&cli.graph_config_path, cli.root_node_id.as_str())?;
    tracing::info!(
        path = %cli.graph_config_path.display(),
        elapsed = ?build_start.elapsed(),
        "Pipeline built"
    );

    // --- 2. Validate ---
    let reachable = pipeline.check()?.len();
    tracing::info!(reachable, "Pipeline graph is valid");

    // --- 3. Plot ---
    if cli.plot_graph {
        if let Some(prefix) = &cli.graph_output_file {
            plot(&pipeline, prefix)?;
        }
    }

    if cli.validate {
        return Ok(());
    }

    // --- 4. Run ---
    let run_start = Instant::now();
    let mut context = Context::new();
    let summary = pipeline.run(&mut context)?;
    tracing::info!(
        executed = summary.executed,
        skipped = summary.skipped,
        results = context.len(),
        elapsed = ?run_start.elapsed(),
        "Pipeline finished"
    );
    tracing::debug!(total = ?total_start.elapsed(), "Launcher finished");

    Ok(())
}

fn with_suffix(prefix: &Path, suffix: &str) -> PathBuf {
    let mut path: OsString = prefix.as_os_str().to_owned();
    path.push(suffix);
    PathBuf::from(path)
}

fn plot(pipeline: &Pipeline, prefix: &Path) -> Result<(), LaunchError> {
    let dot_path = with_suffix(prefix, ".dot");
    let dot = pipeline.to_dot()?;
    fs::write(&dot_path, dot).map_err(|source| LaunchError::Write {
        path: dot_path.display().to_string(),
        source,
    })?;
    tracing::info!(path = %dot_path.display(), "Graph written");

    for format in ["svg", "png"] {
        let output = with_suffix(prefix, &format!(".{}", format));
        let status = Command::new("dot")
            .arg(format!("-T{}", format))
            .arg(&dot_path)
            .arg("-o")
            .arg(&output)
            .status();
        match status {
            Ok(status) if status.success() => {
                tracing::info!(path = %output.display(), "Graph rendered");
            }
            Ok(status) => {
                tracing::warn!(format, %status, "Graphviz failed to render the graph");
            }
            Err(err) => {
                tracing::warn!(error = %err, "Graphviz 'dot' is not available, skipping rendering");
                break;
            }
        }
    }

    Ok(())
}
