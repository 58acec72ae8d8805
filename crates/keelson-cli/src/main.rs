// crates/keelson-cli/src/main.rs
// ============================================================================
// Module: Keelson CLI Entry Point
// Description: Thin command surface over the validation pipeline.
// Purpose: Run phases, check gates, and inspect or snapshot state from a shell.
// Dependencies: clap, keelson-core, keelson-validators, serde_json, tracing
// ============================================================================

//! ## Overview
//! The CLI is explicitly not part of the core: it wires the built-in
//! validator catalog into a pipeline, loads state from an optional
//! snapshot, dispatches one command, and maps outcomes onto exit codes:
//! 0 pass or can-advance, 2 gate blocked, 3 execution error, 4 bad
//! arguments.

// ============================================================================
// SECTION: Modules
// ============================================================================


// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;
use std::sync::Arc;

use clap::Parser;
use clap::Subcommand;
use thiserror::Error;
use tracing::info;

use keelson_core::ExecutionState;
use keelson_core::ExecutorConfig;
use keelson_core::PipelineExecutor;
use keelson_core::ResultAggregator;
use keelson_core::StateStore;
use keelson_core::StateValue;
use keelson_core::ValidatorRegistry;
use keelson_core::ValidatorTopology;
use keelson_core::core::ExecutionId;
use keelson_core::core::PhaseId;
use keelson_validators::catalog;
use keelson_validators::register_builtins;

// ============================================================================
// SECTION: Command Line
// ============================================================================

/// Keelson parametric design pipeline.
#[derive(Debug, Parser)]
#[command(name = "keelson", version, about = "Parametric workboat design pipeline")]
struct Cli {
    /// Snapshot file to load state from before the command runs.
    #[arg(long, global = true, value_name = "FILE")]
    state: Option<PathBuf>,
    /// Snapshot file to save state to after the command runs.
    #[arg(long, global = true, value_name = "FILE")]
    save: Option<PathBuf>,
    /// Command to dispatch.
    #[command(subcommand)]
    command: Command,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
enum Command {
    /// Runs the validators of one phase.
    Run {
        /// Canonical phase name.
        phase: String,
    },
    /// Runs a phase and reports the gate verdict.
    Gate {
        /// Canonical phase name.
        phase: String,
    },
    /// Shows the value at a state path.
    Show {
        /// Dotted state path.
        path: String,
    },
    /// Writes the state snapshot to a file.
    Snapshot {
        /// Destination file.
        file: PathBuf,
    },
    /// Restores state from a snapshot file.
    Restore {
        /// Source file.
        file: PathBuf,
    },
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI failures mapped onto exit codes.
#[derive(Debug, Error)]
enum CliError {
    /// Invalid arguments (exit 4).
    #[error("bad arguments: {0}")]
    BadArguments(String),
    /// Execution failure (exit 3).
    #[error("execution error: {0}")]
    Execution(String),
}

impl CliError {
    /// Maps the error onto its exit code.
    const fn exit_code(&self) -> u8 {
        match self {
            Self::BadArguments(_) => 4,
            Self::Execution(_) => 3,
        }
    }
}

// ============================================================================
// SECTION: Entry Point
// ============================================================================

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match dispatch(&cli) {
        Ok(code) => code,
        Err(err) => {
            let _ = write_stderr_line(&err.to_string());
            ExitCode::from(err.exit_code())
        }
    }
}

/// Dispatches one parsed command.
fn dispatch(cli: &Cli) -> Result<ExitCode, CliError> {
    let pipeline = Pipeline::assemble()?;
    if let Some(path) = &cli.state {
        pipeline.load_state(path)?;
    }

    let code = match &cli.command {
        Command::Run { phase } => pipeline.run(parse_phase(phase)?),
        Command::Gate { phase } => pipeline.gate(parse_phase(phase)?),
        Command::Show { path } => pipeline.show(path),
        Command::Snapshot { file } => pipeline.snapshot(file),
        Command::Restore { file } => {
            pipeline.load_state(file)?;
            Ok(ExitCode::SUCCESS)
        }
    }?;

    if let Some(path) = &cli.save {
        pipeline.snapshot(path)?;
    }
    Ok(code)
}

/// Parses a canonical phase name, mapping failures to exit 4.
fn parse_phase(name: &str) -> Result<PhaseId, CliError> {
    PhaseId::from_str(name).map_err(|err| CliError::BadArguments(err.to_string()))
}

// ============================================================================
// SECTION: Pipeline Assembly
// ============================================================================

/// One assembled pipeline: store, topology, registry, executor, gates.
struct Pipeline {
    /// Shared state store.
    store: Arc<StateStore>,
    /// Pipeline executor over the built-in catalog.
    executor: PipelineExecutor,
    /// Gate aggregator.
    aggregator: ResultAggregator,
}

impl Pipeline {
    /// Builds the pipeline from the built-in validator catalog.
    fn assemble() -> Result<Self, CliError> {
        let mut topology = ValidatorTopology::new();
        for definition in catalog() {
            topology
                .add_validator(definition)
                .map_err(|err| CliError::Execution(err.to_string()))?;
        }
        topology.build().map_err(|err| CliError::Execution(err.to_string()))?;

        let mut registry = ValidatorRegistry::new();
        registry.reset();
        register_builtins(&mut registry);
        let instantiated = registry.instantiate_all();
        registry.validate_required().map_err(|err| CliError::Execution(err.to_string()))?;
        info!(instantiated, "validator registry ready");

        let store = Arc::new(StateStore::new());
        store.install_dependencies(topology.reverse_parameter_adjacency());

        let topology = Arc::new(topology);
        let registry = Arc::new(registry);
        let executor = PipelineExecutor::new(
            Arc::clone(&topology),
            Arc::clone(&store),
            Arc::clone(&registry),
            ExecutorConfig::default(),
        );
        let aggregator = ResultAggregator::new(Arc::clone(&topology))
            .with_store(Arc::clone(&store))
            .with_registry(registry);

        Ok(Self {
            store,
            executor,
            aggregator,
        })
    }

    /// Restores state from a snapshot file.
    fn load_state(&self, path: &Path) -> Result<(), CliError> {
        let bytes =
            std::fs::read(path).map_err(|err| CliError::BadArguments(err.to_string()))?;
        self.store.restore(&bytes).map_err(|err| CliError::BadArguments(err.to_string()))
    }

    /// Runs one phase and prints the execution summary.
    fn run(&self, phase: PhaseId) -> Result<ExitCode, CliError> {
        let state = self.execute(phase)?;
        let summary = serde_json::to_string_pretty(&state.summary())
            .map_err(|err| CliError::Execution(err.to_string()))?;
        write_stdout_line(&summary)?;
        if state.had_fatal_error {
            return Err(CliError::Execution("pipeline stopped on fatal error".to_string()));
        }
        Ok(ExitCode::SUCCESS)
    }

    /// Runs one phase and prints the gate verdict.
    fn gate(&self, phase: PhaseId) -> Result<ExitCode, CliError> {
        let state = self.execute(phase)?;
        let status = self.aggregator.check_gate(phase, &state);
        let rendered = serde_json::to_string_pretty(&status)
            .map_err(|err| CliError::Execution(err.to_string()))?;
        write_stdout_line(&rendered)?;
        if status.can_advance {
            Ok(ExitCode::SUCCESS)
        } else {
            Ok(ExitCode::from(2))
        }
    }

    /// Executes the validators of one phase.
    fn execute(&self, phase: PhaseId) -> Result<ExecutionState, CliError> {
        let execution_id = ExecutionId::new(format!("cli-{phase}"));
        Ok(self.executor.execute_phase(execution_id, phase))
    }

    /// Prints the value at one state path.
    fn show(&self, path: &str) -> Result<ExitCode, CliError> {
        let value = self.store.get(path, StateValue::Null);
        if value.is_null() && !self.store.contains(path) {
            return Err(CliError::BadArguments(format!("no value at {path}")));
        }
        let rendered = serde_json::to_string_pretty(&value.to_json())
            .map_err(|err| CliError::Execution(err.to_string()))?;
        write_stdout_line(&rendered)?;
        Ok(ExitCode::SUCCESS)
    }

    /// Writes the state snapshot to a file.
    fn snapshot(&self, file: &Path) -> Result<ExitCode, CliError> {
        let bytes = self.store.snapshot().map_err(|err| CliError::Execution(err.to_string()))?;
        std::fs::write(file, bytes).map_err(|err| CliError::Execution(err.to_string()))?;
        let paths: BTreeSet<String> = self.store.paths().into_iter().collect();
        info!(paths = paths.len(), file = %file.display(), "snapshot written");
        Ok(ExitCode::SUCCESS)
    }
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> Result<(), CliError> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}").map_err(|err| CliError::Execution(err.to_string()))
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}
