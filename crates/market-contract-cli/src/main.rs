// crates/market-contract-cli/src/main.rs
// ============================================================================
// Module: Market Contract CLI Entry Point
// Description: Command dispatcher for running and listing the contract suite.
// Purpose: Run the market suite end to end and map results to exit codes.
// Dependencies: clap, market-contract, serde_json, thiserror, tokio.
// ============================================================================

//! ## Overview
//! `market-contract run` resolves configuration, creates the fixture market,
//! runs every scenario in order, deletes the fixture, and writes run
//! artifacts. Exit codes: `0` when every step passed, `1` when any scenario or
//! teardown failed, `2` when setup failed or the run could not start.

// ============================================================================
// SECTION: Modules
// ============================================================================

mod render;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::ArgAction;
use clap::Args;
use clap::CommandFactory;
use clap::Parser;
use clap::Subcommand;
use market_contract::ConfigOverrides;
use market_contract::ContractConfig;
use market_contract::ContractRunner;
use market_contract::FileRunLog;
use market_contract::MarketHttpClient;
use market_contract::MultiRunLog;
use market_contract::RunArtifacts;
use market_contract::RunnerError;
use market_contract::StderrRunLog;
use market_contract::SuiteContext;
use market_contract::fresh_market_name;
use market_contract::market_suite;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Exit code when every step passed and the artifacts were written.
const EXIT_PASSED: u8 = 0;
/// Exit code when at least one scenario or the teardown failed, or a
/// completed run could not write its artifacts.
const EXIT_FAILED: u8 = 1;
/// Exit code when setup failed or the run could not start.
const EXIT_SETUP: u8 = 2;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "market-contract", disable_help_subcommand = true, disable_version_flag = true)]
struct Cli {
    /// Print version information and exit.
    #[arg(long = "version", action = ArgAction::SetTrue, global = true)]
    show_version: bool,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the contract suite against the market API.
    Run(RunCommand),
    /// Print the ordered scenario catalog.
    List(ListCommand),
}

/// Arguments for `run`.
#[derive(Args, Debug)]
struct RunCommand {
    /// Market collection base URL.
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,
    /// Per-request timeout in seconds.
    #[arg(long, value_name = "SECONDS")]
    timeout_sec: Option<u64>,
    /// TOML config file.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Directory for summary and transcript artifacts.
    #[arg(long, value_name = "DIR")]
    run_root: Option<PathBuf>,
    /// Append JSON-lines run events to this file.
    #[arg(long, value_name = "PATH")]
    audit_log: Option<PathBuf>,
    /// Suppress JSON-lines run events on stderr.
    #[arg(long, action = ArgAction::SetTrue)]
    quiet: bool,
}

impl RunCommand {
    /// Explicit configuration layer built from flags.
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            config_path: self.config.clone(),
            base_url: self.base_url.clone(),
            timeout_sec: self.timeout_sec,
            run_root: self.run_root.clone(),
            audit_log: self.audit_log.clone(),
        }
    }
}

/// Arguments for `list`.
#[derive(Args, Debug)]
struct ListCommand {
    /// Emit the catalog as JSON.
    #[arg(long, action = ArgAction::SetTrue)]
    json: bool,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error carrying a single-line message.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
async fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();

    if cli.show_version {
        let version = env!("CARGO_PKG_VERSION");
        stdout_line(&format!("market-contract {version}"))?;
        return Ok(ExitCode::SUCCESS);
    }

    let Some(command) = cli.command else {
        stdout_line(&Cli::command().render_help().to_string())?;
        return Ok(ExitCode::SUCCESS);
    };

    match command {
        Commands::Run(command) => command_run(&command).await,
        Commands::List(command) => command_list(&command),
    }
}

// ============================================================================
// SECTION: Run Command
// ============================================================================

/// Executes the `run` command.
async fn command_run(command: &RunCommand) -> CliResult<ExitCode> {
    let config = ContractConfig::load(&command.overrides())
        .map_err(|err| CliError::new(err.to_string()))?;
    let log = build_run_log(&config, command.quiet)?;
    let client = MarketHttpClient::new(config.timeout)
        .map_err(|err| CliError::new(err.to_string()))?;
    let root = config.run_root.clone().unwrap_or_else(RunArtifacts::default_root);
    let artifacts = RunArtifacts::new(root).map_err(|err| CliError::new(err.to_string()))?;

    let suite = market_suite();
    let context = SuiteContext::new(config.base_url.as_str(), fresh_market_name());
    let runner = ContractRunner::new(&client, &log);
    match runner.run_suite(&suite, context).await {
        Ok(report) => {
            for step in report.steps() {
                stdout_line(&render::step_line(step))?;
            }
            stdout_line(&render::summary_line(&report))?;
            let written = artifacts.write_suite(&report, &client.transcript());
            match &written {
                Ok(_) => stdout_line(&format!("artifacts: {}", artifacts.root().display()))?,
                Err(err) => {
                    let _ = write_stderr_line(&format!("failed to write artifacts: {err}"));
                }
            }
            Ok(ExitCode::from(completed_run_code(report.passed(), written.is_ok())))
        }
        Err(RunnerError::Setup {
            report,
            reason,
        }) => {
            stdout_line(&render::step_line(&report))?;
            artifacts
                .write_aborted(&suite.name, &report, &client.transcript())
                .map_err(|err| CliError::new(err.to_string()))?;
            stdout_line(&format!("artifacts: {}", artifacts.root().display()))?;
            Ok(emit_error(&format!("setup failed, no scenario was run: {reason}")))
        }
    }
}

/// Exit code for a run that got past setup.
const fn completed_run_code(passed: bool, artifacts_written: bool) -> u8 {
    if passed && artifacts_written { EXIT_PASSED } else { EXIT_FAILED }
}

/// Builds the run log fan-out from config and flags.
fn build_run_log(config: &ContractConfig, quiet: bool) -> CliResult<MultiRunLog> {
    let mut log = MultiRunLog::new();
    if !quiet {
        log = log.with(Box::new(StderrRunLog));
    }
    if let Some(path) = &config.audit_log {
        let sink = FileRunLog::new(path).map_err(|err| {
            CliError::new(format!("failed to open audit log {}: {err}", path.display()))
        })?;
        log = log.with(Box::new(sink));
    }
    Ok(log)
}

// ============================================================================
// SECTION: List Command
// ============================================================================

/// Executes the `list` command.
fn command_list(command: &ListCommand) -> CliResult<ExitCode> {
    let suite = market_suite();
    if command.json {
        let entries = render::catalog_entries(&suite);
        let payload = serde_json::to_string_pretty(&entries)
            .map_err(|err| CliError::new(format!("failed to encode catalog: {err}")))?;
        stdout_line(&payload)?;
    } else {
        for line in render::catalog_lines(&suite) {
            stdout_line(&line)?;
        }
    }
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a stdout line, mapping failures to [`CliError`].
fn stdout_line(message: &str) -> CliResult<()> {
    write_stdout_line(message)
        .map_err(|err| CliError::new(format!("failed to write to stdout: {err}")))
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Emits an error message to stderr and returns the setup exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::from(EXIT_SETUP)
}
