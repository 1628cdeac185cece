// crates/api-probe-cli/src/main.rs
// ============================================================================
// Module: api-probe CLI Entry Point
// Description: Command dispatcher for collection runs and local self-tests.
// Purpose: Wire configuration, identity, and runner backends into one run.
// Dependencies: api-probe-{config, core, providers, runners}, clap, tokio.
// ============================================================================

//! ## Overview
//! `api-probe run` signs in to the configured user pool, builds the Postman
//! environment, runs the collection, and prints the status payload as one
//! JSON line. `auth` and `env` exercise the first two stages on their own.
//! With no subcommand the binary behaves like `run`, unless
//! `API_PROBE_SELF_TEST` selects a self-test.
//!
//! The process exits 0 whatever the verdict unless `--strict-exit` is given.
//! Configuration errors exit 1 with the message on stderr.

// ============================================================================
// SECTION: Modules
// ============================================================================

#[cfg(test)]
mod main_tests;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use api_probe_config::ConfigError;
use api_probe_config::ProbeConfig;
use api_probe_config::RunnerKind;
use api_probe_config::config_toml_example;
use api_probe_core::CollectionRunner;
use api_probe_core::CredentialProvider;
use api_probe_core::EnvironmentBuilder;
use api_probe_core::IdentityProvider;
use api_probe_core::LogSink;
use api_probe_core::Logger;
use api_probe_core::RunOrchestrator;
use api_probe_core::handle_trigger;
use api_probe_core::logging::FileLogSink;
use api_probe_core::logging::StdoutLogSink;
use api_probe_core::logging::TeeLogSink;
use api_probe_providers::CognitoIdentityProvider;
use api_probe_providers::CognitoProviderConfig;
use api_probe_runners::NativeRunner;
use api_probe_runners::NativeRunnerConfig;
use api_probe_runners::NewmanRunner;
use api_probe_runners::NewmanRunnerConfig;
use clap::ArgAction;
use clap::Args;
use clap::Parser;
use clap::Subcommand;
use serde_json::Value;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Environment variable selecting a self-test when no subcommand is given.
const SELF_TEST_ENV: &str = "API_PROBE_SELF_TEST";
/// Maximum accepted trigger event size in bytes.
const MAX_EVENT_BYTES: u64 = 1024 * 1024;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(
    name = "api-probe",
    disable_help_subcommand = true,
    disable_version_flag = true,
    args_conflicts_with_subcommands = true
)]
struct Cli {
    /// Print version information and exit.
    #[arg(long = "version", action = ArgAction::SetTrue)]
    show_version: bool,
    /// Run arguments used when no subcommand is given.
    #[command(flatten)]
    run: RunCommand,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Authenticate, build the environment, and run the collection.
    Run(RunCommand),
    /// Sign in and print the decoded token claims.
    Auth(TargetArgs),
    /// Build and print the Postman environment with the token redacted.
    Env(TargetArgs),
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Load and validate a config file.
    Validate(TargetArgs),
    /// Print a commented example config.
    Example,
}

/// Config file and profile selection.
#[derive(Args, Debug)]
struct TargetArgs {
    /// Config file path (defaults to api-probe.toml or `API_PROBE_CONFIG`).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Profile to merge over the root tables (defaults to `API_PROBE_PROFILE`).
    #[arg(long, value_name = "NAME")]
    profile: Option<String>,
}

/// Arguments for the `run` command.
#[derive(Args, Debug)]
struct RunCommand {
    /// Config selection.
    #[command(flatten)]
    target: TargetArgs,
    /// Trigger event JSON file; parsed and otherwise ignored.
    #[arg(long, value_name = "PATH")]
    event: Option<PathBuf>,
    /// Exit 1 when the run reports a failure.
    #[arg(long, action = ArgAction::SetTrue)]
    strict_exit: bool,
}

/// Self-tests selectable through `API_PROBE_SELF_TEST`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SelfTest {
    /// Credential provider only.
    Auth,
    /// Credential provider and environment builder.
    Env,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error carrying the message printed to stderr.
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

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        Self::new(err.to_string())
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
        write_stdout_line(&format!("api-probe {version}"))
            .map_err(|err| CliError::new(output_error("stdout", &err)))?;
        return Ok(ExitCode::SUCCESS);
    }

    match cli.command {
        Some(Commands::Run(command)) => command_run(command).await,
        Some(Commands::Auth(target)) => command_auth(&target).await,
        Some(Commands::Env(target)) => command_env(&target).await,
        Some(Commands::Config {
            command,
        }) => command_config(command),
        None => {
            let self_test = std::env::var(SELF_TEST_ENV).ok();
            match resolve_self_test(self_test.as_deref())? {
                Some(SelfTest::Auth) => command_auth(&cli.run.target).await,
                Some(SelfTest::Env) => command_env(&cli.run.target).await,
                None => command_run(cli.run).await,
            }
        }
    }
}

/// Parses the self-test selector; blank means no self-test.
fn resolve_self_test(value: Option<&str>) -> CliResult<Option<SelfTest>> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(name) if name.eq_ignore_ascii_case("auth") => Ok(Some(SelfTest::Auth)),
        Some(name) if name.eq_ignore_ascii_case("env") => Ok(Some(SelfTest::Env)),
        Some(name) => Err(CliError::new(format!(
            "{SELF_TEST_ENV} must be auth or env, got {name}"
        ))),
    }
}

// ============================================================================
// SECTION: Run Command
// ============================================================================

/// Executes the `run` command.
async fn command_run(command: RunCommand) -> CliResult<ExitCode> {
    let event = match &command.event {
        Some(path) => read_event(path)?,
        None => Value::Null,
    };
    let config = load_config(&command.target)?;
    let logger = build_logger(&config)?;
    let environment = environment_builder(&config, &logger)?;
    let runner = collection_runner(&config, &logger)?;
    let orchestrator =
        RunOrchestrator::new(environment, runner, config.orchestrator_config(), logger.clone());
    let payload = handle_trigger(&orchestrator, &logger, &event).await;
    let line = serde_json::to_string(&payload)
        .map_err(|err| CliError::new(format!("status payload encoding failed: {err}")))?;
    write_stdout_line(&line).map_err(|err| CliError::new(output_error("stdout", &err)))?;
    if command.strict_exit && !payload.is_success() {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

/// Reads and parses a trigger event file.
fn read_event(path: &Path) -> CliResult<Value> {
    let metadata = fs::metadata(path)
        .map_err(|err| CliError::new(format!("event {}: {err}", path.display())))?;
    if metadata.len() > MAX_EVENT_BYTES {
        return Err(CliError::new(format!("event {} exceeds size limit", path.display())));
    }
    let bytes =
        fs::read(path).map_err(|err| CliError::new(format!("event {}: {err}", path.display())))?;
    serde_json::from_slice(&bytes)
        .map_err(|err| CliError::new(format!("event {} is not json: {err}", path.display())))
}

// ============================================================================
// SECTION: Self-Test Commands
// ============================================================================

/// Executes the `auth` self-test.
async fn command_auth(target: &TargetArgs) -> CliResult<ExitCode> {
    let config = load_config(target)?;
    let logger = build_logger(&config)?;
    let credentials = credential_provider(&config, &logger)?;
    let bundle = credentials.obtain().await.map_err(|err| CliError::new(err.to_string()))?;
    write_json(&bundle.redacted_json())?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `env` self-test.
async fn command_env(target: &TargetArgs) -> CliResult<ExitCode> {
    let config = load_config(target)?;
    let logger = build_logger(&config)?;
    let builder = environment_builder(&config, &logger)?;
    let document = builder.build().await.map_err(|err| CliError::new(err.to_string()))?;
    let value = serde_json::to_value(document.redacted())
        .map_err(|err| CliError::new(format!("environment encoding failed: {err}")))?;
    write_json(&value)?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Config Commands
// ============================================================================

/// Dispatches config subcommands.
fn command_config(command: ConfigCommand) -> CliResult<ExitCode> {
    match command {
        ConfigCommand::Validate(target) => command_config_validate(&target),
        ConfigCommand::Example => {
            write_stdout_line(config_toml_example().trim_end())
                .map_err(|err| CliError::new(output_error("stdout", &err)))?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Executes the config validation command.
fn command_config_validate(target: &TargetArgs) -> CliResult<ExitCode> {
    let _config = load_config(target)?;
    write_stdout_line("config ok").map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Wiring
// ============================================================================

/// Loads and validates configuration for `target`.
fn load_config(target: &TargetArgs) -> CliResult<ProbeConfig> {
    Ok(ProbeConfig::load(target.config.as_deref(), target.profile.as_deref())?)
}

/// Builds the run logger: stdout, plus the configured file when set.
fn build_logger(config: &ProbeConfig) -> CliResult<Logger> {
    let stdout: Arc<dyn LogSink> = Arc::new(StdoutLogSink::new(config.log.format));
    let sink: Arc<dyn LogSink> = match config.log.file.as_deref() {
        Some(file) => {
            let file_sink = FileLogSink::new(Path::new(file), config.log.format)
                .map_err(|err| CliError::new(format!("log file {file}: {err}")))?;
            Arc::new(TeeLogSink::new(vec![stdout, Arc::new(file_sink)]))
        }
        None => stdout,
    };
    Ok(Logger::new(config.log.level, &config.log.service, sink))
}

/// Builds the credential provider against the configured user pool.
fn credential_provider(config: &ProbeConfig, logger: &Logger) -> CliResult<CredentialProvider> {
    let region = config.cognito.resolved_region()?;
    let mut provider_config = CognitoProviderConfig::for_region(&region, config.cognito.timeout());
    if let Some(endpoint) = config.cognito.endpoint.as_deref() {
        provider_config.endpoint = endpoint.trim().to_string();
    }
    let identity: Arc<dyn IdentityProvider> = Arc::new(
        CognitoIdentityProvider::new(provider_config, logger.clone())
            .map_err(|err| CliError::new(err.to_string()))?,
    );
    Ok(CredentialProvider::new(identity, config.cognito.credentials(), logger.clone()))
}

/// Builds the environment builder.
fn environment_builder(config: &ProbeConfig, logger: &Logger) -> CliResult<EnvironmentBuilder> {
    Ok(EnvironmentBuilder::new(
        config.base_url.trim().to_string(),
        config.environment.settings(),
        credential_provider(config, logger)?,
        logger.clone(),
    ))
}

/// Builds the configured collection runner.
fn collection_runner(
    config: &ProbeConfig,
    logger: &Logger,
) -> CliResult<Arc<dyn CollectionRunner>> {
    match config.collection.runner {
        RunnerKind::Newman => Ok(Arc::new(NewmanRunner::new(
            NewmanRunnerConfig {
                command: config.collection.newman.command.clone(),
                args: config.collection.newman.args.clone(),
            },
            logger.clone(),
        ))),
        RunnerKind::Native => {
            let runner_config = NativeRunnerConfig {
                request_timeout: config.collection.native.request_timeout(),
                ..NativeRunnerConfig::default()
            };
            let runner = NativeRunner::new(&runner_config, logger.clone())
                .map_err(|err| CliError::new(err.to_string()))?;
            Ok(Arc::new(runner))
        }
    }
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a pretty-printed JSON value to stdout.
fn write_json(value: &Value) -> CliResult<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|err| CliError::new(format!("json encoding failed: {err}")))?;
    write_stdout_line(&text).map_err(|err| CliError::new(output_error("stdout", &err)))
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats an output error message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    format!("failed to write to {stream}: {error}")
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
