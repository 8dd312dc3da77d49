/*!
 * Cadence CLI - Command Line Interface
 */

use cadence::{
    commands::{ingest, parse_session, parse_telemetry, write_default_config},
    config::CadenceConfig,
    error::{CadenceError, Result, EXIT_PARTIAL, EXIT_SUCCESS},
    factory, logging,
};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "cadence")]
#[command(version, about = "Telemetry-driven genre selection with resilient cache + store persistence", long_about = None)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, value_name = "PATH", env = "CADENCE_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Verbose output (debug logging)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process telemetry samples (JSON object, array or JSON Lines)
    Ingest {
        #[arg(short, long, value_name = "PATH")]
        file: PathBuf,
    },

    /// Manage session state
    #[command(subcommand)]
    Session(SessionCommand),

    /// Read stored telemetry
    #[command(subcommand)]
    Telemetry(TelemetryCommand),

    /// Configuration helpers
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Subcommand)]
enum SessionCommand {
    /// Store a session state, or a bare session config as a fresh state
    Put {
        #[arg(short, long, value_name = "PATH")]
        file: PathBuf,
    },

    /// Print a session state
    Get { session_id: String },
}

#[derive(Subcommand)]
enum TelemetryCommand {
    /// Print the latest telemetry sample of a session
    Get { session_id: String },
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Write the default configuration
    Init {
        #[arg(short, long, value_name = "PATH", default_value = "cadence.toml")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    let code = match run(Cli::parse()).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            e.exit_code()
        }
    };
    std::process::exit(code);
}

async fn run(cli: Cli) -> Result<i32> {
    // `config init` must work before any config file exists
    if let Commands::Config(ConfigCommand::Init { output }) = &cli.command {
        write_default_config(output)?;
        println!("Wrote {}", output.display());
        return Ok(EXIT_SUCCESS);
    }

    let mut config = match &cli.config {
        Some(path) => CadenceConfig::from_file(path)?,
        None => CadenceConfig::default(),
    };
    config.logging.verbose |= cli.verbose;
    logging::init_logging(&config.logging)?;

    let orchestrator = factory::build_orchestrator(&config).await?;

    match cli.command {
        Commands::Ingest { file } => {
            let samples = parse_telemetry(&read_input(&file)?)?;
            let dispatcher = factory::build_dispatcher(&config)?;
            let report = ingest(&orchestrator, Some(&dispatcher), samples).await?;

            for outcome in &report.outcomes {
                print_json(outcome)?;
            }
            if report.is_durable() {
                Ok(EXIT_SUCCESS)
            } else {
                Ok(EXIT_PARTIAL)
            }
        }

        Commands::Session(SessionCommand::Put { file }) => {
            let state = parse_session(&read_input(&file)?)?;
            let session_id = state.session_id().to_string();
            let outcome = orchestrator.process_session(state).await?;
            print_json(&outcome)?;
            if outcome.is_durable() {
                Ok(EXIT_SUCCESS)
            } else {
                Err(CadenceError::NotDurable(session_id))
            }
        }

        Commands::Session(SessionCommand::Get { session_id }) => {
            let state = orchestrator
                .get_session(&session_id)
                .await?
                .ok_or_else(|| CadenceError::NotFound(format!("session {}", session_id)))?;
            print_json(&state)?;
            Ok(EXIT_SUCCESS)
        }

        Commands::Telemetry(TelemetryCommand::Get { session_id }) => {
            let payload = orchestrator
                .get_telemetry(&session_id)
                .await?
                .ok_or_else(|| CadenceError::NotFound(format!("telemetry for {}", session_id)))?;
            print_json(&payload)?;
            Ok(EXIT_SUCCESS)
        }

        Commands::Config(ConfigCommand::Init { .. }) => Ok(EXIT_SUCCESS),
    }
}

fn read_input(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| {
        CadenceError::Io(std::io::Error::new(
            e.kind(),
            format!("{}: {}", path.display(), e),
        ))
    })
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
