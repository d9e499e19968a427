//! Workflow Orchestrator Server Entry Point
//!
//! Starts the MCP server on stdio. Stdout is reserved for protocol
//! messages, so every diagnostic goes to stderr through the logger.
//!
//! # Usage
//!
//! ```bash
//! # Serve tools, waiting for a load_workflow call
//! workflow-orchestrator
//!
//! # Preload a workflow so the client can start executing immediately
//! workflow-orchestrator workflows/deploy.md
//!
//! # Debug logging (or set WORKFLOW_ORCHESTRATOR_LOG=debug)
//! workflow-orchestrator --verbose
//! ```

use std::env;
use std::process::ExitCode;

use log::{error, info};

use workflow_orchestrator::execution::Engine;
use workflow_orchestrator::server::{StdioServer, ToolRouter};
use workflow_orchestrator::{APP_NAME, VERSION};

/// Environment variable holding the log filter.
const LOG_ENV: &str = "WORKFLOW_ORCHESTRATOR_LOG";

/// Command-line configuration parsed from arguments.
#[derive(Debug, Default, PartialEq)]
struct Config {
    workflow_path: Option<String>,
    verbose: bool,
}

/// What the process should do after parsing arguments.
#[derive(Debug, PartialEq)]
enum Command {
    Serve(Config),
    Help,
    Version,
}

/// Configures the logger to write timestamped lines to stderr.
fn setup_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };

    env_logger::Builder::from_env(env_logger::Env::new().filter_or(LOG_ENV, level))
        .target(env_logger::Target::Stderr)
        .format(|buf, record| {
            use std::io::Write;

            writeln!(
                buf,
                "{} - {} - {} - {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                APP_NAME,
                record.level(),
                record.args()
            )
        })
        .init();
}

/// Prints usage information.
fn print_usage() {
    eprintln!("Usage: workflow-orchestrator [OPTIONS] [WORKFLOW_FILE]");
    eprintln!();
    eprintln!("Serves markdown workflow tools to an MCP client over stdio.");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  [WORKFLOW_FILE]     Workflow markdown file to load at startup");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --verbose, -v       Enable debug logging");
    eprintln!("  --help, -h          Show this help message");
    eprintln!("  --version, -V       Show version information");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  {}  Log filter (e.g. debug, warn)", LOG_ENV);
}

/// Parses command-line arguments, skipping the program name.
fn parse_arguments(args: &[String]) -> Result<Command, String> {
    let mut config = Config::default();

    for arg in args.iter().skip(1) {
        match arg.as_str() {
            "--help" | "-h" => return Ok(Command::Help),
            "--version" | "-V" => return Ok(Command::Version),
            "--verbose" | "-v" => config.verbose = true,
            arg if arg.starts_with('-') => {
                return Err(format!("Unknown option: {}", arg));
            }
            _ => {
                if config.workflow_path.is_some() {
                    return Err(format!("Unexpected argument: {}", arg));
                }
                config.workflow_path = Some(arg.clone());
            }
        }
    }

    Ok(Command::Serve(config))
}

/// Builds the engine, preloading a workflow when one was given.
///
/// A preload failure is logged and the server still starts empty.
fn build_engine(workflow_path: Option<&str>) -> Engine {
    let mut engine = Engine::new();

    if let Some(path) = workflow_path {
        match engine.load_workflow(path) {
            Ok(summary) => info!("Preloaded {} ({} steps)", path, summary.step_count),
            Err(e) => error!("Failed to preload workflow: {}", e),
        }
    }

    engine
}

/// Main application entry point.
fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let config = match parse_arguments(&args) {
        Ok(Command::Serve(config)) => config,
        Ok(Command::Help) => {
            print_usage();
            return Ok(());
        }
        Ok(Command::Version) => {
            eprintln!("{} {}", APP_NAME, VERSION);
            return Ok(());
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!();
            print_usage();
            return Err(e.into());
        }
    };

    setup_logging(config.verbose);
    info!("Starting {} v{}", APP_NAME, VERSION);

    let engine = build_engine(config.workflow_path.as_deref());
    let mut server = StdioServer::new(ToolRouter::new(engine));

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(server.run())?;

    info!("Server stopped");
    Ok(())
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        std::iter::once("workflow-orchestrator")
            .chain(list.iter().copied())
            .map(String::from)
            .collect()
    }

    #[test]
    fn test_no_arguments_serves_empty() {
        assert_eq!(
            parse_arguments(&args(&[])).unwrap(),
            Command::Serve(Config::default())
        );
    }

    #[test]
    fn test_workflow_and_verbose() {
        let command = parse_arguments(&args(&["-v", "deploy.md"])).unwrap();
        assert_eq!(
            command,
            Command::Serve(Config {
                workflow_path: Some("deploy.md".to_string()),
                verbose: true,
            })
        );
    }

    #[test]
    fn test_help_and_version() {
        assert_eq!(parse_arguments(&args(&["--help"])).unwrap(), Command::Help);
        assert_eq!(parse_arguments(&args(&["-V"])).unwrap(), Command::Version);
    }

    #[test]
    fn test_rejects_unknown_option_and_extra_file() {
        assert!(parse_arguments(&args(&["--dry-run"])).is_err());
        assert!(parse_arguments(&args(&["a.md", "b.md"])).is_err());
    }

    #[test]
    fn test_failed_preload_leaves_engine_empty() {
        let engine = build_engine(Some("/nonexistent/workflow.md"));
        assert!(!engine.state().is_loaded());
    }
}
