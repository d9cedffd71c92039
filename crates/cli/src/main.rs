mod commands;
mod config;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use commands::evaluate::EvaluateArgs;
use commands::Context;

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// Government service navigator: which services apply to a life event.
#[derive(Parser)]
#[command(
    name = "civicnav",
    version,
    about = "Government service navigator: which services apply to a life event"
)]
struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    /// Path to a civicnav.toml config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a catalog and report every authoring defect
    Check {
        /// Path to the catalog JSON file
        catalog: Option<PathBuf>,
    },

    /// List the life events a catalog defines
    Events {
        /// Path to the catalog JSON file
        catalog: Option<PathBuf>,
    },

    /// Evaluate a life event against facts and service statuses
    Evaluate {
        /// Path to the catalog JSON file
        catalog: Option<PathBuf>,
        /// Life event ID
        #[arg(long)]
        event: Option<String>,
        /// Path to the facts JSON file
        #[arg(long)]
        facts: Option<PathBuf>,
        /// Path to the service statuses JSON file
        #[arg(long)]
        statuses: Option<PathBuf>,
        /// Evaluation date (YYYY-MM-DD); defaults to the current date
        #[arg(long)]
        today: Option<String>,
        /// Also list proactive services outside the life event
        #[arg(long)]
        suggest: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => match config::read_config(path) {
            Ok(c) => c,
            Err(e) => {
                report_error(&format!("error: {}", e), cli.output, cli.quiet);
                process::exit(1);
            }
        },
        None => config::Config::default(),
    };
    init_logging(config.log.as_deref());

    let ctx = Context {
        output: cli.output,
        quiet: cli.quiet,
        config,
    };

    match cli.command {
        Commands::Check { catalog } => {
            commands::check::cmd_check(&ctx, catalog.as_deref());
        }
        Commands::Events { catalog } => {
            commands::events::cmd_events(&ctx, catalog.as_deref());
        }
        Commands::Evaluate {
            catalog,
            event,
            facts,
            statuses,
            today,
            suggest,
        } => {
            commands::evaluate::cmd_evaluate(
                &ctx,
                EvaluateArgs {
                    catalog: catalog.as_deref(),
                    event: event.as_deref(),
                    facts: facts.as_deref(),
                    statuses: statuses.as_deref(),
                    today: today.as_deref(),
                    suggest,
                },
            );
        }
    }
}

/// Log to stderr. `CIVICNAV_LOG` wins over the config file; default `warn`.
fn init_logging(configured: Option<&str>) {
    let filter = EnvFilter::try_from_env("CIVICNAV_LOG")
        .unwrap_or_else(|_| EnvFilter::new(configured.unwrap_or("warn")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

pub(crate) fn report_error(msg: &str, output: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    match output {
        OutputFormat::Text => eprintln!("{}", msg),
        OutputFormat::Json => {
            eprintln!("{}", serde_json::json!({ "error": msg }));
        }
    }
}
