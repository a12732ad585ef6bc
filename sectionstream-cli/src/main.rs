//! SectionStream CLI - scenario runner and configuration tool.

use clap::{Parser, Subcommand};
use std::process;

use sectionstream::ConfigFile;

mod commands;
mod error;
mod scenario;

use commands::config::ConfigCommands;
use commands::scenario::ScenarioCommands;
use commands::simulate::SimulateArgs;

#[derive(Parser)]
#[command(
    name = "sectionstream",
    version,
    about = "Proximity-driven world section streaming"
)]
struct Cli {
    /// Tracing filter, e.g. `debug` or `sectionstream=trace`. Overrides
    /// RUST_LOG and the config file.
    #[arg(long, global = true, value_name = "FILTER")]
    log_filter: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scenario through the streaming pipeline
    Simulate(SimulateArgs),
    /// Inspect and generate scenario files
    Scenario {
        #[command(subcommand)]
        command: ScenarioCommands,
    },
    /// View and modify configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_filter.as_deref());

    let result = match cli.command {
        Commands::Simulate(args) => commands::simulate::run(args),
        Commands::Scenario { command } => commands::scenario::run(command),
        Commands::Config { command } => commands::config::run(command),
    };
    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(1);
    }
}

/// Install the tracing subscriber. Precedence: `--log-filter`, then
/// `RUST_LOG`, then the config file's `[logging] filter`.
fn init_logging(flag: Option<&str>) {
    match flag {
        Some(filter) => sectionstream::logging::init_with_filter(filter),
        None => {
            let file = ConfigFile::load().unwrap_or_default();
            sectionstream::logging::init_from_env(&file.logging.filter);
        }
    }
}
