//! Scenario inspection CLI commands.

use clap::Subcommand;

use crate::error::CliError;
use crate::scenario::Scenario;

/// Scenario subcommands.
#[derive(Debug, Subcommand)]
pub enum ScenarioCommands {
    /// Print the builtin sample scenario as JSON, ready to edit
    Sample,
}

/// Run a scenario subcommand.
pub fn run(command: ScenarioCommands) -> Result<(), CliError> {
    match command {
        ScenarioCommands::Sample => run_sample(),
    }
}

/// Print the builtin sample scenario.
fn run_sample() -> Result<(), CliError> {
    let json = serde_json::to_string_pretty(&Scenario::sample())
        .map_err(|e| CliError::Scenario(format!("cannot serialize sample scenario: {}", e)))?;
    println!("{}", json);
    Ok(())
}
