//! Simulate command - run a scenario through the streaming pipeline.

use std::path::PathBuf;

use clap::Args;
use tracing::info;

use sectionstream::{ConfigFile, SectionCoordinator, Tick, TickReport};

use crate::error::CliError;
use crate::scenario::Scenario;

/// Wall-clock seconds per tick, fixed at sixty ticks per second.
const STEP_SECONDS: f32 = 1.0 / 60.0;

/// Arguments for the simulate command.
#[derive(Debug, Args)]
pub struct SimulateArgs {
    /// Scenario JSON file. Runs the builtin sample when omitted.
    #[arg(long, value_name = "FILE")]
    pub scenario: Option<PathBuf>,

    /// Override the scenario's tick count.
    #[arg(long)]
    pub ticks: Option<u64>,

    /// Print the final statistics snapshot as JSON after the summary.
    #[arg(long)]
    pub json: bool,
}

/// Run the simulate command.
pub fn run(args: SimulateArgs) -> Result<(), CliError> {
    let scenario = match &args.scenario {
        Some(path) => Scenario::load(path)?,
        None => Scenario::sample(),
    };

    // Resolve budgets: scenario override > config file > defaults
    let file = ConfigFile::load().unwrap_or_default();
    let config = scenario.streaming.unwrap_or(file.streaming);
    let loader = scenario.loader.build();
    let ticks = args.ticks.unwrap_or_else(|| scenario.tick_count());

    info!(scenario = %scenario.name, ticks, "Starting scenario run");

    // Print banner
    println!("SectionStream Scenario Runner v{}", sectionstream::VERSION);
    println!("=================================");
    println!();
    println!("Scenario: {}", scenario.name);
    println!("Sections: {}", scenario.sections.len());
    println!("Foci:     {}", scenario.foci.len());
    println!("Ticks:    {}", ticks);
    println!(
        "Budgets:  {} concurrent, {} loads/tick, {} unloads/tick, {} tick cooldown",
        config.max_concurrent_loads,
        config.max_loads_per_tick,
        config.max_unloads_per_tick,
        config.cooldown_ticks
    );
    println!();

    let mut coordinator = SectionCoordinator::new(config, loader)?;
    for section in &scenario.sections {
        coordinator.register_section(section.descriptor());
    }

    let mut last = None;
    for tick in 1..=ticks {
        let samples = scenario.samples_at(tick);
        let report = coordinator.advance(Tick(tick), STEP_SECONDS, &samples);
        // Scripted time moves after the pipeline ran, like a host engine
        // stepping its loader between frames.
        coordinator.loader_mut().advance();

        if tick_had_activity(&report) {
            print_activity(&report, scenario.sections.len());
        }
        last = Some(report);
    }

    let Some(report) = last else {
        return Err(CliError::Simulation(
            "scenario ran zero ticks; nothing to report".to_string(),
        ));
    };

    print_summary(&report, ticks, scenario.sections.len());

    if args.json {
        let json = serde_json::to_string_pretty(&report.stats)
            .map_err(|e| CliError::Simulation(format!("cannot serialize statistics: {}", e)))?;
        println!();
        println!("{}", json);
    }

    Ok(())
}

/// Whether this tick did anything worth a console line.
fn tick_had_activity(report: &TickReport) -> bool {
    report.exec.loads_issued > 0
        || report.exec.unloads_issued > 0
        || report.exec.load_failures > 0
        || report.sync.load_completions > 0
        || report.sync.unload_completions > 0
        || report.sync.failures > 0
}

/// Print one activity line for a tick that issued or resolved work.
fn print_activity(report: &TickReport, total_sections: usize) {
    let failures = report.exec.load_failures + report.sync.failures;
    println!(
        "[tick {:>4}] loads: {} issued, {} completed | unloads: {} issued, {} completed | failures: {} | resident: {}/{}",
        report.tick.0,
        report.exec.loads_issued,
        report.sync.load_completions,
        report.exec.unloads_issued,
        report.sync.unload_completions,
        failures,
        report.stats.counts.loaded,
        total_sections,
    );
}

/// Print the final session summary.
fn print_summary(report: &TickReport, ticks: u64, total_sections: usize) {
    let stats = &report.stats;
    println!();
    println!("Session Summary");
    println!("───────────────");
    println!("  Ticks run:      {}", ticks);
    println!(
        "  Loads issued:   {} ({} failed)",
        stats.total_loads_issued, stats.total_load_failures
    );
    println!("  Unloads issued: {}", stats.total_unloads_issued);
    match stats.first_load_tick {
        Some(tick) => println!("  First load:     tick {}", tick),
        None => println!("  First load:     never"),
    }
    match stats.first_unload_tick {
        Some(tick) => println!("  First unload:   tick {}", tick),
        None => println!("  First unload:   never"),
    }
    println!("  Peak backlog:   {} commands", stats.peak_pending_commands);
    println!(
        "  Final resident: {} of {} sections",
        stats.counts.loaded, total_sections
    );
    if stats.counts.error > 0 {
        println!("  In error:       {}", stats.counts.error);
    }
}
