use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;
use std::fs;
use std::path::Path;

mod cli;

use cli::Cli;
use cli::commands::{Commands, CostCommands, SandboxCommands};
use loopguard::Governor;
use loopguard::config::GovernorConfig;
use loopguard::domain::LoopState;
use loopguard::exit_codes;

fn setup_logging(state_dir: &Path, level: Option<&str>) -> Result<()> {
    // Create log directory
    let log_dir = state_dir.join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("loopguard.log");

    // Setup env_logger with file output
    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level.unwrap_or("info")))
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

fn run_application(cli: &Cli, config: &GovernorConfig) -> Result<i32> {
    let governor = Governor::open(config).context("Failed to open governor state")?;

    if cli.is_verbose() {
        println!("{} {}", "State directory:".yellow(), config.state_dir.display());
        println!("{} {}", "Containment root:".yellow(), governor.sandbox().root().display());
    }

    match &cli.command {
        Commands::RecordIteration {
            tokens,
            file_changes,
            error,
        } => handle_record_iteration(&governor, *tokens, *file_changes, error.clone()),
        Commands::Reset => handle_reset(&governor),
        Commands::Status { json } => handle_status(&governor, *json),
        Commands::Check => handle_check(&governor),
        Commands::Notice => handle_notice(&governor),
        Commands::Cost { command } => handle_cost_command(&governor, command),
        Commands::Sandbox { command } => handle_sandbox_command(&governor, command),
    }
}

fn handle_record_iteration(governor: &Governor, tokens: i64, file_changes: i64, error: Option<String>) -> Result<i32> {
    info!(
        "Recording iteration: tokens={} file_changes={} error={:?}",
        tokens, file_changes, error
    );
    let outcome = governor.stuck().record(tokens, file_changes, error)?;
    let stuck = &outcome.state.stuck;

    if outcome.paused() {
        match &outcome.reason {
            Some(reason) => eprintln!("{} {}", "Loop paused:".red().bold(), reason),
            None => eprintln!("{} reset required before continuing", "Loop paused:".red().bold()),
        }
        return Ok(exit_codes::PAUSED);
    }

    println!(
        "{} iteration {} (no_progress={}, same_error={})",
        "Recorded:".green(),
        outcome.state.iteration,
        stuck.no_progress_count,
        stuck.same_error_repeats
    );
    Ok(exit_codes::OK)
}

fn handle_reset(governor: &Governor) -> Result<i32> {
    let state = governor.reset()?;
    if state.paused {
        eprintln!(
            "{} stuck counters cleared, spend ${:.2} still at or over ${:.2}; run `cost reset`",
            "Loop paused:".red().bold(),
            state.metrics.daily_cost,
            governor.cost().budget()
        );
        return Ok(exit_codes::PAUSED);
    }
    println!(
        "{} stuck counters cleared, loop unpaused (spend ${:.2} kept)",
        "Reset:".green(),
        state.metrics.daily_cost
    );
    Ok(exit_codes::OK)
}

fn print_state(state: &LoopState) {
    let paused = if state.paused { "yes".red().bold() } else { "no".green() };
    println!("{:<24}{}", "iteration:", state.iteration);
    println!("{:<24}{}", "no_progress_count:", state.stuck.no_progress_count);
    println!("{:<24}{}", "same_error_repeats:", state.stuck.same_error_repeats);
    println!(
        "{:<24}{}",
        "last_error_fingerprint:",
        state.stuck.last_error_fingerprint.as_deref().unwrap_or("-")
    );
    println!("{:<24}{:.4}", "daily_cost:", state.metrics.daily_cost);
    println!("{:<24}{}", "paused:", paused);
}

fn handle_status(governor: &Governor, json: bool) -> Result<i32> {
    let state = governor.status()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&state)?);
    } else {
        print_state(&state);
    }
    Ok(exit_codes::OK)
}

fn handle_check(governor: &Governor) -> Result<i32> {
    if governor.is_paused()? {
        eprintln!("{} see `loopguard notice`", "Loop paused:".red().bold());
        Ok(exit_codes::PAUSED)
    } else {
        println!("{}", "Loop may continue".green());
        Ok(exit_codes::OK)
    }
}

fn handle_notice(governor: &Governor) -> Result<i32> {
    match governor.notice()? {
        Some(text) => print!("{}", text),
        None => println!("{}", "No escalation notice".green()),
    }
    Ok(exit_codes::OK)
}

fn handle_cost_command(governor: &Governor, command: &CostCommands) -> Result<i32> {
    let cost = governor.cost();
    match command {
        CostCommands::Add { amount } => {
            info!("Adding cost: {}", amount);
            let outcome = cost.add(*amount)?;
            if outcome.paused {
                match &outcome.reason {
                    Some(reason) => eprintln!("{} {}", "Loop paused:".red().bold(), reason),
                    None => eprintln!(
                        "{} total ${:.2}, reset required before continuing",
                        "Loop paused:".red().bold(),
                        outcome.total
                    ),
                }
                return Ok(exit_codes::PAUSED);
            }
            println!("{} ${:.2} of ${:.2}", "Total:".green(), outcome.total, cost.budget());
        }
        CostCommands::Get => {
            let total = cost.get()?;
            println!(
                "{} ${:.2} of ${:.2} (${:.2} remaining)",
                "Total:".green(),
                total,
                cost.budget(),
                cost.remaining()?
            );
        }
        CostCommands::Reset => {
            cost.reset()?;
            println!("{} total zeroed, loop unpaused", "Cost reset:".green());
        }
    }
    Ok(exit_codes::OK)
}

fn handle_check_path(governor: &Governor, path: &Path) -> Result<i32> {
    match governor.sandbox().check_path(path) {
        Ok(resolved) => {
            println!("{} {}", "Allowed:".green(), resolved.display());
            Ok(exit_codes::OK)
        }
        Err(e) if e.is_denial() => {
            eprintln!("{} {}", "Denied:".red().bold(), e);
            Ok(exit_codes::DENIED)
        }
        Err(e) => Err(e.into()),
    }
}

fn handle_sandbox_command(governor: &Governor, command: &SandboxCommands) -> Result<i32> {
    match command {
        SandboxCommands::CheckPath { path } => handle_check_path(governor, path),
        SandboxCommands::ListViolations => {
            let events = governor.sandbox().list_violations()?;
            if events.is_empty() {
                println!("{}", "No violations recorded".green());
            }
            for event in events {
                println!(
                    "{} {} {} ({})",
                    event.timestamp.to_rfc3339(),
                    event.event_kind.yellow(),
                    event.path,
                    event.reason
                );
            }
            Ok(exit_codes::OK)
        }
    }
}

fn run(cli: &Cli) -> Result<i32> {
    // Load configuration
    let config = GovernorConfig::load(cli.config.as_ref()).context("Failed to load configuration")?;

    setup_logging(&config.state_dir, config.log_level.as_deref()).context("Failed to setup logging")?;
    info!("Starting with config from: {:?}", cli.config);

    run_application(cli, &config).context("Application failed")
}

fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    let code = match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            exit_codes::ERROR
        }
    };
    std::process::exit(code);
}
