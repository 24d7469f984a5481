//! # thermolang-cli
//!
//! Command-line interface for thermolang.
//!
//! `run` executes a script against the simulated room, `check` only lexes and
//! parses it, and `fmt` prints it back in canonical form.

mod errors;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::*;
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use thermolang::{
    Config, Interpreter, PassReport, PlantSnapshot, Program, RunSummary, Runtime, Simulator,
    TriggerMode, format_source, parse_source, stop_signal,
};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use errors::{rule_fault, syntax_error};

#[derive(Parser)]
#[command(name = "thermolang")]
#[command(about = "Rule language for air-conditioner automation", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log rule activity to stderr (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a script against the simulated room
    Run(RunArgs),
    /// Check a script for syntax errors
    Check {
        script: PathBuf,
    },
    /// Print a script in canonical form
    Fmt {
        script: PathBuf,
        /// Rewrite the file in place
        #[arg(short, long, conflicts_with = "check")]
        write: bool,
        /// Exit with an error if the file is not already formatted
        #[arg(long)]
        check: bool,
    },
}

#[derive(Args, Debug, Default)]
struct RunArgs {
    script: PathBuf,
    /// Number of passes to run
    #[arg(short, long)]
    passes: Option<u64>,
    /// Initial relative humidity in percent
    #[arg(long, value_parser = clap::value_parser!(i64).range(0..=100))]
    humidity: Option<i64>,
    /// Start with the room occupied
    #[arg(long)]
    occupied: bool,
    /// Initial time of day as HH:MM
    #[arg(long, value_parser = parse_clock)]
    time: Option<i64>,
    /// Initial room temperature in degrees Celsius
    #[arg(long)]
    temperature: Option<i64>,
    /// Sleep for real between passes and during WAIT
    #[arg(long)]
    realtime: bool,
    /// Print the run as JSON
    #[arg(long)]
    json: bool,
    /// Fire rules only when their condition turns true
    #[arg(long)]
    edge: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Run(args) => run(args),
        Commands::Check { script } => check(&script),
        Commands::Fmt { script, write, check } => fmt(&script, write, check),
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("{} {:#}", "error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "thermolang_eval=debug,warn" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Parses `HH:MM` into seconds since midnight.
fn parse_clock(s: &str) -> Result<i64, String> {
    let (hours, minutes) = s.split_once(':').ok_or_else(|| format!("expected HH:MM, got '{}'", s))?;
    let hours: i64 = hours.parse().map_err(|_| format!("invalid hour '{}'", hours))?;
    let minutes: i64 = minutes.parse().map_err(|_| format!("invalid minute '{}'", minutes))?;
    if !(0..24).contains(&hours) || !(0..60).contains(&minutes) {
        return Err(format!("time '{}' out of range", s));
    }
    Ok(hours * 3600 + minutes * 60)
}

fn read_script(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read script {}", path.display()))
}

/// Parses `source`, printing a diagnostic on failure.
fn load_program(path: &Path, source: &str) -> Option<Program> {
    match parse_source(source) {
        Ok(program) => Some(program),
        Err(e) => {
            syntax_error(&e, &path.display().to_string(), source).display();
            None
        }
    }
}

/// Merges `.thermorc` settings with command-line overrides.
fn build_config(base: Config, args: &RunArgs) -> Result<Config> {
    let mut config = base;
    if let Some(humidity) = args.humidity {
        config.simulator.humidity = humidity;
    }
    if args.occupied {
        config.simulator.occupied = 1;
    }
    if let Some(time) = args.time {
        config.simulator.time = time;
    }
    if let Some(temperature) = args.temperature {
        config.simulator.temperature = temperature;
    }
    if args.edge {
        config.trigger_mode = TriggerMode::Edge;
    }
    config.max_passes = match (args.passes, config.max_passes) {
        (Some(passes), _) => Some(passes),
        (None, Some(passes)) => Some(passes),
        // Virtual time never ends on its own.
        (None, None) if !args.realtime => Some(1),
        (None, None) => None,
    };
    config.simulator.validate().context("Invalid starting readings")?;
    Ok(config)
}

fn run(args: RunArgs) -> Result<bool> {
    let source = read_script(&args.script)?;
    let Some(program) = load_program(&args.script, &source) else {
        return Ok(false);
    };

    let base = Config::load(".").unwrap_or_else(|e| {
        warn!(error = %format!("{:#}", e), "ignoring unreadable config");
        Config::default()
    });
    let config = build_config(base, &args)?;
    debug!(?config, "configuration resolved");

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;
    let (summary, reports, plant) = runtime.block_on(simulate(&program, &config, &args));

    let file = args.script.display().to_string();
    if args.json {
        print_json(&summary, &reports, &plant)?;
    } else {
        for fault in &summary.faults {
            rule_fault(fault, &file, &source).display_warning();
        }
        print_summary(&summary, &plant);
    }

    Ok(true)
}

async fn simulate(
    program: &Program,
    config: &Config,
    args: &RunArgs,
) -> (RunSummary, Vec<PassReport>, PlantSnapshot) {
    let simulator = Simulator::new(&config.simulator);
    let mut interpreter =
        Interpreter::new(program, simulator.device(), simulator.sensors()).with_config(config);
    let mut runtime = Runtime::new(simulator.clock(args.realtime)).with_config(config);

    let (handle, mut stop) = stop_signal();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            handle.stop();
        }
    });

    let mut reports = Vec::new();
    let summary = runtime
        .run_with(&mut interpreter, &mut stop, |report| {
            if !args.json {
                print_pass(report, &simulator.snapshot());
            }
            reports.push(report.clone());
        })
        .await;

    (summary, reports, simulator.snapshot())
}

fn print_pass(report: &PassReport, plant: &PlantSnapshot) {
    let fired = if report.fired.is_empty() {
        "-".dimmed().to_string()
    } else {
        report.fired.join(", ")
    };
    let faults = if report.faults.is_empty() {
        String::new()
    } else {
        format!(" ({} faulted)", report.faults.len()).yellow().to_string()
    };
    println!(
        "{} {:>4}  {:>5.1}°C {:>3}%  {}  fired: {}{}",
        "pass".cyan(),
        report.pass,
        plant.temperature,
        plant.humidity,
        format_clock(plant.time).dimmed(),
        fired,
        faults
    );
}

fn print_summary(summary: &RunSummary, plant: &PlantSnapshot) {
    println!();
    let status = if summary.stopped { "Stopped".yellow().bold() } else { "Finished".green().bold() };
    println!(
        "{} {}",
        status,
        format!("{} passes, {:.1}s simulated", summary.passes, summary.elapsed.as_secs_f64()).dimmed()
    );
    println!("  {} {}", "device:".bold(), summary.state);
    println!(
        "  {} {:.1}°C, {}% humidity, {}, {}",
        "room:".bold(),
        plant.temperature,
        plant.humidity,
        if plant.occupied == 1 { "occupied" } else { "empty" },
        format_clock(plant.time)
    );
    if !summary.faults.is_empty() {
        println!("  {} {}", "faults:".yellow().bold(), summary.faults.len());
    }
}

fn print_json(summary: &RunSummary, reports: &[PassReport], plant: &PlantSnapshot) -> Result<()> {
    let passes_json: Vec<_> = reports
        .iter()
        .map(|report| {
            json!({
                "pass": report.pass,
                "fired": report.fired,
                "faults": report.faults.iter().map(|f| f.to_string()).collect::<Vec<_>>(),
            })
        })
        .collect();

    let state = &summary.state;
    let output = json!({
        "passes": summary.passes,
        "stopped": summary.stopped,
        "elapsed_ms": summary.elapsed.as_millis() as u64,
        "device": {
            "power": state.power.to_string(),
            "mode": state.mode.to_string(),
            "setpoint": state.setpoint,
            "fan": state.fan.to_string(),
            "swing": state.swing.to_string(),
        },
        "room": {
            "temperature": plant.temperature,
            "humidity": plant.humidity,
            "occupied": plant.occupied == 1,
            "time": format_clock(plant.time),
        },
        "faults": summary.faults.iter().map(|f| f.to_string()).collect::<Vec<_>>(),
        "reports": passes_json,
    });

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn format_clock(seconds: i64) -> String {
    format!("{:02}:{:02}", seconds / 3600, (seconds % 3600) / 60)
}

fn check(path: &Path) -> Result<bool> {
    let source = read_script(path)?;
    let Some(program) = load_program(path, &source) else {
        return Ok(false);
    };

    let named = program.rules.iter().filter(|r| !r.is_implicit()).count();
    println!(
        "{} {} {}",
        "ok".green().bold(),
        path.display(),
        format!("({} rules, {} explicit)", program.len(), named).dimmed()
    );
    Ok(true)
}

fn fmt(path: &Path, write: bool, check: bool) -> Result<bool> {
    let source = read_script(path)?;
    let formatted = match format_source(&source) {
        Ok(formatted) => formatted,
        Err(e) => {
            syntax_error(&e, &path.display().to_string(), &source).display();
            return Ok(false);
        }
    };

    if check {
        if formatted == source {
            return Ok(true);
        }
        eprintln!("{} {} is not formatted", "✗".red().bold(), path.display());
        return Ok(false);
    }

    if write {
        if formatted != source {
            fs::write(path, &formatted).with_context(|| format!("Failed to write {}", path.display()))?;
            println!("{} Formatted {}", "✓".green().bold(), path.display());
        }
    } else {
        print!("{}", formatted);
    }
    Ok(true)
}
