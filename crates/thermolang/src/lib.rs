//! # thermolang
//!
//! Facade over the thermolang crates: parse a script, then run it against a
//! device, either a real one behind the [`Device`]/[`Sensors`] traits or the
//! bundled [`Simulator`].
//!
//! ```rust,no_run
//! use thermolang::prelude::*;
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let program = thermolang::parse_file("living-room.thermo")?;
//! let config = Config::default().with_max_passes(60);
//! let outcome = thermolang::simulate(&program, &config).await?;
//! println!("{} after {} passes", outcome.plant.device, outcome.summary.passes);
//! # Ok(())
//! # }
//! ```

use anyhow::{Context, Result, ensure};
use std::fs;
use std::path::Path;

pub use thermolang_eval::{
    Clock, Command, Config, Device, DeviceState, Environment, Interpreter, PassReport, PlantSnapshot,
    RuleFault, RunSummary, Runtime, RuntimeError, Sensors, Simulator, SimulatorConfig, Step,
    StopHandle, StopToken, SystemClock, TriggerMode, Value, VirtualClock, stop_signal,
};
pub use thermolang_syntax::{Diagnostic, Program, Rule, SyntaxError, parse_source, print, tokenize};

pub mod prelude {
    pub use crate::{Config, Device, Interpreter, Runtime, Sensors, Simulator, stop_signal};
    pub use crate::{Program, parse_source, print};
}

/// Reads and parses the script at `path`. Syntax errors carry a rendered
/// source excerpt.
pub fn parse_file(path: impl AsRef<Path>) -> Result<Program> {
    let path = path.as_ref();
    let source = fs::read_to_string(path)
        .with_context(|| format!("Failed to read script {}", path.display()))?;
    parse_source(&source).map_err(|e| {
        anyhow::anyhow!("{}", Diagnostic::from_syntax(&source, &e).format_error())
            .context(format!("Failed to parse {}", path.display()))
    })
}

/// Parses `source` and prints it back in canonical form.
pub fn format_source(source: &str) -> Result<String, SyntaxError> {
    parse_source(source).map(|program| print(&program))
}

/// A finished simulated run.
#[derive(Debug, Clone)]
pub struct Simulation {
    pub summary: RunSummary,
    pub plant: PlantSnapshot,
}

/// Runs `program` against a fresh [`Simulator`] on virtual time.
///
/// `config.max_passes` must be set; virtual time never ends on its own.
pub async fn simulate(program: &Program, config: &Config) -> Result<Simulation> {
    ensure!(config.max_passes.is_some(), "simulate needs max_passes in the config");

    let simulator = Simulator::new(&config.simulator);
    let mut interpreter =
        Interpreter::new(program, simulator.device(), simulator.sensors()).with_config(config);
    let mut runtime = Runtime::new(simulator.clock(false)).with_config(config);

    let summary = runtime.run(&mut interpreter, &mut StopToken::never()).await;
    Ok(Simulation { summary, plant: simulator.snapshot() })
}
