//! Runtime configuration for the thermolang interpreter.
//!
//! [`Config`] controls pass pacing, loop guards, rule triggering and the
//! simulator's starting readings. Use [`Config::default()`] for the stock
//! behaviour (1 s between passes, level triggering, no limits).
//!
//! # Config file: `.thermorc`
//!
//! TOML files in two places:
//!
//! - **Global**: `~/.thermorc` applies everywhere
//! - **Local**: the nearest `.thermorc` found walking up from the working
//!   directory; overrides global keys
//!
//! ```toml
//! pass_interval_ms = 500
//! max_passes = 100
//! max_steps_per_pass = 10000
//! trigger_mode = "edge"     # or "level"
//! fault_history = 32
//!
//! [simulator]
//! temperature = 29
//! humidity = 70
//! occupied = 1
//! time = 64800
//! ```
//!
//! All keys are optional.

use crate::facade::valid_range;
use anyhow::{Context, Result, ensure};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thermolang_syntax::ast::Sensor;

const FILE_NAME: &str = ".thermorc";

/// When a rule body runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerMode {
    /// Every pass in which the condition is true.
    #[default]
    Level,
    /// Only on a false to true transition of the condition.
    Edge,
}

/// TOML-friendly intermediate representation (all fields optional).
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    pass_interval_ms: Option<u64>,
    max_passes: Option<u64>,
    max_steps_per_pass: Option<u64>,
    trigger_mode: Option<TriggerMode>,
    fault_history: Option<usize>,
    simulator: Option<SimulatorFile>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct SimulatorFile {
    temperature: Option<i64>,
    humidity: Option<i64>,
    occupied: Option<i64>,
    time: Option<i64>,
}

/// Initial plant readings for the simulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulatorConfig {
    /// Room temperature in degrees Celsius.
    pub temperature: i64,
    /// Relative humidity in percent.
    pub humidity: i64,
    /// 0 = empty, 1 = occupied.
    pub occupied: i64,
    /// Seconds since midnight.
    pub time: i64,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            temperature: 25,
            humidity: 60,
            occupied: 0,
            time: 12 * 3600,
        }
    }
}

impl SimulatorConfig {
    /// Fails if a starting reading lies outside what its sensor may report.
    pub fn validate(&self) -> Result<()> {
        let readings = [
            ("temperature", Sensor::Temperature, self.temperature),
            ("humidity", Sensor::Humidity, self.humidity),
            ("occupied", Sensor::Occupied, self.occupied),
            ("time", Sensor::Time, self.time),
        ];
        for (key, sensor, value) in readings {
            let range = valid_range(sensor);
            ensure!(
                range.contains(&value),
                "simulator {} = {} is outside {}..={}",
                key,
                value,
                range.start(),
                range.end()
            );
        }
        Ok(())
    }
}

/// Runtime configuration for the interpreter and runtime.
///
/// # Defaults
///
/// | Setting | Default |
/// |---------|---------|
/// | `pass_interval` | 1 s |
/// | `max_passes` | `None` (run until stopped) |
/// | `max_steps_per_pass` | `None` (no guard) |
/// | `trigger_mode` | `Level` |
/// | `fault_history` | 64 |
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Pause between two passes.
    pub pass_interval: Duration,
    /// Stop after this many completed passes.
    pub max_passes: Option<u64>,
    /// Abort a rule after this many statements and loop iterations without
    /// reaching a `WAIT`.
    pub max_steps_per_pass: Option<u64>,
    pub trigger_mode: TriggerMode,
    /// Number of rule faults retained for the run summary.
    pub fault_history: usize,
    pub simulator: SimulatorConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pass_interval: Duration::from_millis(1000),
            max_passes: None,
            max_steps_per_pass: None,
            trigger_mode: TriggerMode::Level,
            fault_history: 64,
            simulator: SimulatorConfig::default(),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration by merging global and local `.thermorc` files.
    ///
    /// 1. Loads `~/.thermorc` (global) if it exists
    /// 2. Searches for `.thermorc` starting from `start_dir` and walking up
    /// 3. Local values override global values
    ///
    /// Returns `Config::default()` if no config files are found.
    pub fn load(start_dir: impl AsRef<Path>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(global_path) = Self::find_global_config() {
            config.merge(Self::read_file(&global_path)?);
        }

        if let Some(local_path) = Self::find_local_config(start_dir) {
            config.merge(Self::read_file(&local_path)?);
        }

        config.simulator.validate().context("Invalid [simulator] settings")?;
        Ok(config)
    }

    /// Loads configuration from a specific file on top of the defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let mut config = Self::default();
        config.merge(Self::read_file(path)?);
        config
            .simulator
            .validate()
            .with_context(|| format!("Invalid [simulator] settings in {}", path.display()))?;
        Ok(config)
    }

    /// Parses configuration from a TOML string.
    pub fn from_str(toml_str: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(toml_str).context("Failed to parse config")?;
        let mut config = Self::default();
        config.merge(file);
        config.simulator.validate().context("Invalid [simulator] settings")?;
        Ok(config)
    }

    fn read_file(path: &Path) -> Result<ConfigFile> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Overwrites every key present in `file`.
    fn merge(&mut self, file: ConfigFile) {
        if let Some(ms) = file.pass_interval_ms {
            self.pass_interval = Duration::from_millis(ms);
        }
        if file.max_passes.is_some() {
            self.max_passes = file.max_passes;
        }
        if file.max_steps_per_pass.is_some() {
            self.max_steps_per_pass = file.max_steps_per_pass;
        }
        if let Some(mode) = file.trigger_mode {
            self.trigger_mode = mode;
        }
        if let Some(n) = file.fault_history {
            self.fault_history = n;
        }
        if let Some(sim) = file.simulator {
            let s = &mut self.simulator;
            s.temperature = sim.temperature.unwrap_or(s.temperature);
            s.humidity = sim.humidity.unwrap_or(s.humidity);
            s.occupied = sim.occupied.unwrap_or(s.occupied);
            s.time = sim.time.unwrap_or(s.time);
        }
    }

    fn find_global_config() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(FILE_NAME)).filter(|p| p.is_file())
    }

    /// Walks up from `start_dir` looking for `.thermorc`.
    fn find_local_config(start_dir: impl AsRef<Path>) -> Option<PathBuf> {
        let mut dir = start_dir.as_ref().to_path_buf();

        if let Ok(abs) = dir.canonicalize() {
            dir = abs;
        }

        loop {
            let rc_file = dir.join(FILE_NAME);
            if rc_file.is_file() {
                return Some(rc_file);
            }

            if !dir.pop() {
                return None;
            }
        }
    }

    pub fn with_pass_interval(mut self, interval: Duration) -> Self {
        self.pass_interval = interval;
        self
    }

    pub fn with_max_passes(mut self, passes: u64) -> Self {
        self.max_passes = Some(passes);
        self
    }

    pub fn with_max_steps_per_pass(mut self, steps: u64) -> Self {
        self.max_steps_per_pass = Some(steps);
        self
    }

    pub fn with_trigger_mode(mut self, mode: TriggerMode) -> Self {
        self.trigger_mode = mode;
        self
    }

    pub fn with_fault_history(mut self, n: usize) -> Self {
        self.fault_history = n;
        self
    }

    pub fn with_simulator(mut self, simulator: SimulatorConfig) -> Self {
        self.simulator = simulator;
        self
    }
}
