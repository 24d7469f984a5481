//! # Thermolang Evaluation
//!
//! Expression evaluation, the rule interpreter and the async runtime for
//! thermolang programs.
//!
//! ## Overview
//!
//! - **Evaluator**: pure expression evaluation over an [`Environment`] and a
//!   [`Sensors`] facade
//! - **Interpreter**: runs passes over the rules of a [`Program`], suspending
//!   rule bodies at `WAIT`
//! - **Runtime**: drives an interpreter against a [`Clock`] until a pass limit
//!   or a stop request
//! - **Simulator**: a simulated room that implements every facade, used by the
//!   CLI and the tests
//!
//! ## Example
//!
//! ```rust,no_run
//! use thermolang_eval::{Config, Interpreter, Runtime, Simulator, stop_signal};
//! use thermolang_syntax::parse_source;
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let program = parse_source("RULE HUMIDITY GT 60 { SET MODE = DRY }")?;
//! let config = Config::default().with_max_passes(10);
//!
//! let sim = Simulator::new(&config.simulator);
//! let mut interpreter = Interpreter::new(&program, sim.device(), sim.sensors())
//!     .with_config(&config);
//! let mut runtime = Runtime::new(sim.clock(false)).with_config(&config);
//!
//! let (_handle, mut stop) = stop_signal();
//! let summary = runtime.run(&mut interpreter, &mut stop).await;
//! println!("{} passes, device {}", summary.passes, summary.state);
//! # Ok(())
//! # }
//! ```
//!
//! [`Program`]: thermolang_syntax::Program

mod binary_ops;
pub mod config;
mod control_flow;
mod environment;
pub mod error;
mod evaluator;
pub mod facade;
pub mod interpreter;
pub mod runtime;
pub mod simulator;
mod value;

pub use config::{Config, SimulatorConfig, TriggerMode};
pub use environment::Environment;
pub use error::{DeviceError, EvalError, RuntimeError, SensorError};
pub use evaluator::{Evaluator, evaluate};
pub use facade::{Command, Device, DeviceState, Sensors};
pub use interpreter::{Interpreter, PassReport, RuleFault, Step};
pub use runtime::{Clock, RunSummary, Runtime, StopHandle, StopToken, SystemClock, VirtualClock, stop_signal};
pub use simulator::{PlantSnapshot, SimClock, SimDevice, SimSensors, Simulator};
pub use value::Value;
