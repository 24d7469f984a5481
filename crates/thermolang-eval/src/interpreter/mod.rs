//! Rule interpreter for thermolang programs.
//!
//! The interpreter never blocks. [`Interpreter::step`] runs until the next
//! `WAIT` or the end of the current pass and returns a [`Step`] describing
//! which. A suspended rule keeps its continuation (the rule cursor plus a
//! stack of [`Frame`]s) and the next call to `step` resumes it. The
//! [`Runtime`](crate::runtime::Runtime) owns the clock and decides when that
//! call happens.
//!
//! Submodules:
//! - [`statements`] – executes one unit of work from the frame stack

mod statements;

use crate::config::{Config, TriggerMode};
use crate::control_flow::{ExecutionResult, Frame};
use crate::environment::Environment;
use crate::error::RuntimeError;
use crate::evaluator::Evaluator;
use crate::facade::{Device, DeviceState, Sensors};
use smallvec::SmallVec;
use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;
use thermolang_syntax::ast::{Program, Trigger};
use tracing::{debug, warn};

/// What [`Interpreter::step`] stopped at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// A rule body reached `WAIT`; call `step` again once `Duration` has elapsed.
    Suspended(Duration),
    /// Every rule has been considered once.
    PassComplete(PassReport),
}

/// A rule body aborted by a runtime error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleFault {
    pub pass: u64,
    /// Index of the rule in declaration order.
    pub index: usize,
    /// Declared name or `#<index>`.
    pub rule: String,
    pub error: RuntimeError,
}

impl fmt::Display for RuleFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pass {}, rule {}: {}", self.pass, self.rule, self.error)
    }
}

/// Outcome of one completed pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassReport {
    /// 1-based pass number.
    pub pass: u64,
    /// Labels of the rules whose bodies started in this pass.
    pub fired: Vec<String>,
    pub faults: Vec<RuleFault>,
}

pub struct Interpreter<'p, D, S> {
    program: &'p Program,
    device: D,
    sensors: S,
    env: Environment,
    state: DeviceState,
    trigger_mode: TriggerMode,
    max_steps: Option<u64>,
    fault_history: usize,
    faults: VecDeque<RuleFault>,
    frames: SmallVec<[Frame<'p>; 8]>,
    /// Next rule to consider in this pass.
    cursor: usize,
    /// Rule that owns the frames on the stack.
    current: usize,
    /// Last observed condition per rule, for edge triggering.
    edges: Vec<bool>,
    /// Statements and loop iterations since the last suspension.
    steps: u64,
    report: PassReport,
}

impl<'p, D: Device, S: Sensors> Interpreter<'p, D, S> {
    pub fn new(program: &'p Program, device: D, sensors: S) -> Self {
        let defaults = Config::default();
        Self {
            program,
            device,
            sensors,
            env: Environment::new(),
            state: DeviceState::default(),
            trigger_mode: defaults.trigger_mode,
            max_steps: defaults.max_steps_per_pass,
            fault_history: defaults.fault_history,
            faults: VecDeque::new(),
            frames: SmallVec::new(),
            cursor: 0,
            current: 0,
            edges: vec![false; program.rules.len()],
            steps: 0,
            report: PassReport { pass: 1, ..PassReport::default() },
        }
    }

    /// Builder: applies trigger mode, step limit and fault history from `config`.
    pub fn with_config(mut self, config: &Config) -> Self {
        self.trigger_mode = config.trigger_mode;
        self.max_steps = config.max_steps_per_pass;
        self.fault_history = config.fault_history;
        self
    }

    pub fn with_trigger_mode(mut self, mode: TriggerMode) -> Self {
        self.trigger_mode = mode;
        self
    }

    pub fn with_max_steps(mut self, limit: u64) -> Self {
        self.max_steps = Some(limit);
        self
    }

    /// Builder: seeds the device mirror, e.g. with the plant's actual state.
    pub fn with_state(mut self, state: DeviceState) -> Self {
        self.state = state;
        self
    }

    /// Runs until the next `WAIT` or the end of the current pass.
    ///
    /// A rule that loops forever without reaching `WAIT` keeps this call
    /// from returning unless a step limit is configured.
    pub fn step(&mut self) -> Step {
        loop {
            if self.frames.is_empty() {
                if self.cursor >= self.program.rules.len() {
                    return Step::PassComplete(self.finish_pass());
                }
                let index = self.cursor;
                self.cursor += 1;
                self.start_rule(index);
                continue;
            }

            match self.advance() {
                Ok(ExecutionResult::Continue) => {}
                Ok(ExecutionResult::Suspend(duration)) => {
                    self.steps = 0;
                    return Step::Suspended(duration);
                }
                Err(error) => self.fault(error),
            }
        }
    }

    /// Evaluates the trigger of rule `index` and pushes its body if it fires.
    fn start_rule(&mut self, index: usize) {
        let program = self.program;
        let rule = &program.rules[index];
        self.current = index;

        let condition = match &rule.trigger {
            Trigger::Always => true,
            Trigger::When(condition) => {
                match Evaluator::new(&self.env, &mut self.sensors).evaluate_condition(condition) {
                    Ok(value) => value,
                    Err(error) => {
                        self.fault(error.into());
                        return;
                    }
                }
            }
        };

        let fire = match self.trigger_mode {
            TriggerMode::Level => condition,
            TriggerMode::Edge => {
                let previous = std::mem::replace(&mut self.edges[index], condition);
                condition && !previous
            }
        };

        if fire {
            let label = rule.label(index);
            debug!(rule = %label, pass = self.report.pass, "rule fired");
            self.report.fired.push(label);
            self.steps = 0;
            self.frames.push(Frame::block(&rule.body));
        }
    }

    fn finish_pass(&mut self) -> PassReport {
        let next = PassReport { pass: self.report.pass + 1, ..PassReport::default() };
        let report = std::mem::replace(&mut self.report, next);
        self.cursor = 0;
        debug!(
            pass = report.pass,
            fired = report.fired.len(),
            faults = report.faults.len(),
            "pass complete"
        );
        report
    }

    /// Aborts the current rule for this pass and records why.
    fn fault(&mut self, error: RuntimeError) {
        let index = self.current;
        let rule = self.program.rules[index].label(index);
        warn!(rule = %rule, pass = self.report.pass, error = %error, "rule aborted");

        self.frames.clear();
        let fault = RuleFault { pass: self.report.pass, index, rule, error };
        self.report.faults.push(fault.clone());

        if self.fault_history > 0 {
            if self.faults.len() == self.fault_history {
                self.faults.pop_front();
            }
            self.faults.push_back(fault);
        }
    }

    /// `true` while a rule body is waiting to be resumed.
    pub fn is_suspended(&self) -> bool {
        !self.frames.is_empty()
    }

    /// Number of the pass in progress (1-based).
    pub fn pass(&self) -> u64 {
        self.report.pass
    }

    pub fn state(&self) -> &DeviceState {
        &self.state
    }

    pub fn environment(&self) -> &Environment {
        &self.env
    }

    /// Most recent faults, oldest first.
    pub fn faults(&self) -> impl Iterator<Item = &RuleFault> {
        self.faults.iter()
    }

    pub fn program(&self) -> &'p Program {
        self.program
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    pub fn sensors(&self) -> &S {
        &self.sensors
    }

    pub fn sensors_mut(&mut self) -> &mut S {
        &mut self.sensors
    }

    pub fn into_parts(self) -> (D, S, DeviceState) {
        (self.device, self.sensors, self.state)
    }
}
