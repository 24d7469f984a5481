//! Drives an [`Interpreter`] against a clock.
//!
//! The interpreter hands back control at every `WAIT` and at the end of
//! every pass. The [`Runtime`] lets the requested time elapse on its
//! [`Clock`], checks the stop signal, and resumes the interpreter. Two
//! clocks ship with the crate: [`SystemClock`] sleeps on the tokio timer,
//! [`VirtualClock`] advances instantly.

use crate::config::Config;
use crate::facade::{Device, DeviceState, Sensors};
use crate::interpreter::{Interpreter, PassReport, RuleFault, Step};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{info, trace};

/// Source of elapsed time for the runtime.
#[allow(async_fn_in_trait)]
pub trait Clock {
    /// Time elapsed on this clock since it was created.
    fn now(&self) -> Duration;

    /// Lets `duration` elapse.
    async fn sleep(&mut self, duration: Duration);
}

/// Wall-clock time via `tokio::time`.
#[derive(Debug, Clone)]
pub struct SystemClock {
    start: tokio::time::Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self { start: tokio::time::Instant::now() }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.start.elapsed()
    }

    async fn sleep(&mut self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Simulated time that jumps forward on every sleep.
#[derive(Debug, Clone, Default)]
pub struct VirtualClock {
    elapsed: Duration,
}

impl VirtualClock {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Clock for VirtualClock {
    fn now(&self) -> Duration {
        self.elapsed
    }

    async fn sleep(&mut self, duration: Duration) {
        self.elapsed = self.elapsed.saturating_add(duration);
        tokio::task::yield_now().await;
    }
}

/// Requests a stop; cheap to clone and share with signal handlers.
#[derive(Debug, Clone)]
pub struct StopHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl StopHandle {
    pub fn stop(&self) {
        self.tx.send_replace(true);
    }
}

/// Observes stop requests.
#[derive(Debug, Clone)]
pub struct StopToken {
    rx: watch::Receiver<bool>,
}

impl StopToken {
    /// A token that never fires.
    pub fn never() -> Self {
        let (_, token) = stop_signal();
        token
    }

    pub fn is_stopped(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once a stop has been requested. Pends forever if every
    /// handle has been dropped without stopping.
    pub async fn stopped(&mut self) {
        if self.rx.wait_for(|stopped| *stopped).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

pub fn stop_signal() -> (StopHandle, StopToken) {
    let (tx, rx) = watch::channel(false);
    (StopHandle { tx: Arc::new(tx) }, StopToken { rx })
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Completed passes.
    pub passes: u64,
    /// Device mirror at the end of the run.
    pub state: DeviceState,
    /// Retained rule faults, oldest first.
    pub faults: Vec<RuleFault>,
    /// `true` if the run ended on a stop request rather than a pass limit.
    pub stopped: bool,
    /// Clock time consumed by the run.
    pub elapsed: Duration,
}

pub struct Runtime<C> {
    clock: C,
    pass_interval: Duration,
    max_passes: Option<u64>,
}

impl<C: Clock> Runtime<C> {
    pub fn new(clock: C) -> Self {
        let defaults = Config::default();
        Self {
            clock,
            pass_interval: defaults.pass_interval,
            max_passes: defaults.max_passes,
        }
    }

    /// Builder: takes pass interval and pass limit from `config`.
    pub fn with_config(mut self, config: &Config) -> Self {
        self.pass_interval = config.pass_interval;
        self.max_passes = config.max_passes;
        self
    }

    pub fn with_pass_interval(mut self, interval: Duration) -> Self {
        self.pass_interval = interval;
        self
    }

    pub fn with_max_passes(mut self, passes: u64) -> Self {
        self.max_passes = Some(passes);
        self
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    /// Runs passes until the pass limit is reached or `stop` fires.
    pub async fn run<D: Device, S: Sensors>(
        &mut self,
        interpreter: &mut Interpreter<'_, D, S>,
        stop: &mut StopToken,
    ) -> RunSummary {
        self.run_with(interpreter, stop, |_| {}).await
    }

    /// Like [`run`](Self::run), calling `on_pass` after every completed pass.
    pub async fn run_with<D: Device, S: Sensors>(
        &mut self,
        interpreter: &mut Interpreter<'_, D, S>,
        stop: &mut StopToken,
        mut on_pass: impl FnMut(&PassReport),
    ) -> RunSummary {
        let started = self.clock.now();
        let mut passes = 0;
        let mut stopped = false;

        while self.max_passes.is_none_or(|max| passes < max) {
            if stop.is_stopped() {
                stopped = true;
                break;
            }

            let pause = match interpreter.step() {
                Step::Suspended(duration) => {
                    trace!(?duration, "rule suspended");
                    duration
                }
                Step::PassComplete(report) => {
                    passes += 1;
                    on_pass(&report);
                    if self.max_passes.is_some_and(|max| passes >= max) {
                        break;
                    }
                    self.pass_interval
                }
            };

            if !self.pause(pause, stop).await {
                stopped = true;
                break;
            }
        }

        let elapsed = self.clock.now().saturating_sub(started);
        info!(passes, stopped, ?elapsed, "run finished");

        RunSummary {
            passes,
            state: *interpreter.state(),
            faults: interpreter.faults().cloned().collect(),
            stopped,
            elapsed,
        }
    }

    /// Sleeps on the clock unless a stop arrives first. Returns `false` on stop.
    async fn pause(&mut self, duration: Duration, stop: &mut StopToken) -> bool {
        tokio::select! {
            biased;
            _ = stop.stopped() => false,
            _ = self.clock.sleep(duration) => true,
        }
    }
}
