//! A simulated room with an air conditioner.
//!
//! [`Simulator`] owns the plant state behind a shared lock and hands out
//! three views of it: [`SimDevice`] and [`SimSensors`] for the interpreter
//! facades and [`SimClock`] for the runtime. Letting time pass on the clock
//! runs the thermal model once per simulated second.

use crate::config::SimulatorConfig;
use crate::error::{DeviceError, SensorError};
use crate::facade::{Command, Device, DeviceState, SECONDS_PER_DAY, Sensors};
use crate::runtime::Clock;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use thermolang_syntax::ast::{Mode, Power, Sensor};
use tracing::{debug, trace};

const AMBIENT: f64 = 25.0;
const MIN_TEMPERATURE: f64 = 0.0;
const MAX_TEMPERATURE: f64 = 50.0;
/// Humidity floor for DRY mode.
const DRY_TARGET: i64 = 40;
/// Thermal ticks run per advance. The model settles well within a day, so
/// longer advances only move the time of day.
const MAX_TICKS: u64 = SECONDS_PER_DAY as u64;

#[derive(Debug)]
struct Plant {
    temperature: f64,
    humidity: i64,
    occupied: i64,
    time: i64,
    device: DeviceState,
    /// Sub-second time not yet turned into a tick.
    carry: Duration,
    commands: u64,
}

impl Plant {
    fn advance(&mut self, duration: Duration) {
        let total = self.carry.saturating_add(duration);
        let ticks = total.as_secs();
        self.carry = total - Duration::from_secs(ticks);

        let simulated = ticks.min(MAX_TICKS);
        for _ in 0..simulated {
            self.tick();
        }
        let skipped = ((ticks - simulated) % MAX_TICKS) as i64;
        self.time = (self.time + skipped).rem_euclid(SECONDS_PER_DAY);
        if ticks > 0 {
            trace!(ticks, temperature = self.temperature, humidity = self.humidity, "plant advanced");
        }
    }

    fn tick(&mut self) {
        self.time = (self.time + 1).rem_euclid(SECONDS_PER_DAY);

        if self.device.power == Power::Off {
            self.drift_to_ambient();
        } else {
            let rate = 0.1 * (1.0 + 0.5 * self.device.fan.level() as f64);
            let target = self.device.setpoint as f64;
            match self.device.mode {
                Mode::Cool if self.temperature > target => {
                    self.temperature = (self.temperature - rate).max(target);
                }
                Mode::Heat if self.temperature < target => {
                    self.temperature = (self.temperature + rate).min(target);
                }
                Mode::Auto if self.temperature > target => {
                    self.temperature = (self.temperature - rate).max(target);
                }
                Mode::Auto if self.temperature < target => {
                    self.temperature = (self.temperature + rate).min(target);
                }
                Mode::Dry if self.humidity > DRY_TARGET => {
                    self.humidity -= 1;
                    self.temperature -= 0.05;
                }
                Mode::Fan => self.drift_to_ambient(),
                _ => {}
            }
        }

        self.temperature = self.temperature.clamp(MIN_TEMPERATURE, MAX_TEMPERATURE);
    }

    fn drift_to_ambient(&mut self) {
        self.temperature += (AMBIENT - self.temperature) * 0.01;
    }
}

/// Point-in-time view of the simulated room.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlantSnapshot {
    pub temperature: f64,
    pub humidity: i64,
    pub occupied: i64,
    pub time: i64,
    pub device: DeviceState,
    /// Commands accepted so far.
    pub commands: u64,
}

#[derive(Debug, Clone)]
pub struct Simulator {
    plant: Arc<Mutex<Plant>>,
}

impl Simulator {
    pub fn new(config: &SimulatorConfig) -> Self {
        let plant = Plant {
            temperature: config.temperature as f64,
            humidity: config.humidity,
            occupied: config.occupied,
            time: config.time,
            device: DeviceState::default(),
            carry: Duration::ZERO,
            commands: 0,
        };
        Self { plant: Arc::new(Mutex::new(plant)) }
    }

    pub fn device(&self) -> SimDevice {
        SimDevice { plant: Arc::clone(&self.plant) }
    }

    pub fn sensors(&self) -> SimSensors {
        SimSensors { plant: Arc::clone(&self.plant) }
    }

    /// A clock driving this plant. With `realtime` every sleep also waits
    /// on the tokio timer.
    pub fn clock(&self, realtime: bool) -> SimClock {
        SimClock {
            plant: Arc::clone(&self.plant),
            realtime,
            elapsed: Duration::ZERO,
        }
    }

    /// Runs the thermal model for `duration` without going through a clock.
    pub fn advance(&self, duration: Duration) {
        lock(&self.plant).advance(duration);
    }

    pub fn snapshot(&self) -> PlantSnapshot {
        let plant = lock(&self.plant);
        PlantSnapshot {
            temperature: plant.temperature,
            humidity: plant.humidity,
            occupied: plant.occupied,
            time: plant.time,
            device: plant.device,
            commands: plant.commands,
        }
    }

    pub fn set_temperature(&self, celsius: f64) {
        lock(&self.plant).temperature = celsius;
    }

    pub fn set_humidity(&self, percent: i64) {
        lock(&self.plant).humidity = percent;
    }

    pub fn set_occupied(&self, occupied: bool) {
        lock(&self.plant).occupied = i64::from(occupied);
    }

    pub fn set_time(&self, seconds: i64) {
        lock(&self.plant).time = seconds;
    }
}

fn lock(plant: &Mutex<Plant>) -> MutexGuard<'_, Plant> {
    plant.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Clone)]
pub struct SimDevice {
    plant: Arc<Mutex<Plant>>,
}

impl Device for SimDevice {
    fn apply(&mut self, command: Command) -> Result<(), DeviceError> {
        if let Command::Temp(setpoint) = command
            && !(MIN_TEMPERATURE as i64..=MAX_TEMPERATURE as i64).contains(&setpoint)
        {
            debug!(setpoint, "setpoint rejected");
            return Err(DeviceError::rejected(format!(
                "setpoint {} outside {}..={}",
                setpoint, MIN_TEMPERATURE as i64, MAX_TEMPERATURE as i64
            )));
        }

        let mut plant = lock(&self.plant);
        plant.device.apply(command);
        plant.commands += 1;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct SimSensors {
    plant: Arc<Mutex<Plant>>,
}

impl Sensors for SimSensors {
    fn read(&mut self, sensor: Sensor) -> Result<i64, SensorError> {
        let plant = lock(&self.plant);
        Ok(match sensor {
            Sensor::Humidity => plant.humidity,
            Sensor::Occupied => plant.occupied,
            Sensor::Time => plant.time,
            Sensor::Temperature => plant.temperature.round() as i64,
        })
    }
}

#[derive(Debug, Clone)]
pub struct SimClock {
    plant: Arc<Mutex<Plant>>,
    realtime: bool,
    elapsed: Duration,
}

impl Clock for SimClock {
    fn now(&self) -> Duration {
        self.elapsed
    }

    async fn sleep(&mut self, duration: Duration) {
        if self.realtime {
            tokio::time::sleep(duration).await;
        } else {
            tokio::task::yield_now().await;
        }
        self.elapsed = self.elapsed.saturating_add(duration);
        lock(&self.plant).advance(duration);
    }
}
