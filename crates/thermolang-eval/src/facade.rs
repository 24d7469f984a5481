//! The narrow boundary between the interpreter and the plant.
//!
//! The interpreter never touches hardware. It pushes [`Command`]s through a
//! [`Device`] and pulls readings through [`Sensors`]. The simulator, the test
//! suites and any real driver implement these two traits.

use crate::error::{DeviceError, SensorError};
use std::fmt;
use std::ops::RangeInclusive;
use thermolang_syntax::ast::{FanSpeed, Mode, Power, Sensor, Swing};

/// One device write, already evaluated and kind-checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Temp(i64),
    Mode(Mode),
    Fan(FanSpeed),
    Swing(Swing),
    Power(Power),
}

impl Command {
    /// The `SET` target this command writes.
    pub fn target(&self) -> &'static str {
        match self {
            Command::Temp(_) => "TEMP",
            Command::Mode(_) => "MODE",
            Command::Fan(_) => "FAN",
            Command::Swing(_) => "SWING",
            Command::Power(_) => "POWER",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Temp(t) => write!(f, "TEMP = {}", t),
            Command::Mode(m) => write!(f, "MODE = {}", m),
            Command::Fan(s) => write!(f, "FAN = {}", s),
            Command::Swing(s) => write!(f, "SWING = {}", s),
            Command::Power(p) => write!(f, "POWER = {}", p),
        }
    }
}

/// Receives device commands.
pub trait Device {
    fn apply(&mut self, command: Command) -> Result<(), DeviceError>;
}

/// Supplies sensor readings. Called on every read, never cached.
pub trait Sensors {
    fn read(&mut self, sensor: Sensor) -> Result<i64, SensorError>;
}

impl<T: Device + ?Sized> Device for &mut T {
    fn apply(&mut self, command: Command) -> Result<(), DeviceError> {
        (**self).apply(command)
    }
}

impl<T: Sensors + ?Sized> Sensors for &mut T {
    fn read(&mut self, sensor: Sensor) -> Result<i64, SensorError> {
        (**self).read(sensor)
    }
}

impl<T: Device + ?Sized> Device for Box<T> {
    fn apply(&mut self, command: Command) -> Result<(), DeviceError> {
        (**self).apply(command)
    }
}

impl<T: Sensors + ?Sized> Sensors for Box<T> {
    fn read(&mut self, sensor: Sensor) -> Result<i64, SensorError> {
        (**self).read(sensor)
    }
}

/// Seconds in a day; `TIME` readings live in `0..SECONDS_PER_DAY`.
pub const SECONDS_PER_DAY: i64 = 86_400;

/// Accepted reading range per sensor.
pub fn valid_range(sensor: Sensor) -> RangeInclusive<i64> {
    match sensor {
        Sensor::Humidity => 0..=100,
        Sensor::Occupied => 0..=1,
        Sensor::Time => 0..=SECONDS_PER_DAY - 1,
        Sensor::Temperature => -40..=80,
    }
}

/// Rejects readings outside the sensor's range.
pub fn check_reading(sensor: Sensor, value: i64) -> Result<i64, SensorError> {
    if valid_range(sensor).contains(&value) {
        Ok(value)
    } else {
        Err(SensorError::OutOfRange { sensor, value })
    }
}

/// The interpreter's mirror of what it last told the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceState {
    pub setpoint: i64,
    pub mode: Mode,
    pub fan: FanSpeed,
    pub swing: Swing,
    pub power: Power,
}

impl Default for DeviceState {
    fn default() -> Self {
        Self {
            setpoint: 24,
            mode: Mode::default(),
            fan: FanSpeed::default(),
            swing: Swing::default(),
            power: Power::default(),
        }
    }
}

impl DeviceState {
    pub fn apply(&mut self, command: Command) {
        match command {
            Command::Temp(t) => self.setpoint = t,
            Command::Mode(m) => self.mode = m,
            Command::Fan(s) => self.fan = s,
            Command::Swing(s) => self.swing = s,
            Command::Power(p) => self.power = p,
        }
    }
}

impl fmt::Display for DeviceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "POWER={} MODE={} TEMP={} FAN={} SWING={}",
            self.power, self.mode, self.setpoint, self.fan, self.swing
        )
    }
}
