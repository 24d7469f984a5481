#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;
use thermolang_eval::{Command, Device, DeviceError, SensorError, Sensors};
use thermolang_syntax::Sensor;

/// Fixed sensor readings that tests can change between passes.
#[derive(Debug, Clone, Default)]
pub struct FixedSensors {
    readings: Rc<RefCell<Readings>>,
}

#[derive(Debug, Clone)]
struct Readings {
    humidity: i64,
    occupied: i64,
    time: i64,
    temperature: i64,
    fail: Option<Sensor>,
}

impl Default for Readings {
    fn default() -> Self {
        Self { humidity: 50, occupied: 0, time: 43_200, temperature: 25, fail: None }
    }
}

impl FixedSensors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, sensor: Sensor, value: i64) {
        let mut readings = self.readings.borrow_mut();
        match sensor {
            Sensor::Humidity => readings.humidity = value,
            Sensor::Occupied => readings.occupied = value,
            Sensor::Time => readings.time = value,
            Sensor::Temperature => readings.temperature = value,
        }
    }

    /// Makes every read of `sensor` fail.
    pub fn fail(&self, sensor: Sensor) {
        self.readings.borrow_mut().fail = Some(sensor);
    }
}

impl Sensors for FixedSensors {
    fn read(&mut self, sensor: Sensor) -> Result<i64, SensorError> {
        let readings = self.readings.borrow();
        if readings.fail == Some(sensor) {
            return Err(SensorError::Unavailable { sensor, reason: "disconnected".to_string() });
        }
        Ok(match sensor {
            Sensor::Humidity => readings.humidity,
            Sensor::Occupied => readings.occupied,
            Sensor::Time => readings.time,
            Sensor::Temperature => readings.temperature,
        })
    }
}

/// Records every command it accepts.
#[derive(Debug, Clone, Default)]
pub struct RecordingDevice {
    log: Rc<RefCell<Vec<Command>>>,
    reject_temp_above: Option<i64>,
}

impl RecordingDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rejecting_temp_above(limit: i64) -> Self {
        Self { reject_temp_above: Some(limit), ..Self::default() }
    }

    pub fn commands(&self) -> Vec<Command> {
        self.log.borrow().clone()
    }

    pub fn clear(&self) {
        self.log.borrow_mut().clear();
    }
}

impl Device for RecordingDevice {
    fn apply(&mut self, command: Command) -> Result<(), DeviceError> {
        if let (Command::Temp(t), Some(limit)) = (command, self.reject_temp_above)
            && t > limit
        {
            return Err(DeviceError::rejected(format!("setpoint {} too high", t)));
        }
        self.log.borrow_mut().push(command);
        Ok(())
    }
}
