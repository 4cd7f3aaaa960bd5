use crate::error::AppError;
use crate::sensor::{
    DEFAULT_TIMEOUT_MS, DistanceMeasurement, DistanceMode, RangingSensor, SensorRangeStatus,
};
use std::collections::VecDeque;
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct MockSensorBehavior {
    pub init_ok: bool,
    pub start_ok: bool,
    pub data_ready_ok: bool,
    pub read_distance_ok: bool,
    pub config_ok: bool,
    pub range_status: SensorRangeStatus,
}

impl MockSensorBehavior {
    pub fn ok() -> Self {
        Self {
            init_ok: true,
            start_ok: true,
            data_ready_ok: true,
            read_distance_ok: true,
            config_ok: true,
            range_status: SensorRangeStatus::Valid,
        }
    }

    pub fn fail_init() -> Self {
        Self {
            init_ok: false,
            ..Self::ok()
        }
    }

    pub fn fail_start() -> Self {
        Self {
            start_ok: false,
            ..Self::ok()
        }
    }

    pub fn fail_data_ready() -> Self {
        Self {
            data_ready_ok: false,
            ..Self::ok()
        }
    }

    pub fn fail_read_distance() -> Self {
        Self {
            read_distance_ok: false,
            ..Self::ok()
        }
    }

    pub fn fail_config() -> Self {
        Self {
            config_ok: false,
            ..Self::ok()
        }
    }

    pub fn with_range_status(range_status: SensorRangeStatus) -> Self {
        Self {
            range_status,
            ..Self::ok()
        }
    }
}

/// Scripted sensor: each queued distance becomes one ready measurement.
#[derive(Debug)]
pub struct MockSensor {
    behavior: MockSensorBehavior,
    pending: VecDeque<u16>,
    reads: usize,
    continuous_interval: Option<Duration>,
    distance_mode: DistanceMode,
    timing_budget_us: u32,
    timeout_ms: u16,
}

impl MockSensor {
    pub fn new(behavior: MockSensorBehavior) -> Self {
        Self {
            behavior,
            pending: VecDeque::new(),
            reads: 0,
            continuous_interval: None,
            distance_mode: DistanceMode::Long,
            timing_budget_us: 100_000,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    pub fn with_readings(readings: impl IntoIterator<Item = u16>) -> Self {
        let mut sensor = Self::new(MockSensorBehavior::ok());
        sensor.push_readings(readings);
        sensor
    }

    pub fn push_reading(&mut self, distance_mm: u16) {
        self.pending.push_back(distance_mm);
    }

    pub fn push_readings(&mut self, readings: impl IntoIterator<Item = u16>) {
        self.pending.extend(readings);
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Number of measurements consumed so far.
    pub fn reads(&self) -> usize {
        self.reads
    }

    pub fn continuous_interval(&self) -> Option<Duration> {
        self.continuous_interval
    }

    fn check_config(&self) -> Result<(), AppError> {
        if self.behavior.config_ok {
            Ok(())
        } else {
            Err(AppError::Sensor("mock config failed".to_string()))
        }
    }
}

impl Default for MockSensor {
    fn default() -> Self {
        Self::new(MockSensorBehavior::ok())
    }
}

impl RangingSensor for MockSensor {
    fn init(&mut self) -> Result<(), AppError> {
        if self.behavior.init_ok {
            Ok(())
        } else {
            Err(AppError::Sensor("mock init failed".to_string()))
        }
    }

    fn start_continuous(&mut self, interval: Duration) -> Result<(), AppError> {
        if !self.behavior.start_ok {
            return Err(AppError::Sensor("mock start failed".to_string()));
        }
        self.continuous_interval = Some(interval);
        Ok(())
    }

    fn data_ready(&mut self) -> Result<bool, AppError> {
        if self.behavior.data_ready_ok {
            Ok(!self.pending.is_empty())
        } else {
            Err(AppError::Sensor("mock data ready failed".to_string()))
        }
    }

    fn read_distance(&mut self) -> Result<DistanceMeasurement, AppError> {
        if !self.behavior.read_distance_ok {
            return Err(AppError::Sensor("mock read distance failed".to_string()));
        }
        let distance_mm = self.pending.pop_front().ok_or(AppError::NoData)?;
        self.reads += 1;
        Ok(DistanceMeasurement {
            distance_mm,
            range_status: self.behavior.range_status,
        })
    }

    fn set_distance_mode(&mut self, mode: DistanceMode) -> Result<(), AppError> {
        self.check_config()?;
        self.distance_mode = mode;
        Ok(())
    }

    fn distance_mode(&mut self) -> Result<DistanceMode, AppError> {
        self.check_config()?;
        Ok(self.distance_mode)
    }

    fn set_timing_budget_us(&mut self, budget_us: u32) -> Result<(), AppError> {
        self.check_config()?;
        self.timing_budget_us = budget_us;
        Ok(())
    }

    fn timing_budget_us(&mut self) -> Result<u32, AppError> {
        self.check_config()?;
        Ok(self.timing_budget_us)
    }

    fn set_timeout_ms(&mut self, timeout_ms: u16) -> Result<(), AppError> {
        self.check_config()?;
        self.timeout_ms = timeout_ms;
        Ok(())
    }

    fn timeout_ms(&mut self) -> Result<u16, AppError> {
        self.check_config()?;
        Ok(self.timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_distance_consumes_queued_reading() {
        let mut sensor = MockSensor::with_readings([123, 456]);

        assert!(sensor.data_ready().expect("data ready ok"));
        let measurement = sensor.read_distance().expect("read distance ok");

        assert_eq!(measurement.distance_mm, 123);
        assert_eq!(measurement.range_status, SensorRangeStatus::Valid);
        assert_eq!(sensor.pending(), 1);
        assert_eq!(sensor.reads(), 1);
    }

    #[test]
    fn empty_queue_is_not_ready() {
        let mut sensor = MockSensor::default();

        assert!(!sensor.data_ready().expect("data ready ok"));
        assert!(matches!(sensor.read_distance(), Err(AppError::NoData)));
    }

    #[test]
    fn read_distance_can_fail() {
        let mut sensor = MockSensor::new(MockSensorBehavior::fail_read_distance());
        sensor.push_reading(100);

        let err = sensor.read_distance().unwrap_err();

        assert_eq!(err.to_string(), "sensor error: mock read distance failed");
    }
}
