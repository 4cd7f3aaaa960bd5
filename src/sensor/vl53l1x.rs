use crate::error::AppError;
use crate::sensor::{DistanceMeasurement, DistanceMode, RangingSensor};
use std::time::Duration;

#[cfg(target_os = "linux")]
use crate::sensor::{DEFAULT_TIMEOUT_MS, SensorRangeStatus, interval_to_ms};
#[cfg(target_os = "linux")]
use rppal::i2c::I2c;
#[cfg(target_os = "linux")]
use tracing::debug;
#[cfg(target_os = "linux")]
use vl53l1x_uld::{
    DistanceMode as Vl53l1xDistanceMode, IOVoltage, RangeStatus as Vl53l1xRangeStatus, VL53L1X,
};

#[cfg(target_os = "linux")]
pub type I2cBus = I2c;

/// Placeholder bus type so callers compile off-target.
#[cfg(not(target_os = "linux"))]
#[derive(Debug)]
pub struct I2cBus;

#[cfg(target_os = "linux")]
pub struct Vl53l1xSensor {
    driver: VL53L1X<I2c>,
    io_voltage: IOVoltage,
    // The ULD API has no bus timeout; kept so the setting round-trips.
    timeout_ms: u16,
}

#[cfg(target_os = "linux")]
impl Vl53l1xSensor {
    /// Build a sensor on `bus`, or on the default I2C bus when `None`.
    pub fn new(bus: Option<I2cBus>, address: u8) -> Result<Self, AppError> {
        let i2c = match bus {
            Some(i2c) => i2c,
            None => I2c::new().map_err(|err| AppError::I2c(err.to_string()))?,
        };
        Ok(Self {
            driver: VL53L1X::new(i2c, address),
            io_voltage: IOVoltage::Volt2_8,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        })
    }

    pub fn with_io_voltage(mut self, io_voltage: IOVoltage) -> Self {
        self.io_voltage = io_voltage;
        self
    }
}

#[cfg(target_os = "linux")]
impl RangingSensor for Vl53l1xSensor {
    fn init(&mut self) -> Result<(), AppError> {
        self.driver
            .init(self.io_voltage)
            .map_err(|err| AppError::Sensor(format!("{err:?}")))?;
        self.driver
            .get_sensor_id()
            .map(|id| debug!(sensor_id = format_args!("{id:#06x}"), "VL53L1X booted"))
            .map_err(|err| AppError::Sensor(format!("{err:?}")))
    }

    fn start_continuous(&mut self, interval: Duration) -> Result<(), AppError> {
        let period_ms = interval_to_ms(interval)?;
        self.driver
            .set_inter_measurement_period_ms(period_ms)
            .map_err(|err| AppError::Sensor(format!("inter_measurement: {err:?}")))?;
        self.driver
            .start_ranging()
            .map_err(|err| AppError::Sensor(format!("{err:?}")))
    }

    fn data_ready(&mut self) -> Result<bool, AppError> {
        self.driver
            .is_data_ready()
            .map_err(|err| AppError::Sensor(format!("{err:?}")))
    }

    fn read_distance(&mut self) -> Result<DistanceMeasurement, AppError> {
        let result = self
            .driver
            .get_result()
            .map_err(|err| AppError::Sensor(format!("{err:?}")))?;
        // Clear interrupt to trigger next measurement
        self.driver
            .clear_interrupt()
            .map_err(|err| AppError::Sensor(format!("clear_interrupt: {err:?}")))?;
        Ok(DistanceMeasurement {
            distance_mm: result.distance_mm,
            range_status: SensorRangeStatus::from(result.status),
        })
    }

    fn set_distance_mode(&mut self, mode: DistanceMode) -> Result<(), AppError> {
        self.driver
            .set_distance_mode(mode.into())
            .map_err(|err| AppError::Sensor(format!("{err:?}")))
    }

    fn distance_mode(&mut self) -> Result<DistanceMode, AppError> {
        self.driver
            .get_distance_mode()
            .map(DistanceMode::from)
            .map_err(|err| AppError::Sensor(format!("{err:?}")))
    }

    fn set_timing_budget_us(&mut self, budget_us: u32) -> Result<(), AppError> {
        let budget_ms = u16::try_from(budget_us / 1000)
            .map_err(|_| AppError::InvalidTimingBudget(budget_us))?;
        self.driver
            .set_timing_budget_ms(budget_ms)
            .map_err(|err| AppError::Sensor(format!("{err:?}")))
    }

    fn timing_budget_us(&mut self) -> Result<u32, AppError> {
        self.driver
            .get_timing_budget_ms()
            .map(|budget_ms| u32::from(budget_ms) * 1000)
            .map_err(|err| AppError::Sensor(format!("{err:?}")))
    }

    fn set_timeout_ms(&mut self, timeout_ms: u16) -> Result<(), AppError> {
        self.timeout_ms = timeout_ms;
        Ok(())
    }

    fn timeout_ms(&mut self) -> Result<u16, AppError> {
        Ok(self.timeout_ms)
    }
}

#[cfg(target_os = "linux")]
impl From<DistanceMode> for Vl53l1xDistanceMode {
    fn from(mode: DistanceMode) -> Self {
        match mode {
            DistanceMode::Short => Self::Short,
            DistanceMode::Long => Self::Long,
        }
    }
}

#[cfg(target_os = "linux")]
impl From<Vl53l1xDistanceMode> for DistanceMode {
    fn from(mode: Vl53l1xDistanceMode) -> Self {
        match mode {
            Vl53l1xDistanceMode::Short => Self::Short,
            Vl53l1xDistanceMode::Long => Self::Long,
        }
    }
}

#[cfg(target_os = "linux")]
impl From<Vl53l1xRangeStatus> for SensorRangeStatus {
    fn from(status: Vl53l1xRangeStatus) -> Self {
        match status {
            Vl53l1xRangeStatus::Valid => Self::Valid,
            Vl53l1xRangeStatus::SigmaFailure => Self::SigmaFailure,
            Vl53l1xRangeStatus::SignalFailure => Self::SignalFailure,
            Vl53l1xRangeStatus::MinRangeClipped => Self::MinRangeClipped,
            Vl53l1xRangeStatus::OutOfBounds => Self::OutOfBounds,
            Vl53l1xRangeStatus::HardwareFailure => Self::HardwareFailure,
            Vl53l1xRangeStatus::WrapCheckFail => Self::WrapCheckFail,
            Vl53l1xRangeStatus::Wraparound => Self::Wraparound,
            Vl53l1xRangeStatus::ProcessingFailure => Self::ProcessingFailure,
            Vl53l1xRangeStatus::CrosstalkSignal => Self::CrosstalkSignal,
            Vl53l1xRangeStatus::Synchronisation => Self::Synchronisation,
            Vl53l1xRangeStatus::MergedPulse => Self::MergedPulse,
            Vl53l1xRangeStatus::LackOfSignal => Self::LackOfSignal,
            Vl53l1xRangeStatus::MinRangeFail => Self::MinRangeFail,
            Vl53l1xRangeStatus::InvalidRange => Self::InvalidRange,
            Vl53l1xRangeStatus::None => Self::None,
        }
    }
}

#[cfg(not(target_os = "linux"))]
pub struct Vl53l1xSensor;

#[cfg(not(target_os = "linux"))]
impl Vl53l1xSensor {
    pub fn new(_bus: Option<I2cBus>, _address: u8) -> Result<Self, AppError> {
        Err(unsupported())
    }
}

#[cfg(not(target_os = "linux"))]
fn unsupported() -> AppError {
    AppError::Sensor("VL53L1X driver requires Linux/Raspberry Pi".to_string())
}

#[cfg(not(target_os = "linux"))]
impl RangingSensor for Vl53l1xSensor {
    fn init(&mut self) -> Result<(), AppError> {
        Err(unsupported())
    }

    fn start_continuous(&mut self, _interval: Duration) -> Result<(), AppError> {
        Err(unsupported())
    }

    fn data_ready(&mut self) -> Result<bool, AppError> {
        Err(unsupported())
    }

    fn read_distance(&mut self) -> Result<DistanceMeasurement, AppError> {
        Err(unsupported())
    }

    fn set_distance_mode(&mut self, _mode: DistanceMode) -> Result<(), AppError> {
        Err(unsupported())
    }

    fn distance_mode(&mut self) -> Result<DistanceMode, AppError> {
        Err(unsupported())
    }

    fn set_timing_budget_us(&mut self, _budget_us: u32) -> Result<(), AppError> {
        Err(unsupported())
    }

    fn timing_budget_us(&mut self) -> Result<u32, AppError> {
        Err(unsupported())
    }

    fn set_timeout_ms(&mut self, _timeout_ms: u16) -> Result<(), AppError> {
        Err(unsupported())
    }

    fn timeout_ms(&mut self) -> Result<u16, AppError> {
        Err(unsupported())
    }
}
