use crate::error::AppError;
use serde::Deserialize;
use std::time::Duration;

pub mod mock;
pub mod vl53l1x;

// VL53L1X default is 0x52 in 8-bit notation; use 0x29 for 7-bit addressing.
pub const DEFAULT_I2C_ADDRESS_7BIT: u8 = 0x29;
pub const I2C_7BIT_MAX: u8 = 0x77;
pub const DEFAULT_TIMEOUT_MS: u16 = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMode {
    /// Up to ~1.3m, better ambient light immunity.
    Short,
    /// Up to ~4m.
    Long,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorRangeStatus {
    Valid,
    SigmaFailure,
    SignalFailure,
    MinRangeClipped,
    OutOfBounds,
    HardwareFailure,
    WrapCheckFail,
    Wraparound,
    ProcessingFailure,
    CrosstalkSignal,
    Synchronisation,
    MergedPulse,
    LackOfSignal,
    MinRangeFail,
    InvalidRange,
    None,
}

impl SensorRangeStatus {
    pub fn is_valid(self) -> bool {
        matches!(self, Self::Valid)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DistanceMeasurement {
    pub distance_mm: u16,
    pub range_status: SensorRangeStatus,
}

/// Narrow view of a single ranging sensor in continuous mode.
///
/// `data_ready` must be checked before `read_distance`; reading consumes the
/// pending measurement.
pub trait RangingSensor {
    fn init(&mut self) -> Result<(), AppError>;
    /// Start continuous ranging, one measurement per `interval`.
    fn start_continuous(&mut self, interval: Duration) -> Result<(), AppError>;
    fn data_ready(&mut self) -> Result<bool, AppError>;
    fn read_distance(&mut self) -> Result<DistanceMeasurement, AppError>;

    fn set_distance_mode(&mut self, mode: DistanceMode) -> Result<(), AppError>;
    fn distance_mode(&mut self) -> Result<DistanceMode, AppError>;
    fn set_timing_budget_us(&mut self, budget_us: u32) -> Result<(), AppError>;
    fn timing_budget_us(&mut self) -> Result<u32, AppError>;
    fn set_timeout_ms(&mut self, timeout_ms: u16) -> Result<(), AppError>;
    fn timeout_ms(&mut self) -> Result<u16, AppError>;
}

impl<S: RangingSensor + ?Sized> RangingSensor for Box<S> {
    fn init(&mut self) -> Result<(), AppError> {
        (**self).init()
    }
    fn start_continuous(&mut self, interval: Duration) -> Result<(), AppError> {
        (**self).start_continuous(interval)
    }
    fn data_ready(&mut self) -> Result<bool, AppError> {
        (**self).data_ready()
    }
    fn read_distance(&mut self) -> Result<DistanceMeasurement, AppError> {
        (**self).read_distance()
    }
    fn set_distance_mode(&mut self, mode: DistanceMode) -> Result<(), AppError> {
        (**self).set_distance_mode(mode)
    }
    fn distance_mode(&mut self) -> Result<DistanceMode, AppError> {
        (**self).distance_mode()
    }
    fn set_timing_budget_us(&mut self, budget_us: u32) -> Result<(), AppError> {
        (**self).set_timing_budget_us(budget_us)
    }
    fn timing_budget_us(&mut self) -> Result<u32, AppError> {
        (**self).timing_budget_us()
    }
    fn set_timeout_ms(&mut self, timeout_ms: u16) -> Result<(), AppError> {
        (**self).set_timeout_ms(timeout_ms)
    }
    fn timeout_ms(&mut self) -> Result<u16, AppError> {
        (**self).timeout_ms()
    }
}

/// Convert an interval to whole milliseconds as the sensor registers expect.
pub fn interval_to_ms(interval: Duration) -> Result<u16, AppError> {
    let millis = interval.as_millis();
    u16::try_from(millis).map_err(|_| AppError::InvalidInterval(millis))
}
