use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("sensor error: {0}")]
    Sensor(String),
    #[error("i2c error: {0}")]
    I2c(String),
    #[error("no measurement available")]
    NoData,
    #[error("timing budget out of range: {0}us")]
    InvalidTimingBudget(u32),
    #[error("interval out of range: {0}ms")]
    InvalidInterval(u128),
}
