pub mod config;
pub mod error;
pub mod events;
pub mod monitor;
pub mod sensor;
pub mod zone;
