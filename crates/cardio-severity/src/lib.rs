pub mod config;
pub mod error;
pub mod severity;
pub mod telemetry;
