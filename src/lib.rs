pub mod config;
pub mod error;
pub mod pool;
pub mod telemetry;
