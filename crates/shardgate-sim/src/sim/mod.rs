pub mod backend;
pub mod config;
pub mod load;
pub mod telemetry;
