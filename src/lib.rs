pub mod config;
pub mod domain;
pub mod driver;
pub mod simulation;
pub mod telemetry;
