pub mod config;
pub mod filter;
pub mod sample;
pub mod service;
pub mod store;
pub mod telemetry;
