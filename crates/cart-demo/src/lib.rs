//! Scripted cart session exercising the serial command queue, with
//! structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod session;

pub use config::Config;
pub use session::{SessionReport, run};
