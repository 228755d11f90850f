//! Logging and data health reporting.

mod logging;
mod report;

pub use logging::{setup_logging, LogFormat};
pub use report::HealthReport;
