//! Utilities module for error handling and logging
//!
//! - `error`: the pipeline's error taxonomy and `Result` alias
//! - `logging`: tracing subscriber setup shared by the binaries

pub mod error;
pub mod logging;

pub use error::{CropSightError, Result};
pub use logging::{init_logging, LogConfig, LogLevel};
