//! Shared utilities for ipspace CLI binaries.

pub mod args;
pub mod format;
pub mod logging;

pub use args::LogLevel;
pub use format::{format_bytes, format_count};
pub use logging::init_logging;
