//! Process-wide tracing setup.

pub mod tracing;

pub use tracing::LogFormat;

/// Initialize tracing with the format chosen by `LOG_FORMAT`.
///
/// Safe to call multiple times; later calls are no-ops.
pub fn init() {
    tracing::init(LogFormat::from_env());
}
