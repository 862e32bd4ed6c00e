//! Output configuration types

/// Configuration for console output.
#[derive(Debug, Clone, Default)]
pub struct OutputConfig {
    pub use_color: bool,
    /// Suppress warnings about outdated files
    pub silent: bool,
}
