//! Error types for staleness checks

use std::path::PathBuf;

use thiserror::Error;

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Terminal failures of a staleness check.
///
/// An outdated dist file is not an error; it is reported through [`crate::Verdict`].
#[derive(Error, Debug)]
pub enum Error {
    /// The configuration file could not be read.
    #[error("could not read config file '{}': {source}", .path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid JSON or has values of the wrong type.
    #[error("invalid config file '{}': {source}", .path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A mandatory pattern list (`src` or `dist`) is absent or empty.
    #[error("key '{0}' must be set in the config file")]
    MissingPatterns(&'static str),

    /// A glob pattern could not be compiled.
    #[error("invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    /// A directory could not be listed during the walk.
    #[error("could not read directory '{}': {source}", .path.display())]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A file's modification time could not be read.
    #[error("could not stat '{}': {source}", .path.display())]
    Stat {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not find any source files")]
    NoSourceFiles,

    #[error("could not find any dist files")]
    NoDistFiles,
}

impl Error {
    /// Errors raised before any traversal begins.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::ConfigRead { .. }
                | Error::ConfigParse { .. }
                | Error::MissingPatterns(_)
                | Error::InvalidPattern { .. }
        )
    }

    /// Errors raised by filesystem access during the walk or the timestamp scan.
    pub fn is_traversal(&self) -> bool {
        matches!(self, Error::ReadDir { .. } | Error::Stat { .. })
    }

    /// The walk finished but one of the inventories is empty.
    pub fn is_classification(&self) -> bool {
        matches!(self, Error::NoSourceFiles | Error::NoDistFiles)
    }
}
