//! Error types for the settings crate.
//!
//! Covers reading and writing configuration files and validating their
//! contents before they are turned into engine options.

use std::io;

use brushograph_core::{GcodeError, ProfileError};
use thiserror::Error;

/// Errors that can occur during settings operations.
#[derive(Error, Debug)]
pub enum SettingsError {
    /// The configuration file extension is neither `.json` nor `.toml`.
    #[error("Unsupported config format: {0}")]
    UnsupportedFormat(String),

    /// A configuration value is invalid.
    #[error("Invalid setting '{key}': {reason}")]
    InvalidSetting {
        /// Dotted path of the offending setting.
        key: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// A configured G-code sequence does not parse.
    #[error("Invalid sequence '{key}': {source}")]
    Sequence {
        /// Dotted path of the sequence.
        key: String,
        /// Parse failure, with the line number inside the sequence.
        #[source]
        source: GcodeError,
    },

    /// The color table could not be assembled.
    #[error(transparent)]
    Profile(#[from] ProfileError),

    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// TOML deserialization error.
    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// TOML serialization error.
    #[error("TOML error: {0}")]
    TomlSerializeError(#[from] toml::ser::Error),
}

impl SettingsError {
    /// Build an [`SettingsError::InvalidSetting`]
    pub fn invalid(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidSetting {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for settings operations.
pub type SettingsResult<T> = Result<T, SettingsError>;
