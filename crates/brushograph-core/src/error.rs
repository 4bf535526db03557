//! Error handling for Brushograph
//!
//! Provides error types for the layers of the workspace:
//! - G-Code errors (line parsing)
//! - Profile errors (color profile lookup and sequence setup)
//!
//! All error types use `thiserror` for ergonomic error handling.

use thiserror::Error;

/// G-Code error type
///
/// Represents errors raised while parsing a line of G-code.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GcodeError {
    /// Invalid G-Code syntax
    #[error("Invalid syntax at line {line_number}: {reason}")]
    InvalidSyntax {
        /// The line number where the syntax error occurred.
        line_number: usize,
        /// The reason for the syntax error.
        reason: String,
    },

    /// Invalid parameter value
    #[error("Invalid parameter '{param}' at line {line_number}: {reason}")]
    InvalidParameter {
        /// The line number where the invalid parameter was found.
        line_number: usize,
        /// The parameter name.
        param: String,
        /// The reason the parameter is invalid.
        reason: String,
    },

    /// A second command word on a G0/G1 line
    #[error("Unexpected word '{word}' at line {line_number}")]
    UnexpectedWord {
        /// The line number where the word was found.
        line_number: usize,
        /// The offending word.
        word: String,
    },
}

impl GcodeError {
    /// Line number the error refers to
    pub fn line_number(&self) -> usize {
        match self {
            Self::InvalidSyntax { line_number, .. }
            | Self::InvalidParameter { line_number, .. }
            | Self::UnexpectedWord { line_number, .. } => *line_number,
        }
    }

    /// Re-attribute the error to another line number
    ///
    /// Used when a snippet parsed on its own (line numbers starting at 1)
    /// is embedded in a larger source.
    pub fn at_line(self, line: usize) -> Self {
        match self {
            Self::InvalidSyntax { reason, .. } => Self::InvalidSyntax {
                line_number: line,
                reason,
            },
            Self::InvalidParameter { param, reason, .. } => Self::InvalidParameter {
                line_number: line,
                param,
                reason,
            },
            Self::UnexpectedWord { word, .. } => Self::UnexpectedWord {
                line_number: line,
                word,
            },
        }
    }
}

/// Color profile error type
///
/// Represents errors looking up or building a color profile.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProfileError {
    /// The color has no configured profile
    #[error("Unknown color: {color}")]
    UnknownColor {
        /// The color name that was not found.
        color: String,
    },

    /// A configured sequence for the color is unusable
    #[error("Invalid sequence for color '{color}': {reason}")]
    InvalidSequence {
        /// The color the sequence belongs to.
        color: String,
        /// Why the sequence was rejected.
        reason: String,
    },
}

/// Main error type for Brushograph
///
/// A unified error type that can represent any error from all layers.
#[derive(Error, Debug)]
pub enum Error {
    /// G-Code error
    #[error(transparent)]
    Gcode(#[from] GcodeError),

    /// Profile error
    #[error(transparent)]
    Profile(#[from] ProfileError),

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Check if this is a G-Code error
    pub fn is_gcode_error(&self) -> bool {
        matches!(self, Error::Gcode(_))
    }

    /// Check if this is a profile error
    pub fn is_profile_error(&self) -> bool {
        matches!(self, Error::Profile(_))
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gcode_error_display() {
        let err = GcodeError::InvalidParameter {
            line_number: 12,
            param: "X".to_string(),
            reason: "'1.2.3' is not a number".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid parameter 'X' at line 12: '1.2.3' is not a number"
        );
        assert_eq!(err.line_number(), 12);
    }

    #[test]
    fn test_at_line_rewrites_line_number() {
        let err = GcodeError::UnexpectedWord {
            line_number: 1,
            word: "M3".to_string(),
        };
        assert_eq!(err.at_line(40).line_number(), 40);
    }

    #[test]
    fn test_error_conversion() {
        let err: Error = ProfileError::UnknownColor {
            color: "Purple".to_string(),
        }
        .into();
        assert!(err.is_profile_error());
        assert_eq!(err.to_string(), "Unknown color: Purple");

        let err: Error = GcodeError::InvalidSyntax {
            line_number: 3,
            reason: "dangling word".to_string(),
        }
        .into();
        assert!(err.is_gcode_error());
    }
}
