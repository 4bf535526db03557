//! Rewrite pass errors

use brushograph_core::{GcodeError, ProfileError};
use thiserror::Error;

/// Fatal error of a rewrite pass
///
/// A pass that fails returns no output at all.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RewriteError {
    /// A G0/G1 line could not be parsed
    #[error(transparent)]
    Parse(#[from] GcodeError),

    /// A layer marker names a color with no profile
    #[error("Unknown color '{color}' at line {line_number}")]
    UnknownColor {
        /// The line number of the layer marker.
        line_number: usize,
        /// The color name that was not found.
        color: String,
    },

    /// A profile could not be used
    #[error("Profile error at line {line_number}: {source}")]
    Profile {
        /// The line number being processed.
        line_number: usize,
        /// The underlying profile error.
        #[source]
        source: ProfileError,
    },
}

impl RewriteError {
    /// Attach a line number to a profile lookup failure
    pub fn from_profile(err: ProfileError, line_number: usize) -> Self {
        match err {
            ProfileError::UnknownColor { color } => Self::UnknownColor { line_number, color },
            source => Self::Profile {
                line_number,
                source,
            },
        }
    }

    /// Line number the error refers to
    pub fn line_number(&self) -> usize {
        match self {
            Self::Parse(err) => err.line_number(),
            Self::UnknownColor { line_number, .. } | Self::Profile { line_number, .. } => {
                *line_number
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_color_carries_line() {
        let err = RewriteError::from_profile(
            ProfileError::UnknownColor {
                color: "Purple".to_string(),
            },
            42,
        );
        assert_eq!(err.to_string(), "Unknown color 'Purple' at line 42");
        assert_eq!(err.line_number(), 42);
    }

    #[test]
    fn test_parse_error_is_transparent() {
        let err: RewriteError = GcodeError::InvalidSyntax {
            line_number: 3,
            reason: "expected G0 or G1".to_string(),
        }
        .into();
        assert_eq!(err.to_string(), "Invalid syntax at line 3: expected G0 or G1");
        assert_eq!(err.line_number(), 3);
    }
}
