//! # Brushograph Core
//!
//! Shared types for the Brushograph workspace.
//! Provides the machine coordinate model used by the parser, the
//! rewriting engine and the configuration layer, plus the layered
//! error types every crate reports through.

pub mod data;
pub mod error;

pub use data::{PartialPosition, Position};
pub use error::{Error, GcodeError, ProfileError, Result};
