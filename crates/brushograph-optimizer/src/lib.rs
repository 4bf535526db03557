//! # Brushograph Optimizer
//!
//! Rewrites a plotter G-code program for a brush-painting machine:
//! - Tracks how far the brush has painted since it last took paint
//! - Inserts paint pickups at layer starts and past a distance threshold
//! - Inserts a wash between different paints
//! - Returns the tool to the interrupted stroke after a pickup
//!
//! A pass is all-or-nothing: it either returns the rewritten program with
//! its log, or a [`RewriteError`].

pub mod error;
pub mod log;
pub mod policy;
pub mod resolver;
pub mod rewriter;
pub mod state;
pub mod summary;

pub use error::RewriteError;
pub use log::{LogEntry, RewriteLog, RewriteWarning};
pub use policy::{Decision, InsertionPolicy, PickupReason, PolicyConfig};
pub use resolver::{ColorProfile, ColorResolver};
pub use rewriter::{MachineMotion, RewriteOptions, RewriteOutput, Rewriter};
pub use state::{MachineState, PenState, ZChange};
pub use summary::{PickupSegment, RewriteSummary};
