//! Rewrite log
//!
//! Append-only record of every decision taken during a pass, one entry per
//! input line, plus the non-fatal warnings raised along the way.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::Decision;

/// One input line's decision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// 1-based input line number
    pub line_number: usize,
    /// What was inserted before the line
    pub decision: Decision,
    /// Accumulated drawn distance when the decision was taken (mm)
    pub distance_at_decision: f64,
    /// Accumulated drawn distance once the decision took effect; zero
    /// after a pickup (mm)
    pub accumulated_distance: f64,
    /// Distance drawn by the line itself (mm)
    pub segment_distance: f64,
}

/// Non-fatal oddity in the input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RewriteWarning {
    /// A draw move that also moves in X/Y changes Z
    UnexpectedZDuringDraw {
        /// Input line number
        line_number: usize,
        /// Z before the move
        from_z: f64,
        /// Z after the move
        to_z: f64,
    },
    /// A pickup was due but no layer marker has named a color yet
    DrawWithoutColor {
        /// Input line number where the pickup was due
        line_number: usize,
    },
}

impl RewriteWarning {
    /// Line number the warning refers to
    pub fn line_number(&self) -> usize {
        match self {
            Self::UnexpectedZDuringDraw { line_number, .. }
            | Self::DrawWithoutColor { line_number } => *line_number,
        }
    }
}

impl fmt::Display for RewriteWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedZDuringDraw {
                line_number,
                from_z,
                to_z,
            } => write!(
                f,
                "Line {}: draw move changes Z from {} to {}",
                line_number, from_z, to_z
            ),
            Self::DrawWithoutColor { line_number } => write!(
                f,
                "Line {}: pickup due but no layer color is active",
                line_number
            ),
        }
    }
}

/// Ordered decisions and warnings of one pass
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RewriteLog {
    entries: Vec<LogEntry>,
    warnings: Vec<RewriteWarning>,
}

impl RewriteLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a decision
    pub fn record(&mut self, entry: LogEntry) {
        self.entries.push(entry);
    }

    /// Append a warning
    pub fn warn(&mut self, warning: RewriteWarning) {
        self.warnings.push(warning);
    }

    /// All entries in input order
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// Entries that inserted something
    pub fn insertions(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter().filter(|e| e.decision.is_action())
    }

    /// Warnings in the order they were raised
    pub fn warnings(&self) -> &[RewriteWarning] {
        &self.warnings
    }

    /// Number of pickups inserted
    pub fn pickup_count(&self) -> usize {
        self.entries.iter().filter(|e| e.decision.is_pickup()).count()
    }

    /// Number of washes inserted
    pub fn wash_count(&self) -> usize {
        self.entries.iter().filter(|e| e.decision.is_wash()).count()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the log has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
