//! Machine coordinate model
//!
//! This module provides:
//! - Full three-axis positions for planar distance accounting
//! - Partial positions, where each axis may be unspecified
//!
//! A G-code move only names the axes it changes, so the rewriting
//! engine tracks the tool as a [`PartialPosition`] that starts out with
//! every axis undefined and fills in as moves are applied.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Position in 3D machine space (millimeters)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// X-axis position
    pub x: f64,
    /// Y-axis position
    pub y: f64,
    /// Z-axis position (brush height)
    pub z: f64,
}

impl Position {
    /// Create a new position with X, Y, Z coordinates
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        debug_assert!(
            x.is_finite() && y.is_finite() && z.is_finite(),
            "Position axes must be finite: x={x}, y={y}, z={z}"
        );
        Self { x, y, z }
    }

    /// Euclidean distance to another position in the XY plane
    pub fn planar_distance_to(&self, other: &Position) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Translate this position in the XY plane
    pub fn translated(&self, dx: f64, dy: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            z: self.z,
        }
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "X:{:.3} Y:{:.3} Z:{:.3}", self.x, self.y, self.z)
    }
}

/// Partial position where each axis may be unspecified
///
/// `None` means "not specified" on a parsed move, and "not yet known"
/// on a tracked tool position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PartialPosition {
    /// X-axis position (if known)
    pub x: Option<f64>,
    /// Y-axis position (if known)
    pub y: Option<f64>,
    /// Z-axis position (if known)
    pub z: Option<f64>,
}

impl PartialPosition {
    /// Create a new empty partial position (all axes None)
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a partial position with XY axes set
    pub fn xy(x: f64, y: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            z: None,
        }
    }

    /// Create a partial position with only Z axis set
    pub fn z_only(z: f64) -> Self {
        Self {
            z: Some(z),
            ..Default::default()
        }
    }

    /// Create a partial position with XYZ axes set
    pub fn xyz(x: f64, y: f64, z: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            z: Some(z),
        }
    }

    /// Overlay `update` on this position: specified axes win, the rest are kept
    pub fn merged(&self, update: &PartialPosition) -> PartialPosition {
        PartialPosition {
            x: update.x.or(self.x),
            y: update.y.or(self.y),
            z: update.z.or(self.z),
        }
    }

    /// Whether X or Y is specified
    pub fn has_planar(&self) -> bool {
        self.x.is_some() || self.y.is_some()
    }

    /// Whether both X and Y are specified
    pub fn has_xy(&self) -> bool {
        self.x.is_some() && self.y.is_some()
    }

    /// Planar part of this position, if both X and Y are known
    pub fn planar(&self) -> Option<(f64, f64)> {
        Some((self.x?, self.y?))
    }

    /// Convert to a full position if all axes are known
    pub fn to_position(&self) -> Option<Position> {
        Some(Position::new(self.x?, self.y?, self.z?))
    }

    /// Translate the specified planar axes, leaving unspecified ones alone
    pub fn translated(&self, dx: f64, dy: f64) -> Self {
        Self {
            x: self.x.map(|x| x + dx),
            y: self.y.map(|y| y + dy),
            z: self.z,
        }
    }

    /// Count how many axes are set in this partial position
    pub fn axis_count(&self) -> usize {
        [self.x, self.y, self.z]
            .iter()
            .filter(|opt| opt.is_some())
            .count()
    }

    /// Check if this partial position is empty (no axes set)
    pub fn is_empty(&self) -> bool {
        self.x.is_none() && self.y.is_none() && self.z.is_none()
    }
}

impl From<Position> for PartialPosition {
    fn from(p: Position) -> Self {
        Self::xyz(p.x, p.y, p.z)
    }
}

impl fmt::Display for PartialPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let axis = |v: Option<f64>| match v {
            Some(v) => format!("{:.3}", v),
            None => "?".to_string(),
        };
        write!(f, "X:{} Y:{} Z:{}", axis(self.x), axis(self.y), axis(self.z))
    }
}
