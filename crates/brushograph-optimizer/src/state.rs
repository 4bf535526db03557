//! Machine state tracker
//!
//! Follows the *program* as written: only input instructions are applied,
//! never the synthesized maintenance blocks. The program position is what
//! a resume has to return to after a pickup.

use brushograph_core::PartialPosition;
use brushograph_gcode::Instruction;
use serde::{Deserialize, Serialize};

/// Whether the brush is touching the paper
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PenState {
    /// Brush lifted
    #[default]
    Up,
    /// Brush on the paper, painting
    Down,
}

/// Z change carried by a draw move that also moves in X/Y
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZChange {
    /// Z before the move
    pub from: f64,
    /// Z after the move
    pub to: f64,
}

/// Mutable record of the program's progress during one rewrite pass
#[derive(Debug, Clone, Default)]
pub struct MachineState {
    position: PartialPosition,
    color: Option<String>,
    drawn_distance: f64,
    pen: PenState,
    feed_rate: Option<f64>,
    pickup_pending: bool,
}

impl MachineState {
    /// Create a fresh state: position unknown, pen up, no color
    pub fn new() -> Self {
        Self::default()
    }

    /// Last known program position
    pub fn position(&self) -> &PartialPosition {
        &self.position
    }

    /// Color named by the most recent layer marker
    pub fn color(&self) -> Option<&str> {
        self.color.as_deref()
    }

    /// Distance drawn since the last pickup (mm)
    pub fn drawn_distance(&self) -> f64 {
        self.drawn_distance
    }

    /// Current pen state
    pub fn pen(&self) -> PenState {
        self.pen
    }

    /// Whether the pen is down
    pub fn is_drawing(&self) -> bool {
        self.pen == PenState::Down
    }

    /// Modal feed rate of the input program
    pub fn feed_rate(&self) -> Option<f64> {
        self.feed_rate
    }

    /// Whether the current layer still needs its first pickup
    pub fn pickup_pending(&self) -> bool {
        self.pickup_pending
    }

    /// Whether `instruction` would move Z away from its current value
    pub fn changes_z(&self, instruction: &Instruction) -> bool {
        match (instruction.target().and_then(|t| t.z), self.position.z) {
            (Some(z), Some(current)) => (z - current).abs() > f64::EPSILON,
            (Some(_), None) => true,
            (None, _) => false,
        }
    }

    /// The Z change of a draw move that also moves in X/Y, if any
    pub fn draw_z_change(&self, instruction: &Instruction) -> Option<ZChange> {
        let target = match instruction {
            Instruction::Draw(motion) if motion.target.has_planar() => &motion.target,
            _ => return None,
        };
        let (to, from) = (target.z?, self.position.z?);
        ((to - from).abs() > f64::EPSILON).then_some(ZChange { from, to })
    }

    /// Apply an input instruction and return the planar distance it drew
    pub fn apply(&mut self, instruction: &Instruction) -> f64 {
        match instruction {
            Instruction::Rapid(motion) => {
                self.position = self.position.merged(&motion.target);
                self.feed_rate = motion.feed_rate.or(self.feed_rate);
                self.pen = PenState::Up;
                0.0
            }
            Instruction::Draw(motion) => {
                self.feed_rate = motion.feed_rate.or(self.feed_rate);
                let target = &motion.target;
                if target.is_empty() {
                    return 0.0;
                }

                let next = self.position.merged(target);
                let distance = if target.has_planar() {
                    self.pen = PenState::Down;
                    match (self.position.planar(), next.planar()) {
                        (Some((x0, y0)), Some((x1, y1))) => (x1 - x0).hypot(y1 - y0),
                        _ => 0.0,
                    }
                } else {
                    let rising = matches!(
                        (self.position.z, target.z),
                        (Some(current), Some(z)) if z > current
                    );
                    self.pen = if rising { PenState::Up } else { PenState::Down };
                    0.0
                };

                self.position = next;
                self.drawn_distance += distance;
                distance
            }
            Instruction::LayerMarker { color, .. } => {
                self.color = Some(color.clone());
                self.pickup_pending = true;
                0.0
            }
            Instruction::Comment(_) | Instruction::Other(_) => 0.0,
        }
    }

    /// Zero the distance accumulator after a pickup
    pub fn reset_distance(&mut self) {
        self.drawn_distance = 0.0;
        self.pickup_pending = false;
    }
}
