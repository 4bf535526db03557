//! Insertion policy
//!
//! Decides, before each input instruction is emitted, whether a wash or a
//! paint pickup has to go in front of it. Rules, first match wins:
//!
//! 1. A layer marker naming a different paint than the current one gets a
//!    wash.
//! 2. The first move of a layer gets a pickup, whatever the distance.
//! 3. Past the distance threshold `D`, a pickup goes in at the next clean
//!    transition point (pen up, a rapid move, or a Z change). A stroke is
//!    only interrupted once the accumulated distance reaches `D * M`.
//!
//! In aggressive mode rule 3 accepts any motion boundary past `D`.

use brushograph_core::{PartialPosition, ProfileError};
use brushograph_gcode::Instruction;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{ColorResolver, MachineState};

/// Thresholds and mode of the insertion policy
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Distance drawn before a pickup is wanted (mm)
    pub distance_threshold: f64,
    /// Multiple of the threshold at which a stroke is interrupted
    pub force_multiplier: f64,
    /// Accept any motion boundary once past the threshold
    pub aggressive: bool,
}

impl PolicyConfig {
    /// Distance at which a pickup is forced mid-stroke
    pub fn force_threshold(&self) -> f64 {
        self.distance_threshold * self.force_multiplier
    }
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            distance_threshold: 100.0,
            force_multiplier: 2.0,
            aggressive: false,
        }
    }
}

/// Why a pickup was inserted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PickupReason {
    /// First move of a new layer
    LayerStart,
    /// Threshold exceeded at a clean transition point
    Threshold,
    /// Hard limit reached mid-stroke
    Forced,
    /// Threshold exceeded, aggressive mode
    Aggressive,
}

impl fmt::Display for PickupReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LayerStart => write!(f, "layer start"),
            Self::Threshold => write!(f, "threshold"),
            Self::Forced => write!(f, "forced"),
            Self::Aggressive => write!(f, "aggressive"),
        }
    }
}

/// Outcome of the policy for one instruction boundary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Decision {
    /// Pass the instruction through
    NoAction,
    /// Insert a pickup; the next instruction positions the tool itself
    InsertPickup {
        /// Program position at the insertion point
        at: PartialPosition,
        /// Rule that fired
        reason: PickupReason,
    },
    /// Insert a wash between two paints
    InsertWash {
        /// Outgoing paint
        from: String,
        /// Incoming paint
        to: String,
    },
    /// Insert a pickup, then return the tool to where the program left it
    InsertPickupAndResume {
        /// Program position the tool is returned to
        resume_at: PartialPosition,
        /// Rule that fired
        reason: PickupReason,
    },
}

impl Decision {
    /// Whether anything is inserted
    pub fn is_action(&self) -> bool {
        !matches!(self, Self::NoAction)
    }

    /// Whether a pickup is inserted
    pub fn is_pickup(&self) -> bool {
        matches!(
            self,
            Self::InsertPickup { .. } | Self::InsertPickupAndResume { .. }
        )
    }

    /// Whether a wash is inserted
    pub fn is_wash(&self) -> bool {
        matches!(self, Self::InsertWash { .. })
    }

    /// Rule behind a pickup
    pub fn pickup_reason(&self) -> Option<PickupReason> {
        match self {
            Self::InsertPickup { reason, .. } | Self::InsertPickupAndResume { reason, .. } => {
                Some(*reason)
            }
            _ => None,
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoAction => write!(f, "no action"),
            Self::InsertPickup { at, reason } => write!(f, "pickup ({}) at {}", reason, at),
            Self::InsertWash { from, to } => write!(f, "wash {} -> {}", from, to),
            Self::InsertPickupAndResume { resume_at, reason } => {
                write!(f, "pickup ({}) and resume at {}", reason, resume_at)
            }
        }
    }
}

/// Pickup planned for a boundary, before the resume is worked out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PlannedPickup {
    None,
    Pickup(PickupReason),
    /// Wanted, but there is no paint to pick up
    NoColor,
}

/// Rule evaluation over the tracker state and the upcoming instruction
#[derive(Debug, Clone, Default)]
pub struct InsertionPolicy {
    config: PolicyConfig,
}

impl InsertionPolicy {
    /// Create a policy
    pub fn new(config: PolicyConfig) -> Self {
        Self { config }
    }

    /// Get the policy configuration
    pub fn config(&self) -> &PolicyConfig {
        &self.config
    }

    /// Decide what to insert before `next`
    ///
    /// Fails when a layer marker names a color the resolver does not know.
    pub fn decide(
        &self,
        state: &MachineState,
        next: &Instruction,
        resolver: &ColorResolver,
    ) -> Result<Decision, ProfileError> {
        if let Some(color) = next.layer_color() {
            let to = resolver.canonical_name(color)?;
            return Ok(match state.color() {
                Some(current) => {
                    let from = resolver.canonical_name(current)?;
                    if from == to {
                        Decision::NoAction
                    } else {
                        Decision::InsertWash {
                            from: from.to_string(),
                            to: to.to_string(),
                        }
                    }
                }
                None => Decision::NoAction,
            });
        }

        match self.plan_pickup(state, next) {
            PlannedPickup::Pickup(reason) => Ok(Self::pickup_decision(state, next, reason)),
            PlannedPickup::None | PlannedPickup::NoColor => Ok(Decision::NoAction),
        }
    }

    /// Whether a pickup is wanted before `next` but no color is active
    pub fn wants_pickup_without_color(&self, state: &MachineState, next: &Instruction) -> bool {
        self.plan_pickup(state, next) == PlannedPickup::NoColor
    }

    /// Whether the boundary before `next` is a clean transition point
    pub fn is_clean_transition(state: &MachineState, next: &Instruction) -> bool {
        !state.is_drawing() || next.is_rapid() || state.changes_z(next)
    }

    fn plan_pickup(&self, state: &MachineState, next: &Instruction) -> PlannedPickup {
        let Some(target) = next.target() else {
            return PlannedPickup::None;
        };
        if target.is_empty() {
            return PlannedPickup::None;
        }

        let reason = if state.pickup_pending() && next.is_draw() {
            Some(PickupReason::LayerStart)
        } else {
            self.threshold_reason(state, next)
        };

        match reason {
            Some(_) if state.color().is_none() => PlannedPickup::NoColor,
            Some(reason) => PlannedPickup::Pickup(reason),
            None => PlannedPickup::None,
        }
    }

    fn threshold_reason(&self, state: &MachineState, next: &Instruction) -> Option<PickupReason> {
        let drawn = state.drawn_distance();
        if drawn <= self.config.distance_threshold {
            return None;
        }
        if self.config.aggressive {
            return Some(PickupReason::Aggressive);
        }
        if Self::is_clean_transition(state, next) {
            return Some(PickupReason::Threshold);
        }
        (next.is_draw() && drawn >= self.config.force_threshold()).then_some(PickupReason::Forced)
    }

    /// Work out the resume after a pickup
    ///
    /// The brush is only lowered after travelling back to the program X/Y,
    /// never at the reservoir. A rapid that positions itself skips the
    /// travel unless the pen was down, in which case the program Z has to
    /// be restored where the stroke stopped.
    fn pickup_decision(state: &MachineState, next: &Instruction, reason: PickupReason) -> Decision {
        let position = *state.position();
        let travels_itself = next.is_rapid() && next.target().is_some_and(|t| t.has_xy());
        let sets_z = next.target().is_some_and(|t| t.z.is_some());

        let restore_z = if sets_z || (travels_itself && !state.is_drawing()) {
            None
        } else {
            position.z
        };
        let travel = if travels_itself && restore_z.is_none() {
            None
        } else {
            position.planar()
        };

        let resume_at = match travel {
            Some((x, y)) => PartialPosition {
                x: Some(x),
                y: Some(y),
                z: restore_z,
            },
            None => PartialPosition::new(),
        };

        if resume_at.is_empty() {
            Decision::InsertPickup {
                at: position,
                reason,
            }
        } else {
            Decision::InsertPickupAndResume { resume_at, reason }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ColorProfile;
    use brushograph_core::Position;
    use brushograph_gcode::parse_line;

    fn resolver() -> ColorResolver {
        let profile = |name: &str| ColorProfile::new(name, Position::default(), vec![], vec![]);
        ColorResolver::new()
            .with_profile(profile("Green"))
            .with_profile(profile("Blue"))
            .with_alias("C00", "Green")
            .unwrap()
    }

    fn line(text: &str) -> Instruction {
        parse_line(text, 1).unwrap()
    }

    fn state_after(lines: &[&str]) -> MachineState {
        let mut state = MachineState::new();
        for text in lines {
            state.apply(&line(text));
        }
        state
    }

    /// State that has drawn `distance` mm along X with the pen down
    fn drawing(distance: f64) -> MachineState {
        let mut state = state_after(&[";Layer Green", "G0 X0 Y0 Z0"]);
        state.apply(&line("G1 X1 Y0"));
        state.reset_distance();
        state.apply(&line(&format!("G1 X{} Y0", 1.0 + distance)));
        state
    }

    fn decide(state: &MachineState, next: &str) -> Decision {
        InsertionPolicy::default()
            .decide(state, &line(next), &resolver())
            .unwrap()
    }

    #[test]
    fn test_wash_on_paint_change() {
        let state = state_after(&[";Layer Green"]);
        assert_eq!(
            decide(&state, ";Layer Blue"),
            Decision::InsertWash {
                from: "Green".to_string(),
                to: "Blue".to_string()
            }
        );
    }

    #[test]
    fn test_no_wash_between_aliases_or_first_layer() {
        assert_eq!(decide(&state_after(&[";Layer Green"]), ";Layer C00"), Decision::NoAction);
        assert_eq!(decide(&MachineState::new(), ";Layer Green"), Decision::NoAction);
    }

    #[test]
    fn test_unknown_marker_color_fails() {
        let err = InsertionPolicy::default()
            .decide(&MachineState::new(), &line(";Layer Purple"), &resolver())
            .unwrap_err();
        assert!(matches!(err, ProfileError::UnknownColor { .. }));
    }

    #[test]
    fn test_layer_start_pickup_before_first_draw() {
        let state = state_after(&[";Layer Green", "G0 X5 Y5 Z5"]);
        assert_eq!(decide(&state_after(&[";Layer Green"]), "G0 X5 Y5 Z5"), Decision::NoAction);
        assert_eq!(
            decide(&state, "G1 Z0"),
            Decision::InsertPickupAndResume {
                resume_at: PartialPosition::xy(5.0, 5.0),
                reason: PickupReason::LayerStart,
            }
        );
    }

    #[test]
    fn test_layer_start_without_known_position() {
        let state = state_after(&[";Layer Green"]);
        assert_eq!(
            decide(&state, "G1 X1 Y1"),
            Decision::InsertPickup {
                at: PartialPosition::new(),
                reason: PickupReason::LayerStart,
            }
        );
    }

    #[test]
    fn test_threshold_waits_for_clean_point() {
        let state = drawing(150.0);
        assert_eq!(decide(&state, "G1 X160 Y0"), Decision::NoAction);
        assert_eq!(
            decide(&state, "G0 Z10"),
            Decision::InsertPickupAndResume {
                resume_at: PartialPosition::xy(151.0, 0.0),
                reason: PickupReason::Threshold,
            }
        );
        assert_eq!(
            decide(&state, "G0 X0 Y50"),
            Decision::InsertPickupAndResume {
                resume_at: PartialPosition::xyz(151.0, 0.0, 0.0),
                reason: PickupReason::Threshold,
            }
        );
    }

    #[test]
    fn test_rapid_after_lift_positions_itself() {
        let mut state = drawing(150.0);
        state.apply(&line("G1 Z5"));
        assert_eq!(
            decide(&state, "G0 X0 Y50"),
            Decision::InsertPickup {
                at: PartialPosition::xyz(151.0, 0.0, 5.0),
                reason: PickupReason::Threshold,
            }
        );
    }

    #[test]
    fn test_z_is_never_restored_without_travel() {
        for next in ["G0 X0 Y50", "G0 Z10", "G1 X160 Y0", "G1 Z5"] {
            for distance in [150.0, 250.0] {
                match decide(&drawing(distance), next) {
                    Decision::InsertPickupAndResume { resume_at, .. } => {
                        if resume_at.z.is_some() {
                            assert!(resume_at.has_xy(), "{}: {:?}", next, resume_at);
                        }
                    }
                    Decision::InsertPickup { .. } | Decision::NoAction => {}
                    other => panic!("unexpected {:?}", other),
                }
            }
        }
    }

    #[test]
    fn test_threshold_is_strict() {
        assert_eq!(decide(&drawing(100.0), "G0 Z10"), Decision::NoAction);
    }

    #[test]
    fn test_forced_pickup_mid_stroke() {
        let state = drawing(200.0);
        assert_eq!(
            decide(&state, "G1 X210 Y0"),
            Decision::InsertPickupAndResume {
                resume_at: PartialPosition::xyz(201.0, 0.0, 0.0),
                reason: PickupReason::Forced,
            }
        );
        assert_eq!(decide(&drawing(199.0), "G1 X210 Y0"), Decision::NoAction);
    }

    #[test]
    fn test_aggressive_accepts_any_boundary() {
        let policy = InsertionPolicy::new(PolicyConfig {
            aggressive: true,
            ..Default::default()
        });
        let decision = policy
            .decide(&drawing(101.0), &line("G1 X110 Y0"), &resolver())
            .unwrap();
        assert_eq!(decision.pickup_reason(), Some(PickupReason::Aggressive));
    }

    #[test]
    fn test_no_pickup_without_color() {
        let mut state = state_after(&["G0 X0 Y0 Z0"]);
        state.apply(&line("G1 X150 Y0"));
        let policy = InsertionPolicy::default();
        let next = line("G0 Z10");
        assert_eq!(decide(&state, "G0 Z10"), Decision::NoAction);
        assert!(policy.wants_pickup_without_color(&state, &next));
    }

    #[test]
    fn test_comments_are_not_boundaries() {
        assert_eq!(decide(&drawing(500.0), "; note"), Decision::NoAction);
        assert_eq!(decide(&drawing(500.0), "G1 F800"), Decision::NoAction);
    }
}
