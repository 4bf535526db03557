//! The rewriting pass
//!
//! One forward pass over the input. For every line the policy is asked
//! what to insert, the maintenance block is emitted, the tracker is
//! advanced and the line itself follows. The header is emitted first, a
//! lift and the footer last, and the whole stream goes through the
//! [`Formatter`].

use brushograph_core::PartialPosition;
use brushograph_gcode::{parse_program, Formatter, Instruction, ParsedLine};
use serde::{Deserialize, Serialize};

use crate::{
    ColorResolver, Decision, InsertionPolicy, LogEntry, MachineState, PolicyConfig, RewriteError,
    RewriteLog, RewriteSummary, RewriteWarning,
};

/// Machine moves used by synthesized instructions
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MachineMotion {
    /// Height for lifts (mm)
    pub safe_z: f64,
    /// Feed rate of the resume travel move
    pub travel_feed_rate: f64,
    /// Feed rate of lift and lower moves
    pub z_feed_rate: f64,
}

impl Default for MachineMotion {
    fn default() -> Self {
        Self {
            safe_z: 10.0,
            travel_feed_rate: 1200.0,
            z_feed_rate: 1000.0,
        }
    }
}

/// Options of a rewrite pass
#[derive(Debug, Clone, Default)]
pub struct RewriteOptions {
    /// Insertion thresholds
    pub policy: PolicyConfig,
    /// Lift and resume moves
    pub motion: MachineMotion,
    /// Emitted before the program
    pub header: Vec<Instruction>,
    /// Emitted after the final lift
    pub footer: Vec<Instruction>,
    /// Log every decision at debug level
    pub debug: bool,
    /// Only produce the log
    pub analyze_only: bool,
}

/// Result of a rewrite pass
#[derive(Debug, Clone)]
pub struct RewriteOutput {
    /// Rewritten program; `None` in analyze mode
    pub gcode: Option<String>,
    /// Decision log
    pub log: RewriteLog,
    /// Statistics
    pub summary: RewriteSummary,
}

/// Paint pickup and wash inserter
///
/// # Example
/// ```
/// use brushograph_core::Position;
/// use brushograph_gcode::{parse_sequence, Instruction};
/// use brushograph_optimizer::{ColorProfile, ColorResolver, RewriteOptions, Rewriter};
///
/// let pickup = parse_sequence(["G0 X41 Y5", "G1 Z0", "G1 Z10"]).unwrap();
/// let resolver = ColorResolver::new().with_profile(ColorProfile::new(
///     "Green",
///     Position::new(41.0, 5.0, 0.0),
///     pickup,
///     vec![],
/// ));
/// let rewriter = Rewriter::new(RewriteOptions::default(), &resolver);
/// let output = rewriter.rewrite(";Layer Green\nG0 X0 Y0\nG1 X5 Y0").unwrap();
/// assert_eq!(output.log.pickup_count(), 1);
/// ```
pub struct Rewriter<'a> {
    options: RewriteOptions,
    resolver: &'a ColorResolver,
    policy: InsertionPolicy,
    formatter: Formatter,
}

impl<'a> Rewriter<'a> {
    /// Create a rewriter over a shared color table
    pub fn new(options: RewriteOptions, resolver: &'a ColorResolver) -> Self {
        Self {
            policy: InsertionPolicy::new(options.policy),
            formatter: Formatter::standard(),
            options,
            resolver,
        }
    }

    /// Get the rewrite options
    pub fn options(&self) -> &RewriteOptions {
        &self.options
    }

    /// Rewrite a program; honours `analyze_only`
    pub fn rewrite(&self, input: &str) -> Result<RewriteOutput, RewriteError> {
        self.run(input, self.options.analyze_only)
    }

    /// Run the pass for its log only
    pub fn analyze(&self, input: &str) -> Result<RewriteOutput, RewriteError> {
        self.run(input, true)
    }

    fn run(&self, input: &str, analyze_only: bool) -> Result<RewriteOutput, RewriteError> {
        let mut state = MachineState::new();
        let mut log = RewriteLog::new();
        let mut summary = RewriteSummary::new();
        let mut output = self.options.header.clone();
        let mut warned_without_color = false;
        let mut path: Option<String> = None;

        for parsed in parse_program(input) {
            let ParsedLine {
                line_number,
                instruction,
            } = parsed?;
            summary.total_lines += 1;

            let decision = self
                .policy
                .decide(&state, &instruction, self.resolver)
                .map_err(|err| RewriteError::from_profile(err, line_number))?;
            let distance_at_decision = state.drawn_distance();

            if !warned_without_color
                && self.policy.wants_pickup_without_color(&state, &instruction)
            {
                warned_without_color = true;
                let warning = RewriteWarning::DrawWithoutColor { line_number };
                tracing::warn!("{}", warning);
                log.warn(warning);
            }
            if let Some(change) = state.draw_z_change(&instruction) {
                let warning = RewriteWarning::UnexpectedZDuringDraw {
                    line_number,
                    from_z: change.from,
                    to_z: change.to,
                };
                tracing::warn!("{}", warning);
                log.warn(warning);
            }

            self.insert(&decision, &mut state, &mut summary, &mut output)
                .map_err(|err| RewriteError::from_profile(err, line_number))?;

            if self.options.debug {
                tracing::debug!(
                    "Line {}: {} (drawn {:.2} mm) {}",
                    line_number,
                    decision,
                    distance_at_decision,
                    instruction
                );
            }

            let accumulated_distance = state.drawn_distance();
            let was_drawing = state.is_drawing();
            let drawn = state.apply(&instruction);
            if let Some(label) = instruction.path_label() {
                summary.open_path(label);
                path = Some(label.to_string());
            }
            Self::count(&mut summary, &instruction, was_drawing, &state, drawn);
            if let Some(path) = &path {
                if drawn > 0.0 {
                    summary.add_path_length(path, drawn);
                }
            }

            log.record(LogEntry {
                line_number,
                decision,
                distance_at_decision,
                accumulated_distance,
                segment_distance: drawn,
            });

            output.push(Self::with_modal_feed(instruction, &state));
        }

        output.push(self.lift());
        output.extend(self.options.footer.iter().cloned());

        tracing::info!(
            "Rewrite finished: {} lines, {:.2} mm painted, {} pickups, {} washes",
            summary.total_lines,
            summary.total_length,
            summary.total_pickups(),
            summary.washes
        );

        let gcode = (!analyze_only).then(|| self.formatter.format(output));
        Ok(RewriteOutput {
            gcode,
            log,
            summary,
        })
    }

    /// Emit the maintenance block for a decision
    fn insert(
        &self,
        decision: &Decision,
        state: &mut MachineState,
        summary: &mut RewriteSummary,
        output: &mut Vec<Instruction>,
    ) -> Result<(), brushograph_core::ProfileError> {
        match decision {
            Decision::NoAction => {}
            Decision::InsertWash { from, to } => {
                tracing::info!("Washing for color change: {} -> {}", from, to);
                let profile = self.resolver.resolve(from)?;
                if state.is_drawing() {
                    output.push(self.lift());
                }
                output.extend(profile.wash.iter().cloned());
                summary.record_wash();
            }
            Decision::InsertPickup { reason, .. }
            | Decision::InsertPickupAndResume { reason, .. } => {
                let Some(layer) = state.color().map(str::to_string) else {
                    return Ok(());
                };
                let profile = self.resolver.resolve(&layer)?;
                tracing::info!(
                    "Adding {} pickup ({}) after {:.2} mm",
                    profile.name,
                    reason,
                    state.drawn_distance()
                );
                if state.is_drawing() {
                    output.push(self.lift());
                }
                output.extend(profile.pickup.iter().cloned());
                if let Decision::InsertPickupAndResume { resume_at, .. } = decision {
                    output.extend(self.resume(resume_at));
                }
                summary.record_pickup(&layer, &profile.name, state.drawn_distance());
                state.reset_distance();
            }
        }
        Ok(())
    }

    /// Raise the brush to the safe height
    fn lift(&self) -> Instruction {
        Instruction::draw(PartialPosition::z_only(self.options.motion.safe_z))
            .with_feed_rate(self.options.motion.z_feed_rate)
    }

    /// Travel back to the program position, then lower to its Z
    fn resume(&self, resume_at: &PartialPosition) -> Vec<Instruction> {
        let motion = &self.options.motion;
        let mut block = vec![Instruction::comment(" Return to drawing position")];
        if let Some((x, y)) = resume_at.planar() {
            block.push(
                Instruction::rapid(PartialPosition::xy(x, y))
                    .with_feed_rate(motion.travel_feed_rate),
            );
        }
        if let Some(z) = resume_at.z {
            block.push(
                Instruction::draw(PartialPosition::z_only(z)).with_feed_rate(motion.z_feed_rate),
            );
        }
        block
    }

    /// Restate the modal input feed rate on an input draw move
    ///
    /// Inserted blocks change the modal feed rate; the formatter drops the
    /// restatement again where nothing was inserted.
    fn with_modal_feed(instruction: Instruction, state: &MachineState) -> Instruction {
        let needs_feed = match &instruction {
            Instruction::Draw(m) => m.feed_rate.is_none() && !m.target.is_empty(),
            _ => false,
        };
        match state.feed_rate() {
            Some(feed) if needs_feed => instruction.with_feed_rate(feed),
            _ => instruction,
        }
    }

    fn count(
        summary: &mut RewriteSummary,
        instruction: &Instruction,
        was_drawing: bool,
        state: &MachineState,
        drawn: f64,
    ) {
        match instruction {
            Instruction::Rapid(_) => summary.rapid_moves += 1,
            Instruction::Draw(_) => summary.draw_moves += 1,
            Instruction::LayerMarker { color, .. } => {
                tracing::info!("Layer {}", color);
                summary.open_layer(color);
            }
            _ => {}
        }
        if instruction.target().is_some_and(|t| t.z.is_some()) {
            summary.z_moves += 1;
        }
        if !was_drawing && state.is_drawing() {
            summary.strokes += 1;
        }
        summary.add_length(state.color(), drawn);
    }
}
