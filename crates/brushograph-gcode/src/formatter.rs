//! Output normalisation pipeline
//!
//! A [`Formatter`] runs a sequence of [`InstructionProcessor`] stages over
//! the whole instruction stream and renders the result as text. The
//! standard stages separate Z moves, elide redundant feed rates and drop
//! moves left with nothing to say. Formatting already formatted output is
//! a no-op.

use regex::Regex;
use std::sync::{Arc, OnceLock};

use brushograph_core::{GcodeError, PartialPosition};

use super::command::same_value;
use super::{parse_program, Instruction, Motion};

/// Trait for whole-stream instruction processors
///
/// Each stage sees the complete stream so it can carry modal state (last
/// emitted Z, last emitted feed rate) from line to line.
pub trait InstructionProcessor: Send + Sync {
    /// Get the name/identifier of this processor
    fn name(&self) -> &str;

    /// Get a description of what this processor does
    fn description(&self) -> &str;

    /// Transform the stream
    fn process(&self, instructions: Vec<Instruction>) -> Vec<Instruction>;

    /// Check if this processor is enabled
    fn is_enabled(&self) -> bool {
        true
    }
}

/// Arc-wrapped processor for thread-safe sharing
pub type ProcessorHandle = Arc<dyn InstructionProcessor>;

fn modal_reset_regex() -> &'static Regex {
    static MODAL_RESET_REGEX: OnceLock<Regex> = OnceLock::new();
    MODAL_RESET_REGEX.get_or_init(|| Regex::new(r"^[Gg]\s*\d").expect("invalid regex pattern"))
}

fn distance_mode_regex() -> &'static Regex {
    static DISTANCE_MODE_REGEX: OnceLock<Regex> = OnceLock::new();
    DISTANCE_MODE_REGEX.get_or_init(|| {
        Regex::new(r"(?i)\bG0*9([01])(?:[^0-9.]|$)").expect("invalid regex pattern")
    })
}

/// Whether a pass-through line may have changed modal state we track
fn resets_modal_state(instruction: &Instruction) -> bool {
    matches!(instruction, Instruction::Other(raw) if modal_reset_regex().is_match(raw))
}

/// `Some(true)` for G91, `Some(false)` for G90
fn relative_mode_change(instruction: &Instruction) -> Option<bool> {
    match instruction {
        Instruction::Other(raw) => distance_mode_regex()
            .captures(raw)
            .map(|caps| &caps[1] == "1"),
        _ => None,
    }
}

/// Keeps Z changes on their own lines and drops repeated Z values
///
/// A move combining X/Y with a new Z is split: a rising Z goes first so the
/// brush clears the paper before travelling, a falling Z goes after the
/// X/Y part. Moves in relative distance mode are left alone.
#[derive(Debug, Default)]
pub struct ZAxisProcessor;

impl ZAxisProcessor {
    /// Create a new Z axis processor
    pub fn new() -> Self {
        Self
    }
}

impl InstructionProcessor for ZAxisProcessor {
    fn name(&self) -> &str {
        "z_axis"
    }

    fn description(&self) -> &str {
        "Separates Z moves from X/Y moves and drops unchanged Z values"
    }

    fn process(&self, instructions: Vec<Instruction>) -> Vec<Instruction> {
        let mut output = Vec::with_capacity(instructions.len());
        let mut last_z: Option<f64> = None;
        let mut relative = false;

        for instruction in instructions {
            if let Some(mode) = relative_mode_change(&instruction) {
                relative = mode;
            }
            if resets_modal_state(&instruction) {
                last_z = None;
            }

            let Some(motion) = instruction.motion() else {
                output.push(instruction);
                continue;
            };
            if relative {
                output.push(instruction);
                continue;
            }
            let Some(z) = motion.target.z else {
                output.push(instruction);
                continue;
            };

            let mut motion = motion.clone();
            if last_z.is_some_and(|last| same_value(last, z)) {
                motion.target.z = None;
                output.push(instruction.with_motion(motion));
                continue;
            }

            let rising = last_z.map_or(true, |last| z > last);
            last_z = Some(z);

            if !motion.target.has_planar() {
                output.push(instruction.with_motion(motion));
                continue;
            }

            let mut z_motion = Motion::new(PartialPosition::z_only(z));
            z_motion.feed_rate = motion.feed_rate;
            motion.target.z = None;

            let z_move = instruction.clone().with_motion(z_motion);
            let planar_move = instruction.with_motion(motion);
            if rising {
                output.push(z_move);
                output.push(planar_move);
            } else {
                output.push(planar_move);
                output.push(z_move);
            }
        }

        output
    }
}

/// Omits F words that repeat the modal feed rate
#[derive(Debug, Default)]
pub struct FeedRateProcessor;

impl FeedRateProcessor {
    /// Create a new feed rate processor
    pub fn new() -> Self {
        Self
    }
}

impl InstructionProcessor for FeedRateProcessor {
    fn name(&self) -> &str {
        "feed_rate"
    }

    fn description(&self) -> &str {
        "Emits a feed rate only when it differs from the modal one"
    }

    fn process(&self, instructions: Vec<Instruction>) -> Vec<Instruction> {
        let mut last_feed: Option<f64> = None;

        instructions
            .into_iter()
            .map(|instruction| {
                if resets_modal_state(&instruction) {
                    last_feed = None;
                }
                let Some(feed) = instruction.motion().and_then(|m| m.feed_rate) else {
                    return instruction;
                };
                if last_feed.is_some_and(|last| same_value(last, feed)) {
                    let mut motion = instruction.motion().cloned().unwrap_or_default();
                    motion.feed_rate = None;
                    instruction.with_motion(motion)
                } else {
                    last_feed = Some(feed);
                    instruction
                }
            })
            .collect()
    }
}

/// Drops G0/G1 lines with no axes, feed rate or extra words
///
/// An inline comment on a dropped move is kept as a comment line.
#[derive(Debug, Default)]
pub struct EmptyMoveProcessor;

impl EmptyMoveProcessor {
    /// Create a new empty move processor
    pub fn new() -> Self {
        Self
    }
}

impl InstructionProcessor for EmptyMoveProcessor {
    fn name(&self) -> &str {
        "empty_move"
    }

    fn description(&self) -> &str {
        "Removes moves that carry no parameters"
    }

    fn process(&self, instructions: Vec<Instruction>) -> Vec<Instruction> {
        instructions
            .into_iter()
            .filter_map(|instruction| match instruction.motion() {
                Some(motion) if motion.is_empty() => motion
                    .comment
                    .as_ref()
                    .map(|comment| Instruction::comment(format!(" {}", comment))),
                _ => Some(instruction),
            })
            .collect()
    }
}

/// Instruction stream formatter
///
/// # Example
/// ```
/// use brushograph_gcode::Formatter;
///
/// let formatted = Formatter::default()
///     .format_str("G1 X1 Y1 Z2 F500\nG1 X2 Y2 F500")
///     .unwrap();
/// assert_eq!(formatted, "G1 Z2 F500\nG1 X1 Y1\nG1 X2 Y2\n");
/// ```
pub struct Formatter {
    processors: Vec<ProcessorHandle>,
}

impl Formatter {
    /// Create a formatter with no stages (render only)
    pub fn new() -> Self {
        Self {
            processors: Vec::new(),
        }
    }

    /// Create a formatter with the standard stages
    pub fn standard() -> Self {
        let mut formatter = Self::new();
        formatter
            .register(Arc::new(ZAxisProcessor::new()))
            .register(Arc::new(FeedRateProcessor::new()))
            .register(Arc::new(EmptyMoveProcessor::new()));
        formatter
    }

    /// Register a processor
    ///
    /// Processors are applied in the order they are registered.
    pub fn register(&mut self, processor: ProcessorHandle) -> &mut Self {
        self.processors.push(processor);
        self
    }

    /// Get the number of registered processors
    pub fn processor_count(&self) -> usize {
        self.processors.len()
    }

    /// List all registered processors as `(name, description, enabled)`
    pub fn list_processors(&self) -> Vec<(&str, &str, bool)> {
        self.processors
            .iter()
            .map(|p| (p.name(), p.description(), p.is_enabled()))
            .collect()
    }

    /// Run every enabled stage over the stream
    pub fn normalize(&self, instructions: Vec<Instruction>) -> Vec<Instruction> {
        self.processors
            .iter()
            .filter(|p| p.is_enabled())
            .fold(instructions, |stream, processor| {
                let before = stream.len();
                let stream = processor.process(stream);
                tracing::trace!(
                    "Processor '{}': {} -> {} lines",
                    processor.name(),
                    before,
                    stream.len()
                );
                stream
            })
    }

    /// Render instructions as text, one per line, with a trailing newline
    pub fn render(instructions: &[Instruction]) -> String {
        let mut text = String::new();
        for instruction in instructions {
            text.push_str(&instruction.to_string());
            text.push('\n');
        }
        text
    }

    /// Normalize and render
    pub fn format(&self, instructions: Vec<Instruction>) -> String {
        Self::render(&self.normalize(instructions))
    }

    /// Parse, normalize and render a program
    pub fn format_str(&self, text: &str) -> Result<String, GcodeError> {
        let instructions = parse_program(text)
            .map(|line| line.map(|parsed| parsed.instruction))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(self.format(instructions))
    }
}

impl Default for Formatter {
    fn default() -> Self {
        Self::standard()
    }
}
