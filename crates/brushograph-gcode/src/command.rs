//! G-Code instruction types
//!
//! One [`Instruction`] per line of the stream. Instructions are values:
//! the builder methods consume and return a new instruction, so
//! rewriting never mutates a parsed line in place.

use brushograph_core::PartialPosition;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

fn path_regex() -> &'static Regex {
    static PATH_REGEX: OnceLock<Regex> = OnceLock::new();
    PATH_REGEX.get_or_init(|| Regex::new(r"^\s*Path\s+(\d+)").expect("invalid regex pattern"))
}

/// Classification of a G-code line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InstructionKind {
    /// G0 rapid positioning move
    RapidMove,
    /// G1 linear move, the brush is painting
    DrawMove,
    /// Anything else, passed through verbatim
    Other,
    /// `;` comment line
    Comment,
    /// `;Layer <Name>` comment announcing a color
    LayerMarker,
}

impl fmt::Display for InstructionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RapidMove => write!(f, "RapidMove"),
            Self::DrawMove => write!(f, "DrawMove"),
            Self::Other => write!(f, "Other"),
            Self::Comment => write!(f, "Comment"),
            Self::LayerMarker => write!(f, "LayerMarker"),
        }
    }
}

/// A parameter word other than X/Y/Z/F (e.g. `S800`)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Word {
    /// Upper-case word letter
    pub letter: char,
    /// Numeric value
    pub value: f64,
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.letter, format_number(self.value))
    }
}

/// Parameters of a G0/G1 move
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Motion {
    /// Target axes; unspecified axes keep the machine's previous value
    pub target: PartialPosition,
    /// Feed rate (F word)
    pub feed_rate: Option<f64>,
    /// Other parameter words, in source order
    pub extra_words: Vec<Word>,
    /// Inline comment text (after `;`), trimmed
    pub comment: Option<String>,
}

impl Motion {
    /// Create a motion towards `target`
    pub fn new(target: PartialPosition) -> Self {
        Self {
            target,
            ..Default::default()
        }
    }

    /// Return this motion with the given feed rate
    pub fn with_feed_rate(mut self, feed_rate: f64) -> Self {
        self.feed_rate = Some(feed_rate);
        self
    }

    /// Return this motion with the given inline comment
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// True when the line would say nothing to the machine
    pub fn is_empty(&self) -> bool {
        self.target.is_empty() && self.feed_rate.is_none() && self.extra_words.is_empty()
    }
}

/// A single line of G-code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Instruction {
    /// G0 move
    Rapid(Motion),
    /// G1 move
    Draw(Motion),
    /// Comment line; holds the text after `;` verbatim
    Comment(String),
    /// `;Layer <Name>` line
    LayerMarker {
        /// Color name taken from the marker
        color: String,
        /// Full comment text after `;`
        text: String,
    },
    /// Unrecognized or blank line, kept verbatim
    Other(String),
}

impl Instruction {
    /// Rapid move to `target`
    pub fn rapid(target: PartialPosition) -> Self {
        Self::Rapid(Motion::new(target))
    }

    /// Draw move to `target`
    pub fn draw(target: PartialPosition) -> Self {
        Self::Draw(Motion::new(target))
    }

    /// Comment line with `text` after the `;`
    pub fn comment(text: impl Into<String>) -> Self {
        Self::Comment(text.into())
    }

    /// Layer marker for `color`
    pub fn layer_marker(color: impl Into<String>) -> Self {
        let color = color.into();
        Self::LayerMarker {
            text: format!("Layer {}", color),
            color,
        }
    }

    /// Classification of this instruction
    pub fn kind(&self) -> InstructionKind {
        match self {
            Self::Rapid(_) => InstructionKind::RapidMove,
            Self::Draw(_) => InstructionKind::DrawMove,
            Self::Comment(_) => InstructionKind::Comment,
            Self::LayerMarker { .. } => InstructionKind::LayerMarker,
            Self::Other(_) => InstructionKind::Other,
        }
    }

    /// Motion parameters for G0/G1 lines
    pub fn motion(&self) -> Option<&Motion> {
        match self {
            Self::Rapid(m) | Self::Draw(m) => Some(m),
            _ => None,
        }
    }

    /// Target axes for G0/G1 lines
    pub fn target(&self) -> Option<&PartialPosition> {
        self.motion().map(|m| &m.target)
    }

    /// Whether this is a G0 or G1 line
    pub fn is_motion(&self) -> bool {
        self.motion().is_some()
    }

    /// Whether this is a G0 line
    pub fn is_rapid(&self) -> bool {
        matches!(self, Self::Rapid(_))
    }

    /// Whether this is a G1 line
    pub fn is_draw(&self) -> bool {
        matches!(self, Self::Draw(_))
    }

    /// Color named by a layer marker
    pub fn layer_color(&self) -> Option<&str> {
        match self {
            Self::LayerMarker { color, .. } => Some(color),
            _ => None,
        }
    }

    /// Number of a `; Path <n>` comment
    pub fn path_label(&self) -> Option<&str> {
        match self {
            Self::Comment(text) => path_regex()
                .captures(text)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str()),
            _ => None,
        }
    }

    /// Replace the motion parameters, keeping the move kind
    pub fn with_motion(self, motion: Motion) -> Self {
        match self {
            Self::Rapid(_) => Self::Rapid(motion),
            Self::Draw(_) => Self::Draw(motion),
            other => other,
        }
    }

    /// Return a move with its feed rate set; other lines are returned unchanged
    pub fn with_feed_rate(self, feed_rate: f64) -> Self {
        match self {
            Self::Rapid(m) => Self::Rapid(m.with_feed_rate(feed_rate)),
            Self::Draw(m) => Self::Draw(m.with_feed_rate(feed_rate)),
            other => other,
        }
    }

    /// Return a move with an inline comment; other lines are returned unchanged
    pub fn with_comment(self, comment: impl Into<String>) -> Self {
        match self {
            Self::Rapid(m) => Self::Rapid(m.with_comment(comment)),
            Self::Draw(m) => Self::Draw(m.with_comment(comment)),
            other => other,
        }
    }

    /// Return a move shifted in the XY plane; other lines are returned unchanged
    pub fn translated(self, dx: f64, dy: f64) -> Self {
        match self {
            Self::Rapid(mut m) => {
                m.target = m.target.translated(dx, dy);
                Self::Rapid(m)
            }
            Self::Draw(mut m) => {
                m.target = m.target.translated(dx, dy);
                Self::Draw(m)
            }
            other => other,
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (code, motion) = match self {
            Self::Rapid(m) => ("G0", m),
            Self::Draw(m) => ("G1", m),
            Self::Comment(text) | Self::LayerMarker { text, .. } => {
                return write!(f, ";{}", text);
            }
            Self::Other(raw) => return write!(f, "{}", raw),
        };

        write!(f, "{}", code)?;
        for (letter, value) in [
            ('X', motion.target.x),
            ('Y', motion.target.y),
            ('Z', motion.target.z),
        ] {
            if let Some(v) = value {
                write!(f, " {}{}", letter, format_number(v))?;
            }
        }
        for word in &motion.extra_words {
            write!(f, " {}", word)?;
        }
        if let Some(feed) = motion.feed_rate {
            write!(f, " F{}", format_number(feed))?;
        }
        if let Some(comment) = &motion.comment {
            write!(f, " ; {}", comment)?;
        }
        Ok(())
    }
}

/// Render a number with at most 4 decimals and no trailing zeros
///
/// Every G0/G1 line of a rewritten program is rendered through here, so
/// source coordinates finer than 0.1 µm come out rounded. Lines the parser
/// keeps verbatim (comments, other commands) are not touched.
pub fn format_number(value: f64) -> String {
    let fixed = format!("{:.4}", value);
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    match trimmed {
        "-0" | "" => "0".to_string(),
        s => s.to_string(),
    }
}

/// Numeric equality at output precision
pub(crate) fn same_value(a: f64, b: f64) -> bool {
    format_number(a) == format_number(b)
}
