//! G-Code line parser
//!
//! Classifies each line of a program into an [`Instruction`]. Only G0 and
//! G1 lines are tokenised; everything else is kept verbatim. A malformed
//! parameter on a G0/G1 line is an error, never silently dropped.

use regex::Regex;
use std::sync::OnceLock;

use brushograph_core::GcodeError;

use super::{Instruction, Motion, Word};

fn motion_regex() -> &'static Regex {
    static MOTION_REGEX: OnceLock<Regex> = OnceLock::new();
    MOTION_REGEX.get_or_init(|| {
        Regex::new(r"^[Gg]0*[01](?:[^0-9.]|$)").expect("invalid regex pattern")
    })
}

fn layer_regex() -> &'static Regex {
    static LAYER_REGEX: OnceLock<Regex> = OnceLock::new();
    LAYER_REGEX.get_or_init(|| Regex::new(r"^;\s*Layer\s+(\w+)").expect("invalid regex pattern"))
}

/// A parsed line together with its 1-based source line number
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedLine {
    /// 1-based line number in the source text
    pub line_number: usize,
    /// The classified instruction
    pub instruction: Instruction,
}

/// Lazy line-by-line parser over a program text
///
/// Yields one item per source line, so a blank line still produces an
/// [`Instruction::Other`].
pub struct Program<'a> {
    lines: std::iter::Enumerate<std::str::Lines<'a>>,
}

impl Iterator for Program<'_> {
    type Item = Result<ParsedLine, GcodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        let (index, line) = self.lines.next()?;
        let line_number = index + 1;
        Some(parse_line(line, line_number).map(|instruction| ParsedLine {
            line_number,
            instruction,
        }))
    }
}

/// Parse a whole program lazily
pub fn parse_program(text: &str) -> Program<'_> {
    Program {
        lines: text.lines().enumerate(),
    }
}

/// Parse a snippet of G-code lines (e.g. a configured maintenance sequence)
pub fn parse_sequence<I, S>(lines: I) -> Result<Vec<Instruction>, GcodeError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    lines
        .into_iter()
        .enumerate()
        .map(|(index, line)| parse_line(line.as_ref(), index + 1))
        .collect()
}

/// Parse a single line of G-code
pub fn parse_line(line: &str, line_number: usize) -> Result<Instruction, GcodeError> {
    let line = line.trim();

    if let Some(text) = line.strip_prefix(';') {
        if let Some(caps) = layer_regex().captures(line) {
            return Ok(Instruction::LayerMarker {
                color: caps[1].to_string(),
                text: text.to_string(),
            });
        }
        return Ok(Instruction::Comment(text.to_string()));
    }

    if !motion_regex().is_match(line) {
        return Ok(Instruction::Other(line.to_string()));
    }

    let (code, comment) = split_comment(line);
    let words = tokenize(code, line_number)?;

    let mut words = words.into_iter();
    let rapid = match words.next() {
        Some(('G', value)) => value == 0.0,
        _ => {
            return Err(GcodeError::InvalidSyntax {
                line_number,
                reason: "expected G0 or G1".to_string(),
            })
        }
    };

    let mut motion = Motion {
        comment,
        ..Default::default()
    };

    for (letter, value) in words {
        match letter {
            'X' => set_axis(&mut motion.target.x, letter, value, line_number)?,
            'Y' => set_axis(&mut motion.target.y, letter, value, line_number)?,
            'Z' => set_axis(&mut motion.target.z, letter, value, line_number)?,
            'F' => {
                if value < 0.0 {
                    return Err(GcodeError::InvalidParameter {
                        line_number,
                        param: "F".to_string(),
                        reason: "feed rate cannot be negative".to_string(),
                    });
                }
                set_axis(&mut motion.feed_rate, letter, value, line_number)?
            }
            'G' | 'M' => {
                return Err(GcodeError::UnexpectedWord {
                    line_number,
                    word: format!("{}{}", letter, super::format_number(value)),
                })
            }
            _ => motion.extra_words.push(Word { letter, value }),
        }
    }

    Ok(if rapid {
        Instruction::Rapid(motion)
    } else {
        Instruction::Draw(motion)
    })
}

fn set_axis(
    slot: &mut Option<f64>,
    letter: char,
    value: f64,
    line_number: usize,
) -> Result<(), GcodeError> {
    if slot.is_some() {
        return Err(GcodeError::InvalidSyntax {
            line_number,
            reason: format!("duplicate {} word", letter),
        });
    }
    *slot = Some(value);
    Ok(())
}

/// Split `code ; comment` (or `code (comment)`) into its two halves
fn split_comment(line: &str) -> (&str, Option<String>) {
    match line.find([';', '(']) {
        Some(pos) => {
            let (code, rest) = line.split_at(pos);
            let text = rest.strip_prefix(';').unwrap_or(rest).trim();
            let comment = (!text.is_empty()).then(|| text.to_string());
            (code.trim_end(), comment)
        }
        None => (line, None),
    }
}

/// Split the code part of a line into `(letter, value)` words
///
/// Accepts glued words (`X1Y2Z0F1200`) and whitespace between a letter and
/// its number (`X 10`).
fn tokenize(code: &str, line_number: usize) -> Result<Vec<(char, f64)>, GcodeError> {
    let mut words = Vec::new();
    let mut chars = code.chars().peekable();

    while let Some(c) = chars.next() {
        if c.is_whitespace() {
            continue;
        }
        if !c.is_ascii_alphabetic() {
            return Err(GcodeError::InvalidSyntax {
                line_number,
                reason: format!("unexpected character '{}'", c),
            });
        }
        let letter = c.to_ascii_uppercase();

        while chars.peek().is_some_and(|c| c.is_whitespace()) {
            chars.next();
        }

        let mut number = String::new();
        while let Some(&c) = chars.peek() {
            if c.is_ascii_digit() || c == '.' || c == '-' || c == '+' {
                number.push(c);
                chars.next();
            } else {
                break;
            }
        }

        if number.is_empty() {
            return Err(GcodeError::InvalidParameter {
                line_number,
                param: letter.to_string(),
                reason: "missing value".to_string(),
            });
        }

        let value = number
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| GcodeError::InvalidParameter {
                line_number,
                param: letter.to_string(),
                reason: format!("'{}' is not a number", number),
            })?;

        words.push((letter, value));
    }

    Ok(words)
}
