//! Raster S→Z conversion
//!
//! Laser-style raster output switches the beam with `S0` / `S<power>`
//! words. For a brush the same job is done by lifting the tool, so inside
//! a scan section every transition to `S0` inserts a relative lift of
//! `z_up` and the next positive `S` lowers the brush again. The program is
//! treated as text; lines are only rewritten where an option asks for it.

use regex::Regex;
use std::sync::OnceLock;

use super::format_number;

fn power_regex() -> &'static Regex {
    static POWER_REGEX: OnceLock<Regex> = OnceLock::new();
    POWER_REGEX.get_or_init(|| {
        Regex::new(r"(?i)S\s*(-?\d+(?:\.\d+)?)").expect("invalid regex pattern")
    })
}

fn feed_regex() -> &'static Regex {
    static FEED_REGEX: OnceLock<Regex> = OnceLock::new();
    FEED_REGEX.get_or_init(|| {
        Regex::new(r"(?i)F\s*[-+]?\d+(?:\.\d+)?").expect("invalid regex pattern")
    })
}

fn scan_start_regex() -> &'static Regex {
    static SCAN_START_REGEX: OnceLock<Regex> = OnceLock::new();
    SCAN_START_REGEX.get_or_init(|| {
        Regex::new(r"(?i)\bScan\b").expect("invalid regex pattern")
    })
}

fn scan_end_regex() -> &'static Regex {
    static SCAN_END_REGEX: OnceLock<Regex> = OnceLock::new();
    SCAN_END_REGEX.get_or_init(|| {
        Regex::new(r"(?i)\b(Offset|Cut)\b").expect("invalid regex pattern")
    })
}

fn scan_feed_regex() -> &'static Regex {
    static SCAN_FEED_REGEX: OnceLock<Regex> = OnceLock::new();
    SCAN_FEED_REGEX.get_or_init(|| {
        Regex::new(r"(?i);\s*Scan\s*@\s*(\d+(?:\.\d+)?)\s*mm\s*/?\s*min")
            .expect("invalid regex pattern")
    })
}

/// Number of leading lines searched for a `;Scan @ <n> mm/min` header
const SCAN_FEED_SEARCH_LINES: usize = 50;

/// Options for [`RasterZConverter`]
#[derive(Debug, Clone, PartialEq)]
pub struct RasterZOptions {
    /// Relative lift applied on `S0` (mm)
    pub z_up: f64,
    /// Feed rate appended to the inserted Z moves
    pub z_feed: Option<f64>,
    /// Emit the Z moves as G0 (otherwise G1)
    pub use_rapid: bool,
    /// Keep S words in the output
    pub keep_power_words: bool,
    /// Replace every F word with this feed rate; detected from the header
    /// when unset
    pub scan_feed: Option<f64>,
}

impl Default for RasterZOptions {
    fn default() -> Self {
        Self {
            z_up: 5.0,
            z_feed: Some(500.0),
            use_rapid: true,
            keep_power_words: true,
            scan_feed: None,
        }
    }
}

/// Result of a raster conversion
#[derive(Debug, Clone, PartialEq)]
pub struct RasterConversion {
    /// Converted program text
    pub gcode: String,
    /// Number of lifts inserted
    pub lifts: usize,
    /// Number of lowers inserted
    pub lowers: usize,
    /// Feed rate substituted for F words, if any
    pub scan_feed: Option<f64>,
}

/// Converts laser power switching into brush lifts
#[derive(Debug, Clone, Default)]
pub struct RasterZConverter {
    options: RasterZOptions,
}

impl RasterZConverter {
    /// Create a converter with the given options
    pub fn new(options: RasterZOptions) -> Self {
        Self { options }
    }

    /// Get the converter options
    pub fn options(&self) -> &RasterZOptions {
        &self.options
    }

    /// Convert a whole program
    pub fn convert(&self, text: &str) -> RasterConversion {
        let scan_feed = self.options.scan_feed.or_else(|| detect_scan_feed(text));
        let mut output = String::with_capacity(text.len());
        let mut in_scan = false;
        let mut raised = false;
        let mut lifts = 0;
        let mut lowers = 0;

        for line in text.lines() {
            let trimmed = line.trim_start();
            if trimmed.starts_with(';') {
                if scan_start_regex().is_match(trimmed) {
                    in_scan = true;
                    raised = false;
                }
                if scan_end_regex().is_match(trimmed) {
                    in_scan = false;
                    raised = false;
                }
            }

            if in_scan {
                match power_value(trimmed) {
                    Some(power) if power == 0.0 && !raised => {
                        output.push_str(&self.z_move(self.options.z_up));
                        output.push('\n');
                        raised = true;
                        lifts += 1;
                    }
                    Some(power) if power > 0.0 && raised => {
                        output.push_str(&self.z_move(-self.options.z_up));
                        output.push('\n');
                        raised = false;
                        lowers += 1;
                    }
                    _ => {}
                }
            }

            output.push_str(&self.rewrite_line(line, scan_feed));
            output.push('\n');
        }

        tracing::info!(
            "Raster conversion inserted {} lifts and {} lowers",
            lifts,
            lowers
        );

        RasterConversion {
            gcode: output,
            lifts,
            lowers,
            scan_feed,
        }
    }

    fn z_move(&self, dz: f64) -> String {
        let code = if self.options.use_rapid { "G0" } else { "G1" };
        match self.options.z_feed {
            Some(feed) => format!("{} Z{} F{}", code, format_number(dz), format_number(feed)),
            None => format!("{} Z{}", code, format_number(dz)),
        }
    }

    fn rewrite_line(&self, line: &str, scan_feed: Option<f64>) -> String {
        let (code, comment) = match line.find(';') {
            Some(pos) => line.split_at(pos),
            None => (line, ""),
        };

        let mut code = code.to_string();
        if !self.options.keep_power_words {
            code = power_regex().replace_all(&code, "").into_owned();
        }
        if let Some(feed) = scan_feed {
            let replacement = format!("F{}", format_number(feed));
            code = feed_regex()
                .replace_all(&code, replacement.as_str())
                .into_owned();
        }
        code + comment
    }
}

/// Numeric S value in the code part of a line
fn power_value(line: &str) -> Option<f64> {
    let code = line.split(';').next().unwrap_or_default();
    power_regex()
        .captures(code)
        .and_then(|caps| caps[1].parse().ok())
}

/// Look for a `;Scan @ <n> mm/min` header in the leading lines
pub fn detect_scan_feed(text: &str) -> Option<f64> {
    text.lines()
        .take(SCAN_FEED_SEARCH_LINES)
        .find_map(|line| scan_feed_regex().captures(line))
        .and_then(|caps| caps[1].parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    const RASTER: &str = "\
;Scan @ 3000 mm/min
G0 X0 Y0
G1 X1 S900 F2000
G1 X2 S0
G1 X3 S0
G1 X4 S900
;Offset
G1 X5 S0
";

    #[test]
    fn test_detect_scan_feed() {
        assert_eq!(detect_scan_feed(RASTER), Some(3000.0));
        assert_eq!(detect_scan_feed("G0 X0\n; Scan @ 12.5 mm / min"), Some(12.5));
        assert_eq!(detect_scan_feed("G0 X0"), None);
    }

    #[test]
    fn test_detect_scan_feed_only_searches_header() {
        let mut text = "G0 X0\n".repeat(SCAN_FEED_SEARCH_LINES);
        text.push_str(";Scan @ 100 mm/min\n");
        assert_eq!(detect_scan_feed(&text), None);
    }

    #[test]
    fn test_lift_and_lower_inside_scan_section() {
        let converter = RasterZConverter::new(RasterZOptions {
            scan_feed: Some(2500.0),
            ..Default::default()
        });
        let result = converter.convert(RASTER);
        assert_eq!(result.lifts, 1);
        assert_eq!(result.lowers, 1);
        assert_eq!(
            result.gcode,
            "\
;Scan @ 3000 mm/min
G0 X0 Y0
G1 X1 S900 F2500
G0 Z5 F500
G1 X2 S0
G1 X3 S0
G0 Z-5 F500
G1 X4 S900
;Offset
G1 X5 S0
"
        );
    }

    #[test]
    fn test_remove_power_words_and_detected_feed() {
        let converter = RasterZConverter::new(RasterZOptions {
            keep_power_words: false,
            use_rapid: false,
            z_feed: None,
            ..Default::default()
        });
        let result = converter.convert(RASTER);
        assert_eq!(result.scan_feed, Some(3000.0));
        assert!(result.gcode.contains("G1 X1  F3000\n"));
        assert!(result.gcode.contains("G1 Z5\n"));
        assert!(result.gcode.contains("G1 Z-5\n"));
        assert!(!result.gcode.contains("S0"));
    }

    #[test]
    fn test_comment_text_untouched() {
        let converter = RasterZConverter::new(RasterZOptions {
            keep_power_words: false,
            scan_feed: Some(10.0),
            ..Default::default()
        });
        let result = converter.convert("G1 X1 F20 ; S0 F99");
        assert_eq!(result.gcode, "G1 X1 F10 ; S0 F99\n");
    }
}
