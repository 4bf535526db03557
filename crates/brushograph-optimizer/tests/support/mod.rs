//! Shared fixtures: a three-paint machine with recognisable blocks
#![allow(dead_code)]

use brushograph_core::Position;
use brushograph_gcode::{parse_sequence, Instruction};
use brushograph_optimizer::{ColorProfile, ColorResolver, RewriteOptions};

pub fn block(lines: &[&str]) -> Vec<Instruction> {
    parse_sequence(lines).unwrap()
}

fn profile(name: &str, x: f64, y: f64) -> ColorProfile {
    let comment = format!("; {}", name);
    let travel = format!("G0 X{} Y{} F1200", x, y);
    ColorProfile::new(
        name,
        Position::new(x, y, 0.0),
        block(&[&comment, &travel, "G1 Z0 F500", "G1 Z10 F500"]),
        block(&["; wash", "G0 X5 Y5 F1200"]),
    )
}

pub fn resolver() -> ColorResolver {
    ColorResolver::new()
        .with_profile(profile("Green", 41.0, 5.0))
        .with_profile(profile("Blue", 86.0, 5.0))
        .with_profile(profile("Red", 124.0, 12.0))
        .with_alias("C00", "Green")
        .unwrap()
        .with_alias("C03", "Red")
        .unwrap()
}

pub fn options() -> RewriteOptions {
    RewriteOptions {
        header: block(&["G0 Z10 F500", "G1 F1200"]),
        footer: block(&["G0 X20 Y110 Z10 F500", "M2"]),
        ..Default::default()
    }
}

/// A stroke along +X from the origin in `segments` steps of `step` mm
pub fn stroke(segments: usize, step: f64) -> Vec<String> {
    (1..=segments)
        .map(|i| format!("G1 X{} Y0", i as f64 * step))
        .collect()
}
