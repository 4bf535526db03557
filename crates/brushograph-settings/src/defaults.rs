//! Defaults for the brush machine
//!
//! Reservoirs sit along the front edge of the bed: green stirred around
//! (45, 8) and wiped on the rim towards (24, 12), blue one reservoir to
//! the right, red at the edge with room for
//! a dip only. The rinse pot is at (5, 5) and the park position at
//! (20, 110).

use std::collections::BTreeMap;

use crate::{ColorSettings, DeriveSettings, StirSettings, WipePoint, WipeSettings};

/// Clearance move and feed rate at program start
pub const HEADER: &[&str] = &[
    "G0 Z10 F500 ; Move to clearance level",
    "G1 F1200 ; Set feed rate",
];

/// Rinse routine run between two paints
pub const WASH: &[&str] = &[
    "; Washing sequence",
    "G1 Z10 F1000 ; Raise brush to safe height",
    "G0 X5 Y5 F1200 ; Rapid move to brush cleaning position",
    "G1 Z-1 F800 ; Lower brush for cleaning",
    "G1 X10 Y12 Z8 F1200",
    "G1 Z-1 F800",
    "G1 X25 Y14 Z6 F800 ; Move across cleaning area",
    "G1 Z8 F800",
    "G0 X5 Y5 F1200",
    "G1 Z-1 F800",
    "G1 X15 Y12 Z8 F1200",
    "G1 Z-1 F800",
    "G1 X25 Y14 Z6 F800",
    "G1 Z10 F800",
    "G1 F1200",
];

/// Parking position and program end, run after the final wash
pub const PARK: &[&str] = &[
    "G0 X20 Y110 Z10 F500 ; Move to parking position",
    "M2 ; End program",
];

/// Dip-only pickup for the edge reservoir
pub const RED_PICKUP: &[&str] = &[
    "; Red pickup",
    "G1 Z10 F500 ; Raise brush to safe height",
    "G0 X124 Y12 F1200 ; Rapid move to red reservoir",
    "G1 Z0 F500 ; Lower into color",
    "G1 Z7 F800 ; Raise from color",
    "G1 X119 Y12 Z1 F1200 ; Wipe along the rim",
    "G1 X114 Y15 Z8 F500",
    "G1 F1200",
];

pub(crate) fn lines(sequence: &[&str]) -> Vec<String> {
    sequence.iter().map(|line| line.to_string()).collect()
}

/// Default program header
pub fn header() -> Vec<String> {
    lines(HEADER)
}

/// Default rinse routine
pub fn wash() -> Vec<String> {
    lines(WASH)
}

/// Default footer: a last rinse, then park
pub fn footer() -> Vec<String> {
    let mut footer = vec!["; Final wash and park".to_string()];
    footer.extend(lines(&WASH[1..]));
    footer.extend(lines(PARK));
    footer
}

/// Default color table
pub fn colors() -> BTreeMap<String, ColorSettings> {
    let mut colors = BTreeMap::new();
    colors.insert(
        "Green".to_string(),
        ColorSettings {
            position: [45.0, 8.0],
            stir: Some(StirSettings {
                radius_x: 5.0,
                radius_y: 3.5,
                segments: 64,
            }),
            wipe: Some(WipeSettings {
                lift_z: 7.0,
                lift_feed_rate: 800.0,
                points: vec![
                    WipePoint {
                        x: 34.0,
                        y: 8.0,
                        z: 1.0,
                        feed_rate: 1200.0,
                    },
                    WipePoint {
                        x: 24.0,
                        y: 12.0,
                        z: 8.0,
                        feed_rate: 500.0,
                    },
                ],
            }),
            ..Default::default()
        },
    );
    colors.insert(
        "Blue".to_string(),
        ColorSettings {
            position: [90.0, 8.0],
            derive: Some(DeriveSettings {
                from: "Green".to_string(),
                dx: 45.0,
                dy: 0.0,
            }),
            ..Default::default()
        },
    );
    colors.insert(
        "Red".to_string(),
        ColorSettings {
            position: [124.0, 12.0],
            pickup: Some(lines(RED_PICKUP)),
            ..Default::default()
        },
    );
    colors.insert("C00".to_string(), ColorSettings::alias_of("Green"));
    colors.insert("C03".to_string(), ColorSettings::alias_of("Red"));
    colors
}
