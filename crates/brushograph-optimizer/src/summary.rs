//! Rewrite statistics

use serde::{Deserialize, Serialize};
use std::fmt;

/// Distance painted between two pickups
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PickupSegment {
    /// Layer name as written in the marker
    pub layer: String,
    /// Canonical paint name
    pub color: String,
    /// Distance drawn since the previous pickup (mm)
    pub distance: f64,
}

/// Totals gathered during a pass
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RewriteSummary {
    /// Input lines read
    pub total_lines: usize,
    /// G0 lines
    pub rapid_moves: usize,
    /// G1 lines
    pub draw_moves: usize,
    /// Moves that set Z
    pub z_moves: usize,
    /// Continuous painted strokes
    pub strokes: usize,
    /// Total painted length (mm)
    pub total_length: f64,
    /// Painted length per layer, in first-seen order
    pub layer_lengths: Vec<(String, f64)>,
    /// Painted length per `; Path <n>` section, in first-seen order
    #[serde(default)]
    pub path_lengths: Vec<(String, f64)>,
    /// Pickups per canonical paint, in first-seen order
    pub pickups_per_color: Vec<(String, usize)>,
    /// Washes inserted
    pub washes: usize,
    /// Segments between pickups
    pub pickup_segments: Vec<PickupSegment>,
}

impl RewriteSummary {
    /// Create an empty summary
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `layer` known so it is listed even if nothing is painted in it
    pub fn open_layer(&mut self, layer: &str) {
        if !self.layer_lengths.iter().any(|(name, _)| name == layer) {
            self.layer_lengths.push((layer.to_string(), 0.0));
        }
    }

    /// Add painted length to a layer
    pub fn add_length(&mut self, layer: Option<&str>, distance: f64) {
        self.total_length += distance;
        if let Some(layer) = layer {
            self.open_layer(layer);
            if let Some((_, length)) = self.layer_lengths.iter_mut().find(|(n, _)| n == layer) {
                *length += distance;
            }
        }
    }

    /// Make path `path` known; a repeated label keeps adding to its total
    pub fn open_path(&mut self, path: &str) {
        if !self.path_lengths.iter().any(|(name, _)| name == path) {
            self.path_lengths.push((path.to_string(), 0.0));
        }
    }

    /// Add painted length to a path section
    pub fn add_path_length(&mut self, path: &str, distance: f64) {
        self.open_path(path);
        if let Some((_, length)) = self.path_lengths.iter_mut().find(|(n, _)| n == path) {
            *length += distance;
        }
    }

    /// Painted length of one path section
    pub fn path_length(&self, path: &str) -> Option<f64> {
        self.path_lengths
            .iter()
            .find(|(name, _)| name == path)
            .map(|(_, length)| *length)
    }

    /// Count a pickup and close the current segment
    pub fn record_pickup(&mut self, layer: &str, color: &str, distance: f64) {
        match self.pickups_per_color.iter_mut().find(|(c, _)| c == color) {
            Some((_, count)) => *count += 1,
            None => self.pickups_per_color.push((color.to_string(), 1)),
        }
        self.pickup_segments.push(PickupSegment {
            layer: layer.to_string(),
            color: color.to_string(),
            distance,
        });
    }

    /// Count a wash
    pub fn record_wash(&mut self) {
        self.washes += 1;
    }

    /// Painted length of one layer
    pub fn layer_length(&self, layer: &str) -> Option<f64> {
        self.layer_lengths
            .iter()
            .find(|(name, _)| name == layer)
            .map(|(_, length)| *length)
    }

    /// Pickups of one canonical paint
    pub fn pickups_for(&self, color: &str) -> usize {
        self.pickups_per_color
            .iter()
            .find(|(c, _)| c == color)
            .map_or(0, |(_, count)| *count)
    }

    /// Total pickups
    pub fn total_pickups(&self) -> usize {
        self.pickups_per_color.iter().map(|(_, count)| count).sum()
    }
}

impl fmt::Display for RewriteSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Total drawing path length: {:.2} mm ({:.2} meters)",
            self.total_length,
            self.total_length / 1000.0
        )?;
        writeln!(
            f,
            "Lines: {} ({} rapid, {} draw, {} Z), strokes: {}",
            self.total_lines, self.rapid_moves, self.draw_moves, self.z_moves, self.strokes
        )?;
        writeln!(f, "Layer lengths:")?;
        for (layer, length) in &self.layer_lengths {
            writeln!(f, "  Layer {}: {:.2} mm", layer, length)?;
        }
        if !self.path_lengths.is_empty() {
            writeln!(f, "Path lengths:")?;
            for (path, length) in &self.path_lengths {
                writeln!(f, "  Path {}: {:.2} mm", path, length)?;
            }
        }
        writeln!(f, "Path segments between pickups:")?;
        for segment in &self.pickup_segments {
            writeln!(
                f,
                "  Layer {}, color {}: {:.2} mm",
                segment.layer, segment.color, segment.distance
            )?;
        }
        writeln!(f, "Pickups:")?;
        for (color, count) in &self.pickups_per_color {
            writeln!(f, "  {}: {}", color, count)?;
        }
        write!(f, "Washes: {}", self.washes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layer_lengths_keep_first_seen_order() {
        let mut summary = RewriteSummary::new();
        summary.open_layer("Red");
        summary.add_length(Some("Green"), 10.0);
        summary.add_length(Some("Red"), 2.5);
        summary.add_length(None, 1.0);
        assert_eq!(
            summary.layer_lengths,
            vec![("Red".to_string(), 2.5), ("Green".to_string(), 10.0)]
        );
        assert!((summary.total_length - 13.5).abs() < 1e-12);
    }

    #[test]
    fn test_path_lengths_accumulate_per_label() {
        let mut summary = RewriteSummary::new();
        summary.open_path("2");
        summary.add_path_length("1", 4.0);
        summary.add_path_length("2", 1.5);
        summary.add_path_length("1", 0.5);
        assert_eq!(
            summary.path_lengths,
            vec![("2".to_string(), 1.5), ("1".to_string(), 4.5)]
        );
        assert_eq!(summary.path_length("3"), None);
        assert_eq!(summary.total_length, 0.0);
    }

    #[test]
    fn test_pickup_bookkeeping() {
        let mut summary = RewriteSummary::new();
        summary.record_pickup("Green", "Green", 0.0);
        summary.record_pickup("C00", "Green", 120.0);
        summary.record_pickup("Red", "Red", 0.0);
        assert_eq!(summary.pickups_for("Green"), 2);
        assert_eq!(summary.pickups_for("Blue"), 0);
        assert_eq!(summary.total_pickups(), 3);
        assert_eq!(summary.pickup_segments[1].distance, 120.0);
    }

    #[test]
    fn test_display_lists_sections() {
        let mut summary = RewriteSummary::new();
        summary.add_length(Some("Green"), 1500.0);
        summary.record_wash();
        let text = summary.to_string();
        assert!(text.starts_with("Total drawing path length: 1500.00 mm (1.50 meters)"));
        assert!(text.contains("  Layer Green: 1500.00 mm"));
        assert!(!text.contains("Path lengths:"));
        assert!(text.ends_with("Washes: 1"));

        summary.add_path_length("7", 12.345);
        let text = summary.to_string();
        assert!(text.contains("Path lengths:\n  Path 7: 12.35 mm\n"));
    }
}
