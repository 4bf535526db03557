//! Configuration management
//!
//! Configuration can be loaded from JSON or TOML files. Every section has
//! defaults, so a file only needs to name what it changes. A loaded
//! configuration is validated before use, and converted into the
//! optimizer's [`RewriteOptions`] and [`ColorResolver`].

use std::collections::BTreeMap;
use std::f64::consts::{PI, TAU};
use std::path::Path;

use brushograph_core::{PartialPosition, Position};
use brushograph_gcode::{parse_sequence, Instruction};
use brushograph_optimizer::{
    ColorProfile, ColorResolver, MachineMotion, PolicyConfig, RewriteOptions,
};
use serde::{Deserialize, Serialize};

use crate::defaults;
use crate::error::{SettingsError, SettingsResult};

/// Insertion policy and run mode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerSettings {
    /// Distance drawn before a pickup is wanted (mm)
    pub distance_threshold: f64,
    /// Multiple of the threshold at which a stroke is interrupted
    pub force_multiplier: f64,
    /// Take a pickup at any motion boundary past the threshold
    pub aggressive: bool,
    /// Log every decision
    pub debug: bool,
    /// Produce the report without writing a program
    pub analyze_only: bool,
}

impl Default for OptimizerSettings {
    fn default() -> Self {
        let policy = PolicyConfig::default();
        Self {
            distance_threshold: policy.distance_threshold,
            force_multiplier: policy.force_multiplier,
            aggressive: policy.aggressive,
            debug: false,
            analyze_only: false,
        }
    }
}

impl OptimizerSettings {
    /// Policy thresholds for the rewriter
    pub fn policy(&self) -> PolicyConfig {
        PolicyConfig {
            distance_threshold: self.distance_threshold,
            force_multiplier: self.force_multiplier,
            aggressive: self.aggressive,
        }
    }
}

/// Heights and feed rates of generated moves
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineSettings {
    /// Height for lifts (mm)
    pub safe_z: f64,
    /// Feed rate of travel moves
    pub travel_feed_rate: f64,
    /// Feed rate of lift and lower moves
    pub z_feed_rate: f64,
    /// Depth generated pickups dip to (mm)
    pub dip_z: f64,
}

impl Default for MachineSettings {
    fn default() -> Self {
        let motion = MachineMotion::default();
        Self {
            safe_z: motion.safe_z,
            travel_feed_rate: motion.travel_feed_rate,
            z_feed_rate: motion.z_feed_rate,
            dip_z: 0.0,
        }
    }
}

impl MachineSettings {
    /// Motion parameters for the rewriter
    pub fn motion(&self) -> MachineMotion {
        MachineMotion {
            safe_z: self.safe_z,
            travel_feed_rate: self.travel_feed_rate,
            z_feed_rate: self.z_feed_rate,
        }
    }
}

/// Fixed G-code routines, one line per entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequenceSettings {
    /// Emitted before the program
    pub header: Vec<String>,
    /// Emitted after the program
    pub footer: Vec<String>,
    /// Rinse routine for colors without their own
    pub wash: Vec<String>,
}

impl Default for SequenceSettings {
    fn default() -> Self {
        Self {
            header: defaults::header(),
            footer: defaults::footer(),
            wash: defaults::wash(),
        }
    }
}

/// Ellipse stirred inside a reservoir
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StirSettings {
    /// Half-width along X (mm)
    pub radius_x: f64,
    /// Half-height along Y (mm)
    pub radius_y: f64,
    /// Number of straight segments per turn
    pub segments: usize,
}

/// One point of a rim wipe
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WipePoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    /// Feed rate of the move to this point
    pub feed_rate: f64,
}

/// Brush dragged over the reservoir rim after stirring
///
/// The brush is raised to `lift_z` first, then runs through `points` in
/// order. The pickup's final lift to the safe height follows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WipeSettings {
    pub lift_z: f64,
    pub lift_feed_rate: f64,
    pub points: Vec<WipePoint>,
}

/// Pickup copied from another color and shifted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeriveSettings {
    /// Color to copy
    pub from: String,
    /// X offset (mm)
    pub dx: f64,
    /// Y offset (mm)
    #[serde(default)]
    pub dy: f64,
}

/// One `;Layer <Name>` color
///
/// A color either has its own pickup (explicit lines, or generated from
/// `position` and `stir`), copies another color's with `derive`, or is
/// another name for a color with `alias_of`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ColorSettings {
    /// Reservoir coordinate `[x, y]`
    #[serde(default)]
    pub position: [f64; 2],
    /// Marker name sharing this color's paint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias_of: Option<String>,
    /// Explicit pickup lines
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pickup: Option<Vec<String>>,
    /// Rinse lines replacing the global wash
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wash: Option<Vec<String>>,
    /// Stir when generating the pickup
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stir: Option<StirSettings>,
    /// Wipe on the rim at the end of a generated pickup
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wipe: Option<WipeSettings>,
    /// Copy the pickup of another color
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub derive: Option<DeriveSettings>,
}

impl ColorSettings {
    /// A color that shares `target`'s paint
    pub fn alias_of(target: impl Into<String>) -> Self {
        Self {
            alias_of: Some(target.into()),
            ..Default::default()
        }
    }

    fn is_base(&self) -> bool {
        self.alias_of.is_none() && self.derive.is_none()
    }
}

/// Complete configuration
///
/// Aggregates all sections and provides file I/O operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Insertion policy
    pub optimizer: OptimizerSettings,
    /// Generated moves
    pub machine: MachineSettings,
    /// Header, footer and wash routines
    pub sequences: SequenceSettings,
    /// Colors by marker name; replaces the default table when present
    pub colors: BTreeMap<String, ColorSettings>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            optimizer: OptimizerSettings::default(),
            machine: MachineSettings::default(),
            sequences: SequenceSettings::default(),
            colors: defaults::colors(),
        }
    }
}

impl Config {
    /// Create new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load config from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let format = Format::of(path)?;
        let content = std::fs::read_to_string(path)?;

        let config: Self = match format {
            Format::Json => serde_json::from_str(&content)?,
            Format::Toml => toml::from_str(&content)?,
        };

        config.validate()?;
        tracing::debug!(
            "Loaded config from {} ({} colors)",
            path.display(),
            config.colors.len()
        );
        Ok(config)
    }

    /// Save config to file (JSON or TOML)
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;

        let content = match Format::of(path)? {
            Format::Json => serde_json::to_string_pretty(self)?,
            Format::Toml => toml::to_string_pretty(self)?,
        };

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> SettingsResult<()> {
        let optimizer = &self.optimizer;
        if !positive(optimizer.distance_threshold) {
            return Err(SettingsError::invalid(
                "optimizer.distance_threshold",
                "must be > 0",
            ));
        }
        if optimizer.force_multiplier.is_nan() || optimizer.force_multiplier < 1.0 {
            return Err(SettingsError::invalid(
                "optimizer.force_multiplier",
                "must be >= 1",
            ));
        }

        let machine = &self.machine;
        if !positive(machine.travel_feed_rate) {
            return Err(SettingsError::invalid(
                "machine.travel_feed_rate",
                "must be > 0",
            ));
        }
        if !positive(machine.z_feed_rate) {
            return Err(SettingsError::invalid("machine.z_feed_rate", "must be > 0"));
        }
        if machine.safe_z.is_nan() || machine.safe_z <= machine.dip_z {
            return Err(SettingsError::invalid(
                "machine.safe_z",
                "must be above machine.dip_z",
            ));
        }

        Self::sequence("sequences.header", &self.sequences.header)?;
        Self::sequence("sequences.footer", &self.sequences.footer)?;
        Self::sequence("sequences.wash", &self.sequences.wash)?;

        for (name, color) in &self.colors {
            self.validate_color(name, color)?;
        }
        Ok(())
    }

    fn validate_color(&self, name: &str, color: &ColorSettings) -> SettingsResult<()> {
        let key = |field: &str| format!("colors.{}.{}", name, field);

        if let Some(target) = &color.alias_of {
            if color.pickup.is_some()
                || color.stir.is_some()
                || color.wipe.is_some()
                || color.derive.is_some()
            {
                return Err(SettingsError::invalid(
                    key("alias_of"),
                    "an alias cannot have its own pickup",
                ));
            }
            self.base_color(target)
                .map_err(|reason| SettingsError::invalid(key("alias_of"), reason))?;
        }

        if let Some(derive) = &color.derive {
            if color.pickup.is_some() || color.stir.is_some() || color.wipe.is_some() {
                return Err(SettingsError::invalid(
                    key("derive"),
                    "a derived color cannot have its own pickup",
                ));
            }
            self.base_color(&derive.from)
                .map_err(|reason| SettingsError::invalid(key("derive.from"), reason))?;
        }

        if let Some(stir) = &color.stir {
            if !positive(stir.radius_x) || !positive(stir.radius_y) {
                return Err(SettingsError::invalid(key("stir"), "radii must be > 0"));
            }
            if stir.segments < 3 {
                return Err(SettingsError::invalid(
                    key("stir.segments"),
                    "must be at least 3",
                ));
            }
        }

        if let Some(wipe) = &color.wipe {
            if !wipe.lift_z.is_finite() || !positive(wipe.lift_feed_rate) {
                return Err(SettingsError::invalid(
                    key("wipe"),
                    "lift height must be finite and its feed rate > 0",
                ));
            }
            if wipe.points.is_empty() {
                return Err(SettingsError::invalid(key("wipe.points"), "must not be empty"));
            }
            let bad = wipe.points.iter().any(|p| {
                !(p.x.is_finite() && p.y.is_finite() && p.z.is_finite()) || !positive(p.feed_rate)
            });
            if bad {
                return Err(SettingsError::invalid(
                    key("wipe.points"),
                    "coordinates must be finite and feed rates > 0",
                ));
            }
        }

        if let Some(pickup) = &color.pickup {
            Self::sequence(&key("pickup"), pickup)?;
        }
        if let Some(wash) = &color.wash {
            Self::sequence(&key("wash"), wash)?;
        }
        Ok(())
    }

    /// Check that `name` is a configured color with its own pickup
    fn base_color(&self, name: &str) -> Result<&ColorSettings, String> {
        match self.colors.get(name) {
            None => Err(format!("'{}' is not a configured color", name)),
            Some(color) if !color.is_base() => {
                Err(format!("'{}' is itself an alias or derived color", name))
            }
            Some(color) => Ok(color),
        }
    }

    fn sequence(key: &str, lines: &[String]) -> SettingsResult<Vec<Instruction>> {
        parse_sequence(lines).map_err(|source| SettingsError::Sequence {
            key: key.to_string(),
            source,
        })
    }

    /// Options for a rewrite pass
    pub fn rewrite_options(&self) -> SettingsResult<RewriteOptions> {
        Ok(RewriteOptions {
            policy: self.optimizer.policy(),
            motion: self.machine.motion(),
            header: Self::sequence("sequences.header", &self.sequences.header)?,
            footer: Self::sequence("sequences.footer", &self.sequences.footer)?,
            debug: self.optimizer.debug,
            analyze_only: self.optimizer.analyze_only,
        })
    }

    /// Build the color table
    ///
    /// Colors with their own pickup are built first, derived colors copy
    /// them, and aliases are registered last.
    pub fn color_resolver(&self) -> SettingsResult<ColorResolver> {
        let global_wash = Self::sequence("sequences.wash", &self.sequences.wash)?;
        let mut profiles: BTreeMap<&str, ColorProfile> = BTreeMap::new();

        for (name, color) in self.colors.iter().filter(|(_, c)| c.is_base()) {
            let at = Position::new(color.position[0], color.position[1], self.machine.dip_z);
            let pickup = match &color.pickup {
                Some(lines) => Self::sequence(&format!("colors.{}.pickup", name), lines)?,
                None => {
                    self.generated_pickup(name, at, color.stir.as_ref(), color.wipe.as_ref())
                }
            };
            let wash = self.color_wash(name, color, &global_wash)?;
            profiles.insert(name.as_str(), ColorProfile::new(name.as_str(), at, pickup, wash));
        }

        let mut derived = Vec::new();
        for (name, color) in &self.colors {
            let Some(derive) = &color.derive else {
                continue;
            };
            let source = profiles.get(derive.from.as_str()).ok_or_else(|| {
                SettingsError::invalid(
                    format!("colors.{}.derive.from", name),
                    format!("'{}' is not a color with its own pickup", derive.from),
                )
            })?;
            let mut pickup = vec![Instruction::comment(format!(" {} pickup", name))];
            pickup.extend(
                source
                    .pickup
                    .iter()
                    .filter(|i| i.is_motion() || matches!(i, Instruction::Other(_)))
                    .cloned()
                    .map(|i| i.translated(derive.dx, derive.dy)),
            );
            let wash = self.color_wash(name, color, &global_wash)?;
            derived.push(ColorProfile::new(
                name.as_str(),
                source.pickup_at.translated(derive.dx, derive.dy),
                pickup,
                wash,
            ));
        }

        let mut resolver = profiles
            .into_values()
            .chain(derived)
            .fold(ColorResolver::new(), ColorResolver::with_profile);
        for (name, color) in &self.colors {
            if let Some(target) = &color.alias_of {
                resolver = resolver.with_alias(name.as_str(), target)?;
            }
        }

        tracing::debug!(
            "Color table: {} profiles, {} aliases",
            resolver.len(),
            resolver.aliases().count()
        );
        Ok(resolver)
    }

    fn color_wash(
        &self,
        name: &str,
        color: &ColorSettings,
        global_wash: &[Instruction],
    ) -> SettingsResult<Vec<Instruction>> {
        match &color.wash {
            Some(lines) => Self::sequence(&format!("colors.{}.wash", name), lines),
            None => Ok(global_wash.to_vec()),
        }
    }

    /// Dip into the reservoir at `at`, stirring and wiping if configured, and lift
    fn generated_pickup(
        &self,
        name: &str,
        at: Position,
        stir: Option<&StirSettings>,
        wipe: Option<&WipeSettings>,
    ) -> Vec<Instruction> {
        let machine = &self.machine;
        let lift = Instruction::draw(PartialPosition::z_only(machine.safe_z))
            .with_feed_rate(machine.z_feed_rate);
        let dip = Instruction::draw(PartialPosition::z_only(machine.dip_z))
            .with_feed_rate(machine.z_feed_rate);

        let mut block = vec![
            Instruction::comment(format!(" {} pickup", name)),
            lift.clone(),
        ];
        match stir {
            None => {
                block.push(
                    Instruction::rapid(PartialPosition::xy(at.x, at.y))
                        .with_feed_rate(machine.travel_feed_rate),
                );
                block.push(dip);
            }
            Some(stir) => {
                let point = |angle: f64| {
                    PartialPosition::xy(
                        at.x + stir.radius_x * angle.cos(),
                        at.y + stir.radius_y * angle.sin(),
                    )
                };
                block.push(Instruction::rapid(point(PI)).with_feed_rate(machine.travel_feed_rate));
                block.push(dip);
                for step in 1..=stir.segments {
                    let angle = PI + TAU * step as f64 / stir.segments as f64;
                    block.push(
                        Instruction::draw(point(angle)).with_feed_rate(machine.travel_feed_rate),
                    );
                }
            }
        }
        if let Some(wipe) = wipe {
            block.push(
                Instruction::draw(PartialPosition::z_only(wipe.lift_z))
                    .with_feed_rate(wipe.lift_feed_rate),
            );
            block.extend(wipe.points.iter().map(|p| {
                Instruction::draw(PartialPosition::xyz(p.x, p.y, p.z)).with_feed_rate(p.feed_rate)
            }));
        }
        block.push(lift);
        block
    }
}

fn positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

enum Format {
    Json,
    Toml,
}

impl Format {
    fn of(path: &Path) -> SettingsResult<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Ok(Self::Json),
            Some("toml") => Ok(Self::Toml),
            other => Err(SettingsError::UnsupportedFormat(
                other.unwrap_or_default().to_string(),
            )),
        }
    }
}
