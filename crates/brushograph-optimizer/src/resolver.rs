//! Layer/color resolver
//!
//! Read-only lookup table from the color names used in `;Layer <Name>`
//! markers to the paint profile to use. Aliases share a profile, so a
//! change between two aliases of the same paint needs no wash.

use std::collections::BTreeMap;

use brushograph_core::{Position, ProfileError};
use brushograph_gcode::Instruction;
use serde::{Deserialize, Serialize};

/// Pickup and wash routines for one paint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorProfile {
    /// Canonical color name
    pub name: String,
    /// Reservoir coordinate the pickup dips at
    pub pickup_at: Position,
    /// Instructions that load the brush with this paint
    pub pickup: Vec<Instruction>,
    /// Instructions that rinse this paint out of the brush
    pub wash: Vec<Instruction>,
}

impl ColorProfile {
    /// Create a profile
    pub fn new(
        name: impl Into<String>,
        pickup_at: Position,
        pickup: Vec<Instruction>,
        wash: Vec<Instruction>,
    ) -> Self {
        Self {
            name: name.into(),
            pickup_at,
            pickup,
            wash,
        }
    }
}

/// Color name → profile table
///
/// Built once, then shared read-only by any number of rewrite passes.
#[derive(Debug, Clone, Default)]
pub struct ColorResolver {
    profiles: BTreeMap<String, ColorProfile>,
    aliases: BTreeMap<String, String>,
}

impl ColorResolver {
    /// Create an empty resolver
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a profile, keyed by its name
    pub fn with_profile(mut self, profile: ColorProfile) -> Self {
        self.aliases.remove(&profile.name);
        self.profiles.insert(profile.name.clone(), profile);
        self
    }

    /// Make `alias` resolve to the profile named `target`
    pub fn with_alias(
        mut self,
        alias: impl Into<String>,
        target: &str,
    ) -> Result<Self, ProfileError> {
        let alias = alias.into();
        let canonical = self.canonical_name(target)?.to_string();
        if self.profiles.contains_key(&alias) {
            return Err(ProfileError::InvalidSequence {
                color: alias,
                reason: "alias shadows a configured color".to_string(),
            });
        }
        self.aliases.insert(alias, canonical);
        Ok(self)
    }

    /// Name of the profile `color` resolves to
    pub fn canonical_name<'a>(&'a self, color: &'a str) -> Result<&'a str, ProfileError> {
        if self.profiles.contains_key(color) {
            return Ok(color);
        }
        self.aliases
            .get(color)
            .map(String::as_str)
            .ok_or_else(|| ProfileError::UnknownColor {
                color: color.to_string(),
            })
    }

    /// Look up the profile for a marker color name
    pub fn resolve(&self, color: &str) -> Result<&ColorProfile, ProfileError> {
        let canonical = self.canonical_name(color)?;
        self.profiles
            .get(canonical)
            .ok_or_else(|| ProfileError::UnknownColor {
                color: color.to_string(),
            })
    }

    /// Whether two marker names share a paint
    pub fn same_paint(&self, a: &str, b: &str) -> Result<bool, ProfileError> {
        Ok(self.canonical_name(a)? == self.canonical_name(b)?)
    }

    /// Whether `color` resolves
    pub fn contains(&self, color: &str) -> bool {
        self.canonical_name(color).is_ok()
    }

    /// Canonical profile names
    pub fn colors(&self) -> impl Iterator<Item = &str> {
        self.profiles.keys().map(String::as_str)
    }

    /// Alias → canonical name pairs
    pub fn aliases(&self) -> impl Iterator<Item = (&str, &str)> {
        self.aliases.iter().map(|(a, c)| (a.as_str(), c.as_str()))
    }

    /// Number of profiles
    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    /// Whether no profile is configured
    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brushograph_core::PartialPosition;

    fn profile(name: &str, x: f64) -> ColorProfile {
        ColorProfile::new(
            name,
            Position::new(x, 5.0, 0.0),
            vec![Instruction::rapid(PartialPosition::xy(x, 5.0))],
            vec![],
        )
    }

    fn resolver() -> ColorResolver {
        ColorResolver::new()
            .with_profile(profile("Green", 41.0))
            .with_profile(profile("Red", 124.0))
            .with_alias("C03", "Red")
            .unwrap()
    }

    #[test]
    fn test_resolve_known_and_alias() {
        let resolver = resolver();
        assert_eq!(resolver.resolve("Green").unwrap().name, "Green");
        assert_eq!(resolver.resolve("C03").unwrap().name, "Red");
        assert!(resolver.same_paint("Red", "C03").unwrap());
        assert!(!resolver.same_paint("Red", "Green").unwrap());
    }

    #[test]
    fn test_unknown_color_fails() {
        let err = resolver().resolve("Purple").unwrap_err();
        assert_eq!(
            err,
            ProfileError::UnknownColor {
                color: "Purple".to_string()
            }
        );
    }

    #[test]
    fn test_names_are_case_sensitive() {
        assert!(!resolver().contains("green"));
    }

    #[test]
    fn test_alias_chains_resolve_to_canonical() {
        let resolver = resolver().with_alias("Crimson", "C03").unwrap();
        assert_eq!(resolver.canonical_name("Crimson").unwrap(), "Red");
    }

    #[test]
    fn test_alias_to_unknown_rejected() {
        assert!(ColorResolver::new().with_alias("C00", "Green").is_err());
    }

    #[test]
    fn test_alias_cannot_shadow_profile() {
        assert!(resolver().with_alias("Green", "Red").is_err());
    }
}
