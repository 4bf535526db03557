//! Brushograph Settings Crate
//!
//! Configuration file model (JSON or TOML), the brush machine's default
//! sequences and colors, and conversion into rewrite options and the
//! color table used by the optimizer.

pub mod config;
pub mod defaults;
pub mod error;

pub use config::{
    ColorSettings, Config, DeriveSettings, MachineSettings, OptimizerSettings, SequenceSettings,
    StirSettings, WipePoint, WipeSettings,
};
pub use error::{SettingsError, SettingsResult};
