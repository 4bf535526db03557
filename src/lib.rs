//! # Brushograph
//!
//! Rewrites G-code produced for a pen plotter so a brush-painting machine
//! can run it:
//! - Paint pickups at layer starts and whenever the brush has drawn too far
//! - A wash between different paints
//! - A return to the interrupted stroke after a pickup
//! - Z and feed rate normalisation of the result
//!
//! ## Architecture
//!
//! Brushograph is organized as a workspace with multiple crates:
//!
//! 1. **brushograph-core** - Positions and error types
//! 2. **brushograph-gcode** - Instruction model, parser, formatter, raster S→Z converter
//! 3. **brushograph-optimizer** - Pickup/wash insertion engine and its log
//! 4. **brushograph-settings** - Configuration files and machine defaults
//! 5. **brushograph** - Command-line binary that integrates all crates

pub use brushograph_core::{Error, GcodeError, PartialPosition, Position, ProfileError, Result};

pub use brushograph_gcode::{
    detect_scan_feed, parse_line, parse_program, parse_sequence, Formatter, Instruction,
    InstructionKind, RasterConversion, RasterZConverter, RasterZOptions,
};

pub use brushograph_optimizer::{
    ColorProfile, ColorResolver, Decision, LogEntry, PickupReason, PolicyConfig, RewriteError,
    RewriteLog, RewriteOptions, RewriteOutput, RewriteSummary, RewriteWarning, Rewriter,
};

pub use brushograph_settings::{Config, SettingsError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging
///
/// Sets up structured logging on stderr with:
/// - RUST_LOG environment variable support
/// - `info` as the default level, `debug` when `debug` is set
/// - JSON lines instead of human-readable output when `json` is set
pub fn init_logging(debug: bool, json: bool) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let level = if debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    let env_filter = EnvFilter::from_default_env().add_directive(level.into());

    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()?;
    } else {
        registry
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false)
                    .with_level(true),
            )
            .try_init()?;
    }

    Ok(())
}
