use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;

use brushograph::{
    init_logging, Config, RasterZConverter, RasterZOptions, RewriteLog, RewriteSummary, Rewriter,
    BUILD_DATE, VERSION,
};

#[derive(Parser)]
#[command(name = "brushograph")]
#[command(
    author,
    version,
    about = "Prepare plotter G-code for a brush-painting machine"
)]
struct Cli {
    /// Emit log events as JSON lines
    #[arg(long, global = true)]
    log_json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Insert paint pickups, washes and stroke resumes
    Optimize {
        /// Input G-code file
        input: PathBuf,
        /// Output file (default: `<input stem>_optimized.gcode`)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Distance drawn before a pickup is wanted (mm)
        #[arg(short = 'd', long = "distance")]
        distance_threshold: Option<f64>,
        /// Multiple of the distance at which a stroke is interrupted
        #[arg(short = 'f', long = "force-multiplier", visible_alias = "force")]
        force_multiplier: Option<f64>,
        /// Take a pickup at any motion boundary past the distance
        #[arg(long)]
        aggressive: bool,
        /// Log every decision
        #[arg(long)]
        debug: bool,
        /// Only report, do not write a program
        #[arg(long)]
        analyze: bool,
        /// Configuration file (.json or .toml)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Write the decision log and summary as JSON
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Turn laser S0/S<power> switching into brush lifts
    RasterZ {
        /// Input G-code file
        input: PathBuf,
        /// Output file
        output: PathBuf,
        /// Relative lift on S0 (mm)
        #[arg(long, default_value_t = 5.0)]
        z_up: f64,
        /// Feed rate for the inserted Z moves
        #[arg(long, default_value_t = 500.0)]
        z_feed: f64,
        /// Emit the Z moves as G1 instead of G0
        #[arg(long)]
        use_g1: bool,
        /// Feed rate forced on every move (default: from the `;Scan @` header)
        #[arg(long)]
        scan_feed: Option<f64>,
        /// Strip S words from the output
        #[arg(long)]
        remove_s: bool,
    },
}

#[derive(Serialize)]
struct Report<'a> {
    input: &'a Path,
    summary: &'a RewriteSummary,
    log: &'a RewriteLog,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Optimize {
            input,
            output,
            distance_threshold,
            force_multiplier,
            aggressive,
            debug,
            analyze,
            config,
            report,
        } => {
            let mut config = match &config {
                Some(path) => Config::load_from_file(path)
                    .with_context(|| format!("Failed to load config {}", path.display()))?,
                None => Config::new(),
            };
            if let Some(distance) = distance_threshold {
                config.optimizer.distance_threshold = distance;
            }
            if let Some(multiplier) = force_multiplier {
                config.optimizer.force_multiplier = multiplier;
            }
            config.optimizer.aggressive |= aggressive;
            config.optimizer.debug |= debug;
            config.optimizer.analyze_only |= analyze;
            config.validate().context("Invalid optimizer settings")?;

            init_logging(config.optimizer.debug, cli.log_json)?;
            tracing::info!("brushograph {} (built {})", VERSION, BUILD_DATE);

            optimize(&config, &input, output, report.as_deref())
        }
        Commands::RasterZ {
            input,
            output,
            z_up,
            z_feed,
            use_g1,
            scan_feed,
            remove_s,
        } => {
            init_logging(false, cli.log_json)?;
            let options = RasterZOptions {
                z_up,
                z_feed: Some(z_feed),
                use_rapid: !use_g1,
                keep_power_words: !remove_s,
                scan_feed,
            };
            raster_z(options, &input, &output)
        }
    }
}

fn optimize(
    config: &Config,
    input: &Path,
    output: Option<PathBuf>,
    report: Option<&Path>,
) -> Result<()> {
    let text = std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let resolver = config.color_resolver().context("Invalid color table")?;
    let options = config.rewrite_options().context("Invalid sequences")?;

    tracing::info!(
        "Optimizing {} (threshold {} mm, force x{}{})",
        input.display(),
        config.optimizer.distance_threshold,
        config.optimizer.force_multiplier,
        if config.optimizer.aggressive {
            ", aggressive"
        } else {
            ""
        }
    );

    let result = Rewriter::new(options, &resolver)
        .rewrite(&text)
        .with_context(|| format!("Failed to optimize {}", input.display()))?;

    if let Some(gcode) = &result.gcode {
        let output = output.unwrap_or_else(|| default_output(input));
        std::fs::write(&output, gcode)
            .with_context(|| format!("Failed to write {}", output.display()))?;
        tracing::info!("Optimized G-code saved to {}", output.display());
    }

    if let Some(path) = report {
        let report = Report {
            input,
            summary: &result.summary,
            log: &result.log,
        };
        let json = serde_json::to_string_pretty(&report)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write report {}", path.display()))?;
        tracing::info!("Report saved to {}", path.display());
    }

    println!("{}", result.summary);
    for warning in result.log.warnings() {
        println!("Warning: {}", warning);
    }
    Ok(())
}

fn raster_z(options: RasterZOptions, input: &Path, output: &Path) -> Result<()> {
    let text = std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;

    let conversion = RasterZConverter::new(options).convert(&text);
    std::fs::write(output, &conversion.gcode)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    match conversion.scan_feed {
        Some(feed) => tracing::info!("Scan feed rate F{}", feed),
        None => tracing::info!("No scan feed rate; F words left as they are"),
    }
    println!(
        "Converted {}: {} lifts, {} lowers",
        input.display(),
        conversion.lifts,
        conversion.lowers
    );
    Ok(())
}

/// `<dir>/<stem>_optimized.gcode` next to the input
fn default_output(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    input.with_file_name(format!("{}_optimized.gcode", stem))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_output_name() {
        assert_eq!(
            default_output(Path::new("/tmp/art/portrait.gcode")),
            PathBuf::from("/tmp/art/portrait_optimized.gcode")
        );
        assert_eq!(
            default_output(Path::new("sketch.nc")),
            PathBuf::from("sketch_optimized.gcode")
        );
    }

    #[test]
    fn test_cli_parses_optimize() {
        let cli = Cli::parse_from([
            "brushograph",
            "optimize",
            "in.gcode",
            "-d",
            "80",
            "-f",
            "1.5",
            "--aggressive",
        ]);
        match cli.command {
            Commands::Optimize {
                distance_threshold,
                force_multiplier,
                aggressive,
                analyze,
                ..
            } => {
                assert_eq!(distance_threshold, Some(80.0));
                assert_eq!(force_multiplier, Some(1.5));
                assert!(aggressive);
                assert!(!analyze);
            }
            Commands::RasterZ { .. } => panic!("expected optimize"),
        }
    }

    #[test]
    fn test_cli_force_multiplier_long_names() {
        for flag in ["--force-multiplier", "--force"] {
            let cli = Cli::parse_from(["brushograph", "optimize", "in.gcode", flag, "2.5"]);
            match cli.command {
                Commands::Optimize {
                    force_multiplier, ..
                } => assert_eq!(force_multiplier, Some(2.5), "{}", flag),
                Commands::RasterZ { .. } => panic!("expected optimize"),
            }
        }
    }

    #[test]
    fn test_cli_parses_raster_z() {
        let cli = Cli::parse_from([
            "brushograph",
            "raster-z",
            "in.gcode",
            "out.gcode",
            "--z-up",
            "3",
            "--remove-s",
        ]);
        match cli.command {
            Commands::RasterZ {
                z_up,
                z_feed,
                remove_s,
                scan_feed,
                ..
            } => {
                assert_eq!(z_up, 3.0);
                assert_eq!(z_feed, 500.0);
                assert!(remove_s);
                assert_eq!(scan_feed, None);
            }
            Commands::Optimize { .. } => panic!("expected raster-z"),
        }
    }
}
