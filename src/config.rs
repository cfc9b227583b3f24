//! Configuration management for the analyzer binaries.
//!
//! Handles:
//! - Command-line argument parsing
//! - Analysis config files and machine profile directories
//! - Layering everything into one [`AnalysisConfig`] per document

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};

use crate::analysis::AnalysisConfig;
use crate::machine::{BoundingBox3D, Units};
use crate::profile::{MachineProfile, MachineRegistry, ProfilePriority};

/// Options shared by every binary
#[derive(Debug, Clone, clap::Args)]
pub struct AnalysisArgs {
    /// Machine profile to check against (e.g. 'haas-vf2')
    #[arg(long, help = "Machine profile to use (e.g., 'haas-vf2', 'desktop-router')")]
    pub machine: Option<String>,

    /// Extra directory of machine profile TOML files
    #[arg(long, help = "Directory containing machine profile TOML files")]
    pub machine_dir: Option<PathBuf>,

    /// Analysis config file
    #[arg(long, value_name = "FILE", help = "TOML file with analysis settings")]
    pub config: Option<PathBuf>,

    #[arg(long, value_name = "MM", help = "Lowest Z for rapid XY moves")]
    pub safe_z: Option<f64>,

    #[arg(
        long,
        value_name = "LxWxH",
        value_parser = parse_stock,
        help = "Stock size in mm; origin at the top-left corner, Z0 on top"
    )]
    pub stock: Option<BoundingBox3D>,

    #[arg(long, value_name = "MM_PER_MIN", help = "Maximum machine feed")]
    pub max_feed: Option<f64>,

    #[arg(long, value_enum, help = "Units assumed when a file never selects G20/G21")]
    pub units: Option<UnitsArg>,

    #[arg(
        long,
        value_name = "G54..G59",
        value_parser = parse_wcs,
        help = "Work offset the job is set up in"
    )]
    pub expected_wcs: Option<u8>,

    /// Log level
    #[arg(
        long,
        default_value = "info",
        help = "Log level (trace, debug, info, warn, error)"
    )]
    pub log_level: String,
}

/// Command-line arguments for `gcode-analyze`
#[derive(Debug, Parser)]
#[command(name = "gcode-analyze")]
#[command(about = "Analyze G-code programs: bounds, run time and safety findings")]
#[command(version)]
pub struct Args {
    /// G-code files to analyze
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    #[command(flatten)]
    pub analysis: AnalysisArgs,

    #[arg(long, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Exit with status 2 when any error-level finding is reported
    #[arg(long)]
    pub strict: bool,
}

/// Command-line arguments for `gcode-ls`
#[derive(Debug, Parser)]
#[command(name = "gcode-ls")]
#[command(about = "Language server publishing G-code analysis findings")]
#[command(version)]
pub struct ServerArgs {
    #[command(flatten)]
    pub analysis: AnalysisArgs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum UnitsArg {
    Mm,
    In,
}

impl From<UnitsArg> for Units {
    fn from(units: UnitsArg) -> Self {
        match units {
            UnitsArg::Mm => Units::Metric,
            UnitsArg::In => Units::Imperial,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Combined configuration from all sources
#[derive(Debug, Clone)]
pub struct Config {
    /// Machine explicitly set via command line
    pub cli_machine: Option<String>,
    /// Profile directories, lowest priority first
    pub machine_dirs: Vec<(PathBuf, ProfilePriority)>,
    /// Defaults overlaid with the config file
    pub base: AnalysisConfig,
    /// Explicit flags; applied last
    pub overrides: Overrides,
    pub log_level: String,
}

/// Flag values that override everything else
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overrides {
    pub safe_z_mm: Option<f64>,
    pub stock_bounds_mm: Option<BoundingBox3D>,
    pub max_feed_mm_per_min: Option<f64>,
    pub default_units: Option<Units>,
    pub expected_wcs: Option<u8>,
}

impl Overrides {
    fn apply(&self, config: &mut AnalysisConfig) {
        if let Some(safe_z) = self.safe_z_mm {
            config.safe_z_mm = Some(safe_z);
        }
        if let Some(stock) = self.stock_bounds_mm {
            config.stock_bounds_mm = Some(stock);
        }
        if let Some(max_feed) = self.max_feed_mm_per_min {
            config.max_feed_mm_per_min = Some(max_feed);
        }
        if let Some(units) = self.default_units {
            config.default_units = units;
        }
        if let Some(wcs) = self.expected_wcs {
            config.expected_wcs = Some(wcs);
        }
    }
}

impl Config {
    /// Create configuration for `gcode-ls` from the process arguments
    pub fn from_args_and_env() -> Result<Self> {
        Self::from_args(ServerArgs::parse().analysis)
    }

    /// Create configuration from explicit arguments (useful for testing)
    pub fn from_args(args: AnalysisArgs) -> Result<Self> {
        let mut machine_dirs = Vec::new();

        // Default user config directory
        if let Some(config_dir) = dirs::config_dir() {
            machine_dirs.push((
                config_dir.join("gcode-analyzer").join("machines"),
                ProfilePriority::UserGlobal,
            ));
        }

        // User-specified directory wins over the user config directory
        if let Some(custom_dir) = args.machine_dir {
            machine_dirs.push((custom_dir, ProfilePriority::Explicit));
        }

        let base = match &args.config {
            Some(path) => load_analysis_config(path)?,
            None => AnalysisConfig::default(),
        };

        Ok(Config {
            cli_machine: args.machine,
            machine_dirs,
            base,
            overrides: Overrides {
                safe_z_mm: args.safe_z,
                stock_bounds_mm: args.stock,
                max_feed_mm_per_min: args.max_feed,
                default_units: args.units.map(Units::from),
                expected_wcs: args.expected_wcs,
            },
            log_level: args.log_level,
        })
    }

    /// Built-in machines plus every configured profile directory, with the
    /// CLI machine selected as active
    pub fn build_registry(&self) -> Result<MachineRegistry> {
        let mut registry = MachineRegistry::with_builtin_profiles();

        for (dir, priority) in &self.machine_dirs {
            registry
                .load_directory(dir, *priority)
                .with_context(|| format!("Failed to load machine profiles: {}", dir.display()))?;
        }

        if let Some(name) = &self.cli_machine {
            if !registry.set_active(name) {
                bail!(
                    "Unknown machine '{}' (available: {})",
                    name,
                    registry.list_profiles().join(", ")
                );
            }
        }

        Ok(registry)
    }

    /// Effective analysis config for one document: defaults, then the config
    /// file, then the document's machine (modeline, else the CLI machine),
    /// then explicit flags
    pub fn analysis_config<'r>(
        &self,
        registry: &'r MachineRegistry,
        content: &str,
    ) -> (AnalysisConfig, Option<&'r MachineProfile>) {
        let mut config = self.base.clone();
        let machine = registry.resolve_for(content);
        if let Some(machine) = machine {
            machine.apply(&mut config);
        }
        self.overrides.apply(&mut config);
        (config, machine)
    }
}

fn load_analysis_config(path: &std::path::Path) -> Result<AnalysisConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Initialize `env_logger`; `RUST_LOG` overrides `level`
pub fn init_logging(level: &str) {
    let env = env_logger::Env::default().default_filter_or(level);
    // A second initialization (tests) keeps the first logger
    let _ = env_logger::Builder::from_env(env).try_init();
}

/// Parse `LxWxH` in millimetres into stock bounds
pub fn parse_stock(value: &str) -> Result<BoundingBox3D, String> {
    let dims: Vec<f64> = value
        .split(['x', 'X'])
        .map(|part| part.trim().parse::<f64>())
        .collect::<Result<_, _>>()
        .map_err(|e| format!("invalid stock size '{}': {}", value, e))?;

    match dims.as_slice() {
        [l, w, h] if *l > 0.0 && *w > 0.0 && *h > 0.0 => {
            Ok(BoundingBox3D::from_stock_dimensions(*l, *w, *h))
        }
        [_, _, _] => Err(format!("stock dimensions must be positive: '{}'", value)),
        _ => Err(format!("expected LxWxH, got '{}'", value)),
    }
}

/// Parse a work offset code `G54`..`G59` into its index 1..6
pub fn parse_wcs(value: &str) -> Result<u8, String> {
    let number = value
        .trim()
        .strip_prefix(['G', 'g'])
        .and_then(|n| n.parse::<u8>().ok());

    match number {
        Some(n @ 54..=59) => Ok(n - 53),
        _ => Err(format!("expected one of G54..G59, got '{}'", value)),
    }
}
