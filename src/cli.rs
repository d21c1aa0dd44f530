//! CLI arguments and subcommands for mali-memtrack.
//!
//! This module defines the command-line interface structure using the clap library,
//! including all flags, options, and subcommands, and merges them over the
//! loaded configuration file.

use clap::{Parser, Subcommand, ValueEnum};
use mali_memtrack::{load_config, Config, MemtrackType};
use std::path::PathBuf;

/// Log level options for CLI parsing
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Parses a level name as written in config files.
    pub fn from_config(level: &str) -> Option<LogLevel> {
        LogLevel::from_str(level, true).ok()
    }
}

/// Configuration format options for output
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ConfigFormat {
    Yaml,
    Json,
    Toml,
}

/// Output format for query results
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Yaml,
}

/// Main CLI arguments structure
#[derive(Parser, Debug)]
#[command(
    name = "mali-memtrack",
    about = "Per-process Mali GPU and ION heap memory tracker",
    long_about = "Per-process Mali GPU and ION heap memory tracker.\n\n\
                  Reports memory that smaps accounting cannot see: the Mali GPU allocations of \
                  a process, taken from its client file in debugfs, plus its ION CMA heap \
                  allocations.",
    author = "Michael Moll <exporter@herakles.now> - Herakles",
    version = "0.1.0",
    propagate_version = true
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Log level (overrides log_level from the config file)
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Config file (YAML/JSON/TOML)
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Disable all config file loading
    #[arg(long)]
    pub no_config: bool,

    /// Print effective merged config and exit
    #[arg(long)]
    pub show_config: bool,

    /// Output format for --show-config
    #[arg(long, value_enum, default_value = "yaml")]
    pub config_format: ConfigFormat,

    /// Validate config and exit (return code 1 on error)
    #[arg(long)]
    pub check_config: bool,

    /// Root of the proc filesystem
    #[arg(long)]
    pub proc_root: Option<PathBuf>,

    /// Directory of Mali GPU client files
    #[arg(long)]
    pub client_dir: Option<PathBuf>,

    /// ION heap table file
    #[arg(long)]
    pub heap_table: Option<PathBuf>,

    /// Step size in bytes of the backward search for allocation totals
    #[arg(long)]
    pub tail_window_bytes: Option<u64>,
}

/// Subcommands for additional functionality
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Report unaccounted memory for one process
    Query {
        /// Process id to query
        pid: u32,

        /// Memtrack type selector (other, gl, graphics, multimedia, camera)
        #[arg(short = 't', long = "type", default_value = "other")]
        memtrack_type: MemtrackType,

        /// Record buffer capacity to request
        #[arg(short = 'n', long, default_value_t = 1)]
        records: usize,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Validate configuration and data source accessibility
    Check {
        /// Check /proc filesystem
        #[arg(long)]
        proc: bool,

        /// Check debugfs sources (GPU clients and ION heap)
        #[arg(long)]
        debugfs: bool,

        /// Check all system requirements
        #[arg(long)]
        all: bool,
    },

    /// Generate configuration files
    Config {
        /// Output file path ("-" for stdout)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value = "yaml")]
        format: ConfigFormat,

        /// Include comments and examples
        #[arg(long)]
        commented: bool,
    },
}

/// Resolves configuration from CLI args, config file, and defaults.
/// This enforces precedence: CLI (if provided) > config file > default.
pub fn resolve_config(args: &Args) -> Result<Config, Box<dyn std::error::Error>> {
    let mut config = if args.no_config {
        Config::default()
    } else {
        load_config(args.config.as_deref())?
    };

    if let Some(proc_root) = &args.proc_root {
        config.proc_root = Some(proc_root.clone());
    }
    if let Some(client_dir) = &args.client_dir {
        config.client_dir = Some(client_dir.clone());
    }
    if let Some(heap_table) = &args.heap_table {
        config.heap_table = Some(heap_table.clone());
    }
    if let Some(window) = args.tail_window_bytes {
        config.tail_window_bytes = Some(window);
    }
    if let Some(level) = args.log_level {
        config.log_level = Some(format!("{:?}", level).to_ascii_lowercase());
    }

    Ok(config)
}

/// Renders configuration in the requested format.
pub fn render_config(
    config: &Config,
    format: ConfigFormat,
) -> Result<String, Box<dyn std::error::Error>> {
    let output = match format {
        ConfigFormat::Json => serde_json::to_string_pretty(config)?,
        ConfigFormat::Toml => toml::to_string_pretty(config)?,
        ConfigFormat::Yaml => serde_yaml::to_string(config)?,
    };
    Ok(output)
}
