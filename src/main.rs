//! mali-memtrack - version 0.1.0
//!
//! Per-process Mali GPU and ION heap memory tracker with tracing logging.
//! This is the main entry point that resolves configuration and dispatches subcommands.

mod cli;
mod commands;

use clap::{CommandFactory, Parser};
use mali_memtrack::{validate_effective_config, Config, MemoryUsageCollector};
use tracing::{debug, Level};

use cli::{render_config, resolve_config, Args, Commands, LogLevel};
use commands::{command_check, command_config, command_query};

/// Initializes tracing logging subsystem with configured log level.
///
/// Logs go to stderr so query output on stdout stays machine-readable.
fn setup_logging(config: &Config, args: &Args) {
    let level = args
        .log_level
        .or_else(|| config.log_level.as_deref().and_then(LogLevel::from_config))
        .unwrap_or(LogLevel::Warn);

    if matches!(level, LogLevel::Off) {
        return;
    }

    let max_level = match level {
        LogLevel::Off | LogLevel::Error => Level::ERROR,
        LogLevel::Warn => Level::WARN,
        LogLevel::Info => Level::INFO,
        LogLevel::Debug => Level::DEBUG,
        LogLevel::Trace => Level::TRACE,
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(max_level)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("⚠️  Failed to set tracing subscriber: {}", e);
        return;
    }

    debug!("Logging initialized with level: {:?}", level);
}

/// Helper function to load and validate configuration.
/// Exits the process with error code 1 if validation fails.
fn load_validated_config(args: &Args) -> Result<Config, Box<dyn std::error::Error>> {
    let config = resolve_config(args)?;
    if let Err(e) = validate_effective_config(&config) {
        eprintln!("❌ Configuration invalid: {}", e);
        std::process::exit(1);
    }
    Ok(config)
}

/// Main application entry point.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Early config resolution for show/check modes
    if args.show_config || args.check_config {
        let config = resolve_config(&args)?;

        if args.check_config {
            if let Err(e) = validate_effective_config(&config) {
                eprintln!("❌ Configuration invalid: {}", e);
                std::process::exit(1);
            }
            println!("✅ Configuration is valid");
            return Ok(());
        }

        print!("{}", render_config(&config, args.config_format)?);
        return Ok(());
    }

    let command = match &args.command {
        Some(command) => command,
        None => {
            Args::command().print_help()?;
            return Ok(());
        }
    };

    // Config generation does not depend on the effective config
    if let Commands::Config {
        output,
        format,
        commented,
    } = command
    {
        return command_config(output.clone(), *format, *commented);
    }

    let config = load_validated_config(&args)?;
    setup_logging(&config, &args);

    match command {
        Commands::Query {
            pid,
            memtrack_type,
            records,
            format,
        } => {
            let collector = MemoryUsageCollector::new(config.collector_config());
            command_query(&collector, *pid, *memtrack_type, *records, *format)
        }
        Commands::Check { proc, debugfs, all } => command_check(*proc, *debugfs, *all, &config),
        Commands::Config { .. } => unreachable!("Config handled above"),
    }
}
