//! Config command implementation.
//!
//! Generates configuration files in various formats.

use mali_memtrack::Config;
use std::fs;
use std::path::PathBuf;

use crate::cli::{render_config, ConfigFormat};

/// Generates configuration files.
pub fn command_config(
    output: Option<PathBuf>,
    format: ConfigFormat,
    commented: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::default();
    let output = match output {
        Some(path) => path,
        None => PathBuf::from("mali-memtrack.yaml"),
    };

    let mut content = render_config(&config, format)?;
    if commented && matches!(format, ConfigFormat::Yaml) {
        content = add_config_comments(content);
    }

    if output.to_string_lossy() == "-" {
        print!("{}", content);
    } else {
        fs::write(&output, content)?;
        println!("✅ Configuration written to: {}", output.display());
    }

    Ok(())
}

/// Adds comments to YAML configuration.
fn add_config_comments(yaml: String) -> String {
    let comments = r#"# Mali Memtrack Configuration
# ===========================
#
# Data Sources
# ------------
# proc_root: "/proc"                                # procfs mount
# client_dir: "/sys/kernel/debug/mali/mem"          # one file per GPU client
# heap_table: "/sys/kernel/debug/ion/heaps/cma-heap" # ION per-client table
#
# Buffer Limits
# -------------
# tail_window_bytes: 50        # Backward search step for "Total allocated memory"
# line_limit: 1024             # Line buffer size; longer lines are split
# cmdline_limit: 64            # Bytes of /proc/<pid>/cmdline used as identity
# path_limit: 128              # Longer paths are rejected (-ENAMETOOLONG)
#
# Logging
# -------
# log_level: "warn"            # off, error, warn, info, debug, trace
"#;

    format!("{comments}\n{yaml}")
}
