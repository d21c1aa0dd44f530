//! Check command implementation.
//!
//! Validates configuration and that every data source can be read.

use mali_memtrack::collectors::{scan_clients, sum_heap_usage};
use mali_memtrack::{validate_effective_config, Config, MemoryUsageCollector, ProcessIdentity};
use nix::unistd::geteuid;
use std::fs;

/// Validates data sources and configuration.
pub fn command_check(
    proc: bool,
    debugfs: bool,
    all: bool,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("🔍 Mali Memtrack - System Check");
    println!("===============================");

    let collector = MemoryUsageCollector::new(config.collector_config());
    let settings = collector.config();
    let mut all_ok = true;

    // debugfs is root-only on most kernels
    if geteuid().is_root() {
        println!("\n👤 Running as root (uid=0)");
    } else {
        println!("\n👤 ⚠️  Not running as root - debugfs is usually root-only");
    }

    if proc || all {
        println!("\n📁 Checking {} ...", settings.proc_root.display());
        let pid = std::process::id();
        match ProcessIdentity::read(&settings.proc_root, pid, &settings.limits) {
            Ok(identity) => println!("   ✅ Own cmdline readable: {}", identity),
            Err(e) => {
                println!("   ❌ {}", e);
                all_ok = false;
            }
        }
    }

    if debugfs || all {
        println!("\n🎮 Checking GPU client files...");
        match fs::read_dir(&settings.client_dir) {
            Ok(entries) => {
                let count = entries.flatten().count();
                println!(
                    "   ✅ {} readable, {} client file(s)",
                    settings.client_dir.display(),
                    count
                );
                // Opens every entry the way a real query does.
                let sentinel = ProcessIdentity::from_raw(b"\x01mali-memtrack-check");
                if let Err(e) = scan_clients(&settings.client_dir, &sentinel, &settings.limits) {
                    println!("   ❌ {}", e);
                    all_ok = false;
                }
            }
            Err(e) => {
                println!("   ❌ {}: {}", settings.client_dir.display(), e);
                all_ok = false;
            }
        }

        println!("\n🧱 Checking ION heap table...");
        match sum_heap_usage(&settings.heap_table, 0, &settings.limits) {
            Ok(_) => println!("   ✅ {} readable", settings.heap_table.display()),
            Err(e) => {
                println!("   ❌ {}", e);
                all_ok = false;
            }
        }
    }

    // Check configuration
    println!("\n⚙️  Checking configuration...");
    match validate_effective_config(config) {
        Ok(_) => {
            println!("   ✅ Configuration is valid");
        }
        Err(e) => {
            println!("   ❌ Configuration invalid: {}", e);
            all_ok = false;
        }
    }

    println!("\n📋 Summary:");
    if all_ok {
        println!("   ✅ All checks passed - system is ready");
        Ok(())
    } else {
        println!("   ❌ Some checks failed - please review warnings");
        std::process::exit(1);
    }
}
