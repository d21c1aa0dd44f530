//! Query command implementation.
//!
//! Runs one memtrack query and prints the resulting records.

use mali_memtrack::{MemoryUsageCollector, MemtrackRecord, MemtrackType};
use serde::Serialize;

use crate::cli::OutputFormat;

/// Query outcome as printed in JSON/YAML mode.
#[derive(Serialize)]
struct QueryReport {
    pid: u32,
    memtrack_type: MemtrackType,
    available_records: usize,
    records: Vec<RecordReport>,
}

#[derive(Serialize)]
struct RecordReport {
    size_in_bytes: u64,
    flags: u32,
    flag_names: Vec<&'static str>,
}

impl From<&MemtrackRecord> for RecordReport {
    fn from(record: &MemtrackRecord) -> Self {
        Self {
            size_in_bytes: record.size_in_bytes,
            flags: record.flags.bits(),
            flag_names: record.flags.names(),
        }
    }
}

/// Queries unaccounted memory for `pid`.
///
/// Exits with code 1 when the query fails, after printing the negative errno.
pub fn command_query(
    collector: &MemoryUsageCollector,
    pid: u32,
    memtrack_type: MemtrackType,
    capacity: usize,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut records = vec![MemtrackRecord::default(); capacity];
    let mut num_records = capacity;

    let ret = collector.get_memory_raw(pid, memtrack_type, &mut records, &mut num_records);
    if ret < 0 {
        let err = std::io::Error::from_raw_os_error(-ret);
        eprintln!("❌ Query for PID {} failed: {} ({})", pid, ret, err);
        std::process::exit(1);
    }

    let filled = capacity.min(num_records);
    let report = QueryReport {
        pid,
        memtrack_type,
        available_records: num_records,
        records: records[..filled].iter().map(RecordReport::from).collect(),
    };

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(&report)?),
        OutputFormat::Text => print_text(&report),
    }

    Ok(())
}

fn print_text(report: &QueryReport) {
    println!(
        "🔍 PID {} ({}): {} record kind(s) available",
        report.pid, report.memtrack_type, report.available_records
    );
    if report.records.is_empty() {
        println!("   (no record buffer requested)");
        return;
    }
    for record in &report.records {
        println!(
            "   ├─ {} bytes ({} KB)",
            record.size_in_bytes,
            record.size_in_bytes / 1024
        );
        println!("   └─ flags: {}", record.flag_names.join("|"));
    }
}
