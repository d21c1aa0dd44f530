//! Memory usage collector.
//!
//! Combines the process identity, the matching Mali GPU client and the ION heap
//! table into the single memtrack record this tracker reports.

use crate::collectors::{scan_clients, sum_heap_usage, DEFAULT_CLIENT_DIR, DEFAULT_HEAP_TABLE};
use crate::error::CollectError;
use crate::limits::ScanLimits;
use crate::memtrack::{MemtrackRecord, MemtrackType, RECORD_TEMPLATES};
use crate::process::ProcessIdentity;
use std::path::PathBuf;
use tracing::debug;

pub const DEFAULT_PROC_ROOT: &str = "/proc";

/// Where the collector reads from and how large its buffers are.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectorConfig {
    pub proc_root: PathBuf,
    pub client_dir: PathBuf,
    pub heap_table: PathBuf,
    pub limits: ScanLimits,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            proc_root: PathBuf::from(DEFAULT_PROC_ROOT),
            client_dir: PathBuf::from(DEFAULT_CLIENT_DIR),
            heap_table: PathBuf::from(DEFAULT_HEAP_TABLE),
            limits: ScanLimits::default(),
        }
    }
}

/// Breakdown of the unaccounted memory found for one process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnaccountedMemory {
    pub pid: u32,
    pub gpu_bytes: u64,
    pub heap_bytes: u64,
    /// Client file the GPU total was taken from, if any matched.
    pub gpu_client: Option<PathBuf>,
}

impl UnaccountedMemory {
    pub fn total_bytes(&self) -> u64 {
        self.gpu_bytes.saturating_add(self.heap_bytes)
    }
}

/// Point-in-time memory usage collector.
///
/// Holds configuration only, so one instance can serve concurrent queries for
/// different pids.
#[derive(Debug, Clone, Default)]
pub struct MemoryUsageCollector {
    config: CollectorConfig,
}

impl MemoryUsageCollector {
    pub fn new(config: CollectorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CollectorConfig {
        &self.config
    }

    /// Number of record kinds `get_memory` can report.
    pub fn record_count(&self) -> usize {
        RECORD_TEMPLATES.len()
    }

    /// Collects GPU and heap usage for `pid`.
    pub fn unaccounted_memory(&self, pid: u32) -> Result<UnaccountedMemory, CollectError> {
        let limits = &self.config.limits;

        let identity = ProcessIdentity::read(&self.config.proc_root, pid, limits)?;
        debug!("Resolved pid {} to '{}'", pid, identity);

        let client = scan_clients(&self.config.client_dir, &identity, limits)?;
        let heap_bytes = sum_heap_usage(&self.config.heap_table, pid, limits)?;

        let (gpu_bytes, gpu_client) = match client {
            Some(found) => (found.total_bytes, Some(found.path)),
            None => (0, None),
        };

        Ok(UnaccountedMemory {
            pid,
            gpu_bytes,
            heap_bytes,
            gpu_client,
        })
    }

    /// Fills `records` for `pid` and returns the number of record kinds available.
    ///
    /// At most `records.len()` records are written. An empty slice only queries
    /// the count and touches no files. `memtrack_type` is accepted for API
    /// compatibility; every type reports the same record.
    pub fn get_memory(
        &self,
        pid: u32,
        memtrack_type: MemtrackType,
        records: &mut [MemtrackRecord],
    ) -> Result<usize, CollectError> {
        let available = self.record_count();
        let filled = records.len().min(available);
        if filled == 0 {
            return Ok(available);
        }

        debug!("Collecting {} memory for pid {}", memtrack_type, pid);
        let usage = self.unaccounted_memory(pid)?;

        records[..filled].copy_from_slice(&RECORD_TEMPLATES[..filled]);
        records[0].size_in_bytes = usage.total_bytes();

        Ok(available)
    }

    /// Memtrack HAL calling convention over [`get_memory`](Self::get_memory).
    ///
    /// `num_records` holds the caller's capacity on entry (bounded by
    /// `records.len()`) and the number of available record kinds on return.
    /// Returns 0 on success or a negative errno.
    pub fn get_memory_raw(
        &self,
        pid: u32,
        memtrack_type: MemtrackType,
        records: &mut [MemtrackRecord],
        num_records: &mut usize,
    ) -> i32 {
        let capacity = (*num_records).min(records.len());
        *num_records = self.record_count();

        match self.get_memory(pid, memtrack_type, &mut records[..capacity]) {
            Ok(_) => 0,
            Err(e) => {
                debug!("Memory query for pid {} failed: {}", pid, e);
                e.errno()
            }
        }
    }
}
