//! Mali Midgard memory tracker library
//!
//! This library reports GPU and ION heap memory used by a single process, the
//! memory that per-process smaps accounting cannot see. It scrapes three
//! kernel sources:
//!
//! - `/proc/<pid>/cmdline` for the process identity
//! - `/sys/kernel/debug/mali/mem/*`, one file per GPU client, for the GPU total
//! - `/sys/kernel/debug/ion/heaps/cma-heap` for per-pid ION allocations
//!
//! # Usage
//!
//! ```no_run
//! use mali_memtrack::{MemoryUsageCollector, MemtrackRecord, MemtrackType};
//!
//! let collector = MemoryUsageCollector::default();
//!
//! let mut records = [MemtrackRecord::default(); 1];
//! let available = collector
//!     .get_memory(1234, MemtrackType::Gl, &mut records)
//!     .expect("memory query failed");
//!
//! println!("{} record(s), {} bytes", available, records[0].size_in_bytes);
//! ```

pub mod collector;
pub mod collectors;
pub mod config;
pub mod error;
pub mod limits;
pub mod memtrack;
pub mod process;
pub mod reader;

// Re-export main types for convenience
pub use collector::{CollectorConfig, MemoryUsageCollector, UnaccountedMemory};
pub use config::{load_config, validate_effective_config, Config, ConfigError};
pub use error::CollectError;
pub use limits::ScanLimits;
pub use memtrack::{MemtrackFlags, MemtrackRecord, MemtrackType, RECORD_TEMPLATES};
pub use process::ProcessIdentity;
