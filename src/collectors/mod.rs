//! Collectors module for kernel debugfs memory sources.
//!
//! This module contains the collectors for Mali GPU client files and the ION
//! heap table.

pub mod ion;
pub mod mali;

pub use ion::{parse_heap_row, sum_heap_usage, HeapRow, DEFAULT_HEAP_TABLE};
pub use mali::{
    find_total_allocated, parse_total_allocated, scan_clients, ClientAllocation,
    DEFAULT_CLIENT_DIR,
};
