//! Buffer limits applied while scraping procfs and debugfs.

use crate::error::CollectError;
use std::path::Path;

pub const DEFAULT_LINE_LIMIT: usize = 1024;
pub const DEFAULT_CMDLINE_LIMIT: usize = 64;
pub const DEFAULT_PATH_LIMIT: usize = 128;
pub const DEFAULT_TAIL_WINDOW_BYTES: u64 = 50;

/// Sizes of the fixed buffers used for lines, cmdlines and paths.
///
/// Line and cmdline overflow is dropped silently; paths at or above
/// `path` bytes are rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanLimits {
    pub line: usize,
    pub cmdline: usize,
    pub path: usize,
    /// Step size of the backward search for the allocation total.
    pub tail_window: u64,
}

impl Default for ScanLimits {
    fn default() -> Self {
        Self {
            line: DEFAULT_LINE_LIMIT,
            cmdline: DEFAULT_CMDLINE_LIMIT,
            path: DEFAULT_PATH_LIMIT,
            tail_window: DEFAULT_TAIL_WINDOW_BYTES,
        }
    }
}

impl ScanLimits {
    /// Fails if `path` (plus its terminator) would not fit the path buffer.
    pub fn check_path(&self, path: &Path) -> Result<(), CollectError> {
        if path.as_os_str().len() >= self.path {
            return Err(CollectError::PathTooLong {
                path: path.to_path_buf(),
                limit: self.path,
            });
        }
        Ok(())
    }
}
