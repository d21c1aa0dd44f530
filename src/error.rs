//! Error types for memory usage collection.
//!
//! Every variant maps to a single negative errno through [`CollectError::errno`],
//! which is what memtrack callers ultimately see.

use std::io;
use std::path::PathBuf;

/// Failure of a memory usage query.
///
/// Parse misses and "no matching client/row" outcomes are never errors; only
/// resources that cannot be opened or read end up here.
#[derive(Debug, thiserror::Error)]
pub enum CollectError {
    #[error("failed to read process cmdline {}: {source}", .path.display())]
    Cmdline {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("process cmdline {} is empty", .path.display())]
    EmptyCmdline { path: PathBuf },

    #[error("failed to open GPU client directory {}: {source}", .path.display())]
    ClientDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to open GPU client file {}: {source}", .path.display())]
    ClientFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to open heap table {}: {source}", .path.display())]
    HeapTable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("path {} exceeds the {limit}-byte path limit", .path.display())]
    PathTooLong { path: PathBuf, limit: usize },
}

impl CollectError {
    /// Negative OS error code for this failure, as returned by `get_memory`.
    pub fn errno(&self) -> i32 {
        let code = match self {
            CollectError::Cmdline { source, .. }
            | CollectError::ClientDir { source, .. }
            | CollectError::ClientFile { source, .. }
            | CollectError::HeapTable { source, .. } => os_code(source),
            CollectError::EmptyCmdline { .. } => libc::ENODATA,
            CollectError::PathTooLong { .. } => libc::ENAMETOOLONG,
        };
        -code
    }
}

fn os_code(err: &io::Error) -> i32 {
    match err.raw_os_error() {
        Some(code) if code > 0 => code,
        _ => libc::EIO,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_errno_uses_os_code() {
        let err = CollectError::HeapTable {
            path: PathBuf::from("/sys/kernel/debug/ion/heaps/cma-heap"),
            source: io::Error::from_raw_os_error(libc::EACCES),
        };
        assert_eq!(err.errno(), -libc::EACCES);
    }

    #[test]
    fn test_errno_falls_back_to_eio() {
        let err = CollectError::Cmdline {
            path: PathBuf::from("/proc/1/cmdline"),
            source: io::Error::new(io::ErrorKind::Other, "synthetic"),
        };
        assert_eq!(err.errno(), -libc::EIO);
    }

    #[test]
    fn test_errno_for_local_failures() {
        let empty = CollectError::EmptyCmdline {
            path: PathBuf::from("/proc/2/cmdline"),
        };
        assert_eq!(empty.errno(), -libc::ENODATA);

        let long = CollectError::PathTooLong {
            path: PathBuf::from("/x"),
            limit: 1,
        };
        assert_eq!(long.errno(), -libc::ENAMETOOLONG);
    }

    #[test]
    fn test_display_includes_path() {
        let err = CollectError::ClientDir {
            path: PathBuf::from("/sys/kernel/debug/mali/mem"),
            source: io::Error::from_raw_os_error(libc::ENOENT),
        };
        assert!(err.to_string().contains("/sys/kernel/debug/mali/mem"));
    }
}
