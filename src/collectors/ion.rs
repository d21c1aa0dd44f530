//! ION heap usage collector.
//!
//! Reads the per-client table the ION driver publishes for a heap, e.g.
//! `/sys/kernel/debug/ion/heaps/cma-heap`:
//!
//! ```text
//!           client              pid             size
//!   surfaceflinger              179         33423360
//! ```

use crate::error::CollectError;
use crate::limits::ScanLimits;
use crate::reader::LineReader;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

pub const DEFAULT_HEAP_TABLE: &str = "/sys/kernel/debug/ion/heaps/cma-heap";

/// One data row of a heap table. Columns after `size` are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeapRow {
    pub pid: u32,
    pub size: u64,
}

/// Parses the pid and size columns of a heap table line.
///
/// Header, blank and truncated lines yield `None`.
pub fn parse_heap_row(line: &[u8]) -> Option<HeapRow> {
    let text = String::from_utf8_lossy(line);
    let mut fields = text.split_whitespace();
    fields.next()?;
    let pid = fields.next()?.parse().ok()?;
    let size = fields.next()?.parse().ok()?;
    Some(HeapRow { pid, size })
}

/// Sums the sizes of every row in the heap table at `path` owned by `pid`.
///
/// Only failing to open the table is an error; unparsable rows are skipped
/// and a read failure ends the scan with what was summed so far.
pub fn sum_heap_usage(path: &Path, pid: u32, limits: &ScanLimits) -> Result<u64, CollectError> {
    limits.check_path(path)?;

    let file = fs::File::open(path).map_err(|source| CollectError::HeapTable {
        path: path.to_path_buf(),
        source,
    })?;
    let mut reader = LineReader::new(file, limits.line);

    let mut total: u64 = 0;
    loop {
        let line = match reader.next_line() {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                warn!("Stopped reading heap table {}: {}", path.display(), e);
                break;
            }
        };

        match parse_heap_row(line) {
            Some(row) if row.pid == pid => {
                debug!("IONmem is {} (pid {})", row.size, pid);
                total = total.saturating_add(row.size);
            }
            _ => {}
        }
    }

    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    // -------------------------------------------------------------------------
    // Tests for parse_heap_row
    // -------------------------------------------------------------------------

    #[test]
    fn test_parse_heap_row() {
        assert_eq!(
            parse_heap_row(b"  surfaceflinger              179         33423360\n"),
            Some(HeapRow {
                pid: 179,
                size: 33423360
            })
        );
        // trailing columns are ignored
        assert_eq!(
            parse_heap_row(b"fg 100 1000 extra columns\n"),
            Some(HeapRow { pid: 100, size: 1000 })
        );
    }

    #[test]
    fn test_parse_heap_row_invalid() {
        assert_eq!(
            parse_heap_row(b"          client              pid             size\n"),
            None
        );
        assert_eq!(parse_heap_row(b"\n"), None);
        assert_eq!(parse_heap_row(b"fg 100\n"), None);
        assert_eq!(parse_heap_row(b"fg -1 1000\n"), None);
        assert_eq!(parse_heap_row(b"----------------------------------\n"), None);
        assert_eq!(parse_heap_row(b"total orphaned 0\n"), None);
    }

    // -------------------------------------------------------------------------
    // Tests for sum_heap_usage
    // -------------------------------------------------------------------------

    #[test]
    fn test_sum_heap_usage_for_pid() {
        let tmp = TempDir::new().unwrap();
        let table = tmp.path().join("cma-heap");
        fs::write(
            &table,
            "          client              pid             size\n\
             fg 100 1000\n\
             bg 200 2000\n\
             fg2 100 500\n",
        )
        .unwrap();

        let limits = ScanLimits::default();
        assert_eq!(sum_heap_usage(&table, 100, &limits).unwrap(), 1500);
        assert_eq!(sum_heap_usage(&table, 200, &limits).unwrap(), 2000);
        assert_eq!(sum_heap_usage(&table, 300, &limits).unwrap(), 0);
    }

    #[test]
    fn test_sum_heap_usage_missing_table() {
        let tmp = TempDir::new().unwrap();
        let err = sum_heap_usage(&tmp.path().join("cma-heap"), 1, &ScanLimits::default())
            .unwrap_err();
        assert!(matches!(err, CollectError::HeapTable { .. }));
        assert_eq!(err.errno(), -libc::ENOENT);
    }
}
