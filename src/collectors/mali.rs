//! Mali GPU client memory collector.
//!
//! The Mali kbase driver exposes one debugfs file per GPU client under
//! `/sys/kernel/debug/mali/mem`. The first line of each file names the client
//! (its cmdline) and the driver keeps appending allocation records, the most
//! recent of which ends with a summary line:
//!
//! ```text
//! com.app.test
//! .....
//! Total allocated memory: 2822048
//! ```

use crate::error::CollectError;
use crate::limits::ScanLimits;
use crate::process::ProcessIdentity;
use crate::reader::{trim_newline, LineReader};
use std::fs;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use tracing::{debug, trace, warn};

pub const DEFAULT_CLIENT_DIR: &str = "/sys/kernel/debug/mali/mem";

const TOTAL_PREFIX: &[u8] = b"Total allocated memory:";

const MAX_PASS_BUFFER: u64 = 8 * 1024;

/// GPU allocation total adopted from a matching client file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientAllocation {
    pub path: PathBuf,
    pub total_bytes: u64,
}

/// Finds the client file for `identity` in `dir` and returns its latest total.
///
/// Failing to open the directory or any entry in it aborts the scan. Files that
/// yield no first line, do not match, or carry no recognisable total are
/// skipped; the first matching file with a total ends the scan.
pub fn scan_clients(
    dir: &Path,
    identity: &ProcessIdentity,
    limits: &ScanLimits,
) -> Result<Option<ClientAllocation>, CollectError> {
    let entries = fs::read_dir(dir).map_err(|source| CollectError::ClientDir {
        path: dir.to_path_buf(),
        source,
    })?;

    for entry in entries.flatten() {
        let name = entry.file_name();
        if name == "." || name == ".." {
            continue;
        }

        let path = entry.path();
        limits.check_path(&path)?;

        let file = fs::File::open(&path).map_err(|source| CollectError::ClientFile {
            path: path.clone(),
            source,
        })?;

        if !first_line_matches(&file, identity, limits.line) {
            trace!("Skipping GPU client {}", path.display());
            continue;
        }

        debug!("GPU client {} matches {}", path.display(), identity);

        match find_total_allocated(&file, limits.tail_window, limits.line) {
            Ok(Some(total_bytes)) => {
                debug!("Gfxmem is {} ({})", total_bytes, path.display());
                return Ok(Some(ClientAllocation { path, total_bytes }));
            }
            Ok(None) => {
                debug!("No allocation total found in {}", path.display());
            }
            Err(e) => {
                warn!("Failed to scan tail of {}: {}", path.display(), e);
            }
        }
    }

    Ok(None)
}

/// Reads the first line of a client file and compares it to `identity`.
///
/// A file that cannot produce a first line (empty, or a read error such as a
/// directory entry) never matches.
fn first_line_matches(file: &fs::File, identity: &ProcessIdentity, line_limit: usize) -> bool {
    let mut reader = LineReader::new(file, line_limit);
    match reader.next_line() {
        Ok(Some(line)) => identity.is_prefix_of(line),
        Ok(None) => false,
        Err(e) => {
            trace!("Unreadable GPU client entry: {}", e);
            false
        }
    }
}

/// Searches backwards from the end of `source` for the last allocation total.
///
/// Each pass steps `window` bytes further back and parses the complete lines
/// that start inside the newly covered region. The first pass to recognise a
/// total wins, taking the last total within that region. The search ends
/// with `None` once the start of the data has been covered.
///
/// seq_file entries reject seeking relative to the end and report a zero
/// size; those are scanned forward instead.
pub fn find_total_allocated<R: Read + Seek>(
    mut source: R,
    window: u64,
    line_limit: usize,
) -> io::Result<Option<u64>> {
    let len = match source.seek(SeekFrom::End(0)) {
        Ok(len) if len > 0 => len,
        Ok(_) => return scan_forward(source, line_limit),
        Err(e) => {
            trace!("Seek from end rejected ({}), scanning forward", e);
            return scan_forward(source, line_limit);
        }
    };
    let window = window.max(1);

    // Lines starting at or after this offset were examined by an earlier pass.
    let mut covered_from = len;
    let mut step: u64 = 1;

    while covered_from > 0 {
        let start = len.saturating_sub(window.saturating_mul(step));
        let at_line_start = if start == 0 {
            source.seek(SeekFrom::Start(0))?;
            true
        } else {
            source.seek(SeekFrom::Start(start - 1))?;
            let mut prev = [0u8; 1];
            source.read_exact(&mut prev)?;
            prev[0] == b'\n'
        };

        // Enough for every line starting before `covered_from`, no more.
        let budget = (covered_from - start).saturating_add(line_limit as u64);
        let capacity = budget.min(MAX_PASS_BUFFER) as usize;
        let mut reader =
            LineReader::with_capacity(capacity, (&mut source).take(budget), line_limit);
        let mut pos = start;
        if !at_line_start {
            // the line straddling `start` is handled by a later pass
            pos += reader.skip_line()?;
        }

        let mut found = None;
        while pos < covered_from {
            let line = match reader.next_line()? {
                Some(line) => line,
                None => break,
            };
            pos += line.len() as u64;
            if let Some(total) = parse_total_allocated(line) {
                found = Some(total);
            }
        }

        if found.is_some() {
            return Ok(found);
        }

        trace!("No allocation total in window starting at {}", start);
        covered_from = start;
        step += 1;
    }

    Ok(None)
}

/// Parses every line after the first and keeps the last total.
fn scan_forward<R: Read + Seek>(mut source: R, line_limit: usize) -> io::Result<Option<u64>> {
    source.seek(SeekFrom::Start(0))?;
    let mut reader = LineReader::new(source, line_limit);
    reader.skip_line()?;

    let mut found = None;
    while let Some(line) = reader.next_line()? {
        if let Some(total) = parse_total_allocated(line) {
            found = Some(total);
        }
    }
    Ok(found)
}

/// Parses a `Total allocated memory: <decimal>` line.
///
/// Whitespace after the colon is optional, an explicit `+` is accepted and
/// anything after the digits is ignored.
pub fn parse_total_allocated(line: &[u8]) -> Option<u64> {
    let rest = trim_newline(line).strip_prefix(TOTAL_PREFIX)?;
    let start = rest
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(rest.len());
    let rest = &rest[start..];
    let rest = rest.strip_prefix(b"+").unwrap_or(rest);

    let digits = rest.iter().take_while(|b| b.is_ascii_digit()).count();
    if digits == 0 {
        return None;
    }
    std::str::from_utf8(&rest[..digits]).ok()?.parse().ok()
}
