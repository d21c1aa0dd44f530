//! Process identity resolution from /proc/<pid>/cmdline.
//!
//! GPU client files are keyed by the command line of the process that opened
//! the device, so the cmdline is the only identity we can cross-reference.

use crate::error::CollectError;
use crate::limits::ScanLimits;
use crate::reader::{trim_newline, LineReader};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Command-line identity of a process, read once per query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessIdentity(Vec<u8>);

impl ProcessIdentity {
    /// Builds an identity from the raw bytes of a cmdline read.
    ///
    /// Only the text before the first NUL counts: that is argv[0], or the whole
    /// title for processes that rewrite their cmdline.
    pub fn from_raw(raw: &[u8]) -> Self {
        let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
        ProcessIdentity(raw[..end].to_vec())
    }

    /// Reads the identity of `pid` below `proc_root`.
    pub fn read(proc_root: &Path, pid: u32, limits: &ScanLimits) -> Result<Self, CollectError> {
        let path = cmdline_path(proc_root, pid);
        limits.check_path(&path)?;

        let file = fs::File::open(&path).map_err(|source| CollectError::Cmdline {
            path: path.clone(),
            source,
        })?;
        let mut reader = LineReader::new(file, limits.cmdline);

        let identity = match reader.next_line() {
            Ok(Some(raw)) => ProcessIdentity::from_raw(raw),
            Ok(None) => return Err(CollectError::EmptyCmdline { path }),
            Err(source) => return Err(CollectError::Cmdline { path, source }),
        };

        // An empty identity would prefix-match every client.
        if identity.is_empty() {
            return Err(CollectError::EmptyCmdline { path });
        }

        Ok(identity)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True if `line` begins with this identity.
    pub fn is_prefix_of(&self, line: &[u8]) -> bool {
        line.starts_with(&self.0)
    }
}

impl fmt::Display for ProcessIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(trim_newline(&self.0)))
    }
}

/// Location of the cmdline pseudo-file for `pid`.
pub fn cmdline_path(proc_root: &Path, pid: u32) -> PathBuf {
    proc_root.join(pid.to_string()).join("cmdline")
}
