//! Process-related modules.
//!
//! This module provides:
//! - `cmdline`: identity resolution from /proc/<pid>/cmdline

pub mod cmdline;

// Re-export commonly used types
pub use cmdline::{cmdline_path, ProcessIdentity};
