//! Memtrack record types.
//!
//! These mirror the memory tracking HAL: a record is a byte count tagged with
//! classification flags, and callers pick a memory type they are interested in.

use serde::Serialize;
use std::fmt;
use std::ops::BitOr;
use std::str::FromStr;

/// Memory type selector passed by memtrack callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MemtrackType {
    #[default]
    Other,
    Gl,
    Graphics,
    Multimedia,
    Camera,
}

impl MemtrackType {
    pub const ALL: [MemtrackType; 5] = [
        MemtrackType::Other,
        MemtrackType::Gl,
        MemtrackType::Graphics,
        MemtrackType::Multimedia,
        MemtrackType::Camera,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MemtrackType::Other => "other",
            MemtrackType::Gl => "gl",
            MemtrackType::Graphics => "graphics",
            MemtrackType::Multimedia => "multimedia",
            MemtrackType::Camera => "camera",
        }
    }
}

impl fmt::Display for MemtrackType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MemtrackType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MemtrackType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                format!(
                    "unknown memtrack type '{}', expected one of: other, gl, graphics, multimedia, camera",
                    s
                )
            })
    }
}

/// Classification flags attached to a memtrack record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct MemtrackFlags(u32);

impl MemtrackFlags {
    pub const SMAPS_ACCOUNTED: MemtrackFlags = MemtrackFlags(1 << 1);
    pub const SMAPS_UNACCOUNTED: MemtrackFlags = MemtrackFlags(1 << 2);
    pub const SHARED: MemtrackFlags = MemtrackFlags(1 << 3);
    pub const SHARED_PSS: MemtrackFlags = MemtrackFlags(1 << 4);
    pub const PRIVATE: MemtrackFlags = MemtrackFlags(1 << 5);
    pub const SYSTEM: MemtrackFlags = MemtrackFlags(1 << 6);
    pub const DEDICATED: MemtrackFlags = MemtrackFlags(1 << 7);
    pub const NONSECURE: MemtrackFlags = MemtrackFlags(1 << 8);
    pub const SECURE: MemtrackFlags = MemtrackFlags(1 << 9);

    const NAMES: [(MemtrackFlags, &'static str); 9] = [
        (MemtrackFlags::SMAPS_ACCOUNTED, "smaps_accounted"),
        (MemtrackFlags::SMAPS_UNACCOUNTED, "smaps_unaccounted"),
        (MemtrackFlags::SHARED, "shared"),
        (MemtrackFlags::SHARED_PSS, "shared_pss"),
        (MemtrackFlags::PRIVATE, "private"),
        (MemtrackFlags::SYSTEM, "system"),
        (MemtrackFlags::DEDICATED, "dedicated"),
        (MemtrackFlags::NONSECURE, "nonsecure"),
        (MemtrackFlags::SECURE, "secure"),
    ];

    pub const fn empty() -> Self {
        MemtrackFlags(0)
    }

    pub const fn bits(&self) -> u32 {
        self.0
    }

    pub const fn union(self, other: MemtrackFlags) -> Self {
        MemtrackFlags(self.0 | other.0)
    }

    pub const fn contains(&self, other: MemtrackFlags) -> bool {
        self.0 & other.0 == other.0
    }

    /// Names of the set flags, lowest bit first.
    pub fn names(&self) -> Vec<&'static str> {
        Self::NAMES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect()
    }
}

impl BitOr for MemtrackFlags {
    type Output = MemtrackFlags;

    fn bitor(self, rhs: MemtrackFlags) -> MemtrackFlags {
        self.union(rhs)
    }
}

impl fmt::Display for MemtrackFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = self.names();
        if names.is_empty() {
            f.write_str("none")
        } else {
            f.write_str(&names.join("|"))
        }
    }
}

/// One memtrack record: a byte count and how it should be accounted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct MemtrackRecord {
    pub size_in_bytes: u64,
    pub flags: MemtrackFlags,
}

/// Record kinds this tracker reports, in output order.
///
/// GPU and ION allocations are invisible to smaps, private to the owning
/// process, and live in non-secure memory.
pub const RECORD_TEMPLATES: [MemtrackRecord; 1] = [MemtrackRecord {
    size_in_bytes: 0,
    flags: MemtrackFlags::SMAPS_UNACCOUNTED
        .union(MemtrackFlags::PRIVATE)
        .union(MemtrackFlags::NONSECURE),
}];
