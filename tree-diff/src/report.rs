//! Report model accumulated during a comparison run

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Attribute compared between two entries with the same logical path.
///
/// Variants are declared in alphabetical order so that property maps
/// serialize with sorted keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Property {
    Content,
    Gid,
    Mode,
    Selinux,
    Symlink,
    Uid,
}

impl Property {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Content => "content",
            Self::Gid => "gid",
            Self::Mode => "mode",
            Self::Selinux => "selinux",
            Self::Symlink => "symlink",
            Self::Uid => "uid",
        }
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One side of a recorded difference.
///
/// Ownership ids are numbers, everything else is text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Id(u32),
    Text(String),
}

impl From<u32> for PropertyValue {
    fn from(id: u32) -> Self {
        Self::Id(id)
    }
}

impl From<String> for PropertyValue {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for PropertyValue {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

/// Differing properties of one path, each as `[value_in_a, value_in_b]`
pub type PropertyDiff = BTreeMap<Property, (PropertyValue, PropertyValue)>;

/// Operation that was skipped because the filesystem refused it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkippedOperation {
    /// Reading an entry's metadata
    Stat,
    /// Listing a directory
    ReadDir,
    /// Opening a directory for descent or enumeration
    OpenDirectory,
    /// Opening a regular file for hashing
    OpenFile,
    /// Streaming file content into the hasher
    Hash,
    /// Reading a symlink target
    ReadLink,
}

/// A best-effort skip recorded in strict mode
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedEntry {
    pub path: String,
    pub operation: SkippedOperation,
    pub message: String,
}

/// Counts used for the end-of-run log line
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportSummary {
    pub added: usize,
    pub deleted: usize,
    pub changed: usize,
    pub skipped: usize,
}

/// Result of comparing tree A against tree B.
///
/// `added_files` and `deleted_files` follow directory iteration order and
/// should be treated as sets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    /// Paths present only in tree B
    #[serde(rename = "added_files")]
    pub added: Vec<String>,
    /// Paths present only in tree A
    #[serde(rename = "deleted_files")]
    pub deleted: Vec<String>,
    /// Per-path attribute differences
    pub differences: BTreeMap<String, PropertyDiff>,
    /// Operations skipped in strict mode
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<SkippedEntry>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_added(&mut self, path: impl Into<String>) {
        self.added.push(path.into());
    }

    pub fn record_deleted(&mut self, path: impl Into<String>) {
        self.deleted.push(path.into());
    }

    /// Record `property` of `path` as differing between the two trees
    pub fn record_difference(
        &mut self,
        path: &str,
        property: Property,
        value_a: impl Into<PropertyValue>,
        value_b: impl Into<PropertyValue>,
    ) {
        self.differences
            .entry(path.to_string())
            .or_default()
            .insert(property, (value_a.into(), value_b.into()));
    }

    pub fn record_skipped(
        &mut self,
        path: &str,
        operation: SkippedOperation,
        error: &std::io::Error,
    ) {
        self.errors.push(SkippedEntry {
            path: path.to_string(),
            operation,
            message: error.to_string(),
        });
    }

    /// Properties recorded for `path`, if any
    pub fn properties(&self, path: &str) -> Option<&PropertyDiff> {
        self.differences.get(path)
    }

    /// True when the two trees compared identical
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.deleted.is_empty() && self.differences.is_empty()
    }

    /// Sort the path lists so output is stable across runs
    pub fn sort(&mut self) {
        self.added.sort();
        self.deleted.sort();
    }

    pub fn summary(&self) -> ReportSummary {
        ReportSummary {
            added: self.added.len(),
            deleted: self.deleted.len(),
            changed: self.differences.len(),
            skipped: self.errors.len(),
        }
    }

    pub fn to_json(&self, pretty: bool) -> Result<String> {
        let json = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };
        Ok(json)
    }
}
