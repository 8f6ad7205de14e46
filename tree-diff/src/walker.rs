//! Recursive, handle-pinned comparison of two directory trees

use std::collections::HashSet;
use std::ffi::{CStr, CString};
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, info_span, trace};

use crate::compare::{
    compare_content, compare_metadata, compare_security_label, compare_symlink, skip,
    Comparability,
};
use crate::enumerate::list_subtree;
use crate::error::{Result, TreeDiffError};
use crate::handle::{join_logical, DirHandle};
use crate::hasher::HashAlgorithm;
use crate::report::{Report, SkippedOperation};
use crate::snapshot::EntryKind;

/// Options for a comparison run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffOptions {
    /// Algorithm used for content fingerprints
    #[serde(default)]
    pub hash_algorithm: HashAlgorithm,
    /// Record skipped operations in `Report::errors`
    #[serde(default)]
    pub strict: bool,
}

/// Side of the comparison an unmatched entry belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    /// Only in tree A
    Deleted,
    /// Only in tree B
    Added,
}

/// Walks two trees in lockstep and fills a [`Report`].
///
/// Every lookup is made relative to an open [`DirHandle`]; no path string is
/// ever resolved from a root after the roots themselves are opened.
#[derive(Debug, Clone, Default)]
pub struct TreeWalker {
    options: DiffOptions,
}

impl TreeWalker {
    /// Create a new walker with options
    pub fn new(options: DiffOptions) -> Self {
        Self { options }
    }

    /// Open both roots and compare them.
    ///
    /// Failing to open either root is the only fatal error.
    pub fn diff_paths(&self, tree_a: impl AsRef<Path>, tree_b: impl AsRef<Path>) -> Result<Report> {
        let tree_a = tree_a.as_ref();
        let tree_b = tree_b.as_ref();

        let dir_a = DirHandle::open(tree_a).map_err(|e| TreeDiffError::open_error(tree_a, e))?;
        let dir_b = DirHandle::open(tree_b).map_err(|e| TreeDiffError::open_error(tree_b, e))?;

        let mut report = Report::new();
        self.diff(&dir_a, &dir_b, &mut report);
        Ok(report)
    }

    /// Compare two already-open roots into `report`
    pub fn diff(&self, dir_a: &DirHandle, dir_b: &DirHandle, report: &mut Report) {
        let span = info_span!("tree_diff", hash = %self.options.hash_algorithm, strict = self.options.strict);
        let _enter = span.enter();

        self.compare_roots(dir_a, dir_b, report);
        self.diff_level(dir_a, dir_b, "/", report);

        let summary = report.summary();
        info!(
            added = summary.added,
            deleted = summary.deleted,
            changed = summary.changed,
            skipped = summary.skipped,
            "comparison finished"
        );
    }

    /// The roots have no parent to gate on; only differences are recorded.
    fn compare_roots(&self, dir_a: &DirHandle, dir_b: &DirHandle, report: &mut Report) {
        compare_security_label(dir_a, dir_b, None, "/", report);

        match dir_a.snapshot().and_then(|a| dir_b.snapshot().map(|b| (a, b))) {
            Ok((a, b)) => {
                compare_metadata(&a, &b, "/", report);
            }
            Err(e) => skip(report, &self.options, "/", SkippedOperation::Stat, &e),
        }
    }

    fn diff_level(&self, dir_a: &DirHandle, dir_b: &DirHandle, path: &str, report: &mut Report) {
        let entries = match dir_a.entries() {
            Ok(entries) => entries,
            Err(e) => return skip(report, &self.options, path, SkippedOperation::ReadDir, &e),
        };

        let mut seen: HashSet<CString> = HashSet::new();
        for name in entries {
            let name = match name {
                Ok(name) => name,
                // A partial listing of A would make the sweep report
                // spurious additions, so the sweep is dropped as well.
                Err(e) => return skip(report, &self.options, path, SkippedOperation::ReadDir, &e),
            };
            self.diff_entry(dir_a, dir_b, &name, path, &mut seen, report);
        }

        self.sweep_added(dir_b, path, &seen, report);
    }

    /// Primary pass for one name of tree A
    fn diff_entry(
        &self,
        dir_a: &DirHandle,
        dir_b: &DirHandle,
        name: &CStr,
        parent: &str,
        seen: &mut HashSet<CString>,
        report: &mut Report,
    ) {
        let path = join_logical(parent, name);
        trace!(path = %path, "visiting");

        let snapshot_b = match dir_b.snapshot_entry(name) {
            Ok(snapshot) => snapshot,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return self.record_unmatched(dir_a, name, path, Side::Deleted, report);
            }
            Err(e) => {
                // B has something by this name that cannot be inspected
                seen.insert(name.to_owned());
                return skip(report, &self.options, &path, SkippedOperation::Stat, &e);
            }
        };
        seen.insert(name.to_owned());

        let snapshot_a = match dir_a.snapshot_entry(name) {
            Ok(snapshot) => snapshot,
            Err(e) => return skip(report, &self.options, &path, SkippedOperation::Stat, &e),
        };

        compare_security_label(dir_a, dir_b, Some(name), &path, report);
        if compare_metadata(&snapshot_a, &snapshot_b, &path, report) == Comparability::Incomparable {
            return;
        }

        match snapshot_a.kind {
            EntryKind::Symlink => compare_symlink(dir_a, dir_b, name, &path, &self.options, report),
            EntryKind::File => compare_content(dir_a, dir_b, name, &path, &self.options, report),
            EntryKind::Directory => self.descend(dir_a, dir_b, name, &path, report),
            EntryKind::Other => {}
        }
    }

    /// Recurse into a directory present on both sides. Both child handles
    /// are dropped when this returns.
    fn descend(&self, dir_a: &DirHandle, dir_b: &DirHandle, name: &CStr, path: &str, report: &mut Report) {
        let children = dir_a
            .open_dir(name)
            .and_then(|a| dir_b.open_dir(name).map(|b| (a, b)));

        match children {
            Ok((child_a, child_b)) => self.diff_level(&child_a, &child_b, path, report),
            Err(e) => skip(report, &self.options, path, SkippedOperation::OpenDirectory, &e),
        }
    }

    /// Sweep pass: everything in B that the primary pass did not match
    fn sweep_added(&self, dir_b: &DirHandle, path: &str, seen: &HashSet<CString>, report: &mut Report) {
        let entries = match dir_b.entries() {
            Ok(entries) => entries,
            Err(e) => return skip(report, &self.options, path, SkippedOperation::ReadDir, &e),
        };

        for name in entries {
            let name = match name {
                Ok(name) => name,
                Err(e) => return skip(report, &self.options, path, SkippedOperation::ReadDir, &e),
            };
            if seen.contains(&name) {
                continue;
            }
            let child_path = join_logical(path, &name);
            self.record_unmatched(dir_b, &name, child_path, Side::Added, report);
        }
    }

    /// Record an entry that exists on one side only, flattening directories
    fn record_unmatched(&self, dir: &DirHandle, name: &CStr, path: String, side: Side, report: &mut Report) {
        debug!(path = %path, ?side, "unmatched entry");

        let is_dir = dir.snapshot_entry(name).map(|s| s.is_dir()).unwrap_or(false);
        let descendants = if is_dir {
            match dir.open_dir(name) {
                Ok(child) => list_subtree(&child, &path, &self.options, report),
                Err(e) => {
                    skip(report, &self.options, &path, SkippedOperation::OpenDirectory, &e);
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };

        for entry in std::iter::once(path).chain(descendants) {
            match side {
                Side::Deleted => report.record_deleted(entry),
                Side::Added => report.record_added(entry),
            }
        }
    }
}
