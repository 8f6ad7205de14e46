//! Pairwise attribute comparators
//!
//! Each comparator looks at one property of an entry that exists in both
//! trees and writes into the shared [`Report`]. None of them fails: anything
//! the filesystem refuses is skipped (and noted in strict mode).

use std::ffi::CStr;
use std::io;

use tracing::debug;

use crate::handle::{escape_bytes, DirHandle, LabelSource};
use crate::hasher::fingerprint;
use crate::report::{Property, Report, SkippedOperation};
use crate::snapshot::EntrySnapshot;
use crate::walker::DiffOptions;

/// Outcome of the metadata comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparability {
    /// Modes match; type-specific comparison may proceed
    Comparable,
    /// Modes differ; nothing more is compared for this entry
    Incomparable,
}

/// Compare mode, uid and gid of two snapshots.
///
/// A mode mismatch (which includes a type mismatch) is recorded on its own
/// and gates every further comparison. Otherwise uid and gid are checked
/// independently.
pub fn compare_metadata(
    a: &EntrySnapshot,
    b: &EntrySnapshot,
    path: &str,
    report: &mut Report,
) -> Comparability {
    if a.mode != b.mode {
        report.record_difference(path, Property::Mode, a.mode_octal(), b.mode_octal());
        return Comparability::Incomparable;
    }

    if a.uid != b.uid {
        report.record_difference(path, Property::Uid, a.uid, b.uid);
    }
    if a.gid != b.gid {
        report.record_difference(path, Property::Gid, a.gid, b.gid);
    }

    Comparability::Comparable
}

/// Compare the security label of `name` (or of the directories themselves
/// when `name` is `None`). Unreadable labels count as empty.
pub fn compare_security_label<L: LabelSource>(
    dir_a: &L,
    dir_b: &L,
    name: Option<&CStr>,
    path: &str,
    report: &mut Report,
) {
    let label_a = read_label(dir_a, name, path);
    let label_b = read_label(dir_b, name, path);

    if label_a != label_b {
        report.record_difference(path, Property::Selinux, label_a, label_b);
    }
}

fn read_label<L: LabelSource>(dir: &L, name: Option<&CStr>, path: &str) -> String {
    dir.security_label(name).unwrap_or_else(|e| {
        debug!(path, error = %e, "security label unreadable, treating as empty");
        String::new()
    })
}

/// Compare raw symlink targets. Skipped when either side cannot be read.
pub fn compare_symlink(
    dir_a: &DirHandle,
    dir_b: &DirHandle,
    name: &CStr,
    path: &str,
    options: &DiffOptions,
    report: &mut Report,
) {
    let targets = dir_a
        .read_link(name)
        .and_then(|a| dir_b.read_link(name).map(|b| (a, b)));

    match targets {
        Ok((target_a, target_b)) => {
            if target_a != target_b {
                report.record_difference(
                    path,
                    Property::Symlink,
                    escape_bytes(&target_a),
                    escape_bytes(&target_b),
                );
            }
        }
        Err(e) => skip(report, options, path, SkippedOperation::ReadLink, &e),
    }
}

/// Compare file content by fingerprint. Skipped when either side cannot be
/// opened or read.
pub fn compare_content(
    dir_a: &DirHandle,
    dir_b: &DirHandle,
    name: &CStr,
    path: &str,
    options: &DiffOptions,
    report: &mut Report,
) {
    // Both files are closed when they go out of scope, on every path out.
    let files = dir_a
        .open_file(name)
        .and_then(|a| dir_b.open_file(name).map(|b| (a, b)));
    let (file_a, file_b) = match files {
        Ok(files) => files,
        Err(e) => return skip(report, options, path, SkippedOperation::OpenFile, &e),
    };

    let hashes = fingerprint(file_a, options.hash_algorithm)
        .and_then(|a| fingerprint(file_b, options.hash_algorithm).map(|b| (a, b)));

    match hashes {
        Ok((hash_a, hash_b)) => {
            if hash_a != hash_b {
                report.record_difference(path, Property::Content, hash_a, hash_b);
            }
        }
        Err(e) => skip(report, options, path, SkippedOperation::Hash, &e),
    }
}

/// Note an operation the filesystem refused. Only strict mode keeps a record.
pub(crate) fn skip(
    report: &mut Report,
    options: &DiffOptions,
    path: &str,
    operation: SkippedOperation,
    error: &io::Error,
) {
    debug!(path, ?operation, error = %error, "skipping");
    if options.strict {
        report.record_skipped(path, operation, error);
    }
}
