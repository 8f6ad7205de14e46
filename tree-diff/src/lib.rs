//! Tree Diff Library
//!
//! Compares two directory trees and reports:
//! - paths present on only one side (`added_files` / `deleted_files`)
//! - per-path differences in mode, ownership, SELinux label, symlink target
//!   and content
//!
//! Traversal is pinned to open directory handles, so renames or symlink swaps
//! elsewhere in either tree cannot redirect the comparison mid-walk.

pub mod compare;
pub mod enumerate;
pub mod error;
pub mod handle;
pub mod hasher;
pub mod report;
pub mod snapshot;
pub mod walker;

// Re-export main types and functions
pub use compare::Comparability;
pub use enumerate::list_subtree;
pub use error::{Result, TreeDiffError};
pub use handle::{escape_bytes, DirHandle, LabelSource};
pub use hasher::{fingerprint, HashAlgorithm};
pub use report::{Property, PropertyValue, Report, SkippedEntry, SkippedOperation};
pub use snapshot::{EntryKind, EntrySnapshot};
pub use walker::{DiffOptions, TreeWalker};

/// Compare the trees rooted at `tree_a` and `tree_b`
pub fn diff_trees(
    tree_a: impl AsRef<std::path::Path>,
    tree_b: impl AsRef<std::path::Path>,
    options: DiffOptions,
) -> Result<Report> {
    TreeWalker::new(options).diff_paths(tree_a, tree_b)
}

// Test modules
#[cfg(test)]
mod test_support;
