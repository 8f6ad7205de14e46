//! Flat listing of everything below a directory

use tracing::trace;

use crate::compare::skip;
use crate::handle::{join_logical, DirHandle};
use crate::report::{Report, SkippedOperation};
use crate::walker::DiffOptions;

/// Logical paths of every entry transitively contained in `dir`, whose own
/// logical path is `path`.
///
/// Directories contribute their own path followed by their contents. Nothing
/// is compared. A subdirectory that cannot be opened contributes only its own
/// path; in strict mode the failure is noted in `report`.
pub fn list_subtree(
    dir: &DirHandle,
    path: &str,
    options: &DiffOptions,
    report: &mut Report,
) -> Vec<String> {
    let mut paths = Vec::new();
    collect(dir, path, options, report, &mut paths);
    paths
}

fn collect(
    dir: &DirHandle,
    path: &str,
    options: &DiffOptions,
    report: &mut Report,
    paths: &mut Vec<String>,
) {
    let entries = match dir.entries() {
        Ok(entries) => entries,
        Err(e) => return skip(report, options, path, SkippedOperation::ReadDir, &e),
    };

    for name in entries {
        let name = match name {
            Ok(name) => name,
            Err(e) => return skip(report, options, path, SkippedOperation::ReadDir, &e),
        };
        let child_path = join_logical(path, &name);
        trace!(path = %child_path, "enumerated");
        paths.push(child_path.clone());

        let is_dir = match dir.snapshot_entry(&name) {
            Ok(snapshot) => snapshot.is_dir(),
            Err(e) => {
                skip(report, options, &child_path, SkippedOperation::Stat, &e);
                continue;
            }
        };
        if !is_dir {
            continue;
        }

        match dir.open_dir(&name) {
            Ok(child) => collect(&child, &child_path, options, report, paths),
            Err(e) => skip(report, options, &child_path, SkippedOperation::OpenDirectory, &e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::fs;
    use tempfile::TempDir;

    fn as_set(paths: Vec<String>) -> HashSet<String> {
        paths.into_iter().collect()
    }

    #[test]
    fn test_nested_listing() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("a"), b"1").unwrap();
        fs::create_dir_all(root.join("sub").join("deeper")).unwrap();
        fs::write(root.join("sub").join("b"), b"2").unwrap();
        fs::write(root.join("sub").join("deeper").join("c"), b"3").unwrap();
        std::os::unix::fs::symlink("sub", root.join("link")).unwrap();

        let dir = DirHandle::open(root).unwrap();
        let mut report = Report::new();
        let paths = list_subtree(&dir, "/data", &DiffOptions::default(), &mut report);

        let expected: HashSet<String> = [
            "/data/a",
            "/data/sub",
            "/data/sub/b",
            "/data/sub/deeper",
            "/data/sub/deeper/c",
            "/data/link",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        assert_eq!(paths.len(), expected.len());
        assert_eq!(as_set(paths), expected);
        assert!(report.is_empty());
    }

    #[test]
    fn test_symlinked_directory_not_followed() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir(root.join("target")).unwrap();
        fs::write(root.join("target").join("inside"), b"").unwrap();
        fs::create_dir(root.join("scan")).unwrap();
        std::os::unix::fs::symlink("../target", root.join("scan").join("escape")).unwrap();

        let dir = DirHandle::open(root.join("scan")).unwrap();
        let mut report = Report::new();
        let paths = list_subtree(&dir, "/", &DiffOptions::default(), &mut report);
        assert_eq!(paths, vec!["/escape".to_string()]);
    }

    #[test]
    fn test_empty_directory() {
        let temp_dir = TempDir::new().unwrap();
        let dir = DirHandle::open(temp_dir.path()).unwrap();
        let mut report = Report::new();
        assert!(list_subtree(&dir, "/empty", &DiffOptions::default(), &mut report).is_empty());
    }
}
