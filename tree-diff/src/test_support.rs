//! Helpers for building pairs of trees in tests

use std::collections::HashSet;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// Two sibling directories `a/` and `b/` inside one temporary directory
pub struct TreePair {
    _temp_dir: TempDir,
    pub a: PathBuf,
    pub b: PathBuf,
}

impl TreePair {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let a = temp_dir.path().join("a");
        let b = temp_dir.path().join("b");
        fs::create_dir(&a).unwrap();
        fs::create_dir(&b).unwrap();
        Self {
            _temp_dir: temp_dir,
            a,
            b,
        }
    }

    /// Write the same file on both sides
    pub fn both_file(&self, rel: &str, content: &[u8]) {
        write_file(&self.a, rel, content);
        write_file(&self.b, rel, content);
    }

    pub fn both_dir(&self, rel: &str) {
        make_dir(&self.a, rel);
        make_dir(&self.b, rel);
    }
}

pub fn write_file(root: &Path, rel: &str, content: &[u8]) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    // Pin the mode so umask differences never leak into comparisons
    fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();
}

pub fn make_dir(root: &Path, rel: &str) {
    let path = root.join(rel);
    fs::create_dir_all(&path).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
}

pub fn make_symlink(root: &Path, rel: &str, target: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    std::os::unix::fs::symlink(target, path).unwrap();
}

pub fn set_mode(root: &Path, rel: &str, mode: u32) {
    fs::set_permissions(root.join(rel), fs::Permissions::from_mode(mode)).unwrap();
}

pub fn set_of(paths: &[String]) -> HashSet<String> {
    paths.iter().cloned().collect()
}

pub fn strings(paths: &[&str]) -> HashSet<String> {
    paths.iter().map(|p| p.to_string()).collect()
}

/// True when permission bits do not stop this process (running as root)
pub fn bypasses_permissions(path: &Path) -> bool {
    fs::File::open(path).is_ok()
}
