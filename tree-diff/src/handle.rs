//! Directory handles: every lookup below a root goes through one of these

use std::ffi::{CStr, CString, OsStr};
use std::fs::File;
use std::io;
use std::os::fd::{AsFd, AsRawFd, BorrowedFd, OwnedFd};
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};

use rustix::fs::{fstat, openat, readlinkat, statat, AtFlags, Dir, Mode, OFlags, CWD};

use crate::snapshot::EntrySnapshot;

/// Extended attribute holding the SELinux context
pub const SECURITY_LABEL_XATTR: &str = "security.selinux";

/// An open directory.
///
/// Names passed to the methods below are resolved inside exactly this
/// directory, whatever happens to the path it was opened from. The descriptor
/// is closed when the handle is dropped.
#[derive(Debug)]
pub struct DirHandle {
    fd: OwnedFd,
}

impl DirHandle {
    /// Open a root directory by path. Symlinks in the path are followed.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let fd = openat(
            CWD,
            path.as_ref(),
            OFlags::RDONLY | OFlags::DIRECTORY | OFlags::CLOEXEC,
            Mode::empty(),
        )?;
        Ok(Self { fd })
    }

    /// Open the subdirectory `name`, refusing to follow a symlink
    pub fn open_dir(&self, name: &CStr) -> io::Result<Self> {
        let fd = openat(
            &self.fd,
            name,
            OFlags::RDONLY | OFlags::DIRECTORY | OFlags::NOFOLLOW | OFlags::CLOEXEC,
            Mode::empty(),
        )?;
        Ok(Self { fd })
    }

    /// Open the entry `name` read-only for hashing.
    ///
    /// `NONBLOCK` keeps a FIFO swapped in after the snapshot from stalling the
    /// walk; `NOFOLLOW` rejects a symlink swapped in the same way.
    pub fn open_file(&self, name: &CStr) -> io::Result<File> {
        let fd = openat(
            &self.fd,
            name,
            OFlags::RDONLY | OFlags::NOFOLLOW | OFlags::NONBLOCK | OFlags::NOCTTY | OFlags::CLOEXEC,
            Mode::empty(),
        )?;
        Ok(File::from(fd))
    }

    /// Snapshot of the directory itself
    pub fn snapshot(&self) -> io::Result<EntrySnapshot> {
        Ok(EntrySnapshot::from(&fstat(&self.fd)?))
    }

    /// Snapshot of the entry `name`, without following symlinks
    pub fn snapshot_entry(&self, name: &CStr) -> io::Result<EntrySnapshot> {
        Ok(EntrySnapshot::from(&statat(
            &self.fd,
            name,
            AtFlags::SYMLINK_NOFOLLOW,
        )?))
    }

    /// Raw, unresolved target of the symlink `name`
    pub fn read_link(&self, name: &CStr) -> io::Result<Vec<u8>> {
        Ok(readlinkat(&self.fd, name, Vec::new())?.into_bytes())
    }

    /// Iterate the names in this directory, `.` and `..` excluded
    pub fn entries(&self) -> io::Result<Entries> {
        Ok(Entries {
            dir: Dir::read_from(&self.fd)?,
        })
    }

    fn proc_path(&self, name: Option<&CStr>) -> PathBuf {
        let mut path = PathBuf::from(format!("/proc/self/fd/{}", self.fd.as_raw_fd()));
        match name {
            Some(name) => path.push(OsStr::from_bytes(name.to_bytes())),
            None => path.push("."),
        }
        path
    }
}

impl AsFd for DirHandle {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.fd.as_fd()
    }
}

/// Where security labels are read from
pub trait LabelSource {
    /// Security label of the entry `name`, or of the source itself when
    /// `name` is `None`. A missing attribute reads as an empty label.
    fn security_label(&self, name: Option<&CStr>) -> io::Result<String>;
}

impl LabelSource for DirHandle {
    /// Read through `/proc/self/fd` so the lookup stays pinned to this handle.
    /// Trailing newline and NUL bytes are stripped.
    fn security_label(&self, name: Option<&CStr>) -> io::Result<String> {
        let path = self.proc_path(name);
        let raw = xattr::get(&path, SECURITY_LABEL_XATTR)?.unwrap_or_default();
        Ok(normalize_label(&raw))
    }
}

/// Names of a directory's entries, in the order the OS returns them
pub struct Entries {
    dir: Dir,
}

impl Iterator for Entries {
    type Item = io::Result<CString>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.dir.next()? {
                Ok(entry) => entry,
                Err(e) => return Some(Err(e.into())),
            };
            let name = entry.file_name();
            if name == c"." || name == c".." {
                continue;
            }
            return Some(Ok(name.to_owned()));
        }
    }
}

/// Strip the trailing newline and NUL bytes some tools leave on labels
pub fn normalize_label(raw: &[u8]) -> String {
    let end = raw
        .iter()
        .rposition(|b| *b != b'\n' && *b != 0)
        .map_or(0, |i| i + 1);
    escape_bytes(&raw[..end])
}

/// Render raw bytes from the filesystem as report text.
///
/// Valid UTF-8 passes through, except that `\` is doubled. Any other byte is
/// written as `\xNN`. Two different byte strings never render the same.
pub fn escape_bytes(raw: &[u8]) -> String {
    let mut out = String::with_capacity(raw.len());
    for chunk in raw.utf8_chunks() {
        for c in chunk.valid().chars() {
            if c == '\\' {
                out.push_str("\\\\");
            } else {
                out.push(c);
            }
        }
        for byte in chunk.invalid() {
            out.push_str(&format!("\\x{:02x}", byte));
        }
    }
    out
}

/// Append `name` to the logical path `parent`
pub fn join_logical(parent: &str, name: &CStr) -> String {
    let name = escape_bytes(name.to_bytes());
    if parent.ends_with('/') {
        format!("{}{}", parent, name)
    } else {
        format!("{}/{}", parent, name)
    }
}
