//! Point-in-time metadata for a single directory entry

use rustix::fs::{FileType, RawMode, Stat};

/// Entry type, decided once from the snapshot and used for comparator dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
    Symlink,
    /// Devices, FIFOs, sockets: compared by metadata only
    Other,
}

impl From<FileType> for EntryKind {
    fn from(file_type: FileType) -> Self {
        match file_type {
            FileType::RegularFile => Self::File,
            FileType::Directory => Self::Directory,
            FileType::Symlink => Self::Symlink,
            _ => Self::Other,
        }
    }
}

/// Metadata of one entry, read with a single `stat` call.
///
/// The snapshot is never refreshed; changes made to the entry afterwards are
/// not observed by the comparators that consume it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntrySnapshot {
    pub kind: EntryKind,
    /// Full `st_mode`, file type bits included
    pub mode: u32,
    pub uid: u32,
    pub gid: u32,
}

impl EntrySnapshot {
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    /// Mode rendered the way it appears in reports
    pub fn mode_octal(&self) -> String {
        format!("{:o}", self.mode)
    }
}

impl From<&Stat> for EntrySnapshot {
    #[allow(clippy::unnecessary_cast)]
    fn from(stat: &Stat) -> Self {
        let mode = stat.st_mode as u32;
        Self {
            kind: EntryKind::from(FileType::from_raw_mode(mode as RawMode)),
            mode,
            uid: stat.st_uid as u32,
            gid: stat.st_gid as u32,
        }
    }
}
