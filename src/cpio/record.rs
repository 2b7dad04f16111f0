//! Archive entries prior to byte-level encoding.

use std::path::PathBuf;

/// File type constants for the mode field (POSIX `S_IF*` values).
pub const S_IFDIR: u32 = 0o040000;
pub const S_IFREG: u32 = 0o100000;
pub const S_IFLNK: u32 = 0o120000;
pub const S_IFCHR: u32 = 0o020000;

/// Permission bits kept from a caller-supplied mode.
const PERM_MASK: u32 = 0o7777;

/// Where a regular file's bytes come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    /// Bytes held in memory.
    Bytes(Vec<u8>),
    /// A host file, read when the record is serialized.
    ///
    /// `size` is captured when the record is created and must still match
    /// when the file is streamed out.
    File { path: PathBuf, size: u64 },
}

impl Content {
    /// Size in bytes of the content.
    pub fn size(&self) -> u64 {
        match self {
            Content::Bytes(data) => data.len() as u64,
            Content::File { size, .. } => *size,
        }
    }
}

/// Type-specific payload of a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordKind {
    Directory,
    CharDevice { major: u32, minor: u32 },
    /// Symlink targets are stored verbatim and never resolved.
    Symlink { target: String },
    File(Content),
}

/// One named entry destined for the archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Relative archive path, no leading slash.
    pub name: String,
    /// Permission bits only; the file type comes from `kind`.
    pub perm: u32,
    pub kind: RecordKind,
}

impl Record {
    pub fn directory(name: impl Into<String>, perm: u32) -> Self {
        Self::new(name, perm, RecordKind::Directory)
    }

    pub fn char_device(name: impl Into<String>, perm: u32, major: u32, minor: u32) -> Self {
        Self::new(name, perm, RecordKind::CharDevice { major, minor })
    }

    /// Symlinks are always created `0777`, like `ln -s`.
    pub fn symlink(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self::new(
            name,
            0o777,
            RecordKind::Symlink {
                target: target.into(),
            },
        )
    }

    /// A regular file whose bytes are held in memory.
    pub fn file(name: impl Into<String>, perm: u32, data: impl Into<Vec<u8>>) -> Self {
        Self::new(name, perm, RecordKind::File(Content::Bytes(data.into())))
    }

    /// A regular file streamed from `path` at serialization time.
    pub fn host_file(name: impl Into<String>, perm: u32, path: PathBuf, size: u64) -> Self {
        Self::new(name, perm, RecordKind::File(Content::File { path, size }))
    }

    fn new(name: impl Into<String>, perm: u32, kind: RecordKind) -> Self {
        Self {
            name: name.into(),
            perm: perm & PERM_MASK,
            kind,
        }
    }

    /// Full mode: file type bits combined with the permission bits.
    pub fn mode(&self) -> u32 {
        let file_type = match self.kind {
            RecordKind::Directory => S_IFDIR,
            RecordKind::CharDevice { .. } => S_IFCHR,
            RecordKind::Symlink { .. } => S_IFLNK,
            RecordKind::File(_) => S_IFREG,
        };
        file_type | self.perm
    }

    /// Number of data bytes following the header.
    ///
    /// For symlinks this is the length of the target path, which newc stores
    /// as the entry's data.
    pub fn size(&self) -> u64 {
        match &self.kind {
            RecordKind::Directory | RecordKind::CharDevice { .. } => 0,
            RecordKind::Symlink { target } => target.len() as u64,
            RecordKind::File(content) => content.size(),
        }
    }

    /// Short lowercase name of the record's kind, for logs and manifests.
    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            RecordKind::Directory => "directory",
            RecordKind::CharDevice { .. } => "char_device",
            RecordKind::Symlink { .. } => "symlink",
            RecordKind::File(_) => "file",
        }
    }
}
