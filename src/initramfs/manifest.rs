//! JSON description of an archive's contents.
//!
//! Lists every record in archive order with the data needed to check two
//! builds for equality without unpacking them: link targets, device numbers
//! and content digests.

use std::fs::{self, File};
use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::cpio::set::regular_file_metadata;
use crate::cpio::{Content, Record, RecordKind, RecordSet};
use crate::error::Error;

/// Archive contents in encounter order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub records: Vec<ManifestEntry>,
    /// Size of the finished archive, trailer included.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archive_bytes: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub path: String,
    /// Full mode in octal, e.g. `"100755"`.
    pub mode: String,
    pub size: u64,
    #[serde(flatten)]
    pub detail: EntryDetail,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntryDetail {
    Directory,
    CharDevice { major: u32, minor: u32 },
    Symlink { target: String },
    File { sha256: String },
}

impl Manifest {
    /// Describe `set`, hashing file contents from memory or disk.
    pub fn from_records(set: &RecordSet) -> crate::error::Result<Self> {
        let records = set
            .iter()
            .map(ManifestEntry::from_record)
            .collect::<crate::error::Result<Vec<_>>>()?;
        Ok(Self {
            records,
            archive_bytes: None,
        })
    }

    /// Write as pretty-printed JSON.
    pub fn write(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("Failed to serialize manifest")?;
        fs::write(path, json + "\n")
            .with_context(|| format!("Failed to write manifest: {}", path.display()))
    }

    /// Read a manifest written by [`Manifest::write`].
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse manifest: {}", path.display()))
    }
}

impl ManifestEntry {
    fn from_record(record: &Record) -> crate::error::Result<Self> {
        let detail = match &record.kind {
            RecordKind::Directory => EntryDetail::Directory,
            RecordKind::CharDevice { major, minor } => EntryDetail::CharDevice {
                major: *major,
                minor: *minor,
            },
            RecordKind::Symlink { target } => EntryDetail::Symlink {
                target: target.clone(),
            },
            RecordKind::File(content) => EntryDetail::File {
                sha256: sha256_content(content)?,
            },
        };
        Ok(Self {
            path: record.name.clone(),
            mode: format!("{:o}", record.mode()),
            size: record.size(),
            detail,
        })
    }
}

fn sha256_content(content: &Content) -> crate::error::Result<String> {
    let mut hasher = Sha256::new();
    match content {
        Content::Bytes(data) => hasher.update(data),
        Content::File { path, .. } => {
            let source_error = |e| Error::Source {
                path: path.clone(),
                source: e,
            };
            regular_file_metadata(path)?;
            let mut file = File::open(path).map_err(source_error)?;
            io::copy(&mut file, &mut hasher).map_err(source_error)?;
        }
    }
    Ok(hasher
        .finalize()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect())
}
