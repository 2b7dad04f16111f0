//! Ordered, path-unique collection of archive records.

use std::collections::HashSet;
use std::fs::{self, Metadata};
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use log::debug;

use super::record::Record;
use crate::error::{Error, Result};

/// Records accumulated for one archive, in insertion order.
///
/// Paths are unique: adding a record whose name is already present fails
/// with [`Error::Conflict`] and leaves the set untouched.
#[derive(Debug, Default)]
pub struct RecordSet {
    records: Vec<Record>,
    names: HashSet<String>,
}

impl RecordSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record, failing if its path is already taken.
    pub fn add(&mut self, record: Record) -> Result<()> {
        if self.names.contains(&record.name) {
            return Err(Error::Conflict {
                path: record.name,
            });
        }
        debug!(
            "add {} {} ({:o})",
            record.kind_name(),
            record.name,
            record.mode()
        );
        self.names.insert(record.name.clone());
        self.records.push(record);
        Ok(())
    }

    /// Insert the host file at `source` as a regular file at `dest`.
    ///
    /// The source is checked now so missing or special files fail early; its
    /// contents are streamed later by the writer. Permission bits are taken
    /// from the source.
    pub fn add_from_source(&mut self, source: &Path, dest: &str) -> Result<()> {
        let meta = regular_file_metadata(source)?;
        self.add(Record::host_file(
            dest,
            meta.permissions().mode(),
            source.to_path_buf(),
            meta.len(),
        ))
    }

    /// Whether a record with this archive path exists.
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Look up a record by archive path.
    pub fn get(&self, name: &str) -> Option<&Record> {
        if !self.contains(name) {
            return None;
        }
        self.records.iter().find(|r| r.name == name)
    }

    /// Records in the order they were added.
    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Metadata of `path`, which must be a regular file.
///
/// Checked before any open: opening a FIFO for reading blocks until a writer
/// appears.
pub(crate) fn regular_file_metadata(path: &Path) -> Result<Metadata> {
    let meta = fs::metadata(path).map_err(|e| Error::Source {
        path: path.to_path_buf(),
        source: e,
    })?;
    if !meta.is_file() {
        return Err(Error::NotRegularFile {
            path: path.to_path_buf(),
        });
    }
    Ok(meta)
}

impl<'a> IntoIterator for &'a RecordSet {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
