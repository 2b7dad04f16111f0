//! Extra files requested as `source:dest` pairs.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::Error;

/// A host file and the archive path it should appear at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSpec {
    pub source: PathBuf,
    /// Already normalized, see [`normalize_archive_path`].
    pub dest: String,
}

impl FileSpec {
    pub fn new(source: impl Into<PathBuf>, dest: &str) -> Self {
        Self {
            source: source.into(),
            dest: normalize_archive_path(dest).to_string(),
        }
    }
}

impl FromStr for FileSpec {
    type Err = Error;

    /// Parse `sourcePath:pathInArchive`.
    fn from_str(spec: &str) -> Result<Self, Self::Err> {
        let invalid = |reason| Error::InvalidFileSpec {
            spec: spec.to_string(),
            reason,
        };

        let parts: Vec<&str> = spec.split(':').collect();
        let [source, dest] = parts.as_slice() else {
            return Err(invalid("expected exactly one ':' between source and destination"));
        };
        if source.is_empty() {
            return Err(invalid("source path is empty"));
        }
        let dest = normalize_archive_path(dest);
        if dest.is_empty() {
            return Err(invalid("destination path is empty"));
        }

        Ok(Self::new(*source, dest))
    }
}

impl fmt::Display for FileSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.source.display(), self.dest)
    }
}

/// Archive paths are relative: strip any leading slashes.
pub fn normalize_archive_path(path: &str) -> &str {
    path.trim_start_matches('/')
}
