//! Error types for initramfs construction.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while planning, collecting or serializing records.
///
/// Every variant is fatal to the build: nothing is retried or recovered
/// locally, the caller decides how to report it.
#[derive(Debug, Error)]
pub enum Error {
    /// An executable was given without any command names to link to it.
    #[error("no command names given for the multi-call executable")]
    MissingAliases,

    /// A command name that cannot become a single path component.
    #[error("invalid command name {name:?}: must be non-empty, contain no '/', and not be \".\" or \"..\"")]
    InvalidAlias {
        /// The rejected name.
        name: String,
    },

    /// A `source:dest` file spec that does not split into two parts.
    #[error("invalid files format {spec:?}: {reason}")]
    InvalidFileSpec {
        /// The spec as given on the command line.
        spec: String,
        /// What is wrong with it.
        reason: &'static str,
    },

    /// Two records mapped to the same archive path.
    #[error("duplicate archive path {path:?}")]
    Conflict {
        /// The path that already exists in the set.
        path: String,
    },

    /// A host file could not be read.
    #[error("cannot read {}: {source}", path.display())]
    Source {
        /// Host path of the file.
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A host path exists but is a directory, device, or similar.
    #[error("{} is not a regular file", path.display())]
    NotRegularFile {
        /// Host path of the entry.
        path: PathBuf,
    },

    /// The output sink (or a file being streamed into it) failed.
    #[error("could not write record {name:?}: {source}")]
    Encode {
        /// Archive name of the record being written.
        name: String,
        #[source]
        source: io::Error,
    },

    /// A file changed size between being added and being written.
    #[error("record {name:?} changed size: expected {expected} bytes, read {actual}")]
    SizeMismatch {
        name: String,
        expected: u64,
        actual: u64,
    },

    /// A record or second trailer was written after the trailer.
    #[error("archive trailer already written")]
    TrailerWritten,
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
