//! Archive records and the newc serializer.
//!
//! - `record` - one archive entry (directory, char device, symlink, file)
//! - `set` - ordered, path-unique collection of records
//! - `newc` - byte-level encoder with trailer handling

pub mod newc;
pub mod record;
pub mod set;

pub use newc::{NewcWriter, RecordWriter, TRAILER_NAME};
pub use record::{Content, Record, RecordKind};
pub use set::RecordSet;
