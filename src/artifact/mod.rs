//! Build artifacts written to disk.
//!
//! - `initramfs` - the newc archive, written atomically, plus an optional manifest

pub mod initramfs;

pub use initramfs::{write_initramfs, ArtifactSummary};
