//! mkinitramfs library exports.
//!
//! Builds a Linux initramfs as a newc CPIO stream: a fixed baseline of
//! directories and device nodes, an optional multi-call executable with
//! command aliases, `init` and default shell symlinks, and extra host files.
//!
//! ```rust,ignore
//! use mkinitramfs::initramfs::{build_records, write_archive, Plan};
//! use mkinitramfs::cpio::NewcWriter;
//!
//! let records = build_records(&Plan::default())?;
//! let mut writer = NewcWriter::new(std::io::stdout().lock());
//! write_archive(&records, &mut writer)?;
//! ```

pub mod artifact;
pub mod config;
pub mod cpio;
pub mod error;
pub mod initramfs;
pub mod logger;
pub mod timing;

pub use error::{Error, Result};
