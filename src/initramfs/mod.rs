//! Initramfs record construction.
//!
//! Turns a [`Plan`] into a [`RecordSet`] in a fixed order, which becomes the
//! order of entries in the archive:
//!
//! ```text
//! 1. baseline directories and device nodes   (bbin, bin, dev, dev/console, ...)
//! 2. multi-call executable + command aliases (bbin/bb, bbin/<cmd> -> bb)
//! 3. init symlink                            (init -> bbin/init)
//! 4. default shell symlink                   (bin/defaultsh -> /bbin/<shell>)
//! 5. extra files                             (--file src:dest)
//!    each preceded by any missing parent directories
//! ```
//!
//! Every step fails on the first error; there is no partial result.

pub mod baseline;
pub mod files;
pub mod manifest;

use std::path::PathBuf;

use log::{info, warn};

use crate::cpio::{Record, RecordSet, RecordWriter};
use crate::error::{Error, Result};

pub use baseline::default_baseline;
pub use files::{normalize_archive_path, FileSpec};

/// Permission bits of directories created for extra files.
pub const PARENT_DIR_PERM: u32 = 0o755;

/// Directory holding the multi-call executable and its aliases.
pub const EXECUTABLE_DIR: &str = "bbin";

/// File name of the installed executable inside [`EXECUTABLE_DIR`].
///
/// Aliases link to this name relatively, so they resolve wherever the
/// archive ends up mounted.
pub const EXECUTABLE_NAME: &str = "bb";

/// Archive path of the installed executable.
pub const EXECUTABLE_PATH: &str = "bbin/bb";

/// Default target of the `init` symlink.
pub const DEFAULT_INIT: &str = "bbin/init";

/// Default shell linked from `bin/defaultsh`.
pub const DEFAULT_SHELL: &str = "elvish";

/// Path of the default shell symlink.
pub const DEFAULT_SHELL_LINK: &str = "bin/defaultsh";

/// Everything needed to build one initramfs.
#[derive(Debug, Clone)]
pub struct Plan {
    /// Records inserted before anything else.
    pub baseline: Vec<Record>,
    /// Host path of the multi-call executable. `None` skips the executable
    /// and all command aliases.
    pub executable: Option<PathBuf>,
    /// Command names to link to the executable.
    pub aliases: Vec<String>,
    /// Target of the `init` symlink.
    pub init_target: String,
    /// Shell name for `bin/defaultsh`. Empty disables the link.
    pub default_shell: String,
    pub files: Vec<FileSpec>,
}

impl Default for Plan {
    fn default() -> Self {
        Self {
            baseline: default_baseline(),
            executable: None,
            aliases: Vec::new(),
            init_target: DEFAULT_INIT.to_string(),
            default_shell: DEFAULT_SHELL.to_string(),
            files: Vec::new(),
        }
    }
}

impl Plan {
    /// Check configuration errors that can be caught before any record is
    /// created.
    ///
    /// Aliases are only checked when an executable is given: without one
    /// they are ignored entirely.
    pub fn validate(&self) -> Result<()> {
        if self.executable.is_none() {
            return Ok(());
        }
        if self.aliases.is_empty() {
            return Err(Error::MissingAliases);
        }
        for name in &self.aliases {
            if name.is_empty() || name.contains('/') || name == "." || name == ".." {
                return Err(Error::InvalidAlias { name: name.clone() });
            }
        }
        Ok(())
    }
}

/// Collect all records described by `plan`.
pub fn build_records(plan: &Plan) -> Result<RecordSet> {
    plan.validate()?;

    let mut set = RecordSet::new();

    for record in &plan.baseline {
        set.add(record.clone())?;
    }

    match &plan.executable {
        Some(executable) => {
            set.add_from_source(executable, EXECUTABLE_PATH)?;
            for name in &plan.aliases {
                set.add(Record::symlink(
                    format!("{EXECUTABLE_DIR}/{name}"),
                    EXECUTABLE_NAME,
                ))?;
            }
            info!(
                "Linked {} commands to {}",
                plan.aliases.len(),
                executable.display()
            );
        }
        None if !plan.aliases.is_empty() => {
            warn!(
                "No multi-call executable given, ignoring {} command names",
                plan.aliases.len()
            );
        }
        None => warn!("No multi-call executable given. Not creating symlinks"),
    }

    set.add(Record::symlink("init", plan.init_target.as_str()))?;

    if !plan.default_shell.is_empty() {
        set.add(Record::symlink(
            DEFAULT_SHELL_LINK,
            format!("/{EXECUTABLE_DIR}/{}", plan.default_shell),
        ))?;
    }

    for file in &plan.files {
        add_parent_dirs(&mut set, &file.dest)?;
        set.add_from_source(&file.source, &file.dest)?;
    }

    Ok(set)
}

/// Add a directory for every ancestor of `path` not yet in the set,
/// shallowest first. The kernel unpacker does not create missing parents.
fn add_parent_dirs(set: &mut RecordSet, path: &str) -> Result<()> {
    for (end, _) in path.match_indices('/') {
        let parent = &path[..end];
        if parent.is_empty() || parent.ends_with('/') || set.contains(parent) {
            continue;
        }
        set.add(Record::directory(parent, PARENT_DIR_PERM))?;
    }
    Ok(())
}

/// Write every record in order, then the trailer exactly once.
pub fn write_archive(set: &RecordSet, writer: &mut impl RecordWriter) -> Result<()> {
    for record in set {
        writer.write_record(record)?;
    }
    writer.write_trailer()
}
