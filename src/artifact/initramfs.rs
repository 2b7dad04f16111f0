//! Initramfs archive file creation.
//!
//! The archive is streamed into `<output>.tmp` next to the destination and
//! renamed into place only after the trailer is written and the buffer is
//! flushed (Atomic Artifacts). A failed build removes the temporary file and
//! leaves any previous `<output>` untouched.
//!
//! An existing output that is not a regular file (`/dev/stdout`, a FIFO, a
//! symlink) is opened and written in place instead: renaming over it would
//! replace the node rather than feed it.

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{debug, info, warn};

use crate::cpio::{NewcWriter, RecordSet};
use crate::initramfs::manifest::Manifest;
use crate::initramfs::{build_records, write_archive, Plan};
use crate::timing::Timer;

/// What a successful build produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactSummary {
    pub output: PathBuf,
    /// Records written, not counting the trailer.
    pub records: usize,
    /// Archive size in bytes.
    pub bytes: u64,
}

/// Build the archive described by `plan` and write it to `output`.
///
/// When `manifest` is given, a JSON listing of the archive is written there
/// after the archive is in place.
pub fn write_initramfs(
    plan: &Plan,
    output: &Path,
    manifest: Option<&Path>,
) -> Result<ArtifactSummary> {
    let timer = Timer::start("Built initramfs");

    // Configuration, conflict and source errors surface here, before any
    // output file exists.
    let records = build_records(plan)?;
    info!("Collected {} records", records.len());

    let (bytes, listing) = if writes_in_place(output) {
        debug!("{} is not a regular file, writing in place", output.display());
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(output)
            .with_context(|| format!("Failed to open {}", output.display()))?;
        let bytes = write_archive_file(&records, file, output)?;
        let listing = manifest
            .map(|_| Manifest::from_records(&records))
            .transpose()
            .context("Failed to describe archive contents")?;
        (bytes, listing)
    } else {
        write_atomically(&records, output, manifest.is_some())?
    };

    if let (Some(path), Some(mut listing)) = (manifest, listing) {
        listing.archive_bytes = Some(bytes);
        listing.write(path)?;
        info!("Manifest: {}", path.display());
    }

    timer.finish();
    info!("Output: {} ({} records, {} bytes)", output.display(), records.len(), bytes);

    Ok(ArtifactSummary {
        output: output.to_path_buf(),
        records: records.len(),
        bytes,
    })
}

/// Whether `output` already exists as something other than a regular file.
fn writes_in_place(output: &Path) -> bool {
    fs::symlink_metadata(output).is_ok_and(|meta| !meta.is_file())
}

/// Write through `<output>.tmp` and rename into place, describing the
/// contents first when a listing is wanted.
fn write_atomically(
    records: &RecordSet,
    output: &Path,
    describe: bool,
) -> Result<(u64, Option<Manifest>)> {
    let temp = temp_path(output);
    let created = File::create(&temp)
        .with_context(|| format!("Failed to create {}", temp.display()))
        .and_then(|file| write_archive_file(records, file, &temp));
    let bytes = match created {
        Ok(bytes) => bytes,
        Err(e) => {
            remove_temp(&temp);
            return Err(e);
        }
    };

    // Hash before the rename so a host file that vanished fails the build.
    let listing = describe
        .then(|| Manifest::from_records(records))
        .transpose()
        .context("Failed to describe archive contents")
        .and_then(|listing| {
            fs::rename(&temp, output).with_context(|| {
                format!("Failed to move {} to {}", temp.display(), output.display())
            })?;
            Ok(listing)
        });
    match listing {
        Ok(listing) => Ok((bytes, listing)),
        Err(e) => {
            remove_temp(&temp);
            Err(e)
        }
    }
}

/// Serialize `records` into `file` (opened from `path`), returning bytes
/// written.
///
/// The buffered writer is flushed explicitly so write errors are reported
/// instead of being lost on drop.
fn write_archive_file(records: &RecordSet, file: File, path: &Path) -> Result<u64> {
    let mut writer = NewcWriter::new(BufWriter::new(file));

    write_archive(records, &mut writer)?;

    let bytes = writer.bytes_written();
    writer
        .into_inner()
        .flush()
        .with_context(|| format!("Failed to flush {}", path.display()))?;
    Ok(bytes)
}

fn remove_temp(temp: &Path) {
    match fs::remove_file(temp) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Could not remove {}: {}", temp.display(), e),
    }
}

/// `<output>.tmp`, in the same directory so the rename stays on one filesystem.
fn temp_path(output: &Path) -> PathBuf {
    let mut name = OsString::from(output.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}
