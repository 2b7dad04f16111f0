//! Directories and device nodes present in every initramfs.

use crate::cpio::Record;

/// Device nodes the kernel and early userspace expect before devtmpfs.
///
/// `(path, permissions, major, minor)`
pub const BASELINE_DEVICES: &[(&str, u32, u32, u32)] = &[
    ("dev/console", 0o600, 5, 1),
    ("dev/tty", 0o666, 5, 0),
    ("dev/null", 0o666, 1, 3),
    ("dev/port", 0o640, 1, 4),
    ("dev/urandom", 0o666, 1, 9),
];

/// Top-level directories, created before the device nodes.
pub const BASELINE_DIRS: &[&str] = &["bbin", "bin", "dev"];

/// The default baseline: directories first, then device nodes.
pub fn default_baseline() -> Vec<Record> {
    let dirs = BASELINE_DIRS
        .iter()
        .map(|dir| Record::directory(*dir, 0o755));
    let devices = BASELINE_DEVICES
        .iter()
        .map(|&(path, perm, major, minor)| Record::char_device(path, perm, major, minor));
    dirs.chain(devices).collect()
}
