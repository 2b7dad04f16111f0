//! Shared test utilities for mkinitramfs tests.
#![allow(dead_code)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// Test environment with a temporary directory for sources and output.
pub struct TestEnv {
    /// Temporary directory (kept alive for lifetime of TestEnv)
    pub _temp_dir: TempDir,
    /// Directory holding host files to embed
    pub sources: PathBuf,
    /// Archive output path
    pub output: PathBuf,
}

impl TestEnv {
    /// Create a new test environment with temporary directories.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let sources = temp_dir.path().join("sources");
        let output = temp_dir.path().join("initramfs.cpio");

        fs::create_dir_all(&sources).expect("Failed to create sources dir");

        Self {
            _temp_dir: temp_dir,
            sources,
            output,
        }
    }

    /// Write a host file under `sources` and return its path.
    pub fn source_file(&self, name: &str, content: &[u8], mode: u32) -> PathBuf {
        let path = self.sources.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent dir");
        }
        fs::write(&path, content).expect("Failed to write source file");
        fs::set_permissions(&path, fs::Permissions::from_mode(mode))
            .expect("Failed to set permissions");
        path
    }

    /// Create a mock multi-call executable named `bb`.
    pub fn mock_executable(&self) -> PathBuf {
        self.mock_executable_named("bb")
    }

    /// Create a mock multi-call executable with the given host file name.
    pub fn mock_executable_named(&self, name: &str) -> PathBuf {
        self.source_file(name, b"\x7fELF mock multi-call binary\n", 0o755)
    }

    /// Create a named pipe under `sources`.
    pub fn fifo(&self, name: &str) -> PathBuf {
        let path = self.sources.join(name);
        let status = Command::new("mkfifo")
            .arg(&path)
            .status()
            .expect("Failed to run mkfifo");
        assert!(status.success(), "mkfifo {} failed", path.display());
        path
    }

    /// Read and decode the output archive.
    pub fn read_archive(&self) -> Vec<Entry> {
        let data = fs::read(&self.output).expect("Failed to read archive");
        parse_newc(&data)
    }

    /// Path of the temporary file used while writing.
    pub fn temp_output(&self) -> PathBuf {
        PathBuf::from(format!("{}.tmp", self.output.display()))
    }
}

/// One decoded newc entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub ino: u32,
    pub mode: u32,
    pub uid: u32,
    pub gid: u32,
    pub nlink: u32,
    pub mtime: u32,
    pub rdev_major: u32,
    pub rdev_minor: u32,
    pub name: String,
    pub data: Vec<u8>,
}

impl Entry {
    pub fn file_type(&self) -> u32 {
        self.mode & 0o170000
    }

    pub fn perm(&self) -> u32 {
        self.mode & 0o7777
    }

    pub fn is_trailer(&self) -> bool {
        self.name == "TRAILER!!!"
    }
}

fn hex_field(header: &[u8], index: usize) -> u32 {
    let start = 6 + index * 8;
    let text = std::str::from_utf8(&header[start..start + 8]).expect("header is not ASCII");
    u32::from_str_radix(text, 16).expect("header field is not hex")
}

fn align4(n: usize) -> usize {
    (n + 3) & !3
}

/// Decode a complete newc stream, trailer included, checking magic,
/// NUL-terminated names and 4-byte alignment along the way.
pub fn parse_newc(data: &[u8]) -> Vec<Entry> {
    let mut entries = Vec::new();
    let mut pos = 0;

    while pos < data.len() {
        assert_eq!(pos % 4, 0, "entry at {pos} is not 4-byte aligned");
        let header = &data[pos..pos + 110];
        assert_eq!(&header[..6], b"070701", "bad magic at {pos}");

        let filesize = hex_field(header, 6) as usize;
        let namesize = hex_field(header, 11) as usize;
        assert_eq!(hex_field(header, 12), 0, "c_check must be zero");

        let name_start = pos + 110;
        let name_bytes = &data[name_start..name_start + namesize];
        assert_eq!(name_bytes.last(), Some(&0), "name is not NUL-terminated");
        let name = String::from_utf8(name_bytes[..namesize - 1].to_vec()).expect("name is not UTF-8");

        let data_start = align4(name_start + namesize);
        let entry_data = data[data_start..data_start + filesize].to_vec();
        pos = align4(data_start + filesize);

        let entry = Entry {
            ino: hex_field(header, 0),
            mode: hex_field(header, 1),
            uid: hex_field(header, 2),
            gid: hex_field(header, 3),
            nlink: hex_field(header, 4),
            mtime: hex_field(header, 5),
            rdev_major: hex_field(header, 9),
            rdev_minor: hex_field(header, 10),
            name,
            data: entry_data,
        };
        let done = entry.is_trailer();
        entries.push(entry);
        if done {
            break;
        }
    }

    assert_eq!(pos, data.len(), "bytes after trailer");
    entries
}

/// Find an entry by name.
pub fn find<'a>(entries: &'a [Entry], name: &str) -> &'a Entry {
    entries
        .iter()
        .find(|e| e.name == name)
        .unwrap_or_else(|| panic!("no entry named {name}"))
}

/// Assert that an entry is a symlink pointing to the expected target.
pub fn assert_symlink(entries: &[Entry], name: &str, expected_target: &str) {
    let entry = find(entries, name);
    assert_eq!(
        entry.file_type(),
        0o120000,
        "Expected symlink at {name}, got mode {:o}",
        entry.mode
    );
    assert_eq!(
        String::from_utf8_lossy(&entry.data),
        expected_target,
        "Symlink {name} points to the wrong target"
    );
}

/// Assert that an entry is a character device with the given numbers.
pub fn assert_char_device(entries: &[Entry], name: &str, perm: u32, major: u32, minor: u32) {
    let entry = find(entries, name);
    assert_eq!(entry.file_type(), 0o020000, "{name} is not a char device");
    assert_eq!(entry.perm(), perm, "{name} has wrong permissions");
    assert_eq!((entry.rdev_major, entry.rdev_minor), (major, minor), "{name} device numbers");
}

/// Assert that a path does not exist on disk.
pub fn assert_not_exists(path: &Path) {
    assert!(!path.exists(), "Expected {} not to exist", path.display());
}
