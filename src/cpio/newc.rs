//! CPIO archive writer (newc format).
//!
//! The newc format uses ASCII headers (110 bytes each) followed by the
//! NUL-terminated filename and the entry data, each padded to 4 bytes.
//! The archive ends with an empty entry named `TRAILER!!!`.

use std::fs::File;
use std::io::{self, Write};

use super::record::{Content, Record, RecordKind};
use super::set::regular_file_metadata;
use crate::error::{Error, Result};

/// Magic number of the "new ASCII" format.
pub const NEWC_MAGIC: &str = "070701";

/// Name of the end-of-archive entry.
pub const TRAILER_NAME: &str = "TRAILER!!!";

/// Fixed size of a newc header.
pub const HEADER_LEN: usize = 110;

/// Sink for archive records.
///
/// `write_trailer` must be called exactly once, after the last record.
pub trait RecordWriter {
    fn write_record(&mut self, record: &Record) -> Result<()>;
    fn write_trailer(&mut self) -> Result<()>;
}

/// Header fields that vary per entry. Ownership and mtime are always zero
/// so the same inputs produce the same bytes.
struct Header {
    ino: u32,
    mode: u32,
    nlink: u32,
    filesize: u32,
    rdev_major: u32,
    rdev_minor: u32,
    namesize: u32,
}

impl Header {
    fn format(&self) -> String {
        format!(
            "{NEWC_MAGIC}\
             {:08X}{:08X}{:08X}{:08X}{:08X}{:08X}{:08X}\
             {:08X}{:08X}{:08X}{:08X}{:08X}{:08X}",
            self.ino,
            self.mode,
            0, // c_uid
            0, // c_gid
            self.nlink,
            0, // c_mtime
            self.filesize,
            0, // c_devmajor
            0, // c_devminor
            self.rdev_major,
            self.rdev_minor,
            self.namesize,
            0, // c_check (always 0 for newc)
        )
    }
}

/// Encodes records into newc bytes on an underlying writer.
pub struct NewcWriter<W: Write> {
    inner: W,
    next_ino: u32,
    bytes_written: u64,
    finished: bool,
}

impl<W: Write> NewcWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            next_ino: 1,
            bytes_written: 0,
            finished: false,
        }
    }

    /// Total bytes emitted so far, padding included.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Whether the trailer has been written.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Give back the underlying writer.
    pub fn into_inner(self) -> W {
        self.inner
    }

    fn put(&mut self, buf: &[u8]) -> io::Result<()> {
        self.inner.write_all(buf)?;
        self.bytes_written += buf.len() as u64;
        Ok(())
    }

    fn pad(&mut self, len: u64) -> io::Result<()> {
        let pad = (align_to_4(len) - len) as usize;
        if pad > 0 {
            self.put(&[0u8; 3][..pad])?;
        }
        Ok(())
    }

    /// Header, name, NUL, and padding up to the data.
    fn put_header(&mut self, header: &Header, name: &str) -> io::Result<()> {
        self.put(header.format().as_bytes())?;
        self.put(name.as_bytes())?;
        self.put(&[0])?;
        self.pad(HEADER_LEN as u64 + u64::from(header.namesize))
    }

    fn put_content(&mut self, record: &Record) -> Result<()> {
        let encode = |e| Error::Encode {
            name: record.name.clone(),
            source: e,
        };

        match &record.kind {
            RecordKind::Directory | RecordKind::CharDevice { .. } => {}
            RecordKind::Symlink { target } => self.put(target.as_bytes()).map_err(encode)?,
            RecordKind::File(Content::Bytes(data)) => self.put(data).map_err(encode)?,
            RecordKind::File(Content::File { path, size }) => {
                self.stream_file(record, path, *size)?
            }
        }
        self.pad(record.size()).map_err(encode)
    }

    fn stream_file(&mut self, record: &Record, path: &std::path::Path, size: u64) -> Result<()> {
        let source_error = |e| Error::Source {
            path: path.to_path_buf(),
            source: e,
        };
        let mismatch = |actual| Error::SizeMismatch {
            name: record.name.clone(),
            expected: size,
            actual,
        };

        let actual = regular_file_metadata(path)?.len();
        if actual != size {
            return Err(mismatch(actual));
        }
        let file = File::open(path).map_err(source_error)?;

        let copied = io::copy(&mut io::Read::take(file, size), &mut self.inner).map_err(|e| {
            Error::Encode {
                name: record.name.clone(),
                source: e,
            }
        })?;
        self.bytes_written += copied;
        if copied != size {
            return Err(mismatch(copied));
        }
        Ok(())
    }
}

impl<W: Write> RecordWriter for NewcWriter<W> {
    fn write_record(&mut self, record: &Record) -> Result<()> {
        if self.finished {
            return Err(Error::TrailerWritten);
        }

        let filesize = u32::try_from(record.size()).map_err(|_| Error::Encode {
            name: record.name.clone(),
            source: io::Error::new(
                io::ErrorKind::InvalidInput,
                "entry larger than 4 GiB cannot be stored in newc",
            ),
        })?;
        let (rdev_major, rdev_minor) = match record.kind {
            RecordKind::CharDevice { major, minor } => (major, minor),
            _ => (0, 0),
        };
        let nlink = match record.kind {
            RecordKind::Directory => 2,
            _ => 1,
        };

        let header = Header {
            ino: self.next_ino,
            mode: record.mode(),
            nlink,
            filesize,
            rdev_major,
            rdev_minor,
            namesize: record.name.len() as u32 + 1,
        };
        self.next_ino += 1;

        self.put_header(&header, &record.name)
            .map_err(|e| Error::Encode {
                name: record.name.clone(),
                source: e,
            })?;
        self.put_content(record)
    }

    fn write_trailer(&mut self) -> Result<()> {
        if self.finished {
            return Err(Error::TrailerWritten);
        }

        let header = Header {
            ino: 0,
            mode: 0,
            nlink: 1,
            filesize: 0,
            rdev_major: 0,
            rdev_minor: 0,
            namesize: TRAILER_NAME.len() as u32 + 1,
        };
        self.put_header(&header, TRAILER_NAME)
            .map_err(|e| Error::Encode {
                name: TRAILER_NAME.to_string(),
                source: e,
            })?;
        self.finished = true;
        Ok(())
    }
}

/// Align value up to 4-byte boundary
fn align_to_4(n: u64) -> u64 {
    (n + 3) & !3
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn encode(records: &[Record]) -> Vec<u8> {
        let mut w = NewcWriter::new(Vec::new());
        for rec in records {
            w.write_record(rec).unwrap();
        }
        w.write_trailer().unwrap();
        w.into_inner()
    }

    #[test]
    fn test_header_format() {
        let header = Header {
            ino: 1,
            mode: 0o100755,
            nlink: 1,
            filesize: 100,
            rdev_major: 0,
            rdev_minor: 0,
            namesize: 5,
        };
        let s = header.format();
        assert_eq!(s.len(), HEADER_LEN);
        assert!(s.starts_with(NEWC_MAGIC));
        // c_mode is the second field.
        assert_eq!(&s[14..22], "000081ED");
    }

    #[test]
    fn test_align_to_4() {
        assert_eq!(align_to_4(0), 0);
        assert_eq!(align_to_4(1), 4);
        assert_eq!(align_to_4(3), 4);
        assert_eq!(align_to_4(4), 4);
        assert_eq!(align_to_4(5), 8);
    }

    #[test]
    fn test_char_device_rdev_fields() {
        let out = encode(&[Record::char_device("dev/console", 0o600, 5, 1)]);
        let header = std::str::from_utf8(&out[..HEADER_LEN]).unwrap();
        // c_rdevmajor and c_rdevminor are fields 10 and 11.
        assert_eq!(&header[6 + 9 * 8..6 + 10 * 8], "00000005");
        assert_eq!(&header[6 + 10 * 8..6 + 11 * 8], "00000001");
        assert_eq!(&header[14..22], "00002180");
    }

    #[test]
    fn test_symlink_target_is_data() {
        let out = encode(&[Record::symlink("init", "bbin/init")]);
        // 110 + "init\0" = 115, padded to 116.
        assert_eq!(&out[116..125], b"bbin/init");
        assert_eq!(&out[125..128], &[0, 0, 0]);
    }

    #[test]
    fn test_entries_are_aligned_and_trailer_terminates() {
        let out = encode(&[
            Record::directory("bin", 0o755),
            Record::file("bin/hello", 0o755, "Hello, World!"),
        ]);
        assert_eq!(out.len() % 4, 0);
        let trailer = format!("{TRAILER_NAME}\0");
        // 110 + 11 name bytes, padded by 3.
        let tail = &out[out.len() - 14..out.len() - 3];
        assert_eq!(tail, trailer.as_bytes());
    }

    #[test]
    fn test_bytes_written_matches_output() {
        let mut w = NewcWriter::new(Vec::new());
        w.write_record(&Record::file("a", 0o644, "abcde")).unwrap();
        w.write_trailer().unwrap();
        let written = w.bytes_written();
        assert_eq!(written, w.into_inner().len() as u64);
    }

    #[test]
    fn test_nothing_after_trailer() {
        let mut w = NewcWriter::new(Vec::new());
        w.write_trailer().unwrap();
        assert!(w.is_finished());
        assert!(matches!(
            w.write_record(&Record::directory("bin", 0o755)),
            Err(Error::TrailerWritten)
        ));
        assert!(matches!(w.write_trailer(), Err(Error::TrailerWritten)));
    }

    #[test]
    fn test_missing_host_file_is_source_error() {
        let mut w = NewcWriter::new(Vec::new());
        let rec = Record::host_file("x", 0o644, PathBuf::from("/nonexistent/mkinitramfs"), 3);
        assert!(matches!(w.write_record(&rec), Err(Error::Source { .. })));
    }

    #[test]
    fn test_host_file_size_change_is_detected() {
        let temp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(temp.path(), "grown since added").unwrap();

        let mut w = NewcWriter::new(Vec::new());
        let rec = Record::host_file("x", 0o644, temp.path().to_path_buf(), 4);
        assert!(matches!(
            w.write_record(&rec),
            Err(Error::SizeMismatch { expected: 4, actual: 17, .. })
        ));
    }

    #[test]
    fn test_host_file_replaced_by_fifo_is_rejected() {
        let temp = tempfile::TempDir::new().unwrap();
        let fifo = temp.path().join("pipe");
        let status = std::process::Command::new("mkfifo").arg(&fifo).status().unwrap();
        assert!(status.success(), "mkfifo failed");

        let (tx, rx) = std::sync::mpsc::channel();
        std::thread::spawn(move || {
            let mut w = NewcWriter::new(Vec::new());
            let rec = Record::host_file("etc/pipe", 0o644, fifo, 0);
            tx.send(w.write_record(&rec)).unwrap();
        });

        let result = rx
            .recv_timeout(std::time::Duration::from_secs(5))
            .expect("writer blocked opening a FIFO");
        assert!(matches!(result, Err(Error::NotRegularFile { .. })));
    }

    struct FailingSink;

    impl Write for FailingSink {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "disk full"))
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_sink_failure_names_record() {
        let mut w = NewcWriter::new(FailingSink);
        match w.write_record(&Record::directory("dev", 0o755)) {
            Err(Error::Encode { name, .. }) => assert_eq!(name, "dev"),
            other => panic!("expected encode error, got {other:?}"),
        }
    }
}
