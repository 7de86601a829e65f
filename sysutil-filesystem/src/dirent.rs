//! Lazy decoding of the raw directory entry records returned by the kernel.
//!
//! A [`DirectoryWalker`] reads a batch of `linux_dirent64` records into a buffer it owns
//! and hands out one [`DirectoryEntry`] at a time, each borrowing its name straight out
//! of that buffer. Records are variable length, the only way to find the next one is to
//! step forward by the current record's length.

use derivative::Derivative;
use sysutil_ore::cast::CastFrom;
use sysutil_ore::cstr;
use sysutil_ore::iter::LendingIterator;

use crate::handle::{DirectoryHandle, HandleBuilder};
use crate::platform::raw_types::dirent64::{D_INO, D_NAME, D_OFF, D_RECLEN, D_TYPE};
use crate::platform::raw_types::flags::{DT_DIR, DT_LNK, DT_REG, DT_UNKNOWN};
use crate::FileType;

/// Smallest record we accept, the fixed header plus a terminator.
pub const MIN_RECORD_LEN: usize = D_NAME + 1;

/// A single decoded directory entry, borrowed from a [`DirectoryWalker`]'s buffer.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DirectoryEntry<'a> {
    pub inode: u64,
    /// Opaque position of the next entry, as understood by the filesystem.
    pub next_offset: i64,
    /// Length of this record, including padding.
    pub record_len: usize,
    /// Kind of entry, `None` when the filesystem doesn't report it.
    pub kind: Option<FileType>,
    /// Name without the terminator.
    pub name: &'a [u8],
}

impl DirectoryEntry<'_> {
    /// Returns if this is the `.` or `..` entry.
    pub fn is_dot(&self) -> bool {
        self.name == b"." || self.name == b".."
    }
}

fn read_u64(batch: &[u8], at: usize) -> u64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&batch[at..at + 8]);
    u64::from_ne_bytes(bytes)
}

fn read_u16(batch: &[u8], at: usize) -> u16 {
    let mut bytes = [0u8; 2];
    bytes.copy_from_slice(&batch[at..at + 2]);
    u16::from_ne_bytes(bytes)
}

/// Validate the record starting at `offset` and return its length.
///
/// `batch` must be exactly the bytes the kernel returned, never the whole buffer.
pub fn record_len_at(batch: &[u8], offset: usize) -> Result<usize, crate::Error> {
    let header_end = offset.checked_add(MIN_RECORD_LEN);
    if header_end.is_none_or(|end| end > batch.len()) {
        let msg = format!("truncated record header at {offset} of {}", batch.len());
        return Err(crate::Error::InvalidData(msg.into()));
    }

    let record_len = usize::from(read_u16(batch, offset + D_RECLEN));
    if record_len < MIN_RECORD_LEN || offset + record_len > batch.len() {
        let msg = format!(
            "invalid record length {record_len} at {offset} of {}",
            batch.len()
        );
        return Err(crate::Error::InvalidData(msg.into()));
    }

    Ok(record_len)
}

/// Decode the record at `offset`, which must have been validated by [`record_len_at`].
pub fn decode_record(batch: &[u8], offset: usize, record_len: usize) -> DirectoryEntry<'_> {
    let record = &batch[offset..offset + record_len];

    let name_area = &record[D_NAME..];
    let name_len = usize::try_from(cstr::length(Some(name_area))).unwrap_or(0);

    let kind = match record[D_TYPE] {
        DT_UNKNOWN => None,
        DT_DIR => Some(FileType::Directory),
        DT_REG => Some(FileType::File),
        DT_LNK => Some(FileType::Symlink),
        _ => Some(FileType::Other),
    };

    DirectoryEntry {
        inode: read_u64(record, D_INO),
        next_offset: i64::from_ne_bytes(read_u64(record, D_OFF).to_ne_bytes()),
        record_len,
        kind,
        name: &name_area[..name_len],
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum WalkerState {
    /// Nothing has been opened yet.
    Unopened,
    /// The directory is open but no records have been read.
    Open,
    /// Records are being decoded out of the current batch.
    Scanning,
    /// The kernel reported the end of the directory, the handle is closed.
    Exhausted,
    /// Opening or reading failed, the handle is closed.
    Failed,
}

/// Lazily enumerates the entries of a single directory.
///
/// Entries are produced in the order the filesystem returns them, including `.` and `..`.
/// When a batch is fully consumed the walker asks the kernel for the next one, so the
/// whole directory is listed no matter how small the buffer is.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct DirectoryWalker {
    path: Vec<u8>,
    state: WalkerState,
    handle: Option<DirectoryHandle>,
    #[derivative(Debug = "ignore")]
    buffer: Box<[u8]>,
    /// Bytes of `buffer` filled by the last read.
    filled: usize,
    /// Start of the next record within `buffer`.
    offset: usize,
    /// Error to hand out on the next call to `next`.
    pending: Option<crate::Error>,

    bytes_returned: u64,
    bytes_consumed: u64,
}

impl DirectoryWalker {
    pub(crate) fn new(path: Vec<u8>, buffer_size: usize) -> Self {
        DirectoryWalker {
            path,
            state: WalkerState::Unopened,
            handle: None,
            buffer: vec![0u8; buffer_size].into_boxed_slice(),
            filled: 0,
            offset: 0,
            pending: None,
            bytes_returned: 0,
            bytes_consumed: 0,
        }
    }

    pub fn path(&self) -> &[u8] {
        &self.path
    }

    pub fn state(&self) -> WalkerState {
        self.state
    }

    /// Total bytes the kernel returned across every batch.
    pub fn bytes_returned(&self) -> u64 {
        self.bytes_returned
    }

    /// Total record lengths consumed across every batch.
    ///
    /// Equal to [`DirectoryWalker::bytes_returned`] whenever a batch has been fully scanned.
    pub fn bytes_consumed(&self) -> u64 {
        self.bytes_consumed
    }

    /// Restart enumeration from the first entry.
    pub fn rewind(&mut self) -> Result<(), crate::Error> {
        self.filled = 0;
        self.offset = 0;
        self.bytes_returned = 0;
        self.bytes_consumed = 0;
        self.pending = None;

        match &self.handle {
            Some(handle) => {
                if let Err(err) = handle.rewind() {
                    self.fail();
                    return Err(err);
                }
                self.state = WalkerState::Open;
            }
            None => self.state = WalkerState::Unopened,
        }
        Ok(())
    }

    fn open(&mut self) {
        let handle = HandleBuilder::new(self.path.clone())
            .diagnostics("directory walk")
            .as_directory()
            .open();
        match handle {
            Ok(handle) => {
                self.handle = Some(handle);
                self.state = WalkerState::Open;
            }
            Err(err) => {
                tracing::debug!(path = ?String::from_utf8_lossy(&self.path), %err, "failed to open directory");
                self.state = WalkerState::Failed;
                self.pending = Some(err);
            }
        }
    }

    /// Read the next batch, only called once the current one has been consumed.
    fn refill(&mut self) {
        debug_assert_eq!(self.offset, self.filled, "refilling a partially scanned batch");
        debug_assert_eq!(self.bytes_returned, self.bytes_consumed);

        let Some(handle) = &self.handle else {
            self.state = WalkerState::Exhausted;
            return;
        };

        match handle.getdents(&mut self.buffer[..]) {
            Ok(0) => {
                tracing::trace!(path = ?String::from_utf8_lossy(&self.path), "directory exhausted");
                self.filled = 0;
                self.offset = 0;
                self.state = WalkerState::Exhausted;
                self.release();
            }
            Ok(filled) => {
                self.filled = filled;
                self.offset = 0;
                self.bytes_returned += u64::cast_from(filled);
                self.state = WalkerState::Scanning;
            }
            Err(err) => {
                self.fail();
                self.pending = Some(err);
            }
        }
    }

    fn fail(&mut self) {
        self.state = WalkerState::Failed;
        self.filled = 0;
        self.offset = 0;
        self.release();
    }

    fn release(&mut self) {
        if let Some(handle) = self.handle.take() {
            if let Err(err) = handle.close() {
                tracing::warn!(path = ?String::from_utf8_lossy(&self.path), %err, "failed to close directory");
            }
        }
    }
}

impl LendingIterator for DirectoryWalker {
    type Item<'a>
        = Result<DirectoryEntry<'a>, crate::Error>
    where
        Self: 'a;

    fn next(&mut self) -> Option<Self::Item<'_>> {
        loop {
            if let Some(err) = self.pending.take() {
                return Some(Err(err));
            }
            match self.state {
                WalkerState::Unopened => self.open(),
                WalkerState::Open => self.refill(),
                WalkerState::Scanning if self.offset < self.filled => break,
                WalkerState::Scanning => self.refill(),
                WalkerState::Exhausted | WalkerState::Failed => return None,
            }
        }

        let offset = self.offset;
        let record_len = match record_len_at(&self.buffer[..self.filled], offset) {
            Ok(len) => len,
            Err(err) => {
                self.fail();
                return Some(Err(err));
            }
        };
        self.offset += record_len;
        self.bytes_consumed += u64::cast_from(record_len);

        let entry = decode_record(&self.buffer[..self.filled], offset, record_len);
        Some(Ok(entry))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Filesystem;

    fn make_dirent64(d_ino: u64, d_off: i64, d_type: u8, name: &[u8]) -> Vec<u8> {
        let reclen = (D_NAME + name.len() + 1).div_ceil(8) * 8;
        let mut buf = vec![0u8; reclen];
        buf[D_INO..D_INO + 8].copy_from_slice(&d_ino.to_ne_bytes());
        buf[D_OFF..D_OFF + 8].copy_from_slice(&d_off.to_ne_bytes());
        buf[D_RECLEN..D_RECLEN + 2].copy_from_slice(&(reclen as u16).to_ne_bytes());
        buf[D_TYPE] = d_type;
        buf[D_NAME..D_NAME + name.len()].copy_from_slice(name);
        buf
    }

    #[test]
    fn test_decode_batch() {
        let mut batch = make_dirent64(2, 1, DT_DIR, b".");
        batch.extend(make_dirent64(1, 2, DT_DIR, b".."));
        batch.extend(make_dirent64(42, 3, DT_REG, b"hello.txt"));

        let mut offset = 0;
        let mut names = Vec::new();
        while offset < batch.len() {
            let len = record_len_at(&batch, offset).unwrap();
            let entry = decode_record(&batch, offset, len);
            names.push((entry.inode, entry.kind, entry.name.to_vec()));
            offset += len;
        }
        assert_eq!(offset, batch.len());
        assert_eq!(
            names,
            vec![
                (2, Some(FileType::Directory), b".".to_vec()),
                (1, Some(FileType::Directory), b"..".to_vec()),
                (42, Some(FileType::File), b"hello.txt".to_vec()),
            ]
        );
    }

    #[test]
    fn test_invalid_record_len() {
        let mut record = make_dirent64(7, 1, DT_REG, b"file");
        let len = record.len();

        // Claims to extend past the end of the batch.
        record[D_RECLEN..D_RECLEN + 2].copy_from_slice(&((len + 8) as u16).to_ne_bytes());
        assert!(record_len_at(&record, 0).is_err());

        // Zero would never advance.
        record[D_RECLEN..D_RECLEN + 2].copy_from_slice(&0u16.to_ne_bytes());
        assert!(record_len_at(&record, 0).is_err());

        // Header doesn't fit.
        assert!(record_len_at(&record[..10], 0).is_err());
        assert!(record_len_at(&record, usize::MAX).is_err());
    }

    #[test]
    fn test_unknown_type() {
        let record = make_dirent64(7, 1, DT_UNKNOWN, b"mystery");
        let entry = decode_record(&record, 0, record.len());
        assert_eq!(entry.kind, None);
        assert_eq!(entry.name, b"mystery");
        assert!(!entry.is_dot());
    }

    #[test]
    fn smoketest_walk() {
        let temp = tempfile::TempDir::new().unwrap();
        for name in ["a.txt", "b.txt", "c.txt"] {
            std::fs::write(temp.path().join(name), name).unwrap();
        }
        std::fs::create_dir(temp.path().join("sub")).unwrap();

        let fs = Filesystem::new_test();
        let mut walker = fs.walk(temp.path().as_os_str().as_encoded_bytes());
        assert_eq!(walker.state(), WalkerState::Unopened);

        let mut names = Vec::new();
        while let Some(entry) = walker.next() {
            let entry = entry.unwrap();
            names.push(String::from_utf8(entry.name.to_vec()).unwrap());
        }
        names.sort();

        assert_eq!(names, vec![".", "..", "a.txt", "b.txt", "c.txt", "sub"]);
        assert_eq!(walker.state(), WalkerState::Exhausted);
        assert!(walker.bytes_returned() > 0);
        assert_eq!(walker.bytes_returned(), walker.bytes_consumed());
    }

    #[test]
    fn test_walk_empty_dir() {
        let temp = tempfile::TempDir::new().unwrap();

        let fs = Filesystem::new_test();
        let walker = fs.walk(temp.path().as_os_str().as_encoded_bytes());
        // Just `.` and `..`.
        assert_eq!(walker.count(), 2);
    }

    #[test]
    fn test_walk_refills_small_buffer() {
        let temp = tempfile::TempDir::new().unwrap();
        let count = 200;
        for i in 0..count {
            let name = format!("a-fairly-long-file-name-to-fill-the-buffer-{i:04}");
            std::fs::write(temp.path().join(name), b"").unwrap();
        }

        let fs = Filesystem::new_test();
        fs.configs()
            .update(&crate::cfgs::DIRENT_BUFFER_SIZE, 4096);
        let mut walker = fs.walk(temp.path().as_os_str().as_encoded_bytes());

        let mut seen = 0;
        while let Some(entry) = walker.next() {
            if !entry.unwrap().is_dot() {
                seen += 1;
            }
        }
        assert_eq!(seen, count);
        assert!(walker.bytes_returned() > 4096);
        assert_eq!(walker.bytes_returned(), walker.bytes_consumed());
    }

    #[test]
    fn test_walk_missing_dir() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("nope");

        let fs = Filesystem::new_test();
        let mut walker = fs.walk(path.as_os_str().as_encoded_bytes());
        let err = walker.next().unwrap().unwrap_err();
        assert!(matches!(err, crate::Error::NotFound));
        assert!(walker.next().is_none());
        assert_eq!(walker.state(), WalkerState::Failed);
    }

    #[test]
    fn test_rewind() {
        let temp = tempfile::TempDir::new().unwrap();
        std::fs::write(temp.path().join("only"), b"").unwrap();

        let fs = Filesystem::new_test();
        let mut walker = fs.walk(temp.path().as_os_str().as_encoded_bytes());

        // Partially consume, then restart.
        assert!(walker.next().unwrap().is_ok());
        walker.rewind().unwrap();
        assert_eq!(walker.state(), WalkerState::Open);

        let mut total = 0;
        while let Some(entry) = walker.next() {
            entry.unwrap();
            total += 1;
        }
        assert_eq!(total, 3);

        // Rewinding an exhausted walker reopens the directory.
        walker.rewind().unwrap();
        assert_eq!(walker.state(), WalkerState::Unopened);
        assert_eq!(walker.count(), 3);
    }
}
