//! Module that defines a strongly typed filesystem handle.

use std::borrow::Cow;

use crate::platform::{FilesystemPlatform, OpenOptions, Platform, PlatformHandleType};
use crate::platform::{PlatformPath, PlatformPathType};
use crate::FileMetadata;

/// [`Handle`] to a file.
pub type FileHandle = Handle<FileKind>;
/// [`Handle`] to a directory.
pub type DirectoryHandle = Handle<DirectoryKind>;

/// Type level marker for a handle to a file.
#[derive(Debug)]
pub struct FileKind;
/// Type level marker for a handle to a directory.
#[derive(Debug)]
pub struct DirectoryKind;

/// Opened handle to an object on the filesystem.
///
/// Handles should be closed with [`Handle::close`] so errors can be observed, a handle
/// that is dropped instead gets closed by its [`Drop`] impl and logs a warning.
#[derive(Debug)]
pub struct Handle<Kind> {
    /// Actual platform handle, generally a file descriptor.
    pub(crate) inner: Option<PlatformHandleType>,
    /// Reason this [`Handle`] was opened.
    pub(crate) diagnostics: Option<Cow<'static, str>>,

    /// Type-level flag for what kind of object this handle references.
    pub(crate) kind: Kind,
}

impl<K> Handle<K> {
    pub(crate) fn new(inner: PlatformHandleType, kind: K) -> Self {
        Handle {
            inner: Some(inner),
            diagnostics: None,
            kind,
        }
    }

    /// Get metadata about this handle.
    pub fn stat(&self) -> Result<FileMetadata, crate::Error> {
        FilesystemPlatform::fstat(self.to_inner())
    }

    /// Close the filesystem handle, releasing its resources.
    pub fn close(mut self) -> Result<(), crate::Error> {
        let inner = self
            .inner
            .take()
            .expect("programming error, handle closed twice?");
        FilesystemPlatform::close(inner)
    }

    pub(crate) fn to_inner(&self) -> PlatformHandleType {
        self.inner.expect("programming error, handle closed?")
    }
}

impl Handle<FileKind> {
    /// Read up to `buf.len()` bytes, returns `0` at the end of the file.
    pub fn read(&self, buf: &mut [u8]) -> Result<usize, crate::Error> {
        FilesystemPlatform::read(self.to_inner(), buf)
    }

    /// Write some prefix of `data`, returning how many bytes the kernel took.
    pub fn write(&self, data: &[u8]) -> Result<usize, crate::Error> {
        FilesystemPlatform::write(self.to_inner(), data)
    }

    /// Write all of `data`, issuing more writes when the kernel takes less than asked.
    pub fn write_all(&self, mut data: &[u8]) -> Result<(), crate::Error> {
        while !data.is_empty() {
            let written = self.write(data)?;
            if written == 0 {
                let msg = "write returned 0 with bytes remaining";
                return Err(crate::Error::InvalidData(msg.into()));
            }
            data = &data[written..];
        }
        Ok(())
    }
}

impl Handle<DirectoryKind> {
    /// Fill `buf` with raw directory entry records, returns `0` at the end of the directory.
    pub fn getdents(&self, buf: &mut [u8]) -> Result<usize, crate::Error> {
        FilesystemPlatform::getdents(self.to_inner(), buf)
    }

    /// Restart enumeration from the first entry.
    pub fn rewind(&self) -> Result<(), crate::Error> {
        FilesystemPlatform::rewind(self.to_inner())
    }
}

impl<K> Drop for Handle<K> {
    fn drop(&mut self) {
        let Some(inner) = self.inner.take() else {
            return;
        };
        let diagnostics = self.diagnostics.take();

        match FilesystemPlatform::close(inner) {
            Ok(()) => tracing::warn!(?inner, "handle dropped without close: {diagnostics:?}"),
            Err(err) => tracing::warn!(
                ?inner,
                "failed to close dropped handle for: {diagnostics:?}, err: {err}"
            ),
        }
    }
}

#[derive(Debug)]
pub struct UnknownDetails;

#[derive(Debug)]
pub struct FileDetails {
    flags: OpenOptions,
    mode: u32,
}

impl Default for FileDetails {
    fn default() -> Self {
        FileDetails {
            flags: OpenOptions::READ_ONLY,
            mode: 0o644,
        }
    }
}

#[derive(Debug)]
pub struct DirectoryDetails;

/// Builder struct for a [`Handle`].
#[derive(Debug)]
pub struct HandleBuilder<Details = UnknownDetails> {
    /// Reason this [`Handle`] was opened.
    pub(crate) diagnostics: Option<Cow<'static, str>>,

    /// Path we're opening.
    pub(crate) path: Vec<u8>,
    /// Details for opening a specific kind of file handle.
    pub(crate) details: Details,
}

impl HandleBuilder<UnknownDetails> {
    pub(crate) fn new(path: Vec<u8>) -> HandleBuilder<UnknownDetails> {
        HandleBuilder {
            diagnostics: None,
            path,
            details: UnknownDetails,
        }
    }
}

impl<D> HandleBuilder<D> {
    /// Tag this [`Handle`] with the reason we're opening it.
    pub fn diagnostics<T: Into<Cow<'static, str>>>(mut self, reason: T) -> Self {
        self.diagnostics = Some(reason.into());
        self
    }

    /// Open a file with this [`HandleBuilder`].
    pub fn as_file(self) -> HandleBuilder<FileDetails> {
        HandleBuilder {
            diagnostics: self.diagnostics,
            path: self.path,
            details: FileDetails::default(),
        }
    }

    /// Open a directory with this [`HandleBuilder`].
    pub fn as_directory(self) -> HandleBuilder<DirectoryDetails> {
        HandleBuilder {
            diagnostics: self.diagnostics,
            path: self.path,
            details: DirectoryDetails,
        }
    }
}

impl HandleBuilder<FileDetails> {
    /// Open the file for both reading and writing.
    pub fn with_read_write(mut self) -> Self {
        self.details.flags.remove(OpenOptions::READ_ONLY);
        self.details.flags |= OpenOptions::READ_WRITE;
        self
    }

    /// Create the file with permissions `mode` if it doesn't exist.
    pub fn with_create(mut self, mode: u32) -> Self {
        self.details.flags |= OpenOptions::CREATE;
        self.details.mode = mode;
        self
    }

    pub fn open(self) -> Result<FileHandle, crate::Error> {
        let path = PlatformPathType::try_new(&self.path)?;
        let inner = FilesystemPlatform::open(&path, self.details.flags, self.details.mode)?;

        let mut handle = Handle::new(inner, FileKind);
        handle.diagnostics = self.diagnostics;
        Ok(handle)
    }
}

impl HandleBuilder<DirectoryDetails> {
    pub fn open(self) -> Result<DirectoryHandle, crate::Error> {
        let path = PlatformPathType::try_new(&self.path)?;
        let options = OpenOptions::READ_ONLY | OpenOptions::DIRECTORY;
        let inner = FilesystemPlatform::open(&path, options, 0)?;

        let mut handle = Handle::new(inner, DirectoryKind);
        handle.diagnostics = self.diagnostics;
        Ok(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Filesystem;

    #[test]
    fn smoketest_write_all_and_read() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("handle.txt");
        let path = path.as_os_str().as_encoded_bytes();

        let fs = Filesystem::new_test();
        let file = fs
            .open(path)
            .as_file()
            .with_read_write()
            .with_create(0o600)
            .diagnostics("handle test")
            .open()
            .unwrap();
        file.write_all(b"hello handle").unwrap();
        assert_eq!(file.stat().unwrap().size(), 12);
        file.close().unwrap();

        let file = fs.open(path).as_file().open().unwrap();
        let mut buf = [0u8; 32];
        let read = file.read(&mut buf).unwrap();
        assert_eq!(&buf[..read], b"hello handle");
        assert_eq!(file.read(&mut buf).unwrap(), 0);
        file.close().unwrap();
    }

    #[test]
    fn test_open_directory_as_directory() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().as_os_str().as_encoded_bytes();

        let fs = Filesystem::new_test();
        let dir = fs.open(path).as_directory().open().unwrap();
        assert!(dir.stat().unwrap().is_dir());
        dir.close().unwrap();
    }

    #[test]
    fn test_open_file_as_directory_fails() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("not-a-dir");
        std::fs::write(&path, b"x").unwrap();

        let fs = Filesystem::new_test();
        let err = fs
            .open(path.as_os_str().as_encoded_bytes())
            .as_directory()
            .open()
            .unwrap_err();
        assert!(matches!(err, crate::Error::NotADirectory));
    }
}
