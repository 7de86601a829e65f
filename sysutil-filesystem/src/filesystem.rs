use sysutil_cfg::ConfigSet;

use crate::copy::{self, CopyOutcome};
use crate::dirent::DirectoryWalker;
use crate::handle::{FileHandle, FileKind, Handle, HandleBuilder};
use crate::platform::{FilesystemPlatform, Platform, PlatformPath, PlatformPathType};
use crate::{CalendarTime, FileMetadata};

/// A safe Filesystem abstraction.
///
/// The goal of this type is to abstract over platform specific implementations for
/// filesystem operations, provide cleanup of resources through typed [`Handle`]s, and
/// thread the runtime [`ConfigSet`] through to the operations that read it.
///
/// Paths are raw bytes, the kernel does not require them to be UTF-8.
#[derive(Clone, Debug)]
pub struct Filesystem {
    configs: ConfigSet,
}

impl Filesystem {
    pub fn new(configs: ConfigSet) -> Self {
        Filesystem { configs }
    }

    pub fn configs(&self) -> &ConfigSet {
        &self.configs
    }

    pub fn open(&self, path: impl AsRef<[u8]>) -> HandleBuilder {
        HandleBuilder::new(path.as_ref().to_vec())
    }

    pub fn stat(&self, path: impl AsRef<[u8]>) -> Result<FileMetadata, crate::Error> {
        let path = PlatformPathType::try_new(path.as_ref())?;
        FilesystemPlatform::stat(&path)
    }

    /// Create, or truncate, the file at `path` and open it for writing.
    pub fn creat(&self, path: impl AsRef<[u8]>, mode: u32) -> Result<FileHandle, crate::Error> {
        let path = PlatformPathType::try_new(path.as_ref())?;
        let inner = FilesystemPlatform::creat(&path, mode)?;
        Ok(Handle::new(inner, FileKind))
    }

    pub fn truncate(&self, path: impl AsRef<[u8]>, len: u64) -> Result<(), crate::Error> {
        let path = PlatformPathType::try_new(path.as_ref())?;
        FilesystemPlatform::truncate(&path, len)
    }

    pub fn unlink(&self, path: impl AsRef<[u8]>) -> Result<(), crate::Error> {
        let path = PlatformPathType::try_new(path.as_ref())?;
        FilesystemPlatform::unlink(&path)
    }

    pub fn mkdir(&self, path: impl AsRef<[u8]>, mode: u32) -> Result<(), crate::Error> {
        let path = PlatformPathType::try_new(path.as_ref())?;
        FilesystemPlatform::mkdir(&path, mode)
    }

    /// Remove the directory at `path`, which must be empty.
    pub fn rmdir(&self, path: impl AsRef<[u8]>) -> Result<(), crate::Error> {
        let path = PlatformPathType::try_new(path.as_ref())?;
        FilesystemPlatform::rmdir(&path)
    }

    /// Seconds since the Epoch.
    pub fn now(&self) -> Result<i64, crate::Error> {
        FilesystemPlatform::time()
    }

    /// Break `secs` since the Epoch down into local calendar time.
    pub fn localtime(&self, secs: i64) -> Result<CalendarTime, crate::Error> {
        FilesystemPlatform::localtime(secs)
    }

    /// Lazily enumerate the entries of the directory at `path`.
    ///
    /// Nothing is opened until the first entry is requested.
    pub fn walk(&self, path: impl AsRef<[u8]>) -> DirectoryWalker {
        let buffer_size = crate::cfgs::dirent_buffer_size(&self.configs);
        DirectoryWalker::new(path.as_ref().to_vec(), buffer_size)
    }

    /// Copy the file at `src` to `dest`, see [`copy::copy_file`].
    pub fn copy(
        &self,
        src: impl AsRef<[u8]>,
        dest: impl AsRef<[u8]>,
    ) -> Result<CopyOutcome, crate::Error> {
        copy::copy_file(self, src.as_ref(), dest.as_ref())
    }
}
