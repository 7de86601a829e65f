//! Abstract interface for a specific platform, e.g. `linux`.
//!
//! The raw layer underneath a [`Platform`] speaks the kernel's integer convention, a
//! [`Platform`] turns that into `Result`s so nothing above it ever inspects an errno.

use bitflags::bitflags;
use std::fmt::Debug;

use crate::{CalendarTime, Error, FileMetadata};

bitflags! {
    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    pub struct OpenOptions: u32 {
        const READ_ONLY = 0b0000_0001;
        const READ_WRITE = 0b0000_0010;
        const CREATE = 0b0000_1000;

        /// Restrict opening to just directories.
        const DIRECTORY = 0b0100_0000;
    }
}

impl Default for OpenOptions {
    fn default() -> Self {
        OpenOptions::READ_ONLY
    }
}

/// Platform specific filesystem operations.
///
/// One method per system call, each attempted exactly once.
pub trait Platform {
    type Path: PlatformPath;
    type Handle: Debug + Copy;

    /// Open the file at `path`, `mode` is used when `options` contains [`OpenOptions::CREATE`].
    fn open(path: &Self::Path, options: OpenOptions, mode: u32) -> Result<Self::Handle, Error>;
    /// Create, or truncate, the file at `path` and open it for writing.
    fn creat(path: &Self::Path, mode: u32) -> Result<Self::Handle, Error>;
    fn close(handle: Self::Handle) -> Result<(), Error>;

    fn stat(path: &Self::Path) -> Result<FileMetadata, Error>;
    fn fstat(handle: Self::Handle) -> Result<FileMetadata, Error>;

    fn read(handle: Self::Handle, buf: &mut [u8]) -> Result<usize, Error>;
    fn write(handle: Self::Handle, data: &[u8]) -> Result<usize, Error>;
    fn truncate(path: &Self::Path, len: u64) -> Result<(), Error>;

    fn unlink(path: &Self::Path) -> Result<(), Error>;
    fn mkdir(path: &Self::Path, mode: u32) -> Result<(), Error>;
    fn rmdir(path: &Self::Path) -> Result<(), Error>;

    /// Fill `buf` with raw directory entry records, returns `0` at the end of the directory.
    fn getdents(handle: Self::Handle, buf: &mut [u8]) -> Result<usize, Error>;
    /// Move the offset of `handle` back to the start.
    fn rewind(handle: Self::Handle) -> Result<(), Error>;

    /// Seconds since the Epoch.
    fn time() -> Result<i64, Error>;
    /// Break `secs` since the Epoch down into local calendar time.
    fn localtime(secs: i64) -> Result<CalendarTime, Error>;

    /// Handle for the process' standard output.
    fn stdout() -> Self::Handle;
}

pub trait PlatformPath: Debug + Clone {
    fn try_new(val: &[u8]) -> Result<Self, crate::Error>;
}

/// Type alias for the [`Platform::Handle`] associated type for the current [`FilesystemPlatform`].
pub type PlatformHandleType = <FilesystemPlatform as Platform>::Handle;
/// Type alias for the [`Platform::Path`] associated type for the current [`FilesystemPlatform`].
pub type PlatformPathType = <FilesystemPlatform as Platform>::Path;

cfg_if::cfg_if! {
    if #[cfg(target_os = "linux")] {
        mod linux;
        pub use linux::LinuxPlatform as FilesystemPlatform;
        /// Raw syscall wrappers, `-errno` on failure.
        pub use linux::syscalls as raw;
        /// Kernel types and constants used by [`raw`].
        pub use linux::types as raw_types;
    } else {
        compile_error!("sysutil talks to the kernel directly and only supports Linux");
    }
}
