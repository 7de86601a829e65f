//! Filesystem access that talks to the kernel directly.
//!
//! Every operation ends up as exactly one system call issued by the [`platform`] layer,
//! there is no libc `stdio` or `std::fs` underneath. On top of that sit strongly typed
//! [`handle::Handle`]s, a lazy [`dirent::DirectoryWalker`], the long listing
//! [`format`]ter, and the [`copy`] engine.

use std::borrow::Cow;

use sysutil_ore::cstr::CapacityError;

pub mod cfgs;
pub mod copy;
pub mod dirent;
pub mod filesystem;
pub mod format;
pub mod handle;
pub mod path;
pub mod platform;
pub mod stdio;


pub use filesystem::Filesystem;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FileMetadata {
    /// Kind of file, derived from the type bits of `mode`.
    kind: FileType,
    /// File mode, type and permission bits.
    mode: u32,
    /// Number of hard links.
    links: u64,
    /// User ID of the file owner.
    user: u32,
    /// Group ID of the file owner.
    group: u32,
    /// Size of a file in bytes.
    size: u64,
    /// Inode number of the file.
    inode: u64,
    /// Device containing the file.
    device: u64,
    /// File modified time.
    ///
    /// Generally changes when the file content changes.
    mtime: Timespec,
    /// Last access time.
    atime: Timespec,
    /// Attribute change time.
    ///
    /// Changes whenever file ownership, size, or link count changes.
    ctime: Timespec,
}

impl FileMetadata {
    pub fn kind(&self) -> FileType {
        self.kind
    }

    pub fn is_dir(&self) -> bool {
        self.kind == FileType::Directory
    }

    pub fn is_file(&self) -> bool {
        self.kind == FileType::File
    }

    pub fn mode(&self) -> u32 {
        self.mode
    }

    /// Permission bits of `mode`, with the file type masked off.
    pub fn permissions(&self) -> u32 {
        self.mode & platform::raw_types::flags::S_IALLUGO
    }

    pub fn links(&self) -> u64 {
        self.links
    }

    pub fn user(&self) -> u32 {
        self.user
    }

    pub fn group(&self) -> u32 {
        self.group
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn inode(&self) -> u64 {
        self.inode
    }

    pub fn device(&self) -> u64 {
        self.device
    }

    pub fn mtime(&self) -> Timespec {
        self.mtime
    }

    pub fn atime(&self) -> Timespec {
        self.atime
    }

    pub fn ctime(&self) -> Timespec {
        self.ctime
    }

    /// Returns if `self` and `other` describe the same object on the filesystem.
    pub fn same_file(&self, other: &FileMetadata) -> bool {
        self.device == other.device && self.inode == other.inode
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Timespec {
    /// Seconds.
    pub secs: i64,
    /// Nanoseconds.
    ///
    /// Not all filesystems provide this, thus often it will be 0.
    pub nanos: i64,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FileType {
    File,
    Directory,
    Symlink,
    /// Devices, pipes, sockets.
    Other,
}

/// Seconds since the Epoch broken down into local calendar time.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct CalendarTime {
    pub year: i64,
    /// Months since January, `0..=11`.
    pub month: u32,
    /// Day of the month, `1..=31`.
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("No such file or directory")]
    NotFound,
    #[error("Permission denied")]
    PermissionDenied,
    #[error("File exists")]
    AlreadyExists,
    #[error("Not a directory")]
    NotADirectory,
    #[error("Is a directory")]
    IsADirectory,
    #[error("Directory not empty")]
    DirectoryNotEmpty,
    #[error("Bad file descriptor")]
    BadDescriptor,
    #[error("Bad address")]
    BadAddress,
    #[error("Invalid argument")]
    InvalidArgument,
    #[error("File name too long")]
    NameTooLong,
    #[error("invalid path: {0}")]
    InvalidPath(Cow<'static, str>),
    #[error("path too long: {0}")]
    PathTooLong(#[from] CapacityError),
    #[error("invalid data: {0}")]
    InvalidData(Cow<'static, str>),
    #[error("are the same file")]
    SameFile,
    #[error("os error {0}")]
    Os(i32),
}

impl From<Error> for std::io::Error {
    fn from(err: Error) -> Self {
        match err.raw_os_error() {
            Some(errno) => std::io::Error::from_raw_os_error(errno),
            None => std::io::Error::other(err),
        }
    }
}
