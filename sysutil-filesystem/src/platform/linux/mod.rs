
use crate::platform::linux::types::{flags, LinuxHandle};
use crate::platform::{OpenOptions, Platform};
use crate::{CalendarTime, FileMetadata, FileType, Timespec};

mod path;
pub mod syscalls;
pub mod types;

#[cfg(test)]
mod tests;

pub use path::LinuxPath;

pub struct LinuxPlatform;

/// Map the `-errno` convention of [`syscalls`] onto a [`crate::Error`].
fn check_result(val: types::c_long) -> Result<types::c_long, crate::Error> {
    if val < 0 {
        let errno = types::c_int::try_from(-val).unwrap_or(types::errno::EINVAL);
        Err(crate::Error::from_linux_sys(errno))
    } else {
        Ok(val)
    }
}

/// Same as [`check_result`], for calls that return a descriptor.
fn check_handle(val: types::c_long) -> Result<LinuxHandle, crate::Error> {
    let fd = check_result(val)?;
    let fd = types::c_int::try_from(fd)
        .map_err(|_| crate::Error::InvalidData(format!("descriptor out of range: {fd}").into()))?;
    Ok(LinuxHandle::from_raw(fd))
}

/// Same as [`check_result`], for calls that return a byte count.
fn check_len(val: types::c_long) -> Result<usize, crate::Error> {
    let len = check_result(val)?;
    let len = usize::try_from(len).expect("checked that we're non-negative");
    Ok(len)
}

fn open_flags(options: OpenOptions) -> types::c_int {
    let mut flags = if options.contains(OpenOptions::READ_WRITE) {
        flags::O_RDWR
    } else {
        flags::O_RDONLY
    };

    if options.contains(OpenOptions::CREATE) {
        flags |= flags::O_CREAT;
    }
    if options.contains(OpenOptions::DIRECTORY) {
        flags |= flags::O_DIRECTORY;
    }

    flags | flags::O_CLOEXEC
}

impl Platform for LinuxPlatform {
    type Path = LinuxPath;
    type Handle = LinuxHandle;

    fn open(path: &Self::Path, options: OpenOptions, mode: u32) -> Result<Self::Handle, crate::Error> {
        let flags = open_flags(options);
        let result = unsafe { syscalls::open(path.as_c_str().as_ptr(), flags, mode) };
        check_handle(result).inspect_err(|err| tracing::debug!(?path, ?options, %err, "open failed"))
    }

    fn creat(path: &Self::Path, mode: u32) -> Result<Self::Handle, crate::Error> {
        let result = unsafe { syscalls::creat(path.as_c_str().as_ptr(), mode) };
        check_handle(result).inspect_err(|err| tracing::debug!(?path, mode, %err, "creat failed"))
    }

    fn close(handle: Self::Handle) -> Result<(), crate::Error> {
        // Handles are only ever created by this platform and closed once.
        let result = unsafe { syscalls::close(handle.into_raw()) };
        check_result(result)?;
        Ok(())
    }

    fn stat(path: &Self::Path) -> Result<FileMetadata, crate::Error> {
        let mut raw_stat = types::stat::default();

        let result = unsafe { syscalls::stat(path.as_c_str().as_ptr(), &mut raw_stat as *mut _) };
        check_result(result).inspect_err(|err| tracing::debug!(?path, %err, "stat failed"))?;

        let metadata = FileMetadata::try_from(raw_stat)?;
        Ok(metadata)
    }

    fn fstat(handle: Self::Handle) -> Result<FileMetadata, crate::Error> {
        let mut raw_stat = types::stat::default();

        let result = unsafe { syscalls::fstat(handle.into_raw(), &mut raw_stat as *mut _) };
        check_result(result)?;

        let metadata = FileMetadata::try_from(raw_stat)?;
        Ok(metadata)
    }

    fn read(handle: Self::Handle, buf: &mut [u8]) -> Result<usize, crate::Error> {
        let buf_ptr = buf.as_mut_ptr();
        let buf_len = buf.len();

        let result = unsafe { syscalls::read(handle.into_raw(), buf_ptr, buf_len) };
        check_len(result)
    }

    fn write(handle: Self::Handle, data: &[u8]) -> Result<usize, crate::Error> {
        let result = unsafe { syscalls::write(handle.into_raw(), data.as_ptr(), data.len()) };
        check_len(result)
    }

    fn truncate(path: &Self::Path, len: u64) -> Result<(), crate::Error> {
        let len = i64::try_from(len)
            .map_err(|_| crate::Error::InvalidData(format!("length too large: {len}").into()))?;
        let result = unsafe { syscalls::truncate(path.as_c_str().as_ptr(), len) };
        check_result(result).inspect_err(|err| tracing::debug!(?path, %err, "truncate failed"))?;
        Ok(())
    }

    fn unlink(path: &Self::Path) -> Result<(), crate::Error> {
        let result = unsafe { syscalls::unlink(path.as_c_str().as_ptr()) };
        check_result(result)?;
        Ok(())
    }

    fn mkdir(path: &Self::Path, mode: u32) -> Result<(), crate::Error> {
        let result = unsafe { syscalls::mkdir(path.as_c_str().as_ptr(), mode) };
        check_result(result)?;
        Ok(())
    }

    fn rmdir(path: &Self::Path) -> Result<(), crate::Error> {
        let result = unsafe { syscalls::rmdir(path.as_c_str().as_ptr()) };
        check_result(result)?;
        Ok(())
    }

    fn getdents(handle: Self::Handle, buf: &mut [u8]) -> Result<usize, crate::Error> {
        let result = unsafe { syscalls::getdents64(handle.into_raw(), buf.as_mut_ptr(), buf.len()) };
        check_len(result)
    }

    fn rewind(handle: Self::Handle) -> Result<(), crate::Error> {
        let result = syscalls::lseek(handle.into_raw(), 0, flags::SEEK_SET);
        check_result(result)?;
        Ok(())
    }

    fn time() -> Result<i64, crate::Error> {
        let result = unsafe { syscalls::time(std::ptr::null_mut()) };
        let secs = check_result(result)?;
        Ok(secs)
    }

    fn localtime(secs: i64) -> Result<CalendarTime, crate::Error> {
        let mut broken_down = types::tm::default();
        let result = unsafe { syscalls::localtime_r(&secs as *const _, &mut broken_down as *mut _) };
        if result.is_null() {
            let msg = format!("time out of range: {secs}").into();
            return Err(crate::Error::InvalidData(msg));
        }
        CalendarTime::try_from(broken_down)
    }

    fn stdout() -> Self::Handle {
        LinuxHandle::STDOUT
    }
}

impl TryFrom<types::stat> for FileMetadata {
    type Error = crate::Error;

    fn try_from(stat: types::stat) -> Result<Self, Self::Error> {
        let size = u64::try_from(stat.st_size).map_err(|_| {
            let msg = format!("negative file size: {}", stat.st_size).into();
            crate::Error::InvalidData(msg)
        })?;

        let mtime = Timespec {
            secs: stat.st_mtime,
            nanos: stat.st_mtime_nsec,
        };
        let atime = Timespec {
            secs: stat.st_atime,
            nanos: stat.st_atime_nsec,
        };
        let ctime = Timespec {
            secs: stat.st_ctime,
            nanos: stat.st_ctime_nsec,
        };

        let masked_kind = stat.st_mode & flags::S_IFMT;
        let kind = if masked_kind == flags::S_IFDIR {
            FileType::Directory
        } else if masked_kind == flags::S_IFREG {
            FileType::File
        } else if masked_kind == flags::S_IFLNK {
            FileType::Symlink
        } else {
            tracing::debug!(masked_kind, "special file");
            FileType::Other
        };

        let metadata = FileMetadata {
            kind,
            mode: stat.st_mode,
            links: u64::from(stat.st_nlink),
            user: stat.st_uid,
            group: stat.st_gid,
            size,
            device: stat.st_dev,
            inode: stat.st_ino,
            mtime,
            atime,
            ctime,
        };
        Ok(metadata)
    }
}

impl TryFrom<types::tm> for CalendarTime {
    type Error = crate::Error;

    fn try_from(tm: types::tm) -> Result<Self, Self::Error> {
        let field = |name: &str, val: types::c_int| {
            u32::try_from(val).map_err(|_| {
                crate::Error::InvalidData(format!("negative {name} in calendar time: {val}").into())
            })
        };

        Ok(CalendarTime {
            year: i64::from(tm.tm_year) + 1900,
            month: field("month", tm.tm_mon)?,
            day: field("day", tm.tm_mday)?,
            hour: field("hour", tm.tm_hour)?,
            minute: field("minute", tm.tm_min)?,
        })
    }
}

impl crate::Error {
    /// Create an [`Error`] from the errno reported by a system call.
    ///
    /// Derived from `asm-generic/errno-base.h`.
    ///
    /// [`Error`]: crate::Error
    pub fn from_linux_sys(val: types::c_int) -> Self {
        use types::errno::*;

        match val {
            ENOENT => crate::Error::NotFound,
            EPERM | EACCES => crate::Error::PermissionDenied,
            EEXIST => crate::Error::AlreadyExists,
            ENOTDIR => crate::Error::NotADirectory,
            EISDIR => crate::Error::IsADirectory,
            ENOTEMPTY => crate::Error::DirectoryNotEmpty,
            EBADF => crate::Error::BadDescriptor,
            EFAULT => crate::Error::BadAddress,
            EINVAL => crate::Error::InvalidArgument,
            ENAMETOOLONG => crate::Error::NameTooLong,
            x => crate::Error::Os(x),
        }
    }

    /// The errno this [`Error`] corresponds to, if it came from the kernel.
    ///
    /// [`Error`]: crate::Error
    pub fn raw_os_error(&self) -> Option<types::c_int> {
        use types::errno::*;

        let errno = match self {
            crate::Error::NotFound => ENOENT,
            crate::Error::PermissionDenied => EACCES,
            crate::Error::AlreadyExists => EEXIST,
            crate::Error::NotADirectory => ENOTDIR,
            crate::Error::IsADirectory => EISDIR,
            crate::Error::DirectoryNotEmpty => ENOTEMPTY,
            crate::Error::BadDescriptor => EBADF,
            crate::Error::BadAddress => EFAULT,
            crate::Error::InvalidArgument => EINVAL,
            crate::Error::NameTooLong => ENAMETOOLONG,
            crate::Error::Os(x) => *x,
            crate::Error::InvalidPath(_)
            | crate::Error::PathTooLong(_)
            | crate::Error::InvalidData(_)
            | crate::Error::SameFile => return None,
        };
        Some(errno)
    }
}
