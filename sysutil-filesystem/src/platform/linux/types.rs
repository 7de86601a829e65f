#![allow(non_camel_case_types)]

//! Types used by the Linux platform.
//!
//! Layouts mirror the kernel's UAPI headers for the architectures we support. Anything that
//! differs between architectures is `cfg`-ed here so that nothing above the platform layer
//! needs to care.

pub use std::ffi::{c_char, c_int, c_long};

pub type file_descriptor = c_int;
pub type mode_t = u32;
pub type off_t = i64;
pub type time_t = i64;

pub mod flags {
    use super::*;

    pub const O_RDONLY: c_int = 0o0;
    pub const O_WRONLY: c_int = 0o1;
    pub const O_RDWR: c_int = 0o2;
    pub const O_CREAT: c_int = 0o100;
    pub const O_TRUNC: c_int = 0o1000;
    pub const O_CLOEXEC: c_int = 0o2000000;
    #[cfg(target_arch = "x86_64")]
    pub const O_DIRECTORY: c_int = 0o200000;
    #[cfg(target_arch = "aarch64")]
    pub const O_DIRECTORY: c_int = 0o40000;

    /// Resolve relative paths against the current working directory.
    pub const AT_FDCWD: c_int = -100;
    /// Make `unlinkat` behave like `rmdir`.
    pub const AT_REMOVEDIR: c_int = 0x200;

    pub const SEEK_SET: c_int = 0;
    pub const CLOCK_REALTIME: c_int = 0;

    /// Mask for the file type bits of `st_mode`.
    pub const S_IFMT: u32 = 0o170000;
    pub const S_IFDIR: u32 = 0o040000;
    pub const S_IFREG: u32 = 0o100000;
    pub const S_IFLNK: u32 = 0o120000;
    /// Mask for the permission bits of `st_mode`, including setuid/setgid/sticky.
    pub const S_IALLUGO: u32 = 0o7777;

    pub const DT_UNKNOWN: u8 = 0;
    pub const DT_DIR: u8 = 4;
    pub const DT_REG: u8 = 8;
    pub const DT_LNK: u8 = 10;
}

/// `errno` values we map to specific [`crate::Error`] variants.
pub mod errno {
    use super::c_int;

    pub const EPERM: c_int = 1;
    pub const ENOENT: c_int = 2;
    pub const EBADF: c_int = 9;
    pub const EACCES: c_int = 13;
    pub const EFAULT: c_int = 14;
    pub const EEXIST: c_int = 17;
    pub const ENOTDIR: c_int = 20;
    pub const EISDIR: c_int = 21;
    pub const EINVAL: c_int = 22;
    pub const ENAMETOOLONG: c_int = 36;
    pub const ENOTEMPTY: c_int = 39;
}

/// Data returned by calls to the `stat` family of syscalls.
#[cfg(target_arch = "x86_64")]
#[repr(C)]
#[derive(Debug, Default, Copy, Clone)]
pub struct stat {
    pub st_dev: u64,
    pub st_ino: u64,
    pub st_nlink: u64,
    pub st_mode: u32,
    pub st_uid: u32,
    pub st_gid: u32,
    pub __pad0: i32,
    pub st_rdev: u64,
    pub st_size: i64,
    pub st_blksize: i64,
    pub st_blocks: i64,
    pub st_atime: i64,
    pub st_atime_nsec: i64,
    pub st_mtime: i64,
    pub st_mtime_nsec: i64,
    pub st_ctime: i64,
    pub st_ctime_nsec: i64,
    pub __unused: [i64; 3],
}

#[cfg(target_arch = "x86_64")]
const _: () = assert!(std::mem::size_of::<stat>() == 144);

/// Data returned by calls to the `stat` family of syscalls.
///
/// aarch64 uses the generic layout from `asm-generic/stat.h`.
#[cfg(target_arch = "aarch64")]
#[repr(C)]
#[derive(Debug, Default, Copy, Clone)]
pub struct stat {
    pub st_dev: u64,
    pub st_ino: u64,
    pub st_mode: u32,
    pub st_nlink: u32,
    pub st_uid: u32,
    pub st_gid: u32,
    pub st_rdev: u64,
    pub __pad1: u64,
    pub st_size: i64,
    pub st_blksize: i32,
    pub __pad2: i32,
    pub st_blocks: i64,
    pub st_atime: i64,
    pub st_atime_nsec: i64,
    pub st_mtime: i64,
    pub st_mtime_nsec: i64,
    pub st_ctime: i64,
    pub st_ctime_nsec: i64,
    pub __unused: [u32; 2],
}

#[cfg(target_arch = "aarch64")]
const _: () = assert!(std::mem::size_of::<stat>() == 128);

#[repr(C)]
#[derive(Debug, Default, Copy, Clone)]
pub struct timespec {
    pub tv_sec: time_t,
    pub tv_nsec: c_long,
}

/// Broken down calendar time, filled in by `localtime_r`.
#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct tm {
    pub tm_sec: c_int,
    pub tm_min: c_int,
    pub tm_hour: c_int,
    /// Day of the month, 1 to 31.
    pub tm_mday: c_int,
    /// Months since January, 0 to 11.
    pub tm_mon: c_int,
    /// Years since 1900.
    pub tm_year: c_int,
    pub tm_wday: c_int,
    pub tm_yday: c_int,
    pub tm_isdst: c_int,
    pub tm_gmtoff: c_long,
    pub tm_zone: *const c_char,
}

impl Default for tm {
    fn default() -> Self {
        tm {
            tm_sec: 0,
            tm_min: 0,
            tm_hour: 0,
            tm_mday: 0,
            tm_mon: 0,
            tm_year: 0,
            tm_wday: 0,
            tm_yday: 0,
            tm_isdst: 0,
            tm_gmtoff: 0,
            tm_zone: std::ptr::null(),
        }
    }
}

/// Byte layout of a `linux_dirent64` record as returned by `getdents64`.
///
/// ```text
///   offset 0:  d_ino    (u64)
///   offset 8:  d_off    (i64)
///   offset 16: d_reclen (u16)
///   offset 18: d_type   (u8)
///   offset 19: d_name   (NUL terminated, padded to 8 byte alignment)
/// ```
pub mod dirent64 {
    pub const D_INO: usize = 0;
    pub const D_OFF: usize = 8;
    pub const D_RECLEN: usize = 16;
    pub const D_TYPE: usize = 18;
    pub const D_NAME: usize = 19;
}

/// Thin wrapper around a raw file descriptor.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct LinuxHandle(file_descriptor);

impl LinuxHandle {
    pub const STDOUT: LinuxHandle = LinuxHandle(1);

    pub const fn from_raw(fd: file_descriptor) -> Self {
        LinuxHandle(fd)
    }

    pub const fn into_raw(self) -> file_descriptor {
        self.0
    }
}
