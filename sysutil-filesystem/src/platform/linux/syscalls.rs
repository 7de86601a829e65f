//! Raw syscalls used for the Linux platform.
//!
//! Every wrapper here issues exactly one system call through libc's generic `syscall(2)`
//! entry point and returns the kernel's answer as an integer: non-negative on success,
//! `-errno` on failure. Nothing here retries, buffers, or loops on short reads and writes.
//!
//! Because the kernel validates every pointer it's handed, passing a null path or buffer
//! produces `-EFAULT` instead of undefined behavior.
//!
//! Newer architectures (aarch64) only provide the `*at` family, so the legacy calls are
//! expressed in terms of those relative to [`AT_FDCWD`].
//!
//! [`AT_FDCWD`]: super::types::flags::AT_FDCWD

use super::types::{self, c_char, c_int, c_long, file_descriptor, mode_t, off_t, time_t};

#[cfg(target_arch = "aarch64")]
use super::types::flags::{AT_FDCWD, AT_REMOVEDIR, CLOCK_REALTIME, O_CREAT, O_TRUNC, O_WRONLY};

unsafe extern "C" {
    /// Invoke the system call `number` with the provided arguments.
    ///
    /// Returns `-1` and sets `errno` on failure.
    #[link_name = "syscall"]
    fn raw_syscall(number: c_long, ...) -> c_long;

    /// Convert seconds since the Epoch into broken down local time.
    ///
    /// Reads the system timezone database, which is why this isn't a syscall.
    pub unsafe fn localtime_r(time: *const time_t, result: *mut types::tm) -> *mut types::tm;
}

/// Syscall numbers, from `asm/unistd_64.h`.
#[cfg(target_arch = "x86_64")]
mod nr {
    use super::c_long;

    pub const READ: c_long = 0;
    pub const WRITE: c_long = 1;
    pub const OPEN: c_long = 2;
    pub const CLOSE: c_long = 3;
    pub const STAT: c_long = 4;
    pub const FSTAT: c_long = 5;
    pub const LSEEK: c_long = 8;
    pub const TRUNCATE: c_long = 76;
    pub const MKDIR: c_long = 83;
    pub const RMDIR: c_long = 84;
    pub const CREAT: c_long = 85;
    pub const UNLINK: c_long = 87;
    pub const TIME: c_long = 201;
    pub const GETDENTS64: c_long = 217;
}

/// Syscall numbers, from `asm-generic/unistd.h`.
#[cfg(target_arch = "aarch64")]
mod nr {
    use super::c_long;

    pub const GETDENTS64: c_long = 61;
    pub const LSEEK: c_long = 62;
    pub const READ: c_long = 63;
    pub const WRITE: c_long = 64;
    pub const MKDIRAT: c_long = 34;
    pub const UNLINKAT: c_long = 35;
    pub const TRUNCATE: c_long = 45;
    pub const OPENAT: c_long = 56;
    pub const CLOSE: c_long = 57;
    pub const NEWFSTATAT: c_long = 79;
    pub const FSTAT: c_long = 80;
    pub const CLOCK_GETTIME: c_long = 113;
}

#[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
compile_error!("sysutil only knows the syscall numbers for x86_64 and aarch64");

/// Convert libc's `-1` + `errno` convention into the kernel's `-errno`.
fn kernel_result(result: c_long) -> c_long {
    if result == -1 {
        let errno = std::io::Error::last_os_error()
            .raw_os_error()
            .unwrap_or(types::errno::EINVAL);
        -c_long::from(errno)
    } else {
        result
    }
}

// `syscall(2)` reads every argument as a `long`, so pointers and ints are widened first.

unsafe fn syscall1(number: c_long, a: c_long) -> c_long {
    kernel_result(unsafe { raw_syscall(number, a) })
}

unsafe fn syscall2(number: c_long, a: c_long, b: c_long) -> c_long {
    kernel_result(unsafe { raw_syscall(number, a, b) })
}

unsafe fn syscall3(number: c_long, a: c_long, b: c_long, c: c_long) -> c_long {
    kernel_result(unsafe { raw_syscall(number, a, b, c) })
}

#[cfg(target_arch = "aarch64")]
unsafe fn syscall4(number: c_long, a: c_long, b: c_long, c: c_long, d: c_long) -> c_long {
    kernel_result(unsafe { raw_syscall(number, a, b, c, d) })
}

/// Returns statistics about the file at `path`, following symlinks.
///
/// # Safety
/// `buf` must be null or point to writable memory for a [`types::stat`].
pub unsafe fn stat(path: *const c_char, buf: *mut types::stat) -> c_long {
    #[cfg(target_arch = "x86_64")]
    let result = unsafe { syscall2(nr::STAT, path as c_long, buf as c_long) };
    #[cfg(target_arch = "aarch64")]
    let result = unsafe {
        syscall4(
            nr::NEWFSTATAT,
            c_long::from(AT_FDCWD),
            path as c_long,
            buf as c_long,
            0,
        )
    };
    result
}

/// Returns statistics about the file open with the provided file descriptor.
///
/// # Safety
/// `buf` must be null or point to writable memory for a [`types::stat`].
pub unsafe fn fstat(fildes: file_descriptor, buf: *mut types::stat) -> c_long {
    unsafe { syscall2(nr::FSTAT, c_long::from(fildes), buf as c_long) }
}

/// Open the file at `path` with the provided flags.
///
/// `mode` is only used by the kernel when `flags` includes `O_CREAT`.
///
/// # Safety
/// `path` must be null or point to a NUL terminated string.
pub unsafe fn open(path: *const c_char, flags: c_int, mode: mode_t) -> c_long {
    #[cfg(target_arch = "x86_64")]
    let result = unsafe {
        syscall3(
            nr::OPEN,
            path as c_long,
            c_long::from(flags),
            c_long::from(mode),
        )
    };
    #[cfg(target_arch = "aarch64")]
    let result = unsafe {
        syscall4(
            nr::OPENAT,
            c_long::from(AT_FDCWD),
            path as c_long,
            c_long::from(flags),
            c_long::from(mode),
        )
    };
    result
}

/// Create (or truncate) the file at `path` and open it write-only.
///
/// # Safety
/// `path` must be null or point to a NUL terminated string.
pub unsafe fn creat(path: *const c_char, mode: mode_t) -> c_long {
    #[cfg(target_arch = "x86_64")]
    let result = unsafe { syscall2(nr::CREAT, path as c_long, c_long::from(mode)) };
    #[cfg(target_arch = "aarch64")]
    let result = unsafe {
        syscall4(
            nr::OPENAT,
            c_long::from(AT_FDCWD),
            path as c_long,
            c_long::from(O_CREAT | O_WRONLY | O_TRUNC),
            c_long::from(mode),
        )
    };
    result
}

/// Close a file descriptor.
///
/// # Safety
/// `fildes` must not be owned by anything that will keep using it, e.g. a [`std::fs::File`].
/// Descriptors that were never opened are fine, the kernel answers `-EBADF`.
pub unsafe fn close(fildes: file_descriptor) -> c_long {
    unsafe { syscall1(nr::CLOSE, c_long::from(fildes)) }
}

/// Read up to `count` bytes from `fildes` into `buf`.
///
/// # Safety
/// `buf` must be null or point to `count` bytes of writable memory.
pub unsafe fn read(fildes: file_descriptor, buf: *mut u8, count: usize) -> c_long {
    unsafe { syscall3(nr::READ, c_long::from(fildes), buf as c_long, count as c_long) }
}

/// Write up to `count` bytes from `buf` to `fildes`.
///
/// # Safety
/// `buf` must be null or point to `count` bytes of readable memory.
pub unsafe fn write(fildes: file_descriptor, buf: *const u8, count: usize) -> c_long {
    unsafe { syscall3(nr::WRITE, c_long::from(fildes), buf as c_long, count as c_long) }
}

/// Remove the link at `path`.
///
/// # Safety
/// `path` must be null or point to a NUL terminated string.
pub unsafe fn unlink(path: *const c_char) -> c_long {
    #[cfg(target_arch = "x86_64")]
    let result = unsafe { syscall1(nr::UNLINK, path as c_long) };
    #[cfg(target_arch = "aarch64")]
    let result = unsafe { syscall3(nr::UNLINKAT, c_long::from(AT_FDCWD), path as c_long, 0) };
    result
}

/// Make a directory at the specified path.
///
/// # Safety
/// `path` must be null or point to a NUL terminated string.
pub unsafe fn mkdir(path: *const c_char, mode: mode_t) -> c_long {
    #[cfg(target_arch = "x86_64")]
    let result = unsafe { syscall2(nr::MKDIR, path as c_long, c_long::from(mode)) };
    #[cfg(target_arch = "aarch64")]
    let result = unsafe {
        syscall3(
            nr::MKDIRAT,
            c_long::from(AT_FDCWD),
            path as c_long,
            c_long::from(mode),
        )
    };
    result
}

/// Remove the empty directory at `path`.
///
/// # Safety
/// `path` must be null or point to a NUL terminated string.
pub unsafe fn rmdir(path: *const c_char) -> c_long {
    #[cfg(target_arch = "x86_64")]
    let result = unsafe { syscall1(nr::RMDIR, path as c_long) };
    #[cfg(target_arch = "aarch64")]
    let result = unsafe {
        syscall3(
            nr::UNLINKAT,
            c_long::from(AT_FDCWD),
            path as c_long,
            c_long::from(AT_REMOVEDIR),
        )
    };
    result
}

/// Set the length of the file at `path` to exactly `length` bytes.
///
/// # Safety
/// `path` must be null or point to a NUL terminated string.
pub unsafe fn truncate(path: *const c_char, length: off_t) -> c_long {
    unsafe { syscall2(nr::TRUNCATE, path as c_long, length) }
}

/// Read `linux_dirent64` records from the directory open as `fildes` into `buf`.
///
/// Returns the number of bytes filled in, `0` at the end of the directory.
///
/// # Safety
/// `buf` must be null or point to `count` bytes of writable memory.
pub unsafe fn getdents64(fildes: file_descriptor, buf: *mut u8, count: usize) -> c_long {
    unsafe {
        syscall3(
            nr::GETDENTS64,
            c_long::from(fildes),
            buf as c_long,
            count as c_long,
        )
    }
}

/// Reposition the offset of `fildes`.
pub fn lseek(fildes: file_descriptor, offset: off_t, whence: c_int) -> c_long {
    // SAFETY: No pointers are involved.
    unsafe {
        syscall3(
            nr::LSEEK,
            c_long::from(fildes),
            offset,
            c_long::from(whence),
        )
    }
}

/// Seconds since the Epoch, also stored into `tloc` when it's not null.
///
/// # Safety
/// `tloc` must be null or point to writable memory for a [`time_t`].
pub unsafe fn time(tloc: *mut time_t) -> c_long {
    #[cfg(target_arch = "x86_64")]
    let result = unsafe { syscall1(nr::TIME, tloc as c_long) };
    #[cfg(target_arch = "aarch64")]
    let result = {
        let mut now = types::timespec::default();
        let result = unsafe {
            syscall2(
                nr::CLOCK_GETTIME,
                c_long::from(CLOCK_REALTIME),
                &mut now as *mut types::timespec as c_long,
            )
        };
        if result < 0 {
            result
        } else {
            if !tloc.is_null() {
                unsafe { tloc.write(now.tv_sec) };
            }
            now.tv_sec
        }
    };
    result
}
