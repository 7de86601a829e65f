use std::ffi::CString;

use crate::platform::{OpenOptions, Platform, PlatformPath};

use super::types::{errno, flags};
use super::{syscalls, LinuxPath, LinuxPlatform};

fn c_path(path: &std::path::Path) -> CString {
    CString::new(path.as_os_str().as_encoded_bytes()).unwrap()
}

fn linux_path(path: &std::path::Path) -> LinuxPath {
    LinuxPath::try_new(path.as_os_str().as_encoded_bytes()).unwrap()
}

#[test]
fn test_null_pointers_fault() {
    let temp = tempfile::TempDir::new().unwrap();
    let file = std::fs::File::create(temp.path().join("target")).unwrap();
    let fd = std::os::fd::AsRawFd::as_raw_fd(&file);

    let mut stat = super::types::stat::default();

    let result = unsafe { syscalls::stat(std::ptr::null(), &mut stat as *mut _) };
    assert_eq!(result, -i64::from(errno::EFAULT));

    let result = unsafe { syscalls::open(std::ptr::null(), flags::O_RDONLY, 0) };
    assert_eq!(result, -i64::from(errno::EFAULT));

    let result = unsafe { syscalls::creat(std::ptr::null(), 0o644) };
    assert_eq!(result, -i64::from(errno::EFAULT));

    let result = unsafe { syscalls::mkdir(std::ptr::null(), 0o755) };
    assert!(result < 0);

    let result = unsafe { syscalls::write(fd, std::ptr::null(), 5) };
    assert_eq!(result, -i64::from(errno::EFAULT));
    drop(file);
}

#[test]
fn test_close_unopened() {
    let result = unsafe { syscalls::close(-1) };
    assert_eq!(result, -i64::from(errno::EBADF));

    let handle = super::types::LinuxHandle::from_raw(-1);
    let err = LinuxPlatform::close(handle).unwrap_err();
    assert!(matches!(err, crate::Error::BadDescriptor));
}

#[test]
fn test_read_bad_descriptor() {
    let mut buf = [0u8; 16];
    let result = unsafe { syscalls::read(-1, buf.as_mut_ptr(), buf.len()) };
    assert_eq!(result, -i64::from(errno::EBADF));
}

#[test]
fn test_getdents_not_a_directory() {
    let temp = tempfile::TempDir::new().unwrap();
    let path = temp.path().join("file");
    std::fs::write(&path, b"not a directory").unwrap();

    let handle = LinuxPlatform::open(&linux_path(&path), OpenOptions::READ_ONLY, 0).unwrap();
    let mut buf = [0u8; 1024];
    let err = LinuxPlatform::getdents(handle, &mut buf).unwrap_err();
    assert!(matches!(err, crate::Error::NotADirectory));
    LinuxPlatform::close(handle).unwrap();
}

#[test]
fn test_getdents_and_rewind() {
    let temp = tempfile::TempDir::new().unwrap();
    let path = linux_path(temp.path());

    let options = OpenOptions::READ_ONLY | OpenOptions::DIRECTORY;
    let handle = LinuxPlatform::open(&path, options, 0).unwrap();
    let mut buf = [0u8; 4096];

    let first = LinuxPlatform::getdents(handle, &mut buf).unwrap();
    assert!(first > 0);
    assert_eq!(LinuxPlatform::getdents(handle, &mut buf).unwrap(), 0);

    LinuxPlatform::rewind(handle).unwrap();
    assert_eq!(LinuxPlatform::getdents(handle, &mut buf).unwrap(), first);
    LinuxPlatform::close(handle).unwrap();
}

#[test]
fn test_rmdir() {
    let temp = tempfile::TempDir::new().unwrap();
    let empty = temp.path().join("empty");
    let full = temp.path().join("full");

    unsafe {
        assert_eq!(syscalls::mkdir(c_path(&empty).as_ptr(), 0o775), 0);
        assert_eq!(syscalls::rmdir(c_path(&empty).as_ptr()), 0);
    }
    assert!(!empty.exists());

    std::fs::create_dir(&full).unwrap();
    std::fs::write(full.join("file"), b"").unwrap();
    let result = unsafe { syscalls::rmdir(c_path(&full).as_ptr()) };
    assert_eq!(result, -i64::from(errno::ENOTEMPTY));
    assert!(full.exists());
}

#[test]
fn test_creat_unlink() {
    let temp = tempfile::TempDir::new().unwrap();
    let path = temp.path().join("NewFile.txt");
    let c_path = c_path(&path);

    let fd = unsafe { syscalls::creat(c_path.as_ptr(), 0o644) };
    assert!(fd > 0);
    let fd = i32::try_from(fd).unwrap();
    assert_eq!(unsafe { syscalls::close(fd) }, 0);

    assert_eq!(unsafe { syscalls::unlink(c_path.as_ptr()) }, 0);
    assert_eq!(
        unsafe { syscalls::unlink(c_path.as_ptr()) },
        -i64::from(errno::ENOENT)
    );
}

#[test]
fn test_fstat_matches_stat() {
    let temp = tempfile::TempDir::new().unwrap();
    let path = temp.path().join("fstat");
    std::fs::write(&path, b"abc").unwrap();
    let path = linux_path(&path);

    let by_path = LinuxPlatform::stat(&path).unwrap();
    let handle = LinuxPlatform::open(&path, OpenOptions::READ_ONLY, 0).unwrap();
    let by_handle = LinuxPlatform::fstat(handle).unwrap();
    LinuxPlatform::close(handle).unwrap();

    assert_eq!(by_path, by_handle);
    assert_eq!(by_handle.size(), 3);
    assert!(by_handle.is_file());
}

#[test]
fn test_time() {
    let mut tloc = 0i64;
    let result = unsafe { syscalls::time(&mut tloc as *mut _) };
    assert!(result > 0);
    assert_eq!(result, tloc);
}

#[test]
fn test_error_round_trip() {
    for code in [
        errno::ENOENT,
        errno::EACCES,
        errno::EEXIST,
        errno::ENOTDIR,
        errno::EISDIR,
        errno::ENOTEMPTY,
        errno::EBADF,
        errno::EFAULT,
        errno::EINVAL,
        errno::ENAMETOOLONG,
        5,
    ] {
        let err = crate::Error::from_linux_sys(code);
        assert_eq!(err.raw_os_error(), Some(code));
    }
    assert!(matches!(
        crate::Error::from_linux_sys(errno::EPERM),
        crate::Error::PermissionDenied
    ));
}

#[test]
fn test_open_flags() {
    assert_eq!(
        super::open_flags(OpenOptions::READ_ONLY),
        flags::O_RDONLY | flags::O_CLOEXEC
    );
    assert_eq!(
        super::open_flags(OpenOptions::READ_WRITE | OpenOptions::CREATE),
        flags::O_RDWR | flags::O_CREAT | flags::O_CLOEXEC
    );
    assert_eq!(
        super::open_flags(OpenOptions::READ_ONLY | OpenOptions::DIRECTORY),
        flags::O_RDONLY | flags::O_DIRECTORY | flags::O_CLOEXEC
    );
}
