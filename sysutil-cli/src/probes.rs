//! Probe tables for the self-test.
//!
//! The core table exercises the string library and every raw syscall wrapper directly,
//! the listing and copy tables exercise the higher level pieces each tool is built on.
//! Scratch files get unique names in the temp directory and are removed when the probe
//! finishes, pass or fail.

use std::ffi::{c_char, CString};

use sysutil_filesystem::format::{month_abbrev, permissions, type_char};
use sysutil_filesystem::platform::raw;
use sysutil_filesystem::platform::raw_types::{c_long, flags};
use sysutil_filesystem::Filesystem;
use sysutil_ore::cstr::{self, unsigned_to_decimal, DecimalBuf};
use sysutil_ore::iter::LendingIterator;

use crate::probe;
use crate::selftest::Probe;

/// A uniquely named path in the temp directory, unlinked (or removed) on drop.
struct Scratch {
    path: CString,
}

impl Scratch {
    fn new(prefix: &str) -> Option<Scratch> {
        let name = format!("sysutil-{prefix}-{}", uuid::Uuid::new_v4());
        let path = std::env::temp_dir().join(name);
        let path = CString::new(path.into_os_string().into_encoded_bytes()).ok()?;
        Some(Scratch { path })
    }

    /// Path for `name` inside this scratch path.
    fn child(&self, name: &str) -> Option<Scratch> {
        let mut path = self.as_bytes().to_vec();
        path.push(b'/');
        path.extend_from_slice(name.as_bytes());
        let path = CString::new(path).ok()?;
        Some(Scratch { path })
    }

    fn ptr(&self) -> *const c_char {
        self.path.as_ptr()
    }

    fn as_bytes(&self) -> &[u8] {
        self.path.as_bytes()
    }

    /// Create the file with `contents`, returns `None` if any step fails.
    fn write(&self, contents: &[u8]) -> Option<()> {
        let fd = descriptor(unsafe { raw::creat(self.ptr(), 0o644) })?;
        let written = unsafe { raw::write(fd, contents.as_ptr(), contents.len()) };
        let closed = unsafe { raw::close(fd) };
        (written == len(contents) && closed == 0).then_some(())
    }
}

impl Drop for Scratch {
    fn drop(&mut self) {
        // Whichever one doesn't apply fails harmlessly.
        unsafe {
            raw::unlink(self.ptr());
            raw::rmdir(self.ptr());
        }
    }
}

fn descriptor(result: c_long) -> Option<i32> {
    i32::try_from(result).ok().filter(|fd| *fd >= 0)
}

fn len(data: &[u8]) -> c_long {
    c_long::try_from(data.len()).unwrap_or(c_long::MAX)
}

fn passes(check: impl FnOnce() -> Option<bool>) -> bool {
    check().unwrap_or(false)
}

fn filesystem() -> Filesystem {
    Filesystem::new(crate::cfgs::defaults())
}

/// Read the whole file at `path` through a [`Filesystem`] handle.
fn read_all(fs: &Filesystem, path: &[u8]) -> Option<Vec<u8>> {
    let handle = fs.open(path).as_file().open().ok()?;
    let mut contents = Vec::new();
    let mut block = [0u8; 256];
    loop {
        let read = handle.read(&mut block).ok()?;
        if read == 0 {
            break;
        }
        contents.extend_from_slice(&block[..read]);
    }
    handle.close().ok()?;
    Some(contents)
}

// String library.

fn equal_same() -> bool {
    cstr::equal(Some(b"String"), Some(b"String"))
}

fn equal_different_length() -> bool {
    !cstr::equal(Some(b"String"), Some(b"Not String"))
}

fn equal_same_length() -> bool {
    !cstr::equal(Some(b"String"), Some(b"Hello!"))
}

fn equal_both_null() -> bool {
    cstr::equal(None, None)
}

fn decimal_zero() -> bool {
    unsigned_to_decimal(0, &mut DecimalBuf::new()) == "0"
}

fn decimal_one() -> bool {
    unsigned_to_decimal(1, &mut DecimalBuf::new()) == "1"
}

fn decimal_never_negative() -> bool {
    let mut buf = DecimalBuf::new();
    let rendered = unsigned_to_decimal(u64::MAX, &mut buf);
    rendered == "18446744073709551615" && !rendered.starts_with('-')
}

fn decimal_1024() -> bool {
    unsigned_to_decimal(1024, &mut DecimalBuf::new()) == "1024"
}

fn copy_and_compare(src: &[u8]) -> bool {
    let mut dest = [0u8; 256];
    let n = usize::try_from(cstr::length(Some(src))).unwrap_or(0);
    cstr::copy(&mut dest, Some(src), n).is_ok() && cstr::equal(Some(&dest), Some(src))
}

fn copy_hello() -> bool {
    copy_and_compare(b"Hello")
}

fn copy_empty() -> bool {
    copy_and_compare(b"")
}

fn copy_pathname() -> bool {
    copy_and_compare(b"~/Documents/practicals/sysutil")
}

fn copy_null_source() -> bool {
    let mut dest = *b"Original String\0";
    let n = usize::try_from(cstr::length(None)).unwrap_or(0);
    cstr::copy(&mut dest, None, n).is_ok() && cstr::equal(Some(&dest), Some(b"Original String"))
}

fn length_hello() -> bool {
    cstr::length(Some(b"Hello\0")) == 5
}

fn length_empty() -> bool {
    cstr::length(Some(b"\0")) == 0
}

fn length_null() -> bool {
    cstr::length(None) == -1
}

// Syscall wrappers.

fn stat_existing() -> bool {
    let mut stat = sysutil_filesystem::platform::raw_types::stat::default();
    unsafe { raw::stat(c".".as_ptr(), &mut stat) == 0 }
}

fn stat_null() -> bool {
    let mut stat = sysutil_filesystem::platform::raw_types::stat::default();
    unsafe { raw::stat(std::ptr::null(), &mut stat) != 0 }
}

fn stat_missing() -> bool {
    passes(|| {
        let missing = Scratch::new("stat")?;
        let mut stat = sysutil_filesystem::platform::raw_types::stat::default();
        Some(unsafe { raw::stat(missing.ptr(), &mut stat) } != 0)
    })
}

fn open_existing() -> bool {
    passes(|| {
        let fd = descriptor(unsafe { raw::open(c".".as_ptr(), flags::O_RDONLY, 0) })?;
        unsafe { raw::close(fd) };
        Some(true)
    })
}

fn open_missing() -> bool {
    passes(|| {
        let missing = Scratch::new("open")?;
        let result = unsafe { raw::open(missing.ptr(), flags::O_RDONLY, 0) };
        if let Some(fd) = descriptor(result) {
            unsafe { raw::close(fd) };
        }
        Some(result < 0)
    })
}

fn close_opened() -> bool {
    passes(|| {
        let fd = descriptor(unsafe { raw::open(c".".as_ptr(), flags::O_RDONLY, 0) })?;
        Some(unsafe { raw::close(fd) } == 0)
    })
}

fn close_unopened() -> bool {
    passes(|| {
        let missing = Scratch::new("close")?;
        let result = unsafe { raw::open(missing.ptr(), flags::O_RDONLY, 0) };
        let fd = i32::try_from(result).ok()?;
        Some(fd < 0 && unsafe { raw::close(fd) } != 0)
    })
}

fn getdents_cwd() -> bool {
    passes(|| {
        let fd = descriptor(unsafe {
            raw::open(c".".as_ptr(), flags::O_RDONLY | flags::O_DIRECTORY, 0)
        })?;
        let mut buf = [0u8; 1024];
        let read = unsafe { raw::getdents64(fd, buf.as_mut_ptr(), buf.len()) };
        unsafe { raw::close(fd) };
        Some(read > 0)
    })
}

fn getdents_missing() -> bool {
    passes(|| {
        let missing = Scratch::new("getdents")?;
        let result = unsafe { raw::open(missing.ptr(), flags::O_RDONLY, 0) };
        let fd = i32::try_from(result).ok()?;
        let mut buf = [0u8; 1024];
        let read = unsafe { raw::getdents64(fd, buf.as_mut_ptr(), buf.len()) };
        Some(read < 0)
    })
}

fn write_empty() -> bool {
    let empty = b"";
    unsafe { raw::write(1, empty.as_ptr(), 0) == 0 }
}

fn write_string() -> bool {
    passes(|| {
        let scratch = Scratch::new("write")?;
        let data = b"~/Documents/practicals/sysutil\n";
        let fd = descriptor(unsafe { raw::creat(scratch.ptr(), 0o644) })?;
        let written = unsafe { raw::write(fd, data.as_ptr(), data.len()) };
        unsafe { raw::close(fd) };
        Some(written == len(data))
    })
}

fn write_null() -> bool {
    passes(|| {
        let scratch = Scratch::new("write-null")?;
        let fd = descriptor(unsafe { raw::creat(scratch.ptr(), 0o644) })?;
        let written = unsafe { raw::write(fd, std::ptr::null(), 16) };
        unsafe { raw::close(fd) };
        Some(written < 0)
    })
}

fn time_positive() -> bool {
    unsafe { raw::time(std::ptr::null_mut()) > 0 }
}

fn creat_new() -> bool {
    passes(|| {
        let scratch = Scratch::new("creat")?;
        let fd = descriptor(unsafe { raw::creat(scratch.ptr(), 0o644) })?;
        Some(unsafe { raw::close(fd) } == 0)
    })
}

fn creat_null() -> bool {
    unsafe { raw::creat(std::ptr::null(), 0o644) < 0 }
}

fn unlink_existing() -> bool {
    passes(|| {
        let scratch = Scratch::new("unlink")?;
        scratch.write(b"")?;
        Some(unsafe { raw::unlink(scratch.ptr()) } == 0)
    })
}

fn unlink_missing() -> bool {
    passes(|| {
        let missing = Scratch::new("unlink-missing")?;
        Some(unsafe { raw::unlink(missing.ptr()) } < 0)
    })
}

fn mkdir_new() -> bool {
    passes(|| {
        let scratch = Scratch::new("mkdir")?;
        Some(unsafe { raw::mkdir(scratch.ptr(), 0o755) } == 0)
    })
}

fn mkdir_null() -> bool {
    unsafe { raw::mkdir(std::ptr::null(), 0o755) < 0 }
}

fn rmdir_empty() -> bool {
    passes(|| {
        let scratch = Scratch::new("rmdir")?;
        if unsafe { raw::mkdir(scratch.ptr(), 0o755) } != 0 {
            return None;
        }
        Some(unsafe { raw::rmdir(scratch.ptr()) } == 0)
    })
}

fn rmdir_non_empty() -> bool {
    passes(|| {
        let dir = Scratch::new("rmdir-full")?;
        if unsafe { raw::mkdir(dir.ptr(), 0o775) } != 0 {
            return None;
        }
        let file = dir.child("NewFile.txt")?;
        file.write(b"")?;

        let result = unsafe { raw::rmdir(dir.ptr()) };
        let mut stat = sysutil_filesystem::platform::raw_types::stat::default();
        let still_exists = unsafe { raw::stat(dir.ptr(), &mut stat) } == 0;
        Some(result < 0 && still_exists)
    })
}

fn type_char_file() -> bool {
    passes(|| {
        let scratch = Scratch::new("type")?;
        scratch.write(b"")?;
        let metadata = filesystem().stat(scratch.as_bytes()).ok()?;
        Some(type_char(&metadata) == b'-')
    })
}

fn type_char_dir() -> bool {
    passes(|| {
        let metadata = filesystem().stat(b".").ok()?;
        Some(type_char(&metadata) == b'd')
    })
}

fn read_contents() -> bool {
    passes(|| {
        let scratch = Scratch::new("read")?;
        scratch.write(b"hello")?;

        let fd = descriptor(unsafe { raw::open(scratch.ptr(), flags::O_RDONLY, 0) })?;
        let mut buf = [0u8; 2];
        let mut total = 0;
        let mut last;
        loop {
            last = unsafe { raw::read(fd, buf.as_mut_ptr(), buf.len()) };
            if last <= 0 {
                break;
            }
            total += last;
        }
        unsafe { raw::close(fd) };
        Some(last == 0 && total == 5)
    })
}

fn read_bad_descriptor() -> bool {
    let mut buf = [0u8; 16];
    unsafe { raw::read(-1, buf.as_mut_ptr(), buf.len()) < 0 }
}

fn read_null_buffer() -> bool {
    passes(|| {
        let scratch = Scratch::new("read-null")?;
        scratch.write(b"some contents")?;

        let fd = descriptor(unsafe { raw::open(scratch.ptr(), flags::O_RDONLY, 0) })?;
        let read = unsafe { raw::read(fd, std::ptr::null_mut(), 16) };
        unsafe { raw::close(fd) };
        Some(read < 0)
    })
}

// Listing.

fn month_first() -> bool {
    month_abbrev(0) == "Jan"
}

fn month_last() -> bool {
    month_abbrev(11) == "Dec"
}

fn month_out_of_range() -> bool {
    month_abbrev(12).is_empty()
}

fn permissions_rendered() -> bool {
    &permissions(0o754) == b"rwxr-xr--" && &permissions(0o000) == b"---------"
}

fn walker_counts_entries() -> bool {
    passes(|| {
        let dir = Scratch::new("walk")?;
        if unsafe { raw::mkdir(dir.ptr(), 0o755) } != 0 {
            return None;
        }
        let files = [dir.child("a")?, dir.child("b")?, dir.child("c")?];
        for file in &files {
            file.write(b"entry")?;
        }

        let fs = filesystem();
        let mut walker = fs.walk(dir.as_bytes());
        let mut names = 0;
        while let Some(entry) = walker.next() {
            let entry = entry.ok()?;
            let path = sysutil_filesystem::path::PathBuffer::join(dir.as_bytes(), entry.name).ok()?;
            fs.stat(&path).ok()?;
            if !entry.is_dot() {
                names += 1;
            }
        }
        Some(names == files.len() && walker.bytes_returned() == walker.bytes_consumed())
    })
}

fn myls_missing_path() -> bool {
    passes(|| {
        let missing = Scratch::new("myls")?;
        let mut out = Vec::new();
        crate::ls::list(&filesystem(), missing.as_bytes(), &mut out).ok()?;

        let mut expected = b"myls: cannot access '".to_vec();
        expected.extend_from_slice(missing.as_bytes());
        expected.extend_from_slice(b"': No such file or directory\n");
        Some(out == expected)
    })
}

// Copying.

fn copy_engine_new_file() -> bool {
    passes(|| {
        let src = Scratch::new("copy-src")?;
        let dest = Scratch::new("copy-dest")?;
        let contents: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();
        src.write(&contents)?;

        let fs = filesystem();
        let outcome = fs.copy(src.as_bytes(), dest.as_bytes()).ok()?;
        let copied = read_all(&fs, dest.as_bytes())?;
        let size = fs.stat(dest.as_bytes()).ok()?.size();
        Some(outcome.bytes_copied == 10_000 && copied == contents && size == 10_000)
    })
}

fn copy_engine_truncates() -> bool {
    passes(|| {
        let src = Scratch::new("copy-short")?;
        let dest = Scratch::new("copy-long")?;
        src.write(b"short")?;
        dest.write(b"considerably longer existing contents")?;

        let fs = filesystem();
        fs.copy(src.as_bytes(), dest.as_bytes()).ok()?;
        Some(read_all(&fs, dest.as_bytes())? == b"short")
    })
}

fn copy_engine_into_directory() -> bool {
    passes(|| {
        let src = Scratch::new("copy-into")?;
        let dir = Scratch::new("copy-dir")?;
        src.write(b"into a directory")?;
        if unsafe { raw::mkdir(dir.ptr(), 0o755) } != 0 {
            return None;
        }

        let fs = filesystem();
        let outcome = fs.copy(src.as_bytes(), dir.as_bytes()).ok()?;
        // Removed before `dir` is.
        let target = Scratch {
            path: CString::new(outcome.destination).ok()?,
        };
        Some(read_all(&fs, target.as_bytes())? == b"into a directory")
    })
}

fn e2e_copy_hello() -> bool {
    passes(|| {
        let a = Scratch::new("A")?;
        let b = Scratch::new("B")?;
        a.write(b"hello")?;

        let fs = filesystem();
        let mut out = Vec::new();
        let code = crate::cp::run(&fs, &[a.as_bytes(), b.as_bytes()], &mut out).ok()?;

        let metadata = fs.stat(b.as_bytes()).ok()?;
        let contents = read_all(&fs, b.as_bytes())?;
        Some(code == 0 && out.is_empty() && metadata.is_file() && contents == b"hello")
    })
}

/// Probes for the string library and the raw syscall layer.
pub fn core_probes() -> Vec<Probe> {
    vec![
        probe!(equal_same),
        probe!(equal_different_length),
        probe!(equal_same_length),
        probe!(equal_both_null),
        probe!(decimal_zero),
        probe!(decimal_one),
        probe!(decimal_never_negative),
        probe!(decimal_1024),
        probe!(copy_hello),
        probe!(copy_empty),
        probe!(copy_pathname),
        probe!(copy_null_source),
        probe!(length_hello),
        probe!(length_empty),
        probe!(length_null),
        probe!(stat_existing),
        probe!(stat_null),
        probe!(stat_missing),
        probe!(open_existing),
        probe!(open_missing),
        probe!(close_opened),
        probe!(close_unopened),
        probe!(getdents_cwd),
        probe!(getdents_missing),
        probe!(write_empty),
        probe!(write_string),
        probe!(write_null),
        probe!(time_positive),
        probe!(creat_new),
        probe!(creat_null),
        probe!(unlink_existing),
        probe!(unlink_missing),
        probe!(mkdir_new),
        probe!(mkdir_null),
        probe!(rmdir_empty),
        probe!(rmdir_non_empty),
        probe!(type_char_file),
        probe!(type_char_dir),
        probe!(read_contents),
        probe!(read_bad_descriptor),
        probe!(read_null_buffer),
    ]
}

/// Self-test for `myls`.
pub fn list_probes() -> Vec<Probe> {
    let mut probes = core_probes();
    probes.extend([
        probe!(month_first),
        probe!(month_last),
        probe!(month_out_of_range),
        probe!(permissions_rendered),
        probe!(walker_counts_entries),
        probe!(myls_missing_path),
    ]);
    probes
}

/// Self-test for `mycp`.
pub fn copy_probes() -> Vec<Probe> {
    let mut probes = core_probes();
    probes.extend([
        probe!(copy_engine_new_file),
        probe!(copy_engine_truncates),
        probe!(copy_engine_into_directory),
        probe!(e2e_copy_hello),
    ]);
    probes
}
