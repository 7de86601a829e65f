//! Copying a single regular file.
//!
//! The destination is resolved the way `cp` does it:
//!
//! * an existing directory receives a file with the source's basename,
//! * an existing regular file is truncated and overwritten in place,
//! * a missing path is created with the source's permissions.
//!
//! The contents are then streamed in blocks of [`COPY_BLOCK_SIZE`] bytes.
//!
//! [`COPY_BLOCK_SIZE`]: crate::cfgs::COPY_BLOCK_SIZE

use sysutil_ore::cast::CastFrom;

use crate::handle::FileHandle;
use crate::path::{basename, PathBuffer};
use crate::{FileMetadata, Filesystem};

/// Result of a successful [`copy_file`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyOutcome {
    /// Path that was actually written, differs from the requested destination when that
    /// was a directory.
    pub destination: Vec<u8>,
    pub bytes_copied: u64,
}

/// Copy the regular file at `src` to `dest`.
///
/// Both handles are closed on every path, if the source can't be opened nothing is
/// streamed and the (already truncated or created) destination is closed.
pub fn copy_file(fs: &Filesystem, src: &[u8], dest: &[u8]) -> Result<CopyOutcome, crate::Error> {
    let source_meta = fs.stat(src)?;
    if source_meta.is_dir() {
        return Err(crate::Error::IsADirectory);
    }

    let (destination, dest_handle) = open_destination(fs, src, &source_meta, dest)?;

    let source = fs
        .open(src)
        .as_file()
        .diagnostics("copy source")
        .open();
    let source = match source {
        Ok(source) => source,
        Err(err) => {
            tracing::info!(src = %String::from_utf8_lossy(src), %err, "failed to open source, skipping copy");
            if let Err(close_err) = dest_handle.close() {
                tracing::warn!(%close_err, "failed to close destination");
            }
            return Err(err);
        }
    };

    let result = if source_meta.size() > 0 {
        let block_size = crate::cfgs::copy_block_size(fs.configs());
        stream(&source, &dest_handle, block_size)
    } else {
        Ok(0)
    };

    let close_source = source.close();
    let close_dest = dest_handle.close();

    let bytes_copied = result?;
    close_source?;
    close_dest?;

    tracing::debug!(
        src = %String::from_utf8_lossy(src),
        dest = %String::from_utf8_lossy(&destination),
        bytes_copied,
        "copied file"
    );
    Ok(CopyOutcome {
        destination,
        bytes_copied,
    })
}

/// Resolve `dest` and open it for writing, returning the path that was opened.
fn open_destination(
    fs: &Filesystem,
    src: &[u8],
    source_meta: &FileMetadata,
    dest: &[u8],
) -> Result<(Vec<u8>, FileHandle), crate::Error> {
    let mode = source_meta.permissions();

    match fs.stat(dest) {
        Ok(meta) if meta.is_dir() => {
            let target = PathBuffer::join(dest, basename(src))?;
            tracing::info!(path = %String::from_utf8_lossy(target.as_bytes()), "copying into directory");

            if let Ok(existing) = fs.stat(&target) {
                if existing.same_file(source_meta) {
                    return Err(crate::Error::SameFile);
                }
            }
            let handle = fs.creat(&target, mode)?;
            Ok((target.as_bytes().to_vec(), handle))
        }
        Ok(meta) if meta.is_file() => {
            if meta.same_file(source_meta) {
                return Err(crate::Error::SameFile);
            }
            tracing::info!(dest = %String::from_utf8_lossy(dest), "overwriting existing file");
            fs.truncate(dest, 0)?;
            let handle = fs
                .open(dest)
                .as_file()
                .with_read_write()
                .diagnostics("copy destination")
                .open()?;
            Ok((dest.to_vec(), handle))
        }
        Ok(meta) => {
            tracing::info!(dest = %String::from_utf8_lossy(dest), kind = ?meta.kind(), "writing to special file");
            let handle = fs
                .open(dest)
                .as_file()
                .with_read_write()
                .diagnostics("copy destination")
                .open()?;
            Ok((dest.to_vec(), handle))
        }
        Err(crate::Error::NotFound) => {
            tracing::info!(dest = %String::from_utf8_lossy(dest), mode, "creating destination");
            let handle = fs.creat(dest, mode)?;
            Ok((dest.to_vec(), handle))
        }
        Err(err) => Err(err),
    }
}

/// Read a block, write all of it, until the source reports end of file.
fn stream(source: &FileHandle, dest: &FileHandle, block_size: usize) -> Result<u64, crate::Error> {
    let mut block = vec![0u8; block_size];
    let mut total = 0u64;

    loop {
        let read = source.read(&mut block[..])?;
        if read == 0 {
            break;
        }
        dest.write_all(&block[..read])?;
        total += u64::cast_from(read);
    }

    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bytes(path: &std::path::Path) -> &[u8] {
        path.as_os_str().as_encoded_bytes()
    }

    #[test]
    fn smoketest_copy_new_file() {
        let temp = tempfile::TempDir::new().unwrap();
        let src = temp.path().join("a.txt");
        let dest = temp.path().join("b.txt");
        std::fs::write(&src, b"hello").unwrap();

        let fs = Filesystem::new_test();
        let outcome = fs.copy(bytes(&src), bytes(&dest)).unwrap();

        assert_eq!(outcome.bytes_copied, 5);
        assert_eq!(outcome.destination, bytes(&dest));
        assert_eq!(std::fs::read(&dest).unwrap(), b"hello");
        assert!(fs.stat(bytes(&dest)).unwrap().is_file());
    }

    #[test]
    fn test_copy_truncates_existing() {
        let temp = tempfile::TempDir::new().unwrap();
        let src = temp.path().join("short.txt");
        let dest = temp.path().join("long.txt");
        std::fs::write(&src, b"new").unwrap();
        std::fs::write(&dest, b"some much longer old contents").unwrap();

        let fs = Filesystem::new_test();
        fs.copy(bytes(&src), bytes(&dest)).unwrap();

        assert_eq!(std::fs::read(&dest).unwrap(), b"new");
    }

    #[test]
    fn test_copy_into_directory() {
        let temp = tempfile::TempDir::new().unwrap();
        let src = temp.path().join("a.txt");
        let dir = temp.path().join("out");
        std::fs::write(&src, b"into a directory").unwrap();
        std::fs::create_dir(&dir).unwrap();

        let fs = Filesystem::new_test();
        let outcome = fs.copy(bytes(&src), bytes(&dir)).unwrap();

        let expected = dir.join("a.txt");
        assert_eq!(outcome.destination, bytes(&expected));
        assert_eq!(std::fs::read(&expected).unwrap(), b"into a directory");
    }

    #[test]
    fn test_copy_preserves_mode() {
        use std::os::unix::fs::PermissionsExt;

        let temp = tempfile::TempDir::new().unwrap();
        let src = temp.path().join("script.sh");
        let dest = temp.path().join("copy.sh");
        std::fs::write(&src, b"#!/bin/sh\n").unwrap();
        std::fs::set_permissions(&src, std::fs::Permissions::from_mode(0o700)).unwrap();

        let fs = Filesystem::new_test();
        fs.copy(bytes(&src), bytes(&dest)).unwrap();

        let mode = fs.stat(bytes(&dest)).unwrap().permissions();
        // The umask can only remove bits.
        assert_eq!(mode & !0o700, 0);
        assert_eq!(mode & 0o700, 0o700);
    }

    #[test]
    fn test_copy_empty_file() {
        let temp = tempfile::TempDir::new().unwrap();
        let src = temp.path().join("empty");
        let dest = temp.path().join("empty-copy");
        std::fs::write(&src, b"").unwrap();

        let fs = Filesystem::new_test();
        let outcome = fs.copy(bytes(&src), bytes(&dest)).unwrap();
        assert_eq!(outcome.bytes_copied, 0);
        assert_eq!(std::fs::metadata(&dest).unwrap().len(), 0);
    }

    #[test]
    fn test_copy_multiple_blocks() {
        let temp = tempfile::TempDir::new().unwrap();
        let src = temp.path().join("big");
        let dest = temp.path().join("big-copy");
        let data: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();
        std::fs::write(&src, &data).unwrap();

        let fs = Filesystem::new_test();
        fs.configs().update(&crate::cfgs::COPY_BLOCK_SIZE, 7);
        let outcome = fs.copy(bytes(&src), bytes(&dest)).unwrap();

        assert_eq!(outcome.bytes_copied, 10_000);
        assert_eq!(std::fs::read(&dest).unwrap(), data);
    }

    #[test]
    fn test_copy_onto_itself() {
        let temp = tempfile::TempDir::new().unwrap();
        let src = temp.path().join("same.txt");
        std::fs::write(&src, b"keep me").unwrap();

        let fs = Filesystem::new_test();
        let err = fs.copy(bytes(&src), bytes(&src)).unwrap_err();
        assert!(matches!(err, crate::Error::SameFile));

        let err = fs.copy(bytes(&src), bytes(temp.path())).unwrap_err();
        assert!(matches!(err, crate::Error::SameFile));
        assert_eq!(std::fs::read(&src).unwrap(), b"keep me");
    }

    #[test]
    fn test_copy_missing_source() {
        let temp = tempfile::TempDir::new().unwrap();
        let src = temp.path().join("missing");
        let dest = temp.path().join("dest");

        let fs = Filesystem::new_test();
        let err = fs.copy(bytes(&src), bytes(&dest)).unwrap_err();
        assert!(matches!(err, crate::Error::NotFound));
        assert!(!dest.exists());
    }

    #[test]
    fn test_copy_huge_block_size() {
        let temp = tempfile::TempDir::new().unwrap();
        let src = temp.path().join("a.txt");
        let dest = temp.path().join("b.txt");
        std::fs::write(&src, b"hello").unwrap();

        let fs = Filesystem::new_test();
        fs.configs().update(&crate::cfgs::COPY_BLOCK_SIZE, u64::MAX);
        let outcome = fs.copy(bytes(&src), bytes(&dest)).unwrap();

        assert_eq!(outcome.bytes_copied, 5);
        assert_eq!(std::fs::read(&dest).unwrap(), b"hello");
    }

    #[test]
    fn test_copy_unopenable_source() {
        let temp = tempfile::TempDir::new().unwrap();
        // Sockets can be stat-ed but `open` fails with ENXIO.
        let src = temp.path().join("socket");
        let _listener = std::os::unix::net::UnixListener::bind(&src).unwrap();

        let fs = Filesystem::new_test();

        let created = temp.path().join("created");
        let err = fs.copy(bytes(&src), bytes(&created)).unwrap_err();
        assert_eq!(err.raw_os_error(), Some(6));
        assert_eq!(std::fs::metadata(&created).unwrap().len(), 0);

        let existing = temp.path().join("existing");
        std::fs::write(&existing, b"old contents").unwrap();
        let err = fs.copy(bytes(&src), bytes(&existing)).unwrap_err();
        assert_eq!(err.raw_os_error(), Some(6));
        assert_eq!(std::fs::read(&existing).unwrap(), b"");
    }
}
