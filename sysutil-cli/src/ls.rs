//! `myls`, a long listing of a single file or directory.

use std::io::{self, Write};

use sysutil_filesystem::format::{listing_line, ListingLine};
use sysutil_filesystem::path::PathBuffer;
use sysutil_filesystem::{FileMetadata, Filesystem};
use sysutil_ore::iter::LendingIterator;

/// List `path` to `out`.
///
/// A directory gets one line per entry, anything else a single line. Failures to stat
/// `path` are reported on `out`, other filesystem failures are logged and skip the entry
/// they happened on. Only failing to write to `out` is an error.
pub fn list<W: Write>(fs: &Filesystem, path: &[u8], out: &mut W) -> io::Result<()> {
    let metadata = match fs.stat(path) {
        Ok(metadata) => metadata,
        Err(err) => {
            tracing::debug!(path = %String::from_utf8_lossy(path), %err, "stat failed");
            out.write_all(b"myls: cannot access '")?;
            out.write_all(path)?;
            out.write_all(b"': No such file or directory\n")?;
            return Ok(());
        }
    };

    if metadata.is_dir() {
        return list_directory(fs, path, out);
    }
    match listing_line(fs, &metadata) {
        Ok(line) => write_line(out, &line, path),
        Err(err) => {
            tracing::warn!(path = %String::from_utf8_lossy(path), %err, "failed to format listing");
            Ok(())
        }
    }
}

/// List every path in order, see [`list`].
pub fn list_all<W: Write>(fs: &Filesystem, paths: &[&[u8]], out: &mut W) -> io::Result<()> {
    for path in paths {
        list(fs, path, out)?;
    }
    Ok(())
}

fn list_directory<W: Write>(fs: &Filesystem, dir: &[u8], out: &mut W) -> io::Result<()> {
    let current_year = match fs.now().and_then(|now| fs.localtime(now)) {
        Ok(now) => now.year,
        Err(err) => {
            tracing::warn!(dir = %String::from_utf8_lossy(dir), %err, "failed to read the clock");
            return Ok(());
        }
    };

    let mut walker = fs.walk(dir);
    while let Some(entry) = walker.next() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                tracing::warn!(dir = %String::from_utf8_lossy(dir), %err, "failed to read directory");
                break;
            }
        };

        let Some(metadata) = stat_entry(fs, dir, entry.name) else {
            continue;
        };
        let line = match entry_line(fs, &metadata, current_year) {
            Ok(line) => line,
            Err(err) => {
                tracing::warn!(name = %String::from_utf8_lossy(entry.name), %err, "skipping entry");
                continue;
            }
        };
        write_line(out, &line, entry.name)?;
    }

    Ok(())
}

fn entry_line(
    fs: &Filesystem,
    metadata: &FileMetadata,
    current_year: i64,
) -> Result<ListingLine, sysutil_filesystem::Error> {
    let modified = fs.localtime(metadata.mtime().secs)?;
    let line = ListingLine::new(metadata, &modified, current_year)?;
    Ok(line)
}

/// Entries that vanish, or whose path is too long, are skipped.
fn stat_entry(fs: &Filesystem, dir: &[u8], name: &[u8]) -> Option<FileMetadata> {
    let path = match PathBuffer::join(dir, name) {
        Ok(path) => path,
        Err(err) => {
            tracing::warn!(name = %String::from_utf8_lossy(name), %err, "skipping entry");
            return None;
        }
    };
    match fs.stat(&path) {
        Ok(metadata) => Some(metadata),
        Err(err) => {
            tracing::debug!(path = %String::from_utf8_lossy(path.as_bytes()), %err, "skipping entry");
            None
        }
    }
}

fn write_line<W: Write>(out: &mut W, line: &ListingLine, name: &[u8]) -> io::Result<()> {
    out.write_all(line.as_bytes())?;
    out.write_all(b" ")?;
    out.write_all(name)?;
    out.write_all(b"\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filesystem() -> Filesystem {
        Filesystem::new(crate::cfgs::defaults())
    }

    fn bytes(path: &std::path::Path) -> &[u8] {
        path.as_os_str().as_encoded_bytes()
    }

    #[test]
    fn test_missing_path() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("missing");

        let mut out = Vec::new();
        list(&filesystem(), bytes(&path), &mut out).unwrap();

        let expected = format!(
            "myls: cannot access '{}': No such file or directory\n",
            path.display()
        );
        assert_eq!(String::from_utf8(out).unwrap(), expected);
    }

    #[test]
    fn test_list_file() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("file.txt");
        std::fs::write(&path, b"hello").unwrap();

        let mut out = Vec::new();
        list(&filesystem(), bytes(&path), &mut out).unwrap();
        let out = String::from_utf8(out).unwrap();

        assert_eq!(out.lines().count(), 1);
        assert!(out.starts_with('-'));
        let fields: Vec<_> = out.split_whitespace().collect();
        assert_eq!(fields[4], "5");
        assert!(out.ends_with(&format!(" {}\n", path.display())));
    }

    #[test]
    fn test_list_directory() {
        let temp = tempfile::TempDir::new().unwrap();
        std::fs::write(temp.path().join("a.txt"), b"aaa").unwrap();
        std::fs::create_dir(temp.path().join("sub")).unwrap();

        let mut out = Vec::new();
        list(&filesystem(), bytes(temp.path()), &mut out).unwrap();
        let out = String::from_utf8(out).unwrap();

        let mut names: Vec<_> = out
            .lines()
            .map(|line| line.rsplit(' ').next().unwrap().to_string())
            .collect();
        names.sort();
        assert_eq!(names, vec![".", "..", "a.txt", "sub"]);

        let sub = out.lines().find(|line| line.ends_with(" sub")).unwrap();
        assert!(sub.starts_with('d'));
        let file = out.lines().find(|line| line.ends_with(" a.txt")).unwrap();
        assert!(file.starts_with('-'));
        // Each line is `<mode> <links> <uid> <gid> <size> <month> <day> <time> <name>`.
        assert_eq!(file.split(' ').count(), 9);
    }

    #[test]
    fn test_list_all_keeps_going() {
        let temp = tempfile::TempDir::new().unwrap();
        let missing = temp.path().join("missing");
        let file = temp.path().join("file.txt");
        let dir = temp.path().join("dir");
        std::fs::write(&file, b"hello").unwrap();
        std::fs::create_dir(&dir).unwrap();
        std::fs::write(dir.join("inner"), b"").unwrap();

        let paths = [bytes(&missing), bytes(&file), bytes(&dir)];
        let mut out = Vec::new();
        list_all(&filesystem(), &paths, &mut out).unwrap();
        let out = String::from_utf8(out).unwrap();
        let lines: Vec<_> = out.lines().collect();

        assert_eq!(lines.len(), 5);
        assert_eq!(
            lines[0],
            format!("myls: cannot access '{}': No such file or directory", missing.display())
        );
        assert!(lines[1].ends_with(&format!(" {}", file.display())));
        assert!(lines[2..].iter().any(|line| line.ends_with(" inner")));
    }

    #[test]
    fn test_entry_line_matches_file_listing() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("file.txt");
        std::fs::write(&path, b"abc").unwrap();

        let fs = filesystem();
        let metadata = fs.stat(bytes(&path)).unwrap();
        let current_year = fs.localtime(fs.now().unwrap()).unwrap().year;

        let line = entry_line(&fs, &metadata, current_year).unwrap();
        let expected = listing_line(&fs, &metadata).unwrap();
        assert_eq!(line.as_bytes(), expected.as_bytes());
    }
}
