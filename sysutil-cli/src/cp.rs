//! `mycp`, copy one or more regular files.

use std::io::{self, Write};

use sysutil_filesystem::Filesystem;

/// Exit code when only a single operand was given.
pub const MISSING_DESTINATION: i32 = -1;
/// Exit code when several sources were given and the destination isn't a directory.
pub const TARGET_NOT_A_DIRECTORY: i32 = -2;

/// Run `mycp` with `args`, every argument but the last is a source.
///
/// Per-source failures are reported on `out` and don't stop the remaining sources, only
/// problems with the arguments themselves produce a non-zero exit code.
pub fn run<W: Write>(fs: &Filesystem, args: &[&[u8]], out: &mut W) -> io::Result<i32> {
    let (dest, sources) = match args {
        [] => return Ok(0),
        [only] => {
            out.write_all(b"mycp: missing destination file operand after '")?;
            out.write_all(only)?;
            out.write_all(b"'\n")?;
            return Ok(MISSING_DESTINATION);
        }
        [sources @ .., dest] => (*dest, sources),
    };

    if sources.len() > 1 && !fs.stat(dest).is_ok_and(|meta| meta.is_dir()) {
        out.write_all(b"mycp: target '")?;
        out.write_all(dest)?;
        out.write_all(b"' is not a directory\n")?;
        return Ok(TARGET_NOT_A_DIRECTORY);
    }

    for src in sources {
        copy_one(fs, src, dest, out)?;
    }
    Ok(0)
}

fn copy_one<W: Write>(fs: &Filesystem, src: &[u8], dest: &[u8], out: &mut W) -> io::Result<()> {
    match fs.stat(src) {
        Err(err) => {
            tracing::debug!(src = %String::from_utf8_lossy(src), %err, "cannot stat source");
            out.write_all(b"mycp: cannot stat '")?;
            out.write_all(src)?;
            out.write_all(b"' No such file or directory\n")?;
            return Ok(());
        }
        Ok(meta) if meta.is_dir() => {
            out.write_all(b"mycp: -r not specified; omitting directory '")?;
            out.write_all(src)?;
            out.write_all(b"'\n")?;
            return Ok(());
        }
        Ok(_) => (),
    }

    match fs.copy(src, dest) {
        Ok(outcome) => {
            tracing::debug!(bytes = outcome.bytes_copied, "copy finished");
            Ok(())
        }
        Err(sysutil_filesystem::Error::SameFile) => {
            out.write_all(b"mycp: '")?;
            out.write_all(src)?;
            out.write_all(b"' and '")?;
            out.write_all(dest)?;
            out.write_all(b"' are the same file\n")
        }
        Err(err) => {
            tracing::warn!(src = %String::from_utf8_lossy(src), %err, "copy failed");
            out.write_all(b"mycp: cannot copy '")?;
            out.write_all(src)?;
            out.write_all(b"': ")?;
            out.write_all(err.to_string().as_bytes())?;
            out.write_all(b"\n")
        }
    }
}
