//! Standard output written with the raw `write` syscall.

use std::io;

use crate::platform::{FilesystemPlatform, Platform, PlatformHandleType};

/// Unbuffered writer for the process' standard output.
///
/// Every [`io::Write::write`] is exactly one `write` syscall, `write_all` loops on short
/// writes the way [`io::Write`] always does.
#[derive(Debug, Copy, Clone)]
pub struct RawStdout {
    handle: PlatformHandleType,
}

impl RawStdout {
    pub fn new() -> Self {
        RawStdout {
            handle: FilesystemPlatform::stdout(),
        }
    }
}

impl Default for RawStdout {
    fn default() -> Self {
        RawStdout::new()
    }
}

impl io::Write for RawStdout {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let written = FilesystemPlatform::write(self.handle, buf)?;
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
