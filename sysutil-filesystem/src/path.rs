//! Bounded path construction.
//!
//! Paths are plain bytes, exactly what the kernel accepts. Building one never allocates
//! and never silently truncates, running out of room is reported as an [`Error`].
//!
//! [`Error`]: crate::Error

use sysutil_ore::cstr::{CapacityError, FixedBuf};

/// Longest path the kernel accepts, including the terminator.
pub const PATH_MAX: usize = 4096;

/// Room for a maximal directory plus a separator and a name.
const PATH_BUFFER_CAPACITY: usize = PATH_MAX + 64;

/// Fixed capacity buffer for a path built as `dir + '/' + name`.
#[derive(Debug, Default)]
pub struct PathBuffer {
    inner: FixedBuf<PATH_BUFFER_CAPACITY>,
}

impl PathBuffer {
    pub fn new() -> Self {
        PathBuffer::default()
    }

    /// Build `dir + '/' + name`, without doubling a separator `dir` already ends with.
    pub fn join(dir: &[u8], name: &[u8]) -> Result<PathBuffer, CapacityError> {
        let mut buf = PathBuffer::new();
        buf.push(dir)?;
        if !dir.is_empty() && !dir.ends_with(b"/") {
            buf.inner.push(b'/')?;
        }
        buf.push(name)?;
        Ok(buf)
    }

    /// Append raw bytes, all or nothing.
    pub fn push(&mut self, data: &[u8]) -> Result<(), CapacityError> {
        self.inner.extend(data)
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.inner.as_bytes()
    }
}

impl AsRef<[u8]> for PathBuffer {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

/// Final component of `path`, ignoring trailing separators.
///
/// `"/"` stays `"/"`, like `basename(1)`.
pub fn basename(path: &[u8]) -> &[u8] {
    let mut end = path.len();
    while end > 1 && path[end - 1] == b'/' {
        end -= 1;
    }
    let trimmed = &path[..end];
    match trimmed.iter().rposition(|b| *b == b'/') {
        Some(idx) if trimmed.len() > 1 => &trimmed[idx + 1..],
        _ => trimmed,
    }
}
