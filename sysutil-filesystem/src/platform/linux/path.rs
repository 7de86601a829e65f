//! Linux specific paths.

use std::ffi::{CStr, CString};

use crate::platform::PlatformPath;

/// Path handed to the Linux kernel.
///
/// The kernel treats paths as opaque bytes terminated by a NUL, the only thing it
/// can't represent is a NUL in the middle of a path.
#[derive(Debug, Clone)]
pub struct LinuxPath {
    inner: CString,
}

impl LinuxPath {
    pub fn as_c_str(&self) -> &CStr {
        &self.inner
    }
}

impl PlatformPath for LinuxPath {
    fn try_new(val: &[u8]) -> Result<Self, crate::Error> {
        let inner = CString::new(val).map_err(|err| {
            let msg = format!("interior NUL byte at {}", err.nul_position());
            crate::Error::InvalidPath(msg.into())
        })?;
        Ok(LinuxPath { inner })
    }
}
