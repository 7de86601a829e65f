//! Hand-rolled, bounds-checked string primitives.
//!
//! These deliberately avoid the string routines of any runtime. Strings are
//! NUL-terminated byte slices, an absent string is `None`, and every write
//! into a fixed buffer is checked against its capacity before it happens.

use std::fmt;

/// Number of digits in the decimal expansion of [`u64::MAX`].
pub const MAX_DECIMAL_DIGITS: usize = 20;

/// A write that would not fit in the destination buffer.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct CapacityError {
    /// Bytes the write needed, including the terminator.
    pub needed: usize,
    /// Bytes the destination actually has.
    pub capacity: usize,
}

impl fmt::Display for CapacityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "buffer overflow: needed {} bytes, capacity is {}",
            self.needed, self.capacity
        )
    }
}

impl std::error::Error for CapacityError {}

/// Returns the number of bytes before the terminator, or `-1` for a missing string.
///
/// A slice without a terminator is measured up to its end.
pub fn length(s: Option<&[u8]>) -> isize {
    let Some(s) = s else {
        return -1;
    };
    let mut i = 0;
    while i < s.len() && s[i] != 0 {
        i += 1;
    }
    // Slices can't be longer than `isize::MAX` bytes.
    isize::try_from(i).unwrap_or(isize::MAX)
}

/// Copies exactly `n` bytes of `src` into `dest` and terminates `dest` at `dest[n]`.
///
/// A missing `src` leaves `dest` untouched.
pub fn copy(dest: &mut [u8], src: Option<&[u8]>, n: usize) -> Result<(), CapacityError> {
    let Some(src) = src else {
        return Ok(());
    };
    if n > src.len() {
        return Err(CapacityError {
            needed: n,
            capacity: src.len(),
        });
    }
    let needed = n + 1;
    if needed > dest.len() {
        return Err(CapacityError {
            needed,
            capacity: dest.len(),
        });
    }

    let mut i = 0;
    while i < n {
        dest[i] = src[i];
        i += 1;
    }
    dest[n] = 0;
    Ok(())
}

/// Two missing strings are equal, a missing and a present one are not.
pub fn equal(a: Option<&[u8]>, b: Option<&[u8]>) -> bool {
    let (a, b) = match (a, b) {
        (None, None) => return true,
        (None, Some(_)) | (Some(_), None) => return false,
        (Some(a), Some(b)) => (a, b),
    };

    let len = length(Some(a));
    if len != length(Some(b)) {
        return false;
    }
    let len = usize::try_from(len).unwrap_or(0);
    let mut i = 0;
    while i < len {
        if a[i] != b[i] {
            return false;
        }
        i += 1;
    }
    true
}

/// Renders `num` in base 10 into `out`, returning the rendered digits.
pub fn unsigned_to_decimal(num: u64, out: &mut DecimalBuf) -> &str {
    out.set(num);
    out.as_str()
}

/// Fixed scratch space for the decimal expansion of any `u64`.
#[derive(Clone, Copy)]
pub struct DecimalBuf {
    bytes: [u8; MAX_DECIMAL_DIGITS + 1],
    len: usize,
}

impl DecimalBuf {
    pub const fn new() -> Self {
        DecimalBuf {
            bytes: [0; MAX_DECIMAL_DIGITS + 1],
            len: 0,
        }
    }

    fn set(&mut self, mut num: u64) {
        if num == 0 {
            self.bytes[0] = b'0';
            self.bytes[1] = 0;
            self.len = 1;
            return;
        }

        // Least significant digit first.
        let mut reversed = [0u8; MAX_DECIMAL_DIGITS];
        let mut count = 0;
        while num != 0 {
            // `num % 10` is always a single digit.
            reversed[count] = b'0' + (num % 10) as u8;
            num /= 10;
            count += 1;
        }

        let mut i = 0;
        while i < count {
            self.bytes[i] = reversed[count - 1 - i];
            i += 1;
        }
        self.bytes[count] = 0;
        self.len = count;
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

    pub fn as_str(&self) -> &str {
        // Only ASCII digits are ever written.
        std::str::from_utf8(self.as_bytes()).unwrap_or_default()
    }
}

impl Default for DecimalBuf {
    fn default() -> Self {
        DecimalBuf::new()
    }
}

impl fmt::Debug for DecimalBuf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DecimalBuf").field(&self.as_str()).finish()
    }
}

/// Byte buffer with a hard capacity of `N - 1` bytes plus a terminator.
///
/// Pushing past capacity fails and leaves the buffer as it was.
#[derive(Clone)]
pub struct FixedBuf<const N: usize> {
    bytes: [u8; N],
    len: usize,
}

impl<const N: usize> FixedBuf<N> {
    pub const fn new() -> Self {
        FixedBuf {
            bytes: [0; N],
            len: 0,
        }
    }

    /// Maximum number of bytes this buffer holds, excluding the terminator.
    pub const fn capacity(&self) -> usize {
        N.saturating_sub(1)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn clear(&mut self) {
        self.truncate(0);
    }

    /// Shortens the buffer to `len` bytes, a no-op if it's already shorter.
    pub fn truncate(&mut self, len: usize) {
        if len < self.len {
            self.len = len;
            self.bytes[len] = 0;
        }
    }

    pub fn push(&mut self, byte: u8) -> Result<(), CapacityError> {
        self.extend(&[byte])
    }

    /// Appends `data` up to its first terminator.
    pub fn extend(&mut self, data: &[u8]) -> Result<(), CapacityError> {
        let data_len = usize::try_from(length(Some(data))).unwrap_or(0);
        let needed = self.len + data_len + 1;
        if needed > N {
            return Err(CapacityError {
                needed,
                capacity: N,
            });
        }
        copy(&mut self.bytes[self.len..], Some(data), data_len)?;
        self.len += data_len;
        Ok(())
    }

    /// Contents without the terminator.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

    /// Contents including the terminator, ready to hand to the kernel.
    pub fn as_bytes_with_nul(&self) -> &[u8] {
        &self.bytes[..=self.len]
    }
}

impl<const N: usize> Default for FixedBuf<N> {
    fn default() -> Self {
        FixedBuf::new()
    }
}

impl<const N: usize> fmt::Debug for FixedBuf<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FixedBuf")
            .field("contents", &String::from_utf8_lossy(self.as_bytes()))
            .field("capacity", &self.capacity())
            .finish()
    }
}
