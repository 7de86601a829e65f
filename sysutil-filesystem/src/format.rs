//! Rendering [`FileMetadata`] as a long listing line.
//!
//! ```text
//! drwxr-xr-x 2 1000 1000 4096 Mar 7 14:02
//! -rw-r--r-- 1 1000 1000 12 Dec 24 2019
//! ```
//!
//! Fields are separated by a single space and never padded, numbers are rendered with
//! [`unsigned_to_decimal`] into a fixed buffer.

use sysutil_ore::cstr::{unsigned_to_decimal, CapacityError, DecimalBuf, FixedBuf};

use crate::{CalendarTime, FileMetadata, Filesystem};

static MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Abbreviated name for `month`, counted from `0` for January.
///
/// Returns an empty string when `month` is out of range.
pub fn month_abbrev(month: usize) -> &'static str {
    MONTHS.get(month).copied().unwrap_or("")
}

/// `d` for directories, `-` for everything else.
pub fn type_char(metadata: &FileMetadata) -> u8 {
    if metadata.is_dir() {
        b'd'
    } else {
        b'-'
    }
}

/// `rwxrwxrwx` for owner, group, and other, `-` for every unset bit.
pub fn permissions(mode: u32) -> [u8; 9] {
    const BITS: [(u32, u8); 9] = [
        (0o400, b'r'),
        (0o200, b'w'),
        (0o100, b'x'),
        (0o040, b'r'),
        (0o020, b'w'),
        (0o010, b'x'),
        (0o004, b'r'),
        (0o002, b'w'),
        (0o001, b'x'),
    ];

    let mut out = [b'-'; 9];
    for (slot, (mask, c)) in out.iter_mut().zip(BITS) {
        if mode & mask != 0 {
            *slot = c;
        }
    }
    out
}

/// Largest line we render, the metadata fields without a name.
const LINE_CAPACITY: usize = 128;

/// A rendered `<type><perms> <links> <uid> <gid> <size> <month> <day> <time-or-year>` line.
#[derive(Debug)]
pub struct ListingLine {
    inner: FixedBuf<LINE_CAPACITY>,
}

impl ListingLine {
    /// Render `metadata` last modified at `modified`, a time within `current_year` is shown
    /// as `HH:MM`, anything else as the year.
    pub fn new(
        metadata: &FileMetadata,
        modified: &CalendarTime,
        current_year: i64,
    ) -> Result<ListingLine, CapacityError> {
        let mut line = ListingLine {
            inner: FixedBuf::new(),
        };
        let mut scratch = DecimalBuf::new();

        line.inner.push(type_char(metadata))?;
        line.inner.extend(&permissions(metadata.mode()))?;

        for num in [
            metadata.links(),
            u64::from(metadata.user()),
            u64::from(metadata.group()),
            metadata.size(),
        ] {
            line.inner.push(b' ')?;
            line.inner
                .extend(unsigned_to_decimal(num, &mut scratch).as_bytes())?;
        }

        line.inner.push(b' ')?;
        let month = usize::try_from(modified.month).unwrap_or(usize::MAX);
        line.inner.extend(month_abbrev(month).as_bytes())?;

        line.inner.push(b' ')?;
        line.inner
            .extend(unsigned_to_decimal(u64::from(modified.day), &mut scratch).as_bytes())?;

        line.inner.push(b' ')?;
        if modified.year == current_year {
            line.push_two_digits(modified.hour, &mut scratch)?;
            line.inner.push(b':')?;
            line.push_two_digits(modified.minute, &mut scratch)?;
        } else {
            if modified.year < 0 {
                line.inner.push(b'-')?;
            }
            let year = unsigned_to_decimal(modified.year.unsigned_abs(), &mut scratch);
            line.inner.extend(year.as_bytes())?;
        }

        Ok(line)
    }

    /// Zero-padded to two digits.
    fn push_two_digits(&mut self, val: u32, scratch: &mut DecimalBuf) -> Result<(), CapacityError> {
        if val < 10 {
            self.inner.push(b'0')?;
        }
        self.inner
            .extend(unsigned_to_decimal(u64::from(val), scratch).as_bytes())
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.inner.as_bytes()
    }
}

/// Render the listing line for `metadata`, using the local time zone.
pub fn listing_line(fs: &Filesystem, metadata: &FileMetadata) -> Result<ListingLine, crate::Error> {
    let now = fs.localtime(fs.now()?)?;
    let modified = fs.localtime(metadata.mtime().secs)?;
    let line = ListingLine::new(metadata, &modified, now.year)?;
    Ok(line)
}
