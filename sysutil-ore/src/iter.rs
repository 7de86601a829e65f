//! Iterator utilities.

/// A trait for dealing with iterators that can borrow from themselves.
///
/// Very similar to [`std::iter::Iterator`] except the associated [`LendingIterator::Item`] type
/// is generic over a lifetime. This allows implementations of [`LendingIterator`] to return
/// references into a buffer that they own and refill between calls to `next`.
///
/// # Example
///
/// ```ignore
/// struct DirectoryWalker {
///   handle: DirectoryHandle,
///   buffer: Vec<u8>,
/// }
///
/// impl LendingIterator for DirectoryWalker {
///     type Item<'a> = RawDirent<'a> where Self: 'a;
///
///     fn next(&mut self) -> Option<Self::Item<'_>> {
///         // Every record borrows its name straight out of `self.buffer`, which
///         // gets re-used when the kernel hands us the next batch.
///         decode(&self.buffer[..], self.offset)
///     }
/// }
/// ```
pub trait LendingIterator {
    type Item<'a>
    where
        Self: 'a;

    fn next(&mut self) -> Option<Self::Item<'_>>;

    /// Consume the iterator, returning how many items it produced.
    fn count(mut self) -> usize
    where
        Self: Sized,
    {
        let mut count = 0;
        while self.next().is_some() {
            count += 1;
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::LendingIterator;

    /// Lends out overlapping windows of a buffer it owns.
    struct Windows {
        data: Vec<u8>,
        pos: usize,
    }

    impl LendingIterator for Windows {
        type Item<'a>
            = &'a [u8]
        where
            Self: 'a;

        fn next(&mut self) -> Option<Self::Item<'_>> {
            if self.pos + 2 > self.data.len() {
                return None;
            }
            let window = &self.data[self.pos..self.pos + 2];
            self.pos += 1;
            Some(window)
        }
    }

    #[test]
    fn smoketest_lending() {
        let mut windows = Windows {
            data: vec![1, 2, 3, 4],
            pos: 0,
        };
        let mut seen = Vec::new();
        while let Some(window) = windows.next() {
            seen.push(window.to_vec());
        }
        assert_eq!(seen, vec![vec![1, 2], vec![2, 3], vec![3, 4]]);

        let windows = Windows {
            data: vec![1],
            pos: 0,
        };
        assert_eq!(windows.count(), 0);
    }
}
