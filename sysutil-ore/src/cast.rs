//! Lossless integer casts.
//!
//! An `as` cast compiles for any pair of integers, including the ones that silently
//! truncate. The widening casts we rely on between byte counts (`usize`) and kernel
//! sizes (`u64`) are spelled out here instead.

/// A cast that can never lose information.
pub trait CastFrom<T> {
    fn cast_from(from: T) -> Self;
}

macro_rules! cast_from {
    ($from:ty => $($to:ty),+ $(,)?) => {
        $(
            impl crate::cast::CastFrom<$from> for $to {
                #[allow(clippy::as_conversions)]
                fn cast_from(from: $from) -> $to {
                    from as $to
                }
            }
        )+
    };
}

// Pointer width dependent casts.
#[cfg(target_pointer_width = "64")]
mod target64 {
    cast_from!(u64 => usize);
    cast_from!(usize => u64);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smoketest_casts() {
        assert_eq!(u64::cast_from(usize::MAX), u64::MAX);
        assert_eq!(usize::cast_from(u64::MAX), usize::MAX);
        assert_eq!(usize::cast_from(4096u64), 4096);
    }
}
