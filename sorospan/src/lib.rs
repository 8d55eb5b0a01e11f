use std::error::Error;
use std::fmt::Display;
use std::ops::Range;

/// Half-open byte range into the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    lo: u32,
    hi: u32,
}

impl Span {
    #[must_use]
    #[inline]
    pub const fn new(lo: u32, hi: u32) -> Self {
        if hi < lo {
            Self { lo: hi, hi: lo }
        } else {
            Self { lo, hi }
        }
    }

    /// Empty span at a single offset, e.g. where a scan stopped or the
    /// end of the input.
    #[must_use]
    #[inline]
    pub const fn point(at: u32) -> Self {
        Self { lo: at, hi: at }
    }

    #[must_use]
    #[inline]
    pub fn join(self, other: Self) -> Self {
        let lo = std::cmp::min(self.lo, other.lo);
        let hi = std::cmp::max(self.hi, other.hi);

        Self::new(lo, hi)
    }

    /// Relocates the span into an enclosing source, e.g. from line-local
    /// to file offsets.
    #[must_use]
    #[inline]
    pub const fn shifted(self, by: u32) -> Self {
        Self {
            lo: self.lo + by,
            hi: self.hi + by,
        }
    }

    #[must_use]
    #[inline]
    pub const fn lo(self) -> u32 {
        self.lo
    }

    #[must_use]
    #[inline]
    pub const fn hi(self) -> u32 {
        self.hi
    }
}

impl From<Span> for Range<usize> {
    fn from(value: Span) -> Self {
        value.lo as usize..value.hi as usize
    }
}

/// A value tagged with the span it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Spand<T> {
    pub kind: T,
    pub span: Span,
}

impl<T: Display> Display for Spand<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self.kind(), f)
    }
}

impl<T: Error> Error for Spand<T> {}

impl<T> Spand<T> {
    #[inline]
    pub const fn new(kind: T, span: Span) -> Self {
        Self { kind, span }
    }

    #[inline]
    pub const fn kind(&self) -> &T {
        &self.kind
    }

    #[must_use]
    #[inline]
    pub fn shifted(self, by: u32) -> Self {
        Self {
            kind: self.kind,
            span: self.span.shifted(by),
        }
    }
}
