//! Patch footprint in volume index space
//!
//! A `Region` is a half-open box `[start, start + len)` on each of the z, y
//! and x axes. Starts are signed: a footprint centred near an edge may begin
//! before index 0 or end past the volume's extent.

use std::fmt;
use std::ops::Range;

/// Half-open interval on one axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisSpan {
    pub start: i64,
    pub len: usize,
}

impl AxisSpan {
    /// Span of `size` samples centred on `center`
    ///
    /// The low side gets `size / 2` samples, so for an even size the span is
    /// `[center - size/2, center + size/2)`. The start saturates at
    /// `i64::MIN`; a span that far out lies below every volume either way.
    pub fn centered(center: i64, size: usize) -> Self {
        AxisSpan {
            start: center.saturating_sub(signed(size / 2)),
            len: size,
        }
    }

    /// Exclusive end, saturating at `i64::MAX`
    pub fn end(&self) -> i64 {
        self.start.saturating_add(signed(self.len))
    }

    /// Whether the whole span lies in `[0, extent)`
    pub fn fits(&self, extent: usize) -> bool {
        self.start >= 0 && self.end() <= extent as i64
    }

    /// Part of the span inside `[0, extent)` plus the samples cut off below
    /// and above
    ///
    /// A span entirely outside the extent yields an empty range and a
    /// deficit equal to its full length.
    pub fn clamp(&self, extent: usize) -> (Range<usize>, usize, usize) {
        let extent = extent as i64;
        let lo = self.start.clamp(0, extent);
        let hi = self.end().clamp(lo, extent);

        let before = lo.saturating_sub(self.start).clamp(0, signed(self.len)) as usize;
        let kept = (hi - lo) as usize;
        let after = self.len - before - kept;

        (lo as usize..hi as usize, before, after)
    }
}

fn signed(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

/// Three-axis patch footprint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub z: AxisSpan,
    pub y: AxisSpan,
    pub x: AxisSpan,
}

impl Region {
    pub fn new(z: AxisSpan, y: AxisSpan, x: AxisSpan) -> Self {
        Region { z, y, x }
    }

    /// Cube of edge `size` centred on `(z, y, x)`
    pub fn centered_cube(z: i64, y: i64, x: i64, size: usize) -> Self {
        Region {
            z: AxisSpan::centered(z, size),
            y: AxisSpan::centered(y, size),
            x: AxisSpan::centered(x, size),
        }
    }

    /// Whether the footprint lies inside a volume of `(depth, height, width)`
    pub fn fits_within(&self, (depth, height, width): (usize, usize, usize)) -> bool {
        self.z.fits(depth) && self.y.fits(height) && self.x.fits(width)
    }

    pub fn shape(&self) -> (usize, usize, usize) {
        (self.z.len, self.y.len, self.x.len)
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "z[{}..{}) y[{}..{}) x[{}..{})",
               self.z.start, self.z.end(),
               self.y.start, self.y.end(),
               self.x.start, self.x.end())
    }
}
