//! Wrapping sequence-number and timestamp arithmetic.
//!
//! Sequence numbers and timestamps travel as 64-bit values but are compared
//! through a 32-bit signed difference, so ordering stays correct when the low
//! 32 bits wrap around. Two values compare sensibly as long as they are less
//! than `i32::MAX` apart.

/// Signed distance from `earlier` to `later`, truncated to 32 bits.
///
/// Positive when `later` is ahead of `earlier`, negative when behind.
#[inline]
pub fn diff(later: i64, earlier: i64) -> i32 {
    later.wrapping_sub(earlier) as i32
}

/// `true` when `a` is strictly before `b`.
#[inline]
pub fn before(a: i64, b: i64) -> bool {
    diff(a, b) < 0
}

/// `true` when `a` is at or after `b`.
#[inline]
pub fn at_or_after(a: i64, b: i64) -> bool {
    diff(a, b) >= 0
}
