//! Boarding/alighting positions within a trip.
//!
//! Discrete flex trips board and alight at whole stop indices. Continuous
//! trips allow boarding anywhere along the route, so a position there is a
//! fractional index: `2.25` is a quarter of the way from stop 2 to stop 3.
//! `StopPosition` holds either form so callers share one type.

use std::fmt;
use std::hash::{Hash, Hasher};

/// A position along a trip's stop sequence.
///
/// # Examples
///
/// ```
/// use flex_router::domain::StopPosition;
///
/// let discrete = StopPosition::from(3usize);
/// assert_eq!(discrete.as_index(), Some(3));
///
/// let fractional = StopPosition::new(2.25).unwrap();
/// assert_eq!(fractional.as_index(), None);
/// assert_eq!(fractional.floor_index(), 2);
/// assert_eq!(fractional.fraction(), 0.25);
///
/// assert!(StopPosition::new(-1.0).is_none());
/// assert!(StopPosition::new(f64::NAN).is_none());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct StopPosition(f64);

impl StopPosition {
    /// Creates a position, rejecting negative and non-finite values.
    pub fn new(value: f64) -> Option<Self> {
        (value.is_finite() && value >= 0.0).then_some(Self(value))
    }

    /// Returns the raw value.
    pub fn value(self) -> f64 {
        self.0
    }

    /// Returns the stop index if this position is a whole number.
    pub fn as_index(self) -> Option<usize> {
        (self.0.fract() == 0.0).then_some(self.0 as usize)
    }

    /// Returns the stop index at or before this position.
    pub fn floor_index(self) -> usize {
        self.0.floor() as usize
    }

    /// Returns how far past `floor_index` this position lies, in `[0, 1)`.
    pub fn fraction(self) -> f64 {
        self.0.fract()
    }
}

impl From<usize> for StopPosition {
    fn from(value: usize) -> Self {
        StopPosition(value as f64)
    }
}

impl fmt::Display for StopPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_index() {
            Some(idx) => write!(f, "{idx}"),
            None => write!(f, "{}", self.0),
        }
    }
}

// Finite by construction, so `==` is reflexive. Hashing folds -0.0 into 0.0.
impl Eq for StopPosition {}

impl Hash for StopPosition {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let bits = if self.0 == 0.0 { 0 } else { self.0.to_bits() };
        bits.hash(state);
    }
}
