//! Tick Keys
//!
//! Time values arrive as `f64` seconds from several datasets that were not
//! produced in lock-step. Two keys are derived from them:
//!
//! - [`Tick`]: the exact time, totally ordered so it can key a `BTreeMap`.
//!   Used for per-tick grouping and the exact inner join between triggers.
//! - [`RoundedTime`]: the time scaled by `10^precision` and rounded half to
//!   even into an `i64`. Used wherever cross-source matching is needed, so
//!   `12.30000001` and `12.3` compare equal as integers.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Largest supported rounding precision (decimal places).
pub const MAX_PRECISION: u32 = 9;

/// An exact time value with a total order.
///
/// `-0.0` is normalised to `0.0` so both spellings land on the same key.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tick(f64);

impl Tick {
    /// Wrap a raw time value.
    #[inline]
    pub fn new(seconds: f64) -> Self {
        // -0.0 + 0.0 == +0.0
        Self(seconds + 0.0)
    }

    /// Raw seconds.
    #[inline]
    pub const fn seconds(&self) -> f64 {
        self.0
    }

    /// Round to a fixed number of decimal places.
    ///
    /// Returns `None` for non-finite times, which can never match anything.
    #[inline]
    pub fn rounded(&self, precision: u32) -> Option<RoundedTime> {
        RoundedTime::from_seconds(self.0, precision)
    }
}

impl PartialEq for Tick {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Tick {}

impl PartialOrd for Tick {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Tick {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl From<f64> for Tick {
    fn from(seconds: f64) -> Self {
        Self::new(seconds)
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A time value rounded to a fixed number of decimal places.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RoundedTime {
    scaled: i64,
    precision: u32,
}

impl RoundedTime {
    /// Round `seconds` to `precision` decimal places (half to even).
    pub fn from_seconds(seconds: f64, precision: u32) -> Option<Self> {
        if !seconds.is_finite() {
            return None;
        }
        let precision = precision.min(MAX_PRECISION);
        let scaled = (seconds * scale(precision)).round_ties_even();
        if scaled < i64::MIN as f64 || scaled > i64::MAX as f64 {
            return None;
        }
        Some(Self {
            scaled: scaled as i64,
            precision,
        })
    }

    /// The rounded value back as seconds.
    #[inline]
    pub fn seconds(&self) -> f64 {
        self.scaled as f64 / scale(self.precision)
    }

    /// Integer representation (`seconds * 10^precision`).
    #[inline]
    pub const fn scaled(&self) -> i64 {
        self.scaled
    }

    /// Number of decimal places this key was rounded to.
    #[inline]
    pub const fn precision(&self) -> u32 {
        self.precision
    }
}

impl fmt::Display for RoundedTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.*}", self.precision as usize, self.seconds())
    }
}

impl Serialize for RoundedTime {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_f64(self.seconds())
    }
}

#[inline]
fn scale(precision: u32) -> f64 {
    10f64.powi(precision as i32)
}
