//! Time keys
//!
//! Exact and fixed-precision keys used to group, join and match ticks
//! across datasets.

pub mod tick;

pub use tick::{RoundedTime, Tick};
