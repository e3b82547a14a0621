//! Per-tick boolean signals and their debouncing

pub mod persistence;

pub use persistence::{PersistenceFilter, TickSignal};
