//! Trigger B sources
//!
//! Outward-flow behaviour, either read from an external classifier or
//! derived from movement statistics by rule.

pub mod secondary;

pub use secondary::{
    ExternalClassifierSource, RuleBasedSource, SecondaryTriggerSource, TriggerMode, TriggerSource,
};
