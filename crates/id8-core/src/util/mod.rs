//! Utility modules.
//!
//! - [`ids`]: slug normalization and client identifier validation

pub mod ids;
