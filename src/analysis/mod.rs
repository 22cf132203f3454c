//! Diagnostics over the fused series.

mod correlation;

pub use correlation::analyze;
