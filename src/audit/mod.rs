//! Record selection that must happen before any aggregation.

pub mod filter;
pub mod period;
