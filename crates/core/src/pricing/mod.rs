//! Pricing module - rate composition, day counts, and interest accrual.

pub mod rate_math;

pub use rate_math::*;
