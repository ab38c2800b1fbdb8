//! Fees module - fee models, templates, and the calculation engine.

mod fee_engine;
mod fees_model;
mod fees_traits;

pub use fee_engine::calculate_fee;
pub use fees_model::{
    Fee, FeeBasis, FeeCalculationType, FeeConfig, FeeTier, FeeUpdate, FeeUpdateItem, NewFee,
};
pub use fees_traits::FeeConfigRepositoryTrait;


#[cfg(test)]
mod fees_model_tests;
