use rust_decimal_macros::dec;

use super::fees_model::{FeeBasis, FeeCalculationType, FeeConfig, FeeTier, NewFee};

fn tiered_config(tiers: Vec<FeeTier>) -> FeeConfig {
    FeeConfig {
        id: "cfg-1".to_string(),
        name: "Arrangement fee".to_string(),
        calculation_type: FeeCalculationType::Tiered,
        basis: FeeBasis::Principal,
        flat_amount: dec!(0),
        rate: dec!(0),
        tiers,
    }
}

fn tier(min: rust_decimal::Decimal, max: Option<rust_decimal::Decimal>, rate: rust_decimal::Decimal) -> FeeTier {
    FeeTier {
        min_amount: min,
        max_amount: max,
        rate,
    }
}

#[test]
fn contiguous_tiers_validate() {
    let config = tiered_config(vec![
        tier(dec!(0), Some(dec!(100000)), dec!(0.015)),
        tier(dec!(100000), Some(dec!(500000)), dec!(0.01)),
        tier(dec!(500000), None, dec!(0.005)),
    ]);
    assert!(config.validate().is_ok());
}

#[test]
fn gapped_tiers_are_rejected() {
    let config = tiered_config(vec![
        tier(dec!(0), Some(dec!(100000)), dec!(0.015)),
        tier(dec!(200000), None, dec!(0.01)),
    ]);
    assert!(config.validate().is_err());
}

#[test]
fn overlapping_tiers_are_rejected() {
    let config = tiered_config(vec![
        tier(dec!(0), Some(dec!(100000)), dec!(0.015)),
        tier(dec!(50000), None, dec!(0.01)),
    ]);
    assert!(config.validate().is_err());
}

#[test]
fn first_tier_must_start_at_zero() {
    let config = tiered_config(vec![tier(dec!(1000), None, dec!(0.015))]);
    assert!(config.validate().is_err());
}

#[test]
fn last_tier_must_be_unbounded() {
    let config = tiered_config(vec![tier(dec!(0), Some(dec!(100000)), dec!(0.015))]);
    assert!(config.validate().is_err());
}

#[test]
fn non_tiered_config_skips_tier_checks() {
    let config = FeeConfig {
        calculation_type: FeeCalculationType::Flat,
        tiers: vec![],
        ..tiered_config(vec![])
    };
    assert!(config.validate().is_ok());
}

#[test]
fn new_fee_rejects_negative_rate() {
    let new_fee = NewFee {
        name: "Service fee".to_string(),
        fee_config_id: None,
        calculation_type: FeeCalculationType::Percentage,
        basis: FeeBasis::Principal,
        flat_amount: dec!(0),
        rate: dec!(-0.01),
        tiers: vec![],
    };
    assert!(new_fee.validate().is_err());
}

#[test]
fn config_instantiates_fee_with_fresh_id() {
    let config = tiered_config(vec![tier(dec!(0), None, dec!(0.01))]);
    let a = config.to_fee();
    let b = config.to_fee();
    assert_ne!(a.id, b.id);
    assert_eq!(a.fee_config_id.as_deref(), Some("cfg-1"));
    assert_eq!(a.tiers, config.tiers);
    assert!(!a.is_waived && !a.is_paid);
}
