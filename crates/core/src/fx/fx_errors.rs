use thiserror::Error;

/// Errors raised by FX rate management.
///
/// Note that a missing rate during conversion is deliberately *not* an
/// error: conversion degrades to 1:1 so a recalculation never fails solely
/// for lack of market data.
#[derive(Error, Debug)]
pub enum FxError {
    #[error("Invalid currency code: {0}")]
    InvalidCurrencyCode(String),

    #[error("Invalid exchange rate: {0}")]
    InvalidRate(String),
}
