//! FX module - exchange-rate lookup and currency conversion.

mod fx_errors;
mod fx_model;
mod fx_service;
mod fx_traits;

pub use fx_errors::FxError;
pub use fx_model::{ExchangeRate, NewExchangeRate};
pub use fx_service::FxResolver;
pub use fx_traits::{FxRepositoryTrait, FxResolverTrait};
