//! Valuation and liquidation core of the pizzalend lending protocol.
//!
//! This crate provides:
//! - Token model (symbols, names, assets) and reserve records
//! - Reserve registry with anchor and wrapped-token indexes
//! - Wrap/unwrap conversion at each reserve's exchange rate
//! - Oracle valuation and per-account position aggregation
//! - Health factor evaluation
//! - Liquidation quotes with bonus split and feasibility caps
//!
//! Everything here is a pure, synchronous read over collaborator stores; see
//! [`store`] for the interfaces the caller provides.

mod aggregator;
pub mod asset;
pub mod config;
mod convert;
mod error;
mod health;
mod liquidation;
mod oracle;
mod position;
mod registry;
pub mod reserve;
pub mod store;
pub mod u256_math;

pub use aggregator::{AccountPositions, PositionAggregator};
pub use asset::{Asset, ExtendedAsset, ExtendedSymbol, Name, Symbol, SymbolCode};
pub use config::{AliasConfig, EngineConfig, LiquidationConfig};
pub use convert::{deposit_amount, redeem_amount, Converter};
pub use error::{Error, Result};
pub use health::{health_factor, HealthEvaluator, HealthFactor, HealthReport};
pub use liquidation::{
    bonus_value, Infeasible, LiquidationCandidate, LiquidationEngine, LiquidationQuote,
};
pub use oracle::{debt_value, oraclized_value};
pub use position::{CollateralPosition, LoanPosition, RateType, Valuation};
pub use registry::ReserveRegistry;
pub use reserve::{ExchangeRate, OraclePrice, Reserve, ReserveId, RiskConfig};
pub use store::{PositionStore, ReserveStore, SupplyProvider};
