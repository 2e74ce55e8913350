//! Health factor: risk-weighted collateral over debt.
//!
//! An account with no debt has a factor of exactly zero. That is a sentinel,
//! not a ratio: it means "nothing to liquidate", and `is_liquidatable` treats
//! it that way even though zero is below one.

use alloy::primitives::U256;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, instrument};

use crate::aggregator::{AccountPositions, PositionAggregator};
use crate::asset::Name;
use crate::error::{Error, Result};
use crate::position::Valuation;
use crate::registry::ReserveRegistry;
use crate::u256_math::{self, WAD, WAD_DECIMALS};

/// Health factor in WAD.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct HealthFactor(U256);

impl HealthFactor {
    /// The no-debt sentinel.
    pub const NO_DEBT: Self = Self(U256::ZERO);

    pub const fn from_wad(wad: U256) -> Self {
        Self(wad)
    }

    pub fn wad(&self) -> U256 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_below_one(&self) -> bool {
        self.0 < WAD
    }

    /// Health factor as f64 (display only).
    pub fn as_f64(&self) -> f64 {
        u256_math::wad_to_f64(self.0)
    }
}

impl fmt::Display for HealthFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&u256_math::format_decimal(self.0, WAD_DECIMALS))
    }
}

fn sum(values: impl IntoIterator<Item = U256>) -> Result<U256> {
    values
        .into_iter()
        .try_fold(U256::ZERO, |acc, v| acc.checked_add(v).ok_or(Error::Overflow))
}

/// Total oracle value of `valuations` (WAD).
pub fn total_value(valuations: &[Valuation]) -> Result<U256> {
    sum(valuations.iter().map(|v| v.value))
}

/// Total risk-weighted value of `valuations` (WAD).
pub fn total_risk_weighted(valuations: &[Valuation]) -> Result<U256> {
    sum(valuations.iter().map(|v| v.risk_weighted))
}

/// `Σ risk_weighted(collaterals) / Σ value(loans)`, or zero without debt.
pub fn health_factor(loans: &[Valuation], collaterals: &[Valuation]) -> Result<HealthFactor> {
    let debt = total_value(loans)?;
    let collateral = total_risk_weighted(collaterals)?;
    u256_math::calculate_hf_wad(collateral, debt).map(HealthFactor)
}

/// Point-in-time health summary of one account. Persisting it is up to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    pub account: Name,
    /// Total debt value (WAD)
    pub loan_value: U256,
    /// Risk-weighted collateral value (WAD)
    pub collateral_value: U256,
    /// Undiscounted collateral value (WAD)
    pub raw_collateral_value: U256,
    /// Σ raw collateral value × max LTV of its reserve (WAD)
    pub borrow_limit: U256,
    pub factor: HealthFactor,
    pub evaluated_at: DateTime<Utc>,
}

impl HealthReport {
    /// Build a report from already valuated positions.
    pub fn from_positions(
        registry: &ReserveRegistry,
        positions: &AccountPositions,
        evaluated_at: DateTime<Utc>,
    ) -> Result<Self> {
        let loan_value = total_value(&positions.loans)?;
        let collateral_value = total_risk_weighted(&positions.collaterals)?;
        let raw_collateral_value = total_value(&positions.collaterals)?;

        let mut borrow_limit = U256::ZERO;
        for valuation in &positions.collaterals {
            let reserve = registry.lookup_by_id(&valuation.reserve)?;
            let limit = u256_math::apply_bps(valuation.value, reserve.config.max_ltv_bps)?;
            borrow_limit = borrow_limit.checked_add(limit).ok_or(Error::Overflow)?;
        }

        Ok(Self {
            account: positions.account,
            loan_value,
            collateral_value,
            raw_collateral_value,
            borrow_limit,
            factor: HealthFactor(u256_math::calculate_hf_wad(collateral_value, loan_value)?),
            evaluated_at,
        })
    }

    /// Has debt and a factor below one.
    pub fn is_liquidatable(&self) -> bool {
        !self.loan_value.is_zero() && self.factor.is_below_one()
    }

    pub fn loan_value_f64(&self) -> f64 {
        u256_math::wad_to_f64(self.loan_value)
    }

    pub fn collateral_value_f64(&self) -> f64 {
        u256_math::wad_to_f64(self.collateral_value)
    }
}

/// Account-level health checks on top of the aggregator.
#[derive(Debug, Clone, Copy)]
pub struct HealthEvaluator<'a> {
    aggregator: PositionAggregator<'a>,
}

impl<'a> HealthEvaluator<'a> {
    pub fn new(aggregator: PositionAggregator<'a>) -> Self {
        Self { aggregator }
    }

    /// Health factor of `account` from its current positions.
    #[instrument(skip(self))]
    pub fn health_factor(&self, account: &Name) -> Result<HealthFactor> {
        let positions = AccountPositions::load(&self.aggregator, account)?;
        let factor = health_factor(&positions.loans, &positions.collaterals)?;
        debug!(account = %account, factor = %factor, "Health factor");
        Ok(factor)
    }

    /// Full health report of `account` as of now.
    pub fn evaluate(&self, account: &Name) -> Result<HealthReport> {
        self.evaluate_at(account, Utc::now())
    }

    pub fn evaluate_at(&self, account: &Name, evaluated_at: DateTime<Utc>) -> Result<HealthReport> {
        let positions = AccountPositions::load(&self.aggregator, account)?;
        HealthReport::from_positions(self.aggregator.registry(), &positions, evaluated_at)
    }
}
