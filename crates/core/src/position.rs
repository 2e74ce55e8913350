//! Collateral and loan position records, and the derived valuation view.

use alloy::primitives::U256;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::asset::{Asset, ExtendedAsset, Name};
use crate::reserve::ReserveId;
use crate::u256_math::{self, LOAN_QUANTITY_SCALE};

/// Wrapped tokens an account has locked as collateral in one reserve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollateralPosition {
    pub id: u64,
    pub account: Name,
    pub reserve: ReserveId,
    /// Wrapped-token quantity (never negative)
    pub quantity: Asset,
    pub updated_at: DateTime<Utc>,
}

/// Interest model of a loan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RateType {
    Variable,
    Fixed,
}

/// Debt an account owes to one reserve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanPosition {
    pub id: u64,
    pub account: Name,
    pub reserve: ReserveId,
    /// Amount originally borrowed, in the anchor symbol
    pub principal: Asset,
    /// Outstanding debt in anchor units multiplied by `LOAN_QUANTITY_SCALE`
    pub outstanding_scaled: i64,
    pub rate_type: RateType,
    /// Fixed rate in basis points (only meaningful for `RateType::Fixed`)
    #[serde(default)]
    pub fixed_rate_bps: u16,
    /// Seconds until a fixed-rate loan turns variable
    #[serde(default)]
    pub turn_variable_countdown: u64,
    pub last_calculated_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LoanPosition {
    /// Outstanding debt at nominal precision: `floor(outstanding / scale) + 1`.
    ///
    /// The extra unit stands in for interest accrued since `last_calculated_at`,
    /// which is not recomputed here.
    pub fn nominal_outstanding(&self) -> i64 {
        self.outstanding_scaled.div_euclid(LOAN_QUANTITY_SCALE as i64) + 1
    }
}

/// A position converted to underlying terms and priced. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Valuation {
    /// Reserve the position belongs to
    pub reserve: ReserveId,
    /// Underlying asset amount
    pub asset: ExtendedAsset,
    /// Oracle value (WAD)
    pub value: U256,
    /// Value credited toward health (WAD); equals `value` for debt
    pub risk_weighted: U256,
}

impl Valuation {
    /// Oracle value as f64 (display only).
    pub fn value_f64(&self) -> f64 {
        u256_math::wad_to_f64(self.value)
    }

    /// Risk-weighted value as f64 (display only).
    pub fn risk_weighted_f64(&self) -> f64 {
        u256_math::wad_to_f64(self.risk_weighted)
    }
}
