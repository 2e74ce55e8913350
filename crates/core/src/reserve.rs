//! Reserve records: one per wrapped (interest-bearing) asset.
//!
//! A reserve pairs a wrapped token with its underlying "anchor" token and
//! carries the pool figures, the oracle price, the current exchange rate and
//! the risk configuration. The engine only ever reads reserves; deposits,
//! borrows and rate accrual that mutate them happen elsewhere.

use alloy::primitives::U256;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::asset::{Asset, ExtendedSymbol, Name, Symbol};
use crate::error::{Error, Result};
use crate::u256_math::{self, BPS_DENOMINATOR, WAD, WAD_DECIMALS};

/// Reserves are keyed by the name of their wrapped token (e.g. `pzusdt`).
pub type ReserveId = Name;

// ============================================================================
// Exchange rate
// ============================================================================

/// Underlying units redeemable per wrapped unit, in WAD.
///
/// A rate of `1.000388` means one PZUSDT unit redeems for 1.000388 USDT
/// units, so wrapping 1.0000 USDT yields 0.9996 PZUSDT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ExchangeRate(U256);

impl ExchangeRate {
    pub const ONE: Self = Self(WAD);

    pub const fn from_wad(wad: U256) -> Self {
        Self(wad)
    }

    /// Build from the inverse quote (wrapped units per underlying unit).
    pub fn from_wrapped_per_underlying(inverse_wad: U256) -> Result<Self> {
        if inverse_wad.is_zero() {
            return Err(Error::parse("0", "exchange rate must be positive"));
        }
        u256_math::wad_div(WAD, inverse_wad).map(Self)
    }

    pub fn wad(&self) -> U256 {
        self.0
    }

    pub fn is_positive(&self) -> bool {
        !self.0.is_zero()
    }

    /// Wrapped units per underlying unit, for display.
    pub fn wrapped_per_underlying(&self) -> f64 {
        if self.0.is_zero() {
            return 0.0;
        }
        1.0 / u256_math::wad_to_f64(self.0)
    }

    /// `floor(underlying / rate)`.
    pub fn wrap(&self, underlying: U256) -> Result<U256> {
        u256_math::wad_div(underlying, self.0)
    }

    /// `floor(rate * wrapped)`.
    pub fn unwrap(&self, wrapped: U256) -> Result<U256> {
        u256_math::wad_mul(self.0, wrapped)
    }
}

impl FromStr for ExchangeRate {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        u256_math::parse_decimal(s, WAD_DECIMALS).map(Self)
    }
}

impl TryFrom<String> for ExchangeRate {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<ExchangeRate> for String {
    fn from(rate: ExchangeRate) -> Self {
        rate.to_string()
    }
}

impl fmt::Display for ExchangeRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&u256_math::format_decimal(self.0, WAD_DECIMALS))
    }
}

// ============================================================================
// Oracle price
// ============================================================================

/// Price of one whole underlying token, as `value / 10^decimals`.
///
/// Text form keeps the written precision: `"5.0000"` is value 50000 with 4 decimals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OraclePrice {
    pub value: U256,
    pub decimals: u8,
}

impl OraclePrice {
    pub fn new(value: U256, decimals: u8) -> Self {
        Self { value, decimals }
    }

    pub fn is_zero(&self) -> bool {
        self.value.is_zero()
    }

    /// Price as f64 (display only).
    pub fn as_f64(&self) -> f64 {
        let divisor = 10_f64.powi(self.decimals as i32);
        u256_math::wad_to_f64(self.value * WAD) / divisor
    }
}

impl FromStr for OraclePrice {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let decimals = s.split_once('.').map_or(0, |(_, fraction)| fraction.len());
        let decimals = u8::try_from(decimals)
            .ok()
            .filter(|d| *d <= WAD_DECIMALS)
            .ok_or_else(|| Error::parse(s, "too many decimals"))?;
        Ok(Self::new(u256_math::parse_decimal(s, decimals)?, decimals))
    }
}

impl TryFrom<String> for OraclePrice {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<OraclePrice> for String {
    fn from(price: OraclePrice) -> Self {
        price.to_string()
    }
}

impl fmt::Display for OraclePrice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.decimals == 0 {
            return write!(f, "{}", self.value);
        }
        let unit = u256_math::pow10(self.decimals);
        write!(
            f,
            "{}.{:0>width$}",
            self.value / unit,
            (self.value % unit).to_string(),
            width = self.decimals as usize
        )
    }
}

// ============================================================================
// Risk configuration
// ============================================================================

/// Per-reserve risk and rate-model parameters. Fractions are basis points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskConfig {
    /// Variable borrow rate at zero usage
    #[serde(default)]
    pub base_rate_bps: u16,
    /// Variable borrow rate at full usage
    #[serde(default)]
    pub max_rate_bps: u16,
    #[serde(default)]
    pub base_discount_rate_bps: u16,
    #[serde(default)]
    pub max_discount_rate_bps: u16,
    /// Usage rate at which the rate curve kinks
    #[serde(default)]
    pub best_usage_rate_bps: u16,
    #[serde(default)]
    pub floating_fee_rate_bps: u16,
    #[serde(default)]
    pub fixed_fee_rate_bps: u16,
    /// Share of a collateral's value credited toward health (0, 10000]
    pub liquidation_rate_bps: u16,
    /// Incentive on top of the repaid value when this reserve is seized
    pub liquidation_bonus_bps: u16,
    /// Share of a collateral's value that may be borrowed against
    pub max_ltv_bps: u16,
    #[serde(default = "default_rate_power")]
    pub floating_rate_power: u16,
    #[serde(default = "default_true")]
    pub is_collateral: bool,
    #[serde(default)]
    pub can_stable_borrow: bool,
    /// Lower is liquidated first when choosing which debt to repay
    #[serde(default)]
    pub borrow_liquidation_order: u8,
    /// Lower is seized first when choosing which collateral to take
    #[serde(default)]
    pub collateral_liquidation_order: u8,
}

fn default_rate_power() -> u16 {
    1
}

fn default_true() -> bool {
    true
}

impl RiskConfig {
    /// Liquidation rate as a decimal (e.g. 0.85), display only.
    pub fn liquidation_rate(&self) -> f64 {
        self.liquidation_rate_bps as f64 / BPS_DENOMINATOR as f64
    }

    /// Liquidation bonus as a decimal (e.g. 0.10), display only.
    pub fn liquidation_bonus(&self) -> f64 {
        self.liquidation_bonus_bps as f64 / BPS_DENOMINATOR as f64
    }
}

// ============================================================================
// Reserve
// ============================================================================

/// One wrapped-asset reserve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reserve {
    /// Reserve identifier (wrapped token name)
    pub id: ReserveId,
    /// Wrapped token identity (e.g. "4,PZUSDT@pztken.pizza")
    pub wrapped: ExtendedSymbol,
    /// Underlying token identity (e.g. "4,USDT@tethertether")
    pub anchor: ExtendedSymbol,
    /// Total underlying ever deposited
    pub cumulative_deposit: Asset,
    /// Underlying currently sitting in the pool (not lent out)
    pub available_deposit: Asset,
    /// Wrapped tokens in circulation
    pub wrapped_supply: Asset,
    /// Outstanding borrows
    pub borrow: Asset,
    pub cumulative_borrow: Asset,
    pub variable_borrow: Asset,
    pub stable_borrow: Asset,
    #[serde(default)]
    pub usage_rate_bps: u16,
    #[serde(default)]
    pub floating_rate_bps: u16,
    #[serde(default)]
    pub discount_rate_bps: u16,
    /// Oracle price of one whole underlying token
    pub price: OraclePrice,
    /// Underlying per wrapped
    pub exchange_rate: ExchangeRate,
    pub updated_at: DateTime<Utc>,
    pub config: RiskConfig,
}

impl Reserve {
    /// Check the record invariants: available <= cumulative deposit, positive
    /// exchange rate, liquidation rate within (0, 10000], pool figures
    /// denominated in the anchor symbol.
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: String| Error::InvalidReserve {
            reserve: self.id.to_string(),
            reason,
        };

        if !self.exchange_rate.is_positive() {
            return Err(invalid("exchange rate must be positive".into()));
        }
        let rate = self.config.liquidation_rate_bps as u64;
        if rate == 0 || rate > BPS_DENOMINATOR {
            return Err(invalid(format!("liquidation rate {rate} bps outside (0, 10000]")));
        }
        if self.available_deposit.amount < 0 {
            return Err(invalid("available deposit is negative".into()));
        }
        if self.available_deposit.amount > self.cumulative_deposit.amount {
            return Err(invalid(format!(
                "available deposit {} exceeds cumulative deposit {}",
                self.available_deposit, self.cumulative_deposit
            )));
        }
        for pool in [
            &self.cumulative_deposit,
            &self.available_deposit,
            &self.borrow,
            &self.cumulative_borrow,
            &self.variable_borrow,
            &self.stable_borrow,
        ] {
            if pool.symbol != self.anchor.symbol {
                return Err(invalid(format!(
                    "pool figure {pool} is not denominated in {}",
                    self.anchor.symbol
                )));
            }
        }
        if self.wrapped_supply.symbol != self.wrapped.symbol {
            return Err(invalid(format!(
                "wrapped supply {} is not denominated in {}",
                self.wrapped_supply, self.wrapped.symbol
            )));
        }
        Ok(())
    }

    /// Whether `identity` is exactly this reserve's anchor (issuer and symbol).
    pub fn is_anchor(&self, identity: &ExtendedSymbol) -> bool {
        self.anchor == *identity
    }

    /// Whether `symbol` is this reserve's wrapped token symbol.
    pub fn is_wrapped(&self, symbol: &Symbol) -> bool {
        self.wrapped.symbol == *symbol
    }

    pub fn liquidation_rate_bps(&self) -> u16 {
        self.config.liquidation_rate_bps
    }

    pub fn liquidation_bonus_bps(&self) -> u16 {
        self.config.liquidation_bonus_bps
    }

    /// Utilization of the pool as a decimal (display only).
    pub fn usage(&self) -> f64 {
        if self.cumulative_deposit.amount <= 0 {
            return 0.0;
        }
        1.0 - self.available_deposit.amount as f64 / self.cumulative_deposit.amount as f64
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Reserve builders shared by unit tests.

    use super::*;

    pub fn reserve(id: &str, wrapped: &str, anchor: &str, price: &str, rate: &str) -> Reserve {
        let wrapped: ExtendedSymbol = wrapped.parse().unwrap();
        let anchor: ExtendedSymbol = anchor.parse().unwrap();
        let deposit = Asset::new(1_000_000_000_000, anchor.symbol);
        let zero = Asset::zero(anchor.symbol);
        Reserve {
            id: id.parse().unwrap(),
            wrapped,
            anchor,
            cumulative_deposit: deposit,
            available_deposit: deposit,
            wrapped_supply: Asset::zero(wrapped.symbol),
            borrow: zero,
            cumulative_borrow: zero,
            variable_borrow: zero,
            stable_borrow: zero,
            usage_rate_bps: 0,
            floating_rate_bps: 0,
            discount_rate_bps: 0,
            price: price.parse().unwrap(),
            exchange_rate: rate.parse().unwrap(),
            updated_at: DateTime::from_timestamp(0, 0).unwrap(),
            config: RiskConfig {
                base_rate_bps: 0,
                max_rate_bps: 0,
                base_discount_rate_bps: 0,
                max_discount_rate_bps: 0,
                best_usage_rate_bps: 0,
                floating_fee_rate_bps: 0,
                fixed_fee_rate_bps: 0,
                liquidation_rate_bps: 10_000,
                liquidation_bonus_bps: 0,
                max_ltv_bps: 7_500,
                floating_rate_power: 1,
                is_collateral: true,
                can_stable_borrow: false,
                borrow_liquidation_order: 0,
                collateral_liquidation_order: 0,
            },
        }
    }

    pub fn usdt() -> Reserve {
        reserve("pzusdt", "4,PZUSDT@pztken.pizza", "4,USDT@tethertether", "1.0000", "1.000388")
    }

    pub fn eos() -> Reserve {
        let mut r = reserve("pzeos", "4,PZEOS@pztken.pizza", "4,EOS@eosio.token", "5.0000", "1.02");
        r.config.liquidation_rate_bps = 8_000;
        r.config.liquidation_bonus_bps = 1_000;
        r
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exchange_rate_parsing() {
        let rate: ExchangeRate = "1.000388".parse().unwrap();
        assert_eq!(rate.wad(), U256::from(1_000_388_000_000_000_000u64));
        assert_eq!(rate.to_string(), "1.000388");
        assert!((rate.wrapped_per_underlying() - 0.999612).abs() < 1e-6);
    }

    #[test]
    fn test_exchange_rate_from_inverse() {
        let inverse = u256_math::parse_decimal("0.5", WAD_DECIMALS).unwrap();
        let rate = ExchangeRate::from_wrapped_per_underlying(inverse).unwrap();
        assert_eq!(rate.wad(), U256::from(2u64) * WAD);
        assert!(ExchangeRate::from_wrapped_per_underlying(U256::ZERO).is_err());
    }

    #[test]
    fn test_wrap_unwrap_floor() {
        let rate: ExchangeRate = "1.000388".parse().unwrap();
        let wrapped = rate.wrap(U256::from(10_000u64)).unwrap();
        assert_eq!(wrapped, U256::from(9_996u64));
        let back = rate.unwrap(wrapped).unwrap();
        assert_eq!(back, U256::from(9_999u64));
    }

    #[test]
    fn test_oracle_price_text_form() {
        let price: OraclePrice = "5.0000".parse().unwrap();
        assert_eq!(price.value, U256::from(50_000u64));
        assert_eq!(price.decimals, 4);
        assert_eq!(price.to_string(), "5.0000");
        assert!((price.as_f64() - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_validate() {
        assert!(fixtures::usdt().validate().is_ok());

        let mut bad = fixtures::usdt();
        bad.config.liquidation_rate_bps = 0;
        assert!(matches!(bad.validate(), Err(Error::InvalidReserve { .. })));

        let mut bad = fixtures::usdt();
        bad.available_deposit.amount = bad.cumulative_deposit.amount + 1;
        assert!(bad.validate().is_err());

        let mut bad = fixtures::usdt();
        bad.exchange_rate = ExchangeRate::from_wad(U256::ZERO);
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_reserve_toml_round() {
        let reserve = fixtures::eos();
        let text = toml::to_string(&reserve).unwrap();
        assert!(text.contains("exchange_rate = \"1.02\""));
        let parsed: Reserve = toml::from_str(&text).unwrap();
        assert_eq!(parsed, reserve);
    }
}
