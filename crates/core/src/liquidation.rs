//! Liquidation quotes: how much collateral a liquidator receives for repaying
//! part of an unhealthy loan.
//!
//! ## Payout
//!
//! ```text
//! liq_value      = repay × debt_price
//! value_out      = liq_value × (1 + 2/3 × collateral_bonus)
//! collateral_out = floor(value_out / collateral_price × 10^precision)
//! ```
//!
//! The liquidator gets two thirds of the collateral reserve's bonus; the last
//! third stays with the protocol. The multiplier is applied as the exact
//! fraction `(3 × 10000 + 2 × bonus_bps) / (3 × 10000)`.
//!
//! Infeasible requests are not errors. They produce a zero-amount quote whose
//! `infeasible` field names the reason.

use alloy::primitives::U256;
use std::fmt;
use tracing::{debug, info, instrument, warn};

use crate::aggregator::{AccountPositions, PositionAggregator};
use crate::asset::{ExtendedAsset, ExtendedSymbol, Name};
use crate::config::LiquidationConfig;
use crate::convert;
use crate::error::{Error, Result};
use crate::health;
use crate::oracle;
use crate::position::Valuation;
use crate::registry::ReserveRegistry;
use crate::u256_math::{self, BPS_DENOMINATOR};

/// Why a liquidation request produced nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Infeasible {
    /// The account owes nothing in the repay asset
    NoMatchingLoan,
    /// Repay amount is zero or negative
    NothingToRepay,
    /// Repay amount is larger than the matching loan
    RepayExceedsDebt,
    /// The account holds no collateral in the requested asset
    NoMatchingCollateral,
    /// Health factor is not below one (only checked with `recheck_health`)
    Healthy,
    /// Repaid value is larger than the account's total debt value
    ExceedsTotalDebt,
    /// Payout is larger than the collateral the account holds
    ExceedsHeldCollateral,
}

impl Infeasible {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoMatchingLoan => "no matching loan",
            Self::NothingToRepay => "nothing to repay",
            Self::RepayExceedsDebt => "repay exceeds loan",
            Self::NoMatchingCollateral => "no matching collateral",
            Self::Healthy => "account is healthy",
            Self::ExceedsTotalDebt => "repay value exceeds total debt",
            Self::ExceedsHeldCollateral => "payout exceeds held collateral",
        }
    }
}

impl fmt::Display for Infeasible {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A feasible liquidation, ready to hand to settlement. Never persisted here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiquidationCandidate {
    pub account: Name,
    /// Debt the liquidator repays
    pub repay: ExtendedAsset,
    /// Underlying collateral the liquidator receives
    pub collateral: ExtendedAsset,
}

/// Result of a liquidation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiquidationQuote {
    pub repay: ExtendedAsset,
    /// Underlying collateral paid out; zero when infeasible
    pub collateral_out: ExtendedAsset,
    /// Wrapped shares equivalent to `collateral_out`
    pub seized_wrapped: Option<ExtendedAsset>,
    /// Oracle value of the repaid debt (WAD)
    pub liq_value: U256,
    /// `liq_value` plus the liquidator's share of the bonus (WAD)
    pub value_out: U256,
    pub infeasible: Option<Infeasible>,
}

impl LiquidationQuote {
    fn rejected(repay: &ExtendedAsset, collateral: &ExtendedSymbol, reason: Infeasible) -> Self {
        Self {
            repay: *repay,
            collateral_out: ExtendedAsset::zero(*collateral),
            seized_wrapped: None,
            liq_value: U256::ZERO,
            value_out: U256::ZERO,
            infeasible: Some(reason),
        }
    }

    pub fn is_feasible(&self) -> bool {
        self.infeasible.is_none()
    }

    /// Liquidator's payout value as f64 (display only).
    pub fn value_out_f64(&self) -> f64 {
        u256_math::wad_to_f64(self.value_out)
    }
}

/// `liq_value × (3 × 10000 + 2 × bonus_bps) / (3 × 10000)`, floored.
pub fn bonus_value(liq_value: U256, bonus_bps: u16) -> Result<U256> {
    let denominator = U256::from(3 * BPS_DENOMINATOR);
    let numerator = denominator + U256::from(2 * bonus_bps as u64);
    u256_math::mul_div(liq_value, numerator, denominator)
}

/// First row with the given identity and the summed amount of every such row.
fn combined<'v>(
    rows: &'v [Valuation],
    identity: &ExtendedSymbol,
) -> Result<Option<(&'v Valuation, i64)>> {
    let mut first = None;
    let mut total = 0i64;
    for row in rows.iter().filter(|v| v.asset.extended_symbol() == *identity) {
        first.get_or_insert(row);
        total = total.checked_add(row.asset.amount()).ok_or(Error::Overflow)?;
    }
    Ok(first.map(|row| (row, total)))
}

/// Quote engine over one registry snapshot.
#[derive(Debug, Clone)]
pub struct LiquidationEngine<'a> {
    aggregator: PositionAggregator<'a>,
    config: LiquidationConfig,
}

impl<'a> LiquidationEngine<'a> {
    pub fn new(aggregator: PositionAggregator<'a>, config: LiquidationConfig) -> Self {
        Self { aggregator, config }
    }

    fn registry(&self) -> &'a ReserveRegistry {
        self.aggregator.registry()
    }

    /// Collateral paid for repaying `repay` against already valuated positions.
    ///
    /// `collateral` is the underlying identity the liquidator wants to seize.
    /// Unless `recheck_health` is set, the caller must already know the
    /// account's health factor is below one.
    pub fn liquidation_out(
        &self,
        repay: &ExtendedAsset,
        collateral: &ExtendedSymbol,
        loans: &[Valuation],
        collaterals: &[Valuation],
    ) -> Result<LiquidationQuote> {
        let reject = |reason: Infeasible| -> Result<LiquidationQuote> {
            debug!(repay = %repay, collateral = %collateral, reason = %reason, "Liquidation infeasible");
            Ok(LiquidationQuote::rejected(repay, collateral, reason))
        };

        let Some((loan, owed)) = combined(loans, &repay.extended_symbol())? else {
            return reject(Infeasible::NoMatchingLoan);
        };
        if repay.amount() <= 0 {
            return reject(Infeasible::NothingToRepay);
        }
        if repay.amount() > owed {
            return reject(Infeasible::RepayExceedsDebt);
        }
        let Some((held, held_amount)) = combined(collaterals, collateral)? else {
            return reject(Infeasible::NoMatchingCollateral);
        };

        if self.config.recheck_health {
            // A matching loan means debt, so a zero factor is worthless collateral
            let factor = health::health_factor(loans, collaterals)?;
            if health::total_value(loans)?.is_zero() || !factor.is_below_one() {
                return reject(Infeasible::Healthy);
            }
        }

        let debt_reserve = self.registry().lookup_by_id(&loan.reserve)?;
        let collateral_reserve = self.registry().lookup_by_id(&held.reserve)?;
        if collateral_reserve.price.is_zero() {
            return Err(Error::ZeroPrice(collateral_reserve.id.to_string()));
        }

        let liq_value = oracle::debt_value(repay, debt_reserve)?.value;
        let value_out = bonus_value(liq_value, collateral_reserve.liquidation_bonus_bps())?;
        let amount_out = u256_math::calculate_amount_for_value(
            value_out,
            collateral_reserve.price.value,
            collateral_reserve.price.decimals,
            collateral.symbol.precision,
        )?;

        if liq_value > health::total_value(loans)? {
            warn!(repay = %repay, "Repay value exceeds total debt, rejecting");
            return reject(Infeasible::ExceedsTotalDebt);
        }
        if amount_out > U256::from(held_amount.max(0) as u64) {
            warn!(
                repay = %repay,
                held = held_amount,
                "Payout exceeds held collateral, rejecting"
            );
            return reject(Infeasible::ExceedsHeldCollateral);
        }

        let amount_out = u256_math::to_i64(amount_out)?;
        let collateral_out = ExtendedAsset::from_amount(amount_out, collateral_reserve.anchor);
        let seized_wrapped = ExtendedAsset::from_amount(
            convert::deposit_amount(collateral_reserve, amount_out)?,
            collateral_reserve.wrapped,
        );

        debug!(
            repay = %repay,
            collateral_out = %collateral_out,
            liq_value = u256_math::wad_to_f64(liq_value),
            value_out = u256_math::wad_to_f64(value_out),
            "Liquidation quoted"
        );

        Ok(LiquidationQuote {
            repay: *repay,
            collateral_out,
            seized_wrapped: Some(seized_wrapped),
            liq_value,
            value_out,
            infeasible: None,
        })
    }

    /// Load `account`'s positions and quote a liquidation against them.
    #[instrument(skip(self))]
    pub fn quote(
        &self,
        account: &Name,
        repay: &ExtendedAsset,
        collateral: &ExtendedSymbol,
    ) -> Result<(LiquidationQuote, Option<LiquidationCandidate>)> {
        let positions = AccountPositions::load(&self.aggregator, account)?;
        let quote = self.liquidation_out(repay, collateral, &positions.loans, &positions.collaterals)?;

        let candidate = quote.is_feasible().then(|| LiquidationCandidate {
            account: *account,
            repay: quote.repay,
            collateral: quote.collateral_out,
        });
        if candidate.is_some() {
            info!(account = %account, repay = %repay, out = %quote.collateral_out, "Liquidation candidate");
        }
        Ok((quote, candidate))
    }

    /// Debt and collateral with the lowest liquidation order among the
    /// account's positions. Ties keep position order; collateral in reserves
    /// not flagged as collateral, or with nothing held, is skipped.
    pub fn preferred_pair<'v>(
        &self,
        loans: &'v [Valuation],
        collaterals: &'v [Valuation],
    ) -> Result<Option<(&'v Valuation, &'v Valuation)>> {
        let mut loan: Option<(u8, &Valuation)> = None;
        for valuation in loans.iter().filter(|v| !v.asset.is_zero()) {
            let order = self.registry().lookup_by_id(&valuation.reserve)?.config.borrow_liquidation_order;
            if loan.map_or(true, |(best, _)| order < best) {
                loan = Some((order, valuation));
            }
        }

        let mut seized: Option<(u8, &Valuation)> = None;
        for valuation in collaterals.iter().filter(|v| !v.asset.is_zero()) {
            let reserve = self.registry().lookup_by_id(&valuation.reserve)?;
            if !reserve.config.is_collateral {
                continue;
            }
            let order = reserve.config.collateral_liquidation_order;
            if seized.map_or(true, |(best, _)| order < best) {
                seized = Some((order, valuation));
            }
        }

        Ok(loan.zip(seized).map(|((_, l), (_, c))| (l, c)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AliasConfig;
    use crate::position::{CollateralPosition, LoanPosition};
    use crate::reserve::fixtures;
    use crate::store::PositionStore;
    use crate::u256_math::WAD;

    #[derive(Debug, Default)]
    struct NoPositions;

    impl PositionStore for NoPositions {
        fn collaterals_by_account(&self, _: &Name) -> Vec<CollateralPosition> {
            Vec::new()
        }

        fn loans_by_account(&self, _: &Name) -> Vec<LoanPosition> {
            Vec::new()
        }

        fn accounts(&self) -> Vec<Name> {
            Vec::new()
        }
    }

    fn registry() -> ReserveRegistry {
        ReserveRegistry::new(vec![fixtures::usdt(), fixtures::eos()], AliasConfig::default()).unwrap()
    }

    fn valuation(registry: &ReserveRegistry, reserve: &str, asset: &str, debt: bool) -> Valuation {
        let reserve = registry.lookup_by_id(&reserve.parse().unwrap()).unwrap();
        let asset: ExtendedAsset = asset.parse().unwrap();
        if debt {
            oracle::debt_value(&asset, reserve).unwrap()
        } else {
            oracle::oraclized_value(&asset, reserve).unwrap()
        }
    }

    fn positions(registry: &ReserveRegistry) -> (Vec<Valuation>, Vec<Valuation>) {
        // 500 USDT owed against 100 EOS worth 500, risk-weighted 400
        let loans = vec![valuation(registry, "pzusdt", "500.0000 USDT@tethertether", true)];
        let collaterals = vec![valuation(registry, "pzeos", "100.0000 EOS@eosio.token", false)];
        (loans, collaterals)
    }

    fn engine<'a>(registry: &'a ReserveRegistry, recheck_health: bool) -> LiquidationEngine<'a> {
        LiquidationEngine::new(
            PositionAggregator::new(registry, &NoPositions),
            LiquidationConfig { recheck_health },
        )
    }

    fn eos() -> ExtendedSymbol {
        "4,EOS@eosio.token".parse().unwrap()
    }

    #[test]
    fn test_scenario_payout() {
        let registry = registry();
        let (loans, collaterals) = positions(&registry);
        let repay: ExtendedAsset = "400.0000 USDT@tethertether".parse().unwrap();

        let quote = engine(&registry, true)
            .liquidation_out(&repay, &eos(), &loans, &collaterals)
            .unwrap();
        assert!(quote.is_feasible());
        assert_eq!(quote.liq_value, U256::from(400u64) * WAD);
        // 400 × 32000 / 30000 = 426.666..., / 5.0000 = 85.3333 EOS
        assert_eq!(quote.collateral_out.to_string(), "85.3333 EOS@eosio.token");
        assert_eq!(
            quote.seized_wrapped.unwrap().extended_symbol().to_string(),
            "4,PZEOS@pztken.pizza"
        );
    }

    #[test]
    fn test_bonus_split_is_exact() {
        let liq_value = U256::from(300u64) * WAD;
        // bonus 15% -> liquidator gets 10%
        assert_eq!(bonus_value(liq_value, 1_500).unwrap(), U256::from(330u64) * WAD);
        assert_eq!(bonus_value(liq_value, 0).unwrap(), liq_value);
    }

    #[test]
    fn test_infeasible_requests_quote_zero() {
        let registry = registry();
        let (loans, collaterals) = positions(&registry);
        let engine = engine(&registry, false);

        let cases = [
            ("1.0000 EOS@eosio.token", Infeasible::NoMatchingLoan),
            ("1.0000 USDT@fake.token", Infeasible::NoMatchingLoan),
            ("0.0000 USDT@tethertether", Infeasible::NothingToRepay),
            ("500.0002 USDT@tethertether", Infeasible::RepayExceedsDebt),
        ];
        for (repay, reason) in cases {
            let repay: ExtendedAsset = repay.parse().unwrap();
            let quote = engine.liquidation_out(&repay, &eos(), &loans, &collaterals).unwrap();
            assert_eq!(quote.infeasible, Some(reason), "{repay}");
            assert!(quote.collateral_out.is_zero());
        }

        let repay: ExtendedAsset = "1.0000 USDT@tethertether".parse().unwrap();
        let usdt: ExtendedSymbol = "4,USDT@tethertether".parse().unwrap();
        let quote = engine.liquidation_out(&repay, &usdt, &loans, &collaterals).unwrap();
        assert_eq!(quote.infeasible, Some(Infeasible::NoMatchingCollateral));
    }

    #[test]
    fn test_payout_capped_by_held_collateral() {
        let registry = registry();
        let (loans, _) = positions(&registry);
        let collaterals = vec![valuation(&registry, "pzeos", "10.0000 EOS@eosio.token", false)];
        let repay: ExtendedAsset = "400.0000 USDT@tethertether".parse().unwrap();

        let quote = engine(&registry, true)
            .liquidation_out(&repay, &eos(), &loans, &collaterals)
            .unwrap();
        assert_eq!(quote.infeasible, Some(Infeasible::ExceedsHeldCollateral));
        assert!(quote.collateral_out.is_zero());
    }

    #[test]
    fn test_split_rows_are_combined() {
        let registry = registry();
        let loans = vec![
            valuation(&registry, "pzusdt", "250.0000 USDT@tethertether", true),
            valuation(&registry, "pzusdt", "250.0000 USDT@tethertether", true),
        ];
        let collaterals = vec![
            valuation(&registry, "pzeos", "50.0000 EOS@eosio.token", false),
            valuation(&registry, "pzeos", "50.0000 EOS@eosio.token", false),
        ];
        let engine = engine(&registry, true);

        // 85.3333 EOS fits in the combined 100 EOS but not in either row
        let repay: ExtendedAsset = "400.0000 USDT@tethertether".parse().unwrap();
        let quote = engine.liquidation_out(&repay, &eos(), &loans, &collaterals).unwrap();
        assert!(quote.is_feasible());
        assert_eq!(quote.collateral_out.to_string(), "85.3333 EOS@eosio.token");

        let repay: ExtendedAsset = "500.0001 USDT@tethertether".parse().unwrap();
        let quote = engine.liquidation_out(&repay, &eos(), &loans, &collaterals).unwrap();
        assert_eq!(quote.infeasible, Some(Infeasible::RepayExceedsDebt));
    }

    #[test]
    fn test_worthless_collateral_is_not_healthy() {
        let registry = registry();
        let loans = vec![valuation(&registry, "pzusdt", "500.0000 USDT@tethertether", true)];
        let collaterals = vec![valuation(&registry, "pzeos", "0.0000 EOS@eosio.token", false)];
        let repay: ExtendedAsset = "1.0000 USDT@tethertether".parse().unwrap();

        // Factor is zero with debt outstanding; the payout cap rejects instead
        let quote = engine(&registry, true)
            .liquidation_out(&repay, &eos(), &loans, &collaterals)
            .unwrap();
        assert_eq!(quote.infeasible, Some(Infeasible::ExceedsHeldCollateral));
    }

    #[test]
    fn test_recheck_health() {
        let registry = registry();
        let loans = vec![valuation(&registry, "pzusdt", "100.0000 USDT@tethertether", true)];
        let collaterals = vec![valuation(&registry, "pzeos", "100.0000 EOS@eosio.token", false)];
        let repay: ExtendedAsset = "50.0000 USDT@tethertether".parse().unwrap();

        // 400 / 100: healthy
        let quote = engine(&registry, true)
            .liquidation_out(&repay, &eos(), &loans, &collaterals)
            .unwrap();
        assert_eq!(quote.infeasible, Some(Infeasible::Healthy));

        // Without the recheck the caller's precondition is trusted
        let quote = engine(&registry, false)
            .liquidation_out(&repay, &eos(), &loans, &collaterals)
            .unwrap();
        assert!(quote.is_feasible());
    }

    #[test]
    fn test_zero_collateral_price() {
        let mut eos_reserve = fixtures::eos();
        eos_reserve.price = "0.0000".parse().unwrap();
        let registry =
            ReserveRegistry::new(vec![fixtures::usdt(), eos_reserve], AliasConfig::default()).unwrap();
        let (loans, collaterals) = positions(&registry);
        let repay: ExtendedAsset = "400.0000 USDT@tethertether".parse().unwrap();

        let result = engine(&registry, false).liquidation_out(&repay, &eos(), &loans, &collaterals);
        assert!(matches!(result, Err(Error::ZeroPrice(_))));
    }

    #[test]
    fn test_preferred_pair() {
        let mut usdt = fixtures::usdt();
        usdt.config.collateral_liquidation_order = 2;
        let mut eos = fixtures::eos();
        eos.config.collateral_liquidation_order = 1;
        let registry = ReserveRegistry::new(vec![usdt, eos], AliasConfig::default()).unwrap();

        let loans = vec![valuation(&registry, "pzusdt", "500.0000 USDT@tethertether", true)];
        let collaterals = vec![
            valuation(&registry, "pzusdt", "50.0000 USDT@tethertether", false),
            valuation(&registry, "pzeos", "100.0000 EOS@eosio.token", false),
        ];
        let (loan, collateral) = engine(&registry, true)
            .preferred_pair(&loans, &collaterals)
            .unwrap()
            .unwrap();
        assert_eq!(loan.reserve.as_str(), "pzusdt");
        assert_eq!(collateral.reserve.as_str(), "pzeos");

        assert!(engine(&registry, true).preferred_pair(&[], &collaterals).unwrap().is_none());
    }
}
