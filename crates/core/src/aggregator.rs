//! Per-account enumeration and valuation of collateral and loan positions.

use smallvec::SmallVec;
use tracing::debug;

use crate::asset::{ExtendedAsset, Name};
use crate::convert;
use crate::error::{Error, Result};
use crate::oracle;
use crate::position::{CollateralPosition, LoanPosition, Valuation};
use crate::registry::ReserveRegistry;
use crate::store::PositionStore;

/// Walks an account's positions and prices each one in underlying terms.
#[derive(Debug, Clone, Copy)]
pub struct PositionAggregator<'a> {
    registry: &'a ReserveRegistry,
    positions: &'a dyn PositionStore,
}

impl<'a> PositionAggregator<'a> {
    pub fn new(registry: &'a ReserveRegistry, positions: &'a dyn PositionStore) -> Self {
        Self { registry, positions }
    }

    pub fn registry(&self) -> &'a ReserveRegistry {
        self.registry
    }

    /// Collateral valuations in store insertion order.
    ///
    /// Each wrapped quantity is unwrapped with the deposit-limit clamp before
    /// valuation, so collateral in an illiquid reserve is worth zero. The
    /// sequence is lazy; call again to restart it.
    pub fn collaterals_for(&self, account: &Name) -> impl Iterator<Item = Result<Valuation>> + 'a {
        let registry = self.registry;
        self.positions
            .collaterals_by_account(account)
            .into_iter()
            .map(move |position| valuate_collateral(registry, &position))
    }

    /// Loan valuations in store insertion order, with `risk_weighted == value`.
    pub fn loans_for(&self, account: &Name) -> impl Iterator<Item = Result<Valuation>> + 'a {
        let registry = self.registry;
        self.positions
            .loans_by_account(account)
            .into_iter()
            .map(move |position| valuate_loan(registry, &position))
    }
}

fn valuate_collateral(registry: &ReserveRegistry, position: &CollateralPosition) -> Result<Valuation> {
    let reserve = registry.lookup_by_id(&position.reserve)?;
    if !reserve.is_wrapped(&position.quantity.symbol) {
        return Err(Error::MismatchedReserve {
            asset: position.quantity.to_string(),
            reserve: reserve.id.to_string(),
        });
    }

    let amount = convert::redeem_amount(reserve, position.quantity.amount, false)?;
    let underlying = ExtendedAsset::from_amount(amount, reserve.anchor);
    oracle::oraclized_value(&underlying, reserve)
}

fn valuate_loan(registry: &ReserveRegistry, position: &LoanPosition) -> Result<Valuation> {
    let reserve = registry.lookup_by_id(&position.reserve)?;
    if position.principal.symbol != reserve.anchor.symbol {
        return Err(Error::MismatchedReserve {
            asset: position.principal.to_string(),
            reserve: reserve.id.to_string(),
        });
    }

    let outstanding = ExtendedAsset::from_amount(position.nominal_outstanding(), reserve.anchor);
    oracle::debt_value(&outstanding, reserve)
}

/// Every valuated position of one account, collected eagerly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountPositions {
    pub account: Name,
    pub loans: SmallVec<[Valuation; 4]>,
    pub collaterals: SmallVec<[Valuation; 4]>,
}

impl AccountPositions {
    /// Valuate all of `account`'s positions; the first failure aborts the load.
    pub fn load(aggregator: &PositionAggregator<'_>, account: &Name) -> Result<Self> {
        let loans = aggregator.loans_for(account).collect::<Result<SmallVec<_>>>()?;
        let collaterals = aggregator
            .collaterals_for(account)
            .collect::<Result<SmallVec<_>>>()?;

        debug!(
            account = %account,
            loans = loans.len(),
            collaterals = collaterals.len(),
            "Loaded account positions"
        );

        Ok(Self {
            account: *account,
            loans,
            collaterals,
        })
    }

    pub fn has_debt(&self) -> bool {
        !self.loans.is_empty()
    }
}
