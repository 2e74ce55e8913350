//! Conversion between underlying assets and wrapped reserve shares.

use alloy::primitives::U256;
use tracing::{debug, instrument, warn};

use crate::asset::{ExtendedAsset, Symbol};
use crate::error::{Error, Result};
use crate::registry::ReserveRegistry;
use crate::reserve::Reserve;
use crate::store::SupplyProvider;
use crate::u256_math;

/// Underlying amount a wrapped quantity redeems for in `reserve`.
///
/// When the result exceeds the reserve's available deposit and
/// `ignore_deposit_limit` is false, the result is zero rather than capped: the
/// reserve is temporarily illiquid, not partially redeemable.
pub fn redeem_amount(reserve: &Reserve, wrapped_amount: i64, ignore_deposit_limit: bool) -> Result<i64> {
    let wrapped = U256::from(wrapped_amount.max(0) as u64);
    let amount_out = u256_math::to_i64(reserve.exchange_rate.unwrap(wrapped)?)?;

    if amount_out > reserve.available_deposit.amount && !ignore_deposit_limit {
        warn!(
            reserve = %reserve.id,
            amount_out,
            available = reserve.available_deposit.amount,
            "Redemption exceeds available deposit, clamping to zero"
        );
        return Ok(0);
    }
    Ok(amount_out)
}

/// Wrapped amount an underlying quantity buys in `reserve`.
pub fn deposit_amount(reserve: &Reserve, underlying_amount: i64) -> Result<i64> {
    let underlying = U256::from(underlying_amount.max(0) as u64);
    u256_math::to_i64(reserve.exchange_rate.wrap(underlying)?)
}

/// Wrap/unwrap calculator over a registry snapshot.
#[derive(Debug, Clone, Copy)]
pub struct Converter<'a> {
    registry: &'a ReserveRegistry,
    supply: &'a dyn SupplyProvider,
}

impl<'a> Converter<'a> {
    pub fn new(registry: &'a ReserveRegistry, supply: &'a dyn SupplyProvider) -> Self {
        Self { registry, supply }
    }

    /// Underlying asset into wrapped shares: `floor(amount / exchange_rate)`.
    #[instrument(skip(self))]
    pub fn wrap(&self, underlying: &ExtendedAsset) -> Result<ExtendedAsset> {
        if underlying.amount() < 0 {
            return Err(Error::NotLendable(underlying.to_string()));
        }
        let reserve = self
            .registry
            .lookup_by_anchor(&underlying.extended_symbol())
            .map_err(|_| Error::NotLendable(underlying.to_string()))?;

        let amount = deposit_amount(reserve, underlying.amount())?;
        let wrapped = ExtendedAsset::from_amount(amount, reserve.wrapped);
        debug!(reserve = %reserve.id, wrapped = %wrapped, "Wrapped");
        Ok(wrapped)
    }

    /// Wrapped shares into underlying: `floor(exchange_rate * amount)`, zero if
    /// the result exceeds the available deposit (unless `ignore_deposit_limit`).
    #[instrument(skip(self))]
    pub fn unwrap(&self, wrapped: &ExtendedAsset, ignore_deposit_limit: bool) -> Result<ExtendedAsset> {
        if wrapped.amount() < 0 {
            return Err(Error::NotRedeemable(wrapped.to_string()));
        }
        let reserve = self
            .registry
            .lookup_by_wrapped(&wrapped.extended_symbol())
            .map_err(|_| Error::NotRedeemable(wrapped.to_string()))?;

        let amount = redeem_amount(reserve, wrapped.amount(), ignore_deposit_limit)?;
        let underlying = ExtendedAsset::from_amount(amount, reserve.anchor);
        debug!(reserve = %reserve.id, underlying = %underlying, "Unwrapped");
        Ok(underlying)
    }

    /// Convert `input` into whichever side of a reserve carries `out_symbol`.
    ///
    /// Wrapping is tried first (when `out_symbol` is a wrapped token), then
    /// unwrapping (when `input` is one). Deposit limits apply to unwrapping.
    pub fn get_amount_out(&self, input: &ExtendedAsset, out_symbol: &Symbol) -> Result<ExtendedAsset> {
        if self.supply.is_valid_wrapped_symbol(out_symbol) {
            if let Some(out) = Self::matching(self.wrap(input), out_symbol)? {
                return Ok(out);
            }
        }

        if self.supply.is_valid_wrapped_symbol(&input.symbol()) {
            if let Some(out) = Self::matching(self.unwrap(input, false), out_symbol)? {
                return Ok(out);
            }
        }

        Err(Error::NotConvertible {
            input: input.to_string(),
            output: out_symbol.to_string(),
        })
    }

    /// A conversion path counts only if it exists and lands on `out_symbol`.
    fn matching(result: Result<ExtendedAsset>, out_symbol: &Symbol) -> Result<Option<ExtendedAsset>> {
        match result {
            Ok(out) if out.symbol() == *out_symbol => Ok(Some(out)),
            Ok(_) | Err(Error::NotLendable(_)) | Err(Error::NotRedeemable(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
