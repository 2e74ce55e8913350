//! Oracle valuation: the single place price and liquidation rate meet.

use alloy::primitives::U256;
use tracing::trace;

use crate::asset::ExtendedAsset;
use crate::error::{Error, Result};
use crate::position::Valuation;
use crate::reserve::Reserve;
use crate::u256_math;

/// Value `asset` at `reserve`'s oracle price and discount it by the reserve's
/// liquidation rate.
///
/// `asset` must be the reserve's anchor (issuer and symbol), otherwise
/// `Error::MismatchedReserve`.
pub fn oraclized_value(asset: &ExtendedAsset, reserve: &Reserve) -> Result<Valuation> {
    let value = raw_value(asset, reserve)?;
    let risk_weighted = u256_math::apply_bps(value, reserve.liquidation_rate_bps())?;

    trace!(
        reserve = %reserve.id,
        asset = %asset,
        value = u256_math::wad_to_f64(value),
        risk_weighted = u256_math::wad_to_f64(risk_weighted),
        "Oraclized collateral"
    );

    Ok(Valuation {
        reserve: reserve.id,
        asset: *asset,
        value,
        risk_weighted,
    })
}

/// Value of a debt: same pricing, no discount.
pub fn debt_value(asset: &ExtendedAsset, reserve: &Reserve) -> Result<Valuation> {
    let value = raw_value(asset, reserve)?;
    Ok(Valuation {
        reserve: reserve.id,
        asset: *asset,
        value,
        risk_weighted: value,
    })
}

fn raw_value(asset: &ExtendedAsset, reserve: &Reserve) -> Result<U256> {
    if !reserve.is_anchor(&asset.extended_symbol()) {
        return Err(Error::MismatchedReserve {
            asset: asset.to_string(),
            reserve: reserve.id.to_string(),
        });
    }
    u256_math::calculate_value_wad(
        asset.quantity.amount_u256(),
        asset.symbol().precision,
        reserve.price.value,
        reserve.price.decimals,
    )
}
