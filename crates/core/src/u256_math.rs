//! Fixed-point arithmetic on U256 for valuation and liquidation math.
//!
//! Every scale used by the engine lives here as a named constant. All
//! divisions floor, so conversions never create value out of rounding.

use alloy::primitives::U256;

use crate::error::{Error, Result};

/// WAD constant: 1e18 for 18-decimal fixed-point arithmetic.
/// Values, health factors and exchange rates use this scale.
pub const WAD: U256 = U256::from_limbs([1_000_000_000_000_000_000u64, 0, 0, 0]);

/// Basis points denominator (10000 = 100%).
pub const BPS_DENOMINATOR: u64 = 10_000;

/// Internal scale of a loan's outstanding quantity relative to its nominal amount.
pub const LOAN_QUANTITY_SCALE: u64 = 10_000;

/// Decimal digits of WAD.
pub const WAD_DECIMALS: u8 = 18;

/// Power of ten as U256.
#[inline]
pub fn pow10(exp: u8) -> U256 {
    U256::from(10u64).pow(U256::from(exp))
}

/// `floor(a * b / denominator)` with overflow and zero-denominator checks.
#[inline]
pub fn mul_div(a: U256, b: U256, denominator: U256) -> Result<U256> {
    if denominator.is_zero() {
        return Err(Error::Overflow);
    }
    let product = a.checked_mul(b).ok_or(Error::Overflow)?;
    Ok(product / denominator)
}

/// Multiply two WAD values: floor((a * b) / WAD).
#[inline]
pub fn wad_mul(a: U256, b: U256) -> Result<U256> {
    mul_div(a, b, WAD)
}

/// Divide two WAD values: floor((a * WAD) / b).
#[inline]
pub fn wad_div(a: U256, b: U256) -> Result<U256> {
    mul_div(a, WAD, b)
}

/// Apply a basis-point fraction: floor(value * bps / 10000).
///
/// Example: apply_bps(1000, 8500) = 850
#[inline]
pub fn apply_bps(value: U256, bps: u16) -> Result<U256> {
    mul_div(value, U256::from(bps), U256::from(BPS_DENOMINATOR))
}

/// Value of a token amount at an oracle price, in WAD.
///
/// Formula: floor(amount * price * 10^18 / (10^amount_decimals * 10^price_decimals))
///
/// Example: 100.0000 EOS (4 decimals) at 5.0000 (4 decimals) = 500 * 10^18
#[inline]
pub fn calculate_value_wad(
    amount: U256,
    amount_decimals: u8,
    price: U256,
    price_decimals: u8,
) -> Result<U256> {
    if amount.is_zero() || price.is_zero() {
        return Ok(U256::ZERO);
    }

    let raw = amount.checked_mul(price).ok_or(Error::Overflow)?;
    let scale_adjustment =
        WAD_DECIMALS as i32 - amount_decimals as i32 - price_decimals as i32;

    if scale_adjustment >= 0 {
        raw.checked_mul(pow10(scale_adjustment as u8))
            .ok_or(Error::Overflow)
    } else {
        Ok(raw / pow10((-scale_adjustment) as u8))
    }
}

/// Token amount worth `value_wad` at an oracle price, floored to whole smallest units.
///
/// Formula: floor(value * 10^price_decimals * 10^amount_decimals / (price * 10^18))
#[inline]
pub fn calculate_amount_for_value(
    value_wad: U256,
    price: U256,
    price_decimals: u8,
    amount_decimals: u8,
) -> Result<U256> {
    let denominator = price.checked_mul(WAD).ok_or(Error::Overflow)?;
    let numerator_scale = pow10(price_decimals)
        .checked_mul(pow10(amount_decimals))
        .ok_or(Error::Overflow)?;
    mul_div(value_wad, numerator_scale, denominator)
}

/// Calculate health factor in WAD (18 decimals).
/// HF = (risk_weighted_collateral * 10^18) / total_debt
///
/// Returns zero if debt is zero: an account without debt is never liquidatable.
#[inline]
pub fn calculate_hf_wad(collateral_weighted_wad: U256, debt_wad: U256) -> Result<U256> {
    if debt_wad.is_zero() {
        return Ok(U256::ZERO);
    }
    wad_div(collateral_weighted_wad, debt_wad)
}

/// Convert WAD (18 decimals) to f64.
/// Use only for display/logging, not for computation.
#[inline]
pub fn wad_to_f64(wad: U256) -> f64 {
    if wad <= U256::from(u128::MAX) {
        let value: u128 = wad.to();
        value as f64 / 1e18
    } else {
        let limbs = wad.as_limbs();
        let mut acc = 0.0f64;
        for limb in limbs.iter().rev() {
            acc = acc * (u64::MAX as f64 + 1.0) + *limb as f64;
        }
        acc / 1e18
    }
}

/// Convert f64 to WAD (18 decimals), flooring. Negative and NaN inputs map to zero.
#[inline]
pub fn f64_to_wad(value: f64) -> U256 {
    if !(value > 0.0) {
        return U256::ZERO;
    }
    U256::from((value * 1e18) as u128)
}

/// Convert a U256 that must fit an i64 amount.
#[inline]
pub fn to_i64(value: U256) -> Result<i64> {
    let value: u64 = value.try_into().map_err(|_| Error::Overflow)?;
    i64::try_from(value).map_err(|_| Error::Overflow)
}

/// Parse a non-negative decimal string into a fixed-point integer with `decimals` digits.
///
/// Digits past `decimals` are truncated. Example: ("1.5", 4) -> 15000
pub fn parse_decimal(input: &str, decimals: u8) -> Result<U256> {
    let (whole, fraction) = input.split_once('.').unwrap_or((input, ""));
    if whole.is_empty()
        || !whole.bytes().all(|b| b.is_ascii_digit())
        || !fraction.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(Error::parse(input, "expected a non-negative decimal number"));
    }
    let fraction = &fraction[..fraction.len().min(decimals as usize)];
    let padded = format!("{whole}{fraction:0<width$}", width = decimals as usize);
    U256::from_str_radix(&padded, 10).map_err(|_| Error::parse(input, "number out of range"))
}

/// Render a fixed-point integer with `decimals` digits, trimming trailing zeros.
pub fn format_decimal(value: U256, decimals: u8) -> String {
    let unit = pow10(decimals);
    let whole = value / unit;
    let fraction = value % unit;
    if decimals == 0 || fraction.is_zero() {
        return whole.to_string();
    }
    let fraction = format!("{:0>width$}", fraction.to_string(), width = decimals as usize);
    format!("{whole}.{}", fraction.trim_end_matches('0'))
}
