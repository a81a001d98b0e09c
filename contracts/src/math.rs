//! Fixed-point helpers shared by the accumulators and the price aggregator.
//!
//! All values are 18-decimal fixed point held in `U256`. Intermediate
//! products are widened to `U512` so `a * b` never wraps before the divide.
//! Every division truncates toward zero.

use odra::casper_types::{U256, U512};
use crate::errors::CdpError;

/// Fixed-point scale (1e18)
pub const DECIMAL_PRECISION: u128 = 1_000_000_000_000_000_000;

/// Scale of the index multiplier (1e9)
pub const INDEX_PRECISION: u128 = 1_000_000_000;

/// Minimum collateral ratio below which a position is liquidatable (110%)
pub const MCR: u128 = 1_100_000_000_000_000_000;

/// Convert U256 to U512
pub fn u256_to_u512(value: U256) -> U512 {
    let mut bytes = [0u8; 32];
    value.to_little_endian(&mut bytes);
    U512::from_little_endian(&bytes)
}

/// Narrow U512 back to U256, failing if the high half is set
pub fn u512_to_u256(value: U512) -> Result<U256, CdpError> {
    let mut bytes = [0u8; 64];
    value.to_little_endian(&mut bytes);
    if bytes[32..].iter().any(|b| *b != 0) {
        return Err(CdpError::Overflow);
    }
    Ok(U256::from_little_endian(&bytes[..32]))
}

/// `a * b / denominator` with a 512-bit intermediate
pub fn mul_div(a: U256, b: U256, denominator: U256) -> Result<U256, CdpError> {
    if denominator.is_zero() {
        return Err(CdpError::DivisionByZero);
    }
    let product = u256_to_u512(a) * u256_to_u512(b);
    u512_to_u256(product / u256_to_u512(denominator))
}

pub fn checked_add(a: U256, b: U256) -> Result<U256, CdpError> {
    a.checked_add(b).ok_or(CdpError::Overflow)
}

pub fn checked_sub(a: U256, b: U256) -> Result<U256, CdpError> {
    a.checked_sub(b).ok_or(CdpError::Underflow)
}

/// Increment of a per-unit-staked accumulator: `amount * 1e18 / total`
pub fn per_unit_staked(amount: U256, total: U256) -> Result<U256, CdpError> {
    mul_div(amount, U256::from(DECIMAL_PRECISION), total)
}

/// Gain owed to `stake` since `snapshot`: `stake * (current - snapshot) / 1e18`
pub fn accrued_since(stake: U256, current: U256, snapshot: U256) -> Result<U256, CdpError> {
    let delta = checked_sub(current, snapshot)?;
    mul_div(stake, delta, U256::from(DECIMAL_PRECISION))
}

/// Collateral ratio `collateral * price / debt`, 1e18 scaled.
/// A position with no debt has an unbounded ratio.
pub fn collateral_ratio(collateral: U256, debt: U256, price: U256) -> Result<U256, CdpError> {
    if debt.is_zero() {
        return Ok(U256::MAX);
    }
    mul_div(collateral, price, debt)
}

/// Composite USD price from the two feeds and the 9-decimal index.
///
/// `secondary * index` is reduced to an 18-decimal quote first, then scaled
/// by the primary price, dividing once per step in 512-bit precision so
/// neither a large primary nor a large secondary price loses digits.
pub fn composite_price(primary: U256, secondary: U256, index: U256) -> Result<U256, CdpError> {
    let scale = U256::from(DECIMAL_PRECISION);
    let secondary_indexed = mul_div(secondary, index, scale)?;
    mul_div(secondary_indexed, primary, U256::from(INDEX_PRECISION))
}
