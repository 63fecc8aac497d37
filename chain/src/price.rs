//! Subnet price decoding
//!
//! The chain stores each subnet's pool price as `Swap.AlphaSqrtPrice`, a
//! U64F64 fixed-point square root. The spot price is the square of the
//! decoded value.

/// Scale of the fractional part of a U64F64 fixed-point value.
const FIXED_POINT_SCALE: f64 = 18_446_744_073_709_551_616.0; // 2^64

/// Decode a raw U64F64 sqrt-price into a spot price (TAO per α).
///
/// Returns `None` for prices that are unusable for scoring (non-finite or
/// non-positive).
pub fn sqrt_price_to_price(raw_sqrt_price: u128) -> Option<f64> {
    let sqrt_p = raw_sqrt_price as f64 / FIXED_POINT_SCALE;
    let price = sqrt_p * sqrt_p;
    if price.is_finite() && price > 0.0 {
        Some(price)
    } else {
        None
    }
}
