//! Concentrated-liquidity position model
//!
//! Positions follow Uniswap-v3 style math over the subnet's TAO/α pool.
//! Prices are expressed in TAO per α; liquidity `L` is rao-scaled.

use std::collections::BTreeMap;

use oceans_core::{rao_to_tao, Coldkey, SubnetId};
use serde::{Deserialize, Serialize};

/// Token legs of a position at some price, denominated in TAO / α.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TokenAmounts {
    pub alpha: f64,
    pub tao: f64,
}

/// One liquidity position on a subnet's swap pool.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LiquidityPosition {
    pub id: u64,
    /// Lower price bound of the band (TAO per α).
    pub price_low: f64,
    /// Upper price bound of the band (TAO per α).
    pub price_high: f64,
    /// Uniswap "L", rao-scaled.
    pub liquidity: u64,
}

impl LiquidityPosition {
    /// Split the position into its token legs at the given current price.
    ///
    /// Below the band the position is all α; above it all TAO; inside the
    /// band both legs are live:
    ///   tao   = L × (√P − √low)
    ///   alpha = L × (1/√P − 1/√high)
    pub fn to_token_amounts(&self, price: f64) -> TokenAmounts {
        let l = rao_to_tao(self.liquidity);
        let sqrt_low = self.price_low.sqrt();
        let sqrt_high = self.price_high.sqrt();

        if price <= self.price_low {
            TokenAmounts {
                alpha: l * (1.0 / sqrt_low - 1.0 / sqrt_high),
                tao: 0.0,
            }
        } else if price >= self.price_high {
            TokenAmounts {
                alpha: 0.0,
                tao: l * (sqrt_high - sqrt_low),
            }
        } else {
            let sqrt_p = price.sqrt();
            TokenAmounts {
                alpha: l * (1.0 / sqrt_p - 1.0 / sqrt_high),
                tao: l * (sqrt_p - sqrt_low),
            }
        }
    }

    /// Band bounds are usable: finite, positive, and properly ordered.
    pub fn has_valid_bounds(&self) -> bool {
        self.price_low.is_finite()
            && self.price_high.is_finite()
            && self.price_low > 0.0
            && self.price_high > 0.0
            && self.price_high > self.price_low
    }

    /// Whether the current price sits strictly inside the band.
    pub fn in_range(&self, price: f64) -> bool {
        self.price_low < price && price < self.price_high
    }

    /// Band width as a fraction of the current price.
    pub fn relative_width(&self, price: f64) -> f64 {
        (self.price_high - self.price_low) / price
    }
}

/// All positions on one subnet, grouped by owning coldkey.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LiquiditySubnet {
    pub netuid: SubnetId,
    pub positions_by_coldkey: BTreeMap<Coldkey, Vec<LiquidityPosition>>,
}

impl LiquiditySubnet {
    pub fn new(netuid: SubnetId) -> Self {
        Self {
            netuid,
            positions_by_coldkey: BTreeMap::new(),
        }
    }

    pub fn unique_coldkeys(&self) -> usize {
        self.positions_by_coldkey.len()
    }

    pub fn total_positions(&self) -> usize {
        self.positions_by_coldkey.values().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn position(low: f64, high: f64, liquidity_tao: f64) -> LiquidityPosition {
        LiquidityPosition {
            id: 1,
            price_low: low,
            price_high: high,
            liquidity: oceans_core::tao_to_rao(liquidity_tao),
        }
    }

    #[test]
    fn below_band_is_all_alpha() {
        let pos = position(1.0, 4.0, 100.0);
        let amounts = pos.to_token_amounts(0.5);
        assert_eq!(amounts.tao, 0.0);
        assert!(amounts.alpha > 0.0);
    }

    #[test]
    fn above_band_is_all_tao() {
        let pos = position(1.0, 4.0, 100.0);
        let amounts = pos.to_token_amounts(9.0);
        assert_eq!(amounts.alpha, 0.0);
        // L × (√4 − √1) = 100 × 1 = 100 TAO
        assert!((amounts.tao - 100.0).abs() < 1e-9);
    }

    #[test]
    fn inside_band_has_both_legs() {
        let pos = position(1.0, 4.0, 100.0);
        let amounts = pos.to_token_amounts(2.25); // √P = 1.5
        assert!((amounts.tao - 50.0).abs() < 1e-9); // 100 × (1.5 − 1)
        assert!(amounts.alpha > 0.0);
    }

    #[test]
    fn bounds_validation() {
        assert!(position(1.0, 4.0, 1.0).has_valid_bounds());
        assert!(!position(4.0, 1.0, 1.0).has_valid_bounds()); // inverted
        assert!(!position(0.0, 4.0, 1.0).has_valid_bounds()); // non-positive
        assert!(!position(f64::NAN, 4.0, 1.0).has_valid_bounds());
        assert!(!position(1.0, f64::INFINITY, 1.0).has_valid_bounds());
    }

    #[test]
    fn range_and_width_checks() {
        let pos = position(1.0, 2.0, 1.0);
        assert!(pos.in_range(1.5));
        assert!(!pos.in_range(1.0)); // strict bounds
        assert!(!pos.in_range(2.5));
        assert!((pos.relative_width(2.0) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn liquidity_subnet_counters() {
        let mut ls = LiquiditySubnet::new(10);
        ls.positions_by_coldkey
            .insert("ck-a".into(), vec![position(1.0, 2.0, 1.0), position(2.0, 3.0, 1.0)]);
        ls.positions_by_coldkey
            .insert("ck-b".into(), vec![position(1.0, 2.0, 1.0)]);

        assert_eq!(ls.unique_coldkeys(), 2);
        assert_eq!(ls.total_positions(), 3);
    }
}
