//! Shared identifier and amount types

use crate::constants::RAO_PER_TAO;

/// Miner UID on the primary subnet.
pub type Uid = u16;

/// Bittensor subnet identifier (netuid).
pub type SubnetId = u16;

/// SS58 address of a hotkey.
pub type Hotkey = String;

/// SS58 address of a coldkey.
pub type Coldkey = String;

/// Convert an amount in rao to TAO.
pub fn rao_to_tao(rao: u64) -> f64 {
    rao as f64 / RAO_PER_TAO
}

/// Convert an amount in TAO to rao (saturating at zero for negatives).
pub fn tao_to_rao(tao: f64) -> u64 {
    if !tao.is_finite() || tao <= 0.0 {
        return 0;
    }
    (tao * RAO_PER_TAO).round() as u64
}
