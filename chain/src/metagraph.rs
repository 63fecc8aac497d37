//! Metagraph model for the primary subnet

use std::collections::HashMap;

use oceans_core::{Coldkey, Hotkey, SubnetId, Uid};
use serde::{Deserialize, Serialize};

/// Snapshot of a subnet's neuron set at a block.
///
/// `uids`, `hotkeys`, `coldkeys` and `stakes` are parallel vectors of
/// equal length; entry `i` describes one neuron.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metagraph {
    pub netuid: SubnetId,
    pub block: u64,
    pub uids: Vec<Uid>,
    pub hotkeys: Vec<Hotkey>,
    pub coldkeys: Vec<Coldkey>,
    /// Stake per neuron, in TAO.
    pub stakes: Vec<f64>,
    /// Version key expected by the weight-setting extrinsic.
    pub weights_version: u64,
}

impl Metagraph {
    pub fn new(
        netuid: SubnetId,
        block: u64,
        uids: Vec<Uid>,
        hotkeys: Vec<Hotkey>,
        coldkeys: Vec<Coldkey>,
        stakes: Vec<f64>,
        weights_version: u64,
    ) -> Self {
        debug_assert_eq!(uids.len(), hotkeys.len());
        debug_assert_eq!(uids.len(), coldkeys.len());
        debug_assert_eq!(uids.len(), stakes.len());
        Self {
            netuid,
            block,
            uids,
            hotkeys,
            coldkeys,
            stakes,
            weights_version,
        }
    }

    /// Number of neurons.
    pub fn len(&self) -> usize {
        self.uids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.uids.is_empty()
    }

    /// Coldkey -> UID lookup map. The first UID wins when a coldkey owns
    /// several neurons.
    pub fn uid_by_coldkey(&self) -> HashMap<Coldkey, Uid> {
        let mut map = HashMap::with_capacity(self.len());
        for (uid, ck) in self.uids.iter().zip(self.coldkeys.iter()) {
            map.entry(ck.clone()).or_insert(*uid);
        }
        map
    }

    /// Unique coldkeys in first-seen order.
    pub fn unique_coldkeys(&self) -> Vec<Coldkey> {
        let mut seen = std::collections::HashSet::new();
        self.coldkeys
            .iter()
            .filter(|ck| seen.insert(ck.as_str()))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Metagraph {
        Metagraph::new(
            66,
            1000,
            vec![0, 1, 2],
            vec!["hk-0".into(), "hk-1".into(), "hk-2".into()],
            vec!["ck-a".into(), "ck-b".into(), "ck-a".into()],
            vec![10.0, 5.0, 0.0],
            1,
        )
    }

    #[test]
    fn uid_by_coldkey_first_uid_wins() {
        let mg = sample();
        let map = mg.uid_by_coldkey();
        assert_eq!(map["ck-a"], 0);
        assert_eq!(map["ck-b"], 1);
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn unique_coldkeys_preserve_order() {
        let mg = sample();
        assert_eq!(mg.unique_coldkeys(), vec!["ck-a".to_string(), "ck-b".to_string()]);
    }
}
