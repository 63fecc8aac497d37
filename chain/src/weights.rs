//! Weight processing for on-chain emission
//!
//! Raw scores become chain weights in two steps: normalise and cap the
//! float vector, then quantise to the u16 range the chain accepts.

use oceans_core::Uid;
use tracing::warn;

/// Clean up a raw score vector for emission.
///
/// Drops NaN and non-positive entries, L1-normalises the remainder, and
/// enforces a per-weight cap (`max_weight_limit`, a fraction of the total)
/// by clamping and re-normalising until the cap holds.
///
/// Returns parallel `(uids, weights)` vectors; both empty when nothing
/// survives.
pub fn process_weights(
    uids: &[Uid],
    weights: &[f64],
    max_weight_limit: f64,
) -> (Vec<Uid>, Vec<f64>) {
    if uids.len() != weights.len() {
        warn!(
            uids = uids.len(),
            weights = weights.len(),
            "uid/weight length mismatch, emitting nothing"
        );
        return (Vec::new(), Vec::new());
    }

    let mut kept: Vec<(Uid, f64)> = uids
        .iter()
        .zip(weights.iter())
        .filter(|(_, w)| w.is_finite() && **w > 0.0)
        .map(|(u, w)| (*u, *w))
        .collect();

    if kept.is_empty() {
        return (Vec::new(), Vec::new());
    }

    let total: f64 = kept.iter().map(|(_, w)| w).sum();
    for (_, w) in kept.iter_mut() {
        *w /= total;
    }

    if max_weight_limit > 0.0 && max_weight_limit < 1.0 {
        // Clamping changes the total, so iterate until the cap holds.
        for _ in 0..16 {
            let max = kept.iter().map(|(_, w)| *w).fold(0.0, f64::max);
            if max <= max_weight_limit + 1e-12 {
                break;
            }
            for (_, w) in kept.iter_mut() {
                *w = w.min(max_weight_limit);
            }
            let total: f64 = kept.iter().map(|(_, w)| w).sum();
            for (_, w) in kept.iter_mut() {
                *w /= total;
            }
        }
    }

    kept.into_iter().unzip()
}

/// Quantise normalised weights into the u16 wire format.
///
/// The largest weight maps to `u16::MAX`; zero results are dropped.
pub fn quantise_for_emit(uids: &[Uid], weights: &[f64]) -> (Vec<Uid>, Vec<u16>) {
    if uids.len() != weights.len() || uids.is_empty() {
        return (Vec::new(), Vec::new());
    }

    let max = weights.iter().copied().fold(0.0, f64::max);
    if !(max.is_finite() && max > 0.0) {
        return (Vec::new(), Vec::new());
    }

    let mut out_uids = Vec::with_capacity(uids.len());
    let mut out_weights = Vec::with_capacity(uids.len());
    for (uid, w) in uids.iter().zip(weights.iter()) {
        let q = ((w / max) * u16::MAX as f64).round() as u32;
        let q = q.min(u16::MAX as u32) as u16;
        if q > 0 {
            out_uids.push(*uid);
            out_weights.push(q);
        }
    }
    (out_uids, out_weights)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn process_normalises_and_drops_garbage() {
        let uids = vec![0, 1, 2, 3];
        let weights = vec![2.0, 0.0, f64::NAN, 6.0];
        let (u, w) = process_weights(&uids, &weights, 1.0);

        assert_eq!(u, vec![0, 3]);
        assert!((w.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert!((w[0] - 0.25).abs() < 1e-12);
        assert!((w[1] - 0.75).abs() < 1e-12);
    }

    #[test]
    fn process_enforces_max_weight_limit() {
        let uids = vec![0, 1, 2];
        let weights = vec![0.9, 0.05, 0.05];
        let (_, w) = process_weights(&uids, &weights, 0.5);

        assert!(w.iter().all(|&x| x <= 0.5 + 1e-9));
        assert!((w.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn process_empty_when_all_zero() {
        let (u, w) = process_weights(&[0, 1], &[0.0, 0.0], 1.0);
        assert!(u.is_empty() && w.is_empty());
    }

    #[test]
    fn quantise_maps_max_to_u16_max() {
        let (u, q) = quantise_for_emit(&[0, 1], &[0.75, 0.25]);
        assert_eq!(u, vec![0, 1]);
        assert_eq!(q[0], u16::MAX);
        assert_eq!(q[1], (u16::MAX as f64 / 3.0).round() as u16);
    }

    #[test]
    fn quantise_single_miner_full_weight() {
        let (u, q) = quantise_for_emit(&[5], &[1.0]);
        assert_eq!(u, vec![5]);
        assert_eq!(q, vec![u16::MAX]);
    }

    #[test]
    fn quantise_drops_zero_results() {
        // Weight so small relative to max that it rounds to zero
        let (u, q) = quantise_for_emit(&[0, 1], &[1.0, 1e-9]);
        assert_eq!(u, vec![0]);
        assert_eq!(q, vec![u16::MAX]);
    }
}
