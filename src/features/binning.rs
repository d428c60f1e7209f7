//! Logarithmic one-hot binning shared by the time and repeat features.
//!
//! Any bin index that falls outside `0..bins` collapses into the last bin.

const TIME_BASE: f64 = 1.5;

/// Bin for a time difference: `trunc(log_1.5(diff + 1)) - 1`.
///
/// A zero difference yields index -1 and therefore lands in the last bin,
/// alongside differences too large for the vector.
pub fn time_bin(diff_seconds: u64, bins: usize) -> usize {
    let raw = ((diff_seconds as f64 + 1.0).ln() / TIME_BASE.ln()) as i64 - 1;
    clamp_to_last(raw, bins)
}

/// Bin for a word probability: `-trunc(log10 p)`, so rarer words land further right.
pub fn frequency_bin(probability: f64, bins: usize) -> usize {
    if probability <= 0.0 {
        return 0;
    }
    let raw = -(probability.log10().trunc()) as i64;
    clamp_to_last(raw, bins)
}

fn clamp_to_last(raw: i64, bins: usize) -> usize {
    match usize::try_from(raw) {
        Ok(index) if index < bins => index,
        _ => bins.saturating_sub(1),
    }
}

pub fn one_hot(index: usize, bins: usize) -> Vec<f64> {
    let mut vector = vec![0.0; bins];
    if let Some(slot) = vector.get_mut(index) {
        *slot = 1.0;
    }
    vector
}
