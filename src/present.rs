//! Presentation-layer reshaping.
//!
//! Pure list transformations applied between aggregation and serialization:
//! a display shuffle and a truncation. The shuffle is rand's Fisher-Yates
//! permutation and exists for front-page variety only; nothing may depend on
//! its statistical quality.

use rand::seq::SliceRandom;
use rand::Rng;

pub fn shuffle<T>(items: &mut [T]) {
    shuffle_with(items, &mut rand::thread_rng());
}

/// Shuffle with a caller-supplied RNG, so tests can seed the permutation.
pub fn shuffle_with<T, R: Rng + ?Sized>(items: &mut [T], rng: &mut R) {
    items.shuffle(rng);
}

/// Keep the first `n` items. The pre-truncation count is what gets reported
/// as `totalCount`, so callers take it before calling this.
pub fn limit<T>(mut items: Vec<T>, n: usize) -> Vec<T> {
    items.truncate(n);
    items
}
