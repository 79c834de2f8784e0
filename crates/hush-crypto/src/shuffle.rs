//! Unbiased permutation of answer lists.
//!
//! Free-text answers are returned in an order that must never reflect
//! submission order. `SliceRandom::shuffle` is a Fisher–Yates shuffle; driving
//! it with `OsRng` gives a uniform permutation from a CSPRNG.

use rand::rngs::OsRng;
use rand::seq::SliceRandom;

/// Shuffle `items` in place with a CSPRNG-driven Fisher–Yates pass.
pub fn shuffle_in_place<T>(items: &mut [T]) {
    items.shuffle(&mut OsRng);
}
