//! # montecarlo
//!
//! A small toolkit for weighted-die Monte Carlo experiments : )
//!
//! ## Overview
//!
//! Build one or more [`WeightedDie`]s with distinct faces and adjustable
//! per-face weights, roll a set of "similar" dice (same faces, maybe different
//! weights) many times with a [`Trial`], then describe the outcome with an
//! [`Analyzer`]:
//!
//! * how many rolls were jackpots (every die showed the same face),
//! * how often each face showed up in each roll,
//! * how often each combination (order-independent) and permutation
//!   (order-dependent) of faces was observed, alongside every combination or
//!   permutation that _could_ have been observed but wasn't (count 0).
//!
//! ## Example
//!
//! ```rust
//! use montecarlo::{Analyzer, Face, Trial, WeightedDie};
//! use rand::SeedableRng;
//! use rand_xoshiro::Xoshiro256PlusPlus;
//!
//! # fn main() -> Result<(), montecarlo::Error> {
//! let mut die = WeightedDie::new([1, 2, 3, 4, 5, 6])?;
//! die.set_weight(&Face::Int(6), 5.0)?;
//!
//! let mut trial = Trial::new(vec![die.clone(), die]);
//! let mut rng = Xoshiro256PlusPlus::seed_from_u64(0xd15c0);
//! trial.play_rolls(&mut rng, 1_000)?;
//!
//! let analyzer = Analyzer::new(&trial);
//! let jackpots = analyzer.jackpot_count()?;
//! let combos = analyzer.combination_count()?;
//! assert!(jackpots <= 1_000);
//! assert_eq!(combos.total(), 1_000);
//! # Ok(()) }
//! ```
//!
//! ## Threading
//!
//! Everything here is synchronous and single-threaded. An [`Analyzer`] holds a
//! shared borrow of its [`Trial`], so a new roll batch can only be played once
//! every analyzer over that trial is gone.

#[macro_use]
mod macros;

mod analyzer;
pub mod cli;
mod die;
mod error;
#[cfg(test)]
mod stats;
mod trial;

pub use analyzer::{Analyzer, FaceCounts, OutcomeCounts};
pub use die::{Face, WeightedDie};
pub use error::Error;
pub use trial::{NarrowRow, NarrowTable, Shape, Trial, TrialResult, WideTable};

use std::cmp;

pub(crate) const DEFAULT_NUM_DICE: usize = 2;
pub(crate) const DEFAULT_NUM_ROLLS: usize = 10;

///////////////////
// Combinatorics //
///////////////////

/// count `n choose k` without replacement. Returns `None` on overflow.
pub(crate) fn num_combinations(n: u64, k: u64) -> Option<u64> {
    if k > n {
        return Some(0);
    }
    // C(n, k) == C(n, n - k); iterate over the smaller one
    let k = cmp::min(k, n - k);

    // multiply before dividing: every partial product `C(n - k + i, i)` is an
    // integer, so the division is always exact.
    (1..=k).try_fold(1_u64, |acc, i| acc.checked_mul(n - k + i).map(|x| x / i))
}

/// count `n choose k` with replacement. also known as `n multichoose k`.
#[inline]
pub(crate) fn num_multisets(n: u64, k: u64) -> Option<u64> {
    if n == 0 {
        return Some(if k == 0 { 1 } else { 0 });
    }
    num_combinations(n + k - 1, k)
}

/// count the ordered `k`-tuples over `n` symbols, i.e., `n^k`.
#[inline]
pub(crate) fn num_tuples(n: u64, k: u64) -> Option<u64> {
    u32::try_from(k).ok().and_then(|k| n.checked_pow(k))
}

/// Returns `true` if the iterator `iter` is sorted, according to the comparator
/// function `compare`, i.e., `x_1 <= x2 <= ... <= x_n`.
pub(crate) fn is_sorted_by<T, F>(mut iter: impl Iterator<Item = T>, mut compare: F) -> bool
where
    F: FnMut(&T, &T) -> Option<cmp::Ordering>,
{
    let mut prev = match iter.next() {
        Some(first) => first,
        None => return true,
    };

    for next in iter {
        if let Some(cmp::Ordering::Greater) | None = compare(&prev, &next) {
            return false;
        }
        prev = next;
    }

    true
}

///////////
// Tests //
///////////

#[cfg(test)]
mod test {
    use super::*;
    use proptest::prelude::*;

    fn factorial_ref(n: u64) -> u64 {
        (1..=n).product()
    }

    fn niters(n: u32) -> ProptestConfig {
        ProptestConfig::with_cases(n)
    }

    #[test]
    fn test_num_combinations() {
        assert_eq!(Some(1), num_combinations(0, 0));
        assert_eq!(Some(0), num_combinations(3, 4));
        assert_eq!(Some(15), num_combinations(6, 2));
        assert_eq!(Some(21), num_combinations(7, 2));
        assert_eq!(None, num_combinations(u64::MAX, 3));

        proptest!(niters(500), |(n in 0_u64..=20, k in 0_u64..=20)| {
            prop_assume!(k <= n);
            let expected = factorial_ref(n) / (factorial_ref(k) * factorial_ref(n - k));
            prop_assert_eq!(Some(expected), num_combinations(n, k));
        });
    }

    #[test]
    fn test_num_multisets() {
        // 6 faces, 2 dice
        assert_eq!(Some(21), num_multisets(6, 2));
        // 6 faces, 3 dice
        assert_eq!(Some(56), num_multisets(6, 3));
        assert_eq!(Some(1), num_multisets(0, 0));
        assert_eq!(Some(0), num_multisets(0, 2));
        assert_eq!(Some(1), num_multisets(4, 0));
    }

    #[test]
    fn test_num_tuples() {
        assert_eq!(Some(36), num_tuples(6, 2));
        assert_eq!(Some(1), num_tuples(6, 0));
        assert_eq!(None, num_tuples(u64::MAX, 2));
    }

    #[test]
    fn test_is_sorted_by() {
        let cmp = |a: &u8, b: &u8| Some(a.cmp(b));
        assert!(is_sorted_by([0_u8; 0].into_iter(), cmp));
        assert!(is_sorted_by([1_u8, 1, 2, 5].into_iter(), cmp));
        assert!(!is_sorted_by([1_u8, 3, 2].into_iter(), cmp));
    }
}
