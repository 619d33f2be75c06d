//! Subset (subpopulation) selection.
//!
//! With `C = C(n_samples, n_subsamples)` possible subsets:
//!
//! - `C` within the budget: every subset is enumerated in lexicographic order.
//!   The result is deterministic and the RNG is never touched.
//! - `C` above the budget: `max_subpopulation` subsets are drawn, each with
//!   distinct indices, from the caller's RNG. Different draws may repeat.

use rand::Rng;
use rand::seq::index;

use crate::domain::{MaxSubpopulation, SubsampleSize};
use crate::error::TheilSenError;

/// Materialized subsets for one fit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subsets {
    pub indices: Vec<Vec<usize>>,
    /// `true` when every combination was enumerated.
    pub exhaustive: bool,
}

impl Subsets {
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Binomial coefficient `C(n, k)`; `None` when it does not fit in a `u128`.
pub fn binomial(n: usize, k: usize) -> Option<u128> {
    if k > n {
        return Some(0);
    }
    let k = k.min(n - k);
    let mut c: u128 = 1;
    for i in 1..=k {
        // c * (n - k + i) is always divisible by i at this point.
        c = c.checked_mul((n - k + i) as u128)? / i as u128;
    }
    Some(c)
}

/// Resolve and validate the subset size for a dataset.
///
/// `n_dim` is the number of parameters a subset has to determine:
/// `n_features`, plus one when an intercept is fitted.
pub fn resolve_subsample_size(
    requested: SubsampleSize,
    n_samples: usize,
    n_features: usize,
    fit_intercept: bool,
) -> Result<usize, TheilSenError> {
    let n_dim = n_features + usize::from(fit_intercept);

    let n_subsamples = match requested {
        SubsampleSize::Auto => n_dim.min(n_samples),
        SubsampleSize::Fixed(n) => n,
    };

    if n_subsamples > n_samples {
        return Err(TheilSenError::invalid(format!(
            "n_subsamples ({n_subsamples}) must be <= n_samples ({n_samples})"
        )));
    }

    if n_samples >= n_dim {
        if n_subsamples < n_dim {
            return Err(TheilSenError::invalid(format!(
                "n_subsamples ({n_subsamples}) must be >= {n_dim} \
                 (n_features={n_features}, fit_intercept={fit_intercept})"
            )));
        }
    } else if n_subsamples != n_samples {
        return Err(TheilSenError::invalid(format!(
            "n_subsamples ({n_subsamples}) must equal n_samples ({n_samples}) \
             when there are more parameters ({n_dim}) than samples"
        )));
    }

    Ok(n_subsamples)
}

/// Upper bound on `count · n_subsamples`, the row indices held in memory for one fit.
pub const MAX_SUBSET_INDICES: u128 = 1 << 30;

/// Number of subsets a fit will use: `min(C(n, k), max_subpopulation)`.
pub fn subpopulation_size(
    n_samples: usize,
    n_subsamples: usize,
    max_subpopulation: MaxSubpopulation,
) -> Result<(usize, bool), TheilSenError> {
    if max_subpopulation == MaxSubpopulation::Limit(0) {
        return Err(TheilSenError::invalid("max_subpopulation must be >= 1, got 0"));
    }

    let (count, exhaustive) = match binomial(n_samples, n_subsamples) {
        Some(c) if max_subpopulation.admits(c) => (c, true),
        _ => match max_subpopulation {
            MaxSubpopulation::Limit(limit) => (limit as u128, false),
            MaxSubpopulation::Unbounded => return Err(too_many(n_samples, n_subsamples)),
        },
    };

    if count.saturating_mul(n_subsamples as u128) > MAX_SUBSET_INDICES {
        return Err(TheilSenError::invalid(format!(
            "{count} subsets of size {n_subsamples} exceed the limit of \
             {MAX_SUBSET_INDICES} row indices; lower max_subpopulation"
        )));
    }
    let count = usize::try_from(count).map_err(|_| too_many(n_samples, n_subsamples))?;
    Ok((count, exhaustive))
}

fn too_many(n_samples: usize, n_subsamples: usize) -> TheilSenError {
    TheilSenError::invalid(format!(
        "C({n_samples}, {n_subsamples}) subsets cannot be enumerated; \
         set a finite max_subpopulation"
    ))
}

/// Generate the subsets used for candidate slopes.
pub fn generate_subsets<R: Rng + ?Sized>(
    n_samples: usize,
    n_subsamples: usize,
    max_subpopulation: MaxSubpopulation,
    rng: &mut R,
) -> Result<Subsets, TheilSenError> {
    if n_subsamples == 0 || n_subsamples > n_samples {
        return Err(TheilSenError::invalid(format!(
            "n_subsamples ({n_subsamples}) must be in 1..={n_samples}"
        )));
    }

    let (count, exhaustive) = subpopulation_size(n_samples, n_subsamples, max_subpopulation)?;

    let indices: Vec<Vec<usize>> = if exhaustive {
        Combinations::new(n_samples, n_subsamples).collect()
    } else {
        (0..count)
            .map(|_| index::sample(rng, n_samples, n_subsamples).into_vec())
            .collect()
    };

    Ok(Subsets {
        indices,
        exhaustive,
    })
}

/// Lexicographic `k`-combinations of `0..n`.
#[derive(Debug, Clone)]
pub struct Combinations {
    n: usize,
    current: Option<Vec<usize>>,
}

impl Combinations {
    pub fn new(n: usize, k: usize) -> Self {
        let current = if k <= n { Some((0..k).collect()) } else { None };
        Self { n, current }
    }
}

impl Iterator for Combinations {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        let out = self.current.take()?;
        let k = out.len();

        // Advance: find the rightmost slot that can still move right.
        let mut next = out.clone();
        let mut i = k;
        while i > 0 {
            i -= 1;
            if next[i] < self.n - k + i {
                next[i] += 1;
                for j in (i + 1)..k {
                    next[j] = next[j - 1] + 1;
                }
                self.current = Some(next);
                return Some(out);
            }
        }

        Some(out)
    }
}
