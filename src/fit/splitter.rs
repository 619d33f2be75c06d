//! Work splitting across workers.
//!
//! Partitions are contiguous, in order, and differ in size by at most one:
//! the first `len % n_workers` partitions take one extra item. Workers beyond
//! the number of items get empty partitions. Because partitions are
//! contiguous, concatenating per-partition results restores the original
//! order regardless of which worker finished first.

use crate::error::TheilSenError;

/// Contiguous partitions of a slice.
#[derive(Debug, Clone)]
pub struct WorkSplit<'a, T> {
    partitions: Vec<&'a [T]>,
    starts: Vec<usize>,
    total: usize,
}

/// Split `items` into `n_workers` contiguous partitions.
pub fn split<T>(items: &[T], n_workers: usize) -> Result<WorkSplit<'_, T>, TheilSenError> {
    if n_workers == 0 {
        return Err(TheilSenError::invalid("cannot split work across 0 workers"));
    }

    let total = items.len();
    let base = total / n_workers;
    let remainder = total % n_workers;

    let mut partitions = Vec::with_capacity(n_workers);
    let mut starts = Vec::with_capacity(n_workers);
    let mut start = 0;
    for w in 0..n_workers {
        let size = base + usize::from(w < remainder);
        starts.push(start);
        partitions.push(&items[start..start + size]);
        start += size;
    }

    Ok(WorkSplit {
        partitions,
        starts,
        total,
    })
}

impl<'a, T> WorkSplit<'a, T> {
    pub fn partitions(&self) -> &[&'a [T]] {
        &self.partitions
    }

    pub fn n_workers(&self) -> usize {
        self.partitions.len()
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn sizes(&self) -> Vec<usize> {
        self.partitions.iter().map(|p| p.len()).collect()
    }

    /// First item index of each partition (length `n_workers`).
    pub fn starts(&self) -> &[usize] {
        &self.starts
    }

    /// Partition boundaries (length `n_workers + 1`, last entry is the total).
    pub fn bounds(&self) -> Vec<usize> {
        let mut out = self.starts.clone();
        out.push(self.total);
        out
    }

    /// Concatenate per-partition outputs back into item order.
    ///
    /// `stride` is the number of output values each item produces.
    pub fn reassemble<R>(&self, parts: Vec<Vec<R>>, stride: usize) -> Result<Vec<R>, TheilSenError> {
        if parts.len() != self.partitions.len() {
            return Err(TheilSenError::DimensionMismatch {
                what: "worker results",
                expected: self.partitions.len(),
                got: parts.len(),
            });
        }

        let mut out = Vec::with_capacity(self.total * stride);
        for (part, partition) in parts.into_iter().zip(&self.partitions) {
            if part.len() != partition.len() * stride {
                return Err(TheilSenError::DimensionMismatch {
                    what: "worker result length",
                    expected: partition.len() * stride,
                    got: part.len(),
                });
            }
            out.extend(part);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn random_batches(n: usize) -> Vec<Vec<usize>> {
        let mut rng = StdRng::seed_from_u64(0);
        (0..n)
            .map(|_| (0..10).map(|_| rng.gen_range(0..n)).collect())
            .collect()
    }

    #[test]
    fn remainder_goes_to_first_partitions() {
        let items = random_batches(10);
        let split = split(&items, 3).unwrap();
        assert_eq!(split.n_workers(), 3);
        assert_eq!(split.sizes(), vec![4, 3, 3]);
        assert_eq!(split.starts(), &[0, 4, 7]);
        assert_eq!(split.bounds(), vec![0, 4, 7, 10]);
        assert_eq!(split.sizes().iter().sum::<usize>(), 10);
    }

    #[test]
    fn extra_workers_get_empty_partitions() {
        let items = random_batches(2);
        let split = split(&items, 4).unwrap();
        assert_eq!(split.sizes(), vec![1, 1, 0, 0]);
        assert_eq!(split.starts(), &[0, 1, 2, 2]);
        assert_eq!(split.total(), 2);
    }

    #[test]
    fn partitions_are_contiguous_and_ordered() {
        let items: Vec<usize> = (0..17).collect();
        let split = split(&items, 5).unwrap();
        let flat: Vec<usize> = split
            .partitions()
            .iter()
            .flat_map(|p| p.iter().copied())
            .collect();
        assert_eq!(flat, items);
    }

    #[test]
    fn reassemble_restores_order_with_stride() {
        let items: Vec<usize> = (0..5).collect();
        let split = split(&items, 2).unwrap();
        let parts: Vec<Vec<usize>> = split
            .partitions()
            .iter()
            .map(|p| p.iter().flat_map(|&i| [i * 10, i * 10 + 1]).collect())
            .collect();
        let out = split.reassemble(parts, 2).unwrap();
        assert_eq!(out, vec![0, 1, 10, 11, 20, 21, 30, 31, 40, 41]);
    }

    #[test]
    fn reassemble_rejects_short_results() {
        let items: Vec<usize> = (0..4).collect();
        let split = split(&items, 2).unwrap();
        assert!(split.reassemble(vec![vec![0, 1], vec![2]], 1).is_err());
    }

    #[test]
    fn zero_workers_is_invalid() {
        let items = [1, 2, 3];
        assert!(matches!(
            split(&items, 0),
            Err(TheilSenError::InvalidParameter(_))
        ));
    }
}
