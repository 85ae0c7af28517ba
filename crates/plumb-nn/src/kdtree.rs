use kiddo::immutable::float::kdtree::ImmutableKdTree;
use rayon::prelude::*;

use crate::backend::{NeighborBackend, NeighborCounter};

/// Exact neighbor counts from range queries on a balanced kd-tree.
///
/// The tree is built once per call and the per-point queries run on the rayon pool.
#[derive(Debug, Clone, Copy, Default)]
pub struct KdTreeCounter;

impl NeighborCounter for KdTreeCounter {
    fn backend(&self) -> NeighborBackend {
        NeighborBackend::KdTree
    }

    fn count_neighbors(&self, points: &[[f64; 3]], radius: f64) -> Vec<usize> {
        if points.is_empty() {
            return Vec::new();
        }

        let kdtree: ImmutableKdTree<f64, u32, 3, 32> = ImmutableKdTree::new_from_slice(points);
        let r2 = radius * radius;

        // the query point itself is always in range
        points
            .par_iter()
            .map(|p| {
                kdtree
                    .within_unsorted::<kiddo::SquaredEuclidean>(p, r2)
                    .len()
                    .saturating_sub(1)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pairwise::PairwiseCounter;
    use rand::{Rng, SeedableRng};

    #[test]
    fn test_kdtree_matches_pairwise() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(7);
        let points: Vec<[f64; 3]> = (0..2_000)
            .map(|_| {
                [
                    rng.random_range(0.0..10.0),
                    rng.random_range(0.0..10.0),
                    rng.random_range(0.0..10.0),
                ]
            })
            .collect();

        let expected = PairwiseCounter.count_neighbors(&points, 0.8);
        let counts = KdTreeCounter.count_neighbors(&points, 0.8);
        assert_eq!(counts, expected);
    }

    #[test]
    fn test_kdtree_isolated_point() {
        let points = vec![[0.0, 0.0, 0.0], [0.1, 0.0, 0.0], [50.0, 50.0, 50.0]];
        assert_eq!(KdTreeCounter.count_neighbors(&points, 0.5), vec![1, 1, 0]);
        assert!(KdTreeCounter.count_neighbors(&[], 0.5).is_empty());
    }
}
