use crate::backend::{NeighborBackend, NeighborCounter};

/// Exact neighbor counts from every pairwise distance.
///
/// Quadratic in the number of points, meant for small inputs.
#[derive(Debug, Clone, Copy, Default)]
pub struct PairwiseCounter;

impl NeighborCounter for PairwiseCounter {
    fn backend(&self) -> NeighborBackend {
        NeighborBackend::Pairwise
    }

    fn count_neighbors(&self, points: &[[f64; 3]], radius: f64) -> Vec<usize> {
        let r2 = radius * radius;
        let mut counts = vec![0usize; points.len()];

        for (i, p) in points.iter().enumerate() {
            for (j, q) in points.iter().enumerate().skip(i + 1) {
                let d2 = (p[0] - q[0]).powi(2) + (p[1] - q[1]).powi(2) + (p[2] - q[2]).powi(2);
                if d2 <= r2 {
                    counts[i] += 1;
                    counts[j] += 1;
                }
            }
        }

        counts
    }
}
