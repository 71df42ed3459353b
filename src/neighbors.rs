/*
 * Neighbor Selection Module
 *
 * Topological neighbors: each boid interacts with its k nearest others,
 * whatever their absolute distance. Selection is a partial sort. Candidates
 * are ordered by (distance, index) which is a total order, so the result is
 * the same every time for the same input, and ties go to the lower index.
 */

use std::cmp::Ordering;

use crate::error::FlockError;

#[inline]
fn by_distance_then_index(distances: &[f32], a: usize, b: usize) -> Ordering {
    distances[a]
        .total_cmp(&distances[b])
        .then_with(|| a.cmp(&b))
}

// Keep the k smallest candidates in `indices`, ordered nearest first
fn partial_sort(distances: &[f32], indices: &mut Vec<usize>, k: usize) {
    if k == 0 {
        indices.clear();
        return;
    }

    if k < indices.len() {
        indices.select_nth_unstable_by(k - 1, |&a, &b| by_distance_then_index(distances, a, b));
        indices.truncate(k);
    }
    indices.sort_unstable_by(|&a, &b| by_distance_then_index(distances, a, b));
}

/// Indices of the `k` smallest entries of `distances`, nearest first.
pub fn select_smallest(distances: &[f32], k: usize) -> Result<Vec<usize>, FlockError> {
    if k > distances.len() {
        return Err(FlockError::NeighborCountOutOfRange {
            requested: k,
            available: distances.len(),
        });
    }

    let mut indices: Vec<usize> = (0..distances.len()).collect();
    partial_sort(distances, &mut indices, k);
    Ok(indices)
}

/// Indices of the `k` entries of `row` nearest to `observer`, never including
/// `observer` itself.
pub fn select_neighbors(row: &[f32], observer: usize, k: usize) -> Result<Vec<usize>, FlockError> {
    let mut scratch = Vec::with_capacity(row.len());
    select_neighbors_into(row, observer, k, &mut scratch)?;
    Ok(scratch)
}

// Same as select_neighbors, reusing the caller's buffer for the candidates.
// On success the buffer holds exactly the selected indices.
pub fn select_neighbors_into(
    row: &[f32],
    observer: usize,
    k: usize,
    scratch: &mut Vec<usize>,
) -> Result<(), FlockError> {
    let available = row.len().saturating_sub(usize::from(observer < row.len()));
    if k > available {
        return Err(FlockError::NeighborCountOutOfRange {
            requested: k,
            available,
        });
    }

    scratch.clear();
    scratch.extend((0..row.len()).filter(|&j| j != observer));
    partial_sort(row, scratch, k);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn assert_partition(distances: &[f32], selected: &[usize], excluded: Option<usize>) {
        for (j, &d) in distances.iter().enumerate() {
            if selected.contains(&j) || Some(j) == excluded {
                continue;
            }
            for &s in selected {
                assert!(distances[s] <= d, "selected {} ({}) > unselected {} ({})", s, distances[s], j, d);
            }
        }
    }

    #[test]
    fn picks_the_k_smallest_in_order() {
        let distances = [3.0, 0.5, 2.0, 0.1, 9.0, 1.0];
        let selected = select_smallest(&distances, 3).unwrap();
        assert_eq!(selected, vec![3, 1, 5]);
    }

    #[test]
    fn zero_and_full_selection() {
        let distances = [3.0, 0.5, 2.0];
        assert!(select_smallest(&distances, 0).unwrap().is_empty());
        assert_eq!(select_smallest(&distances, 3).unwrap(), vec![1, 2, 0]);
    }

    #[test]
    fn too_many_requested_is_an_error() {
        let distances = [3.0, 0.5, 2.0];
        assert_eq!(
            select_smallest(&distances, 4),
            Err(FlockError::NeighborCountOutOfRange {
                requested: 4,
                available: 3
            })
        );
        // The observer never counts as a candidate
        assert!(select_neighbors(&distances, 0, 3).is_err());
        assert!(select_neighbors(&distances, 0, 2).is_ok());
    }

    #[test]
    fn observer_is_never_selected() {
        // Observer distance to itself is zero, smaller than everything else
        let row = [0.7, 0.0, 0.2, 0.4];
        let selected = select_neighbors(&row, 1, 3).unwrap();
        assert_eq!(selected, vec![2, 3, 0]);
    }

    #[test]
    fn ties_resolve_by_index() {
        let distances = [1.0, 0.5, 1.0, 1.0, 0.5];
        assert_eq!(select_smallest(&distances, 3).unwrap(), vec![1, 4, 0]);
        assert_eq!(
            select_smallest(&distances, 3).unwrap(),
            select_smallest(&distances, 3).unwrap()
        );
    }

    #[test]
    fn random_rows_satisfy_the_partition_property() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut scratch = Vec::new();

        for _ in 0..200 {
            let n = rng.gen_range(2..40);
            // Coarse values so ties are common
            let row: Vec<f32> = (0..n).map(|_| rng.gen_range(0..8) as f32 * 0.5).collect();
            let observer = rng.gen_range(0..n);
            let k = rng.gen_range(0..n);

            select_neighbors_into(&row, observer, k, &mut scratch).unwrap();
            assert_eq!(scratch.len(), k);
            assert!(!scratch.contains(&observer));
            assert_partition(&row, &scratch, Some(observer));

            let plain = select_smallest(&row, k).unwrap();
            assert_eq!(plain.len(), k);
            assert_partition(&row, &plain, None);
        }
    }
}
