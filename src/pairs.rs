/*
 * Pair State Module
 *
 * Dense N x N table of minimum-image displacements and distances for the
 * current tick. Both tables are single contiguous buffers indexed as
 * i * N + j, allocated once for a fixed population and overwritten in place
 * every tick.
 *
 * displacement(i, j) points from boid i toward boid j and always equals
 * -displacement(j, i). The diagonal holds zeros; self-pairs are kept out of
 * neighbor selection by index, not by a sentinel distance.
 */

use nannou::prelude::Vec3;
use rayon::prelude::*;

use crate::space::PeriodicSpace;

pub struct PairState {
    len: usize,
    displacements: Vec<Vec3>,
    distances: Vec<f32>,
}

impl PairState {
    pub fn new(len: usize) -> Self {
        Self {
            len,
            displacements: vec![Vec3::ZERO; len * len],
            distances: vec![0.0; len * len],
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn displacement(&self, i: usize, j: usize) -> Vec3 {
        self.displacements[i * self.len + j]
    }

    #[inline]
    pub fn distance(&self, i: usize, j: usize) -> f32 {
        self.distances[i * self.len + j]
    }

    // Distances from boid i to every boid, itself included
    #[inline]
    pub fn distance_row(&self, i: usize) -> &[f32] {
        &self.distances[i * self.len..(i + 1) * self.len]
    }

    pub fn displacement_row(&self, i: usize) -> &[Vec3] {
        &self.displacements[i * self.len..(i + 1) * self.len]
    }

    // Recompute every pair from the given positions
    pub fn recompute(&mut self, positions: &[Vec3], space: &PeriodicSpace, parallel: bool) {
        assert_eq!(
            positions.len(),
            self.len,
            "pair table was sized for a different population"
        );

        if parallel {
            self.recompute_parallel(positions, space);
        } else {
            self.recompute_sequential(positions, space);
        }
    }

    // Upper triangle, mirrored into the lower one
    fn recompute_sequential(&mut self, positions: &[Vec3], space: &PeriodicSpace) {
        let n = self.len;
        for i in 0..n {
            self.displacements[i * n + i] = Vec3::ZERO;
            self.distances[i * n + i] = 0.0;

            for j in (i + 1)..n {
                let r = space.minimum_image_displacement(positions[i], positions[j]);
                let d = r.length();
                self.displacements[i * n + j] = r;
                self.displacements[j * n + i] = -r;
                self.distances[i * n + j] = d;
                self.distances[j * n + i] = d;
            }
        }
    }

    // One row per task. The minimum image of b - a is exactly the negation
    // of the minimum image of a - b, so rows computed independently still
    // mirror each other bit for bit.
    fn recompute_parallel(&mut self, positions: &[Vec3], space: &PeriodicSpace) {
        let n = self.len;
        if n == 0 {
            return;
        }

        self.displacements
            .par_chunks_mut(n)
            .zip(self.distances.par_chunks_mut(n))
            .enumerate()
            .for_each(|(i, (displacement_row, distance_row))| {
                let origin = positions[i];
                for (j, (r_out, d_out)) in displacement_row
                    .iter_mut()
                    .zip(distance_row.iter_mut())
                    .enumerate()
                {
                    if i == j {
                        *r_out = Vec3::ZERO;
                        *d_out = 0.0;
                        continue;
                    }
                    let r = space.minimum_image_displacement(origin, positions[j]);
                    *r_out = r;
                    *d_out = r.length();
                }
            });
    }
}
