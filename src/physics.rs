/*
 * Physics Module
 *
 * The steps of one simulation tick, kept as free functions over plain
 * slices so the flock can run them sequentially or across rayon workers:
 * 1. Advance every boid along its velocity (periodic wrap)
 * 2. Snapshot positions and velocities
 * 3. Select each boid's k nearest neighbors and accumulate alignment and
 *    cohesion from them
 * 4. Combine alignment, cohesion and noise into the new heading
 *
 * Step 3 only reads the pair table and the velocity snapshot and only writes
 * the boid's own slots, so no boid ever sees a velocity updated during the
 * same tick.
 */

use log::warn;
use nannou::prelude::Vec3;
use rayon::prelude::*;

use crate::boid::Boid;
use crate::flock::Neighbor;
use crate::interaction::InteractionClassifier;
use crate::neighbors::select_neighbors_into;
use crate::pairs::PairState;
use crate::space::PeriodicSpace;

// Unweighted sums gathered from a boid's neighbors
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Forces {
    pub alignment: Vec3,
    pub cohesion: Vec3,
}

// Weights of the velocity update. The noise weight already includes the
// neighbor count factor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Weights {
    pub alignment: f32,
    pub cohesion: f32,
    pub noise: f32,
}

impl Weights {
    pub fn new(alignment: f32, cohesion: f32, noise: f32, neighbor_count: usize) -> Self {
        Self {
            alignment,
            cohesion,
            noise: noise * neighbor_count as f32,
        }
    }

    #[inline]
    pub fn combine(&self, forces: &Forces, noise: Vec3) -> Vec3 {
        forces.alignment * self.alignment + forces.cohesion * self.cohesion + noise * self.noise
    }
}

pub fn advance_positions(boids: &mut [Boid], space: &PeriodicSpace) {
    for boid in boids.iter_mut() {
        boid.advance(space);
    }
}

pub fn snapshot(boids: &[Boid], positions: &mut [Vec3], velocities: &mut [Vec3]) {
    for ((boid, position), velocity) in boids.iter().zip(positions.iter_mut()).zip(velocities.iter_mut()) {
        *position = boid.position();
        *velocity = boid.velocity();
    }
}

/// Select the `k` nearest neighbors of `observer`, record them with their
/// regime in `neighbors`, and return the summed alignment and cohesion.
pub fn accumulate_forces(
    observer: usize,
    pairs: &PairState,
    velocities: &[Vec3],
    classifier: &InteractionClassifier,
    k: usize,
    scratch: &mut Vec<usize>,
    neighbors: &mut Vec<Neighbor>,
) -> Forces {
    neighbors.clear();
    let mut forces = Forces::default();

    // k is validated against the population when the flock is built
    if let Err(err) = select_neighbors_into(pairs.distance_row(observer), observer, k, scratch) {
        warn!("No neighbors for boid {}: {}", observer, err);
        return forces;
    }

    for &j in scratch.iter() {
        let interaction = classifier.classify(pairs.displacement(observer, j), pairs.distance(observer, j));
        if interaction.regime.interacts() {
            forces.alignment += velocities[j];
            forces.cohesion += interaction.cohesion;
        }
        neighbors.push(Neighbor {
            index: j,
            regime: interaction.regime,
        });
    }

    forces
}

// Accumulate forces for every boid
pub fn compute_forces(
    pairs: &PairState,
    velocities: &[Vec3],
    classifier: &InteractionClassifier,
    k: usize,
    neighbor_sets: &mut [Vec<Neighbor>],
    forces: &mut [Forces],
    parallel: bool,
) {
    let n = pairs.len();

    if parallel {
        neighbor_sets
            .par_iter_mut()
            .zip(forces.par_iter_mut())
            .enumerate()
            .for_each_init(
                || Vec::with_capacity(n),
                |scratch, (i, (neighbors, out))| {
                    *out = accumulate_forces(i, pairs, velocities, classifier, k, scratch, neighbors);
                },
            );
    } else {
        let mut scratch = Vec::with_capacity(n);
        for (i, (neighbors, out)) in neighbor_sets.iter_mut().zip(forces.iter_mut()).enumerate() {
            *out = accumulate_forces(i, pairs, velocities, classifier, k, &mut scratch, neighbors);
        }
    }
}

// Write the new headings; the setter restores the fixed speed
pub fn apply_velocities(boids: &mut [Boid], forces: &[Forces], noise: &[Vec3], weights: &Weights) {
    for ((boid, forces), noise) in boids.iter_mut().zip(forces).zip(noise) {
        boid.set_velocity(weights.combine(forces, *noise));
    }
}
