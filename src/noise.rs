/*
 * Noise Module
 *
 * Owns the simulation's random source. The flock draws one uniform unit
 * vector per boid and per tick from here, and uses the cube and ball
 * samplers when positions and headings are (re)randomized.
 *
 * Seeding with a fixed value makes a whole run reproducible.
 */

use std::f32::consts::TAU;

use nannou::prelude::{vec3, Vec3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub struct NoiseSource {
    rng: StdRng,
}

impl NoiseSource {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn new(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::from_seed(seed),
            None => Self::from_entropy(),
        }
    }

    /// Uniform point on the unit sphere: z uniform in [-1, 1] and azimuth
    /// uniform in [0, 2π).
    pub fn sample_unit_sphere(&mut self) -> Vec3 {
        let z: f32 = self.rng.gen_range(-1.0..=1.0);
        let theta: f32 = self.rng.gen_range(0.0..TAU);
        let rho = (1.0 - z * z).max(0.0).sqrt();
        vec3(rho * theta.cos(), rho * theta.sin(), z)
    }

    // Uniform point in the origin-centered cube of the given edge length
    pub fn sample_in_cube(&mut self, edge_length: f32) -> Vec3 {
        let half = 0.5 * edge_length.abs();
        vec3(
            half * self.rng.gen_range(-1.0..=1.0),
            half * self.rng.gen_range(-1.0..=1.0),
            half * self.rng.gen_range(-1.0..=1.0),
        )
    }

    // Uniform point in the origin-centered ball, by rejection from the cube
    pub fn sample_in_ball(&mut self, radius: f32) -> Vec3 {
        let radius = radius.abs();
        loop {
            let candidate = vec3(
                radius * self.rng.gen_range(-1.0..=1.0),
                radius * self.rng.gen_range(-1.0..=1.0),
                radius * self.rng.gen_range(-1.0..=1.0),
            );
            if candidate.length_squared() <= radius * radius {
                return candidate;
            }
        }
    }

    pub fn fill_unit_sphere(&mut self, out: &mut [Vec3]) {
        for sample in out.iter_mut() {
            *sample = self.sample_unit_sphere();
        }
    }
}
