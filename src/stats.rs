/*
 * Statistics Module
 *
 * Per-tick figures about the flock, meant for logging and on-screen
 * overlays:
 * - Frame counter
 * - Wall time spent in the last tick
 * - Number of neighbor links in each interaction regime
 * - Polarization (how aligned the headings are)
 */

use std::time::Duration;

use nannou::prelude::Vec3;

use crate::boid::Boid;
use crate::flock::Neighbor;
use crate::interaction::Regime;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegimeCounts {
    pub hard_core: usize,
    pub soft_repulsion: usize,
    pub soft_attraction: usize,
    pub constant_force: usize,
    pub out_of_range: usize,
}

impl RegimeCounts {
    pub fn tally<'a>(sets: impl IntoIterator<Item = &'a [Neighbor]>) -> Self {
        let mut counts = Self::default();
        for set in sets {
            for neighbor in set {
                counts.add(neighbor.regime);
            }
        }
        counts
    }

    pub fn add(&mut self, regime: Regime) {
        match regime {
            Regime::HardCore => self.hard_core += 1,
            Regime::SoftRepulsion => self.soft_repulsion += 1,
            Regime::SoftAttraction => self.soft_attraction += 1,
            Regime::ConstantForce => self.constant_force += 1,
            Regime::OutOfRange => self.out_of_range += 1,
        }
    }

    pub fn get(&self, regime: Regime) -> usize {
        match regime {
            Regime::HardCore => self.hard_core,
            Regime::SoftRepulsion => self.soft_repulsion,
            Regime::SoftAttraction => self.soft_attraction,
            Regime::ConstantForce => self.constant_force,
            Regime::OutOfRange => self.out_of_range,
        }
    }

    // Links that actually exert a force
    pub fn interacting(&self) -> usize {
        self.hard_core + self.soft_repulsion + self.soft_attraction + self.constant_force
    }

    pub fn total(&self) -> usize {
        self.interacting() + self.out_of_range
    }
}

/// Length of the mean unit heading: 1 when every boid flies the same way,
/// close to 0 for random headings.
pub fn polarization(boids: &[Boid]) -> f32 {
    if boids.is_empty() {
        return 0.0;
    }

    let mut sum = Vec3::ZERO;
    let mut total_speed = 0.0;
    for boid in boids {
        sum += boid.velocity();
        total_speed += boid.velocity().length();
    }

    if total_speed <= 0.0 {
        0.0
    } else {
        sum.length() / total_speed
    }
}

#[derive(Debug, Clone, Default)]
pub struct FlockStats {
    pub frame: u64,
    pub tick_time: Duration,
    pub regime_counts: RegimeCounts,
    pub polarization: f32,
}
