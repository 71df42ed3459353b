/*
 * Simulation Parameters Module
 *
 * This module defines the SimulationParams struct holding every parameter of
 * the flocking model. Defaults follow Bialek et al. (2012). Neighbor count and
 * noise can be changed while the flock runs; the radii and weights are fixed
 * once the flock is built.
 *
 * Parameters deserialize from YAML with every field optional:
 *
 * ```yaml
 * num_boids: 256
 * neighbor_count: 6
 * noise: 0.5
 * radii:
 *   hard_core: 0.2
 *   equilibrium: 0.5
 *   attraction: 0.8
 *   range: 1.0
 * seed: 42
 * ```
 */

use serde::Deserialize;

use crate::error::FlockError;
use crate::interaction::{InteractionRadii, HARD_CORE_MAGNITUDE};
use crate::V0;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SimulationParams {
    pub num_boids: usize,
    pub edge_length: f32, // Side of the periodic cube
    // Side of the cube boids are scattered in on reset, derived from
    // num_boids when absent
    pub randomize_edge_length: Option<f32>,
    pub neighbor_count: usize,
    pub max_neighbor_count: usize, // Cap for interactive increments
    pub noise: f32,
    pub max_noise: f32,
    pub noise_step: f32,
    pub alignment_weight: f32,
    pub cohesion_weight: f32,
    pub radii: InteractionRadii,
    pub hard_core_magnitude: f32,
    pub speed: f32,
    pub start_running: bool,
    // Performance settings
    pub enable_parallel: bool,
    // Fixed seed for reproducible runs, entropy when absent
    pub seed: Option<u64>,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            num_boids: 512,
            edge_length: 10.0,
            randomize_edge_length: None,
            neighbor_count: 8,
            max_neighbor_count: 32,
            noise: 1.0,
            max_noise: 2.0,
            noise_step: 0.1,
            alignment_weight: 35.0,
            cohesion_weight: 5.0,
            radii: InteractionRadii::default(),
            hard_core_magnitude: HARD_CORE_MAGNITUDE,
            speed: V0,
            start_running: true,
            enable_parallel: true,
            seed: None,
        }
    }
}

fn check_non_negative(name: &'static str, value: f32) -> Result<(), FlockError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(FlockError::InvalidParameter { name, value })
    }
}

impl SimulationParams {
    pub fn from_yaml_str(source: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(source)
    }

    // Validate everything that cannot be fixed by clamping
    pub fn validate(&self) -> Result<(), FlockError> {
        if self.num_boids == 0 {
            return Err(FlockError::EmptyFlock);
        }
        if !self.edge_length.is_finite() || self.edge_length <= 0.0 {
            return Err(FlockError::InvalidEdgeLength(self.edge_length));
        }
        self.radii.validate()?;

        // A boid cannot have more neighbors than there are other boids
        let available = self.num_boids - 1;
        if self.neighbor_count > available {
            return Err(FlockError::NeighborCountOutOfRange {
                requested: self.neighbor_count,
                available,
            });
        }

        if !self.speed.is_finite() || self.speed <= 0.0 {
            return Err(FlockError::InvalidParameter {
                name: "speed",
                value: self.speed,
            });
        }
        check_non_negative("noise", self.noise)?;
        check_non_negative("max_noise", self.max_noise)?;
        check_non_negative("noise_step", self.noise_step)?;
        check_non_negative("alignment_weight", self.alignment_weight)?;
        check_non_negative("cohesion_weight", self.cohesion_weight)?;
        check_non_negative("hard_core_magnitude", self.hard_core_magnitude)?;
        if let Some(edge) = self.randomize_edge_length {
            if !edge.is_finite() {
                return Err(FlockError::InvalidParameter {
                    name: "randomize_edge_length",
                    value: edge,
                });
            }
        }
        Ok(())
    }

    // Roughly one boid per preferred-distance cell unless set explicitly
    pub fn randomize_edge(&self) -> f32 {
        self.randomize_edge_length
            .unwrap_or_else(|| self.radii.equilibrium * (self.num_boids as f32).cbrt())
    }

    // Neighbor counts reachable through the runtime controls
    pub fn neighbor_count_range(&self) -> std::ops::RangeInclusive<usize> {
        0..=self.num_boids.saturating_sub(2)
    }

    // Noise magnitudes reachable through the runtime controls
    pub fn noise_range(&self) -> std::ops::RangeInclusive<f32> {
        0.0..=self.max_noise
    }
}
