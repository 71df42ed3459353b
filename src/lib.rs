/*
 * Flocking Simulation - Module Definitions
 *
 * Self-propelled particles in a periodic cube, following the flocking model
 * of Bialek et al. (2012). Each boid aligns with and is held at a preferred
 * distance from its k nearest neighbors, under angular noise.
 *
 * This crate is the simulation core only. It exposes boid positions and
 * velocities plus neighbor links with their interaction colors; drawing them
 * is left to the caller.
 */

// Re-export key components for easier access
pub use boid::Boid;
pub use error::FlockError;
pub use flock::{Flock, InteractionLine, Neighbor, RunState};
pub use interaction::{Interaction, InteractionClassifier, InteractionRadii, Regime};
pub use noise::NoiseSource;
pub use pairs::PairState;
pub use params::SimulationParams;
pub use space::PeriodicSpace;
pub use stats::{FlockStats, RegimeCounts};

// Define modules
pub mod boid;
pub mod error;
pub mod flock;
pub mod interaction;
pub mod neighbors;
pub mod noise;
pub mod pairs;
pub mod params;
pub mod physics;
pub mod space;
pub mod stats;

// Constants
pub const BOID_SIZE: f32 = 0.05; // Display radius
pub const V0: f32 = 0.05; // Distance travelled per tick
