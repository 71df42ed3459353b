/*
 * Error Module
 *
 * Configuration errors reported when a flock is set up. Once a flock exists
 * every tick is total, so nothing in the per-frame path returns these.
 */

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum FlockError {
    /// Domain edge length is zero, negative or not finite.
    InvalidEdgeLength(f32),
    /// More neighbors requested than there are candidates to choose from.
    NeighborCountOutOfRange { requested: usize, available: usize },
    /// Interaction radii must be finite, non-negative and strictly ascending.
    InvalidRadii {
        hard_core: f32,
        equilibrium: f32,
        attraction: f32,
        range: f32,
    },
    /// A flock needs at least one boid.
    EmptyFlock,
    /// A scalar parameter is outside the values the model accepts.
    InvalidParameter { name: &'static str, value: f32 },
}

impl fmt::Display for FlockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlockError::InvalidEdgeLength(edge) => {
                write!(f, "Edge length must be a positive finite number, got {}", edge)
            }
            FlockError::NeighborCountOutOfRange { requested, available } => write!(
                f,
                "Cannot select {} neighbors when only {} candidates exist",
                requested, available
            ),
            FlockError::InvalidRadii {
                hard_core,
                equilibrium,
                attraction,
                range,
            } => write!(
                f,
                "Interaction radii must satisfy 0 <= R_B < R_E < R_A < R_0, got {} / {} / {} / {}",
                hard_core, equilibrium, attraction, range
            ),
            FlockError::EmptyFlock => write!(f, "A flock needs at least one boid"),
            FlockError::InvalidParameter { name, value } => {
                write!(f, "Invalid value {} for parameter `{}`", value, name)
            }
        }
    }
}

impl std::error::Error for FlockError {}
