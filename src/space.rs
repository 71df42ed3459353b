/*
 * Periodic Space Module
 *
 * The simulation box is a cube of edge length L centered on the origin with
 * periodic boundaries on every face. Every coordinate lives in [-L/2, L/2).
 *
 * Distances follow the minimum-image convention: the displacement between two
 * points is the shortest one among the 27 translations of the second point by
 * {-L, 0, L} along each axis. The squared length is a sum of independent
 * per-axis terms, so minimizing each axis on its own picks exactly the same
 * translation as the full 27-candidate search.
 */

use nannou::prelude::{vec3, Vec3};

use crate::error::FlockError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeriodicSpace {
    edge_length: f32,
}

impl PeriodicSpace {
    pub fn new(edge_length: f32) -> Result<Self, FlockError> {
        if !edge_length.is_finite() || edge_length <= 0.0 {
            return Err(FlockError::InvalidEdgeLength(edge_length));
        }
        Ok(Self { edge_length })
    }

    pub fn edge_length(&self) -> f32 {
        self.edge_length
    }

    pub fn half_edge(&self) -> f32 {
        0.5 * self.edge_length
    }

    // Map a single coordinate into [-L/2, L/2)
    #[inline]
    pub fn wrap_coordinate(&self, x: f32) -> f32 {
        let half = self.half_edge();
        if (-half..half).contains(&x) {
            return x;
        }

        let mut wrapped = (x + half).rem_euclid(self.edge_length) - half;
        // rem_euclid can round up to exactly L for tiny negative remainders
        if wrapped >= half {
            wrapped -= self.edge_length;
        }
        if wrapped < -half {
            wrapped = -half;
        }
        wrapped
    }

    // Map a point into the simulation box
    #[inline]
    pub fn wrap(&self, position: Vec3) -> Vec3 {
        vec3(
            self.wrap_coordinate(position.x),
            self.wrap_coordinate(position.y),
            self.wrap_coordinate(position.z),
        )
    }

    // Shortest per-axis offset among delta, delta + L and delta - L.
    // Ties keep the unshifted value.
    #[inline]
    fn minimum_image_axis(&self, delta: f32) -> f32 {
        let mut best = delta;
        for shifted in [delta + self.edge_length, delta - self.edge_length] {
            if shifted.abs() < best.abs() {
                best = shifted;
            }
        }
        best
    }

    /// Displacement from `a` to `b` under the minimum-image convention.
    #[inline]
    pub fn minimum_image_displacement(&self, a: Vec3, b: Vec3) -> Vec3 {
        let delta = b - a;
        vec3(
            self.minimum_image_axis(delta.x),
            self.minimum_image_axis(delta.y),
            self.minimum_image_axis(delta.z),
        )
    }

    #[inline]
    pub fn distance(&self, a: Vec3, b: Vec3) -> f32 {
        self.minimum_image_displacement(a, b).length()
    }
}
