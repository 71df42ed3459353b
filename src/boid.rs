/*
 * Boid Module
 *
 * This module defines the Boid struct, a self-propelled particle living in
 * the periodic cube. A boid always moves at the same speed: only the
 * direction of its velocity changes from one tick to the next.
 *
 * Two invariants are enforced by the setters:
 * 1. Every position coordinate lies in [-L/2, L/2)
 * 2. The velocity has length equal to the boid's speed
 */

use log::warn;
use nannou::prelude::Vec3;

use crate::noise::NoiseSource;
use crate::space::PeriodicSpace;
use crate::{BOID_SIZE, V0};

#[derive(Debug, Clone, PartialEq)]
pub struct Boid {
    name: String,
    radius: f32,
    speed: f32,
    position: Vec3,
    velocity: Vec3,
}

impl Boid {
    // A boid at the origin heading along +x
    pub fn new(name: impl Into<String>, speed: f32) -> Self {
        Self {
            name: name.into(),
            radius: BOID_SIZE,
            speed,
            position: Vec3::ZERO,
            velocity: Vec3::X * speed,
        }
    }

    // Build a boid at a given place and heading, applying both invariants
    pub fn with_state(
        name: impl Into<String>,
        speed: f32,
        position: Vec3,
        heading: Vec3,
        space: &PeriodicSpace,
    ) -> Self {
        let mut boid = Self::new(name, speed);
        boid.set_position(position, space);
        boid.set_velocity(heading);
        boid
    }

    // Zero-padded display name, "007" for index 7
    pub fn default_name(index: usize) -> String {
        format!("{:03}", index)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    // Set position, wrapped back into the periodic cube
    pub fn set_position(&mut self, position: Vec3, space: &PeriodicSpace) {
        if !position.is_finite() {
            warn!("Ignoring non-finite position {:?} for boid {}", position, self.name);
            return;
        }
        self.position = space.wrap(position);
    }

    // Set velocity direction; the magnitude is always the boid's speed.
    // A zero or non-finite direction keeps the current velocity.
    pub fn set_velocity(&mut self, direction: Vec3) {
        let length = direction.length();
        if !length.is_finite() || length <= f32::EPSILON {
            return;
        }
        self.velocity = direction * (self.speed / length);
    }

    // Change the fixed speed, keeping the heading
    pub fn set_speed(&mut self, speed: f32) {
        if !speed.is_finite() || speed <= 0.0 {
            warn!("Ignoring invalid speed {} for boid {}", speed, self.name);
            return;
        }
        self.speed = speed;
        let heading = self.velocity;
        self.set_velocity(heading);
    }

    // Move one step along the current velocity
    pub fn advance(&mut self, space: &PeriodicSpace) {
        self.set_position(self.position + self.velocity, space);
    }

    // Random position in the cube of edge `edge_length` (clamped to the
    // domain) and random heading
    pub fn randomize(&mut self, edge_length: f32, space: &PeriodicSpace, noise: &mut NoiseSource) {
        let edge = if edge_length.abs() < space.edge_length() {
            edge_length
        } else {
            space.edge_length()
        };
        self.set_position(noise.sample_in_cube(edge), space);
        self.set_velocity(noise.sample_in_ball(1.0));
    }
}

impl Default for Boid {
    fn default() -> Self {
        Self::new(Boid::default_name(0), V0)
    }
}
