/*
 * Flock Module
 *
 * This module defines the Flock, the owner of the whole simulation state:
 * the boids, the periodic space, the pair table, the neighbor sets and the
 * random source. One call to `tick` advances the model by one frame.
 *
 * A flock is either Running or Idle. While idle, positions and velocities
 * stay frozen but the pair table and neighbor sets are still refreshed every
 * tick, so interaction lines remain available to a renderer.
 *
 * Renderers read boids through `boids()` and neighbor links through
 * `neighbors()` / `interaction_lines()`. The lines are derived on demand and
 * are not part of the simulation state.
 */

use std::time::Instant;

use log::{debug, info, warn};
use nannou::prelude::{Rgb, Vec3};

use crate::boid::Boid;
use crate::error::FlockError;
use crate::interaction::{InteractionClassifier, Regime};
use crate::noise::NoiseSource;
use crate::pairs::PairState;
use crate::params::SimulationParams;
use crate::physics::{self, Forces, Weights};
use crate::space::PeriodicSpace;
use crate::stats::{polarization, FlockStats, RegimeCounts};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
}

// One of a boid's k nearest neighbors for the current tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Neighbor {
    pub index: usize,
    pub regime: Regime,
}

// Line from a boid to one of its neighbors, resolved through the periodic
// boundary. Out-of-range neighbors give a zero-length line.
#[derive(Debug, Clone, Copy)]
pub struct InteractionLine {
    pub observer: usize,
    pub neighbor: usize,
    pub start: Vec3,
    pub end: Vec3,
    pub regime: Regime,
    pub color: Rgb<u8>,
}

pub struct Flock {
    boids: Vec<Boid>,
    params: SimulationParams,
    space: PeriodicSpace,
    classifier: InteractionClassifier,
    pairs: PairState,
    neighbor_sets: Vec<Vec<Neighbor>>,
    noise: NoiseSource,
    state: RunState,
    stats: FlockStats,
    // Per-tick buffers, sized once
    positions: Vec<Vec3>,
    velocities: Vec<Vec3>,
    forces: Vec<Forces>,
    noise_samples: Vec<Vec3>,
}

impl Flock {
    // Build a flock of `params.num_boids` randomly placed boids
    pub fn new(params: SimulationParams) -> Result<Self, FlockError> {
        params.validate()?;
        let space = PeriodicSpace::new(params.edge_length)?;
        let mut noise = NoiseSource::new(params.seed);

        let randomize_edge = params.randomize_edge();
        let boids = (0..params.num_boids)
            .map(|i| {
                let mut boid = Boid::new(Boid::default_name(i), params.speed);
                boid.randomize(randomize_edge, &space, &mut noise);
                boid
            })
            .collect();

        info!(
            "Created flock of {} boids in a cube of edge {} (scattered within {:.2})",
            params.num_boids, params.edge_length, randomize_edge
        );
        Self::assemble(params, space, noise, boids)
    }

    // Build a flock from boids placed by the caller. The population size in
    // `params` is replaced by the number of boids given, and every boid moves
    // at `params.speed`.
    pub fn from_boids(mut params: SimulationParams, boids: Vec<Boid>) -> Result<Self, FlockError> {
        params.num_boids = boids.len();
        params.validate()?;
        let space = PeriodicSpace::new(params.edge_length)?;
        let noise = NoiseSource::new(params.seed);

        let mut boids = boids;
        let mut respeeded = 0;
        for boid in &mut boids {
            let position = boid.position();
            boid.set_position(position, &space);
            if boid.speed() != params.speed {
                boid.set_speed(params.speed);
                respeeded += 1;
            }
        }
        if respeeded > 0 {
            warn!("Reset the speed of {} boids to {}", respeeded, params.speed);
        }

        Self::assemble(params, space, noise, boids)
    }

    fn assemble(
        params: SimulationParams,
        space: PeriodicSpace,
        noise: NoiseSource,
        boids: Vec<Boid>,
    ) -> Result<Self, FlockError> {
        let classifier = InteractionClassifier::new(params.radii, params.hard_core_magnitude)?;
        let n = boids.len();
        let state = if params.start_running {
            RunState::Running
        } else {
            RunState::Idle
        };

        let mut flock = Self {
            boids,
            params,
            space,
            classifier,
            pairs: PairState::new(n),
            neighbor_sets: vec![Vec::new(); n],
            noise,
            state,
            stats: FlockStats::default(),
            positions: vec![Vec3::ZERO; n],
            velocities: vec![Vec3::ZERO; n],
            forces: vec![Forces::default(); n],
            noise_samples: vec![Vec3::ZERO; n],
        };
        flock.refresh_neighbors();
        Ok(flock)
    }

    /// Advance the simulation by one frame.
    pub fn tick(&mut self) {
        let started = Instant::now();
        let running = self.is_running();

        if running {
            physics::advance_positions(&mut self.boids, &self.space);
        }

        let k = self.params.neighbor_count;
        if k > 0 {
            self.update_neighbors();

            if running {
                self.noise.fill_unit_sphere(&mut self.noise_samples);
                let weights = Weights::new(
                    self.params.alignment_weight,
                    self.params.cohesion_weight,
                    self.params.noise,
                    k,
                );
                physics::apply_velocities(&mut self.boids, &self.forces, &self.noise_samples, &weights);
            }
        } else {
            self.clear_neighbors();
        }

        self.stats.frame += 1;
        self.stats.tick_time = started.elapsed();
        self.stats.regime_counts = RegimeCounts::tally(self.neighbor_sets.iter().map(Vec::as_slice));
        self.stats.polarization = polarization(&self.boids);
    }

    // Pair table and neighbor sets from the current positions, without
    // touching any velocity
    fn refresh_neighbors(&mut self) {
        if self.params.neighbor_count > 0 {
            self.update_neighbors();
        } else {
            self.clear_neighbors();
        }
        self.stats.regime_counts = RegimeCounts::tally(self.neighbor_sets.iter().map(Vec::as_slice));
        self.stats.polarization = polarization(&self.boids);
    }

    fn update_neighbors(&mut self) {
        let parallel = self.params.enable_parallel;
        physics::snapshot(&self.boids, &mut self.positions, &mut self.velocities);
        self.pairs.recompute(&self.positions, &self.space, parallel);
        physics::compute_forces(
            &self.pairs,
            &self.velocities,
            &self.classifier,
            self.params.neighbor_count,
            &mut self.neighbor_sets,
            &mut self.forces,
            parallel,
        );
    }

    fn clear_neighbors(&mut self) {
        for set in &mut self.neighbor_sets {
            set.clear();
        }
        for forces in &mut self.forces {
            *forces = Forces::default();
        }
    }

    // Scatter every boid again within a cube of the given edge, clamped to
    // the domain
    pub fn randomize(&mut self, edge_length: f32) {
        for boid in &mut self.boids {
            boid.randomize(edge_length, &self.space, &mut self.noise);
        }
        info!("Randomized {} boids within edge {}", self.boids.len(), edge_length);
        self.refresh_neighbors();
    }

    // Scatter using the configured randomization edge
    pub fn reset(&mut self) {
        let edge = self.params.randomize_edge();
        self.randomize(edge);
    }

    pub fn is_running(&self) -> bool {
        self.state == RunState::Running
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn set_running(&mut self, running: bool) {
        self.state = if running {
            RunState::Running
        } else {
            RunState::Idle
        };
        debug!("Flock is now {:?}", self.state);
    }

    pub fn toggle_running(&mut self) {
        let running = !self.is_running();
        self.set_running(running);
    }

    pub fn neighbor_count(&self) -> usize {
        self.params.neighbor_count
    }

    /// Set the number of neighbors each boid interacts with, clamped to
    /// `[0, N-2]`. Returns the value actually applied.
    pub fn set_neighbor_count(&mut self, requested: usize) -> usize {
        // A count accepted at setup may sit above the runtime range
        if requested == self.params.neighbor_count {
            return requested;
        }
        let applied = requested.min(*self.params.neighbor_count_range().end());
        if applied != requested {
            warn!("Neighbor count {} clamped to {}", requested, applied);
        }
        if applied != self.params.neighbor_count {
            debug!("Neighbor count {} -> {}", self.params.neighbor_count, applied);
            self.params.neighbor_count = applied;
            self.refresh_neighbors();
        }
        applied
    }

    // One more neighbor, up to the interactive cap
    pub fn increase_neighbor_count(&mut self) -> usize {
        let cap = (*self.params.neighbor_count_range().end()).min(self.params.max_neighbor_count);
        if self.params.neighbor_count >= cap {
            return self.params.neighbor_count;
        }
        self.set_neighbor_count(self.params.neighbor_count + 1)
    }

    pub fn decrease_neighbor_count(&mut self) -> usize {
        let target = self.params.neighbor_count.saturating_sub(1);
        self.set_neighbor_count(target)
    }

    pub fn noise(&self) -> f32 {
        self.params.noise
    }

    /// Set the noise magnitude, clamped to `[0, max_noise]`. Returns the
    /// value actually applied.
    pub fn set_noise(&mut self, requested: f32) -> f32 {
        let applied = if requested.is_nan() {
            warn!("Ignoring NaN noise magnitude");
            self.params.noise
        } else {
            let range = self.params.noise_range();
            requested.clamp(*range.start(), *range.end())
        };
        if applied != requested && !requested.is_nan() {
            warn!("Noise {} clamped to {}", requested, applied);
        }
        debug!("Noise {} -> {}", self.params.noise, applied);
        self.params.noise = applied;
        applied
    }

    // One noise step up, as long as a full step still fits under the cap
    pub fn increase_noise(&mut self) -> f32 {
        let step = self.params.noise_step;
        if self.params.noise < self.params.max_noise - 0.5 * step {
            let target = self.params.noise + step;
            return self.set_noise(target);
        }
        self.params.noise
    }

    // One noise step down, snapping to zero near the bottom
    pub fn decrease_noise(&mut self) -> f32 {
        let step = self.params.noise_step;
        let mut target = self.params.noise;
        if target >= 0.5 * step {
            target -= step;
        }
        if target < 0.5 * step {
            target = 0.0;
        }
        self.set_noise(target)
    }

    pub fn boids(&self) -> &[Boid] {
        &self.boids
    }

    pub fn boid(&self, index: usize) -> Option<&Boid> {
        self.boids.get(index)
    }

    pub fn len(&self) -> usize {
        self.boids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boids.is_empty()
    }

    pub fn params(&self) -> &SimulationParams {
        &self.params
    }

    pub fn space(&self) -> &PeriodicSpace {
        &self.space
    }

    pub fn classifier(&self) -> &InteractionClassifier {
        &self.classifier
    }

    // Pair table of the last neighbor update. Not refreshed while the
    // neighbor count is zero.
    pub fn pairs(&self) -> &PairState {
        &self.pairs
    }

    pub fn stats(&self) -> &FlockStats {
        &self.stats
    }

    // Neighbors of boid `index`, nearest first
    pub fn neighbors(&self, index: usize) -> &[Neighbor] {
        self.neighbor_sets
            .get(index)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn interaction_lines(&self, index: usize) -> impl Iterator<Item = InteractionLine> + '_ {
        let start = self
            .boids
            .get(index)
            .map(Boid::position)
            .unwrap_or(Vec3::ZERO);

        self.neighbors(index).iter().map(move |neighbor| {
            let end = if neighbor.regime.interacts() {
                start + self.pairs.displacement(index, neighbor.index)
            } else {
                start
            };
            InteractionLine {
                observer: index,
                neighbor: neighbor.index,
                start,
                end,
                regime: neighbor.regime,
                color: neighbor.regime.color(),
            }
        })
    }

    pub fn all_interaction_lines(&self) -> impl Iterator<Item = InteractionLine> + '_ {
        (0..self.boids.len()).flat_map(move |i| self.interaction_lines(i))
    }

    // Summary shown next to the simulation
    pub fn status_text(&self) -> String {
        format!(
            "There are {} birds.\nThe noise factor is {:.1}.\nThey interact with at most their {} nearest neighbours.",
            self.boids.len(),
            self.params.noise,
            self.params.neighbor_count
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nannou::prelude::vec3;

    fn small_params() -> SimulationParams {
        SimulationParams {
            num_boids: 24,
            neighbor_count: 4,
            seed: Some(99),
            ..SimulationParams::default()
        }
    }

    #[test]
    fn new_flock_respects_invariants() {
        let flock = Flock::new(small_params()).unwrap();
        assert_eq!(flock.len(), 24);
        assert_eq!(flock.boid(3).map(Boid::name), Some("003"));

        let half = 0.5 * flock.params().randomize_edge();
        for boid in flock.boids() {
            let p = boid.position();
            assert!(p.x.abs() <= half && p.y.abs() <= half && p.z.abs() <= half);
            assert!((boid.velocity().length() - flock.params().speed).abs() < 1e-6);
        }
        // Neighbor data is available before the first tick
        assert_eq!(flock.neighbors(0).len(), 4);
    }

    #[test]
    fn invalid_setup_is_rejected() {
        let params = SimulationParams {
            num_boids: 3,
            neighbor_count: 3,
            ..SimulationParams::default()
        };
        assert!(Flock::new(params).is_err());

        let params = SimulationParams {
            edge_length: -1.0,
            ..small_params()
        };
        assert_eq!(Flock::new(params).err(), Some(FlockError::InvalidEdgeLength(-1.0)));

        assert_eq!(
            Flock::from_boids(small_params(), Vec::new()).err(),
            Some(FlockError::EmptyFlock)
        );
    }

    #[test]
    fn same_seed_same_trajectory() {
        let mut a = Flock::new(small_params()).unwrap();
        let mut b = Flock::new(small_params()).unwrap();
        for _ in 0..10 {
            a.tick();
            b.tick();
        }
        assert_eq!(a.boids(), b.boids());
    }

    #[test]
    fn parallel_and_sequential_ticks_agree() {
        let mut a = Flock::new(SimulationParams {
            enable_parallel: false,
            ..small_params()
        })
        .unwrap();
        let mut b = Flock::new(SimulationParams {
            enable_parallel: true,
            ..small_params()
        })
        .unwrap();
        for _ in 0..10 {
            a.tick();
            b.tick();
        }
        assert_eq!(a.boids(), b.boids());
    }

    #[test]
    fn neighbor_count_is_clamped() {
        let mut flock = Flock::new(small_params()).unwrap();
        assert_eq!(flock.set_neighbor_count(100), 22);
        assert_eq!(flock.neighbors(5).len(), 22);

        assert_eq!(flock.set_neighbor_count(0), 0);
        assert_eq!(flock.decrease_neighbor_count(), 0);
        assert!(flock.neighbors(0).is_empty());
    }

    #[test]
    fn interactive_steps_stop_at_the_cap() {
        let mut flock = Flock::new(SimulationParams {
            neighbor_count: 10,
            max_neighbor_count: 11,
            ..small_params()
        })
        .unwrap();
        assert_eq!(flock.increase_neighbor_count(), 11);
        assert_eq!(flock.increase_neighbor_count(), 11);
        assert_eq!(flock.decrease_neighbor_count(), 10);
        assert_eq!(flock.neighbors(0).len(), 10);
    }

    #[test]
    fn increase_never_lowers_a_setup_count() {
        let mut flock = Flock::new(SimulationParams {
            num_boids: 4,
            neighbor_count: 3,
            seed: Some(4),
            ..SimulationParams::default()
        })
        .unwrap();

        assert_eq!(flock.increase_neighbor_count(), 3);
        assert_eq!(flock.set_neighbor_count(3), 3);
        assert_eq!(flock.neighbor_count(), 3);
        assert_eq!(flock.neighbors(0).len(), 3);

        assert_eq!(flock.decrease_neighbor_count(), 2);
        assert_eq!(flock.increase_neighbor_count(), 2);
    }

    #[test]
    fn caller_boids_take_the_flock_speed() {
        let params = SimulationParams {
            neighbor_count: 1,
            ..SimulationParams::default()
        };
        let space = PeriodicSpace::new(params.edge_length).unwrap();
        let boids = vec![
            Boid::with_state("fast", 0.3, Vec3::ZERO, Vec3::Y, &space),
            Boid::with_state("slow", params.speed, vec3(2.0, 0.0, 0.0), Vec3::Z, &space),
        ];
        let flock = Flock::from_boids(params.clone(), boids).unwrap();

        for boid in flock.boids() {
            assert_eq!(boid.speed(), params.speed);
            assert!((boid.velocity().length() - params.speed).abs() < 1e-6);
        }
        assert!((flock.boids()[0].velocity() - Vec3::Y * params.speed).length() < 1e-6);
    }

    #[test]
    fn noise_is_clamped_and_stepped() {
        let mut flock = Flock::new(small_params()).unwrap();
        assert_eq!(flock.set_noise(5.0), 2.0);
        assert_eq!(flock.increase_noise(), 2.0);
        assert_eq!(flock.set_noise(-1.0), 0.0);
        assert_eq!(flock.set_noise(f32::NAN), 0.0);

        flock.set_noise(0.12);
        assert_eq!(flock.decrease_noise(), 0.0);

        flock.set_noise(1.0);
        assert!((flock.increase_noise() - 1.1).abs() < 1e-6);
        assert!((flock.decrease_noise() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn zero_neighbors_means_straight_lines() {
        let mut flock = Flock::new(SimulationParams {
            neighbor_count: 0,
            ..small_params()
        })
        .unwrap();
        let before: Vec<Boid> = flock.boids().to_vec();
        flock.tick();

        for (old, new) in before.iter().zip(flock.boids()) {
            assert_eq!(new.velocity(), old.velocity());
            let expected = flock.space().wrap(old.position() + old.velocity());
            assert!((new.position() - expected).length() < 1e-6);
        }
        assert!(flock.neighbors(0).is_empty());
        assert_eq!(flock.stats().regime_counts.total(), 0);
    }

    #[test]
    fn toggling_does_not_reset_state() {
        let mut flock = Flock::new(small_params()).unwrap();
        flock.tick();
        let snapshot: Vec<Boid> = flock.boids().to_vec();

        flock.toggle_running();
        assert_eq!(flock.state(), RunState::Idle);
        flock.toggle_running();
        assert!(flock.is_running());
        assert_eq!(flock.boids(), snapshot.as_slice());
    }

    #[test]
    fn lines_are_resolved_through_the_boundary() {
        let params = SimulationParams {
            neighbor_count: 2,
            noise: 0.0,
            ..SimulationParams::default()
        };
        let space = PeriodicSpace::new(params.edge_length).unwrap();
        let boids = vec![
            Boid::with_state("a", params.speed, vec3(4.9, 0.0, 0.0), Vec3::X, &space),
            Boid::with_state("b", params.speed, vec3(-4.8, 0.0, 0.0), Vec3::X, &space),
            Boid::with_state("c", params.speed, vec3(4.9, 3.0, 0.0), Vec3::X, &space),
        ];
        let flock = Flock::from_boids(params, boids).unwrap();

        let lines: Vec<InteractionLine> = flock.interaction_lines(0).collect();
        assert_eq!(lines.len(), 2);

        // b sits 0.3 away across the +x face
        assert_eq!(lines[0].neighbor, 1);
        assert_eq!(lines[0].regime, Regime::SoftRepulsion);
        assert!((lines[0].end - vec3(5.2, 0.0, 0.0)).length() < 1e-5);

        // c is out of range, so the line collapses onto the boid
        assert_eq!(lines[1].neighbor, 2);
        assert_eq!(lines[1].regime, Regime::OutOfRange);
        assert_eq!(lines[1].start, lines[1].end);

        assert_eq!(flock.all_interaction_lines().count(), 6);
    }

    #[test]
    fn status_text_describes_the_flock() {
        let flock = Flock::new(small_params()).unwrap();
        assert_eq!(
            flock.status_text(),
            "There are 24 birds.\nThe noise factor is 1.0.\nThey interact with at most their 4 nearest neighbours."
        );
    }

    #[test]
    fn stats_track_frames() {
        let mut flock = Flock::new(small_params()).unwrap();
        flock.tick();
        flock.tick();
        assert_eq!(flock.stats().frame, 2);
        assert_eq!(flock.stats().regime_counts.total(), 24 * 4);
        assert!((0.0..=1.0 + 1e-5).contains(&flock.stats().polarization));
    }
}
