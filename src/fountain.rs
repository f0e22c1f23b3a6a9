//! Resource fountain: a bang-bang homeostat that keeps the standing food
//! supply near a target.
//!
//! Food decays continuously on its own, so only coarse correction is
//! needed; the dead band between the lower and upper thresholds prevents
//! the controller from oscillating. This is deliberately not a PID loop.

use crate::config::FountainConfig;
use crate::perception::BodyId;
use glam::Vec2;
use rand::Rng;

/// Narrow view of the food population the fountain manages. The world
/// applies these mutations at its end-of-tick synchronization point.
pub trait FoodSupply {
    /// Remaining energy of a managed entity, or `None` once it is gone.
    fn remaining_energy(&self, body: BodyId) -> Option<f32>;
    /// Position of a managed entity.
    fn position(&self, body: BodyId) -> Option<Vec2>;
    /// Remove energy, triggering the entity's own depletion logic.
    fn drain(&mut self, body: BodyId, amount: f32);
    /// Create a food entity and return its handle.
    fn spawn(&mut self, position: Vec2, energy: f32) -> BodyId;
}

/// Supply/demand controller for one food region.
#[derive(Debug)]
pub struct ResourceFountain {
    position: Vec2,
    config: FountainConfig,
    managed: Vec<BodyId>,
}

impl ResourceFountain {
    pub fn new(position: Vec2, config: FountainConfig) -> Self {
        Self {
            position,
            config,
            managed: Vec::new(),
        }
    }

    /// Live sum of remaining energy across managed entities.
    pub fn current_supply<S: FoodSupply>(&self, supply: &S) -> f32 {
        self.managed
            .iter()
            .filter_map(|&body| supply.remaining_energy(body))
            .sum()
    }

    pub fn target_supply(&self) -> f32 {
        self.config.target_supply
    }

    pub fn managed_count(&self) -> usize {
        self.managed.len()
    }

    /// Adopt an externally created entity (e.g. a carcass) into the
    /// managed set so it counts toward the standing supply.
    pub fn adopt(&mut self, body: BodyId) {
        self.managed.push(body);
    }

    /// Run one control step if the cadence boundary has been reached.
    pub fn tick<R: Rng, S: FoodSupply>(&mut self, rng: &mut R, supply: &mut S, tick: u64) {
        if tick % self.config.cadence != 0 {
            return;
        }
        self.prune(supply);

        let current = self.current_supply(supply);
        let target = self.config.target_supply;

        if current > target * self.config.upper_band {
            self.drain_step(rng, supply);
        } else if current < target * self.config.lower_band {
            self.spawn_step(rng, supply);
        }
        // Inside the dead band: leave the supply alone.
    }

    /// Forget entities that have been fully consumed or removed.
    fn prune<S: FoodSupply>(&mut self, supply: &S) {
        self.managed
            .retain(|&body| supply.remaining_energy(body).is_some());
    }

    fn drain_step<R: Rng, S: FoodSupply>(&mut self, rng: &mut R, supply: &mut S) {
        for _ in 0..self.config.batch_size {
            if self.managed.is_empty() {
                return;
            }
            let body = self.managed[rng.gen_range(0..self.managed.len())];
            if let Some(remaining) = supply.remaining_energy(body) {
                let amount = remaining * rng.gen_range(0.5..=1.0);
                supply.drain(body, amount);
            }
        }
    }

    fn spawn_step<R: Rng, S: FoodSupply>(&mut self, rng: &mut R, supply: &mut S) {
        for _ in 0..self.config.batch_size {
            let position = self.pick_position(rng, supply);
            let energy =
                rng.gen_range(self.config.food_energy_min..=self.config.food_energy_max);
            let body = supply.spawn(position, energy);
            self.managed.push(body);
        }
    }

    /// New food prefers existing clusters over uniform placement.
    fn pick_position<R: Rng, S: FoodSupply>(&self, rng: &mut R, supply: &S) -> Vec2 {
        if !self.managed.is_empty() && rng.gen::<f32>() < self.config.cluster_bias {
            let anchor = self.managed[rng.gen_range(0..self.managed.len())];
            if let Some(center) = supply.position(anchor) {
                let jitter = Vec2::new(
                    rng.gen_range(-self.config.min_radius..=self.config.min_radius),
                    rng.gen_range(-self.config.min_radius..=self.config.min_radius),
                );
                return center + jitter;
            }
        }

        let radius = rng.gen_range(self.config.min_radius..=self.config.max_radius);
        let theta = rng.gen_range(0.0..std::f32::consts::TAU);
        self.position + Vec2::new(theta.cos(), theta.sin()) * radius
    }
}
