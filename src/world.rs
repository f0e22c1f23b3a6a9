//! World harness: owns the biots, the food and terrain entities, the
//! dispensary, and the fountain, and advances the whole simulation one
//! tick at a time.
//!
//! Each tick runs in phases. Sensing and inference are data-parallel over
//! an immutable scene snapshot; every phase that mutates shared world
//! state runs sequentially afterward, so all cross-entity effects land at
//! a single synchronization point.

use crate::biot::{Biot, BiotSnapshot, ContactFlags};
use crate::config::Config;
use crate::dispensary::GenomeDispensary;
use crate::error::BrainError;
use crate::fountain::{FoodSupply, ResourceFountain};
use crate::genome::Genome;
use crate::perception::{category, BodyId, EntityDescriptor, RayHit, SpatialQuery, WorldMutator};
use crate::stats::Stats;
use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Body handle reserved for the world boundary walls.
pub const WALL_BODY: BodyId = 0;

/// Collision radius of a food entity.
pub const FOOD_RADIUS: f32 = 6.0;

/// An edible energy packet.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Food {
    pub body: BodyId,
    pub position: Vec2,
    pub energy: f32,
}

/// A fixed circular terrain region (water or mud).
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Zone {
    pub body: BodyId,
    pub position: Vec2,
    pub radius: f32,
    pub category: u32,
}

/// Mutable view over the food population with disjoint field borrows, so
/// the fountain and carcass recycling can run while the rest of the world
/// stays borrowed elsewhere.
struct FoodStore<'a> {
    foods: &'a mut Vec<Food>,
    next_body: &'a mut BodyId,
}

impl FoodSupply for FoodStore<'_> {
    fn remaining_energy(&self, body: BodyId) -> Option<f32> {
        self.foods
            .iter()
            .find(|f| f.body == body)
            .map(|f| f.energy)
    }

    fn position(&self, body: BodyId) -> Option<Vec2> {
        self.foods
            .iter()
            .find(|f| f.body == body)
            .map(|f| f.position)
    }

    fn drain(&mut self, body: BodyId, amount: f32) {
        if let Some(food) = self.foods.iter_mut().find(|f| f.body == body) {
            food.energy -= amount;
        }
        self.foods.retain(|f| f.energy > 0.0);
    }

    fn spawn(&mut self, position: Vec2, energy: f32) -> BodyId {
        self.spawn_entity(EntityDescriptor::Food { position, energy })
    }
}

impl WorldMutator for FoodStore<'_> {
    fn spawn_entity(&mut self, descriptor: EntityDescriptor) -> BodyId {
        match descriptor {
            EntityDescriptor::Food { position, energy } => {
                *self.next_body += 1;
                let body = *self.next_body;
                self.foods.push(Food {
                    body,
                    position,
                    energy,
                });
                body
            }
        }
    }

    fn remove_entity(&mut self, handle: BodyId) {
        self.foods.retain(|f| f.body != handle);
    }
}

#[derive(Clone, Copy, Debug)]
struct Circle {
    body: BodyId,
    center: Vec2,
    radius: f32,
    category: u32,
}

/// Immutable geometry snapshot taken at the start of each tick. The
/// parallel think phase queries this while the biots themselves are
/// mutably borrowed.
pub struct Scene {
    circles: Vec<Circle>,
    width: f32,
    height: f32,
}

impl Scene {
    /// Contact flags for a body of the given radius at `position`.
    fn contact(&self, position: Vec2, radius: f32) -> ContactFlags {
        let mut flags = ContactFlags::default();
        for circle in &self.circles {
            if position.distance(circle.center) < radius + circle.radius {
                match circle.category {
                    category::FOOD => flags.on_food = true,
                    category::WATER => flags.on_water = true,
                    category::MUD => flags.on_mud = true,
                    _ => {}
                }
            }
        }
        flags
    }

    /// Entry parameter of the segment into the circle, if any.
    fn ray_circle(start: Vec2, delta: Vec2, circle: &Circle) -> Option<f32> {
        let f = start - circle.center;
        let a = delta.dot(delta);
        if a <= f32::EPSILON {
            return None;
        }
        let b = 2.0 * f.dot(delta);
        let c = f.dot(f) - circle.radius * circle.radius;
        if c <= 0.0 {
            // Start inside: no directional information, skip
            return None;
        }
        let disc = b * b - 4.0 * a * c;
        if disc < 0.0 {
            return None;
        }
        let t = (-b - disc.sqrt()) / (2.0 * a);
        (t > 0.0 && t <= 1.0).then_some(t)
    }

    /// Parameter where the segment first leaves the world bounds, if it does.
    fn ray_walls(&self, start: Vec2, delta: Vec2) -> Option<f32> {
        let mut best: Option<f32> = None;
        let mut consider = |t: f32| {
            if t > 0.0 && t <= 1.0 && best.map_or(true, |b| t < b) {
                best = Some(t);
            }
        };
        if delta.x < 0.0 {
            consider(-start.x / delta.x);
        } else if delta.x > 0.0 {
            consider((self.width - start.x) / delta.x);
        }
        if delta.y < 0.0 {
            consider(-start.y / delta.y);
        } else if delta.y > 0.0 {
            consider((self.height - start.y) / delta.y);
        }
        best
    }
}

impl SpatialQuery for Scene {
    fn cast_ray(&self, start: Vec2, end: Vec2, mask: u32) -> Vec<RayHit> {
        let delta = end - start;
        let mut hits: Vec<(f32, RayHit)> = Vec::new();

        for circle in &self.circles {
            if circle.category & mask == 0 {
                continue;
            }
            if let Some(t) = Self::ray_circle(start, delta, circle) {
                hits.push((
                    t,
                    RayHit {
                        body: circle.body,
                        point: start + delta * t,
                        category: circle.category,
                    },
                ));
            }
        }

        if category::WALL & mask != 0 {
            if let Some(t) = self.ray_walls(start, delta) {
                hits.push((
                    t,
                    RayHit {
                        body: WALL_BODY,
                        point: start + delta * t,
                        category: category::WALL,
                    },
                ));
            }
        }

        hits.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
        hits.into_iter().map(|(_, hit)| hit).collect()
    }

    fn bodies_in_circle(&self, center: Vec2, radius: f32, mask: u32) -> Vec<BodyId> {
        self.circles
            .iter()
            .filter(|c| c.category & mask != 0 && c.center.distance(center) <= radius)
            .map(|c| c.body)
            .collect()
    }
}

/// The whole simulation: population, resources, terrain, and tick loop.
pub struct World {
    config: Config,
    rng: ChaCha8Rng,
    seed: u64,
    tick: u64,
    next_id: u64,
    next_body: BodyId,
    biots: Vec<Biot>,
    foods: Vec<Food>,
    zones: Vec<Zone>,
    fountain: ResourceFountain,
    dispensary: GenomeDispensary,
    stats: Stats,
}

impl World {
    pub fn new(config: Config) -> Result<Self, BrainError> {
        Self::new_with_seed(config, rand::random())
    }

    pub fn new_with_seed(config: Config, seed: u64) -> Result<Self, BrainError> {
        let rng = ChaCha8Rng::seed_from_u64(seed);
        let center = Vec2::new(config.world.width / 2.0, config.world.height / 2.0);
        let fountain = ResourceFountain::new(center, config.fountain.clone());
        let dispensary = GenomeDispensary::new(&config);

        let mut world = Self {
            rng,
            seed,
            tick: 0,
            next_id: 0,
            next_body: WALL_BODY,
            biots: Vec::with_capacity(config.evolution.max_population),
            foods: Vec::new(),
            zones: Vec::new(),
            fountain,
            dispensary,
            stats: Stats::new(),
            config,
        };

        world.scatter_zones();
        world.seed_food();
        for _ in 0..world.config.world.initial_population {
            let genome = Genome::new_random(
                &mut world.rng,
                world.config.neural.input_count,
                &world.config.neural.hidden_counts,
                world.config.neural.output_count,
            );
            let position = world.random_position();
            let heading = world.rng.gen_range(0.0..std::f32::consts::TAU);
            world.add_biot(genome, position, heading)?;
        }

        log::info!(
            "world {}x{} seeded with {} biots and {:.0} food energy (seed {})",
            world.config.world.width,
            world.config.world.height,
            world.biots.len(),
            world.food_supply(),
            seed
        );
        Ok(world)
    }

    fn scatter_zones(&mut self) {
        let counts = [
            (self.config.world.water_zones, category::WATER),
            (self.config.world.mud_zones, category::MUD),
        ];
        for (count, cat) in counts {
            for _ in 0..count {
                let position = self.random_position();
                self.next_body += 1;
                self.zones.push(Zone {
                    body: self.next_body,
                    position,
                    radius: self.config.world.zone_radius,
                    category: cat,
                });
            }
        }
    }

    /// Fill the world to the fountain's target supply before the first tick.
    fn seed_food(&mut self) {
        let fountain_cfg = self.config.fountain.clone();
        let width = self.config.world.width;
        let height = self.config.world.height;
        let mut store = FoodStore {
            foods: &mut self.foods,
            next_body: &mut self.next_body,
        };
        let mut supply = 0.0;
        while supply < fountain_cfg.target_supply {
            let energy = self
                .rng
                .gen_range(fountain_cfg.food_energy_min..=fountain_cfg.food_energy_max);
            let position = Vec2::new(
                self.rng.gen_range(0.0..width),
                self.rng.gen_range(0.0..height),
            );
            let body = store.spawn(position, energy);
            self.fountain.adopt(body);
            supply += energy;
        }
    }

    fn random_position(&mut self) -> Vec2 {
        let margin = self.config.biot.radius * 2.0;
        Vec2::new(
            self.rng.gen_range(margin..self.config.world.width - margin),
            self.rng.gen_range(margin..self.config.world.height - margin),
        )
    }

    fn add_biot(&mut self, genome: Genome, position: Vec2, heading: f32) -> Result<(), BrainError> {
        self.next_id += 1;
        self.next_body += 1;
        let biot = Biot::new(
            self.next_id,
            self.next_body,
            position,
            heading,
            genome,
            &self.config,
        )?;
        self.biots.push(biot);
        Ok(())
    }

    fn snapshot_scene(&self) -> Scene {
        let mut circles = Vec::with_capacity(self.biots.len() + self.foods.len() + self.zones.len());
        for biot in &self.biots {
            circles.push(Circle {
                body: biot.body,
                center: biot.position,
                radius: self.config.biot.radius,
                category: category::BIOT,
            });
        }
        for food in &self.foods {
            circles.push(Circle {
                body: food.body,
                center: food.position,
                radius: FOOD_RADIUS,
                category: category::FOOD,
            });
        }
        for zone in &self.zones {
            circles.push(Circle {
                body: zone.body,
                center: zone.position,
                radius: zone.radius,
                category: zone.category,
            });
        }
        Scene {
            circles,
            width: self.config.world.width,
            height: self.config.world.height,
        }
    }

    /// Advance the simulation one tick.
    pub fn step(&mut self) {
        self.tick += 1;
        let tick = self.tick;

        // Phase 1: parallel sensing and inference over an immutable scene.
        // Each biot thinks every other tick; on skipped ticks the smoothed
        // decision buffers keep re-applying the last decoded action.
        let scene = self.snapshot_scene();
        let config = &self.config;
        self.biots
            .par_iter_mut()
            .enumerate()
            .for_each(|(idx, biot)| {
                if biot.expired || (tick + idx as u64) % 2 != 0 {
                    return;
                }
                let contact = scene.contact(biot.position, config.biot.radius);
                biot.think(&scene, contact, config);
            });

        // Phase 2: sequential movement within the walls.
        let radius = self.config.biot.radius;
        let width = self.config.world.width;
        let height = self.config.world.height;
        for biot in &mut self.biots {
            if biot.expired {
                continue;
            }
            let (forward, turn) = biot.locomotion(&self.config.biot);
            biot.heading = (biot.heading + turn).rem_euclid(std::f32::consts::TAU);
            let direction = Vec2::new(biot.heading.cos(), biot.heading.sin());
            biot.position += direction * forward;
            biot.position.x = biot.position.x.clamp(radius, width - radius);
            biot.position.y = biot.position.y.clamp(radius, height - radius);
        }

        // Phase 3: resource transfer and metabolism.
        for biot in &mut self.biots {
            if !biot.expired {
                for food in &mut self.foods {
                    if biot.position.distance(food.position) < radius + FOOD_RADIUS {
                        let amount = self.config.biot.eat_rate.min(food.energy);
                        food.energy -= amount;
                        biot.eat(amount, &self.config.biot);
                        break;
                    }
                }
                for zone in &self.zones {
                    if zone.category == category::WATER
                        && biot.position.distance(zone.position) < radius + zone.radius
                    {
                        biot.drink(self.config.biot.drink_rate, &self.config.biot);
                        break;
                    }
                }
            }
            biot.apply_metabolism(&self.config.biot);
        }

        self.reproduce();
        self.bury_the_dead();
        self.refill_population();

        // Phase 6: resource homeostat and ambient food decay.
        let mut store = FoodStore {
            foods: &mut self.foods,
            next_body: &mut self.next_body,
        };
        self.fountain.tick(&mut self.rng, &mut store, tick);
        let decay = self.config.fountain.food_decay;
        let depleted: Vec<BodyId> = store
            .foods
            .iter_mut()
            .filter_map(|food| {
                food.energy -= decay;
                (food.energy <= 0.0).then_some(food.body)
            })
            .collect();
        for body in depleted {
            store.remove_entity(body);
        }

        let supply = self.foods.iter().map(|f| f.energy).sum();
        self.stats.update(
            tick,
            &self.biots,
            supply,
            self.foods.len(),
            self.dispensary.cached_count(),
        );
        if tick % self.config.logging.stats_interval == 0 {
            log::info!("{}", self.stats.summary());
        }
    }

    /// Pair up eligible mates; a fertile biot with no partner in range
    /// self-replicates instead.
    fn reproduce(&mut self) {
        let biot_cfg = &self.config.biot;
        let mating_radius = self.config.evolution.mating_radius;
        let scene = self.snapshot_scene();
        let index_of: HashMap<BodyId, usize> = self
            .biots
            .iter()
            .enumerate()
            .map(|(i, b)| (b.body, i))
            .collect();
        let mut matings: Vec<(usize, Genome)> = Vec::new();
        let mut taken = vec![false; self.biots.len()];

        for i in 0..self.biots.len() {
            if taken[i] || !self.biots[i].can_mate(biot_cfg) || !self.biots[i].mate_cycle_ready(biot_cfg)
            {
                continue;
            }
            let partner = scene
                .bodies_in_circle(self.biots[i].position, mating_radius, category::BIOT)
                .into_iter()
                .filter_map(|body| index_of.get(&body).copied())
                .find(|&j| {
                    j != i
                        && !taken[j]
                        && self.biots[j].can_mate(biot_cfg)
                        && self.biots[j].mate_cycle_ready(biot_cfg)
                });
            match partner {
                Some(j) => {
                    matings.push((i, self.biots[j].genome.clone()));
                    matings.push((j, self.biots[i].genome.clone()));
                    taken[i] = true;
                    taken[j] = true;
                }
                None => {
                    // Asexual path: carry the biot's own genome
                    matings.push((i, self.biots[i].genome.clone()));
                    taken[i] = true;
                }
            }
        }
        for (idx, genome) in matings {
            self.biots[idx].mate(genome);
        }

        // Gestations that complete this tick produce children: spawned
        // next to the parent below the population cap, cached above it.
        let mut births = 0u64;
        for i in 0..self.biots.len() {
            let children =
                self.biots[i].try_spawn(&mut self.rng, &self.config.evolution, &self.config.biot);
            if children.is_empty() {
                continue;
            }
            let parent_health = self.biots[i].average_health();
            let parent_position = self.biots[i].position;
            for child in children {
                let population = self.biots.iter().filter(|b| !b.expired).count();
                if self.dispensary.should_cache(population) {
                    self.dispensary.cache_genome(child, parent_health);
                    continue;
                }
                let theta = self.rng.gen_range(0.0..std::f32::consts::TAU);
                let offset = Vec2::new(theta.cos(), theta.sin()) * self.config.biot.radius * 3.0;
                match self.add_biot(child, parent_position + offset, theta) {
                    Ok(()) => births += 1,
                    Err(e) => log::warn!("child genome rejected at birth: {}", e),
                }
            }
        }
        self.stats.record_births(births);
    }

    /// Remove fully faded biots, recycling each into a carcass food entity
    /// proportional to its maturity.
    fn bury_the_dead(&mut self) {
        let biot_cfg = &self.config.biot;
        let mut carcasses: Vec<(Vec2, f32)> = Vec::new();
        self.biots.retain(|biot| {
            if biot.faded_out(biot_cfg) {
                carcasses.push((biot.position, biot.carcass_value(biot_cfg)));
                false
            } else {
                true
            }
        });
        if carcasses.is_empty() {
            return;
        }

        self.stats.record_deaths(carcasses.len() as u64);
        let mut store = FoodStore {
            foods: &mut self.foods,
            next_body: &mut self.next_body,
        };
        for (position, energy) in carcasses {
            if energy > 0.0 {
                let body = store.spawn_entity(EntityDescriptor::Food { position, energy });
                self.fountain.adopt(body);
            }
        }
    }

    /// Fill vacancies below the population floor from the dispensary.
    fn refill_population(&mut self) {
        let mut attempts = 0;
        loop {
            attempts += 1;
            if attempts > self.config.evolution.max_population * 2 {
                break;
            }
            let population = self.biots.iter().filter(|b| !b.expired).count();
            let Some(genome) = self.dispensary.next_genome(&mut self.rng, population) else {
                break;
            };
            let position = self.random_position();
            let heading = self.rng.gen_range(0.0..std::f32::consts::TAU);
            if let Err(e) = self.add_biot(genome, position, heading) {
                log::warn!("dispensed genome rejected: {}", e);
            }
        }
    }

    /// Advance the simulation by `steps` ticks.
    pub fn run(&mut self, steps: u64) {
        for _ in 0..steps {
            self.step();
        }
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn population(&self) -> usize {
        self.biots.iter().filter(|b| !b.expired).count()
    }

    pub fn biots(&self) -> &[Biot] {
        &self.biots
    }

    pub fn biots_mut(&mut self) -> &mut [Biot] {
        &mut self.biots
    }

    pub fn foods(&self) -> &[Food] {
        &self.foods
    }

    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    /// Total energy across all food entities.
    pub fn food_supply(&self) -> f32 {
        self.foods.iter().map(|f| f.energy).sum()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    /// Read-only view of every biot for the rendering/UI collaborator.
    pub fn snapshots(&self) -> Vec<BiotSnapshot> {
        self.biots
            .iter()
            .map(|b| b.snapshot(&self.config.biot))
            .collect()
    }
}
