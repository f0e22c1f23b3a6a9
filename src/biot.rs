//! Biots: one simulated organism wiring genome, brain, perception,
//! senses, decisions, and a metabolic lifecycle together by explicit
//! composition.

use crate::config::{BiotConfig, Config, EvolutionConfig};
use crate::decision::{Decision, OUTPUT_COUNT};
use crate::error::BrainError;
use crate::genome::Genome;
use crate::neural::NeuralNet;
use crate::perception::{BodyId, PerceptionEncoder, SpatialQuery};
use crate::senses::{SenseLayout, SenseSample, Senses};
use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// What the biot's body is currently standing on.
#[derive(Clone, Copy, Debug, Default)]
pub struct ContactFlags {
    pub on_food: bool,
    pub on_water: bool,
    pub on_mud: bool,
}

/// Read-only state published to the rendering/UI collaborator.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BiotSnapshot {
    pub id: u64,
    pub generation: u32,
    pub position: Vec2,
    pub heading: f32,
    pub color: [f32; 3],
    pub health: f32,
    pub energy_ratio: f32,
    pub hydration_ratio: f32,
    pub stamina: f32,
    pub age: u64,
    pub progress: f32,
    pub expired: bool,
}

/// One biot: genome + brain + sensor/decision state + metabolic state.
#[derive(Debug)]
pub struct Biot {
    pub id: u64,
    pub body: BodyId,
    pub position: Vec2,
    pub heading: f32,
    pub genome: Genome,
    brain: NeuralNet,
    perception: PerceptionEncoder,
    senses: Senses,
    pub decision: Decision,

    pub energy: f32,
    pub hydration: f32,
    max_energy: f32,
    max_hydration: f32,
    /// In [0, 1]; damage here subtracts from health directly
    pub stamina: f32,
    pub age: u64,
    pub last_spawned_age: u64,
    pub last_pregnant_age: u64,
    pub spawn_count: u32,
    /// Presence implies pregnancy
    pub mating_genome: Option<Genome>,
    pub expired: bool,
    expired_at_age: Option<u64>,

    health_sum: f64,
    health_samples: u64,
    input_scratch: Vec<f32>,
}

impl Biot {
    /// Create a biot at birth: half-maximum energy and hydration, full
    /// stamina. Fails if the genome cannot be built into a net or does
    /// not match the configured input/output layout; such a genome is
    /// never attached to a live biot.
    pub fn new(
        id: u64,
        body: BodyId,
        position: Vec2,
        heading: f32,
        genome: Genome,
        config: &Config,
    ) -> Result<Self, BrainError> {
        if genome.input_count != config.neural.input_count {
            return Err(BrainError::ConstructionFailure(format!(
                "genome input count {} does not match configured {}",
                genome.input_count, config.neural.input_count
            )));
        }
        if genome.output_count != OUTPUT_COUNT {
            return Err(BrainError::ConstructionFailure(format!(
                "genome output count {} is not the action layout of {}",
                genome.output_count, OUTPUT_COUNT
            )));
        }
        let layout = SenseLayout::from_input_count(genome.input_count).ok_or_else(|| {
            BrainError::ConstructionFailure(format!(
                "no sense layout for input count {}",
                genome.input_count
            ))
        })?;

        let brain = NeuralNet::build(&genome, &config.neural)?;
        let input_count = genome.input_count;

        Ok(Self {
            id,
            body,
            position,
            heading,
            genome,
            brain,
            perception: PerceptionEncoder::new(&config.perception),
            senses: Senses::new(
                layout,
                config.biot.clock_short_rate,
                config.biot.clock_long_rate,
            ),
            decision: Decision::new(),
            energy: config.biot.maximum_energy / 2.0,
            hydration: config.biot.maximum_hydration / 2.0,
            max_energy: config.biot.maximum_energy,
            max_hydration: config.biot.maximum_hydration,
            stamina: 1.0,
            age: 0,
            last_spawned_age: 0,
            last_pregnant_age: 0,
            spawn_count: 0,
            mating_genome: None,
            expired: false,
            expired_at_age: None,
            health_sum: 0.0,
            health_samples: 0,
            input_scratch: Vec::with_capacity(input_count),
        })
    }

    /// `min(energy, hydration)` ratios minus stamina damage: exhausting
    /// any one resource is enough to threaten survival.
    pub fn health(&self) -> f32 {
        self.energy_ratio().min(self.hydration_ratio()) - (1.0 - self.stamina)
    }

    pub fn energy_ratio(&self) -> f32 {
        self.energy.max(0.0) / self.max_energy
    }

    pub fn hydration_ratio(&self) -> f32 {
        self.hydration.max(0.0) / self.max_hydration
    }

    pub fn is_pregnant(&self) -> bool {
        self.mating_genome.is_some()
    }

    /// Lifetime mean health; the fitness signal used when caching unborn
    /// genomes.
    pub fn average_health(&self) -> f32 {
        if self.health_samples == 0 {
            0.0
        } else {
            (self.health_sum / self.health_samples as f64) as f32
        }
    }

    /// Full sensory computation, inference, and decode for one tick.
    ///
    /// A failed inference decodes a neutral all-zero action instead; the
    /// simulation always continues.
    pub fn think<Q: SpatialQuery>(&mut self, query: &Q, contact: ContactFlags, config: &Config) {
        self.perception.detect(self.position, self.heading, query);

        let sample = SenseSample {
            health: self.health(),
            energy_ratio: self.energy_ratio(),
            hydration_ratio: self.hydration_ratio(),
            stamina: self.stamina,
            pregnant: self.is_pregnant(),
            on_food: contact.on_food,
            on_water: contact.on_water,
            on_mud: contact.on_mud,
            progress: self.progress(&config.biot),
            age: self.age,
            normalized_age: (self.age as f32 / config.biot.maximum_age as f32).min(1.0),
        };
        self.senses.set_senses(&sample);

        self.input_scratch.clear();
        self.perception.write_inputs(&mut self.input_scratch);
        self.senses.write_inputs(&mut self.input_scratch);

        let outputs = match self.brain.infer(&self.input_scratch) {
            Ok(outputs) => outputs,
            Err(BrainError::ShapeMismatch { expected, found }) => {
                log::error!(
                    "biot {}: input vector length {} does not match net ({})",
                    self.id,
                    found,
                    expected
                );
                vec![0.0; OUTPUT_COUNT]
            }
            Err(_) => vec![0.0; OUTPUT_COUNT],
        };
        self.decision.decode(&outputs);
    }

    /// Fraction of gestation elapsed: toward spawning while pregnant,
    /// toward fertility otherwise.
    pub fn progress(&self, config: &BiotConfig) -> f32 {
        let since = if self.is_pregnant() {
            self.age.saturating_sub(self.last_pregnant_age)
        } else {
            self.age.saturating_sub(self.last_spawned_age)
        };
        (since as f32 / config.gestation_age as f32).min(1.0)
    }

    /// Age, pay movement and ability costs, recover stamina, check expiry.
    pub fn apply_metabolism(&mut self, config: &BiotConfig) {
        self.age += 1;
        if self.expired {
            return;
        }

        let exertion = self.decision.exertion();
        self.energy -= config.thrust_cost * exertion;
        self.hydration -= config.thrust_cost * exertion;

        if self.decision.speed_boost() {
            self.energy -= config.speed_boost_cost;
        }
        self.energy -= config.armor_cost * self.decision.armor_level();

        // Moving fast delays healing
        if self.stamina < 1.0 {
            let recovery = config.stamina_recovery * (1.0 - exertion.min(1.0));
            self.stamina = (self.stamina + recovery).min(1.0);
        }

        self.energy = self.energy.clamp(0.0, config.maximum_energy);
        self.hydration = self.hydration.clamp(0.0, config.maximum_hydration);

        let health = self.health();
        self.health_sum += health as f64;
        self.health_samples += 1;

        if self.age >= config.maximum_age || health <= 0.0 {
            self.expire();
        }
    }

    /// Expiry is terminal.
    pub fn expire(&mut self) {
        if !self.expired {
            self.expired = true;
            self.expired_at_age = Some(self.age);
        }
    }

    /// Whether the post-expiry fade has run its course.
    pub fn faded_out(&self, config: &BiotConfig) -> bool {
        match self.expired_at_age {
            Some(at) => self.age.saturating_sub(at) >= config.expiry_grace,
            None => false,
        }
    }

    /// Energy recycled into a carcass food entity, scaled by maturity.
    pub fn carcass_value(&self, config: &BiotConfig) -> f32 {
        let maturity = (self.age as f32 / config.mature_age as f32).min(1.0);
        maturity * config.carcass_energy
    }

    /// Visual/physical maturation step happens at half mature age.
    pub fn is_adolescent(&self, config: &BiotConfig) -> bool {
        self.age >= config.mature_age / 2
    }

    /// Full behavioral maturity.
    pub fn is_mature(&self, config: &BiotConfig) -> bool {
        self.age >= config.mature_age
    }

    /// Alive, not pregnant, mature, healthy enough to mate.
    pub fn can_mate(&self, config: &BiotConfig) -> bool {
        !self.expired
            && !self.is_pregnant()
            && self.is_mature(config)
            && self.health() >= config.mate_health_threshold
    }

    /// Whether enough time has passed since the last spawn to mate again.
    pub fn mate_cycle_ready(&self, config: &BiotConfig) -> bool {
        self.age.saturating_sub(self.last_spawned_age) > config.gestation_age
    }

    /// Record a mating; the partner genome is the biot's own in the
    /// self-replication path.
    pub fn mate(&mut self, partner: Genome) {
        self.mating_genome = Some(partner);
        self.last_pregnant_age = self.age;
    }

    /// Spawn 1-2 child genomes once gestation completes, paying the
    /// reproduction cost. Returns an empty vector while not ready.
    /// Expiry is terminal: a pending pregnancy dies with the biot.
    pub fn try_spawn<R: Rng>(
        &mut self,
        rng: &mut R,
        evolution: &EvolutionConfig,
        config: &BiotConfig,
    ) -> Vec<Genome> {
        if self.expired {
            return Vec::new();
        }
        let Some(partner) = self.mating_genome.clone() else {
            return Vec::new();
        };
        if self.age.saturating_sub(self.last_pregnant_age) <= config.gestation_age {
            return Vec::new();
        }
        if self.health() < config.spawn_health_threshold {
            return Vec::new();
        }

        let brood = rng.gen_range(1..=2usize);
        let children = if partner.id != self.genome.id {
            match Genome::crossover(rng, &self.genome, &partner, evolution.mutation_rate) {
                Ok((first, second)) => {
                    let mut pair = vec![first, second];
                    pair.truncate(brood);
                    pair
                }
                // Structural mismatch: abandon recombination and fall back
                // to self-replication so the originals stay untouched.
                Err(_) => (0..brood)
                    .map(|_| self.genome.clone_as_child(rng, evolution.mutation_rate))
                    .collect(),
            }
        } else {
            (0..brood)
                .map(|_| self.genome.clone_as_child(rng, evolution.mutation_rate))
                .collect()
        };

        self.energy -= config.spawn_energy_cost * children.len() as f32;
        self.hydration -= config.spawn_hydration_cost * children.len() as f32;
        self.stamina = (self.stamina - config.spawn_stamina_cost).max(0.0);
        self.spawn_count += children.len() as u32;
        self.last_spawned_age = self.age;
        self.mating_genome = None;

        children
    }

    /// Forward speed and heading change derived from the smoothed
    /// differential thrust.
    pub fn locomotion(&self, config: &BiotConfig) -> (f32, f32) {
        let thrust = self.decision.thrust();
        let forward = (thrust.x + thrust.y) / 2.0 * config.speed;
        let turn = (thrust.y - thrust.x) * config.turn_rate;
        let boost = if self.decision.speed_boost() { 2.0 } else { 1.0 };
        (forward * boost, turn)
    }

    pub fn eat(&mut self, amount: f32, config: &BiotConfig) {
        self.energy = (self.energy + amount).min(config.maximum_energy);
    }

    pub fn drink(&mut self, amount: f32, config: &BiotConfig) {
        self.hydration = (self.hydration + amount).min(config.maximum_hydration);
    }

    /// Whether the inference output guard has ever tripped.
    pub fn blew_up(&self) -> bool {
        self.brain.blew_up()
    }

    /// Display color for an eye angle, from the long-memory buffer.
    pub fn eye_color(&self, angle_idx: usize) -> [f32; 3] {
        self.perception.display_color(angle_idx)
    }

    /// Read-only snapshot for the rendering/UI collaborator.
    pub fn snapshot(&self, config: &BiotConfig) -> BiotSnapshot {
        BiotSnapshot {
            id: self.id,
            generation: self.genome.generation,
            position: self.position,
            heading: self.heading,
            color: self.decision.color(),
            health: self.health(),
            energy_ratio: self.energy_ratio(),
            hydration_ratio: self.hydration_ratio(),
            stamina: self.stamina,
            age: self.age,
            progress: self.progress(config),
            expired: self.expired,
        }
    }
}
