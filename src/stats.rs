//! Per-tick population statistics for logging and the UI collaborator.

use crate::biot::Biot;
use serde::{Deserialize, Serialize};

/// Aggregate simulation statistics, refreshed once per tick.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Stats {
    pub tick: u64,
    pub population: usize,
    pub births: u64,
    pub deaths: u64,
    pub max_generation: u32,
    pub mean_health: f32,
    pub mean_energy: f32,
    pub mean_age: f32,
    pub food_supply: f32,
    pub food_entities: usize,
    pub cached_genomes: usize,
}

impl Stats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_births(&mut self, count: u64) {
        self.births += count;
    }

    pub fn record_deaths(&mut self, count: u64) {
        self.deaths += count;
    }

    /// Recompute the aggregate view from the live population.
    pub fn update(
        &mut self,
        tick: u64,
        biots: &[Biot],
        food_supply: f32,
        food_entities: usize,
        cached_genomes: usize,
    ) {
        self.tick = tick;
        self.food_supply = food_supply;
        self.food_entities = food_entities;
        self.cached_genomes = cached_genomes;

        let live: Vec<&Biot> = biots.iter().filter(|b| !b.expired).collect();
        self.population = live.len();
        if live.is_empty() {
            self.mean_health = 0.0;
            self.mean_energy = 0.0;
            self.mean_age = 0.0;
            return;
        }

        let n = live.len() as f32;
        self.mean_health = live.iter().map(|b| b.health()).sum::<f32>() / n;
        self.mean_energy = live.iter().map(|b| b.energy).sum::<f32>() / n;
        self.mean_age = live.iter().map(|b| b.age as f32).sum::<f32>() / n;
        self.max_generation = live
            .iter()
            .map(|b| b.genome.generation)
            .max()
            .unwrap_or(self.max_generation)
            .max(self.max_generation);
    }

    /// One-line summary for periodic logging.
    pub fn summary(&self) -> String {
        format!(
            "tick {} | pop {} (gen {}, births {}, deaths {}) | health {:.2} energy {:.1} age {:.0} | food {:.0} in {} | cache {}",
            self.tick,
            self.population,
            self.max_generation,
            self.births,
            self.deaths,
            self.mean_health,
            self.mean_energy,
            self.mean_age,
            self.food_supply,
            self.food_entities,
            self.cached_genomes,
        )
    }
}
