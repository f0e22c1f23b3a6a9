//! # BIOTICA
//!
//! Agent cognition and evolution engine for a continuous 2D
//! artificial-life simulation.
//!
//! ## Features
//!
//! - **Evolvable**: layered genomes with mutation and crossover
//! - **Embodied**: raycast vision, interoceptive senses, smoothed actions
//! - **Parallel**: the think phase runs across all cores via Rayon
//! - **Configurable**: YAML configuration files, no global state
//! - **Reproducible**: seeded random number generation
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use biotica::{Config, World};
//!
//! # fn main() -> Result<(), biotica::BrainError> {
//! let config = Config::default();
//! let mut world = World::new(config)?;
//!
//! world.run(1000);
//!
//! println!("Population: {}", world.population());
//! println!("Max generation: {}", world.stats().max_generation);
//! # Ok(())
//! # }
//! ```
//!
//! ## Configuration
//!
//! ```rust
//! use biotica::Config;
//!
//! let mut config = Config::default();
//! config.world.initial_population = 50;
//! config.evolution.mutation_rate = 0.1;
//! ```

pub mod biot;
pub mod buffer;
pub mod config;
pub mod decision;
pub mod dispensary;
pub mod error;
pub mod fountain;
pub mod genome;
pub mod neural;
pub mod perception;
pub mod senses;
pub mod stats;
pub mod world;

// Re-export main types
pub use biot::Biot;
pub use config::Config;
pub use error::BrainError;
pub use genome::Genome;
pub use world::World;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Run a quick benchmark
pub fn benchmark(steps: u64, population: usize) -> Result<BenchmarkResult, BrainError> {
    use std::time::Instant;

    let mut config = Config::default();
    config.world.initial_population = population;
    config.evolution.min_population = population.min(config.evolution.min_population);
    config.evolution.max_population = config.evolution.max_population.max(population);

    let mut world = World::new(config)?;

    let start = Instant::now();
    world.run(steps);
    let elapsed = start.elapsed();

    Ok(BenchmarkResult {
        steps,
        initial_population: population,
        final_population: world.population(),
        elapsed_secs: elapsed.as_secs_f64(),
        steps_per_second: steps as f64 / elapsed.as_secs_f64(),
        max_generation: world.stats().max_generation,
    })
}

/// Benchmark result
#[derive(Debug, Clone)]
pub struct BenchmarkResult {
    pub steps: u64,
    pub initial_population: usize,
    pub final_population: usize,
    pub elapsed_secs: f64,
    pub steps_per_second: f64,
    pub max_generation: u32,
}

impl std::fmt::Display for BenchmarkResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Benchmark Results ===")?;
        writeln!(f, "Steps: {}", self.steps)?;
        writeln!(
            f,
            "Population: {} -> {}",
            self.initial_population, self.final_population
        )?;
        writeln!(f, "Time: {:.3}s", self.elapsed_secs)?;
        writeln!(f, "Speed: {:.1} steps/s", self.steps_per_second)?;
        writeln!(f, "Max generation: {}", self.max_generation)?;
        Ok(())
    }
}
