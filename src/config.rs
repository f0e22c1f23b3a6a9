//! Configuration for the biot simulation.
//!
//! Supports YAML configuration files with sensible defaults. There are no
//! global singletons: a `Config` reference is passed into every component
//! constructor and tick function.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub world: WorldConfig,
    pub biot: BiotConfig,
    pub neural: NeuralConfig,
    pub evolution: EvolutionConfig,
    pub perception: PerceptionConfig,
    pub fountain: FountainConfig,
    pub logging: LoggingConfig,
}

/// World/environment configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldConfig {
    /// World width in world units
    pub width: f32,
    /// World height in world units
    pub height: f32,
    /// Number of biots at start
    pub initial_population: usize,
    /// Number of water zones scattered at startup
    pub water_zones: usize,
    /// Number of mud zones scattered at startup
    pub mud_zones: usize,
    /// Radius of water/mud zones
    pub zone_radius: f32,
}

/// Per-biot body and metabolism configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BiotConfig {
    /// Energy capacity; biots are born with half of this
    pub maximum_energy: f32,
    /// Hydration capacity; biots are born with half of this
    pub maximum_hydration: f32,
    /// Age at which a biot expires unconditionally
    pub maximum_age: u64,
    /// Age of full behavioral maturity (visual step at half this)
    pub mature_age: u64,
    /// Minimum ticks between pregnancies, and pregnancy duration
    pub gestation_age: u64,
    /// Health required to mate
    pub mate_health_threshold: f32,
    /// Health required to spawn once gestation completes
    pub spawn_health_threshold: f32,
    /// Energy paid per spawned child
    pub spawn_energy_cost: f32,
    /// Hydration paid per spawned child
    pub spawn_hydration_cost: f32,
    /// Stamina paid per spawned child
    pub spawn_stamina_cost: f32,
    /// Energy and hydration debit per unit of exerted thrust
    pub thrust_cost: f32,
    /// Flat extra energy cost while speed boost is active
    pub speed_boost_cost: f32,
    /// Energy cost per unit of armor activation
    pub armor_cost: f32,
    /// Stamina recovered per idle tick (scaled down by exertion)
    pub stamina_recovery: f32,
    /// Energy returned to the world as food by a fully mature carcass
    pub carcass_energy: f32,
    /// Ticks an expired biot lingers before removal
    pub expiry_grace: u64,
    /// Body radius in world units
    pub radius: f32,
    /// Movement speed per unit of forward thrust
    pub speed: f32,
    /// Heading change per unit of differential thrust (radians)
    pub turn_rate: f32,
    /// Energy transferred per tick while standing on food
    pub eat_rate: f32,
    /// Hydration recovered per tick while standing on water
    pub drink_rate: f32,
    /// Period of the short clock sense, in ticks
    pub clock_short_rate: u64,
    /// Period of the long clock sense, in ticks
    pub clock_long_rate: u64,
}

/// Neural network configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NeuralConfig {
    /// Total input channels; pins the sense layout (28 or 30)
    pub input_count: usize,
    /// Hidden layer sizes for fresh random genomes
    pub hidden_counts: Vec<usize>,
    /// Output channels (fixed action layout of 8)
    pub output_count: usize,
    /// Guard inference outputs against numeric blow-up
    pub check_outputs: bool,
    /// Outputs beyond this magnitude zero the whole vector
    pub max_output_value: f32,
}

/// Evolution and population configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionConfig {
    /// Mutation rate in [0, 1], fed to the event-count curve
    pub mutation_rate: f32,
    /// Radius within which a mate's genome can be picked up
    pub mating_radius: f32,
    /// Population floor the dispensary refills toward
    pub min_population: usize,
    /// Population cap; offspring beyond it are cached, not spawned
    pub max_population: usize,
    /// Capacity of the unborn-genome cache (FIFO eviction)
    pub cache_size: usize,
    /// Dispense fresh random genomes when cache and pool are empty
    pub random_mode: bool,
    /// Optional JSON file of seed genomes, dispensed round-robin
    #[serde(default)]
    pub genome_pool_path: Option<String>,
}

/// Vision configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerceptionConfig {
    /// Number of fixed eye angles
    pub eye_angles: usize,
    /// Sub-rays cast per eye angle
    pub sub_rays: usize,
    /// Angular spread of sub-rays around the eye angle (radians)
    pub sub_ray_spread: f32,
    /// Maximum ray distance
    pub max_distance: f32,
    /// Distinct bodies counted per angle before further hits are ignored
    pub max_bodies_per_angle: usize,
    /// Smoothing memory for display reads
    pub display_memory: usize,
    /// Smoothing memory for inference reads
    pub inference_memory: usize,
}

/// Resource fountain (food homeostat) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FountainConfig {
    /// Standing food supply the homeostat tracks
    pub target_supply: f32,
    /// Ticks between control steps
    pub cadence: u64,
    /// Entities touched per control step
    pub batch_size: usize,
    /// Inner placement radius around the fountain
    pub min_radius: f32,
    /// Outer placement radius around the fountain
    pub max_radius: f32,
    /// Minimum energy of a spawned food entity
    pub food_energy_min: f32,
    /// Maximum energy of a spawned food entity
    pub food_energy_max: f32,
    /// Supply above `upper_band * target` triggers draining
    pub upper_band: f32,
    /// Supply below `lower_band * target` triggers spawning
    pub lower_band: f32,
    /// Probability a new entity is placed near an existing cluster
    pub cluster_bias: f32,
    /// Energy each food entity loses per tick on its own
    pub food_decay: f32,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Ticks between stats lines
    pub stats_interval: u64,
    /// Log level (error, warn, info, debug, trace)
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            world: WorldConfig::default(),
            biot: BiotConfig::default(),
            neural: NeuralConfig::default(),
            evolution: EvolutionConfig::default(),
            perception: PerceptionConfig::default(),
            fountain: FountainConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: 2000.0,
            height: 2000.0,
            initial_population: 40,
            water_zones: 3,
            mud_zones: 2,
            zone_radius: 140.0,
        }
    }
}

impl Default for BiotConfig {
    fn default() -> Self {
        Self {
            maximum_energy: 120.0,
            maximum_hydration: 120.0,
            maximum_age: 3200,
            mature_age: 600,
            gestation_age: 320,
            mate_health_threshold: 0.65,
            spawn_health_threshold: 0.6,
            spawn_energy_cost: 28.0,
            spawn_hydration_cost: 18.0,
            spawn_stamina_cost: 0.08,
            thrust_cost: 0.12,
            speed_boost_cost: 0.35,
            armor_cost: 0.05,
            stamina_recovery: 0.002,
            carcass_energy: 40.0,
            expiry_grace: 30,
            radius: 10.0,
            speed: 3.0,
            turn_rate: 0.2,
            eat_rate: 1.5,
            drink_rate: 2.0,
            clock_short_rate: 120,
            clock_long_rate: 600,
        }
    }
}

impl Default for NeuralConfig {
    fn default() -> Self {
        Self {
            input_count: 30,
            hidden_counts: vec![14],
            output_count: 8,
            check_outputs: true,
            max_output_value: 2.0,
        }
    }
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            mutation_rate: 0.25,
            mating_radius: 80.0,
            min_population: 30,
            max_population: 60,
            cache_size: 20,
            random_mode: true,
            genome_pool_path: None,
        }
    }
}

impl Default for PerceptionConfig {
    fn default() -> Self {
        Self {
            eye_angles: 6,
            sub_rays: 3,
            sub_ray_spread: 0.12,
            max_distance: 300.0,
            max_bodies_per_angle: 4,
            display_memory: 8,
            inference_memory: 3,
        }
    }
}

impl Default for FountainConfig {
    fn default() -> Self {
        Self {
            target_supply: 1000.0,
            cadence: 10,
            batch_size: 3,
            min_radius: 100.0,
            max_radius: 800.0,
            food_energy_min: 20.0,
            food_energy_max: 60.0,
            upper_band: 1.1,
            lower_band: 0.99,
            cluster_bias: 0.7,
            food_decay: 0.02,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            stats_interval: 50,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a YAML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        if self.world.width <= 0.0 || self.world.height <= 0.0 {
            return Err("world dimensions must be positive".to_string());
        }
        if self.neural.input_count != 28 && self.neural.input_count != 30 {
            return Err("input_count must be 28 or 30".to_string());
        }
        if self.neural.output_count != crate::decision::OUTPUT_COUNT {
            return Err(format!(
                "output_count must be {}",
                crate::decision::OUTPUT_COUNT
            ));
        }
        if self.neural.hidden_counts.iter().any(|&n| n == 0) {
            return Err("hidden layer sizes must be > 0".to_string());
        }
        if !(0.0..=1.0).contains(&self.evolution.mutation_rate) {
            return Err("mutation_rate must be in [0, 1]".to_string());
        }
        if self.evolution.min_population > self.evolution.max_population {
            return Err("min_population cannot exceed max_population".to_string());
        }
        if self.world.initial_population > self.evolution.max_population {
            return Err("initial_population cannot exceed max_population".to_string());
        }
        if self.perception.eye_angles == 0 || self.perception.sub_rays == 0 {
            return Err("perception needs at least one eye angle and sub-ray".to_string());
        }
        if self.fountain.lower_band >= self.fountain.upper_band {
            return Err("fountain lower_band must sit below upper_band".to_string());
        }
        if self.fountain.food_energy_min > self.fountain.food_energy_max {
            return Err("fountain food_energy_min cannot exceed food_energy_max".to_string());
        }
        if self.fountain.min_radius > self.fountain.max_radius {
            return Err("fountain min_radius cannot exceed max_radius".to_string());
        }
        if self.fountain.cadence == 0 {
            return Err("fountain cadence must be at least 1".to_string());
        }
        if self.fountain.batch_size == 0 {
            return Err("fountain batch_size must be at least 1".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_roundtrip() {
        let config = Config::default();
        let yaml = serde_yaml::to_string(&config).unwrap();
        let loaded: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(config.neural.input_count, loaded.neural.input_count);
        assert_eq!(config.fountain.target_supply, loaded.fountain.target_supply);
    }

    #[test]
    fn test_rejects_unknown_layout() {
        let mut config = Config::default();
        config.neural.input_count = 29;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_inverted_band() {
        let mut config = Config::default();
        config.fountain.lower_band = 1.2;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_inverted_food_energy_range() {
        let mut config = Config::default();
        config.fountain.food_energy_min = config.fountain.food_energy_max + 1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_inverted_fountain_radii() {
        let mut config = Config::default();
        config.fountain.min_radius = config.fountain.max_radius + 1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_fountain_cadence() {
        let mut config = Config::default();
        config.fountain.cadence = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_fountain_batch() {
        let mut config = Config::default();
        config.fountain.batch_size = 0;
        assert!(config.validate().is_err());
    }
}
