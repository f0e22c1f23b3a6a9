//! Genome dispensary: population bounding, unborn-genome caching, and
//! vacancy filling.

use crate::config::Config;
use crate::genome::Genome;
use rand::Rng;
use std::collections::VecDeque;

/// A cached unborn genome ranked by its parent's lifetime fitness.
#[derive(Clone, Debug)]
pub struct LivingGenome {
    pub genome: Genome,
    pub average_health: f32,
}

/// Bounds population size, caches high-fitness unborn genomes, and
/// dispenses genomes to fill vacancies.
#[derive(Debug)]
pub struct GenomeDispensary {
    cache: VecDeque<LivingGenome>,
    cache_size: usize,
    pool: Vec<Genome>,
    pool_cursor: usize,
    dispense_serial: u64,
    min_population: usize,
    max_population: usize,
    random_mode: bool,
    input_count: usize,
    hidden_counts: Vec<usize>,
    output_count: usize,
}

impl GenomeDispensary {
    pub fn new(config: &Config) -> Self {
        let evolution = &config.evolution;
        let pool = match &evolution.genome_pool_path {
            Some(path) => match Genome::load_pool(path) {
                Ok(pool) => {
                    log::info!("loaded {} seed genomes from {}", pool.len(), path);
                    pool
                }
                Err(e) => {
                    log::warn!("seed genome pool {} unavailable: {}", path, e);
                    Vec::new()
                }
            },
            None => Vec::new(),
        };

        Self {
            cache: VecDeque::with_capacity(evolution.cache_size),
            cache_size: evolution.cache_size.max(1),
            pool,
            pool_cursor: 0,
            dispense_serial: 0,
            min_population: evolution.min_population,
            max_population: evolution.max_population,
            random_mode: evolution.random_mode,
            input_count: config.neural.input_count,
            hidden_counts: config.neural.hidden_counts.clone(),
            output_count: config.neural.output_count,
        }
    }

    /// Next genome to fill a vacancy, or `None` while the population sits
    /// at or above the minimum target. Preference order: best cached
    /// unborn genome, then the file-backed pool, then (in open-ended
    /// random mode) a fresh random genome.
    pub fn next_genome<R: Rng>(&mut self, rng: &mut R, population: usize) -> Option<Genome> {
        if population >= self.min_population {
            return None;
        }

        if let Some(best) = self.most_fit(true) {
            return Some(best);
        }

        if !self.pool.is_empty() {
            let mut genome = self.pool[self.pool_cursor % self.pool.len()].clone();
            self.pool_cursor = (self.pool_cursor + 1) % self.pool.len();
            self.dispense_serial += 1;
            // Round-robin reuse: suffix keeps ids collision-free
            genome.id = format!("{}-{}", genome.id, self.dispense_serial);
            return Some(genome);
        }

        if self.random_mode {
            return Some(Genome::new_random(
                rng,
                self.input_count,
                &self.hidden_counts,
                self.output_count,
            ));
        }

        None
    }

    /// Offspring are cached instead of spawned once the population is at
    /// or above the cap.
    pub fn should_cache(&self, population: usize) -> bool {
        population >= self.max_population
    }

    /// Insert into the bounded cache; evicts the oldest entry when full.
    /// FIFO eviction, not fitness-based, bounds the cache cost.
    pub fn cache_genome(&mut self, genome: Genome, average_health: f32) {
        if self.cache.len() >= self.cache_size {
            self.cache.pop_front();
        }
        self.cache.push_back(LivingGenome {
            genome,
            average_health,
        });
    }

    /// Cached genome with the highest recorded fitness, optionally
    /// removing it from the cache.
    pub fn most_fit(&mut self, remove: bool) -> Option<Genome> {
        let best = self
            .cache
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| {
                a.average_health
                    .partial_cmp(&b.average_health)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|(idx, _)| idx)?;

        if remove {
            self.cache.remove(best).map(|entry| entry.genome)
        } else {
            Some(self.cache[best].genome.clone())
        }
    }

    pub fn cached_count(&self) -> usize {
        self.cache.len()
    }

    pub fn pool_size(&self) -> usize {
        self.pool.len()
    }

    /// `(min_population, max_population)` bounds this dispensary enforces.
    pub fn bounds(&self) -> (usize, usize) {
        (self.min_population, self.max_population)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn test_config() -> Config {
        let mut config = Config::default();
        config.evolution.min_population = 5;
        config.evolution.max_population = 10;
        config.evolution.cache_size = 3;
        config
    }

    fn genome(rng: &mut ChaCha8Rng) -> Genome {
        Genome::new_random(rng, 30, &[4], 8)
    }

    #[test]
    fn test_no_dispense_at_minimum() {
        let config = test_config();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut dispensary = GenomeDispensary::new(&config);

        assert!(dispensary.next_genome(&mut rng, 5).is_none());
        assert!(dispensary.next_genome(&mut rng, 50).is_none());
        assert!(dispensary.next_genome(&mut rng, 4).is_some());
    }

    #[test]
    fn test_random_mode_fallback() {
        let config = test_config();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut dispensary = GenomeDispensary::new(&config);

        let fresh = dispensary.next_genome(&mut rng, 0).unwrap();
        assert_eq!(fresh.generation, 0);
        assert_eq!(fresh.input_count, config.neural.input_count);
        assert!(fresh.validate_shape().is_ok());
    }

    #[test]
    fn test_cached_beats_random_and_best_wins() {
        let config = test_config();
        let mut rng = ChaCha8Rng::seed_from_u64(6);
        let mut dispensary = GenomeDispensary::new(&config);

        let weak = genome(&mut rng);
        let strong = genome(&mut rng);
        let strong_id = strong.id.clone();
        dispensary.cache_genome(weak, 0.3);
        dispensary.cache_genome(strong, 0.8);

        let dispensed = dispensary.next_genome(&mut rng, 0).unwrap();
        assert_eq!(dispensed.id, strong_id);
        assert_eq!(dispensary.cached_count(), 1);
    }

    #[test]
    fn test_fifo_eviction_not_fitness() {
        let config = test_config();
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut dispensary = GenomeDispensary::new(&config);

        // Oldest entry is also the fittest; it must still be the one evicted.
        let fittest = genome(&mut rng);
        let fittest_id = fittest.id.clone();
        dispensary.cache_genome(fittest, 0.99);
        dispensary.cache_genome(genome(&mut rng), 0.1);
        dispensary.cache_genome(genome(&mut rng), 0.2);
        dispensary.cache_genome(genome(&mut rng), 0.3);

        assert_eq!(dispensary.cached_count(), 3);
        let best = dispensary.most_fit(false).unwrap();
        assert_ne!(best.id, fittest_id, "oldest entry should have been evicted");
    }

    #[test]
    fn test_should_cache_at_cap() {
        let config = test_config();
        let dispensary = GenomeDispensary::new(&config);

        assert!(!dispensary.should_cache(9));
        assert!(dispensary.should_cache(10));
        assert!(dispensary.should_cache(11));
    }

    #[test]
    fn test_most_fit_peek_keeps_entry() {
        let config = test_config();
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let mut dispensary = GenomeDispensary::new(&config);
        dispensary.cache_genome(genome(&mut rng), 0.5);

        assert!(dispensary.most_fit(false).is_some());
        assert_eq!(dispensary.cached_count(), 1);
        assert!(dispensary.most_fit(true).is_some());
        assert_eq!(dispensary.cached_count(), 0);
        assert!(dispensary.most_fit(true).is_none());
    }

    #[test]
    fn test_pool_round_robin_with_suffix() {
        let mut config = test_config();
        let mut rng = ChaCha8Rng::seed_from_u64(9);

        // Write a two-genome pool file
        let pool = vec![genome(&mut rng), genome(&mut rng)];
        let path = std::env::temp_dir().join("biotica_test_pool.json");
        std::fs::write(&path, serde_json::to_string(&pool).unwrap()).unwrap();
        config.evolution.genome_pool_path = Some(path.to_string_lossy().to_string());
        config.evolution.random_mode = false;

        let mut dispensary = GenomeDispensary::new(&config);
        assert_eq!(dispensary.pool_size(), 2);

        let first = dispensary.next_genome(&mut rng, 0).unwrap();
        let second = dispensary.next_genome(&mut rng, 0).unwrap();
        let third = dispensary.next_genome(&mut rng, 0).unwrap();

        assert!(first.id.starts_with(&pool[0].id));
        assert!(second.id.starts_with(&pool[1].id));
        assert!(third.id.starts_with(&pool[0].id));
        // Uniqueness suffix keeps round-robin copies distinct
        assert_ne!(first.id, third.id);

        std::fs::remove_file(&path).ok();
    }
}
