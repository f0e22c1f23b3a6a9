//! Genome encoding and genetic operators.
//!
//! A genome is the serializable description of one biot brain: layer
//! sizes plus flat per-layer weight and bias arrays. Genomes are immutable
//! once attached to a running biot; mutation only happens when producing a
//! child genome.

use crate::error::BrainError;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::path::Path;
use uuid::Uuid;

/// Hard bound on any weight or bias value.
pub const MAX_WEIGHT: f32 = 1.0;

/// Genetic encoding of a neural network's topology and parameters.
///
/// The JSON field names are a stable persistence schema and must
/// round-trip exactly.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Genome {
    pub id: String,
    pub generation: u32,
    pub input_count: usize,
    pub hidden_counts: Vec<usize>,
    pub output_count: usize,
    /// One flat array per non-input layer, `node_counts[l+1] * node_counts[l]` long
    pub weights: Vec<Vec<f32>>,
    /// One flat array per non-input layer, `node_counts[l+1]` long
    pub biases: Vec<Vec<f32>>,
}

impl Genome {
    /// Layer sizes including input and output.
    pub fn node_counts(&self) -> Vec<usize> {
        let mut counts = Vec::with_capacity(self.hidden_counts.len() + 2);
        counts.push(self.input_count);
        counts.extend_from_slice(&self.hidden_counts);
        counts.push(self.output_count);
        counts
    }

    /// Create a genome with uniformly random parameters in `±MAX_WEIGHT`.
    pub fn new_random<R: Rng>(
        rng: &mut R,
        input_count: usize,
        hidden_counts: &[usize],
        output_count: usize,
    ) -> Self {
        let mut genome = Self {
            id: Uuid::new_v4().to_string(),
            generation: 0,
            input_count,
            hidden_counts: hidden_counts.to_vec(),
            output_count,
            weights: Vec::new(),
            biases: Vec::new(),
        };

        let counts = genome.node_counts();
        for l in 1..counts.len() {
            let weights = (0..counts[l] * counts[l - 1])
                .map(|_| rng.gen_range(-MAX_WEIGHT..=MAX_WEIGHT))
                .collect();
            let biases = (0..counts[l])
                .map(|_| rng.gen_range(-MAX_WEIGHT..=MAX_WEIGHT))
                .collect();
            genome.weights.push(weights);
            genome.biases.push(biases);
        }

        genome
    }

    /// Check the layer-size invariant.
    pub fn validate_shape(&self) -> Result<(), BrainError> {
        let counts = self.node_counts();
        if counts.iter().any(|&n| n == 0) {
            return Err(BrainError::ConstructionFailure(format!(
                "zero-sized layer in {:?}",
                counts
            )));
        }
        if self.weights.len() != counts.len() - 1 || self.biases.len() != counts.len() - 1 {
            return Err(BrainError::ConstructionFailure(format!(
                "expected {} parameter layers, found {} weight / {} bias",
                counts.len() - 1,
                self.weights.len(),
                self.biases.len()
            )));
        }
        for l in 1..counts.len() {
            if self.weights[l - 1].len() != counts[l] * counts[l - 1] {
                return Err(BrainError::ConstructionFailure(format!(
                    "layer {} weight count {} != {}x{}",
                    l,
                    self.weights[l - 1].len(),
                    counts[l],
                    counts[l - 1]
                )));
            }
            if self.biases[l - 1].len() != counts[l] {
                return Err(BrainError::ConstructionFailure(format!(
                    "layer {} bias count {} != {}",
                    l,
                    self.biases[l - 1].len(),
                    counts[l]
                )));
            }
        }
        Ok(())
    }

    /// Copy this genome into a next-generation child and mutate it.
    pub fn clone_as_child<R: Rng>(&self, rng: &mut R, mutation_rate: f32) -> Self {
        let mut child = self.clone();
        child.id = Uuid::new_v4().to_string();
        child.generation = self.generation + 1;
        child.mutate(rng, mutation_rate);
        child
    }

    /// Apply random mutation events.
    ///
    /// The event-count curve is reproduced as-is from the evolved-genome
    /// lineage this engine is compatible with; do not "fix" it.
    pub fn mutate<R: Rng>(&mut self, rng: &mut R, mutation_rate: f32) {
        let weight_events = (2.0 + 3.0 * mutation_rate) as usize;
        for _ in 0..weight_events {
            let layer = rng.gen_range(0..self.weights.len());
            let idx = rng.gen_range(0..self.weights[layer].len());
            self.weights[layer][idx] = mutate_scalar(rng, self.weights[layer][idx]);
        }

        let bias_denominator = (12 - (2.0 + 6.0 * mutation_rate) as i64).max(1);
        if rng.gen_range(0..bias_denominator) == 0 {
            let layer = rng.gen_range(0..self.biases.len());
            let idx = rng.gen_range(0..self.biases[layer].len());
            self.biases[layer][idx] = mutate_scalar(rng, self.biases[layer][idx]);
        }
    }

    /// Recombine two genomes of identical topology into two children.
    ///
    /// Flattened weights and flattened biases are each split at a single
    /// shared random fraction; a split point mid-layer is legal because
    /// reconstitution slices purely by flat element count.
    pub fn crossover<R: Rng>(
        rng: &mut R,
        a: &Genome,
        b: &Genome,
        mutation_rate: f32,
    ) -> Result<(Genome, Genome), BrainError> {
        if a.node_counts() != b.node_counts() {
            log::warn!(
                "crossover aborted: topology mismatch {:?} vs {:?}",
                a.node_counts(),
                b.node_counts()
            );
            return Err(BrainError::StructuralMismatch {
                left: a.node_counts(),
                right: b.node_counts(),
            });
        }

        let flat_w_a: Vec<f32> = a.weights.iter().flatten().copied().collect();
        let flat_w_b: Vec<f32> = b.weights.iter().flatten().copied().collect();
        let flat_b_a: Vec<f32> = a.biases.iter().flatten().copied().collect();
        let flat_b_b: Vec<f32> = b.biases.iter().flatten().copied().collect();

        let fraction: f32 = rng.gen_range(0.0..=1.0);
        let w_split = (fraction * flat_w_a.len() as f32) as usize;
        let b_split = (fraction * flat_b_a.len() as f32) as usize;

        let child_w_1 = splice(&flat_w_a, &flat_w_b, w_split);
        let child_w_2 = splice(&flat_w_b, &flat_w_a, w_split);
        let child_b_1 = splice(&flat_b_a, &flat_b_b, b_split);
        let child_b_2 = splice(&flat_b_b, &flat_b_a, b_split);

        let generation = a.generation.max(b.generation) + 1;
        let mut first = a.reshaped(child_w_1, child_b_1, generation);
        let mut second = a.reshaped(child_w_2, child_b_2, generation);
        first.mutate(rng, mutation_rate);
        second.mutate(rng, mutation_rate);

        Ok((first, second))
    }

    /// Rebuild per-layer nesting from flat parameter arrays.
    fn reshaped(&self, flat_weights: Vec<f32>, flat_biases: Vec<f32>, generation: u32) -> Genome {
        let counts = self.node_counts();
        let mut weights = Vec::with_capacity(counts.len() - 1);
        let mut biases = Vec::with_capacity(counts.len() - 1);
        let mut w_cursor = 0;
        let mut b_cursor = 0;
        for l in 1..counts.len() {
            let w_len = counts[l] * counts[l - 1];
            weights.push(flat_weights[w_cursor..w_cursor + w_len].to_vec());
            w_cursor += w_len;
            biases.push(flat_biases[b_cursor..b_cursor + counts[l]].to_vec());
            b_cursor += counts[l];
        }

        Genome {
            id: Uuid::new_v4().to_string(),
            generation,
            input_count: self.input_count,
            hidden_counts: self.hidden_counts.clone(),
            output_count: self.output_count,
            weights,
            biases,
        }
    }

    /// Serialize to the stable JSON schema.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from the stable JSON schema.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Load an ordered pool of seed genomes from a JSON array file.
    pub fn load_pool<P: AsRef<Path>>(path: P) -> Result<Vec<Genome>, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)?;
        let pool: Vec<Genome> = serde_json::from_str(&contents)?;
        for genome in &pool {
            genome.validate_shape()?;
        }
        Ok(pool)
    }
}

/// Head of `first` up to `split`, tail of `second` from `split`.
fn splice(first: &[f32], second: &[f32], split: usize) -> Vec<f32> {
    let mut out = Vec::with_capacity(first.len());
    out.extend_from_slice(&first[..split]);
    out.extend_from_slice(&second[split..]);
    out
}

/// Replace one parameter with a mutated value.
///
/// Six equally likely outcomes: halve, double (clamped), fresh random, or
/// (three of six) a bounded nudge. Most mutations are small perturbations,
/// a few are large resets.
pub fn mutate_scalar<R: Rng>(rng: &mut R, value: f32) -> f32 {
    match rng.gen_range(0..6) {
        0 => value * 0.5,
        1 => (value * 2.0).clamp(-MAX_WEIGHT, MAX_WEIGHT),
        2 => rng.gen_range(-MAX_WEIGHT..=MAX_WEIGHT),
        _ => {
            let magnitude = rng.gen_range(0.25 * MAX_WEIGHT..=0.5 * MAX_WEIGHT);
            let delta = if rng.gen_bool(0.5) { magnitude } else { -magnitude };
            (value + delta).clamp(-MAX_WEIGHT, MAX_WEIGHT)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(7)
    }

    #[test]
    fn test_random_genome_shape() {
        let mut rng = rng();
        let genome = Genome::new_random(&mut rng, 30, &[14, 8], 8);

        assert!(genome.validate_shape().is_ok());
        assert_eq!(genome.node_counts(), vec![30, 14, 8, 8]);
        assert_eq!(genome.weights[0].len(), 14 * 30);
        assert_eq!(genome.biases[2].len(), 8);
        assert!(genome
            .weights
            .iter()
            .flatten()
            .all(|w| w.abs() <= MAX_WEIGHT));
    }

    #[test]
    fn test_shape_survives_heavy_mutation() {
        let mut rng = rng();
        let mut genome = Genome::new_random(&mut rng, 28, &[10], 8);

        for _ in 0..500 {
            genome.mutate(&mut rng, 1.0);
        }

        assert!(genome.validate_shape().is_ok());
    }

    #[test]
    fn test_mutate_scalar_stays_bounded() {
        let mut rng = rng();
        for _ in 0..2000 {
            let start = rng.gen_range(-MAX_WEIGHT..=MAX_WEIGHT);
            let mutated = mutate_scalar(&mut rng, start);
            assert!(
                mutated.abs() <= MAX_WEIGHT,
                "{} mutated out of range to {}",
                start,
                mutated
            );
        }
    }

    #[test]
    fn test_clone_as_child_advances_generation() {
        let mut rng = rng();
        let parent = Genome::new_random(&mut rng, 30, &[12], 8);
        let child = parent.clone_as_child(&mut rng, 0.5);

        assert_eq!(child.generation, parent.generation + 1);
        assert_ne!(child.id, parent.id);
        assert_eq!(child.node_counts(), parent.node_counts());
        assert!(child.validate_shape().is_ok());
        // Mutation rate 0.5 guarantees at least 3 weight events
        assert_ne!(child.weights, parent.weights);
    }

    #[test]
    fn test_crossover_is_single_point_interleaving() {
        let mut rng = rng();
        let a = Genome::new_random(&mut rng, 28, &[6], 8);
        let b = Genome::new_random(&mut rng, 28, &[6], 8);

        // Mutation rate 0 still applies 2 weight events, so compare with a
        // tolerance: all but a handful of elements must come from exactly
        // one shared split of the parents.
        let (c1, c2) = Genome::crossover(&mut rng, &a, &b, 0.0).unwrap();

        let flat = |g: &Genome| -> Vec<f32> {
            g.weights
                .iter()
                .flatten()
                .chain(g.biases.iter().flatten())
                .copied()
                .collect()
        };
        let (fa, fb, f1, f2) = (flat(&a), flat(&b), flat(&c1), flat(&c2));

        // Find a split point where c1 = head(a) ++ tail(b), modulo the two
        // post-crossover weight mutation events per child.
        let matches_split = |child: &[f32], head: &[f32], tail: &[f32]| -> bool {
            (0..=child.len()).any(|split| {
                let mismatches = child
                    .iter()
                    .enumerate()
                    .filter(|(i, v)| {
                        let parent = if *i < split { head[*i] } else { tail[*i] };
                        **v != parent
                    })
                    .count();
                mismatches <= 3
            })
        };

        assert!(matches_split(&f1, &fa, &fb));
        assert!(matches_split(&f2, &fb, &fa));
        assert!(c1.validate_shape().is_ok());
        assert!(c2.validate_shape().is_ok());
        assert_eq!(c1.generation, a.generation.max(b.generation) + 1);
    }

    #[test]
    fn test_crossover_rejects_mismatched_topologies() {
        let mut rng = rng();
        let a = Genome::new_random(&mut rng, 28, &[6], 8);
        let b = Genome::new_random(&mut rng, 28, &[7], 8);
        let a_before = a.clone();
        let b_before = b.clone();

        let result = Genome::crossover(&mut rng, &a, &b, 0.5);

        assert!(matches!(
            result,
            Err(BrainError::StructuralMismatch { .. })
        ));
        // Originals untouched
        assert_eq!(a, a_before);
        assert_eq!(b, b_before);
    }

    #[test]
    fn test_json_roundtrip_is_stable() {
        let mut rng = rng();
        let genome = Genome::new_random(&mut rng, 30, &[4], 8);

        let json = genome.to_json().unwrap();
        assert!(json.contains("\"inputCount\""));
        assert!(json.contains("\"hiddenCounts\""));
        assert!(json.contains("\"outputCount\""));

        let decoded = Genome::from_json(&json).unwrap();
        assert_eq!(decoded, genome);
        // Decode-then-encode is byte-identical
        assert_eq!(decoded.to_json().unwrap(), json);
    }
}
