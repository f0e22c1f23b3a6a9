//! Feed-forward inference engine built from a genome.

use crate::config::NeuralConfig;
use crate::error::BrainError;
use crate::genome::Genome;
use ndarray::{Array1, Array2};

/// A single dense layer.
#[derive(Clone, Debug)]
struct Layer {
    /// `(outputs, inputs)` weight matrix
    weights: Array2<f32>,
    biases: Array1<f32>,
}

/// Read-mostly inference engine, built once per genome and owned
/// exclusively by one biot. Hyperbolic tangent on every layer.
#[derive(Clone, Debug)]
pub struct NeuralNet {
    input_count: usize,
    output_count: usize,
    layers: Vec<Layer>,
    check_outputs: bool,
    max_output_value: f32,
    blew_up: bool,
}

impl NeuralNet {
    /// Build a net from a genome. A malformed genome is rejected outright
    /// and never attached to a live biot.
    pub fn build(genome: &Genome, config: &NeuralConfig) -> Result<Self, BrainError> {
        genome.validate_shape()?;

        let counts = genome.node_counts();
        let mut layers = Vec::with_capacity(counts.len() - 1);
        for l in 1..counts.len() {
            let weights =
                Array2::from_shape_vec((counts[l], counts[l - 1]), genome.weights[l - 1].clone())
                    .map_err(|e| BrainError::ConstructionFailure(e.to_string()))?;
            let biases = Array1::from_vec(genome.biases[l - 1].clone());
            layers.push(Layer { weights, biases });
        }

        Ok(Self {
            input_count: genome.input_count,
            output_count: genome.output_count,
            layers,
            check_outputs: config.check_outputs,
            max_output_value: config.max_output_value,
            blew_up: false,
        })
    }

    /// Feed-forward pass.
    ///
    /// A wrong input length aborts before any state changes. When the
    /// output guard trips, the caller receives `NumericInstability` and
    /// should substitute a neutral all-zero action; the sticky `blew_up`
    /// flag marks the biot for diagnostics.
    pub fn infer(&mut self, inputs: &[f32]) -> Result<Vec<f32>, BrainError> {
        if inputs.len() != self.input_count {
            return Err(BrainError::ShapeMismatch {
                expected: self.input_count,
                found: inputs.len(),
            });
        }

        let mut activation = Array1::from_vec(inputs.to_vec());
        for layer in &self.layers {
            activation = layer.weights.dot(&activation) + &layer.biases;
            activation.mapv_inplace(|x| x.tanh());
        }

        if self.check_outputs {
            if let Some(&bad) = activation
                .iter()
                .find(|v| !v.is_finite() || v.abs() > self.max_output_value)
            {
                self.blew_up = true;
                log::warn!("inference output {} outside ±{}, zeroing", bad, self.max_output_value);
                return Err(BrainError::NumericInstability { value: bad });
            }
        }

        Ok(activation.to_vec())
    }

    /// Whether the output guard has ever tripped on this net.
    pub fn blew_up(&self) -> bool {
        self.blew_up
    }

    pub fn input_count(&self) -> usize {
        self.input_count
    }

    pub fn output_count(&self) -> usize {
        self.output_count
    }

    /// Total number of parameters (weights + biases).
    pub fn parameter_count(&self) -> usize {
        self.layers
            .iter()
            .map(|l| l.weights.len() + l.biases.len())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn neural_config() -> NeuralConfig {
        NeuralConfig {
            input_count: 2,
            hidden_counts: vec![],
            output_count: 1,
            check_outputs: true,
            max_output_value: 2.0,
        }
    }

    fn zero_genome(input: usize, hidden: &[usize], output: usize) -> Genome {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut genome = Genome::new_random(&mut rng, input, hidden, output);
        for layer in &mut genome.weights {
            layer.iter_mut().for_each(|w| *w = 0.0);
        }
        for layer in &mut genome.biases {
            layer.iter_mut().for_each(|b| *b = 0.0);
        }
        genome
    }

    #[test]
    fn test_zero_net_outputs_tanh_zero() {
        let genome = zero_genome(2, &[], 1);
        let mut net = NeuralNet::build(&genome, &neural_config()).unwrap();

        let outputs = net.infer(&[1.0, 1.0]).unwrap();
        assert_eq!(outputs, vec![0.0]);
    }

    #[test]
    fn test_outputs_bounded_by_tanh() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let genome = Genome::new_random(&mut rng, 30, &[14], 8);
        let mut net = NeuralNet::build(&genome, &NeuralConfig::default()).unwrap();

        let outputs = net.infer(&[0.5; 30]).unwrap();
        assert_eq!(outputs.len(), 8);
        assert!(outputs.iter().all(|v| v.abs() <= 1.0));
        assert!(!net.blew_up());
    }

    #[test]
    fn test_wrong_input_length_is_shape_mismatch() {
        let genome = zero_genome(2, &[], 1);
        let mut net = NeuralNet::build(&genome, &neural_config()).unwrap();

        let err = net.infer(&[1.0, 1.0, 1.0]).unwrap_err();
        assert_eq!(
            err,
            BrainError::ShapeMismatch {
                expected: 2,
                found: 3
            }
        );
        assert!(!net.blew_up());

        // State untouched: a correct call still works
        assert_eq!(net.infer(&[1.0, 1.0]).unwrap(), vec![0.0]);
    }

    #[test]
    fn test_poisoned_genome_trips_guard() {
        let mut genome = zero_genome(2, &[], 1);
        genome.weights[0][0] = f32::NAN;
        let mut net = NeuralNet::build(&genome, &neural_config()).unwrap();

        let err = net.infer(&[1.0, 1.0]).unwrap_err();
        assert!(matches!(err, BrainError::NumericInstability { .. }));
        assert!(net.blew_up());
    }

    #[test]
    fn test_malformed_genome_rejected() {
        let mut genome = zero_genome(2, &[3], 1);
        genome.weights[0].pop();
        assert!(matches!(
            NeuralNet::build(&genome, &neural_config()),
            Err(BrainError::ConstructionFailure(_))
        ));

        let empty = Genome {
            hidden_counts: vec![0],
            ..zero_genome(2, &[], 1)
        };
        assert!(NeuralNet::build(&empty, &neural_config()).is_err());
    }
}
