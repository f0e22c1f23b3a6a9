//! Error kinds for genome and neural-net operations.

use std::fmt;

/// Failures raised by the cognition engine.
///
/// None of these are fatal to the simulation: each is contained to the
/// single genome, biot, or operation involved, and there is no retry
/// policy because all of them are deterministic structural failures.
#[derive(Debug, Clone, PartialEq)]
pub enum BrainError {
    /// Crossover attempted between incompatible topologies. The operation
    /// is aborted and the caller keeps the original genomes unchanged.
    StructuralMismatch {
        left: Vec<usize>,
        right: Vec<usize>,
    },
    /// Inference called with the wrong input length.
    ShapeMismatch { expected: usize, found: usize },
    /// An inference output left the safe range; the whole output vector
    /// was zeroed and the net flagged.
    NumericInstability { value: f32 },
    /// A genome with invalid layer sizes cannot be built into a net.
    ConstructionFailure(String),
}

impl fmt::Display for BrainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StructuralMismatch { left, right } => {
                write!(f, "incompatible topologies: {:?} vs {:?}", left, right)
            }
            Self::ShapeMismatch { expected, found } => {
                write!(f, "input length mismatch: expected {}, found {}", expected, found)
            }
            Self::NumericInstability { value } => {
                write!(f, "inference output out of safe range: {}", value)
            }
            Self::ConstructionFailure(msg) => write!(f, "invalid genome structure: {}", msg),
        }
    }
}

impl std::error::Error for BrainError {}
