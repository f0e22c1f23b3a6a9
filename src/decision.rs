//! Decoding raw network outputs into smoothed action signals.
//!
//! Consumers read averaged values rather than instantaneous ones, which
//! gives biot behavior its characteristic inertia and keeps single-frame
//! network jitter from causing erratic motion.

use crate::buffer::RunningBuffer;
use glam::Vec2;

/// Fixed width of the action output vector.
pub const OUTPUT_COUNT: usize = 8;

/// Positional meaning of the 8 outputs:
/// 0-1 differential thrust (left/right), 2-4 body color, 5 speed boost,
/// 6 weapon, 7 armor.
#[derive(Clone, Debug)]
pub struct Decision {
    thrust: RunningBuffer<Vec2>,
    color: RunningBuffer<[f32; 3]>,
    speed_boost: RunningBuffer<f32>,
    weapon: RunningBuffer<f32>,
    armor: RunningBuffer<f32>,
}

impl Default for Decision {
    fn default() -> Self {
        Self::new()
    }
}

impl Decision {
    pub fn new() -> Self {
        Self {
            thrust: RunningBuffer::new(3),
            // Display channel; longer memory than the action channels
            color: RunningBuffer::new(8),
            speed_boost: RunningBuffer::new(3),
            weapon: RunningBuffer::new(3),
            armor: RunningBuffer::new(3),
        }
    }

    /// Push one 8-wide output vector into the channel buffers.
    ///
    /// Color channels are remapped from [-1, 1] to [0, 1]; the three
    /// triggers are thresholded at 0.5 before entering their buffers.
    pub fn decode(&mut self, outputs: &[f32]) {
        if outputs.len() != OUTPUT_COUNT {
            log::error!("decision decode expects {} outputs, got {}", OUTPUT_COUNT, outputs.len());
            return;
        }

        self.thrust.push(Vec2::new(outputs[0], outputs[1]));
        self.color.push([
            (outputs[2] + 1.0) / 2.0,
            (outputs[3] + 1.0) / 2.0,
            (outputs[4] + 1.0) / 2.0,
        ]);
        self.speed_boost.push(threshold(outputs[5]));
        self.weapon.push(threshold(outputs[6]));
        self.armor.push(threshold(outputs[7]));
    }

    /// Smoothed differential thrust `(left, right)`.
    pub fn thrust(&self) -> Vec2 {
        self.thrust.average()
    }

    /// Smoothed display color.
    pub fn color(&self) -> [f32; 3] {
        self.color.average()
    }

    pub fn speed_boost(&self) -> bool {
        self.speed_boost.average() >= 0.5
    }

    pub fn weapon(&self) -> bool {
        self.weapon.average() >= 0.5
    }

    pub fn armor(&self) -> bool {
        self.armor.average() >= 0.5
    }

    /// Armor activation level in [0, 1], used for cost accounting.
    pub fn armor_level(&self) -> f32 {
        self.armor.average()
    }

    /// Magnitude of exerted thrust, used for movement cost accounting.
    pub fn exertion(&self) -> f32 {
        self.thrust.average().length()
    }
}

fn threshold(value: f32) -> f32 {
    if value > 0.5 {
        1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_reference_vector() {
        let mut decision = Decision::new();
        decision.decode(&[0.0, 0.0, 1.0, -1.0, 0.0, 0.6, 0.4, 0.51]);

        assert_eq!(decision.thrust(), Vec2::new(0.0, 0.0));
        assert_eq!(decision.color(), [1.0, 0.0, 0.5]);
        assert!(decision.speed_boost());
        assert!(!decision.weapon());
        assert!(decision.armor());
    }

    #[test]
    fn test_threshold_boundary_is_exclusive() {
        let mut decision = Decision::new();
        decision.decode(&[0.0, 0.0, 0.0, 0.0, 0.0, 0.5, 0.5, 0.5]);

        // Exactly 0.5 does not trigger
        assert!(!decision.speed_boost());
        assert!(!decision.weapon());
        assert!(!decision.armor());
    }

    #[test]
    fn test_triggers_are_smoothed_over_window() {
        let mut decision = Decision::new();
        decision.decode(&[0.0; 8]);
        decision.decode(&[0.0, 0.0, 0.0, 0.0, 0.0, 0.9, 0.0, 0.0]);
        decision.decode(&[0.0; 8]);

        // 1 active frame out of 3: below the activation threshold
        assert!(!decision.speed_boost());

        decision.decode(&[0.0, 0.0, 0.0, 0.0, 0.0, 0.9, 0.0, 0.0]);
        decision.decode(&[0.0, 0.0, 0.0, 0.0, 0.0, 0.9, 0.0, 0.0]);
        // 2 of the last 3 frames active
        assert!(decision.speed_boost());
    }

    #[test]
    fn test_thrust_inertia() {
        let mut decision = Decision::new();
        decision.decode(&[1.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        decision.decode(&[0.0; 8]);
        decision.decode(&[0.0; 8]);

        // Thrust decays through the window instead of dropping instantly
        let thrust = decision.thrust();
        assert!((thrust.x - 1.0 / 3.0).abs() < 1e-6);
        assert!(decision.exertion() > 0.0);
    }

    #[test]
    fn test_wrong_width_ignored() {
        let mut decision = Decision::new();
        decision.decode(&[1.0, 1.0, 1.0]);
        assert_eq!(decision.thrust(), Vec2::ZERO);
    }
}
