//! Raycast vision: turning spatial queries into per-angle color signals.
//!
//! The encoder consumes a narrow [`SpatialQuery`] interface and never
//! fails; zero visibility is a valid, common state.

use crate::buffer::RunningBuffer;
use crate::config::PerceptionConfig;
use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Opaque handle for a body in the world.
pub type BodyId = u64;

/// Physics-category bitmasks for spatial queries.
pub mod category {
    pub const WALL: u32 = 1;
    pub const WATER: u32 = 1 << 1;
    pub const MUD: u32 = 1 << 2;
    pub const BIOT: u32 = 1 << 3;
    pub const FOOD: u32 = 1 << 4;
    pub const ALL: u32 = WALL | WATER | MUD | BIOT | FOOD;

    /// Categories that stop a ray from advancing.
    pub const BLOCKING: u32 = WALL | BIOT;
}

/// One raycast intersection, nearest first in query results.
#[derive(Clone, Copy, Debug)]
pub struct RayHit {
    pub body: BodyId,
    pub point: Vec2,
    pub category: u32,
}

/// Spatial query capability consumed from the world; the encoder depends
/// only on this, not on any specific physics engine.
pub trait SpatialQuery {
    /// All intersections along the segment, ordered near to far, filtered
    /// by category mask.
    fn cast_ray(&self, start: Vec2, end: Vec2, mask: u32) -> Vec<RayHit>;

    /// Bodies whose centers fall within the circle, filtered by mask.
    fn bodies_in_circle(&self, center: Vec2, radius: f32, mask: u32) -> Vec<BodyId>;
}

/// Descriptor for an entity the engine asks the world to create.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum EntityDescriptor {
    Food { position: Vec2, energy: f32 },
}

/// World mutation capability consumed by metabolism (carcass recycling)
/// and the resource homeostat. Mutations must only be applied at the
/// end-of-tick synchronization point.
pub trait WorldMutator {
    fn spawn_entity(&mut self, descriptor: EntityDescriptor) -> BodyId;
    fn remove_entity(&mut self, handle: BodyId);
}

/// Reference color for a hit category.
fn reference_color(category_bits: u32) -> [f32; 3] {
    if category_bits & category::WALL != 0 {
        [1.0, 0.0, 0.0]
    } else if category_bits & category::BIOT != 0 {
        [1.0, 0.0, 1.0]
    } else if category_bits & category::FOOD != 0 {
        [0.0, 1.0, 0.0]
    } else if category_bits & category::WATER != 0 {
        [0.0, 0.0, 1.0]
    } else if category_bits & category::MUD != 0 {
        [0.4, 0.25, 0.1]
    } else {
        [0.0, 0.0, 0.0]
    }
}

/// Per-angle raycast color encoder with temporal smoothing.
#[derive(Clone, Debug)]
pub struct PerceptionEncoder {
    eye_angles: Vec<f32>,
    sub_offsets: Vec<f32>,
    max_distance: f32,
    max_bodies_per_angle: usize,
    /// Short memory, read by the network
    channels: Vec<RunningBuffer<[f32; 3]>>,
    /// Long memory, read by the renderer
    display: Vec<RunningBuffer<[f32; 3]>>,
}

impl PerceptionEncoder {
    pub fn new(config: &PerceptionConfig) -> Self {
        let n = config.eye_angles.max(1);
        let eye_angles = (0..n)
            .map(|i| i as f32 * std::f32::consts::TAU / n as f32)
            .collect();

        // Symmetric offsets around each eye angle, e.g. [-s, 0, s]
        let rays = config.sub_rays.max(1);
        let sub_offsets = (0..rays)
            .map(|i| (i as f32 - (rays - 1) as f32 / 2.0) * config.sub_ray_spread)
            .collect();

        Self {
            eye_angles,
            sub_offsets,
            max_distance: config.max_distance,
            max_bodies_per_angle: config.max_bodies_per_angle.max(1),
            channels: (0..n)
                .map(|_| RunningBuffer::new(config.inference_memory))
                .collect(),
            display: (0..n)
                .map(|_| RunningBuffer::new(config.display_memory))
                .collect(),
        }
    }

    /// Cast this frame's rays and push one smoothed color per eye angle.
    pub fn detect<Q: SpatialQuery>(&mut self, position: Vec2, heading: f32, query: &Q) {
        for angle_idx in 0..self.eye_angles.len() {
            let color = self.sample_angle(angle_idx, position, heading, query);
            self.channels[angle_idx].push(color);
            self.display[angle_idx].push(color);
        }
    }

    fn sample_angle<Q: SpatialQuery>(
        &self,
        angle_idx: usize,
        position: Vec2,
        heading: f32,
        query: &Q,
    ) -> [f32; 3] {
        let mut totals = [0.0f32; 3];
        let mut pings = 0u32;
        let mut counted: Vec<BodyId> = Vec::with_capacity(self.max_bodies_per_angle);

        for &offset in &self.sub_offsets {
            let theta = heading + self.eye_angles[angle_idx] + offset;
            let direction = Vec2::new(theta.cos(), theta.sin());
            let end = position + direction * self.max_distance;

            for hit in query.cast_ray(position, end, category::ALL) {
                let blocking = hit.category & category::BLOCKING != 0;

                if !counted.contains(&hit.body) {
                    if counted.len() < self.max_bodies_per_angle {
                        counted.push(hit.body);
                        let proximity =
                            1.0 - (hit.point.distance(position) / self.max_distance).min(1.0);
                        let color = reference_color(hit.category);
                        totals[0] += color[0] * proximity;
                        totals[1] += color[1] * proximity;
                        totals[2] += color[2] * proximity;
                        pings += 1;
                    }
                }

                // A wall or another biot ends the ray; water, mud, and food
                // keep accumulating behind each other.
                if blocking {
                    break;
                }
            }
        }

        if pings == 0 {
            [0.0; 3]
        } else {
            let scale = 1.0 / pings as f32;
            [totals[0] * scale, totals[1] * scale, totals[2] * scale]
        }
    }

    /// Smoothed per-angle color for inference.
    pub fn smoothed(&self, angle_idx: usize) -> [f32; 3] {
        self.channels[angle_idx].average()
    }

    /// Longer-memory per-angle color for display.
    pub fn display_color(&self, angle_idx: usize) -> [f32; 3] {
        self.display[angle_idx].average()
    }

    pub fn angle_count(&self) -> usize {
        self.eye_angles.len()
    }

    /// Number of input channels this encoder contributes (r, g, b per angle).
    pub fn channel_count(&self) -> usize {
        self.eye_angles.len() * 3
    }

    /// Append the smoothed vision channels, angle-major.
    pub fn write_inputs(&self, out: &mut Vec<f32>) {
        for channel in &self.channels {
            let color = channel.average();
            out.extend_from_slice(&color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PerceptionConfig;

    /// A canned scene: every ray reports the same ordered hit list.
    struct FixedScene {
        hits: Vec<RayHit>,
    }

    impl SpatialQuery for FixedScene {
        fn cast_ray(&self, _start: Vec2, _end: Vec2, mask: u32) -> Vec<RayHit> {
            self.hits
                .iter()
                .filter(|h| h.category & mask != 0)
                .copied()
                .collect()
        }

        fn bodies_in_circle(&self, _center: Vec2, _radius: f32, _mask: u32) -> Vec<BodyId> {
            Vec::new()
        }
    }

    fn config() -> PerceptionConfig {
        PerceptionConfig {
            eye_angles: 6,
            sub_rays: 1,
            sub_ray_spread: 0.0,
            max_distance: 100.0,
            max_bodies_per_angle: 4,
            display_memory: 8,
            inference_memory: 3,
        }
    }

    #[test]
    fn test_empty_scene_reads_zero() {
        let mut encoder = PerceptionEncoder::new(&config());
        let scene = FixedScene { hits: Vec::new() };

        encoder.detect(Vec2::ZERO, 0.0, &scene);

        assert_eq!(encoder.channel_count(), 18);
        for i in 0..encoder.angle_count() {
            assert_eq!(encoder.smoothed(i), [0.0; 3]);
        }
    }

    #[test]
    fn test_proximity_weights_color() {
        let mut encoder = PerceptionEncoder::new(&config());
        // One food body at 3/4 of max distance: proximity 0.25
        let scene = FixedScene {
            hits: vec![RayHit {
                body: 1,
                point: Vec2::new(75.0, 0.0),
                category: category::FOOD,
            }],
        };

        encoder.detect(Vec2::ZERO, 0.0, &scene);

        let color = encoder.smoothed(0);
        assert!((color[1] - 0.25).abs() < 1e-5, "green was {}", color[1]);
        assert_eq!(color[0], 0.0);
        assert_eq!(color[2], 0.0);
    }

    #[test]
    fn test_wall_blocks_but_water_does_not() {
        let mut encoder = PerceptionEncoder::new(&config());
        let scene = FixedScene {
            hits: vec![
                RayHit {
                    body: 1,
                    point: Vec2::new(10.0, 0.0),
                    category: category::WATER,
                },
                RayHit {
                    body: 2,
                    point: Vec2::new(50.0, 0.0),
                    category: category::WALL,
                },
                RayHit {
                    body: 3,
                    point: Vec2::new(60.0, 0.0),
                    category: category::FOOD,
                },
            ],
        };

        encoder.detect(Vec2::ZERO, 0.0, &scene);

        // Water (blue) and wall (red) both counted, food behind the wall
        // never seen.
        let color = encoder.smoothed(0);
        assert!(color[2] > 0.0, "water should contribute");
        assert!(color[0] > 0.0, "wall should contribute");
        assert_eq!(color[1], 0.0, "food behind wall must be invisible");
    }

    #[test]
    fn test_body_count_cap() {
        let hits: Vec<RayHit> = (0..10)
            .map(|i| RayHit {
                body: i,
                point: Vec2::new(10.0 + i as f32, 0.0),
                category: category::FOOD,
            })
            .collect();
        let mut encoder = PerceptionEncoder::new(&config());
        let scene = FixedScene { hits };

        encoder.detect(Vec2::ZERO, 0.0, &scene);

        // Only the 4 nearest count: average green = mean of their proximities
        let expected: f32 = (0..4)
            .map(|i| 1.0 - (10.0 + i as f32) / 100.0)
            .sum::<f32>()
            / 4.0;
        let color = encoder.smoothed(0);
        assert!((color[1] - expected).abs() < 1e-5);
    }

    #[test]
    fn test_smoothing_window() {
        let mut encoder = PerceptionEncoder::new(&config());
        let lit = FixedScene {
            hits: vec![RayHit {
                body: 1,
                point: Vec2::ZERO,
                category: category::FOOD,
            }],
        };
        let dark = FixedScene { hits: Vec::new() };

        encoder.detect(Vec2::ZERO, 0.0, &lit);
        encoder.detect(Vec2::ZERO, 0.0, &dark);
        encoder.detect(Vec2::ZERO, 0.0, &dark);

        // Inference memory 3: one lit frame out of three
        let color = encoder.smoothed(0);
        assert!((color[1] - 1.0 / 3.0).abs() < 1e-5);
    }
}
