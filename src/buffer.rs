//! Fixed-capacity running buffers for temporal signal smoothing.
//!
//! Perception colors, interoceptive senses, and decoded action channels
//! are all read through these buffers rather than raw, which damps
//! single-frame noise before it reaches the network or the body.

use glam::Vec2;

/// Values a running buffer can accumulate and average.
pub trait Blend: Copy {
    fn zero() -> Self;
    fn accumulate(self, other: Self) -> Self;
    fn scale(self, factor: f32) -> Self;
}

impl Blend for f32 {
    fn zero() -> Self {
        0.0
    }
    fn accumulate(self, other: Self) -> Self {
        self + other
    }
    fn scale(self, factor: f32) -> Self {
        self * factor
    }
}

impl Blend for Vec2 {
    fn zero() -> Self {
        Vec2::ZERO
    }
    fn accumulate(self, other: Self) -> Self {
        self + other
    }
    fn scale(self, factor: f32) -> Self {
        self * factor
    }
}

impl Blend for [f32; 3] {
    fn zero() -> Self {
        [0.0; 3]
    }
    fn accumulate(self, other: Self) -> Self {
        [self[0] + other[0], self[1] + other[1], self[2] + other[2]]
    }
    fn scale(self, factor: f32) -> Self {
        [self[0] * factor, self[1] * factor, self[2] * factor]
    }
}

/// Ring buffer over the last `capacity` samples of a signal.
#[derive(Clone, Debug)]
pub struct RunningBuffer<T: Blend> {
    samples: Vec<T>,
    capacity: usize,
    head: usize,
}

impl<T: Blend> RunningBuffer<T> {
    /// Create a buffer holding at most `capacity` samples.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: Vec::with_capacity(capacity),
            capacity,
            head: 0,
        }
    }

    /// Push a sample, evicting the oldest once full.
    pub fn push(&mut self, value: T) {
        if self.samples.len() < self.capacity {
            self.samples.push(value);
        } else {
            self.samples[self.head] = value;
        }
        self.head = (self.head + 1) % self.capacity;
    }

    /// Most recently pushed sample, or zero if empty.
    pub fn latest(&self) -> T {
        if self.samples.is_empty() {
            return T::zero();
        }
        let idx = if self.head == 0 {
            self.samples.len() - 1
        } else {
            self.head - 1
        };
        self.samples[idx]
    }

    /// Average over all held samples, or zero if empty.
    pub fn average(&self) -> T {
        if self.samples.is_empty() {
            return T::zero();
        }
        let sum = self
            .samples
            .iter()
            .fold(T::zero(), |acc, &s| acc.accumulate(s));
        sum.scale(1.0 / self.samples.len() as f32)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
        self.head = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_reads_zero() {
        let buf: RunningBuffer<f32> = RunningBuffer::new(4);
        assert_eq!(buf.latest(), 0.0);
        assert_eq!(buf.average(), 0.0);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_average_partial_fill() {
        let mut buf = RunningBuffer::new(4);
        buf.push(1.0);
        buf.push(3.0);
        assert_eq!(buf.len(), 2);
        assert_eq!(buf.average(), 2.0);
        assert_eq!(buf.latest(), 3.0);
    }

    #[test]
    fn test_eviction_keeps_window() {
        let mut buf = RunningBuffer::new(3);
        for v in [1.0, 2.0, 3.0, 4.0] {
            buf.push(v);
        }
        // 1.0 evicted, window is [2, 3, 4]
        assert_eq!(buf.len(), 3);
        assert_eq!(buf.average(), 3.0);
        assert_eq!(buf.latest(), 4.0);
    }

    #[test]
    fn test_vector_channels() {
        let mut buf = RunningBuffer::new(2);
        buf.push(Vec2::new(1.0, 0.0));
        buf.push(Vec2::new(0.0, 1.0));
        let avg = buf.average();
        assert!((avg.x - 0.5).abs() < 1e-6);
        assert!((avg.y - 0.5).abs() < 1e-6);

        let mut rgb = RunningBuffer::new(2);
        rgb.push([1.0, 0.0, 0.5]);
        assert_eq!(rgb.average(), [1.0, 0.0, 0.5]);
    }

    #[test]
    fn test_zero_capacity_clamped() {
        let mut buf = RunningBuffer::new(0);
        buf.push(7.0);
        buf.push(9.0);
        assert_eq!(buf.len(), 1);
        assert_eq!(buf.latest(), 9.0);
    }
}
