//! Interoceptive senses: the biot's internal state as network inputs.

use crate::buffer::RunningBuffer;

/// Which fixed channel layout the sense vector emits.
///
/// Two historical layouts exist in evolved-genome lineages and are pinned
/// by configuration (`NeuralConfig::input_count`), never inferred.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SenseLayout {
    /// 10 interoceptive channels (28 total inputs with 6x3 vision);
    /// predates the on-mud and progress channels.
    Compact,
    /// 12 interoceptive channels (30 total inputs).
    Extended,
}

impl SenseLayout {
    /// Resolve the layout from the configured total input count.
    pub fn from_input_count(input_count: usize) -> Option<Self> {
        match input_count {
            28 => Some(Self::Compact),
            30 => Some(Self::Extended),
            _ => None,
        }
    }

    pub fn channel_count(self) -> usize {
        match self {
            Self::Compact => 10,
            Self::Extended => 12,
        }
    }
}

/// Raw sense readings for one tick.
#[derive(Clone, Copy, Debug, Default)]
pub struct SenseSample {
    pub health: f32,
    pub energy_ratio: f32,
    pub hydration_ratio: f32,
    pub stamina: f32,
    pub pregnant: bool,
    pub on_food: bool,
    pub on_water: bool,
    pub on_mud: bool,
    /// Fraction of gestation elapsed toward the next spawn
    pub progress: f32,
    pub age: u64,
    pub normalized_age: f32,
}

/// Assembled sense vector with per-channel smoothing.
///
/// Scalar channels are stored raw; contact flags go through short memory
/// buffers so a single-frame flicker doesn't dominate the signal.
#[derive(Clone, Debug)]
pub struct Senses {
    layout: SenseLayout,
    clock_short_rate: u64,
    clock_long_rate: u64,
    health: f32,
    energy_ratio: f32,
    hydration_ratio: f32,
    stamina: f32,
    pregnant: RunningBuffer<f32>,
    on_food: RunningBuffer<f32>,
    on_water: RunningBuffer<f32>,
    on_mud: RunningBuffer<f32>,
    progress: f32,
    clock_short: f32,
    clock_long: f32,
    normalized_age: f32,
}

impl Senses {
    pub fn new(layout: SenseLayout, clock_short_rate: u64, clock_long_rate: u64) -> Self {
        Self {
            layout,
            clock_short_rate: clock_short_rate.max(2),
            clock_long_rate: clock_long_rate.max(2),
            health: 0.0,
            energy_ratio: 0.0,
            hydration_ratio: 0.0,
            stamina: 0.0,
            pregnant: RunningBuffer::new(4),
            on_food: RunningBuffer::new(3),
            on_water: RunningBuffer::new(3),
            on_mud: RunningBuffer::new(3),
            progress: 0.0,
            clock_short: 0.0,
            clock_long: 0.0,
            normalized_age: 0.0,
        }
    }

    /// Record this tick's readings.
    pub fn set_senses(&mut self, sample: &SenseSample) {
        self.health = sample.health;
        self.energy_ratio = sample.energy_ratio;
        self.hydration_ratio = sample.hydration_ratio;
        self.stamina = sample.stamina;
        self.pregnant.push(if sample.pregnant { 1.0 } else { 0.0 });
        self.on_food.push(if sample.on_food { 1.0 } else { 0.0 });
        self.on_water.push(if sample.on_water { 1.0 } else { 0.0 });
        self.on_mud.push(if sample.on_mud { 1.0 } else { 0.0 });
        self.progress = sample.progress;
        self.clock_short = triangle_wave(sample.age, self.clock_short_rate);
        self.clock_long = triangle_wave(sample.age, self.clock_long_rate);
        self.normalized_age = sample.normalized_age;
    }

    pub fn layout(&self) -> SenseLayout {
        self.layout
    }

    /// Append the sense channels in their fixed layout order.
    pub fn write_inputs(&self, out: &mut Vec<f32>) {
        out.push(self.health);
        out.push(self.energy_ratio);
        out.push(self.hydration_ratio);
        out.push(self.stamina);
        out.push(self.pregnant.average());
        out.push(self.on_food.average());
        out.push(self.on_water.average());
        if self.layout == SenseLayout::Extended {
            out.push(self.on_mud.average());
            out.push(self.progress);
        }
        out.push(self.clock_short);
        out.push(self.clock_long);
        out.push(self.normalized_age);
    }
}

/// Repeating ramp-up/ramp-down signal in [0, 1] with the given period.
/// Gives the network a sense of rhythmic time without an unbounded counter.
pub fn triangle_wave(age: u64, rate: u64) -> f32 {
    let period = rate / 2;
    let mut count = age % rate;
    if count > period {
        count = rate - count;
    }
    count as f32 / period as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_resolution() {
        assert_eq!(SenseLayout::from_input_count(28), Some(SenseLayout::Compact));
        assert_eq!(SenseLayout::from_input_count(30), Some(SenseLayout::Extended));
        assert_eq!(SenseLayout::from_input_count(29), None);
    }

    #[test]
    fn test_triangle_wave_shape() {
        let rate = 100;
        assert_eq!(triangle_wave(0, rate), 0.0);
        assert_eq!(triangle_wave(25, rate), 0.5);
        assert_eq!(triangle_wave(50, rate), 1.0);
        assert_eq!(triangle_wave(75, rate), 0.5);
        assert_eq!(triangle_wave(100, rate), 0.0);
        // Two rates give two frequencies
        assert_eq!(triangle_wave(25, 50), 1.0);
    }

    #[test]
    fn test_channel_counts_per_layout() {
        for (layout, expected) in [(SenseLayout::Compact, 10), (SenseLayout::Extended, 12)] {
            let mut senses = Senses::new(layout, 120, 600);
            senses.set_senses(&SenseSample::default());
            let mut out = Vec::new();
            senses.write_inputs(&mut out);
            assert_eq!(out.len(), expected);
            assert_eq!(layout.channel_count(), expected);
        }
    }

    #[test]
    fn test_contact_flags_are_smoothed() {
        let mut senses = Senses::new(SenseLayout::Extended, 120, 600);

        // One flicker of food contact in a 3-deep memory
        senses.set_senses(&SenseSample {
            on_food: true,
            ..SenseSample::default()
        });
        senses.set_senses(&SenseSample::default());
        senses.set_senses(&SenseSample::default());

        let mut out = Vec::new();
        senses.write_inputs(&mut out);
        let on_food = out[5];
        assert!((on_food - 1.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_scalar_channels_are_raw() {
        let mut senses = Senses::new(SenseLayout::Extended, 120, 600);
        senses.set_senses(&SenseSample {
            health: 0.4,
            energy_ratio: 0.5,
            hydration_ratio: 0.75,
            stamina: 0.9,
            progress: 0.25,
            ..SenseSample::default()
        });

        let mut out = Vec::new();
        senses.write_inputs(&mut out);
        assert_eq!(out[0], 0.4);
        assert_eq!(out[1], 0.5);
        assert_eq!(out[2], 0.75);
        assert_eq!(out[3], 0.9);
        assert_eq!(out[8], 0.25);
    }
}
