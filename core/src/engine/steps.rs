use rand::{rngs::StdRng, Rng, SeedableRng};
use std::collections::VecDeque;
use std::ops::RangeInclusive;

/// Wear applied to engine health and tire wear per tick, drawn independently.
pub const WEAR_STEP_RANGE: RangeInclusive<u8> = 2..=3;
/// Instantaneous speed sample, both bounds inclusive.
pub const SPEED_RANGE_KMH: RangeInclusive<u16> = 0..=120;

/// Source of the per-tick random draws.
pub trait StepSource: Send {
    fn wear_step(&mut self) -> u8;
    fn speed_kmh(&mut self) -> u16;
}

/// Uniform draws from a seedable generator.
pub struct RandomSteps {
    rng: StdRng,
}

impl RandomSteps {
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl StepSource for RandomSteps {
    fn wear_step(&mut self) -> u8 {
        self.rng.gen_range(WEAR_STEP_RANGE)
    }

    fn speed_kmh(&mut self) -> u16 {
        self.rng.gen_range(SPEED_RANGE_KMH)
    }
}

/// Replays fixed sequences, falling back to constants once exhausted.
///
/// Values outside the documented ranges are clamped into them.
#[derive(Debug, Clone)]
pub struct ScriptedSteps {
    wear: VecDeque<u8>,
    speeds: VecDeque<u16>,
    fallback_wear: u8,
    fallback_speed: u16,
}

impl Default for ScriptedSteps {
    fn default() -> Self {
        Self {
            wear: VecDeque::new(),
            speeds: VecDeque::new(),
            fallback_wear: *WEAR_STEP_RANGE.start(),
            fallback_speed: 0,
        }
    }
}

impl ScriptedSteps {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_wear(mut self, steps: impl IntoIterator<Item = u8>) -> Self {
        self.wear.extend(steps);
        self
    }

    pub fn with_speeds(mut self, speeds: impl IntoIterator<Item = u16>) -> Self {
        self.speeds.extend(speeds);
        self
    }

    pub fn fallback_wear(mut self, step: u8) -> Self {
        self.fallback_wear = step;
        self
    }

    pub fn fallback_speed(mut self, kmh: u16) -> Self {
        self.fallback_speed = kmh;
        self
    }
}

impl StepSource for ScriptedSteps {
    fn wear_step(&mut self) -> u8 {
        let step = self.wear.pop_front().unwrap_or(self.fallback_wear);
        step.clamp(*WEAR_STEP_RANGE.start(), *WEAR_STEP_RANGE.end())
    }

    fn speed_kmh(&mut self) -> u16 {
        let speed = self.speeds.pop_front().unwrap_or(self.fallback_speed);
        speed.min(*SPEED_RANGE_KMH.end())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_steps_stay_in_range() {
        let mut steps = RandomSteps::seeded(7);
        for _ in 0..500 {
            assert!(WEAR_STEP_RANGE.contains(&steps.wear_step()));
            assert!(SPEED_RANGE_KMH.contains(&steps.speed_kmh()));
        }
    }

    #[test]
    fn seeded_steps_repeat() {
        let mut a = RandomSteps::seeded(42);
        let mut b = RandomSteps::seeded(42);
        let left: Vec<_> = (0..16).map(|_| a.speed_kmh()).collect();
        let right: Vec<_> = (0..16).map(|_| b.speed_kmh()).collect();
        assert_eq!(left, right);
    }

    #[test]
    fn scripted_steps_replay_then_fall_back() {
        let mut steps = ScriptedSteps::new()
            .with_wear([3, 9])
            .with_speeds([105])
            .fallback_speed(40);
        assert_eq!(steps.wear_step(), 3);
        assert_eq!(steps.wear_step(), 3);
        assert_eq!(steps.wear_step(), 2);
        assert_eq!(steps.speed_kmh(), 105);
        assert_eq!(steps.speed_kmh(), 40);
    }
}
