//! Decibel sources
//!
//! The random walk is test data, not acoustic measurement. The engine only sees the
//! [`DecibelSource`] trait so a real sensor can stand in for it.

use std::collections::VecDeque;

use chrono::{DateTime, Local};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

pub const MIN_DB: u8 = 30;
pub const MAX_DB: u8 = 120;
/// Value every fresh simulator starts from
pub const INITIAL_DB: u8 = 40;
/// Largest change between two consecutive readings
pub const DEFAULT_MAX_STEP_DB: f64 = 4.0;

/// One decibel sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Reading {
    pub value: u8,
    pub timestamp: DateTime<Local>,
}

impl Reading {
    pub fn new(value: u8, timestamp: DateTime<Local>) -> Self {
        Self {
            value: value.clamp(MIN_DB, MAX_DB),
            timestamp,
        }
    }
}

/// Anything that yields decibel readings on demand
pub trait DecibelSource: Send {
    /// Last produced value, without advancing
    fn current(&self) -> u8;

    /// Advance one tick and return the new reading
    fn next_reading(&mut self, now: DateTime<Local>) -> Reading;
}

/// Bounded random walk: `clamp(prev + uniform(-step, step), 30, 120)`, rounded
pub struct RandomWalkSimulator<R = StdRng> {
    value: u8,
    max_step: f64,
    rng: R,
}

impl RandomWalkSimulator<StdRng> {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Deterministic walk for reproducible runs
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }
}

impl Default for RandomWalkSimulator<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> RandomWalkSimulator<R> {
    pub fn with_rng(rng: R) -> Self {
        Self {
            value: INITIAL_DB,
            max_step: DEFAULT_MAX_STEP_DB,
            rng,
        }
    }

    pub fn with_max_step(mut self, max_step: f64) -> Self {
        self.max_step = max_step.abs();
        self
    }

    fn step(&mut self) -> u8 {
        let delta = if self.max_step > 0.0 {
            self.rng.gen_range(-self.max_step..=self.max_step)
        } else {
            0.0
        };
        let next = (f64::from(self.value) + delta).clamp(f64::from(MIN_DB), f64::from(MAX_DB));
        next.round() as u8
    }
}

impl<R: Rng + Send> DecibelSource for RandomWalkSimulator<R> {
    fn current(&self) -> u8 {
        self.value
    }

    fn next_reading(&mut self, now: DateTime<Local>) -> Reading {
        self.value = self.step();
        Reading::new(self.value, now)
    }
}

/// Plays back a fixed sequence, then holds the last value
#[derive(Debug, Clone)]
pub struct ReplaySource {
    pending: VecDeque<u8>,
    value: u8,
}

impl ReplaySource {
    pub fn new(values: impl IntoIterator<Item = u8>) -> Self {
        Self {
            pending: values.into_iter().collect(),
            value: INITIAL_DB,
        }
    }

    /// Start from `initial` instead of the simulator default
    pub fn starting_at(mut self, initial: u8) -> Self {
        self.value = initial.clamp(MIN_DB, MAX_DB);
        self
    }

    pub fn remaining(&self) -> usize {
        self.pending.len()
    }
}

impl DecibelSource for ReplaySource {
    fn current(&self) -> u8 {
        self.value
    }

    fn next_reading(&mut self, now: DateTime<Local>) -> Reading {
        if let Some(next) = self.pending.pop_front() {
            self.value = next.clamp(MIN_DB, MAX_DB);
        }
        Reading::new(self.value, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_walk_starts_at_initial_value() {
        let sim = RandomWalkSimulator::seeded(7);
        assert_eq!(sim.current(), INITIAL_DB);
    }

    #[test]
    fn test_walk_stays_bounded_and_steps_are_small() {
        let mut sim = RandomWalkSimulator::seeded(42);
        let mut prev = sim.current();
        for _ in 0..10_000 {
            let reading = sim.next_reading(Local::now());
            assert!((MIN_DB..=MAX_DB).contains(&reading.value));
            assert!(reading.value.abs_diff(prev) <= 4);
            prev = reading.value;
        }
    }

    #[test]
    fn test_seeded_walks_are_reproducible() {
        let now = Local::now();
        let mut a = RandomWalkSimulator::seeded(99);
        let mut b = RandomWalkSimulator::seeded(99);
        for _ in 0..50 {
            assert_eq!(a.next_reading(now).value, b.next_reading(now).value);
        }
    }

    #[test]
    fn test_walk_clamps_large_steps() {
        let mut still = RandomWalkSimulator::seeded(1).with_max_step(0.0);
        assert_eq!(still.next_reading(Local::now()).value, INITIAL_DB);

        let mut wild = RandomWalkSimulator::seeded(1).with_max_step(500.0);
        let values: Vec<u8> = (0..200)
            .map(|_| wild.next_reading(Local::now()).value)
            .collect();
        assert!(values.iter().all(|v| (MIN_DB..=MAX_DB).contains(v)));
        assert!(values.contains(&MIN_DB) || values.contains(&MAX_DB));
    }

    #[test]
    fn test_replay_holds_last_value() {
        let now = Local::now();
        let mut replay = ReplaySource::new([50, 200, 10]);
        assert_eq!(replay.current(), INITIAL_DB);
        assert_eq!(replay.next_reading(now).value, 50);
        assert_eq!(replay.next_reading(now).value, MAX_DB);
        assert_eq!(replay.next_reading(now).value, MIN_DB);
        assert_eq!(replay.remaining(), 0);
        assert_eq!(replay.next_reading(now).value, MIN_DB);
    }
}
