//! Randomness used by the engine: draw rolls and marker jitter.

use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub trait RandomSource: Send {
    /// Uniform in `[0, 100)`.
    fn percent(&mut self) -> f64;

    /// Uniform in `[-half_width, half_width)`; zero for a non-positive width.
    fn offset(&mut self, half_width: f64) -> f64;
}

/// Adapter from any [`rand::Rng`].
#[derive(Debug, Clone)]
pub struct RngSource<R> {
    rng: R,
}

impl<R> RngSource<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RngSource<StdRng> {
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }

    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng + Send> RandomSource for RngSource<R> {
    fn percent(&mut self) -> f64 {
        self.rng.gen_range(0.0..100.0)
    }

    fn offset(&mut self, half_width: f64) -> f64 {
        if half_width <= 0.0 {
            return 0.0;
        }
        self.rng.gen_range(-half_width..half_width)
    }
}

/// Replays fixed percentage rolls, then repeats the last one (or 0.0).
/// Offsets are always zero so marker positions are exact.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSource {
    percents: VecDeque<f64>,
    last: f64,
    consumed: usize,
}

impl ScriptedSource {
    pub fn new(percents: impl IntoIterator<Item = f64>) -> Self {
        Self {
            percents: percents.into_iter().collect(),
            last: 0.0,
            consumed: 0,
        }
    }

    pub fn percents_consumed(&self) -> usize {
        self.consumed
    }
}

impl RandomSource for ScriptedSource {
    fn percent(&mut self) -> f64 {
        self.consumed += 1;
        if let Some(next) = self.percents.pop_front() {
            self.last = next;
        }
        self.last
    }

    fn offset(&mut self, _half_width: f64) -> f64 {
        0.0
    }
}
