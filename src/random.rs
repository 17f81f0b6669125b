//! Injectable randomness for the estimated report fields.
//!
//! Estimation code never touches a global generator. It takes a
//! `&dyn RandomSource`, so tests can script every draw.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Source of uniformly distributed integers.
pub trait RandomSource: Send + Sync {
    /// Returns an integer in `[low, high]`, both ends inclusive.
    fn int_in(&self, low: i64, high: i64) -> i64;
}

/// Fair coin: `true` when the draw from `[0, 1]` is 1.
pub fn coin_flip(rng: &dyn RandomSource) -> bool {
    rng.int_in(0, 1) == 1
}

/// Uniform choice from a slice. `None` for an empty slice.
pub fn choose<'a, T>(rng: &dyn RandomSource, items: &'a [T]) -> Option<&'a T> {
    if items.is_empty() {
        return None;
    }
    let idx = rng.int_in(0, items.len() as i64 - 1) as usize;
    items.get(idx)
}

/// Draws `k` distinct items without replacement, in draw order.
///
/// Partial Fisher-Yates over the item indices: draw `i` picks from the
/// not-yet-chosen tail `[i, len)`.
pub fn sample<T: Clone>(rng: &dyn RandomSource, items: &[T], k: usize) -> Vec<T> {
    let mut indices: Vec<usize> = (0..items.len()).collect();
    let k = k.min(items.len());

    for i in 0..k {
        let j = rng.int_in(i as i64, items.len() as i64 - 1) as usize;
        indices.swap(i, j);
    }

    indices[..k].iter().map(|&i| items[i].clone()).collect()
}

/// Production source backed by an entropy-seeded `StdRng`.
pub struct ThreadRandom {
    rng: Mutex<StdRng>,
}

impl ThreadRandom {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }
}

impl Default for ThreadRandom {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomSource for ThreadRandom {
    fn int_in(&self, low: i64, high: i64) -> i64 {
        if high <= low {
            return low;
        }
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        rng.gen_range(low..=high)
    }
}

/// Replays a fixed sequence of draws.
///
/// Each value is clamped into the requested range. Once the script runs
/// out every draw returns `low`.
pub struct ScriptedRandom {
    values: Mutex<VecDeque<i64>>,
}

impl ScriptedRandom {
    pub fn new(values: impl IntoIterator<Item = i64>) -> Self {
        Self {
            values: Mutex::new(values.into_iter().collect()),
        }
    }

    /// A source whose every draw is the lower bound.
    pub fn lowest() -> Self {
        Self::new(std::iter::empty())
    }
}

impl RandomSource for ScriptedRandom {
    fn int_in(&self, low: i64, high: i64) -> i64 {
        let next = self
            .values
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();
        match next {
            Some(v) => v.clamp(low, high.max(low)),
            None => low,
        }
    }
}
