// SPDX-License-Identifier: MIT OR Apache-2.0

//! Die rolls with a streak breaker
//!
//! Repeating the previous value is allowed but made progressively less
//! likely: the first repeat is re-rolled with probability 0.4, every further
//! repeat adds 0.3, capped at 0.7.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Lowest face
pub const MIN_ROLL: u8 = 1;
/// Highest face
pub const MAX_ROLL: u8 = 6;

const BASE_REROLL_CHANCE: f64 = 0.4;
const REROLL_CHANCE_STEP: f64 = 0.3;
const MAX_REROLL_CHANCE: f64 = 0.7;

/// Session-wide die history
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DieState {
    /// Value of the last roll, if any
    pub last_roll: Option<u8>,
    /// How many times in a row `last_roll` has been repeated
    pub consecutive_repeats: u32,
    /// Locked while a roll is settling
    pub is_rolling: bool,
}

impl DieState {
    /// Record the outcome of a roll
    pub fn record(&mut self, outcome: StreakOutcome) {
        self.last_roll = Some(outcome.result);
        self.consecutive_repeats = outcome.consecutive_repeats;
    }
}

/// Result of passing a raw roll through the streak breaker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreakOutcome {
    /// Final face value
    pub result: u8,
    /// Repeat counter after this roll
    pub consecutive_repeats: u32,
}

/// Uniform roll in `1..=6`
pub fn generate_roll<R: Rng + ?Sized>(rng: &mut R) -> u8 {
    rng.gen_range(MIN_ROLL..=MAX_ROLL)
}

/// Chance that the `repeats`-th consecutive repeat gets re-rolled
pub fn reroll_chance(repeats: u32) -> f64 {
    let extra = repeats.saturating_sub(1) as f64 * REROLL_CHANCE_STEP;
    (BASE_REROLL_CHANCE + extra).min(MAX_REROLL_CHANCE)
}

/// Apply the streak breaker to a raw roll
pub fn apply_streak_breaker<R: Rng + ?Sized>(roll: u8, state: &DieState, rng: &mut R) -> StreakOutcome {
    let last = match state.last_roll {
        Some(last) if last == roll => last,
        _ => {
            return StreakOutcome {
                result: roll,
                consecutive_repeats: 0,
            }
        }
    };

    let repeats = state.consecutive_repeats + 1;
    if rng.gen_bool(reroll_chance(repeats)) {
        // pick among the five other faces
        let mut rerolled = rng.gen_range(MIN_ROLL..MAX_ROLL);
        if rerolled >= last {
            rerolled += 1;
        }
        tracing::debug!(repeated = last, rerolled, repeats, "streak breaker re-rolled");
        StreakOutcome {
            result: rerolled,
            consecutive_repeats: 0,
        }
    } else {
        StreakOutcome {
            result: roll,
            consecutive_repeats: repeats,
        }
    }
}

/// Source of die values for a session
pub trait DiceRoller: Send {
    /// Produce the next value given the current die history
    fn roll(&mut self, state: &DieState) -> StreakOutcome;
}

/// The production die: uniform rolls passed through the streak breaker
pub struct StreakBreakingDie<R: Rng + Send = StdRng> {
    rng: R,
}

impl<R: Rng + Send> StreakBreakingDie<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl StreakBreakingDie<StdRng> {
    /// Die seeded from the operating system
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }

    /// Deterministic die for replays and tests
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng + Send> DiceRoller for StreakBreakingDie<R> {
    fn roll(&mut self, state: &DieState) -> StreakOutcome {
        let raw = generate_roll(&mut self.rng);
        apply_streak_breaker(raw, state, &mut self.rng)
    }
}

/// Replays a fixed sequence of values, cycling when it runs out.
/// The streak breaker is not applied.
#[derive(Debug, Clone)]
pub struct ScriptedDice {
    script: Vec<u8>,
    queue: VecDeque<u8>,
}

impl ScriptedDice {
    /// Values outside `1..=6` are clamped into range
    pub fn new(values: impl IntoIterator<Item = u8>) -> Self {
        let script: Vec<u8> = values
            .into_iter()
            .map(|v| v.clamp(MIN_ROLL, MAX_ROLL))
            .collect();
        Self {
            queue: script.iter().copied().collect(),
            script,
        }
    }
}

impl DiceRoller for ScriptedDice {
    fn roll(&mut self, state: &DieState) -> StreakOutcome {
        if self.queue.is_empty() {
            self.queue.extend(self.script.iter().copied());
        }
        let result = self.queue.pop_front().unwrap_or(MAX_ROLL);
        let consecutive_repeats = if state.last_roll == Some(result) {
            state.consecutive_repeats + 1
        } else {
            0
        };
        StreakOutcome {
            result,
            consecutive_repeats,
        }
    }
}
