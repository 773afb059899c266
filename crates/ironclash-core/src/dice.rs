use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of dice results for initiative and attack resolution.
pub trait DiceRoller: Send {
    fn roll_d6(&mut self) -> u32;

    fn roll_2d6(&mut self) -> u32 {
        self.roll_d6() + self.roll_d6()
    }
}

#[derive(Debug)]
pub struct RandomDiceRoller {
    rng: StdRng,
}

impl RandomDiceRoller {
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

impl DiceRoller for RandomDiceRoller {
    fn roll_d6(&mut self) -> u32 {
        self.rng.gen_range(1..=6)
    }
}

/// Replays scripted 2d6 totals; falls back to 7 once the script runs out.
#[derive(Debug, Default)]
pub struct FixedDiceRoller {
    rolls: VecDeque<u32>,
}

impl FixedDiceRoller {
    pub fn new(rolls: impl IntoIterator<Item = u32>) -> Self {
        Self {
            rolls: rolls.into_iter().collect(),
        }
    }

    pub fn push(&mut self, roll: u32) {
        self.rolls.push_back(roll);
    }
}

impl DiceRoller for FixedDiceRoller {
    fn roll_d6(&mut self) -> u32 {
        self.rolls.pop_front().unwrap_or(3).clamp(1, 6)
    }

    fn roll_2d6(&mut self) -> u32 {
        self.rolls.pop_front().unwrap_or(7)
    }
}
