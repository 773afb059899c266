//! Unit activation order for the movement and weapons-attack phases.
//!
//! Sides activate in reverse initiative order (the loser first). Counts are frozen at the
//! start of each alternation round. A side moves one unit per step, unless its count is
//! an exact multiple of the smallest opposing count, in which case it moves that many
//! units at once. A side with no opposition left moves everything it has in one step.

use std::collections::HashMap;

use ironclash_protocol::PlayerId;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TurnStep {
    pub player: PlayerId,
    pub units: u32,
}

#[derive(Clone, Debug, Default)]
pub struct TurnOrder {
    steps: Vec<TurnStep>,
    cursor: usize,
}

impl TurnOrder {
    /// `initiative` lists players winner first. Players absent from `unit_counts` or with
    /// no units never get a step.
    pub fn calculate(initiative: &[PlayerId], unit_counts: &HashMap<PlayerId, u32>) -> Self {
        let sides: Vec<PlayerId> = initiative.iter().rev().copied().collect();
        let mut remaining: Vec<u32> = sides
            .iter()
            .map(|p| unit_counts.get(p).copied().unwrap_or(0))
            .collect();
        let mut steps = Vec::new();

        while remaining.iter().any(|&n| n > 0) {
            let snapshot = remaining.clone();
            for (idx, player) in sides.iter().enumerate() {
                let own = snapshot[idx];
                if own == 0 {
                    continue;
                }
                let units = batch_size(own, &snapshot, idx);
                steps.push(TurnStep {
                    player: *player,
                    units,
                });
                remaining[idx] -= units;
            }
        }

        Self { steps, cursor: 0 }
    }

    /// Hands out the next step, `None` once every unit has been activated.
    pub fn next_step(&mut self) -> Option<TurnStep> {
        let step = self.steps.get(self.cursor).copied();
        if step.is_some() {
            self.cursor += 1;
        }
        step
    }

    pub fn steps(&self) -> &[TurnStep] {
        &self.steps
    }

    pub fn remaining_steps(&self) -> usize {
        self.steps.len() - self.cursor
    }
}

fn batch_size(own: u32, snapshot: &[u32], idx: usize) -> u32 {
    let smallest_opponent = snapshot
        .iter()
        .enumerate()
        .filter(|&(i, &n)| i != idx && n > 0)
        .map(|(_, &n)| n)
        .min();

    match smallest_opponent {
        None => own,
        Some(other) if own > other && own % other == 0 => own / other,
        Some(_) => 1,
    }
}
