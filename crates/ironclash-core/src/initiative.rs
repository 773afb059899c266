//! Initiative contest with re-rolls for tied players.
//!
//! Every player rolls in round one. Players that share a roll in the latest round roll
//! again in a new round; the ranking compares rounds in order, so a later round only
//! separates players that were level in every earlier one.

use std::collections::HashMap;

use ironclash_protocol::PlayerId;

/// 1-based index of a roll-off round.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Round(u32);

impl Round {
    pub const FIRST: Round = Round(1);

    pub fn next(self) -> Round {
        Round(self.0 + 1)
    }

    pub fn get(self) -> u32 {
        self.0
    }

    fn index(self) -> usize {
        (self.0 as usize).saturating_sub(1)
    }
}

#[derive(Clone, Debug)]
struct InitiativeEntry {
    player: PlayerId,
    rolls: Vec<u32>,
}

#[derive(Clone, Debug, Default)]
pub struct InitiativeOrder {
    entries: Vec<InitiativeEntry>,
}

impl InitiativeOrder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `roll` for `player` in `round` (replacing an earlier roll for the same round)
    /// and re-ranks everyone.
    pub fn add_result(&mut self, player: PlayerId, round: Round, roll: u32) {
        let idx = match self.entries.iter().position(|e| e.player == player) {
            Some(idx) => idx,
            None => {
                self.entries.push(InitiativeEntry {
                    player,
                    rolls: Vec::new(),
                });
                self.entries.len() - 1
            }
        };

        let rolls = &mut self.entries[idx].rolls;
        let slot = round.index();
        if slot < rolls.len() {
            rolls[slot] = roll;
        } else {
            rolls.resize(slot, 0);
            rolls.push(roll);
        }

        // Stable: fully level players keep the order they first rolled in.
        self.entries.sort_by(|a, b| b.rolls.cmp(&a.rolls));
    }

    /// Most recent round anyone has rolled in.
    pub fn current_round(&self) -> Round {
        let played = self.entries.iter().map(|e| e.rolls.len()).max().unwrap_or(1);
        Round(played.max(1) as u32)
    }

    /// Round that follows the latest one; history is kept.
    pub fn start_new_roll(&self) -> Round {
        if self.entries.is_empty() {
            Round::FIRST
        } else {
            self.current_round().next()
        }
    }

    pub fn roll(&self, player: PlayerId, round: Round) -> Option<u32> {
        self.entries
            .iter()
            .find(|e| e.player == player)
            .and_then(|e| e.rolls.get(round.index()).copied())
    }

    pub fn has_ties(&self, round: Round) -> bool {
        !self.tied_players(round).is_empty()
    }

    /// Players still level with someone else after `round`, in ranking order. Only players
    /// that rolled in `round` are considered, and every earlier roll must match as well.
    pub fn tied_players(&self, round: Round) -> Vec<PlayerId> {
        let history = |e: &InitiativeEntry| e.rolls.get(..=round.index()).map(<[u32]>::to_vec);
        let mut counts: HashMap<Vec<u32>, usize> = HashMap::new();
        for rolls in self.entries.iter().filter_map(history) {
            *counts.entry(rolls).or_default() += 1;
        }
        self.entries
            .iter()
            .filter(|e| history(*e).is_some_and(|r| counts.get(&r).copied().unwrap_or(0) > 1))
            .map(|e| e.player)
            .collect()
    }

    /// Winner first.
    pub fn ordered_players(&self) -> Vec<PlayerId> {
        self.entries.iter().map(|e| e.player).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tie_reroll_only_reorders_tied_players() {
        let (a, b, c) = (PlayerId::new(), PlayerId::new(), PlayerId::new());
        let mut order = InitiativeOrder::new();
        let first = Round::FIRST;
        order.add_result(a, first, 7);
        order.add_result(b, first, 7);
        order.add_result(c, first, 6);

        assert!(order.has_ties(first));
        assert_eq!(order.tied_players(first), vec![a, b]);

        let second = order.start_new_roll();
        assert_eq!(second.get(), 2);
        order.add_result(a, second, 8);
        order.add_result(b, second, 6);

        assert!(!order.has_ties(second));
        assert_eq!(order.ordered_players(), vec![a, b, c]);
        assert_eq!(order.roll(c, first), Some(6));
        assert_eq!(order.roll(c, second), None);
    }

    #[test]
    fn later_round_cannot_overtake_earlier_ranking() {
        let (a, b, c) = (PlayerId::new(), PlayerId::new(), PlayerId::new());
        let mut order = InitiativeOrder::new();
        order.add_result(a, Round::FIRST, 5);
        order.add_result(b, Round::FIRST, 5);
        order.add_result(c, Round::FIRST, 9);

        let second = order.start_new_roll();
        order.add_result(b, second, 12);
        order.add_result(a, second, 2);

        assert_eq!(order.ordered_players(), vec![c, b, a]);
    }

    #[test]
    fn repeated_ties_need_another_round() {
        let (a, b) = (PlayerId::new(), PlayerId::new());
        let mut order = InitiativeOrder::new();
        order.add_result(a, Round::FIRST, 4);
        order.add_result(b, Round::FIRST, 4);

        let second = order.start_new_roll();
        order.add_result(a, second, 6);
        order.add_result(b, second, 6);
        assert_eq!(order.tied_players(second), vec![a, b]);

        let third = order.start_new_roll();
        assert_eq!(third.get(), 3);
        order.add_result(b, third, 10);
        order.add_result(a, third, 3);
        assert!(!order.has_ties(third));
        assert_eq!(order.ordered_players(), vec![b, a]);
    }

    #[test]
    fn equal_reroll_after_different_first_rolls_is_not_a_tie() {
        let (a, b, c, d) = (PlayerId::new(), PlayerId::new(), PlayerId::new(), PlayerId::new());
        let mut order = InitiativeOrder::new();
        order.add_result(a, Round::FIRST, 7);
        order.add_result(b, Round::FIRST, 7);
        order.add_result(c, Round::FIRST, 5);
        order.add_result(d, Round::FIRST, 5);
        assert_eq!(order.tied_players(Round::FIRST), vec![a, b, c, d]);

        let second = order.start_new_roll();
        order.add_result(a, second, 4);
        order.add_result(b, second, 9);
        order.add_result(c, second, 4);
        order.add_result(d, second, 2);

        assert!(!order.has_ties(second));
        assert_eq!(order.ordered_players(), vec![b, a, c, d]);
    }

    #[test]
    fn rerolling_same_round_replaces_value() {
        let a = PlayerId::new();
        let mut order = InitiativeOrder::new();
        order.add_result(a, Round::FIRST, 3);
        order.add_result(a, Round::FIRST, 11);
        assert_eq!(order.roll(a, Round::FIRST), Some(11));
        assert_eq!(order.len(), 1);
        assert_eq!(order.current_round(), Round::FIRST);
    }

    #[test]
    fn empty_order_starts_at_round_one() {
        let order = InitiativeOrder::new();
        assert_eq!(order.start_new_roll(), Round::FIRST);
        assert!(order.ordered_players().is_empty());
        assert!(!order.has_ties(Round::FIRST));
    }
}
