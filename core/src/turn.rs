// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turn bookkeeping and the decisions of the turn state machine

use crate::dice::DieState;
use crate::{PegId, Player, PlayerId, RollError};
use serde::{Deserialize, Serialize};

/// Hard cap on rolls within one turn sequence
pub const MAX_ROLLS_PER_TURN: u8 = 2;

/// Where the current turn stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnPhase {
    /// Waiting for the player to roll
    AwaitingRoll,
    /// The die is settling; the value is not committed yet
    RollResolving,
    /// A roll is committed and the player picks a peg
    AwaitingMove,
    /// Non-interactive: a roll-of-1 chain or the no-move display delay
    Resolving,
}

/// State of the turn in progress
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub player_id: PlayerId,
    /// Committed die value awaiting a move
    pub die_roll: Option<u8>,
    pub moves_available: u8,
    pub extra_turns_remaining: u32,
    pub selected_peg: Option<PegId>,
    pub rolls_this_turn: u8,
    pub has_moved_since_roll: bool,
    /// Session clock (ms) when the move timer started; `None` hides the timer
    pub start_time: Option<u64>,
    pub timeout_warning: bool,
    pub phase: TurnPhase,
}

/// What [`Turn::check_turn_end`] decided after a move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnDecision {
    /// The same player may roll again
    RollAgain,
    /// Moves remain and can still be made
    KeepMoving,
    /// The turn is over
    EndTurn,
}

impl Turn {
    /// A clean turn for `player_id`
    pub fn new(player_id: impl Into<PlayerId>) -> Self {
        Self {
            player_id: player_id.into(),
            die_roll: None,
            moves_available: 0,
            extra_turns_remaining: 0,
            selected_peg: None,
            rolls_this_turn: 0,
            has_moved_since_roll: false,
            start_time: None,
            timeout_warning: false,
            phase: TurnPhase::AwaitingRoll,
        }
    }

    /// Whether another roll may be requested right now
    pub fn check_roll_allowed(&self, die: &DieState) -> Result<(), RollError> {
        if die.is_rolling || self.phase == TurnPhase::RollResolving {
            return Err(RollError::AlreadyRolling);
        }
        if self.rolls_this_turn >= MAX_ROLLS_PER_TURN {
            return Err(RollError::MaxRollsReached);
        }
        if self.rolls_this_turn > 0 && (!self.has_moved_since_roll || self.extra_turns_remaining == 0) {
            return Err(RollError::MoveRequiredFirst);
        }
        Ok(())
    }

    /// Commit a settled die value. Returns true when the roll banked an
    /// extra turn.
    pub fn commit_roll(&mut self, value: u8) -> bool {
        let first_roll = self.rolls_this_turn == 0;
        let mut granted = false;
        if first_roll {
            if value == 6 {
                self.extra_turns_remaining += 1;
                granted = true;
            }
        } else {
            // the re-roll spends the slot that allowed it
            self.extra_turns_remaining = self.extra_turns_remaining.saturating_sub(1);
        }
        self.rolls_this_turn += 1;
        self.die_roll = Some(value);
        self.moves_available = value;
        self.has_moved_since_roll = false;
        self.selected_peg = None;
        self.timeout_warning = false;
        self.phase = TurnPhase::AwaitingMove;
        granted
    }

    /// Bank one more extra turn (Double Trouble). Never capped.
    pub fn grant_extra_turn(&mut self) -> u32 {
        self.extra_turns_remaining += 1;
        self.extra_turns_remaining
    }

    /// An unspent extra turn within the roll cap
    pub fn can_roll_again(&self) -> bool {
        self.extra_turns_remaining > 0 && self.rolls_this_turn < MAX_ROLLS_PER_TURN
    }

    /// The committed roll has been spent on a move
    pub fn record_move(&mut self) {
        self.moves_available = 0;
        self.die_roll = None;
        self.selected_peg = None;
        self.has_moved_since_roll = true;
        self.stop_timer();
        self.phase = TurnPhase::AwaitingRoll;
    }

    /// Decide what follows a move. `has_further_moves` is only consulted
    /// while moves remain.
    pub fn check_turn_end(&self, has_further_moves: bool) -> TurnDecision {
        if self.moves_available == 0 {
            if self.can_roll_again() {
                TurnDecision::RollAgain
            } else {
                TurnDecision::EndTurn
            }
        } else if has_further_moves {
            TurnDecision::KeepMoving
        } else {
            TurnDecision::EndTurn
        }
    }

    /// Keep the turn with the same player for their banked extra turn. The
    /// extra turn itself is spent when the next roll commits.
    pub fn continue_sequence(&mut self) {
        self.die_roll = None;
        self.moves_available = 0;
        self.selected_peg = None;
        // a spent roll counts as moved, even if nothing could move
        self.has_moved_since_roll = true;
        self.stop_timer();
        self.phase = TurnPhase::AwaitingRoll;
    }

    pub fn start_timer(&mut self, now_ms: u64) {
        self.start_time = Some(now_ms);
        self.timeout_warning = false;
    }

    pub fn stop_timer(&mut self) {
        self.start_time = None;
        self.timeout_warning = false;
    }
}

/// The active player after `current` in seating order, wrapping around
pub fn next_active_player<'a>(players: &'a [Player], current: &str) -> Option<&'a Player> {
    let active: Vec<&Player> = players.iter().filter(|p| p.is_active).collect();
    let idx = active.iter().position(|p| p.id == current)?;
    active.get((idx + 1) % active.len()).copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::default_roster;

    #[test]
    fn first_six_banks_an_extra_turn() {
        let mut turn = Turn::new("player1");
        assert!(turn.commit_roll(6));
        assert_eq!(turn.extra_turns_remaining, 1);
        assert_eq!(turn.moves_available, 6);
        assert_eq!(turn.phase, TurnPhase::AwaitingMove);

        turn.record_move();
        assert!(turn.check_roll_allowed(&DieState::default()).is_ok());

        // second six spends the slot and grants nothing
        assert!(!turn.commit_roll(6));
        assert_eq!(turn.extra_turns_remaining, 0);
        assert_eq!(turn.rolls_this_turn, 2);
    }

    #[test]
    fn roll_gating() {
        let mut turn = Turn::new("player1");
        let rolling = DieState {
            is_rolling: true,
            ..DieState::default()
        };
        assert_eq!(turn.check_roll_allowed(&rolling), Err(RollError::AlreadyRolling));

        turn.commit_roll(4);
        assert_eq!(
            turn.check_roll_allowed(&DieState::default()),
            Err(RollError::MoveRequiredFirst)
        );
        turn.record_move();
        // moved, but no extra turn
        assert_eq!(
            turn.check_roll_allowed(&DieState::default()),
            Err(RollError::MoveRequiredFirst)
        );

        turn.extra_turns_remaining = 3;
        turn.rolls_this_turn = MAX_ROLLS_PER_TURN;
        assert_eq!(
            turn.check_roll_allowed(&DieState::default()),
            Err(RollError::MaxRollsReached)
        );
    }

    #[test]
    fn roll_cap_beats_banked_turns() {
        let mut turn = Turn::new("player1");
        turn.commit_roll(6);
        turn.record_move();
        turn.commit_roll(3);
        turn.grant_extra_turn();
        turn.grant_extra_turn();
        turn.record_move();
        assert_eq!(turn.extra_turns_remaining, 2);
        assert_eq!(turn.check_turn_end(false), TurnDecision::EndTurn);
    }

    #[test]
    fn double_trouble_stacks_without_limit() {
        let mut turn = Turn::new("player1");
        for expected in 1..=6 {
            assert_eq!(turn.grant_extra_turn(), expected);
        }
        assert_eq!(turn.check_turn_end(false), TurnDecision::RollAgain);
    }

    #[test]
    fn remaining_moves_without_options_end_the_turn() {
        let mut turn = Turn::new("player1");
        turn.commit_roll(3);
        assert_eq!(turn.check_turn_end(true), TurnDecision::KeepMoving);
        assert_eq!(turn.check_turn_end(false), TurnDecision::EndTurn);
    }

    #[test]
    fn seating_wraps_over_active_players() {
        let mut roster = default_roster();
        roster[2].is_active = true;
        assert_eq!(next_active_player(&roster, "player1").unwrap().id, "player2");
        assert_eq!(next_active_player(&roster, "player2").unwrap().id, "player3");
        assert_eq!(next_active_player(&roster, "player3").unwrap().id, "player1");
        assert!(next_active_player(&roster, "player4").is_none());
    }
}
