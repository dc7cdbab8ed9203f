// SPDX-License-Identifier: MIT OR Apache-2.0

//! Move validation: destinations, blocking, captures, warps and finish entry

use crate::board::{self, FINISH_SLOTS};
use crate::dice::{MAX_ROLL, MIN_ROLL};
use crate::{InvalidMove, Peg, PegId, PegLocation, PlayerColor};
use serde::{Deserialize, Serialize};

/// What a legal move does to the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveOutcome {
    /// Where the peg starts
    pub from: PegLocation,
    /// Where the peg ends up, after any warp
    pub new_location: PegLocation,
    /// Opponent peg sent HOME from the final destination
    pub captured_peg: Option<PegId>,
    /// Opponent peg sent HOME from the warp space the mover landed on
    pub warp_space_captured_peg: Option<PegId>,
    /// The move takes the peg from the track into its FINISH lane
    pub enters_finish: bool,
    /// The warp space landed on before teleporting
    pub warped_from: Option<u8>,
}

impl MoveOutcome {
    /// Whether the peg finishes on a Double Trouble space
    pub fn lands_on_double_trouble(&self) -> bool {
        matches!(self.new_location, PegLocation::Track(pos) if board::is_double_trouble(pos))
    }

    /// Every opponent peg this move sends HOME
    pub fn captures(&self) -> impl Iterator<Item = PegId> {
        self.warp_space_captured_peg.into_iter().chain(self.captured_peg)
    }
}

/// Outcome of validating a move
pub type ValidationResult = Result<MoveOutcome, InvalidMove>;

/// A peg that may legally move for a given roll
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidMove {
    pub peg_id: PegId,
    pub outcome: MoveOutcome,
}

/// Validates moves against a full set of pegs
pub struct MoveValidator<'a> {
    /// Every peg in the game
    pegs: &'a [Peg],
}

impl<'a> MoveValidator<'a> {
    /// Create a validator over the given pegs
    pub fn new(pegs: &'a [Peg]) -> Self {
        Self { pegs }
    }

    /// Check whether `peg` may move `die_roll` spaces for `color`
    pub fn validate_move(&self, peg: &Peg, die_roll: u8, color: PlayerColor) -> ValidationResult {
        if !(MIN_ROLL..=MAX_ROLL).contains(&die_roll) {
            return Err(InvalidMove::InvalidDieRoll);
        }
        if peg.color() != color {
            return Err(InvalidMove::NotYourPeg);
        }

        let destination = calculate_destination(peg, die_roll)?;
        if self.own_peg_at(peg, destination) {
            tracing::debug!(peg = %peg.id, %destination, "destination blocked by own peg");
            return Err(InvalidMove::BlockedByOwnPeg);
        }

        let mut outcome = MoveOutcome {
            from: peg.location,
            new_location: destination,
            captured_peg: None,
            warp_space_captured_peg: None,
            enters_finish: matches!(destination, PegLocation::Finish(_)) && !peg.is_in_finish(),
            warped_from: None,
        };

        let PegLocation::Track(landing) = destination else {
            return Ok(outcome);
        };

        match board::warp_partner(landing) {
            Some(exit) => {
                let exit_location = PegLocation::Track(exit);
                if self.own_peg_at(peg, exit_location) {
                    tracing::debug!(peg = %peg.id, exit, "warp exit blocked by own peg");
                    return Err(InvalidMove::BlockedByOwnPeg);
                }
                outcome.warp_space_captured_peg = self.opponent_at(color, landing);
                outcome.captured_peg = self.opponent_at(color, exit);
                outcome.new_location = exit_location;
                outcome.warped_from = Some(landing);
            }
            None => {
                outcome.captured_peg = self.opponent_at(color, landing);
            }
        }

        Ok(outcome)
    }

    /// Every peg of `player_id` that can legally move `die_roll` spaces
    pub fn valid_moves(&self, player_id: &str, die_roll: u8, color: PlayerColor) -> Vec<ValidMove> {
        self.pegs
            .iter()
            .filter(|peg| peg.player_id == player_id)
            .filter_map(|peg| {
                self.validate_move(peg, die_roll, color)
                    .ok()
                    .map(|outcome| ValidMove { peg_id: peg.id, outcome })
            })
            .collect()
    }

    /// First HOME peg of `player_id` that could step onto its START.
    /// Only the mover's own pegs can block START.
    pub fn home_peg_ready_for_start(&self, player_id: &str, color: PlayerColor) -> Option<PegId> {
        let start = PegLocation::Track(board::start_position(color));
        let start_blocked = self
            .pegs
            .iter()
            .any(|p| p.color() == color && p.location == start);
        if start_blocked {
            return None;
        }
        self.pegs
            .iter()
            .find(|p| p.player_id == player_id && p.color() == color && p.is_in_home())
            .map(|p| p.id)
    }

    fn own_peg_at(&self, mover: &Peg, location: PegLocation) -> bool {
        self.pegs
            .iter()
            .any(|p| p.id != mover.id && p.color() == mover.color() && p.location == location)
    }

    fn opponent_at(&self, color: PlayerColor, pos: u8) -> Option<PegId> {
        self.pegs
            .iter()
            .find(|p| p.color() != color && p.location == PegLocation::Track(pos))
            .map(|p| p.id)
    }
}

/// Where `peg` would land for `die_roll`, before blocking, captures and warps
pub fn calculate_destination(peg: &Peg, die_roll: u8) -> Result<PegLocation, InvalidMove> {
    if !(MIN_ROLL..=MAX_ROLL).contains(&die_roll) {
        return Err(InvalidMove::InvalidDieRoll);
    }
    let color = peg.color();
    match peg.location {
        PegLocation::Home => {
            if die_roll == 6 {
                Ok(PegLocation::Track(board::start_position(color)))
            } else {
                Err(InvalidMove::MustRollSix)
            }
        }
        PegLocation::Finish(slot) => {
            let target = slot + die_roll;
            if target >= FINISH_SLOTS {
                Err(InvalidMove::ExceedsFinish)
            } else {
                Ok(PegLocation::Finish(target))
            }
        }
        PegLocation::Track(pos) => {
            let new_pos = board::advance(pos, die_roll);
            let entry = board::finish_entry(color);
            // wrapping moves never count as passing the entry
            if pos < entry && entry < new_pos {
                let slot = new_pos - entry - 1;
                if slot >= FINISH_SLOTS {
                    return Err(InvalidMove::MustRollExactCount);
                }
                Ok(PegLocation::Finish(slot))
            } else {
                Ok(PegLocation::Track(new_pos))
            }
        }
    }
}

/// Validate a single move against the full peg set
pub fn validate_move(peg: &Peg, die_roll: u8, color: PlayerColor, all_pegs: &[Peg]) -> ValidationResult {
    MoveValidator::new(all_pegs).validate_move(peg, die_roll, color)
}

/// Every legal move for `player_id`
pub fn get_valid_moves(player_id: &str, die_roll: u8, pegs: &[Peg], color: PlayerColor) -> Vec<ValidMove> {
    MoveValidator::new(pegs).valid_moves(player_id, die_roll, color)
}

pub fn has_valid_moves(player_id: &str, die_roll: u8, pegs: &[Peg], color: PlayerColor) -> bool {
    !get_valid_moves(player_id, die_roll, pegs, color).is_empty()
}

/// Used by the roll-of-1 rule: the first HOME peg that can be moved to START
pub fn can_move_from_home_to_start(player_id: &str, color: PlayerColor, pegs: &[Peg]) -> Option<PegId> {
    MoveValidator::new(pegs).home_peg_ready_for_start(player_id, color)
}
