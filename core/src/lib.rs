// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trouble Core - Game Rules and Turn Logic
//!
//! This crate provides the core game functionality including:
//! - Board topology (track, START spaces, warps, Double Trouble spaces)
//! - Die rolls with streak breaking
//! - Move validation, captures and finish entry
//! - The turn state machine and game session
//! - Snapshot persistence helpers for session state

#![deny(unsafe_code)]
#![deny(clippy::all)]

pub mod board;
pub mod config;
pub mod dice;
pub mod events;
pub mod rules;
pub mod scheduler;
pub mod session;
pub mod snapshot;
pub mod turn;

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub use config::GameConfig;
pub use dice::{DiceRoller, DieState, ScriptedDice, StreakBreakingDie, StreakOutcome};
pub use events::GameEvent;
pub use rules::{MoveOutcome, ValidMove, ValidationResult};
pub use session::GameSession;
pub use snapshot::{FileSnapshotStore, MemorySnapshotStore, SessionSnapshot, SnapshotStore};
pub use turn::{Turn, TurnPhase};

/// Roster identifier of a player (`player1` .. `player4`)
pub type PlayerId = String;

/// Number of pegs each player owns
pub const PEGS_PER_PLAYER: u8 = 4;

/// Player color; every seat on the board has exactly one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerColor {
    /// Red seat
    Red,
    /// Blue seat
    Blue,
    /// Green seat
    Green,
    /// Yellow seat
    Yellow,
}

impl PlayerColor {
    /// All colors in seating order
    pub const ALL: [PlayerColor; 4] = [
        PlayerColor::Red,
        PlayerColor::Blue,
        PlayerColor::Green,
        PlayerColor::Yellow,
    ];

    /// Lowercase name used in peg ids and logs
    pub fn name(&self) -> &'static str {
        match self {
            PlayerColor::Red => "red",
            PlayerColor::Blue => "blue",
            PlayerColor::Green => "green",
            PlayerColor::Yellow => "yellow",
        }
    }
}

impl fmt::Display for PlayerColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A seat at the table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// Roster id
    pub id: PlayerId,
    /// Display name
    pub name: String,
    /// Seat color
    pub color: PlayerColor,
    /// Whether the seat takes part in the game
    pub is_active: bool,
}

impl Player {
    /// Create a new player
    pub fn new(id: impl Into<PlayerId>, name: impl Into<String>, color: PlayerColor, is_active: bool) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            color,
            is_active,
        }
    }
}

/// The fixed four-seat roster. The first two seats are mandatory and active,
/// the last two start inactive and may be toggled on before the game starts.
pub fn default_roster() -> Vec<Player> {
    PlayerColor::ALL
        .iter()
        .enumerate()
        .map(|(i, color)| {
            Player::new(
                format!("player{}", i + 1),
                format!("Player {}", i + 1),
                *color,
                i < 2,
            )
        })
        .collect()
}

/// Peg identifier: the owning color plus the peg's index within that color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PegId {
    /// Owning color
    pub color: PlayerColor,
    /// Index `0..4`
    pub index: u8,
}

impl PegId {
    /// Create a new peg id
    pub fn new(color: PlayerColor, index: u8) -> Self {
        Self { color, index }
    }
}

impl fmt::Display for PegId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.color, self.index)
    }
}

/// Where a peg currently is. Exactly one variant holds at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PegLocation {
    /// In the owner's HOME area
    Home,
    /// On the shared track, index `0..28`
    Track(u8),
    /// In the owner's FINISH lane, slot `0..4`
    Finish(u8),
}

impl PegLocation {
    /// Legacy integer encoding: `-1` HOME, `0..27` track, `56 + slot` FINISH
    pub fn position_code(&self) -> i32 {
        match self {
            PegLocation::Home => board::HOME_POSITION,
            PegLocation::Track(pos) => *pos as i32,
            PegLocation::Finish(slot) => board::BOARD_SPACES as i32 + *slot as i32,
        }
    }

    /// Decode the legacy integer encoding
    pub fn from_position_code(code: i32) -> Option<Self> {
        let finish_base = board::BOARD_SPACES as i32;
        match code {
            board::HOME_POSITION => Some(PegLocation::Home),
            c if (0..board::TRACK_SPACES as i32).contains(&c) => Some(PegLocation::Track(c as u8)),
            c if (finish_base..finish_base + board::FINISH_SLOTS as i32).contains(&c) => {
                Some(PegLocation::Finish((c - finish_base) as u8))
            }
            _ => None,
        }
    }
}

impl fmt::Display for PegLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PegLocation::Home => f.write_str("HOME"),
            PegLocation::Track(pos) => write!(f, "track {}", pos),
            PegLocation::Finish(slot) => write!(f, "finish {}", slot),
        }
    }
}

/// A single peg
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Peg {
    /// Peg id
    pub id: PegId,
    /// Owning player
    pub player_id: PlayerId,
    /// Current location
    pub location: PegLocation,
}

impl Peg {
    /// Create a peg sitting in HOME
    pub fn new(id: PegId, player_id: impl Into<PlayerId>) -> Self {
        Self {
            id,
            player_id: player_id.into(),
            location: PegLocation::Home,
        }
    }

    /// Owning color
    pub fn color(&self) -> PlayerColor {
        self.id.color
    }

    pub fn is_in_home(&self) -> bool {
        self.location == PegLocation::Home
    }

    pub fn is_in_finish(&self) -> bool {
        matches!(self.location, PegLocation::Finish(_))
    }

    /// Track index when the peg is on the shared track
    pub fn track_position(&self) -> Option<u8> {
        match self.location {
            PegLocation::Track(pos) => Some(pos),
            _ => None,
        }
    }

    /// FINISH slot when the peg is in its FINISH lane
    pub fn finish_position(&self) -> Option<u8> {
        match self.location {
            PegLocation::Finish(slot) => Some(slot),
            _ => None,
        }
    }

    /// Legacy integer position (see [`PegLocation::position_code`])
    pub fn position_code(&self) -> i32 {
        self.location.position_code()
    }
}

/// Lifecycle of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    /// Players are being chosen
    #[default]
    Setup,
    /// A game is in progress
    Playing,
    /// A player has won
    Finished,
}

/// Reasons a move is rejected. The display strings are shown to players.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvalidMove {
    /// A HOME peg may only leave on a 6
    #[error("must roll 6")]
    MustRollSix,

    /// A FINISH peg cannot move past the last slot
    #[error("exceeds finish")]
    ExceedsFinish,

    /// The destination holds one of the mover's own pegs
    #[error("blocked by own peg")]
    BlockedByOwnPeg,

    /// Entering FINISH needs the exact count
    #[error("must roll exact count")]
    MustRollExactCount,

    /// No peg with the requested id exists
    #[error("peg not found")]
    PegNotFound,

    /// No player with the requested id exists
    #[error("player not found")]
    PlayerNotFound,

    /// The peg does not belong to the moving color
    #[error("not your peg")]
    NotYourPeg,

    /// The die value is outside `1..=6`
    #[error("invalid die roll")]
    InvalidDieRoll,
}

/// Reasons a roll request is rejected
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum RollError {
    /// The die is still settling from the previous roll
    #[error("the die is already rolling")]
    AlreadyRolling,

    /// A move (and an unspent extra turn) is needed before rolling again
    #[error("a move is required before rolling again")]
    MoveRequiredFirst,

    /// At most two rolls per turn sequence
    #[error("maximum rolls for this turn reached")]
    MaxRollsReached,

    /// No game is being played
    #[error("no game in progress")]
    GameNotInProgress,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_codes_match_legacy_layout() {
        assert_eq!(PegLocation::Home.position_code(), -1);
        assert_eq!(PegLocation::Track(27).position_code(), 27);
        assert_eq!(PegLocation::Finish(0).position_code(), 56);
        assert_eq!(PegLocation::Finish(3).position_code(), 59);

        assert_eq!(PegLocation::from_position_code(-1), Some(PegLocation::Home));
        assert_eq!(PegLocation::from_position_code(13), Some(PegLocation::Track(13)));
        assert_eq!(PegLocation::from_position_code(58), Some(PegLocation::Finish(2)));
        assert_eq!(PegLocation::from_position_code(28), None);
        assert_eq!(PegLocation::from_position_code(60), None);
    }

    #[test]
    fn default_roster_has_two_mandatory_seats() {
        let roster = default_roster();
        assert_eq!(roster.len(), 4);
        assert!(roster[0].is_active && roster[1].is_active);
        assert!(!roster[2].is_active && !roster[3].is_active);
        assert_eq!(roster[0].color, PlayerColor::Red);
        assert_eq!(roster[3].id, "player4");
    }

    #[test]
    fn reason_strings_are_stable() {
        assert_eq!(InvalidMove::MustRollSix.to_string(), "must roll 6");
        assert_eq!(InvalidMove::BlockedByOwnPeg.to_string(), "blocked by own peg");
        assert_eq!(InvalidMove::MustRollExactCount.to_string(), "must roll exact count");
        assert_eq!(PegId::new(PlayerColor::Green, 2).to_string(), "green-2");
    }
}
