// SPDX-License-Identifier: MIT OR Apache-2.0

//! Events emitted by the session for front ends to present

use crate::{PegId, PegLocation, PlayerId};
use serde::{Deserialize, Serialize};

/// Something that happened in the game. Front ends drain these to drive
/// animation and feedback; the session keeps no presentation state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    /// A game began with the given players in turn order
    GameStarted {
        players: Vec<PlayerId>,
    },
    /// The die was thrown; the value is known but not yet committed
    DieRolled {
        player: PlayerId,
        value: u8,
    },
    /// The die settled and the turn state now reflects the value
    RollCommitted {
        player: PlayerId,
        value: u8,
        /// Whether any peg can move for this value
        has_moves: bool,
    },
    /// A peg moved
    PegMoved {
        peg: PegId,
        from: PegLocation,
        to: PegLocation,
        /// The warp space crossed on the way, if any
        warped_from: Option<u8>,
    },
    /// An opponent peg was sent back to HOME
    PegCaptured {
        peg: PegId,
        by: PegId,
    },
    /// A HOME peg was forced onto START by another player's roll of 1
    ForcedHomeExit {
        peg: PegId,
        roller: PlayerId,
    },
    /// The current player banked an extra turn
    ExtraTurnGranted {
        player: PlayerId,
        remaining: u32,
    },
    /// The move timer is about to run out
    TimeoutWarning {
        player: PlayerId,
    },
    /// The move timer ran out
    TurnTimedOut {
        player: PlayerId,
    },
    /// Control passed (or stayed) after a turn ended
    TurnEnded {
        player: PlayerId,
        next: PlayerId,
    },
    /// A player brought all pegs into FINISH
    GameWon {
        player: PlayerId,
    },
    /// The session was cleared
    GameReset,
}
