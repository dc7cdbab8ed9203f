// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared driver for whole-game tests

use std::collections::HashSet;
use std::time::Duration;
use trouble_core::rules::get_valid_moves;
use trouble_core::{
    default_roster, GameConfig, GameSession, GameStatus, PegLocation, StreakBreakingDie, TurnPhase, ValidMove,
    PEGS_PER_PLAYER,
};

pub const TICK: Duration = Duration::from_millis(100);

/// A session with `players` seats and a seeded die
pub fn new_game(seed: u64, players: usize) -> GameSession {
    let mut roster = default_roster();
    for (seat, player) in roster.iter_mut().enumerate() {
        player.is_active = seat < players;
    }
    let mut session = GameSession::new(GameConfig::default(), Box::new(StreakBreakingDie::seeded(seed)));
    session.initialize_game(&roster);
    session
}

/// Act for whoever holds the turn, then let one tick pass. `choose` picks an
/// index into the legal moves. Returns true when the die was thrown.
pub fn step(session: &mut GameSession, mut choose: impl FnMut(&[ValidMove]) -> usize) -> bool {
    let mut rolled = false;
    if session.status() != GameStatus::Playing {
        session.advance_time(TICK);
        return false;
    }
    if let Some(turn) = session.current_turn().cloned() {
        match (turn.phase, turn.die_roll) {
            (TurnPhase::AwaitingRoll, _) => {
                assert!(session.roll_die().is_ok(), "roll refused in {:?}", turn);
                rolled = true;
            }
            (TurnPhase::AwaitingMove, Some(roll)) => {
                let color = session.player(&turn.player_id).map(|p| p.color).unwrap();
                let moves = get_valid_moves(&turn.player_id, roll, session.pegs(), color);
                assert!(!moves.is_empty(), "awaiting a move with no legal move");
                let choice = moves[choose(&moves) % moves.len()];
                assert!(session.execute_peg_move(choice.peg_id, choice.outcome.new_location));
            }
            _ => {}
        }
    }
    session.advance_time(TICK);
    rolled
}

/// Board and turn invariants that must hold after every step
pub fn check_invariants(session: &GameSession) {
    for player in session.players() {
        let owned = session.pegs().iter().filter(|p| p.player_id == player.id).count();
        assert_eq!(owned, PEGS_PER_PLAYER as usize, "{} lost a peg", player.id);
    }

    let mut track = HashSet::new();
    let mut finish = HashSet::new();
    for peg in session.pegs() {
        match peg.location {
            PegLocation::Track(pos) => assert!(track.insert(pos), "two pegs on track space {}", pos),
            PegLocation::Finish(slot) => {
                assert!(finish.insert((peg.color(), slot)), "{} shares a FINISH slot", peg.id)
            }
            PegLocation::Home => {}
        }
    }

    if let Some(turn) = session.current_turn() {
        assert!(turn.rolls_this_turn <= 2);
        if turn.phase == TurnPhase::AwaitingMove {
            assert!(turn.die_roll.is_some());
        }
    }
    assert_eq!(session.status() == GameStatus::Finished, session.winner().is_some());
}
