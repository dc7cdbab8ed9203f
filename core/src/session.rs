// SPDX-License-Identifier: MIT OR Apache-2.0

//! The game session: owns players, pegs, the turn and the die, and runs the
//! turn state machine.
//!
//! All deferred transitions (die settling, move timeouts, the roll-of-1
//! chain, the no-move display delay) go through the session's [`Scheduler`].
//! Front ends call [`GameSession::advance_time`] to let them fire.

use crate::config::GameConfig;
use crate::dice::{DiceRoller, DieState, StreakBreakingDie};
use crate::events::GameEvent;
use crate::rules::{self, MoveOutcome, MoveValidator, ValidationResult};
use crate::scheduler::{ScheduledTask, Scheduler, TimerId};
use crate::snapshot::{SessionSnapshot, SnapshotStore};
use crate::turn::{next_active_player, Turn, TurnDecision, TurnPhase};
use crate::{
    GameStatus, InvalidMove, Peg, PegId, PegLocation, Player, PlayerColor, PlayerId, RollError,
    PEGS_PER_PLAYER,
};
use chrono::Utc;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// A local game of Trouble
pub struct GameSession {
    config: GameConfig,
    game_id: Uuid,
    status: GameStatus,
    /// Active players in seating order
    players: Vec<Player>,
    pegs: Vec<Peg>,
    turn: Option<Turn>,
    winner: Option<PlayerId>,
    die: DieState,
    roller: Box<dyn DiceRoller>,
    scheduler: Scheduler,
    /// Timers owned by the current turn (timeouts, chain steps, auto end)
    turn_timers: Vec<TimerId>,
    /// Bumped on every transition that supersedes pending work
    epoch: u64,
    events: Vec<GameEvent>,
    store: Option<Box<dyn SnapshotStore>>,
}

impl GameSession {
    /// Create a session in the setup state
    pub fn new(config: GameConfig, roller: Box<dyn DiceRoller>) -> Self {
        Self {
            config,
            game_id: Uuid::new_v4(),
            status: GameStatus::Setup,
            players: Vec::new(),
            pegs: Vec::new(),
            turn: None,
            winner: None,
            die: DieState::default(),
            roller,
            scheduler: Scheduler::new(),
            turn_timers: Vec::new(),
            epoch: 0,
            events: Vec::new(),
            store: None,
        }
    }

    /// Session with the streak-breaking die seeded from the OS
    pub fn with_random_die(config: GameConfig) -> Self {
        Self::new(config, Box::new(StreakBreakingDie::from_entropy()))
    }

    /// Create a session backed by `store`. A saved snapshot is resumed; a
    /// missing or unreadable one leaves the session in setup.
    pub fn with_store(config: GameConfig, roller: Box<dyn DiceRoller>, store: Box<dyn SnapshotStore>) -> Self {
        let mut session = Self::new(config, roller);
        match store.load() {
            Ok(Some(snapshot)) => {
                info!(game_id = %snapshot.game_id, "Resuming saved session");
                session.restore(snapshot);
            }
            Ok(None) => debug!("No saved session found"),
            Err(e) => warn!("Failed to load saved session, starting fresh: {:#}", e),
        }
        session.store = Some(store);
        session
    }

    /// Start a game with the active entries of `players`. Fewer than two
    /// active players (or two sharing a color or id) leaves the session untouched.
    pub fn initialize_game(&mut self, players: &[Player]) {
        let active: Vec<Player> = players.iter().filter(|p| p.is_active).cloned().collect();
        if active.len() < 2 {
            warn!(active = active.len(), "Need at least two active players to start");
            return;
        }
        let mut colors: Vec<PlayerColor> = active.iter().map(|p| p.color).collect();
        colors.sort();
        colors.dedup();
        if colors.len() != active.len() {
            warn!("Each active player needs a distinct color");
            return;
        }
        let mut ids: Vec<&str> = active.iter().map(|p| p.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        if ids.len() != active.len() {
            warn!("Each active player needs a distinct id");
            return;
        }

        self.scheduler.cancel_all();
        self.turn_timers.clear();

        self.pegs = active
            .iter()
            .flat_map(|player| {
                (0..PEGS_PER_PLAYER).map(move |i| Peg::new(PegId::new(player.color, i), player.id.clone()))
            })
            .collect();
        self.turn = Some(Turn::new(active[0].id.clone()));
        self.players = active;
        self.status = GameStatus::Playing;
        self.winner = None;
        self.die.is_rolling = false;
        self.game_id = Uuid::new_v4();
        self.bump_epoch();

        info!(game_id = %self.game_id, players = self.players.len(), "Game started");
        self.events.push(GameEvent::GameStarted {
            players: self.players.iter().map(|p| p.id.clone()).collect(),
        });
        self.persist();
    }

    /// Throw the die for the current player. The value is returned at once;
    /// the turn only reflects it once the die settles.
    pub fn roll_die(&mut self) -> Result<u8, RollError> {
        if self.status != GameStatus::Playing {
            return Err(RollError::GameNotInProgress);
        }
        let player_id = match &self.turn {
            Some(turn) => {
                if let Err(e) = turn.check_roll_allowed(&self.die) {
                    warn!(player = %turn.player_id, "Roll rejected: {}", e);
                    return Err(e);
                }
                turn.player_id.clone()
            }
            None => return Err(RollError::GameNotInProgress),
        };

        self.cancel_turn_timers();
        let outcome = self.roller.roll(&self.die);
        self.die.record(outcome);
        self.die.is_rolling = true;
        let epoch = self.bump_epoch();
        if let Some(turn) = self.turn.as_mut() {
            turn.phase = TurnPhase::RollResolving;
            turn.stop_timer();
        }

        let value = outcome.result;
        self.scheduler
            .schedule(self.config.roll_settle(), ScheduledTask::ResolveRoll { epoch, value });
        debug!(player = %player_id, value, "Die thrown");
        self.events.push(GameEvent::DieRolled {
            player: player_id,
            value,
        });
        self.persist();
        Ok(value)
    }

    /// Pegs of `player_id` that can legally move `die_roll` spaces
    pub fn get_selectable_pegs(&self, player_id: &str, die_roll: u8) -> Vec<Peg> {
        let Some(player) = self.player(player_id) else {
            return Vec::new();
        };
        MoveValidator::new(&self.pegs)
            .valid_moves(player_id, die_roll, player.color)
            .into_iter()
            .filter_map(|m| self.peg(m.peg_id).cloned())
            .collect()
    }

    /// Validate moving `peg_id` by `die_roll` for the player whose turn it is
    pub fn get_move_validation(&self, peg_id: PegId, die_roll: u8) -> ValidationResult {
        let peg = self.peg(peg_id).ok_or(InvalidMove::PegNotFound)?;
        let mover = self
            .turn
            .as_ref()
            .map(|t| t.player_id.as_str())
            .unwrap_or(peg.player_id.as_str());
        let color = self.player(mover).map(|p| p.color).ok_or(InvalidMove::PlayerNotFound)?;
        rules::validate_move(peg, die_roll, color, &self.pegs)
    }

    /// Mark `peg_id` as the current player's selection. Only legal pegs for
    /// the committed roll can be selected.
    pub fn select_peg(&mut self, peg_id: PegId) -> bool {
        let die_roll = match &self.turn {
            Some(Turn {
                phase: TurnPhase::AwaitingMove,
                die_roll: Some(roll),
                ..
            }) => *roll,
            _ => return false,
        };
        if self.get_move_validation(peg_id, die_roll).is_err() {
            return false;
        }
        if let Some(turn) = self.turn.as_mut() {
            turn.selected_peg = Some(peg_id);
        }
        true
    }

    /// Move `peg_id` to `target` with the committed roll. Returns false when
    /// there is no committed roll, the move is illegal, or `target` is not
    /// where the move leads.
    pub fn execute_peg_move(&mut self, peg_id: PegId, target: PegLocation) -> bool {
        if self.status != GameStatus::Playing {
            warn!("Move rejected: no game in progress");
            return false;
        }
        let (player_id, die_roll) = match &self.turn {
            Some(Turn {
                phase: TurnPhase::AwaitingMove,
                die_roll: Some(roll),
                player_id,
                ..
            }) => (player_id.clone(), *roll),
            _ => {
                warn!(peg = %peg_id, "Move rejected: no pending die roll");
                return false;
            }
        };
        let Some(color) = self.player(&player_id).map(|p| p.color) else {
            return false;
        };

        let validation = match self.peg(peg_id) {
            Some(peg) => rules::validate_move(peg, die_roll, color, &self.pegs),
            None => Err(InvalidMove::PegNotFound),
        };
        let outcome = match validation {
            Ok(outcome) => outcome,
            Err(reason) => {
                info!(peg = %peg_id, die_roll, %reason, "Move rejected");
                return false;
            }
        };
        if outcome.new_location != target {
            warn!(peg = %peg_id, %target, expected = %outcome.new_location, "Move rejected: wrong target");
            return false;
        }

        self.cancel_turn_timers();
        self.bump_epoch();
        self.apply_outcome(peg_id, &outcome);

        let Some(turn) = self.turn.as_mut() else {
            return false;
        };
        turn.record_move();
        if outcome.lands_on_double_trouble() {
            let remaining = turn.grant_extra_turn();
            info!(player = %player_id, remaining, "Double Trouble: extra turn");
            self.events.push(GameEvent::ExtraTurnGranted {
                player: player_id.clone(),
                remaining,
            });
        }

        if outcome.enters_finish && self.check_victory_condition(&player_id) {
            self.persist();
            return true;
        }

        // a move spends the whole roll, so only RollAgain or EndTurn follow it
        let decision = match &self.turn {
            Some(turn) => {
                let further = turn.moves_available > 0
                    && rules::has_valid_moves(&player_id, turn.moves_available, &self.pegs, color);
                turn.check_turn_end(further)
            }
            None => TurnDecision::EndTurn,
        };
        match decision {
            TurnDecision::RollAgain => debug!(player = %player_id, "Player may roll again"),
            TurnDecision::KeepMoving => self.start_move_timer(),
            TurnDecision::EndTurn => self.end_turn(),
        }

        self.persist();
        true
    }

    /// Whole seconds left on the move timer; 0 when no timer is running
    pub fn get_remaining_turn_time(&self) -> u64 {
        let Some(start) = self.turn.as_ref().and_then(|t| t.start_time) else {
            return 0;
        };
        let elapsed = self.scheduler.now_ms().saturating_sub(start);
        let remaining_ms = (self.config.turn_timeout_secs * 1000).saturating_sub(elapsed);
        (remaining_ms + 999) / 1000
    }

    pub fn should_show_timeout_warning(&self) -> bool {
        self.turn.as_ref().map_or(false, |t| t.timeout_warning)
    }

    pub fn is_turn_timer_active(&self) -> bool {
        self.turn.as_ref().map_or(false, |t| t.start_time.is_some())
    }

    /// True when every peg of `player_id` is in FINISH. The first time this
    /// holds during a game, the game ends with that player as winner.
    pub fn check_victory_condition(&mut self, player_id: &str) -> bool {
        let owned: Vec<&Peg> = self.pegs.iter().filter(|p| p.player_id == player_id).collect();
        let won = owned.len() == PEGS_PER_PLAYER as usize && owned.iter().all(|p| p.is_in_finish());
        if won && self.status == GameStatus::Playing {
            self.status = GameStatus::Finished;
            self.winner = Some(player_id.to_string());
            self.scheduler.cancel_all();
            self.turn_timers.clear();
            if let Some(turn) = self.turn.as_mut() {
                turn.stop_timer();
            }
            self.die.is_rolling = false;
            self.bump_epoch();
            info!(player = %player_id, "Game won");
            self.events.push(GameEvent::GameWon {
                player: player_id.to_string(),
            });
            self.persist();
        }
        won
    }

    /// Drop the game and every pending timer, back to setup
    pub fn reset_game(&mut self) {
        self.scheduler.cancel_all();
        self.turn_timers.clear();
        self.players.clear();
        self.pegs.clear();
        self.turn = None;
        self.winner = None;
        self.die = DieState::default();
        self.status = GameStatus::Setup;
        self.bump_epoch();
        info!("Game reset");
        self.events.push(GameEvent::GameReset);
        self.persist();
    }

    /// Move the session clock forward, running everything that falls due
    pub fn advance_time(&mut self, elapsed: Duration) {
        let target = self.scheduler.now_ms().saturating_add(elapsed.as_millis() as u64);
        while let Some((id, task)) = self.scheduler.pop_due(target) {
            self.dispatch(id, task);
        }
        self.scheduler.advance_to(target);
    }

    /// Take the events produced since the last call
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Capture the persistent state
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            game_id: self.game_id,
            saved_at: Utc::now(),
            game_state: self.status,
            players: self.players.clone(),
            pegs: self.pegs.clone(),
            current_turn: self.turn.clone(),
            winner: self.winner.clone(),
            die_state: self.die.clone(),
        }
    }

    /// Replace the session state with `snapshot`. Work that was in flight
    /// when it was taken is settled: a throw that had not committed is
    /// dropped, a non-interactive phase ends the turn, and a move timer
    /// restarts from now.
    pub fn restore(&mut self, snapshot: SessionSnapshot) {
        self.scheduler.cancel_all();
        self.turn_timers.clear();
        self.game_id = snapshot.game_id;
        self.status = snapshot.game_state;
        self.players = snapshot.players;
        self.pegs = snapshot.pegs;
        self.turn = snapshot.current_turn;
        self.winner = snapshot.winner;
        self.die = snapshot.die_state;
        self.die.is_rolling = false;
        self.bump_epoch();

        if self.status != GameStatus::Playing {
            return;
        }
        let Some(phase) = self.turn.as_ref().map(|t| t.phase) else {
            self.turn = self.players.first().map(|p| Turn::new(p.id.clone()));
            return;
        };
        match phase {
            TurnPhase::AwaitingRoll => {}
            TurnPhase::RollResolving => {
                if let Some(turn) = self.turn.as_mut() {
                    turn.phase = TurnPhase::AwaitingRoll;
                }
            }
            TurnPhase::AwaitingMove => self.start_move_timer(),
            TurnPhase::Resolving => self.end_turn(),
        }
        debug!(game_id = %self.game_id, "Session restored");
    }

    pub fn game_id(&self) -> Uuid {
        self.game_id
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn pegs(&self) -> &[Peg] {
        &self.pegs
    }

    pub fn current_turn(&self) -> Option<&Turn> {
        self.turn.as_ref()
    }

    pub fn winner(&self) -> Option<&str> {
        self.winner.as_deref()
    }

    pub fn die_state(&self) -> &DieState {
        &self.die
    }

    /// Session clock in milliseconds
    pub fn now_ms(&self) -> u64 {
        self.scheduler.now_ms()
    }

    pub fn peg(&self, id: PegId) -> Option<&Peg> {
        self.pegs.iter().find(|p| p.id == id)
    }

    pub fn player(&self, id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    fn dispatch(&mut self, id: TimerId, task: ScheduledTask) {
        self.turn_timers.retain(|t| *t != id);
        if task.epoch() != self.epoch || self.status != GameStatus::Playing {
            debug!(?task, "Dropping stale task");
            return;
        }
        match task {
            ScheduledTask::ResolveRoll { value, .. } => self.resolve_roll(value),
            ScheduledTask::TimeoutWarning { .. } => self.raise_timeout_warning(),
            ScheduledTask::TimeoutExpired { .. } => self.expire_turn(),
            ScheduledTask::ForcedHomeExit { roller, next_seat, .. } => self.forced_home_exit(roller, next_seat),
            ScheduledTask::AutoEndTurn { .. } => self.end_turn(),
        }
        self.persist();
    }

    fn resolve_roll(&mut self, value: u8) {
        self.die.is_rolling = false;
        let Some(turn) = self.turn.as_mut() else {
            return;
        };
        let granted = turn.commit_roll(value);
        let player_id = turn.player_id.clone();
        if granted {
            self.events.push(GameEvent::ExtraTurnGranted {
                player: player_id.clone(),
                remaining: turn.extra_turns_remaining,
            });
        }

        if value == 1 {
            turn.phase = TurnPhase::Resolving;
            turn.stop_timer();
            info!(player = %player_id, "Rolled a 1: opponents may leave HOME");
            self.events.push(GameEvent::RollCommitted {
                player: player_id.clone(),
                value,
                has_moves: false,
            });
            self.schedule_forced_exit(player_id, 0);
            return;
        }

        let has_moves = self
            .player(&player_id)
            .map_or(false, |p| rules::has_valid_moves(&player_id, value, &self.pegs, p.color));
        self.events.push(GameEvent::RollCommitted {
            player: player_id.clone(),
            value,
            has_moves,
        });

        if has_moves {
            self.start_move_timer();
        } else {
            debug!(player = %player_id, value, "No legal move");
            if let Some(turn) = self.turn.as_mut() {
                turn.phase = TurnPhase::Resolving;
            }
            let id = self.scheduler.schedule(
                self.config.no_moves_display(),
                ScheduledTask::AutoEndTurn { epoch: self.epoch },
            );
            self.turn_timers.push(id);
        }
    }

    /// Queue the next forced HOME exit of a roll-of-1 chain, starting the
    /// search at seat `from_seat`. With nobody left, the roller's turn ends.
    fn schedule_forced_exit(&mut self, roller: PlayerId, from_seat: usize) {
        let next_seat = self
            .players
            .iter()
            .enumerate()
            .skip(from_seat)
            .find(|(_, p)| {
                p.id != roller && rules::can_move_from_home_to_start(&p.id, p.color, &self.pegs).is_some()
            })
            .map(|(seat, _)| seat);

        match next_seat {
            Some(next_seat) => {
                let id = self.scheduler.schedule(
                    self.config.forced_move_delay(),
                    ScheduledTask::ForcedHomeExit {
                        epoch: self.epoch,
                        roller,
                        next_seat,
                    },
                );
                self.turn_timers.push(id);
            }
            None => {
                debug!(roller = %roller, "Roll-of-1 chain finished");
                self.advance_to_next_player();
            }
        }
    }

    fn forced_home_exit(&mut self, roller: PlayerId, seat: usize) {
        let still_rollers_turn = self.turn.as_ref().map_or(false, |t| t.player_id == roller);
        if !still_rollers_turn {
            debug!(roller = %roller, "Roll-of-1 chain superseded");
            return;
        }

        if let Some(player) = self.players.get(seat).cloned() {
            // the board may have changed since this step was queued
            let ready = rules::can_move_from_home_to_start(&player.id, player.color, &self.pegs);
            let outcome = ready.and_then(|peg_id| {
                self.peg(peg_id)
                    .and_then(|peg| rules::validate_move(peg, 6, player.color, &self.pegs).ok())
                    .map(|outcome| (peg_id, outcome))
            });
            if let Some((peg_id, outcome)) = outcome {
                self.apply_outcome(peg_id, &outcome);
                info!(peg = %peg_id, roller = %roller, "Forced HOME exit");
                self.events.push(GameEvent::ForcedHomeExit {
                    peg: peg_id,
                    roller: roller.clone(),
                });
            }
        }

        self.schedule_forced_exit(roller, seat + 1);
    }

    fn raise_timeout_warning(&mut self) {
        let Some(turn) = self.turn.as_mut() else {
            return;
        };
        if turn.start_time.is_none() || turn.timeout_warning {
            return;
        }
        turn.timeout_warning = true;
        self.events.push(GameEvent::TimeoutWarning {
            player: turn.player_id.clone(),
        });
    }

    fn expire_turn(&mut self) {
        let Some(player) = self
            .turn
            .as_ref()
            .filter(|t| t.start_time.is_some())
            .map(|t| t.player_id.clone())
        else {
            return;
        };
        warn!(player = %player, "Turn timed out");
        self.events.push(GameEvent::TurnTimedOut { player });
        self.end_turn();
    }

    /// Move the pegs for a validated outcome; captured pegs go HOME
    fn apply_outcome(&mut self, peg_id: PegId, outcome: &MoveOutcome) {
        let mut pegs = self.pegs.clone();
        for captured in outcome.captures() {
            if let Some(peg) = pegs.iter_mut().find(|p| p.id == captured) {
                peg.location = PegLocation::Home;
                info!(peg = %captured, by = %peg_id, "Peg captured");
                self.events.push(GameEvent::PegCaptured {
                    peg: captured,
                    by: peg_id,
                });
            }
        }
        if let Some(peg) = pegs.iter_mut().find(|p| p.id == peg_id) {
            peg.location = outcome.new_location;
        }
        self.pegs = pegs;

        debug!(peg = %peg_id, from = %outcome.from, to = %outcome.new_location, "Peg moved");
        self.events.push(GameEvent::PegMoved {
            peg: peg_id,
            from: outcome.from,
            to: outcome.new_location,
            warped_from: outcome.warped_from,
        });
    }

    /// End the current turn: the same player keeps going on an unspent extra
    /// turn within the roll cap, otherwise control passes on
    fn end_turn(&mut self) {
        self.cancel_turn_timers();
        self.bump_epoch();
        let Some(turn) = self.turn.as_mut() else {
            return;
        };
        if turn.can_roll_again() {
            turn.continue_sequence();
            let player = turn.player_id.clone();
            info!(player = %player, remaining = turn.extra_turns_remaining, "Extra turn");
            self.events.push(GameEvent::TurnEnded {
                player: player.clone(),
                next: player,
            });
        } else {
            self.advance_to_next_player();
        }
    }

    /// Hand a clean turn to the next active player. Banked extra turns that
    /// could not be used are dropped.
    fn advance_to_next_player(&mut self) {
        self.cancel_turn_timers();
        self.bump_epoch();
        let Some(current) = self.turn.as_ref().map(|t| t.player_id.clone()) else {
            return;
        };
        let next = next_active_player(&self.players, &current)
            .map(|p| p.id.clone())
            .unwrap_or_else(|| current.clone());
        info!(from = %current, to = %next, "Turn passes");
        self.turn = Some(Turn::new(next.clone()));
        self.events.push(GameEvent::TurnEnded { player: current, next });
    }

    fn start_move_timer(&mut self) {
        self.cancel_turn_timers();
        let now = self.scheduler.now_ms();
        let epoch = self.epoch;
        match self.turn.as_mut() {
            Some(turn) => {
                turn.start_timer(now);
                turn.phase = TurnPhase::AwaitingMove;
            }
            None => return,
        }
        let warning = self
            .scheduler
            .schedule(self.config.warning_delay(), ScheduledTask::TimeoutWarning { epoch });
        let expiry = self
            .scheduler
            .schedule(self.config.turn_timeout(), ScheduledTask::TimeoutExpired { epoch });
        self.turn_timers.extend([warning, expiry]);
    }

    fn cancel_turn_timers(&mut self) {
        for id in self.turn_timers.drain(..) {
            self.scheduler.cancel(id);
        }
    }

    fn bump_epoch(&mut self) -> u64 {
        self.epoch += 1;
        self.epoch
    }

    fn persist(&self) {
        if let Some(store) = &self.store {
            if let Err(e) = store.save(&self.snapshot()) {
                warn!("Failed to save session snapshot: {:#}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice::ScriptedDice;
    use crate::snapshot::MemorySnapshotStore;
    use crate::default_roster;

    fn red(index: u8) -> PegId {
        PegId::new(PlayerColor::Red, index)
    }

    fn session_with_rolls(rolls: &[u8]) -> GameSession {
        let mut session = GameSession::new(GameConfig::default(), Box::new(ScriptedDice::new(rolls.to_vec())));
        session.initialize_game(&default_roster());
        session
    }

    fn settle(session: &mut GameSession) {
        session.advance_time(session.config().roll_settle());
    }

    fn place(session: &mut GameSession, placements: &[(PegId, PegLocation)]) {
        let mut snapshot = session.snapshot();
        for (id, location) in placements {
            if let Some(peg) = snapshot.pegs.iter_mut().find(|p| p.id == *id) {
                peg.location = *location;
            }
        }
        session.restore(snapshot);
    }

    fn current_player(session: &GameSession) -> &str {
        session.current_turn().map(|t| t.player_id.as_str()).unwrap_or_default()
    }

    #[test]
    fn initialize_requires_two_distinct_active_players() {
        let mut session = GameSession::with_random_die(GameConfig::default());
        let mut roster = default_roster();
        roster[1].is_active = false;
        session.initialize_game(&roster);
        assert_eq!(session.status(), GameStatus::Setup);

        let mut roster = default_roster();
        roster[1].color = PlayerColor::Red;
        session.initialize_game(&roster);
        assert_eq!(session.status(), GameStatus::Setup);
        assert!(session.pegs().is_empty());

        session.initialize_game(&default_roster());
        assert_eq!(session.status(), GameStatus::Playing);
        assert_eq!(session.pegs().len(), 8);
        assert!(session.pegs().iter().all(|p| p.is_in_home()));
        assert_eq!(current_player(&session), "player1");
    }

    #[test]
    fn initialize_rejects_duplicate_player_ids() {
        let mut session = GameSession::with_random_die(GameConfig::default());
        let mut roster = default_roster();
        roster[1].id = roster[0].id.clone();
        session.initialize_game(&roster);
        assert_eq!(session.status(), GameStatus::Setup);
        assert!(session.pegs().is_empty());
        assert!(session.current_turn().is_none());
        assert!(session.drain_events().is_empty());
    }

    #[test]
    fn roll_commits_after_settle() {
        let mut session = session_with_rolls(&[6]);
        assert_eq!(session.roll_die(), Ok(6));
        assert!(session.die_state().is_rolling);
        assert_eq!(session.roll_die(), Err(RollError::AlreadyRolling));

        session.advance_time(Duration::from_millis(999));
        assert_eq!(session.current_turn().unwrap().phase, TurnPhase::RollResolving);

        session.advance_time(Duration::from_millis(1));
        let turn = session.current_turn().unwrap();
        assert_eq!(turn.phase, TurnPhase::AwaitingMove);
        assert_eq!(turn.die_roll, Some(6));
        assert_eq!(turn.extra_turns_remaining, 1);
        assert!(!session.die_state().is_rolling);
        assert_eq!(session.get_remaining_turn_time(), 30);
    }

    #[test]
    fn six_grants_one_more_roll_then_control_passes() {
        let mut session = session_with_rolls(&[6, 2]);
        session.roll_die().unwrap();
        settle(&mut session);
        assert!(!session.execute_peg_move(red(0), PegLocation::Track(3)));
        assert!(session.execute_peg_move(red(0), PegLocation::Track(25)));
        assert_eq!(current_player(&session), "player1");

        assert_eq!(session.roll_die(), Ok(2));
        settle(&mut session);
        assert!(session.execute_peg_move(red(0), PegLocation::Track(27)));
        assert_eq!(current_player(&session), "player2");
        assert_eq!(session.current_turn().unwrap().rolls_this_turn, 0);
    }

    #[test]
    fn double_trouble_past_the_roll_cap_is_dropped() {
        let mut session = session_with_rolls(&[6, 3]);
        session.roll_die().unwrap();
        settle(&mut session);
        assert!(session.execute_peg_move(red(0), PegLocation::Track(25)));
        session.roll_die().unwrap();
        settle(&mut session);
        assert!(session.execute_peg_move(red(0), PegLocation::Track(0)));

        // one from the opening six, one from landing on space 0
        let grants = session
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, GameEvent::ExtraTurnGranted { .. }))
            .count();
        assert_eq!(grants, 2);
        assert_eq!(current_player(&session), "player2");
        assert_eq!(session.current_turn().unwrap().extra_turns_remaining, 0);
    }

    #[test]
    fn no_legal_move_ends_turn_after_display() {
        let mut session = session_with_rolls(&[3]);
        session.roll_die().unwrap();
        settle(&mut session);
        let turn = session.current_turn().unwrap();
        assert_eq!(turn.phase, TurnPhase::Resolving);
        assert!(!session.is_turn_timer_active());

        session.advance_time(Duration::from_millis(1499));
        assert_eq!(current_player(&session), "player1");
        session.advance_time(Duration::from_millis(1));
        assert_eq!(current_player(&session), "player2");
    }

    #[test]
    fn roll_of_one_pulls_opponents_out_in_order() {
        let mut roster = default_roster();
        roster[2].is_active = true;
        let mut session = GameSession::new(GameConfig::default(), Box::new(ScriptedDice::new([1])));
        session.initialize_game(&roster);

        session.roll_die().unwrap();
        settle(&mut session);
        assert_eq!(session.current_turn().unwrap().phase, TurnPhase::Resolving);
        assert!(!session.is_turn_timer_active());

        session.advance_time(Duration::from_millis(800));
        let blue = PegId::new(PlayerColor::Blue, 0);
        assert_eq!(session.peg(blue).unwrap().location, PegLocation::Track(4));
        assert_eq!(current_player(&session), "player1");

        session.advance_time(Duration::from_millis(800));
        let green = PegId::new(PlayerColor::Green, 0);
        assert_eq!(session.peg(green).unwrap().location, PegLocation::Track(11));
        assert_eq!(current_player(&session), "player2");

        assert!(session
            .pegs()
            .iter()
            .filter(|p| p.color() == PlayerColor::Red)
            .all(|p| p.is_in_home()));
        let forced = session
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, GameEvent::ForcedHomeExit { .. }))
            .count();
        assert_eq!(forced, 2);
    }

    #[test]
    fn roll_of_one_without_candidates_passes_immediately() {
        let mut session = session_with_rolls(&[1]);
        place(&mut session, &[(PegId::new(PlayerColor::Blue, 0), PegLocation::Track(4))]);
        session.roll_die().unwrap();
        settle(&mut session);
        assert_eq!(current_player(&session), "player2");
        assert_eq!(session.pegs().iter().filter(|p| !p.is_in_home()).count(), 1);
    }

    #[test]
    fn timeout_warns_then_ends_the_turn() {
        let mut session = session_with_rolls(&[5]);
        place(&mut session, &[(red(0), PegLocation::Track(2))]);
        session.roll_die().unwrap();
        settle(&mut session);
        assert!(session.is_turn_timer_active());

        session.advance_time(Duration::from_secs(20));
        assert!(session.should_show_timeout_warning());
        assert_eq!(session.get_remaining_turn_time(), 10);

        session.advance_time(Duration::from_secs(10));
        assert_eq!(current_player(&session), "player2");
        assert!(!session.is_turn_timer_active());
        assert_eq!(session.get_remaining_turn_time(), 0);
        let events = session.drain_events();
        assert!(events.iter().any(|e| matches!(e, GameEvent::TimeoutWarning { .. })));
        assert!(events.iter().any(|e| matches!(e, GameEvent::TurnTimedOut { .. })));
    }

    #[test]
    fn moving_cancels_the_timeout() {
        let mut session = session_with_rolls(&[4]);
        place(&mut session, &[(red(0), PegLocation::Track(2))]);
        session.roll_die().unwrap();
        settle(&mut session);
        assert!(session.execute_peg_move(red(0), PegLocation::Track(6)));
        assert_eq!(current_player(&session), "player2");

        session.advance_time(Duration::from_secs(60));
        assert_eq!(current_player(&session), "player2");
        assert!(!session
            .drain_events()
            .iter()
            .any(|e| matches!(e, GameEvent::TurnTimedOut { .. })));
    }

    #[test]
    fn move_needs_a_committed_roll() {
        let mut session = session_with_rolls(&[6]);
        assert!(!session.execute_peg_move(red(0), PegLocation::Track(25)));
        session.roll_die().unwrap();
        assert!(!session.execute_peg_move(red(0), PegLocation::Track(25)));
        settle(&mut session);
        assert!(!session.execute_peg_move(PegId::new(PlayerColor::Blue, 0), PegLocation::Track(4)));
        assert!(session.execute_peg_move(red(0), PegLocation::Track(25)));
    }

    #[test]
    fn last_peg_home_wins_once() {
        let mut session = session_with_rolls(&[3]);
        place(
            &mut session,
            &[
                (red(0), PegLocation::Track(22)),
                (red(1), PegLocation::Finish(1)),
                (red(2), PegLocation::Finish(2)),
                (red(3), PegLocation::Finish(3)),
            ],
        );
        session.roll_die().unwrap();
        settle(&mut session);
        assert!(session.execute_peg_move(red(0), PegLocation::Finish(0)));

        assert_eq!(session.status(), GameStatus::Finished);
        assert_eq!(session.winner(), Some("player1"));
        assert!(session.check_victory_condition("player1"));
        assert!(!session.check_victory_condition("player2"));
        assert_eq!(session.roll_die(), Err(RollError::GameNotInProgress));
        let wins = session
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, GameEvent::GameWon { .. }))
            .count();
        assert_eq!(wins, 1);
    }

    #[test]
    fn selectable_pegs_and_validation() {
        let mut session = session_with_rolls(&[6]);
        place(&mut session, &[(red(1), PegLocation::Track(25))]);
        // START is held by red-1, so only red-1 itself can move
        let selectable = session.get_selectable_pegs("player1", 6);
        assert_eq!(selectable.len(), 1);
        assert_eq!(selectable[0].id, red(1));

        assert_eq!(
            session.get_move_validation(red(0), 6),
            Err(InvalidMove::BlockedByOwnPeg)
        );
        assert_eq!(
            session.get_move_validation(PegId::new(PlayerColor::Blue, 0), 6),
            Err(InvalidMove::NotYourPeg)
        );
        assert_eq!(
            session.get_move_validation(PegId::new(PlayerColor::Yellow, 0), 6),
            Err(InvalidMove::PegNotFound)
        );
        assert!(session.get_selectable_pegs("nobody", 6).is_empty());

        session.roll_die().unwrap();
        settle(&mut session);
        assert!(!session.select_peg(red(0)));
        assert!(session.select_peg(red(1)));
        assert_eq!(session.current_turn().unwrap().selected_peg, Some(red(1)));
    }

    #[test]
    fn restore_drops_an_unsettled_roll() {
        let mut session = session_with_rolls(&[4]);
        session.roll_die().unwrap();
        let snapshot = session.snapshot();

        let mut resumed = GameSession::new(GameConfig::default(), Box::new(ScriptedDice::new([2])));
        resumed.restore(snapshot);
        assert!(!resumed.die_state().is_rolling);
        assert_eq!(resumed.current_turn().unwrap().phase, TurnPhase::AwaitingRoll);
        assert_eq!(resumed.roll_die(), Ok(2));
    }

    #[test]
    fn store_resumes_a_saved_game() {
        let store = MemorySnapshotStore::new();
        let mut session = GameSession::with_store(
            GameConfig::default(),
            Box::new(ScriptedDice::new([6])),
            Box::new(store.clone()),
        );
        session.initialize_game(&default_roster());
        session.roll_die().unwrap();
        settle(&mut session);
        assert!(session.execute_peg_move(red(0), PegLocation::Track(25)));

        let resumed = GameSession::with_store(
            GameConfig::default(),
            Box::new(ScriptedDice::new([1])),
            Box::new(store.clone()),
        );
        assert_eq!(resumed.game_id(), session.game_id());
        assert_eq!(resumed.pegs(), session.pegs());
        assert_eq!(resumed.current_turn(), session.current_turn());
    }

    #[test]
    fn seeded_store_resumes_with_the_roll_dropped() {
        let mut session = session_with_rolls(&[4]);
        session.roll_die().unwrap();
        let store = MemorySnapshotStore::with_snapshot(session.snapshot());

        let mut resumed = GameSession::with_store(
            GameConfig::default(),
            Box::new(ScriptedDice::new([3])),
            Box::new(store.clone()),
        );
        assert_eq!(resumed.game_id(), session.game_id());
        assert_eq!(resumed.status(), GameStatus::Playing);
        assert!(!resumed.die_state().is_rolling);
        assert_eq!(resumed.current_turn().unwrap().phase, TurnPhase::AwaitingRoll);
        assert_eq!(resumed.roll_die(), Ok(3));
        assert_eq!(store.latest().map(|s| s.game_id), Some(session.game_id()));
    }

    #[test]
    fn reset_clears_everything() {
        let mut session = session_with_rolls(&[5]);
        place(&mut session, &[(red(0), PegLocation::Track(2))]);
        session.roll_die().unwrap();
        settle(&mut session);
        session.drain_events();

        session.reset_game();
        assert_eq!(session.status(), GameStatus::Setup);
        assert!(session.pegs().is_empty());
        assert!(session.current_turn().is_none());
        assert_eq!(session.die_state(), &DieState::default());

        session.advance_time(Duration::from_secs(60));
        assert_eq!(session.drain_events(), vec![GameEvent::GameReset]);
    }
}
