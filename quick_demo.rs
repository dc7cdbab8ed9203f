// SPDX-License-Identifier: MIT OR Apache-2.0

//! Quick Trouble Demo - plays a seeded game to the end without a terminal UI
//!
//! Every seat is driven by the same greedy policy: finish a peg if possible,
//! otherwise capture, otherwise advance the peg furthest along.

use anyhow::{anyhow, Result};
use clap::Parser;
use std::time::Duration;
use trouble_core::{
    default_roster, GameConfig, GameEvent, GameSession, GameStatus, PegLocation, StreakBreakingDie, TurnPhase,
    ValidMove,
};

#[derive(Parser, Debug)]
#[clap(name = "quick_demo", about = "Watch a seeded game of Trouble play itself")]
struct Args {
    /// Die seed
    #[clap(long, default_value = "7")]
    seed: u64,

    /// Number of players (2-4)
    #[clap(short, long, default_value = "4")]
    players: usize,

    /// Give up after this many die rolls
    #[clap(long, default_value = "2000")]
    max_rolls: usize,

    /// Print every event instead of a summary
    #[clap(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();
    if !(2..=4).contains(&args.players) {
        return Err(anyhow!("Invalid player count. Must be between 2 and 4."));
    }

    let mut roster = default_roster();
    for (seat, player) in roster.iter_mut().enumerate() {
        player.is_active = seat < args.players;
    }

    let mut session = GameSession::new(GameConfig::default(), Box::new(StreakBreakingDie::seeded(args.seed)));
    session.initialize_game(&roster);

    let tick = Duration::from_millis(100);
    let mut rolls = 0;
    let mut captures = 0;

    while session.status() == GameStatus::Playing && rolls < args.max_rolls {
        let Some(turn) = session.current_turn().cloned() else {
            break;
        };
        match (turn.phase, turn.die_roll) {
            (TurnPhase::AwaitingRoll, _) => {
                session.roll_die()?;
                rolls += 1;
            }
            (TurnPhase::AwaitingMove, Some(roll)) => {
                let color = session
                    .player(&turn.player_id)
                    .map(|p| p.color)
                    .ok_or_else(|| anyhow!("unknown player {}", turn.player_id))?;
                let moves = trouble_core::rules::get_valid_moves(&turn.player_id, roll, session.pegs(), color);
                if let Some(choice) = pick_move(&moves) {
                    session.execute_peg_move(choice.peg_id, choice.outcome.new_location);
                }
            }
            _ => {}
        }
        session.advance_time(tick);

        for event in session.drain_events() {
            if matches!(event, GameEvent::PegCaptured { .. }) {
                captures += 1;
            }
            if args.verbose {
                println!("{:>8}ms  {:?}", session.now_ms(), event);
            }
        }
    }

    match session.winner() {
        Some(winner) => println!(
            "{} won after {} rolls and {} captures ({:.1}s of game time)",
            winner,
            rolls,
            captures,
            session.now_ms() as f64 / 1000.0
        ),
        None => println!("No winner after {} rolls", rolls),
    }
    Ok(())
}

/// Greedy choice among the legal moves
fn pick_move(moves: &[ValidMove]) -> Option<&ValidMove> {
    moves.iter().max_by_key(|m| {
        let finishing = matches!(m.outcome.new_location, PegLocation::Finish(_)) as u8;
        let capturing = m.outcome.captures().count() as u8;
        let leaving_home = (m.outcome.from == PegLocation::Home) as u8;
        (finishing, capturing, leaving_home)
    })
}
