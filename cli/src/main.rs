// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trouble CLI - play a local game in the terminal
//!
//! The game is saved after every change and resumed on the next start unless
//! `--new-game` is given.

use anyhow::{anyhow, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio::io::AsyncBufReadExt;
use tokio::signal;
use tracing_subscriber::EnvFilter;
use trouble_cli::command::HELP;
use trouble_cli::{parse_command, render, Command};
use trouble_core::config::load_config;
use trouble_core::{
    default_roster, DiceRoller, FileSnapshotStore, GameSession, GameStatus, StreakBreakingDie, TurnPhase,
};

/// How often the session clock is advanced
const TICK: Duration = Duration::from_millis(50);

/// Command-line arguments
#[derive(Parser, Debug)]
#[clap(name = "trouble-cli", about = "Play Trouble in the terminal", version)]
struct Args {
    /// Number of players (2-4)
    #[clap(short, long, default_value = "2")]
    players: usize,

    /// Seed for the die (random when omitted)
    #[clap(long)]
    seed: Option<u64>,

    /// Config file (defaults to the user config directory)
    #[clap(long)]
    config: Option<PathBuf>,

    /// Snapshot file used to save and resume the game
    #[clap(long)]
    snapshot: Option<PathBuf>,

    /// Start a new game even if a saved one exists
    #[clap(long)]
    new_game: bool,

    /// Enable debug logging
    #[clap(long)]
    debug: bool,
}

/// Main entry point
#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.debug { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with_writer(std::io::stderr)
        .init();

    if !(2..=4).contains(&args.players) {
        return Err(anyhow!("Invalid player count. Must be between 2 and 4."));
    }

    let config_path = match args.config {
        Some(path) => path,
        None => trouble_cli::default_config_path()?,
    };
    let config = load_config(&config_path)?;

    let roller: Box<dyn DiceRoller> = match args.seed {
        Some(seed) => Box::new(StreakBreakingDie::seeded(seed)),
        None => Box::new(StreakBreakingDie::from_entropy()),
    };
    let snapshot_path = match args.snapshot {
        Some(path) => path,
        None => trouble_cli::default_snapshot_path()?,
    };
    tracing::debug!("Using snapshot file {}", snapshot_path.display());

    let mut session = GameSession::with_store(config, roller, Box::new(FileSnapshotStore::new(snapshot_path)));
    if args.new_game || session.status() != GameStatus::Playing {
        start_new_game(&mut session, args.players);
    } else {
        println!("Resuming saved game.");
    }

    run_game_loop(&mut session, args.players).await
}

fn start_new_game(session: &mut GameSession, players: usize) {
    let mut roster = default_roster();
    for (seat, player) in roster.iter_mut().enumerate() {
        player.is_active = seat < players;
    }
    session.reset_game();
    session.initialize_game(&roster);
    session.drain_events();
}

/// Run the main game loop
async fn run_game_loop(session: &mut GameSession, players: usize) -> Result<()> {
    println!("{}", HELP);
    print_board(session);
    print_prompt(session);

    let mut stdin_lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    let mut ticker = tokio::time::interval(TICK);
    let mut last_tick = Instant::now();

    loop {
        tokio::select! {
            // Handle Ctrl+C gracefully
            _ = signal::ctrl_c() => {
                println!("\nReceived Ctrl+C, the game is saved.");
                break;
            }

            _ = ticker.tick() => {
                let now = Instant::now();
                let before = session.current_turn().map(|t| (t.player_id.clone(), t.phase));
                session.advance_time(now - last_tick);
                last_tick = now;

                if print_events(session) {
                    let after = session.current_turn().map(|t| (t.player_id.clone(), t.phase));
                    if before != after {
                        print_prompt(session);
                    }
                }
            }

            result = stdin_lines.next_line() => {
                let line = match result {
                    Ok(Some(line)) => line,
                    Ok(None) => break, // EOF
                    Err(e) => {
                        eprintln!("Error reading input: {}", e);
                        continue;
                    }
                };
                if line.trim().is_empty() {
                    continue;
                }

                let command = match parse_command(&line) {
                    Ok(command) => command,
                    Err(e) => {
                        eprintln!("{}", e);
                        continue;
                    }
                };

                match command {
                    Command::Quit => break,
                    Command::Help => println!("{}", HELP),
                    Command::Board => print_board(session),
                    Command::New => {
                        start_new_game(session, players);
                        print_board(session);
                    }
                    Command::Roll => {
                        if let Err(e) = session.roll_die() {
                            eprintln!("Cannot roll: {}", e);
                        }
                    }
                    Command::Pegs => list_selectable_pegs(session),
                    Command::Move(n) => move_selectable_peg(session, n),
                }

                print_events(session);
                if session.status() == GameStatus::Finished {
                    print_board(session);
                    println!("Type 'new' for another game or 'quit' to leave.");
                } else if command != Command::Help {
                    print_prompt(session);
                }
            }
        }
    }

    Ok(())
}

/// The committed roll of the current turn, if a move is expected
fn committed_roll(session: &GameSession) -> Option<(String, u8)> {
    let turn = session.current_turn()?;
    match (turn.phase, turn.die_roll) {
        (TurnPhase::AwaitingMove, Some(roll)) => Some((turn.player_id.clone(), roll)),
        _ => None,
    }
}

fn list_selectable_pegs(session: &GameSession) {
    let Some((player, roll)) = committed_roll(session) else {
        println!("Roll first.");
        return;
    };
    for (n, peg) in session.get_selectable_pegs(&player, roll).iter().enumerate() {
        let target = session
            .get_move_validation(peg.id, roll)
            .map(|outcome| outcome.new_location.to_string())
            .unwrap_or_else(|reason| reason.to_string());
        println!("  {}: {} at {} -> {}", n + 1, render::peg_label(peg.id), peg.location, target);
    }
}

fn move_selectable_peg(session: &mut GameSession, n: usize) {
    let Some((player, roll)) = committed_roll(session) else {
        println!("Roll first.");
        return;
    };
    let selectable = session.get_selectable_pegs(&player, roll);
    let Some(peg) = selectable.get(n - 1) else {
        println!("No peg number {}. Type 'pegs' to list them.", n);
        return;
    };
    match session.get_move_validation(peg.id, roll) {
        Ok(outcome) => {
            if !session.execute_peg_move(peg.id, outcome.new_location) {
                println!("That move is not allowed.");
            }
        }
        Err(reason) => println!("Cannot move {}: {}", render::peg_label(peg.id), reason),
    }
}

/// Print pending events; returns whether anything was printed
fn print_events(session: &mut GameSession) -> bool {
    let mut printed = false;
    for event in session.drain_events() {
        if let Some(line) = render::render_event(&event) {
            println!("{}", line);
            printed = true;
        }
    }
    printed
}

fn print_board(session: &GameSession) {
    println!("\n{}", render::render_board(session.players(), session.pegs()));
}

fn print_prompt(session: &GameSession) {
    if session.status() != GameStatus::Playing {
        return;
    }
    let Some(turn) = session.current_turn() else {
        return;
    };
    let name = session
        .player(&turn.player_id)
        .map(|p| format!("{} ({})", p.name, p.color))
        .unwrap_or_else(|| turn.player_id.clone());
    match turn.phase {
        TurnPhase::AwaitingRoll => println!("\n{} to roll.", name),
        TurnPhase::AwaitingMove => println!(
            "\n{} rolled {}. Pick a peg ({}s left).",
            name,
            turn.die_roll.unwrap_or_default(),
            session.get_remaining_turn_time()
        ),
        TurnPhase::RollResolving | TurnPhase::Resolving => {}
    }
}
