// SPDX-License-Identifier: MIT OR Apache-2.0

//! Commands typed at the prompt

use anyhow::{anyhow, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Throw the die
    Roll,
    /// Move the n-th selectable peg (1-based, as listed by `pegs`)
    Move(usize),
    /// List the pegs that can move with the committed roll
    Pegs,
    /// Print the board
    Board,
    /// Abandon the current game and deal a fresh one
    New,
    Help,
    Quit,
}

/// Parse one input line. Commands are case-insensitive and `r`, `m`, `p`,
/// `b` and `q` work as shorthands.
pub fn parse_command(input: &str) -> Result<Command> {
    let input = input.trim().to_lowercase();
    let mut parts = input.split_whitespace();
    let Some(word) = parts.next() else {
        return Err(anyhow!("Empty command. Type 'help' for a list."));
    };

    let command = match word {
        "roll" | "r" => Command::Roll,
        "move" | "m" => {
            let n = parts
                .next()
                .ok_or_else(|| anyhow!("Usage: move <n>"))?
                .parse::<usize>()
                .map_err(|_| anyhow!("Peg number must be a positive integer"))?;
            if n == 0 {
                return Err(anyhow!("Peg numbers start at 1"));
            }
            Command::Move(n)
        }
        "pegs" | "p" => Command::Pegs,
        "board" | "b" => Command::Board,
        "new" => Command::New,
        "help" | "h" | "?" => Command::Help,
        "quit" | "q" | "exit" => Command::Quit,
        other => return Err(anyhow!("Unknown command '{}'. Type 'help' for a list.", other)),
    };

    if parts.next().is_some() {
        return Err(anyhow!("Too many arguments for '{}'", word));
    }
    Ok(command)
}

pub const HELP: &str = "\
Commands:
  roll (r)      throw the die
  pegs (p)      list pegs that can move
  move <n> (m)  move the n-th listed peg
  board (b)     show the board
  new           start over
  quit (q)      leave (the game is saved)";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_command() {
        assert_eq!(parse_command("roll").unwrap(), Command::Roll);
        assert_eq!(parse_command("  R ").unwrap(), Command::Roll);
        assert_eq!(parse_command("move 2").unwrap(), Command::Move(2));
        assert_eq!(parse_command("m 1").unwrap(), Command::Move(1));
        assert_eq!(parse_command("quit").unwrap(), Command::Quit);
        assert_eq!(parse_command("board").unwrap(), Command::Board);
    }

    #[test]
    fn test_parse_command_errors() {
        assert!(parse_command("").is_err());
        assert!(parse_command("move").is_err());
        assert!(parse_command("move 0").is_err());
        assert!(parse_command("move two").is_err());
        assert!(parse_command("roll 6").is_err());
        assert!(parse_command("pass").is_err());
    }
}
