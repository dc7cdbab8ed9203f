// SPDX-License-Identifier: MIT OR Apache-2.0

//! ASCII board rendering for the CLI.

use trouble_core::board::{self, FINISH_SLOTS, TRACK_SPACES};
use trouble_core::{GameEvent, Peg, PegId, Player, PlayerColor};

/// Spaces per printed row of the track
const ROW_WIDTH: u8 = 7;

/// Render the track, then each player's HOME and FINISH.
///
/// Track cells read `NNm pp`: the space number, a marker (`*` Double
/// Trouble, `~` warp, `>` a START space) and the occupying peg.
pub fn render_board(players: &[Player], pegs: &[Peg]) -> String {
    let mut output = String::new();

    for row_start in (0..TRACK_SPACES).step_by(ROW_WIDTH as usize) {
        let cells: Vec<String> = (row_start..row_start + ROW_WIDTH)
            .map(|pos| {
                let occupant = pegs
                    .iter()
                    .find(|p| p.track_position() == Some(pos))
                    .map(|p| peg_label(p.id))
                    .unwrap_or_else(|| "..".to_string());
                format!("{:02}{}{}", pos, space_marker(pos), occupant)
            })
            .collect();
        output.push_str(&cells.join("  "));
        output.push('\n');
    }

    for player in players {
        let own: Vec<&Peg> = pegs.iter().filter(|p| p.player_id == player.id).collect();
        let home: Vec<String> = own.iter().filter(|p| p.is_in_home()).map(|p| peg_label(p.id)).collect();
        let finish: Vec<String> = (0..FINISH_SLOTS)
            .map(|slot| {
                own.iter()
                    .find(|p| p.finish_position() == Some(slot))
                    .map(|p| format!("[{}]", peg_label(p.id)))
                    .unwrap_or_else(|| "[  ]".to_string())
            })
            .collect();
        output.push_str(&format!(
            "{:<8} {:<6} HOME: {:<11} FINISH: {}\n",
            player.name,
            player.color.name(),
            home.join(" "),
            finish.concat()
        ));
    }

    output
}

fn space_marker(pos: u8) -> char {
    if board::is_double_trouble(pos) {
        '*'
    } else if board::warp_partner(pos).is_some() {
        '~'
    } else if board::start_owner(pos).is_some() {
        '>'
    } else {
        ' '
    }
}

/// Two-character label such as `R0` or `Y3`
pub fn peg_label(id: PegId) -> String {
    let initial = match id.color {
        PlayerColor::Red => 'R',
        PlayerColor::Blue => 'B',
        PlayerColor::Green => 'G',
        PlayerColor::Yellow => 'Y',
    };
    format!("{}{}", initial, id.index)
}

/// One line describing an event, or `None` for events the prompt already
/// makes obvious
pub fn render_event(event: &GameEvent) -> Option<String> {
    let line = match event {
        GameEvent::GameStarted { players } => format!("New game: {}", players.join(", ")),
        GameEvent::DieRolled { player, value } => format!("{} rolls... {}", player, value),
        GameEvent::RollCommitted { has_moves: false, value: 1, .. } => {
            "Rolled a 1: every opponent may bring a peg out of HOME".to_string()
        }
        GameEvent::RollCommitted { has_moves: false, .. } => "No legal move".to_string(),
        GameEvent::RollCommitted { .. } => return None,
        GameEvent::PegMoved {
            peg,
            from,
            to,
            warped_from: Some(warp),
        } => format!("{} moves {} -> {} (warp from {})", peg_label(*peg), from, to, warp),
        GameEvent::PegMoved { peg, from, to, .. } => format!("{} moves {} -> {}", peg_label(*peg), from, to),
        GameEvent::PegCaptured { peg, by } => format!("{} captures {}!", peg_label(*by), peg_label(*peg)),
        GameEvent::ForcedHomeExit { peg, .. } => format!("{} is pulled out onto START", peg_label(*peg)),
        GameEvent::ExtraTurnGranted { player, remaining } => {
            format!("{} earns an extra turn ({} banked)", player, remaining)
        }
        GameEvent::TimeoutWarning { player } => format!("{}: hurry, time is almost up", player),
        GameEvent::TurnTimedOut { player } => format!("{} ran out of time", player),
        GameEvent::TurnEnded { player, next } if player == next => format!("{} goes again", player),
        GameEvent::TurnEnded { next, .. } => format!("{} to play", next),
        GameEvent::GameWon { player } => format!("{} wins!", player),
        GameEvent::GameReset => "Game reset".to_string(),
    };
    Some(line)
}
