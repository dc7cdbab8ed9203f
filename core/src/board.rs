// SPDX-License-Identifier: MIT OR Apache-2.0

//! Board topology: the shared track and its special spaces

use crate::PlayerColor;

/// Number of spaces on the shared circular track
pub const TRACK_SPACES: u8 = 28;

/// Base used to number FINISH slots in the integer position encoding
pub const BOARD_SPACES: u8 = 56;

/// Integer position of a peg in HOME
pub const HOME_POSITION: i32 = -1;

/// Slots in each color's FINISH lane
pub const FINISH_SLOTS: u8 = 4;

/// Spaces that grant an extra turn when landed on
pub const DOUBLE_TROUBLE_SPACES: [u8; 4] = [0, 7, 14, 21];

/// Paired track spaces; landing on one end teleports to the other
pub const WARP_PAIRS: [(u8, u8); 2] = [(3, 17), (10, 24)];

/// Track space a color enters on when leaving HOME
pub fn start_position(color: PlayerColor) -> u8 {
    match color {
        PlayerColor::Red => 25,
        PlayerColor::Blue => 4,
        PlayerColor::Green => 11,
        PlayerColor::Yellow => 18,
    }
}

/// Last track space before a color's START. Passing over it leads into FINISH.
pub fn finish_entry(color: PlayerColor) -> u8 {
    (start_position(color) + TRACK_SPACES - 1) % TRACK_SPACES
}

pub fn is_double_trouble(pos: u8) -> bool {
    DOUBLE_TROUBLE_SPACES.contains(&pos)
}

/// The other end of a warp, if `pos` is a warp space
pub fn warp_partner(pos: u8) -> Option<u8> {
    WARP_PAIRS.iter().find_map(|&(a, b)| {
        if pos == a {
            Some(b)
        } else if pos == b {
            Some(a)
        } else {
            None
        }
    })
}

/// Advance `steps` spaces along the track, wrapping at the end
pub fn advance(pos: u8, steps: u8) -> u8 {
    ((pos as u16 + steps as u16) % TRACK_SPACES as u16) as u8
}

/// Color whose START is at `pos`, if any
pub fn start_owner(pos: u8) -> Option<PlayerColor> {
    PlayerColor::ALL
        .iter()
        .copied()
        .find(|color| start_position(*color) == pos)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_and_entry_spaces() {
        assert_eq!(start_position(PlayerColor::Red), 25);
        assert_eq!(start_position(PlayerColor::Blue), 4);
        assert_eq!(finish_entry(PlayerColor::Red), 24);
        assert_eq!(finish_entry(PlayerColor::Blue), 3);
        assert_eq!(finish_entry(PlayerColor::Green), 10);
        assert_eq!(finish_entry(PlayerColor::Yellow), 17);
        assert_eq!(start_owner(18), Some(PlayerColor::Yellow));
        assert_eq!(start_owner(0), None);
    }

    #[test]
    fn warps_are_symmetric() {
        for &(a, b) in WARP_PAIRS.iter() {
            assert_eq!(warp_partner(a), Some(b));
            assert_eq!(warp_partner(b), Some(a));
        }
        assert_eq!(warp_partner(5), None);
    }

    #[test]
    fn special_spaces_do_not_overlap() {
        for &(a, b) in WARP_PAIRS.iter() {
            assert!(!is_double_trouble(a) && !is_double_trouble(b));
        }
        for color in PlayerColor::ALL {
            let start = start_position(color);
            assert!(!is_double_trouble(start));
            assert!(warp_partner(start).is_none());
        }
    }

    #[test]
    fn advance_wraps() {
        assert_eq!(advance(26, 4), 2);
        assert_eq!(advance(0, 6), 6);
        assert_eq!(advance(27, 1), 0);
    }
}
