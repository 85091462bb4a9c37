//! Board geometry.
//!
//! Static tables mapping a color's relative step to a cell on the shared
//! circular path, plus the safe-cell set and the seating table.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Cells on the shared circular path.
pub const PATH_LENGTH: u8 = 52;

/// Cells in each color's private home stretch. The last one is the goal.
pub const STRETCH_LENGTH: u8 = 6;

/// Relative step at which a token leaves the shared path and sits on
/// stretch index 0.
pub const STRETCH_ENTRY_STEP: u8 = PATH_LENGTH - 1;

/// Tokens owned by each color.
pub const TOKENS_PER_COLOR: usize = 4;

/// Maximum seated colors.
pub const MAX_COLORS: usize = 4;

/// Minimum seated colors.
pub const MIN_COLORS: usize = 2;

/// Highest die face.
pub const DIE_FACES: u8 = 6;

/// Roll needed to bring a token out of home. Also grants a bonus turn.
pub const RELEASE_ROLL: u8 = 6;

/// Start cells and the four star cells between them.
const SAFE_CELLS: [u8; 8] = [0, 8, 13, 21, 26, 34, 39, 47];

/// Seating order for 2, 3 and 4 players.
const SEATING: [&[Color]; 3] = [
    &[Color::Blue, Color::Green],
    &[Color::Blue, Color::Red, Color::Green],
    &[Color::Blue, Color::Red, Color::Green, Color::Yellow],
];

/// Token colors, listed clockwise around the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Blue,
    Red,
    Green,
    Yellow,
}

impl Color {
    pub const ALL: [Color; MAX_COLORS] = [Self::Blue, Self::Red, Self::Green, Self::Yellow];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Blue => "blue",
            Self::Red => "red",
            Self::Green => "green",
            Self::Yellow => "yellow",
        }
    }

    /// Absolute cell where this color's tokens enter the shared path.
    pub fn start_offset(&self) -> u8 {
        match self {
            Self::Blue => 0,
            Self::Red => 13,
            Self::Green => 26,
            Self::Yellow => 39,
        }
    }

    /// Last shared cell before this color turns into its home stretch.
    pub fn stretch_entry_cell(&self) -> u8 {
        absolute_cell(*self, STRETCH_ENTRY_STEP - 1)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map a color's relative step to the shared absolute cell.
pub fn absolute_cell(color: Color, relative_step: u8) -> u8 {
    ((color.start_offset() as u16 + relative_step as u16) % PATH_LENGTH as u16) as u8
}

/// Check whether a shared cell protects its occupants from capture.
pub fn is_safe_cell(cell: u8) -> bool {
    SAFE_CELLS.contains(&cell)
}

/// Colors seated for a given player count, in rotation order.
pub fn active_colors(player_count: usize) -> Option<&'static [Color]> {
    if (MIN_COLORS..=MAX_COLORS).contains(&player_count) {
        Some(SEATING[player_count - MIN_COLORS])
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_absolute_cell_wraps() {
        assert_eq!(absolute_cell(Color::Blue, 0), 0);
        assert_eq!(absolute_cell(Color::Blue, 51), 51);
        assert_eq!(absolute_cell(Color::Yellow, 0), 39);
        assert_eq!(absolute_cell(Color::Yellow, 13), 0);
        assert_eq!(absolute_cell(Color::Green, 30), 4);
    }

    #[test]
    fn test_start_cells_are_safe() {
        for color in Color::ALL {
            assert!(is_safe_cell(color.start_offset()), "{color} start");
        }
        assert!(is_safe_cell(8));
        assert!(is_safe_cell(47));
        assert!(!is_safe_cell(1));
        assert!(!is_safe_cell(51));
    }

    #[test]
    fn test_stretch_entry_cell_precedes_start() {
        assert_eq!(Color::Blue.stretch_entry_cell(), 50);
        assert_eq!(Color::Red.stretch_entry_cell(), 11);
    }

    #[test]
    fn test_seating_table() {
        assert_eq!(active_colors(2), Some(&[Color::Blue, Color::Green][..]));
        assert_eq!(active_colors(3).map(|c| c.len()), Some(3));
        assert_eq!(active_colors(4), Some(&Color::ALL[..]));
        assert!(active_colors(1).is_none());
        assert!(active_colors(5).is_none());
    }
}
