use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::card::{Card, CARD_SIZE};

/// Which pattern of marked cells counts as a win
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WinRule {
    /// Any full row, column, or either diagonal
    Line,
    /// Every cell on the card
    #[default]
    Blackout,
}

/// How winners are recorded in a room
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WinnerMode {
    /// The first winner ends the game
    #[default]
    Single,
    /// Every qualifying player is ranked; the draw continues until the pool is empty
    Ranked,
}

impl fmt::Display for WinRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WinRule::Line => write!(f, "line"),
            WinRule::Blackout => write!(f, "blackout"),
        }
    }
}

impl fmt::Display for WinnerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WinnerMode::Single => write!(f, "single"),
            WinnerMode::Ranked => write!(f, "ranked"),
        }
    }
}

/// Rule pair fixed when a room is created
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomRules {
    pub win_rule: WinRule,
    pub winner_mode: WinnerMode,
}

pub type MarkedCells = [[bool; CARD_SIZE]; CARD_SIZE];

/// Marks every cell whose number has been drawn. The free centre is always marked.
pub fn marked_cells(card: &Card, drawn_numbers: &[u8]) -> MarkedCells {
    let drawn: HashSet<u8> = drawn_numbers.iter().copied().collect();
    let mut marked = [[false; CARD_SIZE]; CARD_SIZE];

    for (row, cells) in card.rows().iter().enumerate() {
        for (col, cell) in cells.iter().enumerate() {
            marked[row][col] = match cell.as_number() {
                Some(number) => drawn.contains(&number),
                None => true,
            };
        }
    }

    marked
}

/// Checks a card against the drawn numbers under the given rule
pub fn check_win(card: &Card, drawn_numbers: &[u8], rule: WinRule) -> bool {
    let marked = marked_cells(card, drawn_numbers);

    match rule {
        WinRule::Blackout => marked.iter().all(|row| row.iter().all(|m| *m)),
        WinRule::Line => has_line(&marked),
    }
}

fn has_line(marked: &MarkedCells) -> bool {
    let any_row = marked.iter().any(|row| row.iter().all(|m| *m));
    let any_column = (0..CARD_SIZE).any(|col| marked.iter().all(|row| row[col]));
    let diagonal = (0..CARD_SIZE).all(|i| marked[i][i]);
    let anti_diagonal = (0..CARD_SIZE).all(|i| marked[i][CARD_SIZE - 1 - i]);

    any_row || any_column || diagonal || anti_diagonal
}
