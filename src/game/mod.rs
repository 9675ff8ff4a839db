// Public API
pub use card::{generate_card, BingoNumber, Card, CardError, Column, CARD_SIZE, POOL_SIZE};
pub use draw::{available_numbers, DrawEngine};
pub use errors::GameError;
pub use rules::{check_win, marked_cells, MarkedCells, RoomRules, WinRule, WinnerMode};

// Internal modules
mod card;
mod draw;
mod errors;
mod rules;

#[cfg(test)]
pub(crate) use card::test_cards;
#[cfg(test)]
pub(crate) use draw::test_sources;
