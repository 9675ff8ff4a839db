use crate::game::{check_win, GameError, POOL_SIZE};

use super::models::{RoomModel, Winners};

/// Result of merging a drawn number into a room snapshot
#[derive(Debug, Clone)]
pub struct DrawOutcome {
    /// Complete next state; nothing has been written yet
    pub room: RoomModel,
    pub number: u8,
    /// Players who won on this draw, in player-list order
    pub new_winners: Vec<String>,
}

/// Appends `number` to the room's draw and re-evaluates winners.
///
/// Pure: the input snapshot is left untouched and the caller persists the
/// returned room. Rejected draws leave no trace. A draw that finishes the
/// game also pauses autodraw in the returned room.
pub fn apply_draw(room: &RoomModel, number: u8) -> Result<DrawOutcome, GameError> {
    if room.winners.is_finalized() {
        return Err(GameError::GameAlreadyWon);
    }
    if !(1..=POOL_SIZE).contains(&number) {
        return Err(GameError::InvalidNumber(i64::from(number)));
    }
    if room.draw.drawn_numbers.contains(&number) {
        return Err(GameError::DuplicateDraw(number));
    }

    let mut next = room.clone();
    next.draw.drawn_numbers.push(number);

    let drawn = &next.draw.drawn_numbers;
    let rule = next.win_rule;

    let new_winners = match &mut next.winners {
        Winners::Single { winner } => {
            let first = next
                .players
                .iter()
                .find(|p| check_win(&p.card, drawn, rule))
                .map(|p| p.id.clone());
            *winner = first.clone();
            first.into_iter().collect()
        }
        Winners::Ranked { winners } => {
            let qualifying: Vec<String> = next
                .players
                .iter()
                .filter(|p| !winners.contains(&p.id))
                .filter(|p| check_win(&p.card, drawn, rule))
                .map(|p| p.id.clone())
                .collect();
            winners.extend(qualifying.iter().cloned());
            qualifying
        }
    };

    // A finished game has nothing left for the timer to draw
    if next.is_finished() {
        next.draw.is_paused = true;
    }

    Ok(DrawOutcome {
        room: next,
        number,
        new_winners,
    })
}
