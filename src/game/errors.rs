use thiserror::Error;

/// Rule violations raised by the draw engine and the reconciler
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("Draw unavailable: all 75 numbers have been drawn")]
    ExhaustedPool,

    #[error("Number {0} has already been drawn")]
    DuplicateDraw(u8),

    #[error("Game is over: a winner has already been declared")]
    GameAlreadyWon,

    #[error("Number {0} is outside the draw pool")]
    InvalidNumber(i64),
}
