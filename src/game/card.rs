use std::fmt;
use std::ops::RangeInclusive;

use rand::Rng;
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::EnumIter;

/// Width and height of a card
pub const CARD_SIZE: usize = 5;

/// Highest number in the draw pool (the pool is 1..=75)
pub const POOL_SIZE: u8 = 75;

/// Numbers per column range
const COLUMN_SPAN: u8 = 15;

/// (row, col) of the free centre cell
pub const FREE_CELL: (usize, usize) = (2, 2);

/// A single cell on a card: a pool number or the free centre
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawBingoNumber", into = "RawBingoNumber")]
pub enum BingoNumber {
    Number(u8),
    Free,
}

impl BingoNumber {
    pub fn as_number(&self) -> Option<u8> {
        match self {
            BingoNumber::Number(n) => Some(*n),
            BingoNumber::Free => None,
        }
    }

    pub fn is_free(&self) -> bool {
        matches!(self, BingoNumber::Free)
    }
}

impl fmt::Display for BingoNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BingoNumber::Number(n) => write!(f, "{}", n),
            BingoNumber::Free => write!(f, "FREE"),
        }
    }
}

/// Wire shape of a cell: a bare number or the string "FREE"
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawBingoNumber {
    Number(u8),
    Text(String),
}

impl TryFrom<RawBingoNumber> for BingoNumber {
    type Error = String;

    fn try_from(raw: RawBingoNumber) -> Result<Self, Self::Error> {
        match raw {
            RawBingoNumber::Number(n) if (1..=POOL_SIZE).contains(&n) => Ok(BingoNumber::Number(n)),
            RawBingoNumber::Number(n) => Err(format!("number out of range: {}", n)),
            RawBingoNumber::Text(s) if s == "FREE" => Ok(BingoNumber::Free),
            RawBingoNumber::Text(s) => Err(format!("invalid cell: {}", s)),
        }
    }
}

impl From<BingoNumber> for RawBingoNumber {
    fn from(value: BingoNumber) -> Self {
        match value {
            BingoNumber::Number(n) => RawBingoNumber::Number(n),
            BingoNumber::Free => RawBingoNumber::Text("FREE".to_string()),
        }
    }
}

/// The five card columns. Column `c` owns the numbers `15c+1..=15c+15`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum Column {
    B = 0,
    I = 1,
    N = 2,
    G = 3,
    O = 4,
}

impl Column {
    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn letter(&self) -> char {
        match self {
            Column::B => 'B',
            Column::I => 'I',
            Column::N => 'N',
            Column::G => 'G',
            Column::O => 'O',
        }
    }

    pub fn range(&self) -> RangeInclusive<u8> {
        let min = (*self as u8) * COLUMN_SPAN + 1;
        min..=min + COLUMN_SPAN - 1
    }

    /// The column a pool number belongs to, if it is in the pool at all
    pub fn for_number(number: u8) -> Option<Column> {
        Column::iter().find(|column| column.range().contains(&number))
    }

    /// How many numbers this column holds on a card
    fn slots(&self) -> usize {
        if self.index() == FREE_CELL.1 {
            CARD_SIZE - 1
        } else {
            CARD_SIZE
        }
    }

    /// Rejection-samples `count` distinct numbers from the column range,
    /// keeping them in draw order
    fn sample_unique<R: Rng + ?Sized>(&self, rng: &mut R, count: usize) -> Vec<u8> {
        let mut picked: Vec<u8> = Vec::with_capacity(count);
        while picked.len() < count {
            let candidate = rng.random_range(self.range());
            if !picked.contains(&candidate) {
                picked.push(candidate);
            }
        }
        picked
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Column::B => "B",
                Column::I => "I",
                Column::N => "N",
                Column::G => "G",
                Column::O => "O",
            }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CardError {
    #[error("Centre cell must be FREE")]
    FreeCellMissing,
    #[error("Unexpected FREE cell at row {row}, column {col}")]
    UnexpectedFree { row: usize, col: usize },
    #[error("Number {number} does not belong in column {column}")]
    OutOfColumnRange { number: u8, column: Column },
    #[error("Number {0} appears more than once")]
    Duplicate(u8),
}

pub type CardRows = [[BingoNumber; CARD_SIZE]; CARD_SIZE];

impl TryFrom<CardRows> for Card {
    type Error = CardError;

    fn try_from(rows: CardRows) -> Result<Self, Self::Error> {
        Card::from_rows(rows)
    }
}

impl From<Card> for CardRows {
    fn from(card: Card) -> Self {
        card.rows
    }
}

/// A 5x5 bingo card indexed as `[row][col]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "CardRows", into = "CardRows")]
pub struct Card {
    rows: CardRows,
}

impl Card {
    /// Builds a card from fixed rows, checking column ranges, uniqueness and the free centre
    pub fn from_rows(rows: CardRows) -> Result<Self, CardError> {
        let mut seen: Vec<u8> = Vec::with_capacity(CARD_SIZE * CARD_SIZE);

        for column in Column::iter() {
            let col = column.index();
            for (row, cells) in rows.iter().enumerate() {
                match cells[col] {
                    BingoNumber::Free if (row, col) == FREE_CELL => {}
                    BingoNumber::Free => return Err(CardError::UnexpectedFree { row, col }),
                    BingoNumber::Number(_) if (row, col) == FREE_CELL => {
                        return Err(CardError::FreeCellMissing)
                    }
                    BingoNumber::Number(number) => {
                        if !column.range().contains(&number) {
                            return Err(CardError::OutOfColumnRange { number, column });
                        }
                        if seen.contains(&number) {
                            return Err(CardError::Duplicate(number));
                        }
                        seen.push(number);
                    }
                }
            }
        }

        Ok(Self { rows })
    }

    pub fn rows(&self) -> &CardRows {
        &self.rows
    }

    pub fn cell(&self, row: usize, col: usize) -> BingoNumber {
        self.rows[row][col]
    }

    /// All numeric cells, row by row
    pub fn numbers(&self) -> impl Iterator<Item = u8> + '_ {
        self.rows
            .iter()
            .flat_map(|row| row.iter())
            .filter_map(BingoNumber::as_number)
    }

    pub fn contains(&self, number: u8) -> bool {
        self.numbers().any(|n| n == number)
    }
}

/// Generates a random card. Each column is filled top to bottom in the order
/// its numbers were sampled, skipping the free centre.
pub fn generate_card() -> Card {
    let mut rng = rand::rng();
    let mut rows = [[BingoNumber::Free; CARD_SIZE]; CARD_SIZE];

    for column in Column::iter() {
        let col = column.index();
        let numbers = column.sample_unique(&mut rng, column.slots());

        let target_rows = (0..CARD_SIZE).filter(|row| (*row, col) != FREE_CELL);
        for (row, number) in target_rows.zip(numbers) {
            rows[row][col] = BingoNumber::Number(number);
        }
    }

    Card { rows }
}
