//! Tic-tac-toe game logic with a bit-packed board and a perfect-play engine.
//!
//! # Board Encoding (32-bit)
//!
//! ```text
//! Bits 0-17:  Board state (9 cells × 2 bits per cell)
//! Bits 18-31: Unused (always zero)
//!
//! Each cell (2 bits):
//!   0 = empty, 1 = X, 2 = O (3 is never produced)
//!
//! Cell indices (row-major order):
//!   (0,0)=0  (0,1)=1  (0,2)=2
//!   (1,0)=3  (1,1)=4  (1,2)=5
//!   (2,0)=6  (2,1)=7  (2,2)=8
//! ```
//!
//! The side to move is not stored: X always opens, so it follows from the
//! mark counts. Outcomes are likewise recomputed from the cells on demand.

pub mod game;
pub mod round;
pub mod search;

#[cfg(feature = "wasm")]
pub mod wasm;

use std::fmt;
use std::str::FromStr;

use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};

pub use game::{cell_for_key, Game, Scoreboard};
pub use round::{Mode, Round, RoundError, RoundStatus};
pub use search::{best_move, score, SearchMode, Searcher};

/// Number of cells on the board.
pub const CELLS: usize = 9;

/// Index of the center cell.
pub const CENTER: usize = 4;

/// Three cell indices that win when uniformly marked.
pub type WinLine = [usize; 3];

/// The 8 winning lines: 3 rows, 3 columns, 2 diagonals.
pub const WIN_LINES: [WinLine; 8] = [
    [0, 1, 2], // Row 0
    [3, 4, 5], // Row 1
    [6, 7, 8], // Row 2
    [0, 3, 6], // Col 0
    [1, 4, 7], // Col 1
    [2, 5, 8], // Col 2
    [0, 4, 8], // Main diagonal
    [2, 4, 6], // Anti-diagonal
];

/// One of the two players' symbols.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Side {
    X = 1,
    O = 2,
}

impl Side {
    /// Get the other side.
    #[inline]
    pub fn opponent(self) -> Side {
        match self {
            Side::X => Side::O,
            Side::O => Side::X,
        }
    }

    /// Convert from the 2-bit cell value (1 or 2).
    #[inline]
    pub fn from_bits(bits: u8) -> Option<Side> {
        match bits {
            1 => Some(Side::X),
            2 => Some(Side::O),
            _ => None,
        }
    }

    /// The character drawn for this side's mark.
    #[inline]
    pub fn symbol(self) -> char {
        match self {
            Side::X => 'X',
            Side::O => 'O',
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Text that does not name a side.
///
/// The digit `0` is not accepted as a spelling of `O`.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
#[display("invalid side {input:?}: expected X or O")]
pub struct ParseSideError {
    pub input: String,
}

impl FromStr for Side {
    type Err = ParseSideError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "X" | "x" => Ok(Side::X),
            "O" | "o" => Ok(Side::O),
            other => Err(ParseSideError {
                input: other.to_string(),
            }),
        }
    }
}

impl TryFrom<char> for Side {
    type Error = ParseSideError;

    fn try_from(c: char) -> Result<Self, Self::Error> {
        match c {
            'X' | 'x' => Ok(Side::X),
            'O' | 'o' => Ok(Side::O),
            other => Err(ParseSideError {
                input: other.to_string(),
            }),
        }
    }
}

/// State of a single cell.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
pub enum Cell {
    Empty,
    Marked(Side),
}

impl Cell {
    /// Character used by the text notation (`.` for empty).
    pub fn symbol(self) -> char {
        match self {
            Cell::Empty => '.',
            Cell::Marked(side) => side.symbol(),
        }
    }

    #[inline]
    fn bits(self) -> u32 {
        match self {
            Cell::Empty => 0,
            Cell::Marked(side) => side as u32,
        }
    }
}

/// Result of evaluating a board.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
pub enum Outcome {
    Ongoing,
    Win(Side),
    Draw,
}

impl Outcome {
    /// Whether the round is over.
    #[inline]
    pub fn is_terminal(self) -> bool {
        self != Outcome::Ongoing
    }
}

/// Invalid input to a board operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Error)]
pub enum MoveError {
    /// Cell index outside 0-8.
    #[display("cell index {_0} is out of range (expected 0-8)")]
    InvalidIndex(#[error(not(source))] usize),
    /// Cell already holds a mark.
    #[display("cell {_0} is already occupied")]
    OccupiedCell(#[error(not(source))] usize),
    /// No empty cell is left to play.
    #[display("no legal move: the board is full")]
    NoLegalMove,
}

/// Board text that cannot be parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Error)]
pub enum ParseBoardError {
    #[display("expected 9 cells, found {_0}")]
    InvalidLength(#[error(not(source))] usize),
    #[display("invalid cell character {_0:?}")]
    InvalidCell(#[error(not(source))] char),
}

/// Compact board state - fits in a single u32.
///
/// See module documentation for encoding details.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct Board(u32);

impl Board {
    /// Bits per cell.
    const CELL_BITS: u32 = 2;
    /// Mask for a single cell (0b11).
    const CELL_MASK: u32 = 0b11;
    /// Mask for all cell bits.
    const BOARD_MASK: u32 = (1 << 18) - 1;

    /// Bitmasks for winning lines, one bit per cell.
    /// Kept in the same order as `WIN_LINES`.
    const WIN_MASKS: [u16; 8] = [
        0b000_000_111, // Row 0: cells 0,1,2
        0b000_111_000, // Row 1: cells 3,4,5
        0b111_000_000, // Row 2: cells 6,7,8
        0b001_001_001, // Col 0: cells 0,3,6
        0b010_010_010, // Col 1: cells 1,4,7
        0b100_100_100, // Col 2: cells 2,5,8
        0b100_010_001, // Main diagonal: cells 0,4,8
        0b001_010_100, // Anti-diagonal: cells 2,4,6
    ];

    /// Create an empty board.
    #[inline]
    pub fn new() -> Board {
        Board(0)
    }

    /// Create a board from a raw encoding.
    ///
    /// Returns `None` if a cell holds the unused value 3 or bits above the
    /// cell range are set.
    pub fn from_bits(bits: u32) -> Option<Board> {
        if bits & !Self::BOARD_MASK != 0 {
            return None;
        }
        let valid = (0..CELLS).all(|i| (bits >> (i as u32 * Self::CELL_BITS)) & Self::CELL_MASK != 3);
        valid.then_some(Board(bits))
    }

    /// Get the raw encoding.
    #[inline]
    pub fn to_bits(self) -> u32 {
        self.0
    }

    /// Build a board from explicit cell states.
    pub fn from_cells(cells: [Cell; CELLS]) -> Board {
        let bits = cells
            .iter()
            .enumerate()
            .fold(0, |acc, (i, cell)| acc | (cell.bits() << (i as u32 * Self::CELL_BITS)));
        Board(bits)
    }

    /// All 9 cells in index order.
    pub fn cells(&self) -> [Cell; CELLS] {
        std::array::from_fn(|i| self.cell_at(i))
    }

    /// Get the cell at an index, or `None` if the index is out of range.
    #[inline]
    pub fn cell(&self, index: usize) -> Option<Cell> {
        (index < CELLS).then(|| self.cell_at(index))
    }

    #[inline]
    fn cell_at(&self, index: usize) -> Cell {
        let bits = (self.0 >> (index as u32 * Self::CELL_BITS)) & Self::CELL_MASK;
        match Side::from_bits(bits as u8) {
            Some(side) => Cell::Marked(side),
            None => Cell::Empty,
        }
    }

    /// Check whether a cell holds a mark.
    pub fn is_occupied(&self, index: usize) -> Result<bool, MoveError> {
        self.cell(index)
            .map(|cell| cell != Cell::Empty)
            .ok_or(MoveError::InvalidIndex(index))
    }

    /// Check whether no cell holds a mark.
    #[inline]
    pub fn is_blank(&self) -> bool {
        self.0 == 0
    }

    /// Check whether every cell holds a mark.
    #[inline]
    pub fn is_full(&self) -> bool {
        let (x, o) = self.occupancy();
        (x | o) == 0b111_111_111
    }

    /// Indices of empty cells, ascending.
    pub fn empty_cells(&self) -> impl Iterator<Item = usize> + '_ {
        (0..CELLS).filter(move |&i| self.cell_at(i) == Cell::Empty)
    }

    /// Number of marks a side has on the board.
    pub fn count(&self, side: Side) -> usize {
        let (x, o) = self.occupancy();
        match side {
            Side::X => x.count_ones() as usize,
            Side::O => o.count_ones() as usize,
        }
    }

    /// The side whose turn it is, derived from the mark counts.
    ///
    /// X always opens, so X moves when the counts are equal and O moves when
    /// X leads by one. Any other difference cannot arise from alternating
    /// play and yields `None`.
    pub fn side_to_move(&self) -> Option<Side> {
        let x = self.count(Side::X);
        let o = self.count(Side::O);
        if x == o {
            Some(Side::X)
        } else if x == o + 1 {
            Some(Side::O)
        } else {
            None
        }
    }

    // ========== Moves ==========

    /// Place a side's mark on an empty cell and evaluate the result.
    ///
    /// On error the board is left unchanged.
    pub fn place(&mut self, index: usize, side: Side) -> Result<Outcome, MoveError> {
        if self.is_occupied(index)? {
            return Err(MoveError::OccupiedCell(index));
        }
        *self = self.with_mark(index, side);
        Ok(self.evaluate())
    }

    /// Return a copy of the board with the move applied, plus its outcome.
    pub fn apply_move(&self, index: usize, side: Side) -> Result<(Board, Outcome), MoveError> {
        let mut next = *self;
        let outcome = next.place(index, side)?;
        Ok((next, outcome))
    }

    /// Every legal placement for `side`, as `(index, resulting board)`,
    /// in ascending index order.
    pub fn children(&self, side: Side) -> impl Iterator<Item = (usize, Board)> + '_ {
        self.empty_cells().map(move |i| (i, self.with_mark(i, side)))
    }

    /// Set a cell known to be empty.
    #[inline]
    fn with_mark(&self, index: usize, side: Side) -> Board {
        debug_assert!(self.cell_at(index) == Cell::Empty);
        Board(self.0 | ((side as u32) << (index as u32 * Self::CELL_BITS)))
    }

    // ========== Win Detection ==========

    /// Occupancy masks for both sides.
    /// Returns (x_mask, o_mask) where bit i is set if that side marked cell i.
    #[inline]
    pub fn occupancy(&self) -> (u16, u16) {
        let mut x_mask = 0u16;
        let mut o_mask = 0u16;

        for i in 0..CELLS {
            match (self.0 >> (i as u32 * Self::CELL_BITS)) & Self::CELL_MASK {
                1 => x_mask |= 1 << i,
                2 => o_mask |= 1 << i,
                _ => {}
            }
        }

        (x_mask, o_mask)
    }

    /// Evaluate the board: a completed line wins, otherwise a full board is
    /// a draw, otherwise the game goes on.
    pub fn evaluate(&self) -> Outcome {
        let (x_mask, o_mask) = self.occupancy();

        for &win_mask in &Self::WIN_MASKS {
            if (x_mask & win_mask) == win_mask {
                return Outcome::Win(Side::X);
            }
            if (o_mask & win_mask) == win_mask {
                return Outcome::Win(Side::O);
            }
        }

        if (x_mask | o_mask) == 0b111_111_111 {
            Outcome::Draw
        } else {
            Outcome::Ongoing
        }
    }

    /// The first completed line in `WIN_LINES` order, if any.
    pub fn winning_line(&self) -> Option<WinLine> {
        let (x_mask, o_mask) = self.occupancy();
        Self::WIN_MASKS
            .iter()
            .zip(WIN_LINES.iter())
            .find(|(&mask, _)| (x_mask & mask) == mask || (o_mask & mask) == mask)
            .map(|(_, &line)| line)
    }

    // ========== Symmetry & Canonicalization ==========

    /// The 8 symmetries of the square (D4 group).
    ///
    /// Each row maps new index -> old index:
    /// ```text
    ///   0 1 2
    ///   3 4 5
    ///   6 7 8
    /// ```
    const TRANSFORMS: [[u8; 9]; 8] = [
        [0, 1, 2, 3, 4, 5, 6, 7, 8], // Identity
        [6, 3, 0, 7, 4, 1, 8, 5, 2], // Rotate 90° clockwise
        [8, 7, 6, 5, 4, 3, 2, 1, 0], // Rotate 180°
        [2, 5, 8, 1, 4, 7, 0, 3, 6], // Rotate 270° clockwise
        [2, 1, 0, 5, 4, 3, 8, 7, 6], // Reflect horizontal (flip left-right)
        [6, 7, 8, 3, 4, 5, 0, 1, 2], // Reflect vertical (flip top-bottom)
        [0, 3, 6, 1, 4, 7, 2, 5, 8], // Reflect main diagonal
        [8, 5, 2, 7, 4, 1, 6, 3, 0], // Reflect anti-diagonal
    ];

    /// Number of symmetries accepted by [`Board::transform`].
    pub const SYMMETRIES: usize = Self::TRANSFORMS.len();

    /// Apply symmetry `t` (0 is the identity), or `None` past the last one.
    pub fn transform(&self, t: usize) -> Option<Board> {
        let mapping = Self::TRANSFORMS.get(t)?;
        let mut result = 0u32;

        for (new_pos, &old_pos) in mapping.iter().enumerate() {
            let cell = (self.0 >> (old_pos as u32 * Self::CELL_BITS)) & Self::CELL_MASK;
            result |= cell << (new_pos as u32 * Self::CELL_BITS);
        }

        Some(Board(result))
    }

    /// The minimum encoding across all 8 symmetries, so that symmetric
    /// positions share one key.
    pub fn canonical(&self) -> u32 {
        (0..Self::SYMMETRIES)
            .filter_map(|t| self.transform(t))
            .map(|board| board.0)
            .min()
            .unwrap_or(self.0)
    }
}

/// Rows of `X`, `O` and `.`, separated by newlines.
impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..3 {
            if row > 0 {
                writeln!(f)?;
            }
            for col in 0..3 {
                write!(f, "{}", self.cell_at(row * 3 + col).symbol())?;
            }
        }
        Ok(())
    }
}

/// Parses 9 cells of `X`/`O` with `.` or `-` for empty. Whitespace and `|`
/// separators are skipped, so `Display` output parses back.
impl FromStr for Board {
    type Err = ParseBoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut cells = [Cell::Empty; CELLS];
        let mut len = 0;

        for c in s.chars().filter(|c| !c.is_whitespace() && *c != '|') {
            let cell = match c {
                '.' | '-' => Cell::Empty,
                other => Cell::Marked(Side::try_from(other).map_err(|_| ParseBoardError::InvalidCell(other))?),
            };
            if len < CELLS {
                cells[len] = cell;
            }
            len += 1;
        }

        if len != CELLS {
            return Err(ParseBoardError::InvalidLength(len));
        }
        Ok(Board::from_cells(cells))
    }
}
