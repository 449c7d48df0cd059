//! A single round of play: who owns which side and whose turn it is.
//!
//! The round status is never stored; it is read off the board, so it cannot
//! drift from the cells.

use std::fmt;
use std::str::FromStr;

use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::search::best_move;
use crate::{Board, MoveError, Outcome, Side, WinLine};

/// Who plays the two sides.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Default, Serialize, Deserialize)]
pub enum Mode {
    #[default]
    #[serde(rename = "pvp")]
    HumanVsHuman,
    #[serde(rename = "pvc")]
    HumanVsComputer,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::HumanVsHuman => write!(f, "pvp"),
            Mode::HumanVsComputer => write!(f, "pvc"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
#[display("invalid mode {input:?}: expected pvp or pvc")]
pub struct ParseModeError {
    pub input: String,
}

impl FromStr for Mode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "pvp" => Ok(Mode::HumanVsHuman),
            "pvc" => Ok(Mode::HumanVsComputer),
            other => Err(ParseModeError {
                input: other.to_string(),
            }),
        }
    }
}

/// Round state machine: `NotStarted → InProgress → (Won | Drawn)`.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
pub enum RoundStatus {
    NotStarted,
    InProgress,
    Won(Side),
    Drawn,
}

impl RoundStatus {
    pub fn is_over(self) -> bool {
        matches!(self, RoundStatus::Won(_) | RoundStatus::Drawn)
    }
}

/// A move the round refuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Error)]
pub enum RoundError {
    #[display("{_0}")]
    Move(MoveError),
    #[display("the round is over")]
    RoundOver,
    #[display("waiting for the computer to move")]
    ComputerToMove,
    #[display("it is not the computer's turn")]
    NotComputerTurn,
}

impl From<MoveError> for RoundError {
    fn from(err: MoveError) -> Self {
        RoundError::Move(err)
    }
}

/// One round: the live board plus who controls each side.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Round {
    board: Board,
    mode: Mode,
    human: Side,
}

impl Round {
    pub fn new(mode: Mode, human: Side) -> Self {
        Self {
            board: Board::new(),
            mode,
            human,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// The side the (first) human plays.
    pub fn human_side(&self) -> Side {
        self.human
    }

    /// The computer's side, in human-vs-computer mode.
    pub fn computer_side(&self) -> Option<Side> {
        match self.mode {
            Mode::HumanVsHuman => None,
            Mode::HumanVsComputer => Some(self.human.opponent()),
        }
    }

    /// The side to place the next mark. X opens every round.
    pub fn to_move(&self) -> Side {
        // Only alternating play reaches this board, so the counts are valid
        self.board.side_to_move().unwrap_or(Side::X)
    }

    pub fn status(&self) -> RoundStatus {
        if self.board.is_blank() {
            return RoundStatus::NotStarted;
        }
        match self.board.evaluate() {
            Outcome::Ongoing => RoundStatus::InProgress,
            Outcome::Win(side) => RoundStatus::Won(side),
            Outcome::Draw => RoundStatus::Drawn,
        }
    }

    /// The completed line to highlight, once a side has won.
    pub fn winning_line(&self) -> Option<WinLine> {
        self.board.winning_line()
    }

    /// Whether the computer owns the next move.
    pub fn computer_to_move(&self) -> bool {
        !self.status().is_over() && self.computer_side() == Some(self.to_move())
    }

    /// Place the next mark for the human side to move.
    pub fn play(&mut self, index: usize) -> Result<Outcome, RoundError> {
        if self.status().is_over() {
            return Err(RoundError::RoundOver);
        }
        if self.computer_to_move() {
            return Err(RoundError::ComputerToMove);
        }
        self.apply(index)
    }

    /// Let the computer choose and place its mark.
    ///
    /// Returns the chosen cell with the resulting outcome.
    pub fn play_computer(&mut self) -> Result<(usize, Outcome), RoundError> {
        if self.status().is_over() {
            return Err(RoundError::RoundOver);
        }
        let Some(side) = self.computer_side().filter(|&side| side == self.to_move()) else {
            return Err(RoundError::NotComputerTurn);
        };
        let index = best_move(&self.board, side)?;
        let outcome = self.apply(index)?;
        Ok((index, outcome))
    }

    fn apply(&mut self, index: usize) -> Result<Outcome, RoundError> {
        let side = self.to_move();
        let outcome = self.board.place(index, side)?;
        match outcome {
            Outcome::Win(winner) => info!(%winner, index, "round won"),
            Outcome::Draw => info!(index, "round drawn"),
            Outcome::Ongoing => {}
        }
        Ok(outcome)
    }

    /// Clear the board for a fresh round.
    pub fn reset(&mut self) {
        self.board = Board::new();
    }

    /// Switch mode and start a fresh round.
    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
        self.reset();
    }

    /// Give the human `side` (the computer takes the other) and start a
    /// fresh round. X still opens, so choosing O lets the computer go first.
    pub fn choose_side(&mut self, side: Side) {
        self.human = side;
        self.reset();
    }
}

impl Default for Round {
    fn default() -> Self {
        Self::new(Mode::default(), Side::X)
    }
}
