//! A sequence of rounds with running tallies, plus the text the UI shows.

use serde::{Deserialize, Serialize};

use crate::round::{Mode, Round, RoundError, RoundStatus};
use crate::{Cell, Outcome, Side, CELLS};

/// Wins and draws across finished rounds.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct Scoreboard {
    pub x_wins: u32,
    pub o_wins: u32,
    pub draws: u32,
}

impl Scoreboard {
    /// Count a finished round. `Ongoing` is ignored.
    pub fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Win(Side::X) => self.x_wins += 1,
            Outcome::Win(Side::O) => self.o_wins += 1,
            Outcome::Draw => self.draws += 1,
            Outcome::Ongoing => {}
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Rounds counted so far.
    pub fn rounds(&self) -> u32 {
        self.x_wins + self.o_wins + self.draws
    }
}

/// The live round and the scoreboard it reports into.
#[derive(Clone, Debug, Default)]
pub struct Game {
    round: Round,
    scores: Scoreboard,
}

impl Game {
    pub fn new(mode: Mode, human: Side) -> Self {
        Self {
            round: Round::new(mode, human),
            scores: Scoreboard::default(),
        }
    }

    pub fn round(&self) -> &Round {
        &self.round
    }

    pub fn scores(&self) -> &Scoreboard {
        &self.scores
    }

    /// Human move. A move that finishes the round is scored.
    pub fn play(&mut self, index: usize) -> Result<Outcome, RoundError> {
        let outcome = self.round.play(index)?;
        self.scores.record(outcome);
        Ok(outcome)
    }

    /// Computer move. A move that finishes the round is scored.
    pub fn play_computer(&mut self) -> Result<(usize, Outcome), RoundError> {
        let (index, outcome) = self.round.play_computer()?;
        self.scores.record(outcome);
        Ok((index, outcome))
    }

    /// Start a fresh round, keeping the tallies.
    pub fn reset_round(&mut self) {
        self.round.reset();
    }

    /// Start over: fresh round, empty scoreboard.
    pub fn new_game(&mut self) {
        self.round.reset();
        self.scores.clear();
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.round.set_mode(mode);
    }

    pub fn choose_side(&mut self, side: Side) {
        self.round.choose_side(side);
    }

    /// The status line for the current round.
    pub fn status_text(&self) -> String {
        match self.round.status() {
            RoundStatus::Won(side) => format!("Player {} wins!", side),
            RoundStatus::Drawn => "It's a draw!".to_string(),
            RoundStatus::NotStarted | RoundStatus::InProgress => {
                let side = self.round.to_move();
                match self.round.mode() {
                    Mode::HumanVsHuman => format!("Player {}'s Turn", side),
                    Mode::HumanVsComputer if self.round.computer_to_move() => {
                        format!("Computer's Turn ({})", side)
                    }
                    Mode::HumanVsComputer => format!("Your Turn ({})", side),
                }
            }
        }
    }

    /// Accessibility label for a cell, numbered from 1.
    pub fn cell_label(&self, index: usize) -> Option<String> {
        let label = match self.round.board().cell(index)? {
            Cell::Empty => format!("Cell {}, empty", index + 1),
            Cell::Marked(side) => format!("Cell {}, occupied by {}", index + 1, side),
        };
        Some(label)
    }
}

/// Map the keyboard keys `1`-`9` to cell indices.
pub fn cell_for_key(key: &str) -> Option<usize> {
    let mut chars = key.chars();
    let digit = chars.next()?.to_digit(10)? as usize;
    if chars.next().is_some() || !(1..=CELLS).contains(&digit) {
        return None;
    }
    Some(digit - 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MoveError;

    #[test]
    fn test_scoreboard_record() {
        let mut scores = Scoreboard::default();
        scores.record(Outcome::Win(Side::X));
        scores.record(Outcome::Win(Side::O));
        scores.record(Outcome::Win(Side::O));
        scores.record(Outcome::Draw);
        scores.record(Outcome::Ongoing);
        assert_eq!(
            scores,
            Scoreboard {
                x_wins: 1,
                o_wins: 2,
                draws: 1
            }
        );
        assert_eq!(scores.rounds(), 4);
        scores.clear();
        assert_eq!(scores, Scoreboard::default());
    }

    #[test]
    fn test_win_scored_once() {
        let mut game = Game::new(Mode::HumanVsHuman, Side::X);
        for index in [0, 3, 1, 4, 2] {
            game.play(index).unwrap();
        }
        assert_eq!(game.scores().x_wins, 1);

        // Further moves are refused and do not score again
        assert_eq!(game.play(5), Err(RoundError::RoundOver));
        assert_eq!(game.scores().rounds(), 1);
    }

    #[test]
    fn test_failed_move_not_scored() {
        let mut game = Game::new(Mode::HumanVsHuman, Side::X);
        game.play(0).unwrap();
        assert_eq!(game.play(0), Err(RoundError::Move(MoveError::OccupiedCell(0))));
        assert_eq!(game.scores().rounds(), 0);
    }

    #[test]
    fn test_reset_round_keeps_scores() {
        let mut game = Game::new(Mode::HumanVsHuman, Side::X);
        for index in [0, 3, 1, 4, 2] {
            game.play(index).unwrap();
        }
        game.reset_round();
        assert!(game.round().board().is_blank());
        assert_eq!(game.scores().x_wins, 1);

        game.new_game();
        assert!(game.round().board().is_blank());
        assert_eq!(game.scores(), &Scoreboard::default());
    }

    #[test]
    fn test_computer_vs_human_draw_scored() {
        let mut game = Game::new(Mode::HumanVsComputer, Side::O);
        let mut outcome = Outcome::Ongoing;
        while !outcome.is_terminal() {
            outcome = if game.round().computer_to_move() {
                game.play_computer().unwrap().1
            } else {
                // Human takes the lowest empty cell
                let index = game.round().board().empty_cells().next().unwrap();
                game.play(index).unwrap()
            };
        }
        // The computer never loses
        assert_ne!(outcome, Outcome::Win(Side::O));
        assert_eq!(game.scores().rounds(), 1);
        assert_eq!(game.scores().o_wins, 0);
    }

    #[test]
    fn test_status_text_pvp() {
        let mut game = Game::new(Mode::HumanVsHuman, Side::X);
        assert_eq!(game.status_text(), "Player X's Turn");
        game.play(4).unwrap();
        assert_eq!(game.status_text(), "Player O's Turn");
    }

    #[test]
    fn test_status_text_pvc() {
        let mut game = Game::new(Mode::HumanVsComputer, Side::X);
        assert_eq!(game.status_text(), "Your Turn (X)");
        game.play(0).unwrap();
        assert_eq!(game.status_text(), "Computer's Turn (O)");

        game.choose_side(Side::O);
        assert_eq!(game.status_text(), "Computer's Turn (X)");
        game.play_computer().unwrap();
        assert_eq!(game.status_text(), "Your Turn (O)");
    }

    #[test]
    fn test_status_text_finished() {
        let mut game = Game::new(Mode::HumanVsHuman, Side::X);
        for index in [0, 3, 1, 4, 2] {
            game.play(index).unwrap();
        }
        assert_eq!(game.status_text(), "Player X wins!");

        game.reset_round();
        for index in [0, 1, 2, 4, 3, 5, 7, 6, 8] {
            game.play(index).unwrap();
        }
        assert_eq!(game.status_text(), "It's a draw!");
        assert_eq!(game.scores().draws, 1);
    }

    #[test]
    fn test_cell_label() {
        let mut game = Game::default();
        game.play(4).unwrap();
        assert_eq!(game.cell_label(0).as_deref(), Some("Cell 1, empty"));
        assert_eq!(game.cell_label(4).as_deref(), Some("Cell 5, occupied by X"));
        assert_eq!(game.cell_label(9), None);
    }

    #[test]
    fn test_cell_for_key() {
        assert_eq!(cell_for_key("1"), Some(0));
        assert_eq!(cell_for_key("5"), Some(4));
        assert_eq!(cell_for_key("9"), Some(8));
        assert_eq!(cell_for_key("0"), None);
        assert_eq!(cell_for_key("10"), None);
        assert_eq!(cell_for_key("a"), None);
        assert_eq!(cell_for_key("Enter"), None);
    }
}
