//! WASM bindings for tictactoe-core
//!
//! Wraps one [`Game`] for the browser. Scheduling the computer's move (and
//! any delay before it) is left to the page.

use wasm_bindgen::prelude::*;

use crate::{cell_for_key, Cell, Game, Mode, Outcome, Side};

/// Outcome codes handed to JavaScript: 0 ongoing, 1 X wins, 2 O wins, 3 draw.
fn outcome_code(outcome: Outcome) -> u8 {
    match outcome {
        Outcome::Ongoing => 0,
        Outcome::Win(side) => side as u8,
        Outcome::Draw => 3,
    }
}

/// WASM-friendly wrapper around Game
#[wasm_bindgen]
pub struct WasmGame {
    inner: Game,
}

#[wasm_bindgen]
impl WasmGame {
    /// Create a human-vs-human game with the human on X
    #[wasm_bindgen(constructor)]
    pub fn new() -> WasmGame {
        WasmGame {
            inner: Game::default(),
        }
    }

    /// Switch between "pvp" and "pvc". Starts a fresh round.
    #[wasm_bindgen(js_name = setMode)]
    pub fn set_mode(&mut self, mode: &str) -> Result<(), JsError> {
        let mode: Mode = mode.parse()?;
        self.inner.set_mode(mode);
        Ok(())
    }

    /// Pick the human side, "X" or "O". Starts a fresh round.
    #[wasm_bindgen(js_name = chooseSide)]
    pub fn choose_side(&mut self, side: &str) -> Result<(), JsError> {
        let side: Side = side.parse()?;
        self.inner.choose_side(side);
        Ok(())
    }

    /// Human move at a cell index (0-8). Returns the outcome code.
    pub fn play(&mut self, index: usize) -> Result<u8, JsError> {
        let outcome = self.inner.play(index)?;
        Ok(outcome_code(outcome))
    }

    /// Human move from a key press ("1"-"9"). Returns the outcome code, or
    /// `undefined` when the key is not a cell key.
    #[wasm_bindgen(js_name = pressKey)]
    pub fn press_key(&mut self, key: &str) -> Result<Option<u8>, JsError> {
        match cell_for_key(key) {
            Some(index) => self.play(index).map(Some),
            None => Ok(None),
        }
    }

    #[wasm_bindgen(js_name = computerToMove)]
    pub fn computer_to_move(&self) -> bool {
        self.inner.round().computer_to_move()
    }

    /// Let the computer move. Returns the chosen index, or -1 when it is not
    /// the computer's turn.
    #[wasm_bindgen(js_name = computerMove)]
    pub fn computer_move(&mut self) -> i32 {
        match self.inner.play_computer() {
            Ok((index, _)) => index as i32,
            Err(_) => -1,
        }
    }

    /// Cells as 0 (empty), 1 (X), 2 (O)
    pub fn cells(&self) -> Vec<u8> {
        self.inner
            .round()
            .board()
            .cells()
            .iter()
            .map(|cell| match cell {
                Cell::Empty => 0,
                Cell::Marked(side) => *side as u8,
            })
            .collect()
    }

    /// Winning line as three indices, empty if no winner
    #[wasm_bindgen(js_name = winningLine)]
    pub fn winning_line(&self) -> Vec<u8> {
        self.inner
            .round()
            .winning_line()
            .map(|line| line.iter().map(|&i| i as u8).collect())
            .unwrap_or_default()
    }

    #[wasm_bindgen(js_name = statusText)]
    pub fn status_text(&self) -> String {
        self.inner.status_text()
    }

    #[wasm_bindgen(js_name = cellLabel)]
    pub fn cell_label(&self, index: usize) -> Option<String> {
        self.inner.cell_label(index)
    }

    /// Scoreboard as `{ x_wins, o_wins, draws }`
    pub fn scores(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(self.inner.scores()).map_err(JsValue::from)
    }

    #[wasm_bindgen(js_name = resetRound)]
    pub fn reset_round(&mut self) {
        self.inner.reset_round();
    }

    #[wasm_bindgen(js_name = newGame)]
    pub fn new_game(&mut self) {
        self.inner.new_game();
    }
}

impl Default for WasmGame {
    fn default() -> Self {
        Self::new()
    }
}
