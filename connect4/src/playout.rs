//! Random playouts: a board is played to completion with uniformly random
//! legal columns and the terminal position is scored.
use std::ops::{Add, AddAssign};

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::board::{Board, Player};
use crate::error::GameError;

/// Win credit for `(Player::One, Player::Two)`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    credits: [f64; 2],
}

impl Outcome {
    pub const DRAW: Outcome = Outcome {
        credits: [0.5, 0.5],
    };

    pub fn win(player: Player) -> Self {
        let mut credits = [0.0; 2];
        credits[player.idx()] = 1.0;
        Self { credits }
    }

    pub fn credit(&self, player: Player) -> f64 {
        self.credits[player.idx()]
    }

    pub fn total(&self) -> f64 {
        self.credits[0] + self.credits[1]
    }
}

impl Add for Outcome {
    type Output = Outcome;

    fn add(mut self, rhs: Outcome) -> Outcome {
        self += rhs;
        self
    }
}

impl AddAssign for Outcome {
    fn add_assign(&mut self, rhs: Outcome) {
        self.credits[0] += rhs.credits[0];
        self.credits[1] += rhs.credits[1];
    }
}

/// Plays `board` (the caller's private copy) to the end. Terminates within
/// `columns * rows` moves since every move fills a cell.
pub fn playout<R: Rng + ?Sized>(mut board: Board, rng: &mut R) -> Result<Outcome, GameError> {
    while !board.is_draw() && !board.is_won() {
        board.play_random_legal_column(rng)?;
    }
    Ok(match board.winner() {
        Some(player) => Outcome::win(player),
        None => Outcome::DRAW,
    })
}
