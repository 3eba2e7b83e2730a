//! One human-versus-engine series: the current game, the adaptive playout
//! budget that carries over between games, and the running score.
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::board::{Board, BoardSnapshot, Coord, GameResult, Move, Player, Rules};
use crate::difficulty::Difficulty;
use crate::error::GameError;
use crate::search::Search;

pub const HUMAN: Player = Player::One;
pub const ENGINE: Player = Player::Two;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
}

impl Score {
    fn record(&mut self, result: GameResult) {
        match result {
            GameResult::Won(HUMAN) => self.wins += 1,
            GameResult::Won(_) => self.losses += 1,
            GameResult::Drawn => self.draws += 1,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TurnReport {
    pub human: Move,
    pub engine: Option<Move>,
    pub result: Option<GameResult>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SessionView {
    pub board: BoardSnapshot,
    pub history: Vec<Move>,
    pub last_move: Option<Move>,
    pub result: Option<GameResult>,
    pub winning_connection: Vec<Coord>,
    pub samples: u32,
    pub score: Score,
}

#[derive(Clone, Debug)]
pub struct Session {
    board: Board,
    difficulty: Difficulty,
    score: Score,
    search: Search,
}

impl Session {
    pub fn new(rules: Rules, difficulty: Difficulty, search: Search) -> Self {
        Self {
            board: Board::new(rules),
            difficulty,
            score: Score::default(),
            search,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn difficulty(&self) -> &Difficulty {
        &self.difficulty
    }

    pub fn score(&self) -> Score {
        self.score
    }

    /// Starts over with an empty board. Difficulty and score carry over.
    pub fn new_game(&mut self) {
        self.board = Board::new(self.board.rules());
    }

    pub fn set_samples(&mut self, samples: u32) -> u32 {
        self.difficulty.set_samples(samples)
    }

    /// Plays the human's column and, unless that ended the game, the
    /// engine's reply.
    pub fn human_move<R: Rng + ?Sized>(
        &mut self,
        column: usize,
        rng: &mut R,
    ) -> Result<TurnReport, GameError> {
        if self.board.is_over() {
            return Err(GameError::GameOver);
        }
        if self.board.current_player() != HUMAN {
            return Err(GameError::NotYourTurn);
        }
        let human = self.board.try_play(column)?;

        let mut engine = None;
        if !self.board.is_over() {
            let samples = self.difficulty.search_samples();
            let column = self.search.best_move(&self.board, samples, ENGINE, rng)?;
            engine = Some(self.board.try_play(column)?);
        }

        let result = self.board.result();
        if let Some(result) = result {
            self.score.record(result);
            self.difficulty.record(&self.board)?;
            info!(?result, score = ?self.score, "game over");
        }
        Ok(TurnReport {
            human,
            engine,
            result,
        })
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            board: self.board.snapshot(),
            history: self.board.history().to_vec(),
            last_move: self.board.last_move(),
            result: self.board.result(),
            winning_connection: self.board.winning_connection(),
            samples: self.difficulty.samples(),
            score: self.score,
        }
    }
}
