//! Stateless move requests: the caller sends the whole position and a
//! playout budget and gets the engine's column back.
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::board::{Board, Rules};
use crate::error::GameError;
use crate::history::parse_history;
use crate::search::Search;

pub const MAX_REQUEST_SAMPLES: u32 = 1000;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRequest {
    pub position: String,
    pub samples: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveResponse {
    pub column: usize,
}

/// Picks a column for whichever side is to move after `request.position`.
pub fn best_move_for<R: Rng + ?Sized>(
    request: &MoveRequest,
    search: &Search,
    rng: &mut R,
) -> Result<MoveResponse, GameError> {
    if !(1..=MAX_REQUEST_SAMPLES).contains(&request.samples) {
        return Err(GameError::SamplesOutOfRange(request.samples));
    }
    let columns = parse_history(&request.position)?;
    let board = Board::from_columns(Rules::default(), &columns)?;
    let column = search.best_move(&board, request.samples, board.current_player(), rng)?;
    Ok(MoveResponse { column })
}
