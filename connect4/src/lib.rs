//! Connect Four engine with flat Monte Carlo move selection.
//! Each legal column is scored by the share of random playouts the acting
//! side wins from it; the playout budget adapts to the human between games.
pub mod api;
pub mod board;
pub mod difficulty;
pub mod error;
pub mod history;
pub mod playout;
pub mod search;
pub mod session;

pub use api::{best_move_for, MoveRequest, MoveResponse, MAX_REQUEST_SAMPLES};
pub use board::{Board, BoardSnapshot, Coord, GameResult, Move, Player, Rules};
pub use difficulty::{Difficulty, DifficultyConfig};
pub use error::GameError;
pub use history::parse_history;
pub use playout::{playout, Outcome};
pub use search::{best_move, estimate_win_rate, Search, SearchConfig};
pub use session::{Score, Session, SessionView, TurnReport, ENGINE, HUMAN};
