use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("invalid move string at position {position}: {reason}")]
    ParseMove { position: usize, reason: String },
    #[error("column {column} is full")]
    ColumnFull { column: usize },
    #[error("column {column} is out of bounds")]
    ColumnOutOfBounds { column: usize },
    #[error("the game is already over")]
    GameOver,
    #[error("the game is still in progress")]
    GameInProgress,
    #[error("it is not the human player's turn")]
    NotYourTurn,
    #[error("no legal moves remain")]
    NoMoves,
    #[error("win rate needs at least one sample")]
    NoSamples,
    #[error("samples {0} is out of range (1-1000)")]
    SamplesOutOfRange(u32),
    #[error("invalid board rules: {0}")]
    InvalidRules(String),
    #[error("invalid difficulty settings: {0}")]
    InvalidDifficulty(String),
    #[error("failed to start search workers: {0}")]
    ThreadPool(String),
}
