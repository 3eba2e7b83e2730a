//! Flat Monte Carlo move selection.
//!
//! Every legal column gets the same budget of independent random playouts and
//! the column with the highest estimated win rate for the acting player is
//! chosen. Columns are compared in index order with a strict `>`, so ties go
//! to the lowest column.
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::board::{Board, Player};
use crate::error::GameError;
use crate::playout::{playout, Outcome};

/// Share of the accumulated win credit that went to `player` over `samples`
/// playouts from copies of `board`.
pub fn estimate_win_rate<R: Rng + ?Sized>(
    board: &Board,
    samples: u32,
    player: Player,
    rng: &mut R,
) -> Result<f64, GameError> {
    if samples == 0 {
        return Err(GameError::NoSamples);
    }
    let mut wins = Outcome::default();
    for _ in 0..samples {
        wins += playout(board.clone(), rng)?;
    }
    Ok(wins.credit(player) / wins.total())
}

/// Single-threaded search drawing every playout from `rng`.
pub fn best_move<R: Rng + ?Sized>(
    board: &Board,
    samples: u32,
    player: Player,
    rng: &mut R,
) -> Result<usize, GameError> {
    if board.is_over() {
        return Err(GameError::GameOver);
    }
    let mut best: Option<(usize, f64)> = None;
    for column in board.legal_columns() {
        let mut child = board.clone();
        child.play(column);
        let rate = estimate_win_rate(&child, samples, player, rng)?;
        debug!(column, rate, "evaluated column");
        if best.map_or(true, |(_, best_rate)| rate > best_rate) {
            best = Some((column, rate));
        }
    }
    best.map(|(column, _)| column).ok_or(GameError::NoMoves)
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Size of the search's worker pool.
    pub threads: usize,
    /// Stop starting new playouts once this much time has passed.
    pub time_limit: Option<Duration>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            threads: thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(1),
            time_limit: None,
        }
    }
}

/// Parallel search over a dedicated rayon pool. Clones share the pool.
#[derive(Clone, Debug)]
pub struct Search {
    pool: Arc<ThreadPool>,
    time_limit: Option<Duration>,
}

#[derive(Clone, Debug)]
struct ColumnTally {
    column: usize,
    wins: Outcome,
    completed: u32,
}

impl ColumnTally {
    fn rate(&self, player: Player) -> Option<f64> {
        (self.completed > 0).then(|| self.wins.credit(player) / self.wins.total())
    }
}

impl Search {
    pub fn new(config: SearchConfig) -> Result<Self, GameError> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(config.threads.max(1))
            .thread_name(|idx| format!("mc4-search-{idx}"))
            .build()
            .map_err(|err| GameError::ThreadPool(err.to_string()))?;
        Ok(Self {
            pool: Arc::new(pool),
            time_limit: config.time_limit,
        })
    }

    /// Parallel flat Monte Carlo search. Each candidate column is seeded from
    /// `rng` in column order, so the result does not depend on `threads`.
    pub fn best_move<R: Rng + ?Sized>(
        &self,
        board: &Board,
        samples: u32,
        player: Player,
        rng: &mut R,
    ) -> Result<usize, GameError> {
        if samples == 0 {
            return Err(GameError::NoSamples);
        }
        if board.is_over() {
            return Err(GameError::GameOver);
        }
        let jobs: Vec<(usize, u64)> = board
            .legal_columns()
            .into_iter()
            .map(|column| (column, rng.random()))
            .collect();
        let first = jobs.first().map(|&(column, _)| column).ok_or(GameError::NoMoves)?;
        let deadline = self.time_limit.map(|limit| Instant::now() + limit);

        let mut best: Option<(usize, f64)> = None;
        for tally in self.run(board, &jobs, samples, deadline)? {
            let Some(rate) = tally.rate(player) else {
                continue;
            };
            debug!(
                column = tally.column,
                rate,
                completed = tally.completed,
                "evaluated column"
            );
            if best.map_or(true, |(_, best_rate)| rate > best_rate) {
                best = Some((tally.column, rate));
            }
        }
        let column = match best {
            Some((column, _)) => column,
            None => {
                warn!("search deadline passed before any playout finished");
                first
            }
        };
        debug!(column, samples, "search chose column");
        Ok(column)
    }

    fn run(
        &self,
        board: &Board,
        jobs: &[(usize, u64)],
        samples: u32,
        deadline: Option<Instant>,
    ) -> Result<Vec<ColumnTally>, GameError> {
        self.pool.install(|| {
            jobs.par_iter()
                .map(|&(column, seed)| evaluate_column(board, column, seed, samples, deadline))
                .collect()
        })
    }
}

fn evaluate_column(
    board: &Board,
    column: usize,
    seed: u64,
    samples: u32,
    deadline: Option<Instant>,
) -> Result<ColumnTally, GameError> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut child = board.clone();
    child.play(column);
    let mut tally = ColumnTally {
        column,
        wins: Outcome::default(),
        completed: 0,
    };
    for _ in 0..samples {
        if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            break;
        }
        tally.wins += playout(child.clone(), &mut rng)?;
        tally.completed += 1;
    }
    Ok(tally)
}
