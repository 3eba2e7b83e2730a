//! Connect-Four game state.
//!
//! The board is a plain value: cloning it yields an independent copy with the
//! same rules, grid, history and side to move, which is what every simulation
//! branch of the search works on.
use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::GameError;

pub const DEFAULT_COLUMNS: usize = 7;
pub const DEFAULT_ROWS: usize = 6;
pub const DEFAULT_CONNECT: usize = 4;

/// Ray directions as `(column, row)` steps, in the order wins are checked:
/// vertical, horizontal, falling diagonal, rising diagonal.
const DIRECTIONS: [(isize, isize); 4] = [(0, 1), (1, 0), (1, -1), (1, 1)];

/// Board dimensions and the run length that wins. Only constructible through
/// `Rules::new` (or deserialization, which goes through it), so every board
/// has at least one cell and a positive connect length.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawRules")]
pub struct Rules {
    columns: usize,
    rows: usize,
    connect: usize,
}

#[derive(Deserialize)]
struct RawRules {
    columns: usize,
    rows: usize,
    connect: usize,
}

impl TryFrom<RawRules> for Rules {
    type Error = GameError;

    fn try_from(raw: RawRules) -> Result<Self, GameError> {
        Rules::new(raw.columns, raw.rows, raw.connect)
    }
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            columns: DEFAULT_COLUMNS,
            rows: DEFAULT_ROWS,
            connect: DEFAULT_CONNECT,
        }
    }
}

impl Rules {
    pub fn new(columns: usize, rows: usize, connect: usize) -> Result<Self, GameError> {
        let rules = Self {
            columns,
            rows,
            connect,
        };
        rules.validate()?;
        Ok(rules)
    }

    fn validate(&self) -> Result<(), GameError> {
        if self.columns == 0 || self.rows == 0 {
            return Err(GameError::InvalidRules(format!(
                "board must have at least one cell, got {}x{}",
                self.columns, self.rows
            )));
        }
        if self.connect == 0 {
            return Err(GameError::InvalidRules(
                "connect length must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn connect(&self) -> usize {
        self.connect
    }

    pub fn cells(&self) -> usize {
        self.columns * self.rows
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Player {
    One,
    Two,
}

impl Player {
    pub fn idx(self) -> usize {
        match self {
            Player::One => 0,
            Player::Two => 1,
        }
    }

    pub fn opponent(self) -> Player {
        match self {
            Player::One => Player::Two,
            Player::Two => Player::One,
        }
    }

    fn symbol(self) -> char {
        match self {
            Player::One => 'X',
            Player::Two => 'O',
        }
    }
}

/// A played disc. `row` is the column's occupancy just before the move.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Move {
    pub player: Player,
    pub column: usize,
    pub row: usize,
}

/// Board coordinate, row 0 at the bottom.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coord {
    pub column: usize,
    pub row: usize,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameResult {
    Won(Player),
    Drawn,
}

/// Column-major view of a board for clients and test snapshots.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardSnapshot {
    pub rules: Rules,
    pub grid: Vec<Vec<Player>>,
    pub current_player: Player,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Board {
    rules: Rules,
    // column-major: index = column * rows + row
    cells: Vec<Option<Player>>,
    heights: Vec<usize>,
    history: Vec<Move>,
    current: Player,
}

impl Default for Board {
    fn default() -> Self {
        Self::new(Rules::default())
    }
}

impl Board {
    pub fn new(rules: Rules) -> Self {
        Self {
            rules,
            cells: vec![None; rules.cells()],
            heights: vec![0; rules.columns],
            history: Vec::with_capacity(rules.cells()),
            current: Player::One,
        }
    }

    /// Replays `columns` in order, alternating players from `Player::One`.
    pub fn from_columns(rules: Rules, columns: &[usize]) -> Result<Self, GameError> {
        let mut board = Self::new(rules);
        for &column in columns {
            board.try_play(column)?;
        }
        Ok(board)
    }

    pub fn rules(&self) -> Rules {
        self.rules
    }

    pub fn current_player(&self) -> Player {
        self.current
    }

    pub fn history(&self) -> &[Move] {
        &self.history
    }

    pub fn last_move(&self) -> Option<Move> {
        self.history.last().copied()
    }

    pub fn height(&self, column: usize) -> usize {
        self.heights.get(column).copied().unwrap_or(0)
    }

    pub fn cell(&self, column: usize, row: usize) -> Option<Player> {
        if column >= self.rules.columns || row >= self.rules.rows {
            return None;
        }
        self.cells[column * self.rules.rows + row]
    }

    pub fn can_play(&self, column: usize) -> bool {
        column < self.rules.columns && self.heights[column] < self.rules.rows
    }

    pub fn legal_columns(&self) -> Vec<usize> {
        (0..self.rules.columns)
            .filter(|&col| self.can_play(col))
            .collect()
    }

    /// Drops a disc for the side to move. A column that cannot be played is
    /// ignored without error; callers filter with `can_play`/`is_over` first.
    pub fn play(&mut self, column: usize) {
        if !self.can_play(column) {
            debug!(column, moves = self.history.len(), "ignoring unplayable column");
            return;
        }
        self.place(column);
    }

    /// Checked variant of `play` for untrusted input.
    pub fn try_play(&mut self, column: usize) -> Result<Move, GameError> {
        if column >= self.rules.columns {
            return Err(GameError::ColumnOutOfBounds { column });
        }
        if self.is_over() {
            return Err(GameError::GameOver);
        }
        if self.heights[column] >= self.rules.rows {
            return Err(GameError::ColumnFull { column });
        }
        Ok(self.place(column))
    }

    /// Plays a column drawn uniformly from the legal ones.
    pub fn play_random_legal_column<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
    ) -> Result<usize, GameError> {
        let legal = self.legal_columns();
        if legal.is_empty() {
            return Err(GameError::NoMoves);
        }
        let column = legal[rng.random_range(0..legal.len())];
        self.place(column);
        Ok(column)
    }

    fn place(&mut self, column: usize) -> Move {
        let row = self.heights[column];
        let mv = Move {
            player: self.current,
            column,
            row,
        };
        self.cells[column * self.rules.rows + row] = Some(mv.player);
        self.heights[column] += 1;
        self.history.push(mv);
        self.current = mv.player.opponent();
        mv
    }

    pub fn is_won(&self) -> bool {
        self.winning_direction().is_some()
    }

    pub fn is_draw(&self) -> bool {
        self.history.len() == self.rules.cells() && !self.is_won()
    }

    pub fn is_over(&self) -> bool {
        self.is_won() || self.is_draw()
    }

    pub fn winner(&self) -> Option<Player> {
        if self.is_won() {
            self.last_move().map(|mv| mv.player)
        } else {
            None
        }
    }

    pub fn result(&self) -> Option<GameResult> {
        if let Some(player) = self.winner() {
            Some(GameResult::Won(player))
        } else if self.is_draw() {
            Some(GameResult::Drawn)
        } else {
            None
        }
    }

    /// Cells of the connection made by the last move, starting with that
    /// move's own cell. Empty when the game is not won.
    pub fn winning_connection(&self) -> Vec<Coord> {
        let (Some(last), Some((dc, dr))) = (self.last_move(), self.winning_direction()) else {
            return Vec::new();
        };
        let mut line = vec![Coord {
            column: last.column,
            row: last.row,
        }];
        line.extend(self.ray(last, dc, dr));
        line.extend(self.ray(last, -dc, -dr));
        line
    }

    fn winning_direction(&self) -> Option<(isize, isize)> {
        let last = self.last_move()?;
        DIRECTIONS.into_iter().find(|&(dc, dr)| {
            1 + self.ray(last, dc, dr).count() + self.ray(last, -dc, -dr).count()
                >= self.rules.connect
        })
    }

    /// Same-player cells stepping away from `from`, stopping at the first
    /// off-board, empty or opposing cell.
    fn ray(&self, from: Move, dc: isize, dr: isize) -> impl Iterator<Item = Coord> + '_ {
        let start = Coord {
            column: from.column,
            row: from.row,
        };
        std::iter::successors(Some(start), move |&c| self.offset(c, dc, dr))
            .skip(1)
            .take_while(move |c| self.cell(c.column, c.row) == Some(from.player))
    }

    fn offset(&self, coord: Coord, dc: isize, dr: isize) -> Option<Coord> {
        let column = coord.column.checked_add_signed(dc)?;
        let row = coord.row.checked_add_signed(dr)?;
        (column < self.rules.columns && row < self.rules.rows).then_some(Coord { column, row })
    }

    pub fn snapshot(&self) -> BoardSnapshot {
        let grid = (0..self.rules.columns)
            .map(|col| {
                (0..self.heights[col])
                    .filter_map(|row| self.cell(col, row))
                    .collect()
            })
            .collect();
        BoardSnapshot {
            rules: self.rules,
            grid,
            current_player: self.current,
        }
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in (0..self.rules.rows).rev() {
            for col in 0..self.rules.columns {
                let symbol = self.cell(col, row).map_or('.', Player::symbol);
                write!(f, "{symbol}")?;
            }
            writeln!(f)?;
        }
        for col in 0..self.rules.columns {
            write!(f, "{}", col % 10)?;
        }
        writeln!(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const DRAWN_GAME: [usize; 42] = [
        0, 1, 0, 1, 0, 1, 1, 0, 1, 0, 1, 0, 2, 3, 2, 3, 2, 3, 3, 2, 3, 2, 3, 2, 4, 5, 4, 5, 4,
        5, 5, 4, 5, 4, 5, 4, 6, 6, 6, 6, 6, 6,
    ];

    fn board(columns: &[usize]) -> Board {
        Board::from_columns(Rules::default(), columns).unwrap()
    }

    fn assert_consistent(board: &Board) {
        let occupied: usize = (0..board.rules().columns()).map(|c| board.height(c)).sum();
        assert_eq!(occupied, board.history().len());
        for col in 0..board.rules().columns() {
            let from_history: Vec<Player> = board
                .history()
                .iter()
                .filter(|mv| mv.column == col)
                .map(|mv| mv.player)
                .collect();
            assert_eq!(board.snapshot().grid[col], from_history);
        }
    }

    #[test]
    fn empty_board_starts_with_player_one() {
        let board = Board::default();
        assert_eq!(board.current_player(), Player::One);
        assert_eq!(board.last_move(), None);
        assert!(!board.is_over());
        assert_eq!(board.winner(), None);
        assert!(board.winning_connection().is_empty());
    }

    #[test]
    fn play_alternates_and_records_rows() {
        let board = board(&[3, 3, 4]);
        assert_eq!(board.current_player(), Player::Two);
        assert_eq!(
            board.history(),
            &[
                Move { player: Player::One, column: 3, row: 0 },
                Move { player: Player::Two, column: 3, row: 1 },
                Move { player: Player::One, column: 4, row: 0 },
            ]
        );
        assert_consistent(&board);
    }

    #[test]
    fn play_on_full_or_missing_column_is_ignored() {
        let mut board = board(&[0, 0, 0, 0, 0, 0]);
        let before = board.clone();
        assert!(!board.can_play(0));
        board.play(0);
        board.play(7);
        assert_eq!(board, before);
    }

    #[test]
    fn try_play_reports_each_rejection() {
        let mut full = board(&[0, 0, 0, 0, 0, 0]);
        assert_eq!(full.try_play(0), Err(GameError::ColumnFull { column: 0 }));
        assert_eq!(
            full.try_play(9),
            Err(GameError::ColumnOutOfBounds { column: 9 })
        );
        let mut won = board(&[0, 1, 0, 1, 0, 1, 0]);
        assert_eq!(won.try_play(2), Err(GameError::GameOver));
    }

    #[test]
    fn horizontal_win_on_bottom_row() {
        let mut board = board(&[0, 0, 1, 1, 2, 2]);
        assert!(!board.is_won());
        board.play(3);
        assert!(board.is_won());
        assert_eq!(board.winner(), Some(Player::One));
        let mut line = board.winning_connection();
        line.sort();
        let expected: Vec<Coord> = (0..4).map(|column| Coord { column, row: 0 }).collect();
        assert_eq!(line, expected);
    }

    #[test]
    fn vertical_win_is_found_first() {
        let board = board(&[0, 1, 0, 1, 0, 1, 0]);
        assert!(board.is_won());
        let line = board.winning_connection();
        assert_eq!(line.len(), 4);
        assert!(line.iter().all(|c| c.column == 0));
    }

    #[test]
    fn rising_diagonal_win() {
        // X at (0,0) (1,1) (2,2) (3,3)
        let board = board(&[0, 1, 1, 2, 2, 3, 2, 3, 3, 5, 3]);
        assert_eq!(board.winner(), Some(Player::One));
        let mut line = board.winning_connection();
        line.sort();
        let expected: Vec<Coord> = (0..4).map(|i| Coord { column: i, row: i }).collect();
        assert_eq!(line, expected);
    }

    #[test]
    fn falling_diagonal_win() {
        // X at (3,0) (2,1) (1,2) (0,3)
        let board = board(&[3, 2, 2, 1, 1, 0, 1, 0, 0, 5, 0]);
        assert_eq!(board.winner(), Some(Player::One));
        let mut line = board.winning_connection();
        line.sort();
        let expected: Vec<Coord> = (0..4).map(|i| Coord { column: i, row: 3 - i }).collect();
        assert_eq!(line, expected);
    }

    #[test]
    fn three_of_four_is_not_a_win_in_any_direction() {
        // Each line from the win tests above, with one of its four X cells
        // left empty or taken by O.
        let cases: [(&str, usize, &[usize]); 16] = [
            ("vertical", 0, &[6, 0, 0, 6, 0, 5, 0]),
            ("vertical", 1, &[0, 0, 0, 6, 0]),
            ("vertical", 2, &[0, 6, 0, 0, 0]),
            ("vertical", 3, &[0, 6, 0, 6, 0]),
            ("horizontal", 0, &[1, 0, 2, 6, 3]),
            ("horizontal", 1, &[0, 1, 2, 6, 3]),
            ("horizontal", 2, &[0, 2, 1, 6, 3]),
            ("horizontal", 3, &[0, 3, 1, 6, 2]),
            ("rising", 0, &[1, 0, 1, 6, 2, 6, 2, 6, 3, 3, 2, 3, 3]),
            ("rising", 1, &[0, 3, 1, 1, 2, 6, 2, 6, 2, 6, 3, 3, 3]),
            ("rising", 2, &[0, 3, 1, 6, 1, 6, 2, 6, 2, 2, 3, 3, 3]),
            ("rising", 3, &[0, 3, 1, 6, 1, 6, 2, 6, 3, 3, 2, 3, 2]),
            ("falling", 0, &[0, 2, 0, 6, 0, 0, 1, 1, 1, 6, 2, 6, 3]),
            ("falling", 1, &[0, 2, 0, 0, 0, 6, 1, 6, 1, 1, 2, 6, 3]),
            ("falling", 2, &[0, 2, 0, 0, 0, 2, 1, 6, 1, 6, 1, 6, 3]),
            ("falling", 3, &[0, 2, 0, 0, 0, 3, 1, 6, 1, 6, 1, 6, 2]),
        ];
        for (line, missing, columns) in cases {
            let board = board(columns);
            assert!(!board.is_won(), "{line} line won without disc {missing}");
            assert!(board.winning_connection().is_empty());
        }
    }

    #[test]
    fn win_by_the_second_player() {
        let board = board(&[6, 0, 6, 1, 5, 2, 5, 3]);
        assert_eq!(board.winner(), Some(Player::Two));
        assert_eq!(board.result(), Some(GameResult::Won(Player::Two)));
    }

    #[test]
    fn full_board_without_connection_is_a_draw() {
        let board = board(&DRAWN_GAME);
        assert!(board.is_draw());
        assert!(!board.is_won());
        assert!(board.is_over());
        assert_eq!(board.winner(), None);
        assert_eq!(board.result(), Some(GameResult::Drawn));
        assert!(board.legal_columns().is_empty());
        assert_consistent(&board);
    }

    #[test]
    fn clone_is_independent() {
        let original = board(&[2, 3, 2]);
        let mut copy = original.clone();
        assert_eq!(copy.snapshot(), original.snapshot());
        assert_eq!(copy.history(), original.history());
        copy.play(4);
        assert_eq!(original.history().len(), 3);
        assert_eq!(original.current_player(), Player::Two);
        assert_eq!(copy.current_player(), Player::One);
    }

    #[test]
    fn random_columns_fill_the_board_legally() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut board = Board::default();
        while !board.legal_columns().is_empty() {
            let col = board.play_random_legal_column(&mut rng).unwrap();
            assert!(col < DEFAULT_COLUMNS);
            assert_consistent(&board);
        }
        assert_eq!(board.history().len(), 42);
        assert_eq!(
            board.play_random_legal_column(&mut rng),
            Err(GameError::NoMoves)
        );
    }

    #[test]
    fn connect_one_wins_immediately() {
        let rules = Rules::new(3, 2, 1).unwrap();
        let board = Board::from_columns(rules, &[1]).unwrap();
        assert_eq!(board.winning_connection(), vec![Coord { column: 1, row: 0 }]);
    }

    #[test]
    fn rejects_degenerate_rules() {
        assert!(matches!(Rules::new(0, 6, 4), Err(GameError::InvalidRules(_))));
        assert!(matches!(Rules::new(7, 6, 0), Err(GameError::InvalidRules(_))));
    }

    #[test]
    fn deserialized_rules_are_validated() {
        let rules: Rules =
            serde_json::from_str(r#"{ "columns": 5, "rows": 4, "connect": 3 }"#).unwrap();
        assert_eq!((rules.columns(), rules.rows(), rules.connect()), (5, 4, 3));
        let zero_connect =
            serde_json::from_str::<Rules>(r#"{ "columns": 7, "rows": 6, "connect": 0 }"#);
        assert!(zero_connect.is_err());
        assert!(!Board::new(Rules::default()).is_won());
    }

    #[test]
    fn snapshot_serializes_column_major() {
        let board = board(&[0, 0, 1]);
        let json = serde_json::to_value(board.snapshot()).unwrap();
        assert_eq!(json["grid"][0], serde_json::json!(["one", "two"]));
        assert_eq!(json["grid"][1], serde_json::json!(["one"]));
        assert_eq!(json["current_player"], "two");
    }

    #[test]
    fn display_draws_top_row_first() {
        let board = board(&[0, 0, 1]);
        let text = board.to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[4], "O......");
        assert_eq!(lines[5], "XX.....");
        assert_eq!(lines[6], "0123456");
    }
}
