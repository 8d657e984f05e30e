//! The connect-four board: a fixed 6×7 grid with gravity.
//!
//! Rows are indexed top-to-bottom (row 0 is the top), columns
//! left-to-right. A dropped disc lands in the lowest empty cell of its
//! column, so a column's occupied cells are always bottom-aligned with
//! no gaps. Only [`Board::apply_move`] mutates the grid.

use std::fmt;

/// Number of rows on the board.
pub const ROWS: usize = 6;

/// Number of columns on the board.
pub const COLS: usize = 7;

/// How many in a row wins the game.
const WIN_LENGTH: usize = 4;

/// The four scan directions for win detection: horizontal, vertical,
/// and both diagonals. Each occupied cell checks three more cells in
/// one direction, so every run of four is found from its first cell.
const DIRECTIONS: [(isize, isize); 4] = [(0, 1), (1, 0), (1, 1), (-1, 1)];

/// Which player a disc belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mark {
    One,
    Two,
}

impl Mark {
    /// Returns the opposing mark.
    pub fn other(self) -> Mark {
        match self {
            Mark::One => Mark::Two,
            Mark::Two => Mark::One,
        }
    }

    /// The wire digit for this mark (`'1'` or `'2'`).
    fn digit(self) -> char {
        match self {
            Mark::One => '1',
            Mark::Two => '2',
        }
    }
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mark::One => write!(f, "player one"),
            Mark::Two => write!(f, "player two"),
        }
    }
}

/// The 6×7 grid. `Copy` is cheap (42 small cells), which is what makes
/// speculative evaluation via [`snapshot`](Board::snapshot) practical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Board {
    cells: [[Option<Mark>; COLS]; ROWS],
}

impl Board {
    /// Creates an empty board.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` iff `column` is in range and its top cell is
    /// empty. Does not mutate.
    pub fn is_legal_move(&self, column: usize) -> bool {
        column < COLS && self.cells[0][column].is_none()
    }

    /// Drops a disc into `column`: the lowest empty cell receives
    /// `mark`. Returns `false` without mutating if the column is full
    /// or out of range.
    pub fn apply_move(&mut self, column: usize, mark: Mark) -> bool {
        if column >= COLS {
            return false;
        }
        for row in (0..ROWS).rev() {
            if self.cells[row][column].is_none() {
                self.cells[row][column] = Some(mark);
                return true;
            }
        }
        false
    }

    /// Scans the whole board for a run of four identical marks in any
    /// direction. Returns the winning mark, or `None`.
    ///
    /// O(rows × cols × 4) — cheap enough to run after every move.
    pub fn winner(&self) -> Option<Mark> {
        for row in 0..ROWS {
            for col in 0..COLS {
                let Some(mark) = self.cells[row][col] else {
                    continue;
                };
                for (dr, dc) in DIRECTIONS {
                    let complete = (1..WIN_LENGTH as isize).all(|step| {
                        let r = row as isize + dr * step;
                        let c = col as isize + dc * step;
                        (0..ROWS as isize).contains(&r)
                            && (0..COLS as isize).contains(&c)
                            && self.cells[r as usize][c as usize]
                                == Some(mark)
                    });
                    if complete {
                        return Some(mark);
                    }
                }
            }
        }
        None
    }

    /// `true` iff the top row has no empty cell and there is no winner.
    pub fn is_draw(&self) -> bool {
        self.cells[0].iter().all(|cell| cell.is_some())
            && self.winner().is_none()
    }

    /// An independent copy for "try move, check result, discard"
    /// evaluation. Moves mutate in place, so the bot heuristic works
    /// on snapshots.
    pub fn snapshot(&self) -> Board {
        *self
    }

    /// Deterministic wire representation: one digit per cell
    /// (`0` empty, `1`/`2` for the marks), row-major top-to-bottom,
    /// rows joined with commas.
    pub fn serialize(&self) -> String {
        let mut out = String::with_capacity(ROWS * (COLS + 1));
        for (row_index, row) in self.cells.iter().enumerate() {
            if row_index > 0 {
                out.push(',');
            }
            for cell in row {
                out.push(cell.map_or('0', Mark::digit));
            }
        }
        out
    }

    /// The cell at `(row, column)`, or `None` if empty or out of range.
    pub fn cell(&self, row: usize, column: usize) -> Option<Mark> {
        self.cells.get(row).and_then(|r| r.get(column)).copied().flatten()
    }

    /// Iterates the columns that currently accept a move, left to right.
    pub fn legal_columns(&self) -> impl Iterator<Item = usize> + '_ {
        (0..COLS).filter(|&col| self.is_legal_move(col))
    }
}
