//! Bot move policies.
//!
//! Both policies are stateless: they read a board snapshot and return
//! a column, or `None` when no legal move exists (a full board — the
//! session checks for a draw before asking the bot, so `None` should
//! not occur in practice).

use rand::Rng;

use serde::{Deserialize, Serialize};

use crate::board::{Board, Mark, COLS};

/// Columns the hard policy prefers when no tactical move exists,
/// center first. This ordering is an intentional heuristic — it plays
/// a decent game without being an optimal solver.
const COLUMN_PRIORITY: [usize; COLS] = [3, 2, 4, 1, 5, 0, 6];

/// Which policy a synthetic opponent runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    /// Uniform random over legal columns.
    Easy,
    /// Win if possible, block if necessary, otherwise play center-out.
    Hard,
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Difficulty::Easy => write!(f, "easy"),
            Difficulty::Hard => write!(f, "hard"),
        }
    }
}

/// Picks the bot's next column for the given difficulty.
///
/// `bot` is the mark the bot plays. Returns `None` only when the board
/// has no legal column left.
pub fn choose_move(
    board: &Board,
    difficulty: Difficulty,
    bot: Mark,
) -> Option<usize> {
    let mut rng = rand::rng();
    match difficulty {
        Difficulty::Easy => random_move(board, &mut rng),
        Difficulty::Hard => heuristic_move(board, bot, &mut rng),
    }
}

/// Uniformly random choice among the legal columns.
pub fn random_move(board: &Board, rng: &mut impl Rng) -> Option<usize> {
    let legal: Vec<usize> = board.legal_columns().collect();
    if legal.is_empty() {
        None
    } else {
        Some(legal[rng.random_range(0..legal.len())])
    }
}

/// The hard policy, in order:
///
/// 1. a column that wins for the bot immediately
/// 2. a column the opponent would win with next turn (block it)
/// 3. the first legal column in center-out priority order
/// 4. random fallback
pub fn heuristic_move(
    board: &Board,
    bot: Mark,
    rng: &mut impl Rng,
) -> Option<usize> {
    if let Some(col) = winning_column(board, bot) {
        return Some(col);
    }
    if let Some(col) = winning_column(board, bot.other()) {
        return Some(col);
    }
    for col in COLUMN_PRIORITY {
        if board.is_legal_move(col) {
            return Some(col);
        }
    }
    random_move(board, rng)
}

/// Finds a column where `mark`'s move completes four in a row, by
/// simulating each legal move on a snapshot.
fn winning_column(board: &Board, mark: Mark) -> Option<usize> {
    board.legal_columns().find(|&col| {
        let mut trial = board.snapshot();
        trial.apply_move(col, mark);
        trial.winner() == Some(mark)
    })
}
