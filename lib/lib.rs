/// Chess domain types.
pub mod chess;
/// Static position evaluation.
pub mod eval;
/// Bulk move-count verification.
pub mod perft;
/// Minimax searching algorithm.
pub mod search;
