use thiserror::Error;

use crate::board::Square;
use crate::game::Status;

/// Errors surfaced by the rules engine.
///
/// Game outcomes (mate, stalemate, draws) are never errors; they are read
/// from [`Game::status`](crate::game::Game::status).
#[derive(Debug, Error)]
pub enum GameError {
    /// The move is not among the legal moves of the current position.
    #[error("illegal move: {from} -> {to}")]
    IllegalMove { from: Square, to: Square },

    /// A promotion move was applied before its promotion kind was chosen.
    #[error("promotion {from} -> {to} applied without a promotion kind")]
    UnresolvedPromotion { from: Square, to: Square },

    #[error("game is already over: {0:?}")]
    GameOver(Status),

    #[error("square index out of range: {0}")]
    InvalidSquare(usize),

    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}
