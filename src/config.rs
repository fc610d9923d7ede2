use serde::{Deserialize, Serialize};

use crate::error::GameError;

/// Rule thresholds and behaviour switches for a [`Game`](crate::game::Game).
///
/// Every field has a default, so a JSON document only needs to name the
/// values it overrides.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct GameConfig {
    /// Plies without a pawn move or capture after which the game is drawn.
    pub fifty_move_plies: u32,
    /// Occurrences of one position that draw the game.
    pub repetition_limit: u32,
    /// Accept `make` after the game has reached a terminal status.
    pub allow_moves_after_end: bool,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            fifty_move_plies: 100,
            repetition_limit: 3,
            allow_moves_after_end: false,
        }
    }
}

impl GameConfig {
    pub fn from_json(json: &str) -> Result<Self, GameError> {
        Ok(serde_json::from_str(json)?)
    }
}
