use thiserror::Error;

use crate::grid::HexCoord;

/// Errors raised while assembling a battle. Once a battle runs, invalid
/// requests degrade to no-ops instead of surfacing here.
#[derive(Error, Debug)]
pub enum ArenaError {
    #[error("Unknown creature template: {0}")]
    UnknownTemplate(String),

    #[error("Template {template} has no level {level}")]
    InvalidLevel { template: String, level: u8 },

    #[error("Unknown effect definition: {0}")]
    UnknownEffect(String),

    #[error("Cell {0:?} is outside the battlefield")]
    OutOfBounds(HexCoord),

    #[error("Cell {0:?} is already occupied")]
    SpawnBlocked(HexCoord),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ArenaError>;
