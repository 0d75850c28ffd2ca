//! Core type definitions used throughout the crate

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for battlefield objects (creatures, obstacles, force fields)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityId(pub Uuid);

impl EntityId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

/// Which army a creature fights for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Ally,
    Enemy,
}

impl Side {
    pub fn opposite(&self) -> Self {
        match self {
            Side::Ally => Side::Enemy,
            Side::Enemy => Side::Ally,
        }
    }
}

/// Round counter (one round = every living unit gets a turn)
pub type Round = u32;
