//! Battlefield cells and their occupants

use serde::{Deserialize, Serialize};

use crate::core::types::EntityId;
use crate::grid::hex::HexCoord;

/// What kind of object resides in a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OccupantKind {
    Creature,
    Obstacle,
    ForceField,
    None,
}

impl OccupantKind {
    /// Blocking kinds make their cell unwalkable
    pub fn blocks(&self) -> bool {
        matches!(
            self,
            OccupantKind::Creature | OccupantKind::Obstacle | OccupantKind::ForceField
        )
    }
}

/// An object resident in a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occupant {
    pub id: EntityId,
    pub kind: OccupantKind,
}

/// A single cell on the battlefield.
/// Walkability is derived from the occupant list and never set directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cell {
    pub coord: HexCoord,
    occupants: Vec<Occupant>,
    walkable: bool,
}

impl Cell {
    pub fn new(coord: HexCoord) -> Self {
        Self {
            coord,
            occupants: Vec::new(),
            walkable: true,
        }
    }

    pub fn walkable(&self) -> bool {
        self.walkable
    }

    pub fn occupants(&self) -> &[Occupant] {
        &self.occupants
    }

    pub fn has_occupant(&self, id: EntityId) -> bool {
        self.occupants.iter().any(|o| o.id == id)
    }

    /// First creature occupant, if any
    pub fn creature(&self) -> Option<EntityId> {
        self.occupants
            .iter()
            .find(|o| o.kind == OccupantKind::Creature)
            .map(|o| o.id)
    }

    pub(super) fn push_occupant(&mut self, occupant: Occupant) {
        self.occupants.push(occupant);
        self.recompute_walkable();
    }

    /// Removes by identity; returns whether anything was removed.
    pub(super) fn remove_occupant(&mut self, id: EntityId) -> bool {
        let before = self.occupants.len();
        self.occupants.retain(|o| o.id != id);
        let removed = self.occupants.len() != before;
        if removed {
            self.recompute_walkable();
        }
        removed
    }

    fn recompute_walkable(&mut self) {
        self.walkable = !self.occupants.iter().any(|o| o.kind.blocks());
    }
}
