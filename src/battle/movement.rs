//! Stepwise relocation with awaited translation steps
//!
//! A move is planned once, then walked one hop at a time: each hop emits a
//! presentation request and the coordinator suspends until the step
//! completion arrives. Occupancy transfers only after the final step, so an
//! externally aborted relocation leaves the grid untouched.

use serde::{Deserialize, Serialize};

use crate::battle::creature::{AttackKind, Creature};
use crate::core::types::EntityId;
use crate::grid::{find_path, reachable_cells, HexCoord, HexGrid};

/// Attack queued behind a relocation; its completion is what ends the turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreludeAttack {
    pub target: EntityId,
    pub attack: AttackKind,
}

/// An in-flight relocation awaiting step completions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingMove {
    pub unit: EntityId,
    pub origin: HexCoord,
    pub path: Vec<HexCoord>,
    /// Index of the step currently playing
    pub step: usize,
    pub prelude: Option<PreludeAttack>,
}

impl PendingMove {
    /// (from, to) of the step currently playing, or None past the end
    pub fn current_step(&self) -> Option<(HexCoord, HexCoord)> {
        let to = *self.path.get(self.step)?;
        let from = if self.step == 0 {
            self.origin
        } else {
            self.path[self.step - 1]
        };
        Some((from, to))
    }

    pub fn destination(&self) -> HexCoord {
        self.path.last().copied().unwrap_or(self.origin)
    }

    pub fn finished(&self) -> bool {
        self.step >= self.path.len()
    }
}

/// A destination is legal when it is walkable and inside the unit's
/// reachable set for this turn.
pub fn validate_move(grid: &HexGrid, creature: &Creature, target: HexCoord) -> bool {
    if !grid.is_walkable(target) {
        return false;
    }
    reachable_cells(grid, creature.position, creature.speed(), creature.movement).contains(&target)
}

/// Plan the hop sequence for an already validated destination
pub fn plan_move(grid: &HexGrid, creature: &Creature, target: HexCoord) -> Option<Vec<HexCoord>> {
    find_path(grid, creature.position, target, creature.movement)
}
