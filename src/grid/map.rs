//! The battlefield grid and occupancy model
//!
//! The grid owns every cell and a reverse index from object id to the cell
//! it resides in. The index is what makes the single-residency invariant
//! cheap to enforce: an object already resident anywhere is refused on add,
//! so relocation is always remove-then-add, never parallel residency.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::core::types::EntityId;
use crate::grid::cell::{Cell, Occupant, OccupantKind};
use crate::grid::hex::HexCoord;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HexGrid {
    pub rows: i32,
    pub cols: i32,
    cells: AHashMap<HexCoord, Cell>,
    residents: AHashMap<EntityId, HexCoord>,
}

impl HexGrid {
    /// Create a rectangular board with every cell open
    pub fn new(rows: i32, cols: i32) -> Self {
        let mut cells = AHashMap::new();
        for row in 0..rows {
            for col in 0..cols {
                let coord = HexCoord::new(row, col);
                cells.insert(coord, Cell::new(coord));
            }
        }
        Self {
            rows,
            cols,
            cells,
            residents: AHashMap::new(),
        }
    }

    pub fn in_bounds(&self, coord: HexCoord) -> bool {
        coord.row >= 0 && coord.col >= 0 && coord.row < self.rows && coord.col < self.cols
    }

    pub fn cell(&self, coord: HexCoord) -> Option<&Cell> {
        self.cells.get(&coord)
    }

    /// False for off-board coordinates
    pub fn is_walkable(&self, coord: HexCoord) -> bool {
        self.cell(coord).map(|c| c.walkable()).unwrap_or(false)
    }

    /// On-board neighbors in canonical table order
    pub fn neighbors(&self, coord: HexCoord) -> Vec<HexCoord> {
        coord
            .neighbors()
            .into_iter()
            .filter(|c| self.in_bounds(*c))
            .collect()
    }

    /// Where an object currently resides, if anywhere
    pub fn position_of(&self, id: EntityId) -> Option<HexCoord> {
        self.residents.get(&id).copied()
    }

    /// Append an occupant to a cell. No-op when the object is already
    /// resident in any cell, the kind is None, or the cell is off-board.
    pub fn add_occupant(&mut self, coord: HexCoord, id: EntityId, kind: OccupantKind) {
        if kind == OccupantKind::None || self.residents.contains_key(&id) {
            return;
        }
        let Some(cell) = self.cells.get_mut(&coord) else {
            return;
        };
        cell.push_occupant(Occupant { id, kind });
        let _ = self.residents.insert(id, coord);
    }

    /// Remove an occupant by identity. Idempotent: absent objects are ignored.
    pub fn remove_occupant(&mut self, coord: HexCoord, id: EntityId) {
        let Some(cell) = self.cells.get_mut(&coord) else {
            return;
        };
        if cell.remove_occupant(id) {
            let _ = self.residents.remove(&id);
        }
    }

    /// Relocate a resident object: remove from its current cell, then add
    /// to the destination. No-op for unknown objects.
    pub fn move_occupant(&mut self, id: EntityId, to: HexCoord) {
        let Some(from) = self.position_of(id) else {
            return;
        };
        let kind = self
            .cell(from)
            .and_then(|c| c.occupants().iter().find(|o| o.id == id).map(|o| o.kind));
        let Some(kind) = kind else { return };
        self.remove_occupant(from, id);
        self.add_occupant(to, id, kind);
    }
}
