//! Hex grid, occupancy and reachability

pub mod cell;
pub mod hex;
pub mod map;
pub mod pathfinding;

pub use cell::{Cell, Occupant, OccupantKind};
pub use hex::HexCoord;
pub use map::HexGrid;
pub use pathfinding::{find_path, reachable_cells, MovementKind};
