//! Breadth-first reachability over the hex grid
//!
//! Hop count is the only metric, so plain BFS replaces weighted search.
//! Ties between equal-length paths resolve by neighbor-table visitation
//! order, which makes every result reproducible.

use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::grid::hex::HexCoord;
use crate::grid::map::HexGrid;

/// Traversal rule a unit moves under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MovementKind {
    Ground,
    Flying,
    Teleport,
}

impl MovementKind {
    /// Flying and teleporting units pass over blocking occupants
    pub fn ignores_blockers(&self) -> bool {
        !matches!(self, MovementKind::Ground)
    }
}

/// Shortest path from `start` (exclusive) to `goal` (inclusive).
///
/// The goal cell may always be entered regardless of its own walkability;
/// callers decide whether actually stopping there is legal. Returns an
/// empty path when `start == goal` and `None` when no route exists.
pub fn find_path(
    grid: &HexGrid,
    start: HexCoord,
    goal: HexCoord,
    movement: MovementKind,
) -> Option<Vec<HexCoord>> {
    if !grid.in_bounds(start) || !grid.in_bounds(goal) {
        return None;
    }
    if start == goal {
        return Some(Vec::new());
    }

    let mut came_from: AHashMap<HexCoord, HexCoord> = AHashMap::new();
    let mut visited: AHashSet<HexCoord> = AHashSet::new();
    let mut frontier: VecDeque<HexCoord> = VecDeque::new();

    let _ = visited.insert(start);
    frontier.push_back(start);

    while let Some(current) = frontier.pop_front() {
        for neighbor in grid.neighbors(current) {
            if visited.contains(&neighbor) {
                continue;
            }
            if neighbor == goal {
                let _ = came_from.insert(neighbor, current);
                return Some(reconstruct(&came_from, start, goal));
            }
            if !movement.ignores_blockers() && !grid.is_walkable(neighbor) {
                continue;
            }
            let _ = visited.insert(neighbor);
            let _ = came_from.insert(neighbor, current);
            frontier.push_back(neighbor);
        }
    }

    None
}

/// Cells attainable from `start` within `max_steps` hops. Always contains
/// `start`; the goal-entry exception of [`find_path`] does not apply.
pub fn reachable_cells(
    grid: &HexGrid,
    start: HexCoord,
    max_steps: u32,
    movement: MovementKind,
) -> AHashSet<HexCoord> {
    let mut reached: AHashSet<HexCoord> = AHashSet::new();
    let _ = reached.insert(start);
    if !grid.in_bounds(start) || max_steps == 0 {
        return reached;
    }

    let mut frontier: VecDeque<(HexCoord, u32)> = VecDeque::new();
    frontier.push_back((start, 0));

    while let Some((current, depth)) = frontier.pop_front() {
        if depth == max_steps {
            continue;
        }
        for neighbor in grid.neighbors(current) {
            if reached.contains(&neighbor) {
                continue;
            }
            if !movement.ignores_blockers() && !grid.is_walkable(neighbor) {
                continue;
            }
            let _ = reached.insert(neighbor);
            frontier.push_back((neighbor, depth + 1));
        }
    }

    reached
}

fn reconstruct(
    came_from: &AHashMap<HexCoord, HexCoord>,
    start: HexCoord,
    goal: HexCoord,
) -> Vec<HexCoord> {
    let mut path = vec![goal];
    let mut current = goal;
    while let Some(&prev) = came_from.get(&current) {
        if prev == start {
            break;
        }
        path.push(prev);
        current = prev;
    }
    path.reverse();
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::EntityId;
    use crate::grid::cell::OccupantKind;

    #[test]
    fn test_zero_length_path() {
        let grid = HexGrid::new(4, 4);
        let at = HexCoord::new(1, 1);
        let path = find_path(&grid, at, at, MovementKind::Ground).unwrap();
        assert!(path.is_empty());
    }

    #[test]
    fn test_path_starts_after_origin_ends_at_goal() {
        let grid = HexGrid::new(1, 5);
        let path = find_path(
            &grid,
            HexCoord::new(0, 0),
            HexCoord::new(0, 4),
            MovementKind::Ground,
        )
        .unwrap();
        assert_eq!(path.len(), 4);
        assert_eq!(path.last(), Some(&HexCoord::new(0, 4)));
        assert!(!path.contains(&HexCoord::new(0, 0)));
    }

    #[test]
    fn test_path_steps_are_adjacent() {
        let grid = HexGrid::new(6, 6);
        let start = HexCoord::new(0, 0);
        let path = find_path(&grid, start, HexCoord::new(5, 5), MovementKind::Ground).unwrap();

        let mut prev = start;
        for step in &path {
            assert!(prev.is_adjacent(step), "{:?} !~ {:?}", prev, step);
            prev = *step;
        }
        assert_eq!(path.len() as u32, start.distance(&HexCoord::new(5, 5)));
    }

    #[test]
    fn test_ground_blocked_by_obstacle() {
        // Linear corridor with the middle cell blocked
        let mut grid = HexGrid::new(1, 3);
        grid.add_occupant(HexCoord::new(0, 1), EntityId::new(), OccupantKind::Obstacle);

        let path = find_path(
            &grid,
            HexCoord::new(0, 0),
            HexCoord::new(0, 2),
            MovementKind::Ground,
        );
        assert!(path.is_none());
    }

    #[test]
    fn test_goal_cell_always_enterable() {
        let mut grid = HexGrid::new(1, 3);
        grid.add_occupant(HexCoord::new(0, 2), EntityId::new(), OccupantKind::Creature);

        let path = find_path(
            &grid,
            HexCoord::new(0, 0),
            HexCoord::new(0, 2),
            MovementKind::Ground,
        )
        .unwrap();
        assert_eq!(path.last(), Some(&HexCoord::new(0, 2)));
    }

    #[test]
    fn test_flying_passes_over_obstacle() {
        let mut grid = HexGrid::new(1, 3);
        grid.add_occupant(HexCoord::new(0, 1), EntityId::new(), OccupantKind::Obstacle);

        let path = find_path(
            &grid,
            HexCoord::new(0, 0),
            HexCoord::new(0, 2),
            MovementKind::Flying,
        )
        .unwrap();
        assert_eq!(path.len(), 2);
    }

    #[test]
    fn test_reachable_zero_steps() {
        let grid = HexGrid::new(4, 4);
        let start = HexCoord::new(2, 2);
        let set = reachable_cells(&grid, start, 0, MovementKind::Ground);
        assert_eq!(set.len(), 1);
        assert!(set.contains(&start));
    }

    #[test]
    fn test_reachable_ground_stopped_by_blocker() {
        // Obstacle on (0,1) seals the corridor for ground movement
        let mut grid = HexGrid::new(1, 3);
        grid.add_occupant(HexCoord::new(0, 1), EntityId::new(), OccupantKind::Obstacle);

        let set = reachable_cells(&grid, HexCoord::new(0, 0), 2, MovementKind::Ground);
        assert_eq!(set.len(), 1);
        assert!(set.contains(&HexCoord::new(0, 0)));
    }

    #[test]
    fn test_reachable_flying_ignores_blocker() {
        let mut grid = HexGrid::new(1, 3);
        grid.add_occupant(HexCoord::new(0, 1), EntityId::new(), OccupantKind::Obstacle);

        let set = reachable_cells(&grid, HexCoord::new(0, 0), 2, MovementKind::Flying);
        assert!(set.contains(&HexCoord::new(0, 1)));
        assert!(set.contains(&HexCoord::new(0, 2)));
    }

    #[test]
    fn test_reachable_respects_step_budget() {
        let grid = HexGrid::new(1, 6);
        let set = reachable_cells(&grid, HexCoord::new(0, 0), 2, MovementKind::Ground);
        assert!(set.contains(&HexCoord::new(0, 2)));
        assert!(!set.contains(&HexCoord::new(0, 3)));
    }

    #[test]
    fn test_disconnected_component_unreached() {
        let mut grid = HexGrid::new(1, 5);
        grid.add_occupant(HexCoord::new(0, 2), EntityId::new(), OccupantKind::ForceField);

        let set = reachable_cells(&grid, HexCoord::new(0, 0), 10, MovementKind::Ground);
        assert!(set.contains(&HexCoord::new(0, 1)));
        assert!(!set.contains(&HexCoord::new(0, 3)));
        assert!(!set.contains(&HexCoord::new(0, 4)));
    }
}
