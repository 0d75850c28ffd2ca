//! Attack sequencing and impact resolution
//!
//! An attack plays out in phases: orient, await the declared number of
//! hits, splash, then a possible counterattack. Damage itself is a uniform
//! roll scaled by stack size and the attack/defense differential; defenders
//! holding a stance trade the direct impact for a block outcome.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::battle::constants::{
    ATTACK_BONUS_PER_POINT, BLOCK_DAMAGE_FACTOR, DEFENSE_REDUCTION_PER_POINT, MAX_ATTACK_FACTOR,
    MIN_DEFENSE_FACTOR,
};
use crate::battle::creature::{AttackKind, Creature, Roster};
use crate::battle::stats::StatKind;
use crate::core::types::{EntityId, Side};
use crate::grid::{reachable_cells, HexCoord, HexGrid, OccupantKind};

/// Where an attack sequence currently suspends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttackPhase {
    /// Awaiting rotation completion
    Orienting,
    /// Awaiting the primary hit signals
    Striking { hits_remaining: u32 },
    /// Awaiting the single counterattack hit
    CounterStriking { hits_remaining: u32 },
}

/// An in-flight attack awaiting presentation signals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackSequence {
    pub attacker: EntityId,
    pub target: EntityId,
    pub attack: AttackKind,
    pub phase: AttackPhase,
}

/// Attacker stats frozen at strike time, so the target can be mutated
/// without holding two roster borrows.
#[derive(Debug, Clone, Copy)]
pub struct StrikeStats {
    pub attack: i32,
    pub min_damage: i32,
    pub max_damage: i32,
    pub stack_size: u32,
}

impl StrikeStats {
    pub fn of(creature: &Creature) -> Self {
        Self {
            attack: creature.effective(StatKind::Attack),
            min_damage: creature.effective(StatKind::MinDamage),
            max_damage: creature.effective(StatKind::MaxDamage),
            stack_size: creature.stack_size,
        }
    }
}

/// Outcome of one strike against one creature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImpactOutcome {
    pub damage: i64,
    pub killed: u32,
    pub blocked: bool,
    pub destroyed: bool,
}

/// Hits to await: two when a matching double-attack effect is armed
pub fn hit_count(attacker: &Creature, attack: AttackKind) -> u32 {
    if attacker.has_double_attack(attack) {
        2
    } else {
        1
    }
}

/// Uniform damage roll scaled by the attack/defense differential
pub fn roll_damage(stats: &StrikeStats, target: &Creature, rng: &mut impl Rng) -> i64 {
    let min = i64::from(stats.min_damage.max(0));
    let max = i64::from(stats.max_damage).max(min);
    let roll = rng.gen_range(min..=max);
    let base = roll * i64::from(stats.stack_size);
    if base == 0 {
        return 0;
    }

    let defense = target.effective(StatKind::Defense);
    let factor = if stats.attack >= defense {
        (1.0 + ATTACK_BONUS_PER_POINT * (stats.attack - defense) as f32).min(MAX_ATTACK_FACTOR)
    } else {
        (1.0 - DEFENSE_REDUCTION_PER_POINT * (defense - stats.attack) as f32)
            .max(MIN_DEFENSE_FACTOR)
    };

    ((base as f32 * factor).round() as i64).max(1)
}

/// Resolve one strike, honoring the defender's block stance
pub fn strike(stats: &StrikeStats, target: &mut Creature, rng: &mut impl Rng) -> ImpactOutcome {
    let mut damage = roll_damage(stats, target, rng);
    let blocked = target.defending;
    if blocked {
        damage = (damage as f32 * BLOCK_DAMAGE_FACTOR).floor() as i64;
    }
    let report = target.apply_damage(damage);
    ImpactOutcome {
        damage,
        killed: report.killed,
        blocked,
        destroyed: report.destroyed,
    }
}

/// Living enemies of `side` on cells adjacent to `around`, enumerated in
/// canonical neighbor-table order, excluding the primary target.
pub fn splash_targets(
    grid: &HexGrid,
    roster: &Roster,
    around: HexCoord,
    side: Side,
    exclude: EntityId,
) -> Vec<EntityId> {
    let mut out = Vec::new();
    for coord in grid.neighbors(around) {
        let Some(cell) = grid.cell(coord) else {
            continue;
        };
        for occupant in cell.occupants() {
            if occupant.kind != OccupantKind::Creature || occupant.id == exclude {
                continue;
            }
            if let Some(creature) = roster.get(occupant.id) {
                if creature.alive() && creature.side != side {
                    out.push(occupant.id);
                }
            }
        }
    }
    out
}

/// First cell a melee attacker can strike from: target-neighbor enumeration
/// order, walkable, inside the attacker's reachable set.
pub fn approach_cell(grid: &HexGrid, attacker: &Creature, target_pos: HexCoord) -> Option<HexCoord> {
    let reachable = reachable_cells(grid, attacker.position, attacker.speed(), attacker.movement);
    grid.neighbors(target_pos)
        .into_iter()
        .find(|c| grid.is_walkable(*c) && reachable.contains(c))
}

/// The living enemy on the cell directly behind the target, as seen from an
/// adjacent attacker. This is where a piercing strike carries through.
pub fn pierce_target(
    grid: &HexGrid,
    roster: &Roster,
    attacker_pos: HexCoord,
    target_pos: HexCoord,
    side: Side,
) -> Option<EntityId> {
    let direction = attacker_pos
        .neighbors()
        .iter()
        .position(|c| *c == target_pos)?;
    let behind = target_pos.neighbors()[direction];
    let creature = grid.cell(behind)?.creature()?;
    roster
        .get(creature)
        .filter(|c| c.alive() && c.side != side)
        .map(|c| c.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::creature::CreatureNature;
    use crate::battle::effects::{Effect, EffectKind};
    use crate::battle::stats::StatBlock;
    use crate::grid::MovementKind;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn fighter(side: Side, attack: i32, defense: i32) -> Creature {
        Creature::new(
            side,
            "fighter",
            "Fighter",
            CreatureNature::Living,
            MovementKind::Ground,
            AttackKind::Melee,
            StatBlock {
                attack,
                defense,
                min_damage: 3,
                max_damage: 3,
                health: 10,
                speed: 4,
                stack_size: 2,
                shots: 0,
            },
            0,
        )
    }

    #[test]
    fn test_hit_count_matches_double_attack_kind() {
        let mut archer = fighter(Side::Ally, 4, 4);
        archer.attack_kind = AttackKind::Ranged;
        assert_eq!(hit_count(&archer, AttackKind::Ranged), 1);

        assert!(archer.try_attach(Effect::marker(EffectKind::DoubleAttack {
            attack: AttackKind::Ranged,
        })));
        assert_eq!(hit_count(&archer, AttackKind::Ranged), 2);
        // A double SHOT does not double melee blows
        assert_eq!(hit_count(&archer, AttackKind::Melee), 1);
    }

    #[test]
    fn test_equal_stats_deal_flat_roll() {
        let attacker = fighter(Side::Ally, 5, 5);
        let target = fighter(Side::Enemy, 5, 5);
        let mut rng = ChaCha8Rng::seed_from_u64(0);

        // min == max == 3, stack 2 => 6 damage, factor 1.0
        assert_eq!(roll_damage(&StrikeStats::of(&attacker), &target, &mut rng), 6);
    }

    #[test]
    fn test_attack_advantage_raises_damage() {
        let attacker = fighter(Side::Ally, 9, 0);
        let target = fighter(Side::Enemy, 0, 5);
        let mut rng = ChaCha8Rng::seed_from_u64(0);

        // differential 4 => factor 1.2 => 6 * 1.2 = 7.2 -> 7
        assert_eq!(roll_damage(&StrikeStats::of(&attacker), &target, &mut rng), 7);
    }

    #[test]
    fn test_defense_advantage_lowers_damage() {
        let attacker = fighter(Side::Ally, 1, 0);
        let target = fighter(Side::Enemy, 0, 9);
        let mut rng = ChaCha8Rng::seed_from_u64(0);

        // differential 8 => factor 0.8 => 6 * 0.8 = 4.8 -> 5
        assert_eq!(roll_damage(&StrikeStats::of(&attacker), &target, &mut rng), 5);
    }

    #[test]
    fn test_damage_factors_capped() {
        let attacker = fighter(Side::Ally, 100, 0);
        let target = fighter(Side::Enemy, 0, 0);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        // factor capped at 4.0 => 24
        assert_eq!(
            roll_damage(&StrikeStats::of(&attacker), &target, &mut rng),
            24
        );

        let weakling = fighter(Side::Ally, 0, 0);
        let fortress = fighter(Side::Enemy, 0, 100);
        // factor floored at 0.3 => 6 * 0.3 = 1.8 -> 2
        assert_eq!(
            roll_damage(&StrikeStats::of(&weakling), &fortress, &mut rng),
            2
        );
    }

    #[test]
    fn test_block_halves_damage() {
        let attacker = fighter(Side::Ally, 5, 5);
        let mut target = fighter(Side::Enemy, 5, 5);
        target.defending = true;
        let mut rng = ChaCha8Rng::seed_from_u64(0);

        let outcome = strike(&StrikeStats::of(&attacker), &mut target, &mut rng);
        assert!(outcome.blocked);
        assert_eq!(outcome.damage, 3); // 6 halved
    }

    #[test]
    fn test_splash_enumeration_enemies_only() {
        let mut grid = HexGrid::new(3, 3);
        let mut roster = Roster::new();

        let mut attacker = fighter(Side::Ally, 5, 5);
        attacker.position = HexCoord::new(1, 1);
        let attacker_id = attacker.id;
        grid.add_occupant(attacker.position, attacker_id, OccupantKind::Creature);
        let _ = roster.insert(attacker);

        let mut primary = fighter(Side::Enemy, 5, 5);
        primary.position = HexCoord::new(1, 2);
        let primary_id = primary.id;
        grid.add_occupant(primary.position, primary_id, OccupantKind::Creature);
        let _ = roster.insert(primary);

        let mut flanker = fighter(Side::Enemy, 5, 5);
        flanker.position = HexCoord::new(0, 1);
        let flanker_id = flanker.id;
        grid.add_occupant(flanker.position, flanker_id, OccupantKind::Creature);
        let _ = roster.insert(flanker);

        let mut friend = fighter(Side::Ally, 5, 5);
        friend.position = HexCoord::new(2, 1);
        grid.add_occupant(friend.position, friend.id, OccupantKind::Creature);
        let _ = roster.insert(friend);

        let targets = splash_targets(
            &grid,
            &roster,
            HexCoord::new(1, 1),
            Side::Ally,
            primary_id,
        );
        assert_eq!(targets, vec![flanker_id]);
    }

    #[test]
    fn test_approach_cell_prefers_table_order() {
        let grid = HexGrid::new(3, 3);
        let mut attacker = fighter(Side::Ally, 5, 5);
        attacker.position = HexCoord::new(1, 0);

        // Target at (1,2); first walkable reachable neighbor in table order
        // for an odd row is (0,2)
        let cell = approach_cell(&grid, &attacker, HexCoord::new(1, 2)).unwrap();
        assert_eq!(cell, HexCoord::new(0, 2));
    }

    #[test]
    fn test_pierce_target_is_cell_behind() {
        let mut grid = HexGrid::new(3, 4);
        let mut roster = Roster::new();

        let mut behind = fighter(Side::Enemy, 5, 5);
        behind.position = HexCoord::new(1, 3);
        let behind_id = behind.id;
        grid.add_occupant(behind.position, behind_id, OccupantKind::Creature);
        let _ = roster.insert(behind);

        // Attacker east-facing at (1,1), target at (1,2): the strike
        // carries through to (1,3)
        assert_eq!(
            pierce_target(
                &grid,
                &roster,
                HexCoord::new(1, 1),
                HexCoord::new(1, 2),
                Side::Ally,
            ),
            Some(behind_id)
        );

        // An allied creature behind the target is spared
        roster.get_mut(behind_id).unwrap().side = Side::Ally;
        assert_eq!(
            pierce_target(
                &grid,
                &roster,
                HexCoord::new(1, 1),
                HexCoord::new(1, 2),
                Side::Ally,
            ),
            None
        );

        // Non-adjacent attacker has no carry-through line
        assert_eq!(
            pierce_target(
                &grid,
                &roster,
                HexCoord::new(1, 0),
                HexCoord::new(1, 2),
                Side::Ally,
            ),
            None
        );
    }

    #[test]
    fn test_approach_cell_none_when_sealed() {
        let mut grid = HexGrid::new(1, 4);
        // Corridor: attacker (0,0), wall at (0,1), target at (0,2)
        grid.add_occupant(HexCoord::new(0, 1), EntityId::new(), OccupantKind::Obstacle);
        grid.add_occupant(HexCoord::new(0, 3), EntityId::new(), OccupantKind::Obstacle);

        let mut attacker = fighter(Side::Ally, 5, 5);
        attacker.position = HexCoord::new(0, 0);

        assert!(approach_cell(&grid, &attacker, HexCoord::new(0, 2)).is_none());
    }
}
