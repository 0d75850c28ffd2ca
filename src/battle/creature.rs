//! Creature stacks: identity, stats and mutable battle state
//!
//! A creature is a stack of identical members. Damage drains the pool
//! `(stack_size - 1) * member_health + top_health`, killing members from
//! the top. Effective stats come from the base block scaled by the
//! aggregate multipliers derived from active effects.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::battle::constants::COUNTERATTACKS_PER_ROUND;
use crate::battle::effects::{self, Effect, EffectKind, StrikeReach};
use crate::battle::stats::{StatBlock, StatKind};
use crate::core::types::{EntityId, Side};
use crate::grid::{HexCoord, MovementKind};

/// Creature nature; morale rules apply to Living creatures only
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CreatureNature {
    Living,
    Undead,
    Construct,
}

/// How a creature delivers its attacks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttackKind {
    Melee,
    Ranged,
}

/// Result of applying damage to a stack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageReport {
    pub dealt: i64,
    pub killed: u32,
    pub destroyed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Creature {
    pub id: EntityId,
    pub template_id: String,
    pub name: String,
    pub side: Side,
    pub nature: CreatureNature,
    pub movement: MovementKind,
    pub attack_kind: AttackKind,
    pub base: StatBlock,
    pub morale: i32,

    pub position: HexCoord,
    pub stack_size: u32,
    pub top_health: i32,
    pub shots: u32,
    pub defending: bool,
    pub counters_left: u32,
    /// Animation-capability flag mirrored to the presentation layer
    pub double_strike_armed: bool,

    effects: Vec<Effect>,
    scaling: AHashMap<StatKind, f32>,
}

impl Creature {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        side: Side,
        template_id: impl Into<String>,
        name: impl Into<String>,
        nature: CreatureNature,
        movement: MovementKind,
        attack_kind: AttackKind,
        base: StatBlock,
        morale: i32,
    ) -> Self {
        Self {
            id: EntityId::new(),
            template_id: template_id.into(),
            name: name.into(),
            side,
            nature,
            movement,
            attack_kind,
            base,
            morale,
            position: HexCoord::default(),
            stack_size: base.stack_size,
            top_health: base.health,
            shots: base.shots,
            defending: false,
            counters_left: COUNTERATTACKS_PER_ROUND,
            double_strike_armed: false,
            effects: Vec::new(),
            scaling: AHashMap::new(),
        }
    }

    pub fn alive(&self) -> bool {
        self.stack_size > 0
    }

    // ---- stats ----

    /// Base value before effect scaling
    fn base_value(&self, kind: StatKind) -> i32 {
        match kind {
            StatKind::Morale => self.morale,
            other => self.base.base(other),
        }
    }

    /// Aggregate multiplier currently registered for a stat
    pub fn scaling_for(&self, kind: StatKind) -> f32 {
        self.scaling.get(&kind).copied().unwrap_or(1.0)
    }

    /// Base stat scaled by the active-effect aggregate
    pub fn effective(&self, kind: StatKind) -> i32 {
        let base = self.base_value(kind);
        (base as f32 * self.scaling_for(kind)).round() as i32
    }

    /// Movement budget in hops
    pub fn speed(&self) -> u32 {
        self.effective(StatKind::Speed).max(0) as u32
    }

    pub fn effective_morale(&self) -> i32 {
        self.effective(StatKind::Morale)
    }

    /// Hit points of one stack member, never below 1
    fn member_health(&self) -> i64 {
        i64::from(self.effective(StatKind::Health).max(1))
    }

    // ---- effects ----

    pub fn effects(&self) -> &[Effect] {
        &self.effects
    }

    /// Attach an effect, honoring the stacking policy.
    /// Returns false when the policy rejects it.
    pub fn try_attach(&mut self, effect: Effect) -> bool {
        if !effects::can_attach(&self.effects, &effect) {
            return false;
        }
        self.effects.push(effect);
        self.refresh_derived();
        true
    }

    /// Detach every effect the predicate selects, reverting their modifiers
    pub fn detach_where(&mut self, mut predicate: impl FnMut(&Effect) -> bool) -> usize {
        let before = self.effects.len();
        self.effects.retain(|e| !predicate(e));
        let removed = before - self.effects.len();
        if removed > 0 {
            self.refresh_derived();
        }
        removed
    }

    /// Strip all dispellable effects; returns how many were removed
    pub fn dispel(&mut self) -> usize {
        self.detach_where(|e| e.dispellable)
    }

    /// Rebuild the aggregate multipliers and marker-driven flags from the
    /// surviving effect list, so detach reverts exactly what apply added.
    fn refresh_derived(&mut self) {
        self.scaling.clear();
        for kind in StatKind::ALL {
            let base = self.base_value(kind);
            let mut aggregate = 1.0f32;
            let mut touched = false;
            for effect in &self.effects {
                if let Some(m) = effect.kind.multiplier_for(kind, base) {
                    aggregate *= m;
                    touched = true;
                }
            }
            if touched {
                let _ = self.scaling.insert(kind, aggregate);
            }
        }
        self.double_strike_armed = self
            .effects
            .iter()
            .any(|e| matches!(e.kind, EffectKind::DoubleAttack { .. }));
    }

    pub fn has_double_attack(&self, attack: AttackKind) -> bool {
        self.effects
            .iter()
            .any(|e| matches!(e.kind, EffectKind::DoubleAttack { attack: a } if a == attack))
    }

    pub fn has_strike(&self, reach: StrikeReach) -> bool {
        self.effects
            .iter()
            .any(|e| matches!(e.kind, EffectKind::Strike(r) if r == reach))
    }

    pub fn has_unanswered_strike(&self) -> bool {
        self.effects
            .iter()
            .any(|e| matches!(e.kind, EffectKind::UnansweredStrike))
    }

    pub fn has_explosive_shot(&self) -> bool {
        self.effects
            .iter()
            .any(|e| matches!(e.kind, EffectKind::ExplosiveShot))
    }

    // ---- damage ----

    /// Remaining hit-point pool of the whole stack
    pub fn total_health(&self) -> i64 {
        if !self.alive() {
            return 0;
        }
        i64::from(self.stack_size - 1) * self.member_health() + i64::from(self.top_health)
    }

    /// Drain the pool, killing members from the top
    pub fn apply_damage(&mut self, amount: i64) -> DamageReport {
        let amount = amount.max(0);
        let before = self.stack_size;
        let pool = self.total_health() - amount;

        if pool <= 0 {
            self.stack_size = 0;
            self.top_health = 0;
            return DamageReport {
                dealt: amount,
                killed: before,
                destroyed: true,
            };
        }

        let per = self.member_health();
        let remaining = ((pool + per - 1) / per) as u32;
        self.stack_size = remaining;
        self.top_health = (pool - i64::from(remaining - 1) * per) as i32;
        DamageReport {
            dealt: amount,
            killed: before - remaining,
            destroyed: false,
        }
    }

    /// Per-round consumables; ammunition persists for the whole battle
    pub fn refresh_round(&mut self) {
        self.counters_left = COUNTERATTACKS_PER_ROUND;
    }
}

/// All creatures in the battle, with a stable insertion order so that every
/// iteration-driven decision stays reproducible.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Roster {
    order: Vec<EntityId>,
    creatures: AHashMap<EntityId, Creature>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, creature: Creature) -> EntityId {
        let id = creature.id;
        self.order.push(id);
        let _ = self.creatures.insert(id, creature);
        id
    }

    pub fn get(&self, id: EntityId) -> Option<&Creature> {
        self.creatures.get(&id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Creature> {
        self.creatures.get_mut(&id)
    }

    /// Ids in insertion order
    pub fn ids(&self) -> &[EntityId] {
        &self.order
    }

    pub fn living_ids(&self) -> Vec<EntityId> {
        self.order
            .iter()
            .filter(|id| self.get(**id).map(|c| c.alive()).unwrap_or(false))
            .copied()
            .collect()
    }

    pub fn living_of_side(&self, side: Side) -> usize {
        self.order
            .iter()
            .filter_map(|id| self.get(*id))
            .filter(|c| c.alive() && c.side == side)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::effects::{EffectClass, ValueMode};

    fn block() -> StatBlock {
        StatBlock {
            attack: 6,
            defense: 5,
            min_damage: 2,
            max_damage: 4,
            health: 10,
            speed: 5,
            stack_size: 4,
            shots: 0,
        }
    }

    fn swordsman() -> Creature {
        Creature::new(
            Side::Ally,
            "swordsman",
            "Swordsman",
            CreatureNature::Living,
            MovementKind::Ground,
            AttackKind::Melee,
            block(),
            0,
        )
    }

    fn defense_debuff(value: f32) -> Effect {
        Effect {
            kind: EffectKind::StatModifier {
                stat: StatKind::Defense,
                value,
                mode: ValueMode::Percent,
                class: EffectClass::Debuff,
            },
            stackable: false,
            dispellable: true,
        }
    }

    #[test]
    fn test_effective_without_effects() {
        let c = swordsman();
        assert_eq!(c.effective(StatKind::Defense), 5);
        assert_eq!(c.speed(), 5);
    }

    #[test]
    fn test_modifier_scales_effective_stat() {
        let mut c = swordsman();
        assert!(c.try_attach(defense_debuff(20.0)));
        assert!((c.scaling_for(StatKind::Defense) - 0.8).abs() < 1e-6);
        assert_eq!(c.effective(StatKind::Defense), 4);
    }

    #[test]
    fn test_detach_reverts_modifier() {
        let mut c = swordsman();
        assert!(c.try_attach(defense_debuff(20.0)));
        let removed = c.dispel();
        assert_eq!(removed, 1);
        assert_eq!(c.effective(StatKind::Defense), 5);
        assert_eq!(c.scaling_for(StatKind::Defense), 1.0);
    }

    #[test]
    fn test_dispel_spares_undispellable() {
        let mut c = swordsman();
        assert!(c.try_attach(Effect::marker(EffectKind::UnansweredStrike)));
        assert!(c.try_attach(defense_debuff(20.0)));

        assert_eq!(c.dispel(), 1);
        assert!(c.has_unanswered_strike());
    }

    #[test]
    fn test_stacking_policy_enforced_on_attach() {
        let mut c = swordsman();
        assert!(c.try_attach(defense_debuff(20.0)));
        assert!(!c.try_attach(defense_debuff(10.0)));
        assert_eq!(c.effects().len(), 1);
    }

    #[test]
    fn test_double_attack_arms_animation_flag() {
        let mut c = swordsman();
        assert!(!c.double_strike_armed);
        assert!(c.try_attach(Effect::marker(EffectKind::DoubleAttack {
            attack: AttackKind::Melee,
        })));
        assert!(c.double_strike_armed);
        assert!(c.has_double_attack(AttackKind::Melee));
        assert!(!c.has_double_attack(AttackKind::Ranged));

        let _ = c.detach_where(|e| matches!(e.kind, EffectKind::DoubleAttack { .. }));
        assert!(!c.double_strike_armed);
    }

    #[test]
    fn test_damage_kills_from_the_top() {
        let mut c = swordsman(); // 4 members x 10 hp
        let report = c.apply_damage(25);
        assert_eq!(report.killed, 2);
        assert!(!report.destroyed);
        assert_eq!(c.stack_size, 2);
        assert_eq!(c.top_health, 5);
        assert_eq!(c.total_health(), 15);
    }

    #[test]
    fn test_overkill_destroys_stack() {
        let mut c = swordsman();
        let report = c.apply_damage(1000);
        assert!(report.destroyed);
        assert_eq!(report.killed, 4);
        assert!(!c.alive());
        assert_eq!(c.total_health(), 0);
    }

    #[test]
    fn test_counterattack_refresh() {
        let mut c = swordsman();
        c.counters_left = 0;
        c.shots = 3;
        c.refresh_round();
        assert_eq!(c.counters_left, COUNTERATTACKS_PER_ROUND);
        // Ammunition is battle-scoped, not round-scoped
        assert_eq!(c.shots, 3);
    }

    #[test]
    fn test_roster_living_filters() {
        let mut roster = Roster::new();
        let a = roster.insert(swordsman());
        let mut dead = swordsman();
        dead.side = Side::Enemy;
        let _ = dead.apply_damage(1000);
        let _ = roster.insert(dead);

        assert_eq!(roster.living_ids(), vec![a]);
        assert_eq!(roster.living_of_side(Side::Ally), 1);
        assert_eq!(roster.living_of_side(Side::Enemy), 0);
    }
}
