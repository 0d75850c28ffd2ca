//! Stat kinds and per-level stat blocks

use serde::{Deserialize, Serialize};

/// Every stat an effect can scale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatKind {
    Attack,
    Defense,
    MinDamage,
    MaxDamage,
    Health,
    Speed,
    Morale,
}

impl StatKind {
    pub const ALL: [StatKind; 7] = [
        StatKind::Attack,
        StatKind::Defense,
        StatKind::MinDamage,
        StatKind::MaxDamage,
        StatKind::Health,
        StatKind::Speed,
        StatKind::Morale,
    ];
}

/// Base stats a creature template carries for one level
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatBlock {
    pub attack: i32,
    pub defense: i32,
    pub min_damage: i32,
    pub max_damage: i32,
    pub health: i32,
    pub speed: i32,
    pub stack_size: u32,
    pub shots: u32,
}

impl StatBlock {
    pub fn base(&self, kind: StatKind) -> i32 {
        match kind {
            StatKind::Attack => self.attack,
            StatKind::Defense => self.defense,
            StatKind::MinDamage => self.min_damage,
            StatKind::MaxDamage => self.max_damage,
            StatKind::Health => self.health,
            StatKind::Speed => self.speed,
            StatKind::Morale => 0,
        }
    }
}
