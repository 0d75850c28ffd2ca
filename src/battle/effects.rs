//! Passive and timed battle effects
//!
//! Effects attach to a creature: stat modifiers feed the per-stat aggregate
//! multipliers, marker effects carry no stat change and are queried by the
//! combat resolver. Attach applies, detach reverts — symmetry comes from
//! recomputing aggregates off the surviving effect list.

use serde::{Deserialize, Serialize};

use crate::battle::constants::MIN_STAT_MULTIPLIER;
use crate::battle::creature::AttackKind;
use crate::battle::stats::StatKind;

/// How a stat modifier value is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueMode {
    Percent,
    Flat,
}

/// Effect families; weakening families subtract their percentage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectClass {
    Buff,
    Debuff,
    DamageOverTime,
    Madness,
}

impl EffectClass {
    pub fn weakens(&self) -> bool {
        matches!(
            self,
            EffectClass::Debuff | EffectClass::DamageOverTime | EffectClass::Madness
        )
    }
}

/// Splash geometry for strike effects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StrikeReach {
    Area,
    Piercing,
}

/// Closed set of effect behaviors
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum EffectKind {
    /// Two hits per attack sequence of the matching kind
    DoubleAttack { attack: AttackKind },
    StatModifier {
        stat: StatKind,
        value: f32,
        mode: ValueMode,
        class: EffectClass,
    },
    Strike(StrikeReach),
    UnansweredStrike,
    ExplosiveShot,
}

/// An effect instance as attached to a creature
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Effect {
    pub kind: EffectKind,
    pub stackable: bool,
    pub dispellable: bool,
}

impl Effect {
    pub fn marker(kind: EffectKind) -> Self {
        Self {
            kind,
            stackable: false,
            dispellable: false,
        }
    }

    /// Two stat modifiers are the same kind when they touch the same stat
    /// with the same class; every other variant is one kind per discriminant.
    pub fn same_family(&self, other: &Effect) -> bool {
        match (&self.kind, &other.kind) {
            (
                EffectKind::StatModifier {
                    stat: a, class: ca, ..
                },
                EffectKind::StatModifier {
                    stat: b, class: cb, ..
                },
            ) => a == b && ca == cb,
            (a, b) => std::mem::discriminant(a) == std::mem::discriminant(b),
        }
    }
}

impl EffectKind {
    /// Multiplier this effect contributes for `stat` given its base value,
    /// or None when the effect does not touch that stat.
    pub fn multiplier_for(&self, stat: StatKind, base: i32) -> Option<f32> {
        let EffectKind::StatModifier {
            stat: affected,
            value,
            mode,
            class,
        } = self
        else {
            return None;
        };
        if *affected != stat {
            return None;
        }
        let multiplier = match mode {
            ValueMode::Percent => {
                if class.weakens() {
                    1.0 - value / 100.0
                } else {
                    1.0 + value / 100.0
                }
            }
            ValueMode::Flat => {
                if base != 0 {
                    (base as f32 + value) / base as f32
                } else {
                    1.0 + value / 100.0
                }
            }
        };
        Some(multiplier.max(MIN_STAT_MULTIPLIER))
    }
}

/// Stacking policy: one active effect per family unless flagged stackable.
/// The single enforcement point consulted before every attach.
pub fn can_attach(active: &[Effect], incoming: &Effect) -> bool {
    incoming.stackable || !active.iter().any(|e| e.same_family(incoming))
}
