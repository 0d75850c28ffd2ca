//! Read-only definition port: creature and effect templates
//!
//! Templates carry one stat block (or effect instance) per level; the core
//! only ever reads them. `StaticCatalog` is the in-memory implementation,
//! loadable from JSON definition files.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::battle::creature::{AttackKind, Creature, CreatureNature};
use crate::battle::effects::Effect;
use crate::battle::stats::StatBlock;
use crate::core::error::{ArenaError, Result};
use crate::core::types::Side;
use crate::grid::MovementKind;

/// Static definition of one creature type, all levels
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatureTemplate {
    pub id: String,
    pub name: String,
    pub nature: CreatureNature,
    pub movement: MovementKind,
    pub attack: AttackKind,
    pub morale: i32,
    /// Stat blocks indexed by level, starting at level 1
    pub levels: Vec<StatBlock>,
}

impl CreatureTemplate {
    pub fn level(&self, level: u8) -> Option<&StatBlock> {
        if level == 0 {
            return None;
        }
        self.levels.get(usize::from(level) - 1)
    }
}

/// Static definition of one effect (spell), all levels
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectTemplate {
    pub id: String,
    /// Effect instances indexed by level, starting at level 1
    pub levels: Vec<Effect>,
}

impl EffectTemplate {
    pub fn level(&self, level: u8) -> Option<&Effect> {
        if level == 0 {
            return None;
        }
        self.levels.get(usize::from(level) - 1)
    }
}

/// Supplies creature definitions keyed by template id
pub trait CreatureCatalog {
    fn creature(&self, id: &str) -> Option<&CreatureTemplate>;
}

/// Supplies effect definitions keyed by spell id
pub trait EffectCatalog {
    fn effect(&self, id: &str) -> Option<&EffectTemplate>;
}

/// In-memory catalog backed by JSON definition data
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StaticCatalog {
    creatures: AHashMap<String, CreatureTemplate>,
    effects: AHashMap<String, EffectTemplate>,
}

impl StaticCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse definition JSON: an array of creature templates and an array
    /// of effect templates.
    pub fn from_json(creatures_json: &str, effects_json: &str) -> Result<Self> {
        let creatures: Vec<CreatureTemplate> = serde_json::from_str(creatures_json)?;
        let effects: Vec<EffectTemplate> = serde_json::from_str(effects_json)?;
        let mut catalog = Self::new();
        for t in creatures {
            catalog.insert_creature(t);
        }
        for t in effects {
            catalog.insert_effect(t);
        }
        Ok(catalog)
    }

    pub fn insert_creature(&mut self, template: CreatureTemplate) {
        let _ = self.creatures.insert(template.id.clone(), template);
    }

    pub fn insert_effect(&mut self, template: EffectTemplate) {
        let _ = self.effects.insert(template.id.clone(), template);
    }

    /// Instantiate a creature stack from a template at the given level
    pub fn spawn(&self, template_id: &str, level: u8, side: Side) -> Result<Creature> {
        let template = self
            .creature(template_id)
            .ok_or_else(|| ArenaError::UnknownTemplate(template_id.into()))?;
        let block = template.level(level).ok_or_else(|| ArenaError::InvalidLevel {
            template: template_id.into(),
            level,
        })?;
        Ok(Creature::new(
            side,
            template.id.clone(),
            template.name.clone(),
            template.nature,
            template.movement,
            template.attack,
            *block,
            template.morale,
        ))
    }

    /// Resolve an effect definition at the given level
    pub fn effect_at(&self, id: &str, level: u8) -> Result<Effect> {
        let template = self
            .effect(id)
            .ok_or_else(|| ArenaError::UnknownEffect(id.into()))?;
        template
            .level(level)
            .copied()
            .ok_or_else(|| ArenaError::InvalidLevel {
                template: id.into(),
                level,
            })
    }
}

impl CreatureCatalog for StaticCatalog {
    fn creature(&self, id: &str) -> Option<&CreatureTemplate> {
        self.creatures.get(id)
    }
}

impl EffectCatalog for StaticCatalog {
    fn effect(&self, id: &str) -> Option<&EffectTemplate> {
        self.effects.get(id)
    }
}
