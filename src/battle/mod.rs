//! Turn-based battle simulation: scheduling, movement, combat, effects

pub mod battlefield;
pub mod catalog;
pub mod combat;
pub mod constants;
pub mod creature;
pub mod effects;
pub mod events;
pub mod movement;
pub mod scheduler;
pub mod stats;

// Re-exports for convenient access
pub use battlefield::Battle;
pub use catalog::{
    CreatureCatalog, CreatureTemplate, EffectCatalog, EffectTemplate, StaticCatalog,
};
pub use combat::{hit_count, roll_damage, strike, AttackPhase, AttackSequence, ImpactOutcome};
pub use constants::morale_chance;
pub use creature::{AttackKind, Creature, CreatureNature, DamageReport, Roster};
pub use effects::{Effect, EffectClass, EffectKind, StrikeReach, ValueMode};
pub use events::{
    BattleEvent, BattleEventLog, BattleEventType, PresentationRequest, PresentationSignal,
};
pub use movement::{PendingMove, PreludeAttack};
pub use scheduler::TurnScheduler;
pub use stats::{StatBlock, StatKind};
