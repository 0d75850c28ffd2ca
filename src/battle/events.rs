//! Battle notifications and the presentation protocol
//!
//! The event log is append-only; the driving layer drains it for UI and
//! turn-order display. Presentation requests flow out of the core, the
//! matching completion signals flow back in — those two enums are the whole
//! suspension protocol.

use serde::{Deserialize, Serialize};

use crate::core::types::{EntityId, Round, Side};
use crate::grid::HexCoord;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BattleEventType {
    RoundStarted { round: Round },
    TurnStarted { unit: EntityId },
    /// Negative morale made the unit forfeit its turn
    TurnSkipped { unit: EntityId },
    /// Positive morale granted the unit another turn
    ExtraTurn { unit: EntityId },
    MovementComplete { unit: EntityId },
    CombatComplete { unit: EntityId },
    Impact {
        attacker: EntityId,
        target: EntityId,
        damage: i64,
        killed: u32,
        blocked: bool,
    },
    UnitDestroyed { unit: EntityId },
    BattleEnded { winner: Option<Side> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleEvent {
    pub round: Round,
    pub event_type: BattleEventType,
    pub description: String,
}

/// Append-only log of everything observable that happened
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BattleEventLog {
    pub events: Vec<BattleEvent>,
}

impl BattleEventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, round: Round, event_type: BattleEventType, description: String) {
        self.events.push(BattleEvent {
            round,
            event_type,
            description,
        });
    }
}

/// Requests the core emits toward the presentation layer.
/// All but `PlayAreaImpact` suspend the core until answered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PresentationRequest {
    PlayMoveStep {
        unit: EntityId,
        from: HexCoord,
        to: HexCoord,
    },
    PlayRotate {
        unit: EntityId,
        toward: HexCoord,
    },
    PlayAttack {
        attacker: EntityId,
        target: EntityId,
        hit_count: u32,
    },
    PlayAreaImpact {
        unit: EntityId,
        blocked: bool,
    },
}

/// Completion signals the presentation layer delivers back
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PresentationSignal {
    /// One relocation step finished
    MoveStepDone,
    /// The external mover abandoned the relocation
    MoveAborted,
    /// Orientation finished
    RotateDone,
    /// One strike of the playing attack landed
    HitLanded,
}
