//! Turn scheduling: round building, morale checks, actor selection
//!
//! One round gives every living unit a turn in descending speed order; speed
//! ties fall to an unbiased shuffle so a fixed seed replays the same battle.
//! The current actor is held apart from the queue and is never also in it.

use rand::seq::SliceRandom;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::battle::constants::morale_chance;
use crate::battle::creature::{CreatureNature, Roster};
use crate::battle::events::{BattleEventLog, BattleEventType};
use crate::core::types::{EntityId, Round};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TurnScheduler {
    round: Round,
    queue: VecDeque<EntityId>,
    current: Option<EntityId>,
}

impl TurnScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn round(&self) -> Round {
        self.round
    }

    /// The unit whose turn is active, if any
    pub fn current(&self) -> Option<EntityId> {
        self.current
    }

    /// Units still queued for this round
    pub fn queued(&self) -> impl Iterator<Item = &EntityId> {
        self.queue.iter()
    }

    /// Advance until some unit holds the turn, rebuilding rounds as the
    /// queue drains. Returns None when no living units remain.
    pub fn advance(
        &mut self,
        roster: &mut Roster,
        rng: &mut ChaCha8Rng,
        log: &mut BattleEventLog,
    ) -> Option<EntityId> {
        debug_assert!(self.current.is_none());

        loop {
            if self.queue.is_empty() {
                if roster.living_ids().is_empty() {
                    return None;
                }
                self.build_round(roster, rng, log);
            }

            let Some(id) = self.queue.pop_front() else {
                continue;
            };
            let Some(creature) = roster.get_mut(id) else {
                continue;
            };
            if !creature.alive() {
                continue;
            }
            creature.defending = false;

            // Cowardice check: a Living unit with negative morale may
            // forfeit the turn before it starts.
            let morale = creature.effective_morale();
            if creature.nature == CreatureNature::Living && morale < 0 {
                let chance = morale_chance(morale.unsigned_abs());
                if rng.gen::<f32>() < chance {
                    tracing::debug!(unit = ?id, morale, "turn forfeited to low morale");
                    log.push(
                        self.round,
                        BattleEventType::TurnSkipped { unit: id },
                        format!("{} freezes up and skips the turn", creature.name),
                    );
                    continue;
                }
            }

            self.current = Some(id);
            log.push(
                self.round,
                BattleEventType::TurnStarted { unit: id },
                format!("{} takes the turn", creature.name),
            );
            return Some(id);
        }
    }

    /// Consume an action-completion signal for `unit`.
    ///
    /// Signals for non-current units are stale and dropped; prelude
    /// movement completions are ignored because the attack that follows
    /// carries the turn. Clears the current actor; call [`advance`] next.
    pub fn action_resolved(
        &mut self,
        unit: EntityId,
        prelude: bool,
        roster: &Roster,
        rng: &mut ChaCha8Rng,
        log: &mut BattleEventLog,
    ) {
        if prelude {
            return;
        }
        if self.current != Some(unit) {
            tracing::debug!(unit = ?unit, "dropped stale action completion");
            return;
        }

        // Bravery check: a Living unit with positive morale may act again
        // immediately, ahead of the rest of the queue.
        let extra = roster
            .get(unit)
            .filter(|c| c.alive() && c.nature == CreatureNature::Living)
            .map(|c| {
                let morale = c.effective_morale();
                morale > 0 && rng.gen::<f32>() < morale_chance(morale.unsigned_abs())
            })
            .unwrap_or(false);

        self.current = None;
        if extra {
            self.queue.push_front(unit);
            let name = roster.get(unit).map(|c| c.name.clone()).unwrap_or_default();
            log.push(
                self.round,
                BattleEventType::ExtraTurn { unit },
                format!("{} surges forward for another turn", name),
            );
        }
    }

    fn build_round(&mut self, roster: &mut Roster, rng: &mut ChaCha8Rng, log: &mut BattleEventLog) {
        self.round += 1;

        let mut ids = roster.living_ids();
        // Shuffle first, then a stable sort: equal speeds keep the
        // shuffled order, which is an unbiased tie-break.
        ids.shuffle(rng);
        ids.sort_by(|a, b| {
            let sa = roster.get(*a).map(|c| c.speed()).unwrap_or(0);
            let sb = roster.get(*b).map(|c| c.speed()).unwrap_or(0);
            sb.cmp(&sa)
        });

        for id in &ids {
            if let Some(c) = roster.get_mut(*id) {
                c.refresh_round();
            }
        }

        self.queue = ids.into();
        log.push(
            self.round,
            BattleEventType::RoundStarted { round: self.round },
            format!("Round {} begins", self.round),
        );
        tracing::debug!(round = self.round, units = self.queue.len(), "round built");
    }
}
