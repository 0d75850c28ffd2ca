//! Battle orchestration: actions in, presentation requests out
//!
//! `Battle` owns every piece of simulation state and is the only mutation
//! path. Action requests from the input layer either start a suspended
//! sequence (movement steps, attack phases) or degrade to a no-op; the
//! presentation layer resumes suspended sequences by delivering completion
//! signals. Only the current actor's requests are honored.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::VecDeque;

use crate::battle::combat::{
    approach_cell, hit_count, pierce_target, splash_targets, strike, AttackPhase, AttackSequence,
    StrikeStats,
};
use crate::battle::creature::{AttackKind, Creature, Roster};
use crate::battle::effects::StrikeReach;
use crate::battle::events::{
    BattleEventLog, BattleEventType, PresentationRequest, PresentationSignal,
};
use crate::battle::movement::{plan_move, validate_move, PendingMove, PreludeAttack};
use crate::battle::scheduler::TurnScheduler;
use crate::core::error::{ArenaError, Result};
use crate::core::types::{EntityId, Side};
use crate::grid::{HexCoord, HexGrid, MovementKind, OccupantKind};

pub struct Battle {
    pub grid: HexGrid,
    pub roster: Roster,
    pub scheduler: TurnScheduler,
    pub log: BattleEventLog,
    requests: VecDeque<PresentationRequest>,
    pending_move: Option<PendingMove>,
    pending_attack: Option<AttackSequence>,
    rng: ChaCha8Rng,
    started: bool,
    over: bool,
}

impl Battle {
    pub fn new(rows: i32, cols: i32, seed: u64) -> Self {
        Self {
            grid: HexGrid::new(rows, cols),
            roster: Roster::new(),
            scheduler: TurnScheduler::new(),
            log: BattleEventLog::new(),
            requests: VecDeque::new(),
            pending_move: None,
            pending_attack: None,
            rng: ChaCha8Rng::seed_from_u64(seed),
            started: false,
            over: false,
        }
    }

    // ---- setup ----

    pub fn spawn(&mut self, mut creature: Creature, at: HexCoord) -> Result<EntityId> {
        if !self.grid.in_bounds(at) {
            return Err(ArenaError::OutOfBounds(at));
        }
        if !self.grid.is_walkable(at) {
            return Err(ArenaError::SpawnBlocked(at));
        }
        creature.position = at;
        let id = creature.id;
        self.grid.add_occupant(at, id, OccupantKind::Creature);
        let _ = self.roster.insert(creature);
        Ok(id)
    }

    pub fn place_obstacle(&mut self, at: HexCoord) -> Result<EntityId> {
        self.place_blocker(at, OccupantKind::Obstacle)
    }

    pub fn place_force_field(&mut self, at: HexCoord) -> Result<EntityId> {
        self.place_blocker(at, OccupantKind::ForceField)
    }

    fn place_blocker(&mut self, at: HexCoord, kind: OccupantKind) -> Result<EntityId> {
        if !self.grid.in_bounds(at) {
            return Err(ArenaError::OutOfBounds(at));
        }
        if !self.grid.is_walkable(at) {
            return Err(ArenaError::SpawnBlocked(at));
        }
        let id = EntityId::new();
        self.grid.add_occupant(at, id, kind);
        Ok(id)
    }

    /// Open the battle and select the first actor
    pub fn start(&mut self) -> Option<EntityId> {
        if self.started {
            return self.scheduler.current();
        }
        self.started = true;
        tracing::info!(units = self.roster.ids().len(), "battle started");
        self.scheduler
            .advance(&mut self.roster, &mut self.rng, &mut self.log)
    }

    // ---- queries ----

    pub fn current_actor(&self) -> Option<EntityId> {
        self.scheduler.current()
    }

    pub fn is_over(&self) -> bool {
        self.over
    }

    /// The side that still has living units, once the other does not
    pub fn winner(&self) -> Option<Side> {
        match (
            self.roster.living_of_side(Side::Ally),
            self.roster.living_of_side(Side::Enemy),
        ) {
            (0, n) if n > 0 => Some(Side::Enemy),
            (n, 0) if n > 0 => Some(Side::Ally),
            _ => None,
        }
    }

    /// True while a movement or attack sequence awaits presentation signals
    pub fn suspended(&self) -> bool {
        self.pending_move.is_some() || self.pending_attack.is_some()
    }

    pub fn drain_requests(&mut self) -> Vec<PresentationRequest> {
        self.requests.drain(..).collect()
    }

    // ---- input port ----

    /// Relocate the current actor. Illegal requests are dropped.
    pub fn request_move(&mut self, unit: EntityId, target: HexCoord) {
        if !self.accepting(unit) {
            return;
        }
        let Some(creature) = self.roster.get(unit) else {
            return;
        };
        if !validate_move(&self.grid, creature, target) {
            tracing::debug!(unit = ?unit, ?target, "move rejected");
            return;
        }

        if creature.movement == MovementKind::Teleport {
            // Instantaneous cell swap, no steps to await
            self.commit_relocation(unit, target);
            self.movement_finished(unit, None);
            return;
        }

        let Some(path) = plan_move(&self.grid, creature, target) else {
            return;
        };
        if path.is_empty() {
            return;
        }
        self.begin_relocation(unit, path, None);
    }

    /// Attack a target with the current actor. Illegal requests are dropped.
    pub fn request_attack(&mut self, unit: EntityId, target: EntityId, attack: AttackKind) {
        if !self.accepting(unit) || unit == target {
            return;
        }
        let Some(attacker) = self.roster.get(unit) else {
            return;
        };
        let Some(victim) = self.roster.get(target) else {
            return;
        };
        if !attacker.alive() || !victim.alive() {
            return;
        }
        if attack == AttackKind::Ranged && attacker.shots == 0 {
            tracing::debug!(unit = ?unit, "ranged attack without ammunition dropped");
            return;
        }

        if attack == AttackKind::Melee && !attacker.position.is_adjacent(&victim.position) {
            // Walk into striking range first; the attack completion, not the
            // movement completion, will end the turn.
            let Some(stand) = approach_cell(&self.grid, attacker, victim.position) else {
                tracing::debug!(unit = ?unit, "no approach cell toward target");
                return;
            };
            let Some(path) = plan_move(&self.grid, attacker, stand) else {
                return;
            };
            let prelude = Some(PreludeAttack { target, attack });
            if path.is_empty() {
                // Already standing on the approach cell
                self.begin_attack(unit, target, attack);
                return;
            }
            self.begin_relocation(unit, path, prelude);
            return;
        }

        self.begin_attack(unit, target, attack);
    }

    /// Hold ground and brace: halves incoming damage until the next turn
    pub fn request_defend(&mut self, unit: EntityId) {
        if !self.accepting(unit) {
            return;
        }
        if let Some(creature) = self.roster.get_mut(unit) {
            creature.defending = true;
        }
        self.resolve_action(unit);
    }

    /// Pass the turn without acting
    pub fn request_wait(&mut self, unit: EntityId) {
        if !self.accepting(unit) {
            return;
        }
        self.resolve_action(unit);
    }

    /// Only the current actor may act, and only while nothing is suspended
    fn accepting(&self, unit: EntityId) -> bool {
        if !self.started || self.over || self.suspended() {
            return false;
        }
        if self.scheduler.current() != Some(unit) {
            tracing::debug!(unit = ?unit, "request from non-current unit dropped");
            return false;
        }
        true
    }

    // ---- presentation port ----

    /// Resume whatever sequence awaits this signal; stale signals are dropped
    pub fn deliver(&mut self, signal: PresentationSignal) {
        match signal {
            PresentationSignal::MoveStepDone => self.on_step_done(),
            PresentationSignal::MoveAborted => self.on_move_aborted(),
            PresentationSignal::RotateDone => self.on_rotate_done(),
            PresentationSignal::HitLanded => self.on_hit_landed(),
        }
    }

    // ---- movement machinery ----

    fn begin_relocation(
        &mut self,
        unit: EntityId,
        path: Vec<HexCoord>,
        prelude: Option<PreludeAttack>,
    ) {
        let origin = self
            .roster
            .get(unit)
            .map(|c| c.position)
            .unwrap_or_default();
        let pending = PendingMove {
            unit,
            origin,
            path,
            step: 0,
            prelude,
        };
        if let Some((from, to)) = pending.current_step() {
            self.requests
                .push_back(PresentationRequest::PlayMoveStep { unit, from, to });
        }
        self.pending_move = Some(pending);
    }

    fn on_step_done(&mut self) {
        let Some(mut pending) = self.pending_move.take() else {
            return;
        };
        pending.step += 1;

        if let Some((from, to)) = pending.current_step() {
            self.requests.push_back(PresentationRequest::PlayMoveStep {
                unit: pending.unit,
                from,
                to,
            });
            self.pending_move = Some(pending);
            return;
        }

        // Final step done: occupancy transfers only now
        let unit = pending.unit;
        let destination = pending.destination();
        self.commit_relocation(unit, destination);
        self.movement_finished(unit, pending.prelude);
    }

    fn on_move_aborted(&mut self) {
        // Leave occupancy untouched and emit nothing; the scheduler stays
        // parked awaiting an action for the still-current unit.
        if let Some(pending) = self.pending_move.take() {
            tracing::debug!(unit = ?pending.unit, "relocation aborted externally");
        }
    }

    fn commit_relocation(&mut self, unit: EntityId, destination: HexCoord) {
        self.grid.move_occupant(unit, destination);
        if let Some(creature) = self.roster.get_mut(unit) {
            creature.position = destination;
        }
    }

    fn movement_finished(&mut self, unit: EntityId, prelude: Option<PreludeAttack>) {
        let name = self
            .roster
            .get(unit)
            .map(|c| c.name.clone())
            .unwrap_or_default();
        self.log.push(
            self.scheduler.round(),
            BattleEventType::MovementComplete { unit },
            format!("{} finishes moving", name),
        );

        match prelude {
            // The queued attack consumes this completion
            Some(p) => self.begin_attack(unit, p.target, p.attack),
            None => self.resolve_action(unit),
        }
    }

    // ---- combat machinery ----

    fn begin_attack(&mut self, attacker: EntityId, target: EntityId, attack: AttackKind) {
        let Some(toward) = self.roster.get(target).map(|c| c.position) else {
            return;
        };
        if attack == AttackKind::Ranged {
            if let Some(c) = self.roster.get_mut(attacker) {
                c.shots = c.shots.saturating_sub(1);
            }
        }
        self.requests.push_back(PresentationRequest::PlayRotate {
            unit: attacker,
            toward,
        });
        self.pending_attack = Some(AttackSequence {
            attacker,
            target,
            attack,
            phase: AttackPhase::Orienting,
        });
    }

    fn on_rotate_done(&mut self) {
        let Some(mut sequence) = self.pending_attack.take() else {
            return;
        };
        if sequence.phase != AttackPhase::Orienting {
            self.pending_attack = Some(sequence);
            return;
        }

        let hits = self
            .roster
            .get(sequence.attacker)
            .map(|c| hit_count(c, sequence.attack))
            .unwrap_or(1);
        self.requests.push_back(PresentationRequest::PlayAttack {
            attacker: sequence.attacker,
            target: sequence.target,
            hit_count: hits,
        });
        sequence.phase = AttackPhase::Striking {
            hits_remaining: hits,
        };
        self.pending_attack = Some(sequence);
    }

    fn on_hit_landed(&mut self) {
        let Some(mut sequence) = self.pending_attack.take() else {
            return;
        };

        match sequence.phase {
            AttackPhase::Orienting => {
                // Hit before rotation completed: stale, drop it
                self.pending_attack = Some(sequence);
            }
            AttackPhase::Striking { hits_remaining } => {
                self.apply_strike(sequence.attacker, sequence.target);
                let left = hits_remaining.saturating_sub(1);
                if left > 0 {
                    sequence.phase = AttackPhase::Striking {
                        hits_remaining: left,
                    };
                    self.pending_attack = Some(sequence);
                } else {
                    self.finish_primary_exchange(sequence);
                }
            }
            AttackPhase::CounterStriking { .. } => {
                self.apply_strike(sequence.target, sequence.attacker);
                self.finish_attack(sequence.attacker);
            }
        }
    }

    /// One strike from `from` onto `to`, with event logging and removal of
    /// destroyed stacks from the grid.
    fn apply_strike(&mut self, from: EntityId, to: EntityId) {
        let Some(stats) = self.roster.get(from).filter(|c| c.alive()).map(StrikeStats::of)
        else {
            return;
        };
        let Some(target) = self.roster.get_mut(to).filter(|c| c.alive()) else {
            return;
        };

        let outcome = strike(&stats, target, &mut self.rng);
        let target_name = target.name.clone();
        let position = target.position;
        tracing::debug!(
            attacker = ?from,
            target = ?to,
            damage = outcome.damage,
            killed = outcome.killed,
            blocked = outcome.blocked,
            "strike resolved"
        );
        self.log.push(
            self.scheduler.round(),
            BattleEventType::Impact {
                attacker: from,
                target: to,
                damage: outcome.damage,
                killed: outcome.killed,
                blocked: outcome.blocked,
            },
            if outcome.blocked {
                format!("{} blocks, taking {} damage", target_name, outcome.damage)
            } else {
                format!("{} takes {} damage", target_name, outcome.damage)
            },
        );

        if outcome.destroyed {
            self.grid.remove_occupant(position, to);
            self.log.push(
                self.scheduler.round(),
                BattleEventType::UnitDestroyed { unit: to },
                format!("{} is destroyed", target_name),
            );
        }
    }

    /// Splash, then counterattack, then wrap up
    fn finish_primary_exchange(&mut self, sequence: AttackSequence) {
        let attacker_pos = self.roster.get(sequence.attacker).map(|c| c.position);
        let attacker_side = self.roster.get(sequence.attacker).map(|c| c.side);
        let target_pos = self.roster.get(sequence.target).map(|c| c.position);

        if let (Some(pos), Some(side)) = (attacker_pos, attacker_side) {
            // Sweeping strike: everyone hostile around the attacker
            if self
                .roster
                .get(sequence.attacker)
                .map(|c| c.has_strike(StrikeReach::Area))
                .unwrap_or(false)
            {
                self.splash(pos, side, sequence.attacker, sequence.target);
            }

            // Piercing strike: carries through to the cell behind the target
            if sequence.attack == AttackKind::Melee
                && self
                    .roster
                    .get(sequence.attacker)
                    .map(|c| c.has_strike(StrikeReach::Piercing))
                    .unwrap_or(false)
            {
                if let Some(target_pos) = target_pos {
                    if let Some(victim) =
                        pierce_target(&self.grid, &self.roster, pos, target_pos, side)
                    {
                        let blocked = self
                            .roster
                            .get(victim)
                            .map(|c| c.defending)
                            .unwrap_or(false);
                        self.apply_strike(sequence.attacker, victim);
                        self.requests
                            .push_back(PresentationRequest::PlayAreaImpact {
                                unit: victim,
                                blocked,
                            });
                    }
                }
            }

            // Explosive projectile: everyone hostile around the impact cell
            if sequence.attack == AttackKind::Ranged
                && self
                    .roster
                    .get(sequence.attacker)
                    .map(|c| c.has_explosive_shot())
                    .unwrap_or(false)
            {
                if let Some(pos) = target_pos {
                    self.splash(pos, side, sequence.attacker, sequence.target);
                }
            }
        }

        // Counterattack: melee only, survivor only, one allowance per round,
        // suppressed entirely by an unanswered-strike attacker.
        let suppress = self
            .roster
            .get(sequence.attacker)
            .map(|c| c.has_unanswered_strike())
            .unwrap_or(true);
        let attacker_alive = self
            .roster
            .get(sequence.attacker)
            .map(|c| c.alive())
            .unwrap_or(false);
        let counters = sequence.attack == AttackKind::Melee
            && attacker_alive
            && !suppress
            && self
                .roster
                .get(sequence.target)
                .map(|c| c.alive() && c.counters_left > 0)
                .unwrap_or(false);

        if counters {
            if let Some(target) = self.roster.get_mut(sequence.target) {
                target.counters_left -= 1;
            }
            self.requests.push_back(PresentationRequest::PlayAttack {
                attacker: sequence.target,
                target: sequence.attacker,
                hit_count: 1,
            });
            self.pending_attack = Some(AttackSequence {
                phase: AttackPhase::CounterStriking { hits_remaining: 1 },
                ..sequence
            });
            return;
        }

        self.finish_attack(sequence.attacker);
    }

    fn splash(&mut self, around: HexCoord, side: Side, attacker: EntityId, primary: EntityId) {
        for victim in splash_targets(&self.grid, &self.roster, around, side, primary) {
            let blocked = self
                .roster
                .get(victim)
                .map(|c| c.defending)
                .unwrap_or(false);
            self.apply_strike(attacker, victim);
            self.requests
                .push_back(PresentationRequest::PlayAreaImpact {
                    unit: victim,
                    blocked,
                });
        }
    }

    fn finish_attack(&mut self, attacker: EntityId) {
        self.pending_attack = None;
        let name = self
            .roster
            .get(attacker)
            .map(|c| c.name.clone())
            .unwrap_or_default();
        self.log.push(
            self.scheduler.round(),
            BattleEventType::CombatComplete { unit: attacker },
            format!("{} finishes the attack", name),
        );
        self.resolve_action(attacker);
    }

    // ---- turn resolution ----

    fn resolve_action(&mut self, unit: EntityId) {
        self.scheduler
            .action_resolved(unit, false, &self.roster, &mut self.rng, &mut self.log);

        if let Some(winner) = self.winner() {
            self.over = true;
            self.log.push(
                self.scheduler.round(),
                BattleEventType::BattleEnded {
                    winner: Some(winner),
                },
                format!("Battle ends, {:?} side wins", winner),
            );
            return;
        }
        if self.roster.living_ids().is_empty() {
            self.over = true;
            self.log.push(
                self.scheduler.round(),
                BattleEventType::BattleEnded { winner: None },
                "Battle ends with mutual destruction".into(),
            );
            return;
        }

        let _ = self
            .scheduler
            .advance(&mut self.roster, &mut self.rng, &mut self.log);
    }
}
