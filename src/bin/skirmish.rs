//! Scripted skirmish demo
//!
//! Two sides fight under a trivial nearest-enemy policy. The binary plays
//! the presentation layer too: every request the core emits is acknowledged
//! immediately, so a whole battle resolves in one pass.

use clap::Parser;
use hexarena::battle::{
    AttackKind, Battle, BattleEventType, CreatureNature, CreatureTemplate, EffectClass, EffectKind,
    EffectTemplate, PresentationRequest, PresentationSignal, StatBlock, StatKind, StaticCatalog,
    StrikeReach, ValueMode,
};
use hexarena::core::types::{EntityId, Side};
use hexarena::grid::{reachable_cells, HexCoord, MovementKind};

/// Run a scripted hex-tactics skirmish
#[derive(Parser, Debug)]
#[command(name = "skirmish")]
#[command(about = "Run a scripted battle between two sides")]
struct Args {
    /// Random seed for reproducible runs
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Stop after this many rounds
    #[arg(long, default_value_t = 30)]
    max_rounds: u32,

    /// Print every battle event, not just the summary
    #[arg(long, default_value_t = false)]
    verbose: bool,
}

fn catalog() -> StaticCatalog {
    let mut catalog = StaticCatalog::new();

    catalog.insert_creature(CreatureTemplate {
        id: "swordsman".into(),
        name: "Swordsman".into(),
        nature: CreatureNature::Living,
        movement: MovementKind::Ground,
        attack: AttackKind::Melee,
        morale: 1,
        levels: vec![StatBlock {
            attack: 6,
            defense: 6,
            min_damage: 2,
            max_damage: 4,
            health: 12,
            speed: 4,
            stack_size: 8,
            shots: 0,
        }],
    });

    catalog.insert_creature(CreatureTemplate {
        id: "marksman".into(),
        name: "Marksman".into(),
        nature: CreatureNature::Living,
        movement: MovementKind::Ground,
        attack: AttackKind::Ranged,
        morale: 0,
        levels: vec![StatBlock {
            attack: 7,
            defense: 3,
            min_damage: 2,
            max_damage: 3,
            health: 8,
            speed: 3,
            stack_size: 6,
            shots: 10,
        }],
    });

    catalog.insert_creature(CreatureTemplate {
        id: "harpy".into(),
        name: "Harpy".into(),
        nature: CreatureNature::Living,
        movement: MovementKind::Flying,
        attack: AttackKind::Melee,
        morale: -1,
        levels: vec![StatBlock {
            attack: 5,
            defense: 4,
            min_damage: 1,
            max_damage: 3,
            health: 10,
            speed: 7,
            stack_size: 6,
            shots: 0,
        }],
    });

    catalog.insert_creature(CreatureTemplate {
        id: "bone_golem".into(),
        name: "Bone Golem".into(),
        nature: CreatureNature::Undead,
        movement: MovementKind::Ground,
        attack: AttackKind::Melee,
        morale: 0,
        levels: vec![StatBlock {
            attack: 8,
            defense: 9,
            min_damage: 3,
            max_damage: 5,
            health: 30,
            speed: 2,
            stack_size: 2,
            shots: 0,
        }],
    });

    catalog.insert_effect(EffectTemplate {
        id: "double_shot".into(),
        levels: vec![hexarena::battle::Effect::marker(EffectKind::DoubleAttack {
            attack: AttackKind::Ranged,
        })],
    });
    catalog.insert_effect(EffectTemplate {
        id: "sweeping_blow".into(),
        levels: vec![hexarena::battle::Effect::marker(EffectKind::Strike(
            StrikeReach::Area,
        ))],
    });
    catalog.insert_effect(EffectTemplate {
        id: "stone_skin".into(),
        levels: vec![hexarena::battle::Effect {
            kind: EffectKind::StatModifier {
                stat: StatKind::Defense,
                value: 25.0,
                mode: ValueMode::Percent,
                class: EffectClass::Buff,
            },
            stackable: false,
            dispellable: true,
        }],
    });

    catalog
}

/// Acknowledge every outstanding request the way a renderer would
fn play_requests(battle: &mut Battle) {
    loop {
        let requests = battle.drain_requests();
        if requests.is_empty() {
            return;
        }
        for request in requests {
            match request {
                PresentationRequest::PlayMoveStep { .. } => {
                    battle.deliver(PresentationSignal::MoveStepDone)
                }
                PresentationRequest::PlayRotate { .. } => {
                    battle.deliver(PresentationSignal::RotateDone)
                }
                PresentationRequest::PlayAttack { hit_count, .. } => {
                    for _ in 0..hit_count {
                        battle.deliver(PresentationSignal::HitLanded);
                    }
                }
                PresentationRequest::PlayAreaImpact { .. } => {}
            }
        }
    }
}

fn nearest_enemy(battle: &Battle, actor: EntityId) -> Option<EntityId> {
    let me = battle.roster.get(actor)?;
    battle
        .roster
        .ids()
        .iter()
        .filter_map(|id| battle.roster.get(*id))
        .filter(|c| c.alive() && c.side != me.side)
        .min_by_key(|c| (me.position.distance(&c.position), c.position.row, c.position.col))
        .map(|c| c.id)
}

/// Reachable walkable cell that closes the most distance to the target
fn step_toward(battle: &Battle, actor: EntityId, target: HexCoord) -> Option<HexCoord> {
    let me = battle.roster.get(actor)?;
    let mut cells: Vec<HexCoord> =
        reachable_cells(&battle.grid, me.position, me.speed(), me.movement)
            .into_iter()
            .filter(|c| battle.grid.is_walkable(*c))
            .collect();
    cells.sort_by_key(|c| (c.distance(&target), c.row, c.col));
    let best = cells.into_iter().next()?;
    (best.distance(&target) < me.position.distance(&target)).then_some(best)
}

fn act(battle: &mut Battle, actor: EntityId) {
    let Some(enemy) = nearest_enemy(battle, actor) else {
        battle.request_wait(actor);
        return;
    };
    let me = battle.roster.get(actor).expect("actor exists");
    let enemy_pos = battle.roster.get(enemy).expect("enemy exists").position;

    match me.attack_kind {
        AttackKind::Ranged if me.shots > 0 => {
            battle.request_attack(actor, enemy, AttackKind::Ranged)
        }
        _ if me.position.is_adjacent(&enemy_pos) => {
            battle.request_attack(actor, enemy, AttackKind::Melee)
        }
        _ => {
            // Try to close in; the core handles the prelude when the leap
            // lands next to the target.
            battle.request_attack(actor, enemy, AttackKind::Melee);
            if !battle.suspended() && battle.current_actor() == Some(actor) {
                match step_toward(battle, actor, enemy_pos) {
                    Some(cell) => battle.request_move(actor, cell),
                    None => battle.request_defend(actor),
                }
            }
        }
    }

    // Anything the request started gets played out immediately
    play_requests(battle);

    // A fully illegal request must not stall the battle
    if !battle.is_over() && battle.current_actor() == Some(actor) && !battle.suspended() {
        battle.request_wait(actor);
        play_requests(battle);
    }
}

fn main() {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(
                if args.verbose {
                    tracing::Level::DEBUG.into()
                } else {
                    tracing::Level::INFO.into()
                },
            ),
        )
        .init();

    println!("=== HEXARENA SKIRMISH (seed {}) ===", args.seed);
    println!();

    let catalog = catalog();
    let mut battle = Battle::new(9, 11, args.seed);

    // Ally line on the west edge
    let mut marksman = catalog.spawn("marksman", 1, Side::Ally).expect("template");
    assert!(marksman.try_attach(catalog.effect_at("double_shot", 1).expect("effect")));
    let _ = battle.spawn(marksman, HexCoord::new(2, 0)).expect("spawn");

    let mut champion = catalog.spawn("swordsman", 1, Side::Ally).expect("template");
    assert!(champion.try_attach(catalog.effect_at("stone_skin", 1).expect("effect")));
    let _ = battle.spawn(champion, HexCoord::new(4, 0)).expect("spawn");

    let _ = battle
        .spawn(catalog.spawn("harpy", 1, Side::Ally).expect("template"), HexCoord::new(6, 0))
        .expect("spawn");

    // Enemy line on the east edge
    let mut reaver = catalog.spawn("swordsman", 1, Side::Enemy).expect("template");
    reaver.name = "Reaver".into();
    assert!(reaver.try_attach(catalog.effect_at("sweeping_blow", 1).expect("effect")));
    let _ = battle.spawn(reaver, HexCoord::new(3, 10)).expect("spawn");

    let _ = battle
        .spawn(
            catalog.spawn("bone_golem", 1, Side::Enemy).expect("template"),
            HexCoord::new(5, 10),
        )
        .expect("spawn");

    // A broken wall splits the field
    for row in [3, 4, 5] {
        let _ = battle.place_obstacle(HexCoord::new(row, 5)).expect("obstacle");
    }

    let _ = battle.start();

    let mut guard = 0u32;
    while !battle.is_over() && battle.scheduler.round() <= args.max_rounds {
        let Some(actor) = battle.current_actor() else {
            break;
        };
        act(&mut battle, actor);

        guard += 1;
        if guard > 10_000 {
            tracing::warn!("battle failed to converge, giving up");
            break;
        }
    }

    println!("[Battle log]");
    for event in &battle.log.events {
        let interesting = matches!(
            event.event_type,
            BattleEventType::RoundStarted { .. }
                | BattleEventType::Impact { .. }
                | BattleEventType::UnitDestroyed { .. }
                | BattleEventType::TurnSkipped { .. }
                | BattleEventType::ExtraTurn { .. }
                | BattleEventType::BattleEnded { .. }
        );
        if args.verbose || interesting {
            println!("  r{:<2} {}", event.round, event.description);
        }
    }

    println!();
    match battle.winner() {
        Some(side) => println!("Winner: {:?} side after {} rounds", side, battle.scheduler.round()),
        None => println!("No winner after {} rounds", battle.scheduler.round()),
    }
}
