//! End-to-end tests: a real [`GameSession`] driven by the scheduler and the
//! production systems.

#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::missing_panics_doc,
    clippy::indexing_slicing
)]

use std::sync::Arc;

use chroma_core::config::{ProductionConfig, SchedulerConfig};
use chroma_core::control::LoopControl;
use chroma_core::feedback::NoOpSink;
use chroma_core::production::TickPath;
use chroma_core::publish::SnapshotPublisher;
use chroma_core::scheduler::{LoopEndReason, ModePolicy, Scheduler, SimulationWorld, TickSystem};
use chroma_core::session::GameSession;
use chroma_core::systems::{GeneratorSystem, default_systems};
use chroma_types::{
    Channel, GeneratorId, OwnedLevel, PerformanceMode, PixelKind, SessionSnapshot, UpgradeState,
};
use proptest::prelude::*;
use tokio::sync::Mutex;

fn seeded() -> ProductionConfig {
    ProductionConfig {
        rng_seed: Some(99),
        ..ProductionConfig::default()
    }
}

fn with_generators(levels: &[(GeneratorId, u32)]) -> SessionSnapshot {
    let mut upgrades = UpgradeState::default();
    for &(id, level) in levels {
        upgrades.generators.insert(id, OwnedLevel { level, owned: true });
    }
    SessionSnapshot {
        upgrades,
        ..SessionSnapshot::default()
    }
}

/// Run `steps` iterative cycles of `dt` seconds through the generator system.
fn run_iterative(session: &mut GameSession, steps: u32, dt: f64) {
    let mut system = GeneratorSystem;
    for _ in 0..steps {
        assert_eq!(session.begin_cycle(dt), TickPath::Iterative);
        system.tick(session, dt).unwrap();
    }
}

fn run_catch_up(session: &mut GameSession, dt: f64) {
    assert_eq!(session.begin_cycle(dt), TickPath::CatchUp);
    GeneratorSystem.tick(session, dt).unwrap();
}

// =============================================================================
// Catch-up conservation
// =============================================================================

#[test]
fn catch_up_matches_iterative_within_one_unit() {
    let snapshot = with_generators(&[(GeneratorId::Red, 7), (GeneratorId::Blue, 3)]);
    let mut iterative =
        GameSession::from_snapshot(snapshot.clone(), &seeded(), Box::new(NoOpSink));
    let mut bulk = GameSession::from_snapshot(snapshot, &seeded(), Box::new(NoOpSink));

    run_iterative(&mut iterative, 6000, 0.1);
    run_catch_up(&mut bulk, 600.0);

    for kind in [PixelKind::Red, PixelKind::Green, PixelKind::Blue] {
        let a = iterative.ledgers().pixels.amount(kind);
        let b = bulk.ledgers().pixels.amount(kind);
        assert!(a.abs_diff(b) <= 1, "{kind:?}: iterative {a} vs catch-up {b}");
    }
    assert!(bulk.ledgers().pixels.amount(PixelKind::Red) > 0);
}

#[test]
fn random_generator_total_is_conserved_on_catch_up() {
    let snapshot = with_generators(&[(GeneratorId::Random, 15)]);
    let mut iterative =
        GameSession::from_snapshot(snapshot.clone(), &seeded(), Box::new(NoOpSink));
    let mut bulk = GameSession::from_snapshot(snapshot, &seeded(), Box::new(NoOpSink));

    run_iterative(&mut iterative, 3000, 0.2);
    run_catch_up(&mut bulk, 600.0);

    let a = iterative.ledgers().pixels.total_rgb();
    let b = bulk.ledgers().pixels.total_rgb();
    assert!(a.abs_diff(b) <= 1, "iterative {a} vs catch-up {b}");
}

// =============================================================================
// Scheduler over a real session
// =============================================================================

async fn scheduler_for(session: GameSession, max_cycles: u64) -> Scheduler<GameSession> {
    let policy = ModePolicy::new(SchedulerConfig::default());
    let mode = policy.estimate_mode(session.ledgers().upgrades.state());
    let control = Arc::new(LoopControl::new(mode, policy.interval_ms(mode), max_cycles));
    let scheduler = Scheduler::new(Arc::new(Mutex::new(session)), policy, control);
    for system in default_systems() {
        scheduler.register_boxed(system).await;
    }
    scheduler
}

#[tokio::test(start_paused = true)]
async fn loop_publishes_every_cycle_until_limit() {
    let session = GameSession::from_snapshot(
        with_generators(&[(GeneratorId::Red, 10)]),
        &seeded(),
        Box::new(NoOpSink),
    );
    let scheduler = scheduler_for(session, 10).await;
    let (mut publisher, rx) = SnapshotPublisher::channel();

    let summary = scheduler.run(&mut publisher).await;

    assert_eq!(summary.end_reason, LoopEndReason::MaxCyclesReached);
    assert_eq!(summary.cycles, 10);
    assert_eq!(summary.final_mode, PerformanceMode::Normal);
    let published = rx.borrow().clone().expect("snapshot published");
    assert_eq!(published.cycle, 10);
    assert!(published.snapshot.game_loop.last_tick.is_some());
    // Ten cycles of 100 ms.
    assert!((published.snapshot.game_stats.playtime_seconds - 1.0).abs() < 1e-6);
    assert_eq!(publisher.withheld(), 0);
}

#[tokio::test(start_paused = true)]
async fn offline_time_is_replayed_on_first_cycle() {
    let session = GameSession::from_snapshot(
        with_generators(&[(GeneratorId::Red, 10)]),
        &seeded(),
        Box::new(NoOpSink),
    );
    let scheduler = scheduler_for(session, 1).await;
    scheduler
        .seed_offline(std::time::Duration::from_secs(3600))
        .await;

    let mut publisher = SnapshotPublisher::channel().0;
    let summary = scheduler.run(&mut publisher).await;
    assert_eq!(summary.cycles, 1);

    let world = scheduler.world();
    let session = world.lock().await;
    assert_eq!(session.cycle().path, TickPath::CatchUp);
    assert!(session.ledgers().pixels.amount(PixelKind::Red) > 1000);
}

#[tokio::test(start_paused = true)]
async fn commands_between_cycles_are_applied() {
    let scheduler = scheduler_for(GameSession::new(&seeded(), Box::new(NoOpSink)), 2).await;
    {
        let world = scheduler.world();
        let mut session = world.lock().await;
        for _ in 0..4 {
            session.click(Channel::Red);
        }
    }
    let summary = scheduler.run(&mut SnapshotPublisher::channel().0).await;
    assert_eq!(summary.cycles, 2);
    assert_eq!(
        scheduler.world().lock().await.ledgers().pixels.amount(PixelKind::Red),
        4
    );
}

#[test]
fn maxed_upgrades_estimate_a_mode() {
    let policy = ModePolicy::new(SchedulerConfig::default());
    let snapshot = with_generators(&[
        (GeneratorId::Red, 10),
        (GeneratorId::Green, 10),
        (GeneratorId::Blue, 10),
        (GeneratorId::Random, 15),
    ]);
    let mode = policy.estimate_mode(&snapshot.upgrades);
    assert_eq!(mode, PerformanceMode::Normal);
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #[test]
    fn splitting_time_never_changes_production_by_more_than_one(
        level in 1_u32..=10,
        steps in 1_u32..400,
        dt in 0.05_f64..2.0,
    ) {
        let snapshot = with_generators(&[(GeneratorId::Red, level)]);
        let mut split = GameSession::from_snapshot(snapshot.clone(), &seeded(), Box::new(NoOpSink));
        let mut whole = GameSession::from_snapshot(snapshot, &seeded(), Box::new(NoOpSink));

        let mut system = GeneratorSystem;
        for _ in 0..steps {
            split.begin_cycle(dt);
            system.tick(&mut split, dt).unwrap();
        }
        let total = dt * f64::from(steps);
        whole.begin_cycle(total);
        system.tick(&mut whole, total).unwrap();

        let a = split.ledgers().pixels.amount(PixelKind::Red);
        let b = whole.ledgers().pixels.amount(PixelKind::Red);
        prop_assert!(a.abs_diff(b) <= 1, "split {} vs whole {}", a, b);
    }

    #[test]
    fn failed_conversion_changes_nothing(red in 0_u64..2, green in 0_u64..50, blue in 0_u64..50) {
        let snapshot = SessionSnapshot {
            pixels: chroma_types::PixelState { red, green, blue, ..Default::default() },
            ..SessionSnapshot::default()
        };
        let mut session = GameSession::from_snapshot(snapshot, &seeded(), Box::new(NoOpSink));
        let before = session.snapshot();
        prop_assert!(session.convert_to_white().is_none());
        prop_assert_eq!(session.snapshot(), before);
    }
}
