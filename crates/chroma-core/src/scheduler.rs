//! Adaptive game loop.
//!
//! The [`Scheduler`] owns the world behind one mutex and drives every
//! registered [`TickSystem`] from a single timer. After each cycle it
//! re-reads the world's production and picks a [`PerformanceMode`]; when
//! the mode's interval differs from the running one, the timer is dropped
//! and a new one is created at the new period.
//!
//! # Cycle
//!
//! 1. `dt` from the monotonic clock (plus any seeded offline time)
//! 2. [`SimulationWorld::begin_cycle`] picks the tick path
//! 3. every system ticks in registration order; faults are logged, not fatal
//! 4. production is re-read and the mode re-evaluated
//! 5. the [`CycleObserver`] sees the report and the world
//!
//! # Modes
//!
//! ```text
//! production <  500K   normal     100 ms
//! production >= 500K   medium     200 ms
//! production >= 1M     high       500 ms
//! production >= 5M     extreme   1000 ms
//! fps < floor for 3 s  emergency 2000 ms  (until the frame rate recovers)
//! ```

use std::sync::Arc;
use std::time::Duration;

use chroma_ledger::LedgerError;
use chroma_types::{PerformanceMode, SystemId, UpgradeState};
use tokio::sync::Mutex;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::config::SchedulerConfig;
use crate::control::LoopControl;
use crate::formulas;
use crate::monitor::PerformanceMonitor;
use crate::production::TickPath;

// ---------------------------------------------------------------------------
// Seams
// ---------------------------------------------------------------------------

/// A failure inside one system's tick. The cycle continues without it.
#[derive(Debug, thiserror::Error)]
pub enum SystemFault {
    /// A ledger rejected a credit.
    #[error("ledger rejected update: {source}")]
    Ledger {
        /// The underlying ledger error.
        #[from]
        source: LedgerError,
    },

    /// Any other failure.
    #[error("{message}")]
    Failed {
        /// What went wrong.
        message: String,
    },
}

/// The state a scheduler drives.
pub trait SimulationWorld: Send + 'static {
    /// Called once per cycle before any system ticks.
    fn begin_cycle(&mut self, dt: f64) -> TickPath;

    /// Aggregate production in units per second, read after the systems
    /// ran. Drives the performance mode.
    fn theoretical_production(&self) -> f64;
}

/// One unit of per-cycle work.
pub trait TickSystem<W>: Send {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    /// Advance by `dt` seconds.
    fn tick(&mut self, world: &mut W, dt: f64) -> Result<(), SystemFault>;
}

/// Callback invoked after each cycle while the world is still locked.
pub trait CycleObserver<W>: Send {
    /// Called after every cycle.
    fn on_cycle(&mut self, report: &CycleReport, world: &W);
}

/// A no-op observer for tests and headless runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpObserver;

impl<W> CycleObserver<W> for NoOpObserver {
    fn on_cycle(&mut self, _report: &CycleReport, _world: &W) {}
}

// ---------------------------------------------------------------------------
// Mode policy
// ---------------------------------------------------------------------------

/// Maps production and frame rate to a mode, and modes to intervals.
#[derive(Debug, Clone, PartialEq)]
pub struct ModePolicy {
    config: SchedulerConfig,
}

impl ModePolicy {
    /// Build from scheduler configuration.
    pub const fn new(config: SchedulerConfig) -> Self {
        Self { config }
    }

    /// Configuration in use.
    pub const fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Mode for a production figure, ignoring frame rate.
    pub fn mode_for_production(&self, production: f64) -> PerformanceMode {
        if production >= self.config.extreme_threshold {
            PerformanceMode::Extreme
        } else if production >= self.config.high_threshold {
            PerformanceMode::High
        } else if production >= self.config.medium_threshold {
            PerformanceMode::Medium
        } else {
            PerformanceMode::Normal
        }
    }

    /// Tick interval of a mode.
    pub const fn interval(&self, mode: PerformanceMode) -> Duration {
        Duration::from_millis(self.interval_ms(mode))
    }

    /// Tick interval of a mode in milliseconds.
    pub const fn interval_ms(&self, mode: PerformanceMode) -> u64 {
        self.config.tick_intervals.get(mode)
    }

    /// Minimum gap between UI refreshes in a mode.
    pub const fn ui_throttle(&self, mode: PerformanceMode) -> Duration {
        Duration::from_millis(self.config.ui_throttle.get(mode))
    }

    /// Whether UI refreshes should be throttled. Normal mode throttles too
    /// once production passes the UI threshold.
    pub fn ui_throttled(&self, mode: PerformanceMode, production: f64) -> bool {
        mode != PerformanceMode::Normal || production >= self.config.ui_throttle_threshold
    }

    /// Pre-flight mode from a saved upgrade set, before the first cycle.
    pub fn estimate_mode(&self, upgrades: &UpgradeState) -> PerformanceMode {
        self.mode_for_production(formulas::theoretical_production(upgrades))
    }
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// A system fault recorded during a cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaultRecord {
    /// Handle of the failing system.
    pub system: SystemId,
    /// Its name.
    pub name: &'static str,
    /// The fault, rendered.
    pub message: String,
}

/// Outcome of one cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    /// Cycle number, starting at 1.
    pub cycle: u64,
    /// Seconds integrated this cycle.
    pub dt: f64,
    /// Integration path taken.
    pub path: TickPath,
    /// Production read after the systems ran.
    pub production: f64,
    /// Mode before the cycle.
    pub previous_mode: PerformanceMode,
    /// Mode after the cycle.
    pub mode: PerformanceMode,
    /// Whether the tick interval changed, which restarts the timer.
    pub interval_changed: bool,
    /// Systems that failed this cycle.
    pub faults: Vec<FaultRecord>,
}

/// Reason the loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopEndReason {
    /// Reached the configured cycle limit.
    MaxCyclesReached,
    /// A stop was requested.
    Stopped,
}

/// Result of [`Scheduler::run`].
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    /// Why the loop ended.
    pub end_reason: LoopEndReason,
    /// Cycles run by this scheduler, including direct `run_cycle` calls.
    pub cycles: u64,
    /// Timer restarts caused by interval changes.
    pub restarts: u64,
    /// Mode at the end.
    pub final_mode: PerformanceMode,
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

struct Registered<W> {
    id: SystemId,
    system: Box<dyn TickSystem<W>>,
}

struct LoopState {
    last_tick: Option<Instant>,
    pending_offline: Duration,
    low_fps_since: Option<Instant>,
    monitor: PerformanceMonitor,
    cycles: u64,
}

/// The adaptive game loop.
pub struct Scheduler<W> {
    world: Arc<Mutex<W>>,
    systems: Mutex<Vec<Registered<W>>>,
    control: Arc<LoopControl>,
    policy: ModePolicy,
    state: Mutex<LoopState>,
}

impl<W: SimulationWorld> Scheduler<W> {
    /// Create a scheduler over a shared world.
    pub fn new(world: Arc<Mutex<W>>, policy: ModePolicy, control: Arc<LoopControl>) -> Self {
        let monitor = PerformanceMonitor::new(Instant::now(), control.interval_ms());
        Self {
            world,
            systems: Mutex::new(Vec::new()),
            control,
            policy,
            state: Mutex::new(LoopState {
                last_tick: None,
                pending_offline: Duration::ZERO,
                low_fps_since: None,
                monitor,
                cycles: 0,
            }),
        }
    }

    /// The shared world. Commands lock it; the loop never starts a cycle
    /// while a command holds it.
    pub fn world(&self) -> Arc<Mutex<W>> {
        Arc::clone(&self.world)
    }

    /// The shared control state.
    pub fn control(&self) -> Arc<LoopControl> {
        Arc::clone(&self.control)
    }

    /// The mode policy.
    pub const fn policy(&self) -> &ModePolicy {
        &self.policy
    }

    /// Add elapsed time to the next cycle's `dt`. Used to replay time spent
    /// offline.
    pub async fn seed_offline(&self, elapsed: Duration) {
        let mut state = self.state.lock().await;
        state.pending_offline = state.pending_offline.saturating_add(elapsed);
    }

    /// Register a system. Systems tick in registration order.
    pub async fn register(&self, system: impl TickSystem<W> + 'static) -> SystemId {
        self.register_boxed(Box::new(system)).await
    }

    /// Register an already boxed system.
    pub async fn register_boxed(&self, system: Box<dyn TickSystem<W>>) -> SystemId {
        let id = SystemId::new();
        let name = system.name();
        self.systems.lock().await.push(Registered { id, system });
        debug!(system = name, %id, "System registered");
        id
    }

    /// Remove a system. Returns `false` when the handle is unknown.
    pub async fn unregister(&self, id: SystemId) -> bool {
        let mut systems = self.systems.lock().await;
        let before = systems.len();
        systems.retain(|entry| entry.id != id);
        let removed = systems.len() < before;
        if removed {
            debug!(%id, "System unregistered");
        }
        removed
    }

    /// Number of registered systems.
    pub async fn system_count(&self) -> usize {
        self.systems.lock().await.len()
    }

    /// Run one cycle as if the timer fired at `now`.
    pub async fn run_cycle(
        &self,
        now: Instant,
        observer: &mut dyn CycleObserver<W>,
    ) -> CycleReport {
        let mut state = self.state.lock().await;
        let elapsed = state
            .last_tick
            .map_or(Duration::ZERO, |last| now.saturating_duration_since(last));
        let dt = elapsed
            .saturating_add(std::mem::take(&mut state.pending_offline))
            .as_secs_f64();
        state.last_tick = Some(now);
        state.cycles = state.cycles.saturating_add(1);
        state.monitor.record_tick(now);
        let cycle = state.cycles;

        let mut world = self.world.lock().await;
        let path = world.begin_cycle(dt);
        if path == TickPath::CatchUp {
            info!(cycle, dt, "Catch-up cycle");
        }

        let mut faults = Vec::new();
        {
            let mut systems = self.systems.lock().await;
            for entry in systems.iter_mut() {
                if let Err(fault) = entry.system.tick(&mut world, dt) {
                    error!(
                        system = entry.system.name(),
                        cycle,
                        error = %fault,
                        "System tick failed"
                    );
                    faults.push(FaultRecord {
                        system: entry.id,
                        name: entry.system.name(),
                        message: fault.to_string(),
                    });
                }
            }
        }

        let production = world.theoretical_production();
        let previous_mode = self.control.mode();
        let mode = if self.frame_rate_emergency(&mut state, now) {
            PerformanceMode::Emergency
        } else {
            self.policy.mode_for_production(production)
        };
        let interval_changed =
            self.policy.interval_ms(mode) != self.policy.interval_ms(previous_mode);
        if mode != previous_mode {
            let interval_ms = self.policy.interval_ms(mode);
            self.control.set_mode(mode, interval_ms);
            state.monitor.set_interval(interval_ms);
            info!(
                from = ?previous_mode,
                to = ?mode,
                interval_ms,
                production,
                "Performance mode changed"
            );
        }

        let report = CycleReport {
            cycle,
            dt,
            path,
            production,
            previous_mode,
            mode,
            interval_changed,
            faults,
        };
        observer.on_cycle(&report, &world);
        report
    }

    /// Drive cycles from a timer until stopped or the cycle limit is hit.
    pub async fn run(&self, observer: &mut dyn CycleObserver<W>) -> RunSummary {
        {
            let mut state = self.state.lock().await;
            state.last_tick.get_or_insert_with(Instant::now);
        }
        info!(
            mode = ?self.control.mode(),
            interval_ms = self.control.interval_ms(),
            max_cycles = self.control.max_cycles(),
            "Game loop starting"
        );

        let end_reason = 'outer: loop {
            let period = self.policy.interval(self.control.mode());
            let mut timer = tokio::time::interval_at(Instant::now() + period, period);
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    () = self.control.stopped() => break 'outer LoopEndReason::Stopped,
                    _ = timer.tick() => {}
                }

                if self.control.is_paused() {
                    info!("Game loop paused, waiting for resume...");
                    tokio::select! {
                        biased;
                        () = self.control.stopped() => break 'outer LoopEndReason::Stopped,
                        () = self.control.wait_if_paused() => {}
                    }
                    // Time spent paused produces nothing.
                    self.state.lock().await.last_tick = Some(Instant::now());
                    info!("Game loop resumed");
                    continue;
                }

                let report = self.run_cycle(Instant::now(), observer).await;

                if self.control.cycle_limit_reached(report.cycle) {
                    info!(
                        cycle = report.cycle,
                        max_cycles = self.control.max_cycles(),
                        "Cycle limit reached"
                    );
                    break 'outer LoopEndReason::MaxCyclesReached;
                }

                if report.interval_changed {
                    let restarts = self.control.record_restart();
                    debug!(
                        restarts,
                        interval_ms = self.policy.interval_ms(report.mode),
                        "Restarting loop timer"
                    );
                    continue 'outer;
                }
            }
        };

        RunSummary {
            end_reason,
            cycles: self.state.lock().await.cycles,
            restarts: self.control.restarts(),
            final_mode: self.control.mode(),
        }
    }

    /// Track sustained low frame rate. Returns whether emergency mode is
    /// in force.
    fn frame_rate_emergency(&self, state: &mut LoopState, now: Instant) -> bool {
        let Some(fps) = self.control.reported_fps() else {
            state.low_fps_since = None;
            return false;
        };
        if fps >= self.policy.config.fps_floor {
            state.low_fps_since = None;
            return false;
        }
        let since = *state.low_fps_since.get_or_insert(now);
        let sustained = now.saturating_duration_since(since)
            >= Duration::from_millis(self.policy.config.fps_sustain_ms);
        if sustained && self.control.mode() != PerformanceMode::Emergency {
            warn!(fps, floor = self.policy.config.fps_floor, "Sustained low frame rate");
        }
        sustained
    }
}

/// Log the end of a loop run.
pub fn log_loop_end(summary: &RunSummary) {
    info!(
        reason = ?summary.end_reason,
        cycles = summary.cycles,
        restarts = summary.restarts,
        final_mode = ?summary.final_mode,
        "Game loop ended"
    );
    if summary.cycles == 0 {
        warn!("Game loop ended with no cycles executed");
    }
}
