//! Formulas, production engine and adaptive game loop for the Chroma
//! simulation core.
//!
//! This crate prices everything the ledgers hold, advances every economy
//! once per cycle and decides how often cycles run. The ledgers in
//! `chroma-ledger` only check and deduct; all arithmetic lives here.
//!
//! # Modules
//!
//! - [`tables`] -- Static tuning tables (generators, powerups, converters,
//!   lumen upgrades, tab thresholds).
//! - [`formulas`] -- Pure cost and rate formulas, soft-cap curves.
//! - [`synergy`] -- Cross-currency multipliers resolved once per cycle.
//! - [`gates`] -- Tab and converter unlock predicates.
//! - [`production`] -- Fractional accumulators, generators, converters,
//!   lumen and lux, iterative and catch-up paths.
//! - [`feedback`] -- [`FeedbackSink`] trait for produced-unit events.
//! - [`session`] -- [`GameSession`]: the single owner of game state and
//!   every player command.
//! - [`systems`] -- Production systems registered with the scheduler.
//! - [`scheduler`] -- [`Scheduler`]: the adaptive game loop and its
//!   performance modes.
//! - [`control`] -- [`LoopControl`]: pause, resume, stop and mode state
//!   shared between tasks.
//! - [`monitor`] -- Ticks-per-second budget monitor.
//! - [`publish`] -- Audited snapshot hand-off to the saver.
//! - [`display`] -- Lux display smoothing task.
//! - [`config`] -- Configuration loading from `chroma-config.yaml`.
//!
//! [`FeedbackSink`]: feedback::FeedbackSink
//! [`GameSession`]: session::GameSession
//! [`Scheduler`]: scheduler::Scheduler
//! [`LoopControl`]: control::LoopControl

pub mod config;
pub mod control;
pub mod display;
pub mod feedback;
pub mod formulas;
pub mod gates;
pub mod monitor;
pub mod production;
pub mod publish;
pub mod scheduler;
pub mod session;
pub mod synergy;
pub mod systems;
pub mod tables;
