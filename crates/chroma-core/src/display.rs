//! Lux display smoothing task.
//!
//! Runs beside the game loop on its own interval and only ever touches the
//! lux display copy, never a balance the loop reads.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::debug;

use crate::config::LuxConfig;
use crate::control::LoopControl;
use crate::session::GameSession;

/// Smooth the lux display until a stop is requested. Returns the number of
/// smoothing steps taken.
pub async fn run_display_smoother(
    session: Arc<Mutex<GameSession>>,
    control: Arc<LoopControl>,
    config: LuxConfig,
) -> u64 {
    let period = Duration::from_millis(config.display_refresh_ms.max(1));
    let mut timer = tokio::time::interval_at(Instant::now() + period, period);
    timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut last = Instant::now();
    let mut steps: u64 = 0;

    loop {
        tokio::select! {
            biased;
            () = control.stopped() => break,
            now = timer.tick() => {
                let dt = now.saturating_duration_since(last).as_secs_f64();
                last = now;
                session
                    .lock()
                    .await
                    .smooth_lux_display(dt, config.display_smoothing_rate);
                steps = steps.saturating_add(1);
            }
        }
    }

    debug!(steps, "Lux display smoother stopped");
    steps
}
