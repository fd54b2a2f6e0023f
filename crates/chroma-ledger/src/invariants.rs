//! Invariant audit between two snapshots of the same session.
//!
//! Ledger methods enforce every rule by construction, so a clean run never
//! trips this check. It exists to catch corruption from outside the ledgers
//! (a bad import, a hand-edited save, a future bug) before it is persisted.
//!
//! The audit compares a `before` and an `after` snapshot taken without a
//! full reset in between. It checks:
//!
//! ```text
//! lifetime_white, lifetime_lumen, lux.lifetime_total, lux.best_amount  never decrease
//! color.count                                                           never decreases
//! color.unlocked                                                        never reverts
//! lumen.best_lumen >= lumen.total
//! every f64 balance                                                     finite and >= 0
//! ```

use chroma_types::{ColorId, SessionSnapshot};

use crate::{LedgerAnomaly, Violation};

/// The result of auditing a pair of snapshots.
#[derive(Debug, Clone, PartialEq)]
pub enum AuditResult {
    /// Every invariant holds.
    Clean,
    /// One or more invariants were violated.
    Anomaly(LedgerAnomaly),
}

/// Compare two snapshots of one session.
pub fn audit(before: &SessionSnapshot, after: &SessionSnapshot) -> AuditResult {
    let mut violations = Vec::new();

    if after.pixels.lifetime_white < before.pixels.lifetime_white {
        violations.push(Violation::CounterDecreased {
            counter: "pixels.lifetime_white",
            before: before.pixels.lifetime_white as f64,
            after: after.pixels.lifetime_white as f64,
        });
    }

    let float_counters = [
        (
            "lumen.lifetime_lumen",
            before.lumen.lifetime_lumen,
            after.lumen.lifetime_lumen,
        ),
        (
            "lux.lifetime_total",
            before.lux.lifetime_total,
            after.lux.lifetime_total,
        ),
        ("lux.best_amount", before.lux.best_amount, after.lux.best_amount),
    ];
    for (counter, was, now) in float_counters {
        if now < was {
            violations.push(Violation::CounterDecreased {
                counter,
                before: was,
                after: now,
            });
        }
    }

    for color in ColorId::ALL {
        let (Some(was), Some(now)) = (
            before.composite_colors.get(&color),
            after.composite_colors.get(&color),
        ) else {
            continue;
        };
        if now.count < was.count {
            violations.push(Violation::CounterDecreased {
                counter: "color.count",
                before: was.count as f64,
                after: now.count as f64,
            });
        }
        if was.unlocked && !now.unlocked {
            violations.push(Violation::ColorRelocked { color });
        }
    }

    if after.lumen.best_lumen < after.lumen.total {
        violations.push(Violation::BestBelowTotal {
            best: after.lumen.best_lumen,
            total: after.lumen.total,
        });
    }

    let balances = [
        ("lumen.total", after.lumen.total),
        ("lux.amount", after.lux.amount),
        ("lux.display_amount", after.lux.display_amount),
        ("lux.total_lumen_earned", after.lux.total_lumen_earned),
        ("game_stats.playtime_seconds", after.game_stats.playtime_seconds),
    ];
    for (field, value) in balances {
        if !value.is_finite() || value < 0.0 {
            violations.push(Violation::InvalidBalance { field, value });
        }
    }

    if violations.is_empty() {
        AuditResult::Clean
    } else {
        let count = violations.len();
        AuditResult::Anomaly(LedgerAnomaly {
            violations,
            message: format!("LEDGER_ANOMALY: {count} invariant(s) violated"),
        })
    }
}
