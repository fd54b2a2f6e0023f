//! Unlock and progression gates.
//!
//! Every gate is a predicate on lifetime white pixels. Lifetime white never
//! decreases outside a full reset, so once a gate opens it stays open.

use chroma_ledger::Ledgers;
use chroma_types::{ColorFamily, ConverterId, Tab};

use crate::tables;

/// Progress toward opening one tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TabStatus {
    /// Which tab.
    pub tab: Tab,
    /// Whether the tab is open.
    pub unlocked: bool,
    /// Lifetime white so far.
    pub progress: u64,
    /// Lifetime white needed.
    pub required: u64,
}

/// Status of one tab.
pub fn tab_status(ledgers: &Ledgers, tab: Tab) -> TabStatus {
    let progress = ledgers.pixels.lifetime_white();
    let required = tables::tab_requirement(tab);
    TabStatus {
        tab,
        unlocked: progress >= required,
        progress,
        required,
    }
}

/// Status of every tab, in display order.
pub fn all_tab_status(ledgers: &Ledgers) -> Vec<TabStatus> {
    Tab::ALL
        .into_iter()
        .map(|tab| tab_status(ledgers, tab))
        .collect()
}

/// Whether a tab is open.
pub fn is_tab_unlocked(ledgers: &Ledgers, tab: Tab) -> bool {
    ledgers.pixels.lifetime_white() >= tables::tab_requirement(tab)
}

/// Tab that gates unlocking colors of a family.
pub const fn color_tab(family: ColorFamily) -> Tab {
    match family {
        ColorFamily::Mixed => Tab::MixedColors,
        ColorFamily::Pure => Tab::PureColors,
    }
}

/// Whether a converter may be bought and run.
///
/// Needs the auto-converter tab open and the converter's own lifetime
/// white requirement met.
pub fn converter_available(ledgers: &Ledgers, id: ConverterId) -> bool {
    is_tab_unlocked(ledgers, Tab::AutoConverters)
        && ledgers.pixels.lifetime_white() >= tables::converter(id).unlock_requirement
}
