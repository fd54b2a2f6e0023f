//! Feedback sink that turns production events into trace logs.
//!
//! The engine has no UI to animate produced units, so each batch is logged
//! at `trace` and tallied per resource kind. The tallies are logged once at
//! shutdown.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chroma_core::feedback::FeedbackSink;
use chroma_types::{ProducedResource, UnitProduced};
use tracing::trace;

/// Units produced on the live path, by resource kind.
#[derive(Debug, Default)]
pub struct ProductionTally {
    pixels: AtomicU64,
    white: AtomicU64,
    colors: AtomicU64,
}

impl ProductionTally {
    /// Primary pixels credited.
    pub fn pixels(&self) -> u64 {
        self.pixels.load(Ordering::Relaxed)
    }

    /// White pixels credited by converters.
    pub fn white(&self) -> u64 {
        self.white.load(Ordering::Relaxed)
    }

    /// Composite color units credited by converters.
    pub fn colors(&self) -> u64 {
        self.colors.load(Ordering::Relaxed)
    }
}

/// Logs every produced batch and adds it to a shared [`ProductionTally`].
#[derive(Debug, Clone, Default)]
pub struct TracingSink {
    tally: Arc<ProductionTally>,
}

impl TracingSink {
    /// Create a sink and the tally it feeds.
    pub fn new() -> (Self, Arc<ProductionTally>) {
        let sink = Self::default();
        let tally = Arc::clone(&sink.tally);
        (sink, tally)
    }
}

impl FeedbackSink for TracingSink {
    fn on_unit_produced(&mut self, event: &UnitProduced) {
        let counter = match event.resource {
            ProducedResource::Pixel(_) => &self.tally.pixels,
            ProducedResource::White => &self.tally.white,
            ProducedResource::Color(_) => &self.tally.colors,
        };
        counter.fetch_add(event.count, Ordering::Relaxed);
        trace!(resource = ?event.resource, count = event.count, "Unit produced");
    }
}

#[cfg(test)]
mod tests {
    use chroma_types::{Channel, ColorId};

    use super::*;

    #[test]
    fn tally_counts_by_kind() {
        let (mut sink, tally) = TracingSink::new();
        sink.on_unit_produced(&UnitProduced::pixels(Channel::Red, 3));
        sink.on_unit_produced(&UnitProduced::pixels(Channel::Blue, 2));
        sink.on_unit_produced(&UnitProduced::white(4));
        sink.on_unit_produced(&UnitProduced::color(ColorId::Orange, 1));

        assert_eq!(tally.pixels(), 5);
        assert_eq!(tally.white(), 4);
        assert_eq!(tally.colors(), 1);
    }
}
