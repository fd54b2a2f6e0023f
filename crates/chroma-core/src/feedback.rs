//! Production feedback sinks.
//!
//! The iterative production path reports every credited batch as a
//! [`UnitProduced`] event so a UI can animate it or play a sound. The
//! catch-up path reports nothing: nobody watched those pixels appear.

use chroma_types::UnitProduced;

/// Receiver for production feedback.
pub trait FeedbackSink: Send {
    /// Called once per credited batch on the iterative path.
    fn on_unit_produced(&mut self, event: &UnitProduced);
}

/// A sink that discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpSink;

impl FeedbackSink for NoOpSink {
    fn on_unit_produced(&mut self, _event: &UnitProduced) {}
}

/// A sink that keeps every event in memory.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    events: Vec<UnitProduced>,
}

impl RecordingSink {
    /// Events received so far, oldest first.
    pub fn events(&self) -> &[UnitProduced] {
        &self.events
    }

    /// Remove and return every recorded event.
    pub fn drain(&mut self) -> Vec<UnitProduced> {
        std::mem::take(&mut self.events)
    }
}

impl FeedbackSink for RecordingSink {
    fn on_unit_produced(&mut self, event: &UnitProduced) {
        self.events.push(*event);
    }
}
