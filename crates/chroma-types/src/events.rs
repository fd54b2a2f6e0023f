//! Feedback events emitted by the production engine.
//!
//! Events are produced only on the iterative tick path. The fast catch-up
//! path credits ledgers in bulk and emits nothing, so a client returning
//! from a long absence is not flooded with thousands of sounds.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{Channel, ColorId};

/// What a batch of produced units was credited to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "type", content = "id", rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub enum ProducedResource {
    /// Primary pixels of one channel.
    Pixel(Channel),
    /// White pixels from an auto-converter.
    White,
    /// Units of a composite color from an auto-converter.
    Color(ColorId),
}

/// One batch of units credited during a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct UnitProduced {
    /// The resource that was credited.
    pub resource: ProducedResource,
    /// Whole units in the batch. Always at least 1.
    pub count: u64,
}

impl UnitProduced {
    /// A batch of primary pixels.
    pub const fn pixels(channel: Channel, count: u64) -> Self {
        Self {
            resource: ProducedResource::Pixel(channel),
            count,
        }
    }

    /// A batch of white pixels.
    pub const fn white(count: u64) -> Self {
        Self {
            resource: ProducedResource::White,
            count,
        }
    }

    /// A batch of composite color units.
    pub const fn color(color: ColorId, count: u64) -> Self {
        Self {
            resource: ProducedResource::Color(color),
            count,
        }
    }
}
