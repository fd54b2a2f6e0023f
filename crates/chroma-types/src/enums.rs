//! Enumeration types for the Chroma simulation core.
//!
//! Every piece of purchasable or producible content has a closed key set
//! known at compile time. Keeping these as enums rather than strings means
//! an invalid reference cannot be constructed in the first place; the
//! remaining "unknown target" cases are expressed as `Option`.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::structs::RgbAmount;

// ---------------------------------------------------------------------------
// Pixel channels
// ---------------------------------------------------------------------------

/// One of the three primary pixel channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub enum Channel {
    /// Red pixels.
    Red,
    /// Green pixels.
    Green,
    /// Blue pixels.
    Blue,
}

impl Channel {
    /// All channels in canonical order.
    pub const ALL: [Self; 3] = [Self::Red, Self::Green, Self::Blue];
}

/// Any pixel kind held by the pixel ledger, including white.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub enum PixelKind {
    /// Red pixels.
    Red,
    /// Green pixels.
    Green,
    /// Blue pixels.
    Blue,
    /// White pixels, produced only by conversion.
    White,
}

impl From<Channel> for PixelKind {
    fn from(channel: Channel) -> Self {
        match channel {
            Channel::Red => Self::Red,
            Channel::Green => Self::Green,
            Channel::Blue => Self::Blue,
        }
    }
}

// ---------------------------------------------------------------------------
// Composite colors
// ---------------------------------------------------------------------------

/// Family of a composite color. Unlock counts are tracked per family.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub enum ColorFamily {
    /// Two-channel blends (orange, purple, ...).
    #[default]
    Mixed,
    /// Single-channel concentrates (crimson, emerald, sapphire).
    Pure,
}

/// A composite color that can be unlocked and mixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub enum ColorId {
    /// 2 red + 1 green.
    Orange,
    /// 2 red + 1 blue.
    Purple,
    /// 1 red + 2 green.
    Yellow,
    /// 1 green + 2 blue.
    Cyan,
    /// 1 red + 2 blue.
    Magenta,
    /// 2 green + 1 blue.
    Lime,
    /// 3 red.
    Crimson,
    /// 3 green.
    Emerald,
    /// 3 blue.
    Sapphire,
}

impl ColorId {
    /// All nine colors.
    pub const ALL: [Self; 9] = [
        Self::Orange,
        Self::Purple,
        Self::Yellow,
        Self::Cyan,
        Self::Magenta,
        Self::Lime,
        Self::Crimson,
        Self::Emerald,
        Self::Sapphire,
    ];

    /// Order in which mixed colors are offered for unlock.
    pub const MIXED_UNLOCK_ORDER: [Self; 6] = [
        Self::Orange,
        Self::Yellow,
        Self::Cyan,
        Self::Purple,
        Self::Magenta,
        Self::Lime,
    ];

    /// Order in which pure colors are offered for unlock.
    pub const PURE_UNLOCK_ORDER: [Self; 3] = [Self::Crimson, Self::Emerald, Self::Sapphire];

    /// The family this color belongs to.
    pub const fn family(self) -> ColorFamily {
        match self {
            Self::Crimson | Self::Emerald | Self::Sapphire => ColorFamily::Pure,
            _ => ColorFamily::Mixed,
        }
    }

    /// RGB pixels consumed to mix one unit.
    pub const fn recipe(self) -> RgbAmount {
        let (red, green, blue) = match self {
            Self::Orange => (2, 1, 0),
            Self::Purple => (2, 0, 1),
            Self::Yellow => (1, 2, 0),
            Self::Cyan => (0, 1, 2),
            Self::Magenta => (1, 0, 2),
            Self::Lime => (0, 2, 1),
            Self::Crimson => (3, 0, 0),
            Self::Emerald => (0, 3, 0),
            Self::Sapphire => (0, 0, 3),
        };
        RgbAmount { red, green, blue }
    }

    /// Display name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Orange => "Orange",
            Self::Purple => "Purple",
            Self::Yellow => "Yellow",
            Self::Cyan => "Cyan",
            Self::Magenta => "Magenta",
            Self::Lime => "Lime",
            Self::Crimson => "Crimson",
            Self::Emerald => "Emerald",
            Self::Sapphire => "Sapphire",
        }
    }

    /// Hex swatch used by the UI when drawing the color.
    pub const fn swatch(self) -> &'static str {
        match self {
            Self::Orange => "#f97316",
            Self::Purple => "#a855f7",
            Self::Yellow => "#eab308",
            Self::Cyan => "#06b6d4",
            Self::Magenta => "#d946ef",
            Self::Lime => "#84cc16",
            Self::Crimson => "#b91c1c",
            Self::Emerald => "#059669",
            Self::Sapphire => "#1d4ed8",
        }
    }

    /// The primary channel of a pure color, `None` for mixed colors.
    pub const fn primary_channel(self) -> Option<Channel> {
        match self {
            Self::Crimson => Some(Channel::Red),
            Self::Emerald => Some(Channel::Green),
            Self::Sapphire => Some(Channel::Blue),
            _ => None,
        }
    }

    /// The pure color concentrating the given channel.
    pub const fn pure_for(channel: Channel) -> Self {
        match channel {
            Channel::Red => Self::Crimson,
            Channel::Green => Self::Emerald,
            Channel::Blue => Self::Sapphire,
        }
    }
}

// ---------------------------------------------------------------------------
// Upgrades
// ---------------------------------------------------------------------------

/// Where a generator's output goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratorOutput {
    /// Every unit lands in one fixed channel.
    Fixed(Channel),
    /// Every unit lands in a uniformly drawn channel.
    Random,
}

/// A pixel generator purchasable with white pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub enum GeneratorId {
    /// Produces red pixels.
    Red,
    /// Produces green pixels.
    Green,
    /// Produces blue pixels.
    Blue,
    /// Produces pixels of a random channel.
    Random,
}

impl GeneratorId {
    /// All generators.
    pub const ALL: [Self; 4] = [Self::Red, Self::Green, Self::Blue, Self::Random];

    /// Output routing of this generator.
    pub const fn output(self) -> GeneratorOutput {
        match self {
            Self::Red => GeneratorOutput::Fixed(Channel::Red),
            Self::Green => GeneratorOutput::Fixed(Channel::Green),
            Self::Blue => GeneratorOutput::Fixed(Channel::Blue),
            Self::Random => GeneratorOutput::Random,
        }
    }
}

/// A global production speed multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub enum PowerupId {
    /// Small multiplier, many levels.
    SpeedBoost,
    /// Medium multiplier.
    MegaSpeed,
    /// Large multiplier, few levels.
    UltraSpeed,
}

impl PowerupId {
    /// All powerups.
    pub const ALL: [Self; 3] = [Self::SpeedBoost, Self::MegaSpeed, Self::UltraSpeed];
}

/// A one-shot breakthrough purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub enum BreakthroughId {
    /// Production smoothing multiplier, tier I.
    Efficiency1,
    /// Production smoothing multiplier, tier II.
    Efficiency2,
    /// Production smoothing multiplier, tier III.
    Efficiency3,
    /// Cuts the RGB cost of white conversion.
    ConversionCatalyst,
    /// Halves the conversion efficiency decay rate.
    EfficiencyStabilizer,
    /// Converts several sets per conversion.
    BulkConverter,
    /// Boosts conversion efficiency.
    WhiteAmplifier,
}

impl BreakthroughId {
    /// All breakthroughs.
    pub const ALL: [Self; 7] = [
        Self::Efficiency1,
        Self::Efficiency2,
        Self::Efficiency3,
        Self::ConversionCatalyst,
        Self::EfficiencyStabilizer,
        Self::BulkConverter,
        Self::WhiteAmplifier,
    ];

    /// Whether this breakthrough multiplies the production smoothing curve.
    pub const fn is_production_efficiency(self) -> bool {
        matches!(self, Self::Efficiency1 | Self::Efficiency2 | Self::Efficiency3)
    }
}

// ---------------------------------------------------------------------------
// Auto-converters
// ---------------------------------------------------------------------------

/// What an auto-converter produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub enum ConverterKind {
    /// RGB to white.
    White,
    /// Three of one channel to a pure color.
    Pure,
    /// Recipe to a mixed color.
    Mixed,
}

/// An automatic converter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub enum ConverterId {
    /// RGB to white.
    WhiteConverter,
    /// Mixes orange.
    OrangeMixer,
    /// Mixes purple.
    PurpleMixer,
    /// Mixes yellow.
    YellowMixer,
    /// Mixes cyan.
    CyanMixer,
    /// Mixes magenta.
    MagentaMixer,
    /// Mixes lime.
    LimeMixer,
    /// Forges crimson.
    CrimsonForge,
    /// Forges emerald.
    EmeraldForge,
    /// Forges sapphire.
    SapphireForge,
}

impl ConverterId {
    /// All converters in tab layout order (white, mixed, pure).
    pub const ALL: [Self; 10] = [
        Self::WhiteConverter,
        Self::OrangeMixer,
        Self::PurpleMixer,
        Self::YellowMixer,
        Self::CyanMixer,
        Self::MagentaMixer,
        Self::LimeMixer,
        Self::CrimsonForge,
        Self::EmeraldForge,
        Self::SapphireForge,
    ];

    /// Kind of conversion performed.
    pub const fn kind(self) -> ConverterKind {
        match self {
            Self::WhiteConverter => ConverterKind::White,
            Self::CrimsonForge | Self::EmeraldForge | Self::SapphireForge => ConverterKind::Pure,
            _ => ConverterKind::Mixed,
        }
    }

    /// Color produced, `None` for the white converter.
    pub const fn target_color(self) -> Option<ColorId> {
        match self {
            Self::WhiteConverter => None,
            Self::OrangeMixer => Some(ColorId::Orange),
            Self::PurpleMixer => Some(ColorId::Purple),
            Self::YellowMixer => Some(ColorId::Yellow),
            Self::CyanMixer => Some(ColorId::Cyan),
            Self::MagentaMixer => Some(ColorId::Magenta),
            Self::LimeMixer => Some(ColorId::Lime),
            Self::CrimsonForge => Some(ColorId::Crimson),
            Self::EmeraldForge => Some(ColorId::Emerald),
            Self::SapphireForge => Some(ColorId::Sapphire),
        }
    }
}

// ---------------------------------------------------------------------------
// Lumen
// ---------------------------------------------------------------------------

/// A leveled lumen upgrade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub enum LumenUpgradeId {
    /// Doubles lumen generation per level.
    PhotonAmplifier,
    /// Steepens the lumen curve per level.
    QuantumEfficiency,
    /// Boosts RGB generators from lifetime lumen.
    ChromaticResonance,
    /// Cheapens white conversion per thousand lumen held.
    WhitePixelCatalyst,
    /// Boosts RGB generators when lumen/sec exceeds 100.
    LuminousOverflow,
}

impl LumenUpgradeId {
    /// All lumen upgrades.
    pub const ALL: [Self; 5] = [
        Self::PhotonAmplifier,
        Self::QuantumEfficiency,
        Self::ChromaticResonance,
        Self::WhitePixelCatalyst,
        Self::LuminousOverflow,
    ];
}

/// A lumen-priced generator that drives lux production.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub enum LumenGeneratorId {
    /// Flat one lux per second.
    Begin,
    /// Multiplies lux by `sqrt(lumen + 2)`.
    LumenBoost,
    /// Multiplies lux by a function of lux held.
    SelfSynergy,
}

impl LumenGeneratorId {
    /// All lumen generators.
    pub const ALL: [Self; 3] = [Self::Begin, Self::LumenBoost, Self::SelfSynergy];

    /// Generator that must be owned before this one can be bought.
    pub const fn requires(self) -> Option<Self> {
        match self {
            Self::Begin => None,
            Self::LumenBoost => Some(Self::Begin),
            Self::SelfSynergy => Some(Self::LumenBoost),
        }
    }
}

// ---------------------------------------------------------------------------
// Scheduling and progression
// ---------------------------------------------------------------------------

/// Adaptive scheduler performance mode, ordered by increasing load.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub enum PerformanceMode {
    /// Light load, fastest cadence.
    #[default]
    Normal,
    /// Moderate load.
    Medium,
    /// Heavy load.
    High,
    /// Very heavy load.
    Extreme,
    /// Frame rate collapse; slowest cadence.
    Emergency,
}

impl PerformanceMode {
    /// All modes in ascending load order.
    pub const ALL: [Self; 5] = [
        Self::Normal,
        Self::Medium,
        Self::High,
        Self::Extreme,
        Self::Emergency,
    ];
}

/// A gated UI tab / feature area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub enum Tab {
    /// Pixel generators.
    Generators,
    /// Automatic converters.
    AutoConverters,
    /// Mixed color unlocks.
    MixedColors,
    /// Speed powerups.
    Powerups,
    /// Pure color unlocks.
    PureColors,
    /// One-shot breakthroughs.
    Breakthroughs,
    /// Lumen upgrades and generators.
    Lumen,
}

impl Tab {
    /// All tabs.
    pub const ALL: [Self; 7] = [
        Self::Generators,
        Self::AutoConverters,
        Self::MixedColors,
        Self::Powerups,
        Self::PureColors,
        Self::Breakthroughs,
        Self::Lumen,
    ];
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn pure_colors_map_to_their_channel() {
        for channel in Channel::ALL {
            let color = ColorId::pure_for(channel);
            assert_eq!(color.family(), ColorFamily::Pure);
            assert_eq!(color.primary_channel(), Some(channel));
        }
    }

    #[test]
    fn every_recipe_costs_three_pixels() {
        for color in ColorId::ALL {
            assert_eq!(color.recipe().total(), 3, "{color:?}");
        }
    }

    #[test]
    fn converters_target_matching_family() {
        for id in ConverterId::ALL {
            match (id.kind(), id.target_color()) {
                (ConverterKind::White, None) => {}
                (ConverterKind::Pure, Some(c)) => assert_eq!(c.family(), ColorFamily::Pure),
                (ConverterKind::Mixed, Some(c)) => assert_eq!(c.family(), ColorFamily::Mixed),
                other => panic!("unexpected converter shape {other:?}"),
            }
        }
    }

    #[test]
    fn serde_keys_are_camel_case() {
        let json = serde_json::to_string(&ConverterId::WhiteConverter).unwrap();
        assert_eq!(json, "\"whiteConverter\"");
        let json = serde_json::to_string(&LumenUpgradeId::PhotonAmplifier).unwrap();
        assert_eq!(json, "\"photonAmplifier\"");
    }

    #[test]
    fn modes_are_ordered_by_load() {
        assert!(PerformanceMode::Normal < PerformanceMode::Medium);
        assert!(PerformanceMode::Extreme < PerformanceMode::Emergency);
    }
}
