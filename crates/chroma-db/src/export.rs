//! Portable save bundles.
//!
//! An export is the compact JSON form of [`SaveExport`]. Import checks the
//! shape before decoding so a bundle missing a required field is rejected
//! with the field's name rather than a generic serde message. Nothing is
//! applied unless the whole bundle decodes.

use chroma_core::session::EXPORT_VERSION;
use chroma_types::SaveExport;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::ImportError;

/// Fields every bundle must carry, as written on the wire.
pub const REQUIRED_FIELDS: [&str; 5] = ["version", "timestamp", "pixels", "upgrades", "gameStats"];

/// Encode a bundle as compact JSON.
pub fn export_text(bundle: &SaveExport) -> Result<String, serde_json::Error> {
    serde_json::to_string(bundle)
}

/// Decode and validate an imported bundle.
pub fn parse_import(text: &str) -> Result<SaveExport, ImportError> {
    let value: Value =
        serde_json::from_str(text.trim()).map_err(|source| ImportError::Malformed { source })?;
    let Value::Object(fields) = &value else {
        return Err(ImportError::NotAnObject);
    };
    if let Some(field) = REQUIRED_FIELDS
        .into_iter()
        .find(|field| !fields.contains_key(*field))
    {
        warn!(field, "Import rejected, missing field");
        return Err(ImportError::MissingField { field });
    }

    let bundle: SaveExport =
        serde_json::from_value(value).map_err(|source| ImportError::Malformed { source })?;
    if bundle.version > EXPORT_VERSION {
        return Err(ImportError::UnsupportedVersion {
            version: bundle.version,
            supported: EXPORT_VERSION,
        });
    }
    debug!(version = bundle.version, timestamp = %bundle.timestamp, "Import decoded");
    Ok(bundle)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{TimeZone, Utc};
    use chroma_types::{GameStats, PixelState, UpgradeState};

    use super::*;

    fn bundle() -> SaveExport {
        SaveExport {
            version: EXPORT_VERSION,
            timestamp: Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap(),
            pixels: PixelState {
                red: 3,
                white: 8,
                lifetime_white: 20,
                ..PixelState::default()
            },
            upgrades: UpgradeState::default(),
            game_stats: GameStats {
                total_clicks: 7,
                ..GameStats::default()
            },
        }
    }

    #[test]
    fn exported_text_imports_back() {
        let text = export_text(&bundle()).unwrap();
        assert!(text.contains("\"gameStats\""));
        assert!(!text.contains('\n'));
        assert_eq!(parse_import(&text).unwrap(), bundle());
    }

    #[test]
    fn missing_field_is_named() {
        let mut value = serde_json::to_value(bundle()).unwrap();
        value.as_object_mut().unwrap().remove("gameStats");
        let err = parse_import(&value.to_string()).unwrap_err();
        assert!(matches!(err, ImportError::MissingField { field: "gameStats" }));
    }

    #[test]
    fn garbage_and_non_objects_are_rejected() {
        assert!(matches!(
            parse_import("not a save"),
            Err(ImportError::Malformed { .. })
        ));
        assert!(matches!(parse_import("[1, 2]"), Err(ImportError::NotAnObject)));
    }

    #[test]
    fn wrong_shape_is_malformed() {
        let mut value = serde_json::to_value(bundle()).unwrap();
        value["pixels"] = Value::String("lots".to_owned());
        assert!(matches!(
            parse_import(&value.to_string()),
            Err(ImportError::Malformed { .. })
        ));
    }

    #[test]
    fn newer_version_is_rejected() {
        let mut newer = bundle();
        newer.version = EXPORT_VERSION + 1;
        let text = export_text(&newer).unwrap();
        assert!(matches!(
            parse_import(&text),
            Err(ImportError::UnsupportedVersion { .. })
        ));
    }
}
