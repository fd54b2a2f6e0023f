//! Tolerant deserialization for maps keyed by closed enums.
//!
//! A save written by a newer build may carry keys this build has never
//! heard of. A plain `BTreeMap<Enum, V>` rejects the whole map on the first
//! unknown key, which would reset every sibling entry to its default. The
//! helpers here keep each entry that parses and drop the rest with a
//! warning.

use std::collections::BTreeMap;

use serde::de::value::StrDeserializer;
use serde::de::{DeserializeOwned, IntoDeserializer};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::warn;

/// `deserialize_with` target for enum-keyed maps.
///
/// Entries whose key or value does not parse are skipped.
///
/// # Errors
///
/// Fails only when the input is not a map at all.
pub fn map<'de, D, K, V>(deserializer: D) -> Result<BTreeMap<K, V>, D::Error>
where
    D: Deserializer<'de>,
    K: DeserializeOwned + Ord,
    V: DeserializeOwned,
{
    let raw = BTreeMap::<String, Value>::deserialize(deserializer)?;
    Ok(keep_known(raw))
}

/// Build an enum-keyed map from an already-parsed JSON value.
///
/// Returns `None` when `value` is not a JSON object.
#[must_use]
pub fn map_from_value<K, V>(value: Value) -> Option<BTreeMap<K, V>>
where
    K: DeserializeOwned + Ord,
    V: DeserializeOwned,
{
    match value {
        Value::Object(object) => Some(keep_known(object.into_iter().collect())),
        _ => None,
    }
}

fn keep_known<K, V>(raw: BTreeMap<String, Value>) -> BTreeMap<K, V>
where
    K: DeserializeOwned + Ord,
    V: DeserializeOwned,
{
    raw.into_iter()
        .filter_map(|(key, value)| {
            let de: StrDeserializer<'_, serde::de::value::Error> = key.as_str().into_deserializer();
            let Ok(parsed) = K::deserialize(de) else {
                warn!(key = %key, "Unknown map key skipped");
                return None;
            };
            match serde_json::from_value(value) {
                Ok(entry) => Some((parsed, entry)),
                Err(e) => {
                    warn!(key = %key, error = %e, "Malformed map entry skipped");
                    None
                }
            }
        })
        .collect()
}
