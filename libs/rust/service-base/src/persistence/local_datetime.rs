//! Serde adapter rendering local timestamps in the platform JSON date format.
//!
//! Use with `#[serde(default, with = "service_base::persistence::local_datetime")]`
//! on `Option<NaiveDateTime>` fields.

use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serializer};

use crate::health::DEFAULT_DATE_FORMAT;

/// Serialize as `yyyy-MM-ddTHH:mm:ss`, dropping fractional seconds.
///
/// # Errors
///
/// Returns the serializer's error.
#[allow(clippy::ref_option)]
pub fn serialize<S>(value: &Option<NaiveDateTime>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value {
        Some(moment) => serializer.collect_str(&moment.format(DEFAULT_DATE_FORMAT)),
        None => serializer.serialize_none(),
    }
}

/// Accept the platform format as well as ISO-8601 with fractional seconds.
///
/// # Errors
///
/// Returns an error if the string is not a local date-time.
pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    NaiveDateTime::parse_from_str(&raw, DEFAULT_DATE_FORMAT)
        .or_else(|_| raw.parse::<NaiveDateTime>())
        .map(Some)
        .map_err(serde::de::Error::custom)
}
