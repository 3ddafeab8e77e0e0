//! Serde adapters for server timestamps.
//!
//! The service emits either RFC 3339 strings or epoch milliseconds; both are
//! accepted. Timestamps are always written back as RFC 3339.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum WireTime {
    Millis(i64),
    Text(String),
}

fn to_utc<E: serde::de::Error>(value: WireTime) -> Result<DateTime<Utc>, E> {
    match value {
        WireTime::Millis(millis) => DateTime::from_timestamp_millis(millis)
            .ok_or_else(|| E::custom(format!("timestamp out of range: {millis}"))),
        WireTime::Text(text) => DateTime::parse_from_rfc3339(text.trim())
            .map(|value| value.with_timezone(&Utc))
            .map_err(|err| E::custom(format!("invalid timestamp `{text}`: {err}"))),
    }
}

pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&value.to_rfc3339())
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
    to_utc(WireTime::deserialize(deserializer)?)
}

/// Same as the parent module, for optional fields (`null` or missing).
pub mod option {
    use super::{to_utc, WireTime};
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(value) => serializer.serialize_some(&value.to_rfc3339()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        Option::<WireTime>::deserialize(deserializer)?
            .map(to_utc)
            .transpose()
    }
}
