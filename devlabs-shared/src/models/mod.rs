/// Domain models for DevLabs
///
/// # Models
///
/// - `user`: Accounts with profile, portfolio settings and preferences
/// - `project`: Hackathon and side projects owned by a user
/// - `achievement`: Certificates, awards and other recognitions
/// - `view`: Public portfolio view records
///
/// All models serialize to camelCase JSON, matching the REST API payloads.

pub mod achievement;
pub mod project;
pub mod user;
pub mod view;

use serde::{de::Error, Deserialize, Deserializer};
use uuid::Uuid;

/// Calendar date (de)serialization
///
/// Dates are written as `YYYY-MM-DD`. On input, full RFC 3339 timestamps are
/// accepted as well and truncated to their UTC date, since browser clients
/// often send `Date.toISOString()` output.
pub mod date_format {
    use chrono::{DateTime, NaiveDate};
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%d";

    /// Parses a date or RFC 3339 timestamp
    pub fn parse(value: &str) -> Option<NaiveDate> {
        let value = value.trim();
        NaiveDate::parse_from_str(value, FORMAT).ok().or_else(|| {
            DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|dt| dt.naive_utc().date())
        })
    }

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&date.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| D::Error::custom(format!("invalid date: {raw}")))
    }

    /// Same as the parent module, for optional dates
    pub mod option {
        use chrono::NaiveDate;
        use serde::{de::Error, Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            date: &Option<NaiveDate>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match date {
                Some(date) => super::serialize(date, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<NaiveDate>, D::Error> {
            match Option::<String>::deserialize(deserializer)? {
                None => Ok(None),
                Some(raw) if raw.trim().is_empty() => Ok(None),
                Some(raw) => super::parse(&raw)
                    .map(Some)
                    .ok_or_else(|| D::Error::custom(format!("invalid date: {raw}"))),
            }
        }
    }
}

/// Turns blank optional strings into `None`
///
/// Form-driven clients submit empty strings for untouched optional inputs;
/// those are stored as absent rather than as empty values.
pub fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

/// Trims every entry and drops the empty ones
pub fn clean_list(values: Vec<String>) -> Vec<String> {
    values
        .into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}

/// Deserializes an optional string, mapping blank input to `None`
pub fn blank_as_none<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(non_blank(Option::<String>::deserialize(deserializer)?))
}

/// Deserializes a string list through [`clean_list`]; `null` is an empty list
pub fn trimmed_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    Ok(clean_list(
        Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default(),
    ))
}

/// Deserializes a required string, trimming surrounding whitespace
pub fn trimmed<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(String::deserialize(deserializer)?.trim().to_string())
}

/// Deserializes an optional UUID reference; blank strings mean "no reference"
pub fn optional_uuid<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Uuid>, D::Error> {
    match blank_as_none(deserializer)? {
        None => Ok(None),
        Some(raw) => Uuid::parse_str(&raw)
            .map(Some)
            .map_err(|_| D::Error::custom(format!("invalid id: {raw}"))),
    }
}
