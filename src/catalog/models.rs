//! Catalog Models
//! Mission: Define director and movie entities and their request payloads

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Director entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Director {
    pub id: i64,
    pub name: String,
    pub surname: String,
}

/// Movie entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Movie {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub release_date: DateTime<Utc>,
    pub genre: Option<String>,
    pub director_id: Option<i64>,
}

/// Director create/update payload. `id` must be 0 (unset) on create and must
/// match the path id on update.
#[derive(Debug, Deserialize)]
pub struct DirectorPayload {
    #[serde(default)]
    pub id: i64,
    pub name: String,
    pub surname: String,
}

/// Movie create/update payload
#[derive(Debug, Deserialize)]
pub struct MoviePayload {
    #[serde(default)]
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(deserialize_with = "deserialize_utc")]
    pub release_date: DateTime<Utc>,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub director_id: Option<i64>,
}

/// Accept either an RFC 3339 timestamp or a naive datetime, which is
/// interpreted as UTC.
fn deserialize_utc<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;

    if let Ok(dt) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S") {
        return Ok(naive.and_utc());
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(&raw, "%Y-%m-%d %H:%M:%S") {
        return Ok(naive.and_utc());
    }

    Err(serde::de::Error::custom(format!(
        "invalid datetime: {raw}"
    )))
}
