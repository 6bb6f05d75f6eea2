//! Raw documents as returned by the content API
//!
//! These types are read-only inputs to the assemblers. Deserialization is
//! lenient: absent, null or oddly-typed optional fields degrade to empty
//! values instead of rejecting the whole document.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::rich_text::RichTextNode;

/// A single document from the content API
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentDocument {
    /// API-assigned document id (used as the `after` paging anchor)
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,

    /// Human-readable slug
    #[serde(default, deserialize_with = "lenient_string")]
    pub uid: Option<String>,

    /// Custom type, e.g. `posts`
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub doc_type: String,

    #[serde(default, with = "timestamp")]
    pub first_publication_date: Option<DateTime<Utc>>,

    #[serde(default, with = "timestamp")]
    pub last_publication_date: Option<DateTime<Utc>>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub data: RawFields,
}

/// The `data` payload of an article document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawFields {
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub subtitle: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub author: Option<String>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub banner: Image,

    #[serde(default, deserialize_with = "null_as_default")]
    pub content: Vec<RawBlock>,
}

/// Image field; the API sends `{}` for an unset image
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Image {
    #[serde(default, deserialize_with = "lenient_string")]
    pub url: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub alt: Option<String>,
}

/// One heading + rich-text body group inside an article
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawBlock {
    #[serde(default, deserialize_with = "lenient_string")]
    pub heading: Option<String>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub body: Vec<RichTextNode>,
}

/// Response body of a search query and of a `next_page` cursor
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    #[serde(default)]
    pub page: u32,

    #[serde(default)]
    pub total_pages: u32,

    #[serde(default)]
    pub total_results_size: u32,

    #[serde(default, deserialize_with = "null_as_default")]
    pub results: Vec<ContentDocument>,

    #[serde(default)]
    pub next_page: Option<String>,
}

/// Treat an explicit `null` like a missing field
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accept a string; anything else (null, rich-text arrays, numbers) becomes `None`
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Some(s),
        _ => None,
    })
}

/// Publication timestamps in either RFC 3339 or `+0000` offset form
pub(crate) mod timestamp {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(date) => serializer.serialize_some(&date.to_rfc3339()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.and_then(|s| {
            let parsed = crate::helpers::parse_timestamp(&s);
            if parsed.is_none() {
                tracing::warn!("Ignoring unparseable timestamp {:?}", s);
            }
            parsed
        }))
    }
}
