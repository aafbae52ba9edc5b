//! Documents as returned by a search
//!
//! Rows come back in whatever shape the query produced. Only `_id` and
//! `_type` are required; display fields that are not plain strings (a raw
//! `slug` object, a localized `title` map) are read leniently.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Type prefixes owned by the store itself rather than by content authors
const SYSTEM_TYPE_PREFIXES: &[&str] = &["system.", "sanity."];

/// One row of a search result, projected down to the fields we display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Document identifier, unique within the store
    #[serde(rename = "_id")]
    pub id: String,

    /// Document type tag
    #[serde(rename = "_type")]
    pub doc_type: String,

    #[serde(default, deserialize_with = "text_field", skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, deserialize_with = "text_field", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Slug text: flattened by the query projection, or `current` of a raw slug object
    #[serde(default, deserialize_with = "slug_field", skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,

    #[serde(
        rename = "_createdAt",
        default,
        deserialize_with = "timestamp_field",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(
        rename = "_updatedAt",
        default,
        deserialize_with = "timestamp_field",
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_at: Option<DateTime<Utc>>,
}

impl SearchResult {
    pub fn new(id: impl Into<String>, doc_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            doc_type: doc_type.into(),
            title: None,
            name: None,
            slug: None,
            created_at: None,
            updated_at: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = Some(slug.into());
        self
    }

    /// Human-readable label: title, then name, then slug, then the id
    pub fn label(&self) -> &str {
        [&self.title, &self.name, &self.slug]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .find(|s| !s.trim().is_empty())
            .unwrap_or(&self.id)
    }
}

/// A string value, or `None` for null and any non-string shape
fn text_field<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        _ => None,
    })
}

fn slug_field<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Object(mut fields) => match fields.remove("current") {
            Some(Value::String(s)) => Some(s),
            _ => None,
        },
        _ => None,
    })
}

fn timestamp_field<'de, D>(deserializer: D) -> std::result::Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => DateTime::parse_from_rfc3339(&s)
            .ok()
            .map(|t| t.with_timezone(&Utc)),
        _ => None,
    })
}

/// Whether a type tag belongs to the store's own bookkeeping documents
pub fn is_system_type(doc_type: &str) -> bool {
    SYSTEM_TYPE_PREFIXES
        .iter()
        .any(|prefix| doc_type.starts_with(prefix))
}
