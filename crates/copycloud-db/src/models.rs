//! Database row types.
//! Distinct from copycloud-types API models to keep the DB layer independent.

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use copycloud_types::api::ItemResponse;
use copycloud_types::models::ContentType;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomRow {
    pub id: String,
    pub code: String,
    pub is_secure: bool,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemRow {
    pub id: String,
    pub room_id: String,
    pub content_type: ContentType,
    pub content: String,
    pub original_filename: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Item content before it is assigned an id and a room.
#[derive(Debug, Clone)]
pub struct NewItem {
    pub content_type: ContentType,
    pub content: String,
    pub original_filename: Option<String>,
}

impl NewItem {
    pub fn text(content_type: ContentType, content: impl Into<String>) -> Self {
        Self {
            content_type,
            content: content.into(),
            original_filename: None,
        }
    }

    pub fn image(stored_name: impl Into<String>, original_filename: impl Into<String>) -> Self {
        Self {
            content_type: ContentType::Image,
            content: stored_name.into(),
            original_filename: Some(original_filename.into()),
        }
    }
}

impl From<ItemRow> for ItemResponse {
    fn from(row: ItemRow) -> Self {
        ItemResponse {
            id: row.id,
            content_type: row.content_type,
            content: row.content,
            original_filename: row.original_filename,
            created_at: row.created_at,
        }
    }
}

// Timestamps are stored as fixed-width RFC 3339 text (millisecond precision,
// `Z` suffix) so that string comparison in SQL orders chronologically.

pub(crate) fn to_db_time(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// The instant as it will read back from the database.
pub(crate) fn stored_time(t: DateTime<Utc>) -> DateTime<Utc> {
    t.trunc_subsecs(3)
}

pub(crate) fn from_db_time(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}
