use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::ContentType;

// -- Rooms --

/// Returned by `POST /api/rooms`. `item` is `null` when the room was created empty.
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateRoomResponse {
    pub id: String,
    pub code: String,
    pub is_secure: bool,
    pub expires_at: DateTime<Utc>,
    pub item: Option<ItemResponse>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RoomResponse {
    pub id: String,
    pub code: String,
    pub is_secure: bool,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub items: Vec<ItemResponse>,
}

// -- Items --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemResponse {
    pub id: String,
    pub content_type: ContentType,
    /// Raw text or URL, or the stored filename for images.
    pub content: String,
    pub original_filename: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteItemResponse {
    pub success: bool,
}

// -- Misc --

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
