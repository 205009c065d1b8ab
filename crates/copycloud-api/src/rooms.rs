use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use tracing::{debug, info, warn};

use copycloud_codes::generate_id;
use copycloud_db::models::NewItem;
use copycloud_db::{Database, ItemDeletion};
use copycloud_types::api::{CreateRoomResponse, DeleteItemResponse, ItemResponse, RoomResponse};
use copycloud_types::content::classify;
use copycloud_types::models::ContentType;

use crate::AppState;
use crate::error::{ApiError, ApiResult};
use crate::payload::ItemPayload;
use crate::storage::Storage;

/// POST /api/rooms: create a room, optionally with its first item.
pub async fn create_room(
    State(state): State<AppState>,
    payload: ItemPayload,
) -> ApiResult<impl IntoResponse> {
    let secure = payload.secure;
    let (new_item, stored) = stage_item(&state.storage, payload).await?;
    let now = Utc::now();

    let created = run_db(&state.db, move |db| db.create_room(secure, new_item, now)).await;
    let (room, item) = match created {
        Ok(created) => created,
        Err(e) => {
            discard_upload(&state.storage, stored).await;
            return Err(e);
        }
    };

    info!(
        "Room {} created (secure: {}, item: {})",
        room.id,
        room.is_secure,
        item.as_ref().map_or("none", |i| i.content_type.as_str())
    );

    Ok((
        StatusCode::CREATED,
        Json(CreateRoomResponse {
            id: room.id,
            code: room.code,
            is_secure: room.is_secure,
            expires_at: room.expires_at,
            item: item.map(ItemResponse::from),
        }),
    ))
}

/// GET /api/rooms/{code}: room and items, oldest first. Expired rooms are 404.
pub async fn get_room(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> ApiResult<Json<RoomResponse>> {
    let now = Utc::now();
    let (room, items) = run_db(&state.db, move |db| db.get_room(&code, now))
        .await?
        .ok_or(ApiError::NotFound)?;

    Ok(Json(RoomResponse {
        id: room.id,
        code: room.code,
        is_secure: room.is_secure,
        created_at: room.created_at,
        expires_at: room.expires_at,
        items: items.into_iter().map(ItemResponse::from).collect(),
    }))
}

/// POST /api/rooms/{code}/items: add text or an image to a live room.
pub async fn append_item(
    State(state): State<AppState>,
    Path(code): Path<String>,
    payload: ItemPayload,
) -> ApiResult<impl IntoResponse> {
    let now = Utc::now();

    // A missing room wins over a missing body
    if payload.is_empty() {
        let room = run_db(&state.db, move |db| db.find_active_room(&code, now)).await?;
        return Err(match room {
            Some(_) => ApiError::BadRequest("No content provided".into()),
            None => ApiError::NotFound,
        });
    }

    let (Some(new_item), stored) = stage_item(&state.storage, payload).await? else {
        return Err(ApiError::BadRequest("No content provided".into()));
    };

    let appended = run_db(&state.db, move |db| db.append_item(&code, new_item, now)).await;
    let item = match appended {
        Ok(Some(item)) => item,
        Ok(None) => {
            discard_upload(&state.storage, stored).await;
            return Err(ApiError::NotFound);
        }
        Err(e) => {
            discard_upload(&state.storage, stored).await;
            return Err(e);
        }
    };

    debug!("Item {} ({}) added to room {}", item.id, item.content_type, item.room_id);

    Ok((StatusCode::CREATED, Json(ItemResponse::from(item))))
}

/// DELETE /api/rooms/{code}/items/{item_id}: remove one item.
///
/// Succeeds when the item is already gone. Does not require the room to be
/// unexpired, only to still exist.
pub async fn delete_item(
    State(state): State<AppState>,
    Path((code, item_id)): Path<(String, String)>,
) -> ApiResult<Json<DeleteItemResponse>> {
    let outcome = run_db(&state.db, move |db| db.delete_item(&code, &item_id)).await?;

    match outcome {
        ItemDeletion::RoomNotFound => return Err(ApiError::RoomMissing),
        ItemDeletion::Removed(item) => {
            debug!("Item {} removed from room {}", item.id, item.room_id);
            if item.content_type == ContentType::Image {
                discard_upload(&state.storage, Some(item.content)).await;
            }
        }
        ItemDeletion::AlreadyGone => {}
    }

    Ok(Json(DeleteItemResponse { success: true }))
}

/// Turn a payload into the item to insert. Images are written to storage
/// here, and their stored name is returned so failures can clean it up.
async fn stage_item(
    storage: &Storage,
    payload: ItemPayload,
) -> ApiResult<(Option<NewItem>, Option<String>)> {
    if let Some(image) = payload.image {
        let stored_name = format!("{}{}", generate_id(), image.extension);
        storage.save(&stored_name, &image.data).await?;
        let item = NewItem::image(stored_name.clone(), image.original_filename);
        return Ok((Some(item), Some(stored_name)));
    }

    let item = payload
        .content
        .map(|text| NewItem::text(classify(&text), text));
    Ok((item, None))
}

async fn discard_upload(storage: &Storage, stored: Option<String>) {
    if let Some(name) = stored {
        if let Err(e) = storage.delete_file(&name).await {
            warn!("Failed to remove upload {}: {}", name, e);
        }
    }
}

/// Run a blocking store call off the async runtime.
async fn run_db<F, T>(db: &Arc<Database>, f: F) -> ApiResult<T>
where
    F: FnOnce(&Database) -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let db = db.clone();
    tokio::task::spawn_blocking(move || f(&db))
        .await
        .map_err(|e| anyhow::anyhow!("spawn_blocking join error: {}", e))?
        .map_err(ApiError::from)
}
