pub mod error;
pub mod health;
pub mod payload;
pub mod rooms;
pub mod storage;

use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
};
use tower_http::services::ServeDir;

use copycloud_db::Database;

use crate::storage::{MAX_UPLOAD_BYTES, Storage};

/// Headroom on top of the image limit for multipart boundaries and text fields.
const BODY_OVERHEAD_BYTES: usize = 64 * 1024;

/// Shared application state for all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub storage: Arc<Storage>,
}

/// Room API plus static serving of uploads. CORS and tracing layers are added by the binary.
pub fn router(state: AppState) -> Router {
    let uploads = ServeDir::new(state.storage.dir());

    Router::new()
        .route("/api/rooms", post(rooms::create_room))
        .route("/api/rooms/{code}", get(rooms::get_room))
        .route("/api/rooms/{code}/items", post(rooms::append_item))
        .route("/api/rooms/{code}/items/{item_id}", delete(rooms::delete_item))
        .route("/api/health", get(health::health))
        .nest_service("/uploads", uploads)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES + BODY_OVERHEAD_BYTES))
        .with_state(state)
}
