use axum::{
    Form, Json,
    extract::{FromRequest, Multipart, Request, multipart::MultipartError},
    http::{StatusCode, header::CONTENT_TYPE},
};
use bytes::Bytes;
use serde::Deserialize;
use tracing::debug;

use crate::error::ApiError;
use crate::storage::{MAX_UPLOAD_BYTES, image_extension};

/// Body of a room creation or item append.
///
/// Accepted as JSON, urlencoded form, or multipart (the only way to send an
/// image). A missing or unrecognised content type yields an empty payload.
#[derive(Debug, Default)]
pub struct ItemPayload {
    pub content: Option<String>,
    pub secure: bool,
    pub image: Option<ImageUpload>,
}

#[derive(Debug)]
pub struct ImageUpload {
    pub original_filename: String,
    /// Extension including the dot, e.g. `.png`
    pub extension: String,
    pub data: Bytes,
}

impl ItemPayload {
    pub fn is_empty(&self) -> bool {
        self.content.is_none() && self.image.is_none()
    }
}

#[derive(Debug, Default, Deserialize)]
struct Fields {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    secure: Option<SecureFlag>,
}

/// Browsers send `"true"`, JSON clients send `true`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SecureFlag {
    Bool(bool),
    Text(String),
}

impl SecureFlag {
    fn is_set(&self) -> bool {
        match self {
            SecureFlag::Bool(b) => *b,
            SecureFlag::Text(s) => s == "true",
        }
    }
}

impl From<Fields> for ItemPayload {
    fn from(fields: Fields) -> Self {
        ItemPayload {
            content: fields.content,
            secure: fields.secure.is_some_and(|f| f.is_set()),
            image: None,
        }
    }
}

impl<S> FromRequest<S> for ItemPayload
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        let mut payload = if content_type.starts_with("multipart/form-data") {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| rejection(e.status(), e.body_text()))?;
            read_multipart(multipart).await?
        } else if content_type.starts_with("application/json") {
            let Json(fields) = Json::<Fields>::from_request(req, state)
                .await
                .map_err(|e| rejection(e.status(), e.body_text()))?;
            fields.into()
        } else if content_type.starts_with("application/x-www-form-urlencoded") {
            let Form(fields) = Form::<Fields>::from_request(req, state)
                .await
                .map_err(|e| rejection(e.status(), e.body_text()))?;
            fields.into()
        } else {
            ItemPayload::default()
        };

        // An empty string is the same as no content at all
        if payload.content.as_deref() == Some("") {
            payload.content = None;
        }

        Ok(payload)
    }
}

async fn read_multipart(mut multipart: Multipart) -> Result<ItemPayload, ApiError> {
    let mut payload = ItemPayload::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "content" => {
                payload.content = Some(field.text().await.map_err(multipart_error)?);
            }
            "secure" => {
                payload.secure = field.text().await.map_err(multipart_error)? == "true";
            }
            "image" => {
                let original_filename = field.file_name().unwrap_or("").to_string();
                let data = field.bytes().await.map_err(multipart_error)?;

                // Forms submit an empty file part when nothing was picked
                if original_filename.is_empty() && data.is_empty() {
                    continue;
                }

                if data.len() > MAX_UPLOAD_BYTES {
                    return Err(too_large());
                }

                let extension = image_extension(&original_filename)
                    .ok_or_else(|| ApiError::BadRequest("Only image files are allowed".into()))?
                    .to_string();

                payload.image = Some(ImageUpload {
                    original_filename,
                    extension,
                    data,
                });
            }
            _ => {
                debug!("Ignoring unknown multipart field: {}", field_name);
            }
        }
    }

    Ok(payload)
}

fn too_large() -> ApiError {
    ApiError::PayloadTooLarge {
        limit_mb: MAX_UPLOAD_BYTES / 1024 / 1024,
    }
}

fn rejection(status: StatusCode, text: String) -> ApiError {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        too_large()
    } else {
        ApiError::BadRequest(text)
    }
}

fn multipart_error(e: MultipartError) -> ApiError {
    rejection(e.status(), e.body_text())
}
