//! Citizen photo uploads: multipart handling and storage under the public
//! uploads directory.

use std::path::{Path, PathBuf};

use actix_web::{web, HttpResponse, Responder};
use futures_util::StreamExt;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{AppState, ErrorResponse};

#[derive(Debug, Serialize, ToSchema)]
pub struct UploadResponse {
    pub url: String,
}

/// Persist the first file field of a multipart payload under a unique name.
/// Returns the stored filename.
pub async fn save_photo(
    mut payload: actix_multipart::Multipart,
    uploads_dir: &Path,
) -> Result<String, String> {
    let mut field = payload
        .next()
        .await
        .ok_or("Multipart payload is empty")?
        .map_err(|e| e.to_string())?;

    let original_filename = field
        .content_disposition()
        .and_then(|cd| cd.get_filename())
        .ok_or("File name not found in Content-Disposition")?
        .to_string();

    // Keep only the sanitized extension; the name itself is a fresh UUID.
    let extension = PathBuf::from(sanitize_filename::sanitize(&original_filename))
        .extension()
        .and_then(|e| e.to_str().map(|e| format!(".{e}")))
        .unwrap_or_default();
    let stored_filename = format!("{}{}", Uuid::new_v4(), extension);

    let mut data = Vec::new();
    while let Some(chunk) = field.next().await {
        let chunk = chunk.map_err(|e| e.to_string())?;
        data.extend_from_slice(&chunk);
    }

    tokio::fs::create_dir_all(uploads_dir)
        .await
        .map_err(|e| e.to_string())?;
    tokio::fs::write(uploads_dir.join(&stored_filename), data)
        .await
        .map_err(|e| e.to_string())?;

    Ok(stored_filename)
}

#[utoipa::path(
    post,
    path = "/api/uploads/photo",
    tag = "Uploads",
    responses(
        (status = 200, description = "Photo stored", body = UploadResponse),
        (status = 400, description = "Invalid multipart payload", body = ErrorResponse)
    )
)]
pub async fn upload_photo(
    state: web::Data<AppState>,
    payload: actix_multipart::Multipart,
) -> impl Responder {
    match save_photo(payload, &state.config.uploads_dir).await {
        Ok(filename) => {
            let url = format!(
                "{}/uploads/{}",
                state.config.public_base_url.trim_end_matches('/'),
                filename
            );
            HttpResponse::Ok().json(UploadResponse { url })
        }
        Err(e) => {
            log::error!("photo upload failed: {e}");
            HttpResponse::BadRequest().json(ErrorResponse::bad_request(&e))
        }
    }
}
