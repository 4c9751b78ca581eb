// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 TheHFPV

//! Image upload endpoint.
//!
//! Authenticated users post a multipart `image` field; the file lands under
//! the data root and is served publicly at `/uploads/<name>`. Names are
//! freshly minted UUIDs, the original filename only contributes its
//! extension.

use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    audit_log,
    auth::Auth,
    error::ApiError,
    state::AppState,
    storage::AuditEventType,
};

/// Upload size cap (5 MiB, matching the front-end's limit).
const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Accepted image extensions.
const ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp"];

/// Response after a successful upload.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub message: String,
    /// Public URL of the stored image.
    pub image_url: String,
}

/// Validated lowercase extension from the client-supplied filename.
fn image_extension(file_name: Option<&str>) -> Option<String> {
    let (_, extension) = file_name?.rsplit_once('.')?;
    let extension = extension.to_ascii_lowercase();
    ALLOWED_EXTENSIONS
        .contains(&extension.as_str())
        .then_some(extension)
}

/// Store an uploaded image and return its public URL.
#[utoipa::path(
    post,
    path = "/upload/image",
    tag = "Uploads",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Image stored", body = UploadResponse),
        (status = 400, description = "Missing, oversized or unsupported image"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn upload_image(
    Auth(user): Auth,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| ApiError::bad_request("Invalid multipart payload"))?
    {
        if field.name() != Some("image") {
            continue;
        }

        let extension = image_extension(field.file_name())
            .ok_or_else(|| ApiError::bad_request("Unsupported image type"))?;

        let data = field
            .bytes()
            .await
            .map_err(|_| ApiError::bad_request("Failed to read upload"))?;
        if data.is_empty() {
            return Err(ApiError::bad_request("Empty upload"));
        }
        if data.len() > MAX_UPLOAD_BYTES {
            return Err(ApiError::bad_request("Image exceeds the 5 MiB limit"));
        }

        let file_name = format!("{}.{extension}", uuid::Uuid::new_v4());
        state
            .storage()
            .write_raw(state.storage().paths().upload(&file_name), &data)?;

        audit_log!(
            state.storage(),
            AuditEventType::ImageUploaded,
            &user.email,
            file_name.clone()
        );

        return Ok(Json(UploadResponse {
            message: "Image uploaded successfully".to_string(),
            image_url: format!("/uploads/{file_name}"),
        }));
    }

    Err(ApiError::bad_request("Missing image field"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_validation() {
        assert_eq!(image_extension(Some("photo.PNG")).as_deref(), Some("png"));
        assert_eq!(image_extension(Some("a.b.jpeg")).as_deref(), Some("jpeg"));
        assert_eq!(image_extension(Some("script.exe")), None);
        assert_eq!(image_extension(Some("no-extension")), None);
        assert_eq!(image_extension(None), None);
    }
}
