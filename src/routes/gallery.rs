/**
 * Gallery Routes
 * Public listing plus admin create/update/delete of gallery images
 */
use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::Serialize;

use crate::db::models::{GalleryItem, GalleryPatch, NewGalleryItem};
use crate::error::{ApiError, ApiResult};
use crate::media::{UploadBatch, GALLERY_FOLDER};
use crate::routes::auth::AdminSession;
use crate::routes::form::FormData;
use crate::routes::{parse_id, MessageResponse};
use crate::state::AppState;

/// Accepted names for the image file part.
const IMAGE_FIELDS: &[&str] = &["image", "file"];

const ENTITY: &str = "Gallery item";

#[derive(Debug, Serialize)]
pub struct GalleryListResponse {
    pub gallery: Vec<GalleryItem>,
}

/// GET /api/gallery
pub async fn list_items(State(state): State<AppState>) -> ApiResult<Json<GalleryListResponse>> {
    let gallery = state.store.gallery.list().await?;
    Ok(Json(GalleryListResponse { gallery }))
}

/// POST /api/gallery
pub async fn create_item(
    State(state): State<AppState>,
    AdminSession(admin): AdminSession,
    multipart: Multipart,
) -> ApiResult<(StatusCode, Json<GalleryItem>)> {
    let mut form = FormData::from_multipart(multipart).await?;

    let mut new = NewGalleryItem {
        title: form.string("title").unwrap_or_default(),
        description: form.string("description").unwrap_or_default(),
        category: form.string("category").unwrap_or_default(),
        image_url: String::new(),
    };
    new.validate_fields()?;
    let file = form.take_file_any(IMAGE_FIELDS);

    let mut batch = UploadBatch::new(state.media.clone());
    let result = async {
        if let Some(file) = file {
            new.image_url = batch.upload(file.into_image(GALLERY_FOLDER)).await?.url;
        }
        new.validate()?;
        Ok::<_, ApiError>(state.store.gallery.insert(new.into_document(Utc::now())).await?)
    }
    .await;
    let item = batch.settle(result).await?;

    tracing::info!(id = %item.id, admin = %admin.email, "Gallery item created");
    Ok((StatusCode::CREATED, Json(item)))
}

/// PATCH /api/gallery/{id}
/// A missing image part keeps the current image.
pub async fn update_item(
    State(state): State<AppState>,
    AdminSession(_admin): AdminSession,
    Path(id): Path<String>,
    multipart: Multipart,
) -> ApiResult<Json<MessageResponse<GalleryItem>>> {
    let id = parse_id(&id, ENTITY)?;
    let mut item = state
        .store
        .gallery
        .get(id)
        .await?
        .ok_or(ApiError::NotFound(ENTITY))?;

    let mut form = FormData::from_multipart(multipart).await?;
    let mut patch = GalleryPatch {
        title: form.string("title"),
        description: form.string("description"),
        category: form.string("category"),
        image_url: None,
    };
    patch.validate()?;
    let file = form.take_file_any(IMAGE_FIELDS);

    let mut batch = UploadBatch::new(state.media.clone());
    let result = async {
        if let Some(file) = file {
            patch.image_url = Some(batch.upload(file.into_image(GALLERY_FOLDER)).await?.url);
        }
        patch.apply(&mut item);
        state
            .store
            .gallery
            .save(item)
            .await?
            .ok_or(ApiError::NotFound(ENTITY))
    }
    .await;
    let item = batch.settle(result).await?;

    tracing::info!(id = %item.id, "Gallery item updated");
    Ok(Json(MessageResponse::updated(item)))
}

/// DELETE /api/gallery/{id}
pub async fn delete_item(
    State(state): State<AppState>,
    AdminSession(_admin): AdminSession,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse<GalleryItem>>> {
    let id = parse_id(&id, ENTITY)?;
    let item = state
        .store
        .gallery
        .delete(id)
        .await?
        .ok_or(ApiError::NotFound(ENTITY))?;

    tracing::info!(id = %item.id, "Gallery item deleted");
    Ok(Json(MessageResponse::deleted(item)))
}
