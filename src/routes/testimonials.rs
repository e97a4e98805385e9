/**
 * Testimonial Routes
 */
use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::Serialize;

use crate::db::models::{NewTestimonial, Testimonial, TestimonialPatch};
use crate::error::{ApiError, ApiResult};
use crate::media::{UploadBatch, TESTIMONIAL_FOLDER};
use crate::routes::auth::AdminSession;
use crate::routes::form::FormData;
use crate::routes::{parse_id, MessageResponse};
use crate::state::AppState;

const ENTITY: &str = "Testimonial";

#[derive(Debug, Serialize)]
pub struct TestimonialListResponse {
    pub testimonials: Vec<Testimonial>,
}

/// GET /api/testimonial
pub async fn list_testimonials(
    State(state): State<AppState>,
) -> ApiResult<Json<TestimonialListResponse>> {
    let testimonials = state.store.testimonials.list().await?;
    Ok(Json(TestimonialListResponse { testimonials }))
}

/// POST /api/testimonial
pub async fn create_testimonial(
    State(state): State<AppState>,
    AdminSession(_admin): AdminSession,
    multipart: Multipart,
) -> ApiResult<(StatusCode, Json<MessageResponse<Testimonial>>)> {
    let mut form = FormData::from_multipart(multipart).await?;

    let mut new = NewTestimonial {
        user_name: form.string("userName").unwrap_or_default(),
        designation: form.string("designation").unwrap_or_default(),
        headline: form.string("headline").unwrap_or_default(),
        description: form.string("description").unwrap_or_default(),
        profile_picture_url: String::new(),
    };
    new.validate_fields()?;
    let image = form.take_file("image");

    let mut batch = UploadBatch::new(state.media.clone());
    let result = async {
        if let Some(file) = image {
            new.profile_picture_url = batch.upload(file.into_image(TESTIMONIAL_FOLDER)).await?.url;
        }
        new.validate()?;
        Ok::<_, ApiError>(
            state
                .store
                .testimonials
                .insert(new.into_document(Utc::now()))
                .await?,
        )
    }
    .await;
    let testimonial = batch.settle(result).await?;

    tracing::info!(id = %testimonial.id, "Testimonial created");
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new(
            "Testimonial submitted successfully.",
            testimonial,
        )),
    ))
}

/// PATCH /api/testimonial/{id}
/// Only the fields present in the JSON body change.
pub async fn update_testimonial(
    State(state): State<AppState>,
    AdminSession(_admin): AdminSession,
    Path(id): Path<String>,
    Json(patch): Json<TestimonialPatch>,
) -> ApiResult<Json<MessageResponse<Testimonial>>> {
    let id = parse_id(&id, ENTITY)?;
    patch.validate()?;

    let mut testimonial = state
        .store
        .testimonials
        .get(id)
        .await?
        .ok_or(ApiError::NotFound(ENTITY))?;
    patch.apply(&mut testimonial);

    let testimonial = state
        .store
        .testimonials
        .save(testimonial)
        .await?
        .ok_or(ApiError::NotFound(ENTITY))?;

    tracing::info!(id = %testimonial.id, "Testimonial updated");
    Ok(Json(MessageResponse::updated(testimonial)))
}

/// DELETE /api/testimonial/{id}
pub async fn delete_testimonial(
    State(state): State<AppState>,
    AdminSession(_admin): AdminSession,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse<Testimonial>>> {
    let id = parse_id(&id, ENTITY)?;
    let testimonial = state
        .store
        .testimonials
        .delete(id)
        .await?
        .ok_or(ApiError::NotFound(ENTITY))?;

    tracing::info!(id = %testimonial.id, "Testimonial deleted");
    Ok(Json(MessageResponse::deleted(testimonial)))
}
