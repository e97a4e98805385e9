/**
 * Blog Routes
 * CRUD API endpoints for blog posts
 */
use axum::{
    extract::{FromRequest, Multipart, Path, Request, State},
    http::{header::CONTENT_TYPE, StatusCode},
    Json,
};
use chrono::Utc;
use serde::Serialize;

use crate::db::models::{BlogPatch, BlogPost, NewBlogPost};
use crate::error::{ApiError, ApiResult};
use crate::media::{UploadBatch, BLOG_FOLDER};
use crate::routes::auth::AdminSession;
use crate::routes::form::{FilePart, FormData};
use crate::routes::{parse_id, MessageResponse};
use crate::state::AppState;

const IMAGE_FIELDS: &[&str] = &["image", "imageFile"];

const ENTITY: &str = "Blog post";

/// Sanitize HTML content using ammonia
fn sanitize_html(html: &str) -> String {
    ammonia::clean(html)
}

fn is_multipart(req: &Request) -> bool {
    req.headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("multipart/form-data"))
}

/// Read a PATCH body sent either as a multipart form or as JSON.
async fn read_patch(req: Request, state: &AppState) -> Result<(BlogPatch, Option<FilePart>), ApiError> {
    if is_multipart(&req) {
        let multipart = Multipart::from_request(req, state)
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;
        let mut form = FormData::from_multipart(multipart).await?;
        let patch = BlogPatch {
            title: form.string("title"),
            content: form.text("content").map(str::to_string),
            category: form.string("category"),
            image_url: None,
        };
        let file = form.take_file_any(IMAGE_FIELDS);
        Ok((patch, file))
    } else {
        let Json(patch) = Json::<BlogPatch>::from_request(req, state)
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;
        Ok((patch, None))
    }
}

/// Listing envelope read by the admin dashboard as `response`.
#[derive(Debug, Serialize)]
pub struct BlogListResponse {
    pub response: Vec<BlogPost>,
}

/// GET /api/blog
pub async fn list_posts(State(state): State<AppState>) -> ApiResult<Json<BlogListResponse>> {
    let response = state.store.blog.list().await?;
    Ok(Json(BlogListResponse { response }))
}

/// GET /api/blog/{id}
pub async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<BlogPost>> {
    let id = parse_id(&id, ENTITY)?;
    let post = state
        .store
        .blog
        .get(id)
        .await?
        .ok_or(ApiError::NotFound(ENTITY))?;
    Ok(Json(post))
}

/// POST /api/blog
pub async fn create_post(
    State(state): State<AppState>,
    AdminSession(admin): AdminSession,
    multipart: Multipart,
) -> ApiResult<(StatusCode, Json<BlogPost>)> {
    let mut form = FormData::from_multipart(multipart).await?;

    let mut new = NewBlogPost {
        title: form.string("title").unwrap_or_default(),
        content: sanitize_html(form.text("content").unwrap_or_default()),
        category: form.string("category").unwrap_or_default(),
        image_url: String::new(),
    };
    new.validate()?;
    let file = form.take_file_any(IMAGE_FIELDS);

    let mut batch = UploadBatch::new(state.media.clone());
    let result = async {
        if let Some(file) = file {
            new.image_url = batch.upload(file.into_image(BLOG_FOLDER)).await?.url;
        }
        Ok::<_, ApiError>(state.store.blog.insert(new.into_document(Utc::now())).await?)
    }
    .await;
    let post = batch.settle(result).await?;

    tracing::info!(id = %post.id, admin = %admin.email, "Blog post created");
    Ok((StatusCode::CREATED, Json(post)))
}

/// PATCH /api/blog/{id}
pub async fn update_post(
    State(state): State<AppState>,
    AdminSession(_admin): AdminSession,
    Path(id): Path<String>,
    req: Request,
) -> ApiResult<Json<MessageResponse<BlogPost>>> {
    let id = parse_id(&id, ENTITY)?;
    let mut post = state
        .store
        .blog
        .get(id)
        .await?
        .ok_or(ApiError::NotFound(ENTITY))?;

    let (mut patch, file) = read_patch(req, &state).await?;
    patch.content = patch.content.as_deref().map(sanitize_html);
    patch.validate()?;

    let mut batch = UploadBatch::new(state.media.clone());
    let result = async {
        if let Some(file) = file {
            patch.image_url = Some(batch.upload(file.into_image(BLOG_FOLDER)).await?.url);
        }
        patch.apply(&mut post);
        state
            .store
            .blog
            .save(post)
            .await?
            .ok_or(ApiError::NotFound(ENTITY))
    }
    .await;
    let post = batch.settle(result).await?;

    tracing::info!(id = %post.id, "Blog post updated");
    Ok(Json(MessageResponse::updated(post)))
}

/// DELETE /api/blog/{id}
pub async fn delete_post(
    State(state): State<AppState>,
    AdminSession(_admin): AdminSession,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse<BlogPost>>> {
    let id = parse_id(&id, ENTITY)?;
    let post = state
        .store
        .blog
        .delete(id)
        .await?
        .ok_or(ApiError::NotFound(ENTITY))?;

    tracing::info!(id = %post.id, "Blog post deleted");
    Ok(Json(MessageResponse::deleted(post)))
}
