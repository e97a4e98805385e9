/**
 * Project Routes
 * Portfolio projects with list-valued tags and tools
 */
use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::Serialize;

use crate::db::models::{parse_string_list, NewProject, Project, ProjectPatch, ValidationError};
use crate::error::{ApiError, ApiResult};
use crate::media::{UploadBatch, PROJECT_FOLDER};
use crate::routes::auth::AdminSession;
use crate::routes::form::FormData;
use crate::routes::{parse_id, MessageResponse};
use crate::state::AppState;

const ENTITY: &str = "Project";

#[derive(Debug, Serialize)]
pub struct ProjectListResponse {
    pub success: bool,
    pub data: Vec<Project>,
}

#[derive(Debug, Serialize)]
pub struct ProjectResponse {
    pub data: Project,
}

fn counter(form: &FormData, field: &'static str) -> Result<Option<i64>, ValidationError> {
    form.string(field)
        .map(|raw| {
            raw.parse::<i64>()
                .map_err(|_| ValidationError::new(field, "must be a whole number"))
        })
        .transpose()
}

fn patch_from_form(form: &FormData) -> Result<ProjectPatch, ValidationError> {
    Ok(ProjectPatch {
        title: form.string("title"),
        category: form.string("category"),
        description: form.string("description"),
        image: None,
        tags: form.text("tags").map(parse_string_list),
        status: form.string("status"),
        likes: counter(form, "likes")?,
        views: counter(form, "views")?,
        year: form.string("year"),
        client: form.string("client"),
        duration: form.string("duration"),
        tools: form.text("tools").map(parse_string_list),
        color: form.string("color").filter(|c| !c.is_empty()),
        link: form.string("link"),
        github_url: form.string("githubUrl"),
        video_demo_url: form.string("videoDemoUrl"),
    })
}

/// GET /api/projects
pub async fn list_projects(State(state): State<AppState>) -> ApiResult<Json<ProjectListResponse>> {
    let data = state.store.projects.list().await?;
    Ok(Json(ProjectListResponse {
        success: true,
        data,
    }))
}

/// GET /api/projects/{id}
pub async fn get_project(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ProjectResponse>> {
    let id = parse_id(&id, ENTITY)?;
    let data = state
        .store
        .projects
        .get(id)
        .await?
        .ok_or(ApiError::NotFound(ENTITY))?;
    Ok(Json(ProjectResponse { data }))
}

/// POST /api/projects
pub async fn create_project(
    State(state): State<AppState>,
    AdminSession(admin): AdminSession,
    multipart: Multipart,
) -> ApiResult<(StatusCode, Json<Project>)> {
    let mut form = FormData::from_multipart(multipart).await?;

    let text = |name: &str| form.string(name).unwrap_or_default();
    let list = |name: &str| form.text(name).map(parse_string_list).unwrap_or_default();
    let mut new = NewProject {
        title: text("title"),
        category: text("category"),
        description: text("description"),
        image: String::new(),
        tags: list("tags"),
        status: text("status"),
        year: text("year"),
        client: text("client"),
        duration: text("duration"),
        tools: list("tools"),
        color: form.string("color"),
        link: text("link"),
        github_url: text("githubUrl"),
        video_demo_url: text("videoDemoUrl"),
    };
    new.validate_fields()?;
    let image = form.take_file("image");

    let mut batch = UploadBatch::new(state.media.clone());
    let result = async {
        if let Some(file) = image {
            new.image = batch.upload(file.into_image(PROJECT_FOLDER)).await?.url;
        }
        new.validate()?;
        Ok::<_, ApiError>(state.store.projects.insert(new.into_document(Utc::now())).await?)
    }
    .await;
    let project = batch.settle(result).await?;

    tracing::info!(id = %project.id, admin = %admin.email, "Project created");
    Ok((StatusCode::CREATED, Json(project)))
}

/// PUT /api/projects/{id}
pub async fn update_project(
    State(state): State<AppState>,
    AdminSession(_admin): AdminSession,
    Path(id): Path<String>,
    multipart: Multipart,
) -> ApiResult<Json<MessageResponse<Project>>> {
    let id = parse_id(&id, ENTITY)?;
    let mut project = state
        .store
        .projects
        .get(id)
        .await?
        .ok_or(ApiError::NotFound(ENTITY))?;

    let mut form = FormData::from_multipart(multipart).await?;
    let mut patch = patch_from_form(&form)?;
    patch.validate()?;
    let image = form.take_file("image");

    let mut batch = UploadBatch::new(state.media.clone());
    let result = async {
        if let Some(file) = image {
            patch.image = Some(batch.upload(file.into_image(PROJECT_FOLDER)).await?.url);
        }
        patch.apply(&mut project);
        state
            .store
            .projects
            .save(project)
            .await?
            .ok_or(ApiError::NotFound(ENTITY))
    }
    .await;
    let project = batch.settle(result).await?;

    tracing::info!(id = %project.id, "Project updated");
    Ok(Json(MessageResponse::updated(project)))
}

/// DELETE /api/projects/{id}
pub async fn delete_project(
    State(state): State<AppState>,
    AdminSession(_admin): AdminSession,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse<Project>>> {
    let id = parse_id(&id, ENTITY)?;
    let project = state
        .store
        .projects
        .delete(id)
        .await?
        .ok_or(ApiError::NotFound(ENTITY))?;

    tracing::info!(id = %project.id, "Project deleted");
    Ok(Json(MessageResponse::deleted(project)))
}
