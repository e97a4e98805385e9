/**
 * Client Project Routes
 * Client projects carry an embedded list of links; form keys of the shape
 * `projects.{i}.{field}` edit link `i` in place
 */
use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use regex::Regex;
use serde::Serialize;

use crate::db::models::{
    ClientProject, ClientProjectLink, ClientProjectPatch, LinkEdit, LinkField, NewClientProject,
};
use crate::error::{ApiError, ApiResult};
use crate::media::{UploadBatch, CLIENT_PROJECT_FOLDER};
use crate::routes::auth::AdminSession;
use crate::routes::form::FormData;
use crate::routes::{parse_id, MessageResponse};
use crate::state::AppState;

const ENTITY: &str = "Client project";

lazy_static::lazy_static! {
    static ref LINK_KEY: Regex =
        Regex::new(r"^projects\.(\d+)\.(instagramLink|thumbnailURL|youtubeLink)$").unwrap();
}

/// Translate form fields into a patch. Unknown keys are ignored.
fn patch_from_form(form: &FormData) -> Result<ClientProjectPatch, ApiError> {
    let mut patch = ClientProjectPatch::default();

    for (key, value) in form.fields() {
        let value = value.trim().to_string();
        match key {
            "company" => patch.company = Some(value),
            "name" => patch.name = Some(value),
            "testimonial" => patch.testimonial = Some(value),
            "workDid" => patch.work_did = Some(value),
            "instagramLink" | "youtubeLink" => {
                if let Some(field) = LinkField::from_key(key) {
                    patch.links.push(LinkEdit {
                        index: 0,
                        field,
                        value,
                    });
                }
            }
            _ => match LINK_KEY.captures(key) {
                Some(caps) => {
                    let index = caps[1]
                        .parse::<usize>()
                        .map_err(|_| ApiError::BadRequest(format!("Invalid link index in '{}'", key)))?;
                    if let Some(field) = LinkField::from_key(&caps[2]) {
                        patch.links.push(LinkEdit {
                            index,
                            field,
                            value,
                        });
                    }
                }
                None => tracing::debug!(field = key, "Ignoring unknown client project field"),
            },
        }
    }

    Ok(patch)
}

#[derive(Debug, Serialize)]
pub struct ClientProjectListResponse {
    pub data: Vec<ClientProject>,
}

/// GET /api/clientproject
pub async fn list_projects(
    State(state): State<AppState>,
) -> ApiResult<Json<ClientProjectListResponse>> {
    let data = state.store.client_projects.list().await?;
    Ok(Json(ClientProjectListResponse { data }))
}

/// GET /api/clientproject/{id}
pub async fn get_project(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ClientProject>> {
    let id = parse_id(&id, ENTITY)?;
    let project = state
        .store
        .client_projects
        .get(id)
        .await?
        .ok_or(ApiError::NotFound(ENTITY))?;
    Ok(Json(project))
}

/// POST /api/clientproject
pub async fn create_project(
    State(state): State<AppState>,
    AdminSession(admin): AdminSession,
    multipart: Multipart,
) -> ApiResult<(StatusCode, Json<ClientProject>)> {
    let mut form = FormData::from_multipart(multipart).await?;

    let mut new = NewClientProject {
        company: form.string("company").unwrap_or_default(),
        name: form.string("name").unwrap_or_default(),
        testimonial: form.string("testimonial").unwrap_or_default(),
        work_did: form.string("workDid").unwrap_or_default(),
        link: ClientProjectLink {
            instagram_link: form.string("instagramLink").unwrap_or_default(),
            thumbnail_url: String::new(),
            youtube_link: form.string("youtubeLink").unwrap_or_default(),
        },
    };
    new.validate()?;
    let thumbnail = form.take_file("thumbnail");

    let mut batch = UploadBatch::new(state.media.clone());
    let result = async {
        if let Some(file) = thumbnail {
            new.link.thumbnail_url = batch.upload(file.into_image(CLIENT_PROJECT_FOLDER)).await?.url;
        }
        Ok::<_, ApiError>(
            state
                .store
                .client_projects
                .insert(new.into_document(Utc::now()))
                .await?,
        )
    }
    .await;
    let project = batch.settle(result).await?;

    tracing::info!(id = %project.id, admin = %admin.email, "Client project created");
    Ok((StatusCode::CREATED, Json(project)))
}

/// PUT /api/clientproject/{id}
/// The `thumbnail` file replaces the first link's thumbnail.
pub async fn update_project(
    State(state): State<AppState>,
    AdminSession(_admin): AdminSession,
    Path(id): Path<String>,
    multipart: Multipart,
) -> ApiResult<Json<MessageResponse<ClientProject>>> {
    let id = parse_id(&id, ENTITY)?;
    let mut project = state
        .store
        .client_projects
        .get(id)
        .await?
        .ok_or(ApiError::NotFound(ENTITY))?;

    let mut form = FormData::from_multipart(multipart).await?;
    let mut patch = patch_from_form(&form)?;
    patch.validate()?;
    let thumbnail = form.take_file("thumbnail");

    let mut batch = UploadBatch::new(state.media.clone());
    let result = async {
        if let Some(file) = thumbnail {
            let url = batch.upload(file.into_image(CLIENT_PROJECT_FOLDER)).await?.url;
            patch.links.push(LinkEdit {
                index: 0,
                field: LinkField::Thumbnail,
                value: url,
            });
        }
        patch.apply(&mut project)?;
        state
            .store
            .client_projects
            .save(project)
            .await?
            .ok_or(ApiError::NotFound(ENTITY))
    }
    .await;
    let project = batch.settle(result).await?;

    tracing::info!(id = %project.id, "Client project updated");
    Ok(Json(MessageResponse::updated(project)))
}

/// DELETE /api/clientproject/{id}
pub async fn delete_project(
    State(state): State<AppState>,
    AdminSession(_admin): AdminSession,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse<ClientProject>>> {
    let id = parse_id(&id, ENTITY)?;
    let project = state
        .store
        .client_projects
        .delete(id)
        .await?
        .ok_or(ApiError::NotFound(ENTITY))?;

    tracing::info!(id = %project.id, "Client project deleted");
    Ok(Json(MessageResponse::deleted(project)))
}
