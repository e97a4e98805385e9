/**
 * Video Slot Routes
 * Eight fixed slots addressed by number. Writes are upserts, and the slot's
 * orientation always follows from its number.
 */
use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use serde::Serialize;

use crate::db::models::{SlotId, SlotVideo, VideoSlot, VideoSlotUpdate};
use crate::error::{ApiError, ApiResult};
use crate::media::UploadBatch;
use crate::routes::auth::AdminSession;
use crate::routes::form::FormData;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct SlotResponse {
    pub success: bool,
    pub slot: VideoSlot,
}

fn parse_slot(raw: &str) -> Result<SlotId, ApiError> {
    raw.trim()
        .parse::<i64>()
        .ok()
        .and_then(SlotId::new)
        .ok_or_else(|| ApiError::BadRequest("slotId must be 1..8".to_string()))
}

/// GET /api/videos
pub async fn list_slots(State(state): State<AppState>) -> ApiResult<Json<Vec<VideoSlot>>> {
    Ok(Json(state.store.videos.list().await?))
}

/// PUT /api/admin/videos/{slotId}
/// Uploads land on deterministic ids (`slot_{n}`, `slot_{n}_thumb`) and
/// overwrite the slot's previous files.
pub async fn update_slot(
    State(state): State<AppState>,
    AdminSession(admin): AdminSession,
    Path(slot): Path<String>,
    multipart: Multipart,
) -> ApiResult<Json<SlotResponse>> {
    let slot = parse_slot(&slot)?;
    let mut form = FormData::from_multipart(multipart).await?;

    let mut update = VideoSlotUpdate {
        title: form.text("title").map(str::to_string),
        description: form.text("description").map(str::to_string),
        category: form.text("category").map(str::to_string),
        is_live: form.flag("isLive"),
        video: None,
        thumbnail_url: None,
    };
    let video = form.take_file("video");
    let thumbnail = form.take_file("thumbnail");

    let folder = state.video_folder.to_string();
    let mut batch = UploadBatch::new(state.media.clone());
    let result = async {
        if let Some(file) = video {
            let uploaded = batch
                .upload(
                    file.into_video(folder.as_str())
                        .with_public_id(format!("slot_{}", slot), true),
                )
                .await?;
            update.video = Some(SlotVideo {
                url: uploaded.url,
                video_type: uploaded
                    .format
                    .filter(|f| !f.is_empty())
                    .unwrap_or_else(|| "mp4".to_string()),
                duration_secs: uploaded.duration,
            });
        }
        if let Some(file) = thumbnail {
            let uploaded = batch
                .upload(
                    file.into_image(folder.as_str())
                        .with_public_id(format!("slot_{}_thumb", slot), true),
                )
                .await?;
            update.thumbnail_url = Some(uploaded.url);
        }
        Ok::<_, ApiError>(state.store.videos.upsert(slot, update).await?)
    }
    .await;
    let record = batch.settle(result).await?;

    tracing::info!(
        slot = record.slot_id.get(),
        orientation = record.orientation.as_str(),
        admin = %admin.email,
        "Video slot updated"
    );
    Ok(Json(SlotResponse {
        success: true,
        slot: record,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::test_support::{self, TestApp, TestFile};
    use axum::http::StatusCode;

    fn video_file() -> TestFile<'static> {
        TestFile {
            field: "video",
            file_name: "clip.mp4",
            content_type: "video/mp4",
            bytes: test_support::MP4,
        }
    }

    #[test]
    fn test_parse_slot() {
        assert_eq!(parse_slot("5").unwrap().get(), 5);
        assert!(parse_slot("0").is_err());
        assert!(parse_slot("9").is_err());
        assert!(parse_slot("one").is_err());
    }

    #[tokio::test]
    async fn test_upsert_creates_landscape_slot() {
        let app = TestApp::new().await;
        let req = test_support::multipart_request(
            "PUT",
            "/api/admin/videos/5",
            &[("title", "Showreel"), ("type", "portrait"), ("isLive", "true")],
            &[video_file()],
        );
        let (status, body) = app.send(app.authed(req)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        let slot = &body["slot"];
        assert_eq!(slot["slotId"], 5);
        assert_eq!(slot["type"], "landscape");
        assert_eq!(slot["views"], 0);
        assert_eq!(slot["isLive"], true);
        assert_eq!(slot["videoType"], "mp4");
        assert!(slot["videoUrl"].as_str().unwrap().ends_with("slot_5.mp4"));

        let slot5 = SlotId::new(5).unwrap();
        let stored = app.state.store.videos.get(slot5).await.unwrap().unwrap();
        assert_eq!(stored.title, "Showreel");
        assert!(app
            .state
            .store
            .videos
            .get(SlotId::new(6).unwrap())
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_second_upload_overwrites_same_asset() {
        let app = TestApp::new().await;
        for _ in 0..2 {
            let req = test_support::multipart_request(
                "PUT",
                "/api/admin/videos/2",
                &[],
                &[video_file()],
            );
            let (status, body) = app.send(app.authed(req)).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["slot"]["type"], "portrait");
        }
        let (_, list) = app.get("/api/videos").await;
        assert_eq!(list.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_out_of_range_slot_is_rejected() {
        let app = TestApp::new().await;
        for uri in ["/api/admin/videos/0", "/api/admin/videos/9", "/api/admin/videos/x"] {
            let req = test_support::multipart_request("PUT", uri, &[("title", "nope")], &[video_file()]);
            let (status, body) = app.send(app.authed(req)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body["message"], "slotId must be 1..8");
        }
        let (_, list) = app.get("/api/videos").await;
        assert!(list.as_array().unwrap().is_empty());
        assert!(!app.media_dir.path().join("videos").exists());
    }

    #[tokio::test]
    async fn test_anonymous_put_is_forbidden() {
        let app = TestApp::new().await;
        let req = test_support::multipart_request("PUT", "/api/admin/videos/1", &[("title", "x")], &[]);
        let (status, body) = app.send(req).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body, serde_json::json!({"error": "Forbidden"}));
        assert!(app.get("/api/videos").await.1.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_is_sorted_by_slot() {
        let app = TestApp::new().await;
        for n in [7, 3, 1] {
            let req = test_support::multipart_request(
                "PUT",
                &format!("/api/admin/videos/{}", n),
                &[("title", "t")],
                &[],
            );
            let (status, _) = app.send(app.authed(req)).await;
            assert_eq!(status, StatusCode::OK);
        }
        let (_, list) = app.get("/api/videos").await;
        let ids: Vec<i64> = list
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["slotId"].as_i64().unwrap())
            .collect();
        assert_eq!(ids, vec![1, 3, 7]);
    }
}
