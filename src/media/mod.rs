//! Media hosting: where uploaded images and videos end up.
//!
//! Handlers never talk to a host directly. They go through an
//! [`UploadBatch`], which validates each file, remembers what was uploaded
//! and destroys those assets again when the following database write fails.

pub mod cloudinary;
pub mod local;

pub use cloudinary::CloudinaryHost;
pub use local::LocalDiskHost;

use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use thiserror::Error;

// Folder per collection
pub const GALLERY_FOLDER: &str = "gallery";
pub const BLOG_FOLDER: &str = "blog";
pub const CLIENT_PROJECT_FOLDER: &str = "clientprojects";
pub const TESTIMONIAL_FOLDER: &str = "testimonials";
pub const PROJECT_FOLDER: &str = "projects";

#[derive(Debug, Error)]
pub enum MediaError {
    /// The file itself is unacceptable (empty, wrong type).
    #[error("{0}")]
    Rejected(String),

    #[error("media host request failed: {0}")]
    Upstream(String),

    #[error("media storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
        }
    }
}

#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub bytes: Bytes,
    pub kind: MediaKind,
    pub content_type: Option<String>,
    pub file_name: Option<String>,
    pub folder: String,
    /// Deterministic key inside `folder`; a random one is generated if absent.
    pub public_id: Option<String>,
    /// Replace an existing asset with the same key instead of failing.
    pub overwrite: bool,
}

impl UploadRequest {
    pub fn image(bytes: Bytes, folder: impl Into<String>) -> Self {
        Self {
            bytes,
            kind: MediaKind::Image,
            content_type: None,
            file_name: None,
            folder: folder.into(),
            public_id: None,
            overwrite: false,
        }
    }

    pub fn video(bytes: Bytes, folder: impl Into<String>) -> Self {
        Self {
            kind: MediaKind::Video,
            ..Self::image(bytes, folder)
        }
    }

    pub fn with_public_id(mut self, public_id: impl Into<String>, overwrite: bool) -> Self {
        self.public_id = Some(public_id.into());
        self.overwrite = overwrite;
        self
    }

    pub fn with_file_info(mut self, file_name: Option<String>, content_type: Option<String>) -> Self {
        self.file_name = file_name;
        self.content_type = content_type;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UploadedMedia {
    pub url: String,
    pub public_id: String,
    pub kind: MediaKind,
    /// Seconds, reported for video only.
    pub duration: Option<f64>,
    /// Container or image format, e.g. `mp4` or `png`.
    pub format: Option<String>,
    pub overwrite: bool,
}

#[async_trait]
pub trait MediaHost: Send + Sync {
    fn name(&self) -> &'static str;

    async fn upload(&self, request: UploadRequest) -> Result<UploadedMedia, MediaError>;

    async fn destroy(&self, media: &UploadedMedia) -> Result<(), MediaError>;
}

// ============================================================================
// Content checks
// ============================================================================

/// Detect an image MIME type from its leading bytes.
pub fn sniff_image(bytes: &[u8]) -> Option<&'static str> {
    match bytes {
        [0xFF, 0xD8, 0xFF, ..] => Some("image/jpeg"),
        [0x89, 0x50, 0x4E, 0x47, ..] => Some("image/png"),
        [0x47, 0x49, 0x46, 0x38, ..] => Some("image/gif"),
        [0x52, 0x49, 0x46, 0x46, _, _, _, _, 0x57, 0x45, 0x42, 0x50, ..] => Some("image/webp"),
        _ => None,
    }
}

/// Detect a video container from its leading bytes, returning its extension.
pub fn sniff_video(bytes: &[u8]) -> Option<&'static str> {
    match bytes {
        [_, _, _, _, b'f', b't', b'y', b'p', b'q', b't', ..] => Some("mov"),
        [_, _, _, _, b'f', b't', b'y', b'p', ..] => Some("mp4"),
        [0x1A, 0x45, 0xDF, 0xA3, ..] => Some("webm"),
        _ => None,
    }
}

pub fn extension_from_mime(mime: &str) -> &'static str {
    match mime {
        "image/jpeg" => "jpg",
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "video/mp4" => "mp4",
        "video/quicktime" => "mov",
        "video/webm" => "webm",
        _ => "bin",
    }
}

/// Reject files a host should never receive.
pub fn check_upload(request: &UploadRequest) -> Result<(), MediaError> {
    if request.bytes.is_empty() {
        return Err(MediaError::Rejected("Uploaded file is empty".to_string()));
    }
    match request.kind {
        MediaKind::Image if sniff_image(&request.bytes).is_none() => Err(MediaError::Rejected(
            "Unsupported image type. Allowed: JPEG, PNG, WebP, GIF.".to_string(),
        )),
        MediaKind::Video
            if sniff_video(&request.bytes).is_none()
                && !request
                    .content_type
                    .as_deref()
                    .is_some_and(|ct| ct.starts_with("video/")) =>
        {
            Err(MediaError::Rejected(
                "Unsupported video type. Allowed: MP4, MOV, WebM.".to_string(),
            ))
        }
        _ => Ok(()),
    }
}

/// File extension for an accepted upload.
pub fn extension_for(request: &UploadRequest) -> String {
    let sniffed = match request.kind {
        MediaKind::Image => sniff_image(&request.bytes).map(extension_from_mime),
        MediaKind::Video => sniff_video(&request.bytes),
    };
    if let Some(ext) = sniffed {
        return ext.to_string();
    }
    let from_name = request
        .file_name
        .as_deref()
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()));
    from_name.unwrap_or_else(|| match request.kind {
        MediaKind::Image => "bin".to_string(),
        MediaKind::Video => "mp4".to_string(),
    })
}

// ============================================================================
// Upload batch
// ============================================================================

/// Uploads made on behalf of one mutation.
pub struct UploadBatch {
    host: Arc<dyn MediaHost>,
    uploaded: Vec<UploadedMedia>,
}

impl UploadBatch {
    pub fn new(host: Arc<dyn MediaHost>) -> Self {
        Self {
            host,
            uploaded: Vec::new(),
        }
    }

    pub async fn upload(&mut self, request: UploadRequest) -> Result<UploadedMedia, MediaError> {
        check_upload(&request)?;
        let folder = request.folder.clone();
        let media = self.host.upload(request).await.map_err(|e| {
            tracing::error!(host = self.host.name(), folder = %folder, "Upload failed: {}", e);
            e
        })?;
        tracing::info!(
            host = self.host.name(),
            kind = media.kind.as_str(),
            public_id = %media.public_id,
            "Media uploaded"
        );
        self.uploaded.push(media.clone());
        Ok(media)
    }

    /// Destroy every asset this batch created. Overwrite-in-place assets are
    /// left alone: the previous version is already gone.
    pub async fn rollback(self) {
        for media in self.uploaded.iter().filter(|m| !m.overwrite) {
            match self.host.destroy(media).await {
                Ok(()) => tracing::warn!(public_id = %media.public_id, "Rolled back orphaned upload"),
                Err(e) => tracing::error!(
                    public_id = %media.public_id,
                    "Failed to roll back orphaned upload: {}",
                    e
                ),
            }
        }
    }

    /// Finish the unit of work: keep the uploads on success, roll back on error.
    pub async fn settle<T, E>(self, result: Result<T, E>) -> Result<T, E> {
        if result.is_err() && !self.uploaded.is_empty() {
            self.rollback().await;
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::Mutex;

    const PNG: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
    const MP4: &[u8] = &[0, 0, 0, 0x18, b'f', b't', b'y', b'p', b'i', b's', b'o', b'm'];

    #[derive(Default)]
    struct RecordingHost {
        destroyed: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl MediaHost for RecordingHost {
        fn name(&self) -> &'static str {
            "recording"
        }

        async fn upload(&self, request: UploadRequest) -> Result<UploadedMedia, MediaError> {
            let public_id = request
                .public_id
                .clone()
                .unwrap_or_else(|| format!("{}/{}", request.folder, uuid::Uuid::new_v4()));
            Ok(UploadedMedia {
                url: format!("https://media.test/{}", public_id),
                public_id,
                kind: request.kind,
                duration: None,
                format: None,
                overwrite: request.overwrite,
            })
        }

        async fn destroy(&self, media: &UploadedMedia) -> Result<(), MediaError> {
            self.destroyed.lock().await.push(media.public_id.clone());
            Ok(())
        }
    }

    #[test]
    fn test_sniff_image_formats() {
        assert_eq!(sniff_image(&[0xFF, 0xD8, 0xFF, 0xE0]), Some("image/jpeg"));
        assert_eq!(sniff_image(PNG), Some("image/png"));
        assert_eq!(sniff_image(b"GIF89a"), Some("image/gif"));
        assert_eq!(sniff_image(b"RIFF\0\0\0\0WEBPVP8 "), Some("image/webp"));
        assert_eq!(sniff_image(b"<svg></svg>"), None);
        assert_eq!(sniff_image(&[0xFF]), None);
    }

    #[test]
    fn test_sniff_video_containers() {
        assert_eq!(sniff_video(MP4), Some("mp4"));
        assert_eq!(sniff_video(b"\0\0\0\x14ftypqt  "), Some("mov"));
        assert_eq!(sniff_video(&[0x1A, 0x45, 0xDF, 0xA3, 0x01]), Some("webm"));
        assert_eq!(sniff_video(b"not a video"), None);
    }

    #[test]
    fn test_check_upload_rejects_empty_and_unknown() {
        let empty = UploadRequest::image(Bytes::new(), GALLERY_FOLDER);
        assert!(matches!(check_upload(&empty), Err(MediaError::Rejected(_))));

        let text = UploadRequest::image(Bytes::from_static(b"hello world"), GALLERY_FOLDER);
        assert!(matches!(check_upload(&text), Err(MediaError::Rejected(_))));

        let png = UploadRequest::image(Bytes::from_static(PNG), GALLERY_FOLDER);
        assert!(check_upload(&png).is_ok());
    }

    #[test]
    fn test_video_accepted_by_content_type() {
        let req = UploadRequest::video(Bytes::from_static(b"opaque"), "videos/slots")
            .with_file_info(Some("clip.avi".to_string()), Some("video/x-msvideo".to_string()));
        assert!(check_upload(&req).is_ok());
        assert_eq!(extension_for(&req), "avi");
    }

    #[tokio::test]
    async fn test_settle_rolls_back_on_error() {
        let host = Arc::new(RecordingHost::default());
        let mut batch = UploadBatch::new(host.clone());
        let media = batch
            .upload(UploadRequest::image(Bytes::from_static(PNG), BLOG_FOLDER))
            .await
            .unwrap();

        let result: Result<(), &str> = batch.settle(Err("insert failed")).await;
        assert!(result.is_err());
        assert_eq!(*host.destroyed.lock().await, vec![media.public_id]);
    }

    #[tokio::test]
    async fn test_settle_keeps_uploads_on_success() {
        let host = Arc::new(RecordingHost::default());
        let mut batch = UploadBatch::new(host.clone());
        batch
            .upload(UploadRequest::image(Bytes::from_static(PNG), BLOG_FOLDER))
            .await
            .unwrap();

        let result: Result<u8, &str> = batch.settle(Ok(1)).await;
        assert_eq!(result, Ok(1));
        assert!(host.destroyed.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_rollback_skips_overwritten_assets() {
        let host = Arc::new(RecordingHost::default());
        let mut batch = UploadBatch::new(host.clone());
        batch
            .upload(
                UploadRequest::video(Bytes::from_static(MP4), "videos/slots")
                    .with_public_id("slot_3", true),
            )
            .await
            .unwrap();
        let fresh = batch
            .upload(UploadRequest::image(Bytes::from_static(PNG), PROJECT_FOLDER))
            .await
            .unwrap();

        batch.rollback().await;
        assert_eq!(*host.destroyed.lock().await, vec![fresh.public_id]);
    }
}
