//! Disk-backed media host used when no Cloudinary credentials are set.
//! Files land under the upload directory and are served at `/uploads`.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use super::{extension_for, MediaError, MediaHost, UploadRequest, UploadedMedia};

pub struct LocalDiskHost {
    root: PathBuf,
    public_base_url: String,
}

/// Reject path traversal and separators inside a single path segment.
fn is_safe_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment != "."
        && segment != ".."
        && !segment.contains('\\')
        && !segment.contains('\0')
        && !segment.contains(':')
}

fn safe_relative(path: &str) -> Result<PathBuf, MediaError> {
    let mut out = PathBuf::new();
    for segment in path.split('/').filter(|s| !s.is_empty()) {
        if !is_safe_segment(segment) {
            return Err(MediaError::Rejected(format!("Invalid media path '{}'", path)));
        }
        out.push(segment);
    }
    Ok(out)
}

impl LocalDiskHost {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.into(),
        }
    }

    fn file_path(&self, public_id: &str, format: &str) -> Result<PathBuf, MediaError> {
        let relative = safe_relative(&format!("{}.{}", public_id, format))?;
        Ok(self.root.join(relative))
    }
}

/// Remove files next to `path` that share its stem but carry another
/// extension, so an overwrite with a new format leaves one file behind.
async fn remove_stale_variants(path: &Path) -> Result<(), MediaError> {
    let (Some(dir), Some(stem)) = (path.parent(), path.file_stem()) else {
        return Ok(());
    };
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e.into()),
    };
    while let Some(entry) = entries.next_entry().await? {
        let sibling = entry.path();
        if sibling != path && sibling.file_stem() == Some(stem) {
            tokio::fs::remove_file(&sibling).await?;
            tracing::debug!(path = %sibling.display(), "Removed replaced media variant");
        }
    }
    Ok(())
}

#[async_trait]
impl MediaHost for LocalDiskHost {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn upload(&self, request: UploadRequest) -> Result<UploadedMedia, MediaError> {
        let name = request
            .public_id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let public_id = format!("{}/{}", request.folder.trim_matches('/'), name);
        let format = extension_for(&request);
        let path = self.file_path(&public_id, &format)?;

        if !request.overwrite && tokio::fs::try_exists(&path).await? {
            return Err(MediaError::Rejected(format!(
                "Media '{}' already exists",
                public_id
            )));
        }
        if request.overwrite {
            remove_stale_variants(&path).await?;
        }
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, &request.bytes).await?;

        tracing::debug!(path = %path.display(), size = request.bytes.len(), "Stored media on disk");

        Ok(UploadedMedia {
            url: format!("{}/uploads/{}.{}", self.public_base_url, public_id, format),
            public_id,
            kind: request.kind,
            duration: None,
            format: Some(format),
            overwrite: request.overwrite,
        })
    }

    async fn destroy(&self, media: &UploadedMedia) -> Result<(), MediaError> {
        let format = media.format.as_deref().unwrap_or("bin");
        let path = self.file_path(&media.public_id, format)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
