/**
 * Multipart form reader
 * Collects text fields and file parts of an admin form submission
 */
use axum::extract::multipart::{Multipart, MultipartError};
use axum::http::StatusCode;
use bytes::Bytes;
use http_body_util::LengthLimitError;
use std::collections::HashMap;
use std::error::Error as _;

use crate::error::ApiError;
use crate::media::UploadRequest;

#[derive(Debug, Clone)]
pub struct FilePart {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl FilePart {
    pub fn into_image(self, folder: impl Into<String>) -> UploadRequest {
        UploadRequest::image(self.bytes, folder).with_file_info(self.file_name, self.content_type)
    }

    pub fn into_video(self, folder: impl Into<String>) -> UploadRequest {
        UploadRequest::video(self.bytes, folder).with_file_info(self.file_name, self.content_type)
    }
}

/// A parsed multipart body. Text fields keep their last value; empty file
/// parts (a file input with nothing selected) are dropped.
#[derive(Debug, Default)]
pub struct FormData {
    fields: Vec<(String, String)>,
    files: HashMap<String, FilePart>,
}

/// The body limit error arrives wrapped in the multipart parser's error
/// several layers deep, so the whole source chain is searched.
fn exceeded_body_limit(e: &MultipartError) -> bool {
    let mut source = e.source();
    while let Some(err) = source {
        if err.is::<LengthLimitError>() {
            return true;
        }
        source = err.source();
    }
    false
}

fn multipart_error(e: MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE || exceeded_body_limit(&e) {
        ApiError::PayloadTooLarge
    } else {
        tracing::warn!("Multipart error: {}", e);
        ApiError::BadRequest("Invalid form data".to_string())
    }
}

impl FormData {
    pub async fn from_multipart(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = FormData::default();

        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            if let Some(file_name) = field.file_name().map(str::to_string) {
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await.map_err(multipart_error)?;
                if bytes.is_empty() {
                    continue;
                }
                form.files.insert(
                    name,
                    FilePart {
                        file_name: Some(file_name).filter(|n| !n.is_empty()),
                        content_type,
                        bytes,
                    },
                );
            } else {
                let value = field.text().await.map_err(multipart_error)?;
                form.set(name, value);
            }
        }

        Ok(form)
    }

    fn set(&mut self, name: String, value: String) {
        match self.fields.iter_mut().find(|(k, _)| *k == name) {
            Some(entry) => entry.1 = value,
            None => self.fields.push((name, value)),
        }
    }

    /// Raw text value.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Trimmed, owned text value.
    pub fn string(&self, name: &str) -> Option<String> {
        self.text(name).map(|v| v.trim().to_string())
    }

    /// `true` iff the field is exactly `"true"`.
    pub fn flag(&self, name: &str) -> bool {
        self.text(name) == Some("true")
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn take_file(&mut self, name: &str) -> Option<FilePart> {
        self.files.remove(name)
    }

    /// First present file among several accepted field names.
    pub fn take_file_any(&mut self, names: &[&str]) -> Option<FilePart> {
        names.iter().find_map(|name| self.files.remove(*name))
    }

    #[cfg(test)]
    pub fn from_parts(fields: &[(&str, &str)], files: Vec<(&str, FilePart)>) -> Self {
        let mut form = FormData::default();
        for (k, v) in fields {
            form.set(k.to_string(), v.to_string());
        }
        for (k, f) in files {
            form.files.insert(k.to_string(), f);
        }
        form
    }
}
