/**
 * Routes Module
 * API route handlers
 */

pub mod auth;
pub mod blog;
pub mod client_projects;
pub mod form;
pub mod gallery;
pub mod health;
pub mod projects;
pub mod testimonials;
pub mod videos;

#[cfg(test)]
pub(crate) mod test_support;

use serde::Serialize;
use uuid::Uuid;

use crate::error::ApiError;

pub use crate::error::ErrorResponse;

/// `{message, data}` envelope used by update and delete responses.
#[derive(Debug, Serialize)]
pub struct MessageResponse<T> {
    pub message: &'static str,
    pub data: T,
}

impl<T> MessageResponse<T> {
    pub fn new(message: &'static str, data: T) -> Self {
        Self { message, data }
    }

    pub fn updated(data: T) -> Self {
        Self {
            message: "Updated",
            data,
        }
    }

    pub fn deleted(data: T) -> Self {
        Self {
            message: "Deleted",
            data,
        }
    }
}

/// A path id that is not a UUID cannot name any document.
pub(crate) fn parse_id(raw: &str, entity: &'static str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::NotFound(entity))
}
