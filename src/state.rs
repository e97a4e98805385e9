//! Shared router state.

use axum::extract::FromRef;
use std::sync::Arc;

use crate::db::Store;
use crate::media::MediaHost;
use crate::routes::auth::AuthConfig;

#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub media: Arc<dyn MediaHost>,
    pub auth: Arc<AuthConfig>,
    /// Folder that video slot assets are written to.
    pub video_folder: Arc<str>,
}

impl AppState {
    pub fn new(
        store: Store,
        media: Arc<dyn MediaHost>,
        auth: AuthConfig,
        video_folder: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            store,
            media,
            auth: Arc::new(auth),
            video_folder: video_folder.into(),
        }
    }
}

impl FromRef<AppState> for Store {
    fn from_ref(state: &AppState) -> Self {
        state.store.clone()
    }
}
