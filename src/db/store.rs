//! Persistence handle shared by every handler.
//!
//! Each collection is reached through its own trait object so Postgres and
//! the in-memory backend are interchangeable. The handle is built once at
//! startup and cloned into the router state.

use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use uuid::Uuid;

use super::memory::MemoryStore;
use super::models::{
    Admin, BlogPost, ClientProject, GalleryItem, Project, SlotId, Testimonial, VideoSlot,
    VideoSlotUpdate,
};
use super::postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error("{0}")]
    Conflict(String),
}

/// CRUD over one id-addressed collection.
#[async_trait]
pub trait Collection<T>: Send + Sync {
    /// All documents, newest first.
    async fn list(&self) -> Result<Vec<T>, StoreError>;

    async fn get(&self, id: Uuid) -> Result<Option<T>, StoreError>;

    async fn insert(&self, doc: T) -> Result<T, StoreError>;

    /// Replace a stored document with a merged copy. Returns `None` when the
    /// id no longer resolves.
    async fn save(&self, doc: T) -> Result<Option<T>, StoreError>;

    /// Remove by id, returning the removed document.
    async fn delete(&self, id: Uuid) -> Result<Option<T>, StoreError>;
}

/// The fixed video slot table, keyed by [`SlotId`].
#[async_trait]
pub trait VideoSlots: Send + Sync {
    /// All written slots in ascending slot order.
    async fn list(&self) -> Result<Vec<VideoSlot>, StoreError>;

    async fn get(&self, slot: SlotId) -> Result<Option<VideoSlot>, StoreError>;

    /// Create or update the slot in one step. A created slot starts with zero
    /// views; the stored orientation is always derived from `slot`.
    async fn upsert(&self, slot: SlotId, update: VideoSlotUpdate)
        -> Result<VideoSlot, StoreError>;
}

#[async_trait]
pub trait Admins: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Admin>, StoreError>;

    /// Case-insensitive email lookup.
    async fn find_by_email(&self, email: &str) -> Result<Option<Admin>, StoreError>;

    async fn insert(&self, admin: Admin) -> Result<Admin, StoreError>;
}

#[derive(Clone)]
enum Backend {
    Postgres(PgPool),
    Memory,
}

/// Injected persistence handle.
#[derive(Clone)]
pub struct Store {
    pub gallery: Arc<dyn Collection<GalleryItem>>,
    pub blog: Arc<dyn Collection<BlogPost>>,
    pub client_projects: Arc<dyn Collection<ClientProject>>,
    pub testimonials: Arc<dyn Collection<Testimonial>>,
    pub projects: Arc<dyn Collection<Project>>,
    pub videos: Arc<dyn VideoSlots>,
    pub admins: Arc<dyn Admins>,
    backend: Backend,
}

impl Store {
    pub fn postgres(pool: PgPool) -> Self {
        let pg = Arc::new(PgStore::new(pool.clone()));
        Self {
            gallery: pg.clone(),
            blog: pg.clone(),
            client_projects: pg.clone(),
            testimonials: pg.clone(),
            projects: pg.clone(),
            videos: pg.clone(),
            admins: pg,
            backend: Backend::Postgres(pool),
        }
    }

    pub fn memory() -> Self {
        let mem = MemoryStore::default();
        Self {
            gallery: Arc::new(mem.gallery),
            blog: Arc::new(mem.blog),
            client_projects: Arc::new(mem.client_projects),
            testimonials: Arc::new(mem.testimonials),
            projects: Arc::new(mem.projects),
            videos: Arc::new(mem.videos),
            admins: Arc::new(mem.admins),
            backend: Backend::Memory,
        }
    }

    pub fn backend_name(&self) -> &'static str {
        match self.backend {
            Backend::Postgres(_) => "postgres",
            Backend::Memory => "memory",
        }
    }

    /// Round-trip time of a trivial query.
    pub async fn ping(&self) -> Result<Duration, StoreError> {
        let start = Instant::now();
        if let Backend::Postgres(pool) = &self.backend {
            sqlx::query("SELECT 1").fetch_one(pool).await?;
        }
        Ok(start.elapsed())
    }
}
