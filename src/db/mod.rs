pub mod memory;
pub mod models;
pub mod postgres;
pub mod store;

pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use store::{Admins, Collection, Store, StoreError, VideoSlots};

use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;
use thiserror::Error;

use crate::config::{AdminPassword, AdminSeed};
use models::Admin;

/// Cost used when hashing a plain-text bootstrap password.
pub const BCRYPT_COST: u32 = 10;

#[derive(Debug, Clone)]
pub struct DbConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
    pub idle_timeout_secs: u64,
}

impl DbConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: 10,
            min_connections: 2,
            connect_timeout_secs: 10,
            idle_timeout_secs: 300,
        }
    }

    /// Connection string with credentials masked, for logs.
    pub fn redacted_url(&self) -> String {
        match (self.url.find("://"), self.url.rfind('@')) {
            (Some(scheme), Some(at)) if at > scheme => {
                format!("{}://***{}", &self.url[..scheme], &self.url[at..])
            }
            _ => self.url.clone(),
        }
    }
}

pub async fn init_pool(config: &DbConfig) -> Result<PgPool, sqlx::Error> {
    tracing::info!("Initializing database connection pool...");
    tracing::debug!("Database URL: {}", config.redacted_url());

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
        .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
        .max_lifetime(Duration::from_secs(1800))
        .test_before_acquire(true)
        .connect(&config.url)
        .await?;

    sqlx::query("SELECT 1").fetch_one(&pool).await?;

    tracing::info!("Database connection pool initialized successfully");

    Ok(pool)
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    tracing::info!("Running database migrations...");

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS admins (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            email TEXT NOT NULL,
            password_hash TEXT NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )
    "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE UNIQUE INDEX IF NOT EXISTS idx_admins_email_lower ON admins(LOWER(email))
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS gallery_items (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            title TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            category TEXT NOT NULL DEFAULT '',
            image_url TEXT NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )
    "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS blog_posts (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            title TEXT NOT NULL,
            content TEXT NOT NULL,
            category TEXT NOT NULL DEFAULT '',
            image_url TEXT NOT NULL DEFAULT '',
            created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )
    "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS client_projects (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            company TEXT NOT NULL,
            name TEXT NOT NULL,
            testimonial TEXT NOT NULL DEFAULT '',
            work_did TEXT NOT NULL DEFAULT '',
            projects JSONB NOT NULL DEFAULT '[]'::jsonb,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )
    "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS testimonials (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            user_name TEXT NOT NULL,
            designation TEXT NOT NULL,
            headline TEXT NOT NULL DEFAULT '',
            description TEXT NOT NULL DEFAULT '',
            profile_picture_url TEXT NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )
    "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS projects (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            title TEXT NOT NULL,
            category TEXT NOT NULL,
            description TEXT NOT NULL,
            image TEXT NOT NULL,
            tags TEXT[] NOT NULL DEFAULT '{}',
            status TEXT NOT NULL,
            likes BIGINT NOT NULL DEFAULT 0 CHECK (likes >= 0),
            views BIGINT NOT NULL DEFAULT 0 CHECK (views >= 0),
            year TEXT NOT NULL DEFAULT '',
            client TEXT NOT NULL DEFAULT '',
            duration TEXT NOT NULL DEFAULT '',
            tools TEXT[] NOT NULL DEFAULT '{}',
            color TEXT NOT NULL DEFAULT '#000000',
            link TEXT NOT NULL DEFAULT '',
            github_url TEXT NOT NULL DEFAULT '',
            video_demo_url TEXT NOT NULL DEFAULT '',
            created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )
    "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS video_slots (
            slot_id SMALLINT PRIMARY KEY CHECK (slot_id BETWEEN 1 AND 8),
            title TEXT NOT NULL DEFAULT '',
            description TEXT NOT NULL DEFAULT '',
            duration INTEGER NOT NULL DEFAULT 0,
            duration_text TEXT NOT NULL DEFAULT '',
            views BIGINT NOT NULL DEFAULT 0,
            orientation TEXT NOT NULL CHECK (orientation IN ('portrait', 'landscape')),
            category TEXT NOT NULL DEFAULT '',
            is_live BOOLEAN NOT NULL DEFAULT false,
            thumbnail_url TEXT NOT NULL DEFAULT '',
            video_url TEXT NOT NULL DEFAULT '',
            video_type TEXT NOT NULL DEFAULT 'mp4',
            created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )
    "#,
    )
    .execute(pool)
    .await?;

    for table in [
        "gallery_items",
        "blog_posts",
        "client_projects",
        "testimonials",
        "projects",
    ] {
        let sql = format!(
            "CREATE INDEX IF NOT EXISTS idx_{table}_created_at ON {table}(created_at DESC)"
        );
        sqlx::query(&sql).execute(pool).await?;
    }

    tracing::info!("Database migrations completed successfully");

    Ok(())
}

// ============================================================================
// Admin bootstrap
// ============================================================================

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("failed to hash admin password: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    #[error("hashing task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum BootstrapOutcome {
    Created(Admin),
    AlreadyPresent,
}

/// Create the configured admin unless an admin with that email exists.
pub async fn bootstrap_admin(
    store: &Store,
    seed: &AdminSeed,
) -> Result<BootstrapOutcome, BootstrapError> {
    if store.admins.find_by_email(&seed.email).await?.is_some() {
        tracing::debug!(email = %seed.email, "Admin already present, skipping bootstrap");
        return Ok(BootstrapOutcome::AlreadyPresent);
    }

    let password_hash = match &seed.password {
        AdminPassword::Hashed(hash) => hash.clone(),
        AdminPassword::Plain(plain) => {
            let plain = plain.clone();
            tokio::task::spawn_blocking(move || bcrypt::hash(plain, BCRYPT_COST)).await??
        }
    };

    match store
        .admins
        .insert(Admin::new(seed.email.trim(), password_hash))
        .await
    {
        Ok(admin) => {
            tracing::info!(email = %admin.email, "Bootstrap admin created");
            Ok(BootstrapOutcome::Created(admin))
        }
        // Another instance won the race.
        Err(StoreError::Conflict(_)) => Ok(BootstrapOutcome::AlreadyPresent),
        Err(e) => Err(e.into()),
    }
}
