//! Sochlabs Backend - library for app logic and testing

pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod media;
pub mod routes;
pub mod state;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, Method},
    middleware,
    routing::{get, patch, post, put},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, limit::RequestBodyLimitLayer,
    services::ServeDir, trace::TraceLayer,
};

use crate::config::{AppConfig, ConfigError, HttpConfig, MediaConfig};
use crate::db::{BootstrapError, BootstrapOutcome, Store};
use crate::media::{CloudinaryHost, LocalDiskHost, MediaError, MediaHost};
use crate::routes::auth::AuthConfig;
use crate::state::AppState;

/// Configure CORS for the configured frontend origins. Credentials are
/// allowed so the admin session cookie travels with requests.
pub fn configure_cors(http: &HttpConfig) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(http.allowed_origins.clone())
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}

/// Create and configure the application router.
pub fn create_app(state: AppState, http: &HttpConfig) -> Router {
    let cors = configure_cors(http);
    tracing::info!(origins = http.allowed_origins.len(), "CORS configured");

    let mut router = Router::new()
        // Admin session
        .route("/api/admin/login", post(routes::auth::login))
        .route("/api/admin/logout", post(routes::auth::logout))
        .route("/api/logout", post(routes::auth::logout))
        .route("/api/admin/me", get(routes::auth::me))
        // Gallery
        .route(
            "/api/gallery",
            get(routes::gallery::list_items).post(routes::gallery::create_item),
        )
        .route(
            "/api/gallery/{id}",
            patch(routes::gallery::update_item).delete(routes::gallery::delete_item),
        )
        // Blog
        .route(
            "/api/blog",
            get(routes::blog::list_posts).post(routes::blog::create_post),
        )
        .route(
            "/api/blog/{id}",
            get(routes::blog::get_post)
                .patch(routes::blog::update_post)
                .delete(routes::blog::delete_post),
        )
        // Client projects
        .route(
            "/api/clientproject",
            get(routes::client_projects::list_projects)
                .post(routes::client_projects::create_project),
        )
        .route(
            "/api/clientproject/{id}",
            get(routes::client_projects::get_project)
                .put(routes::client_projects::update_project)
                .delete(routes::client_projects::delete_project),
        )
        // Testimonials
        .route(
            "/api/testimonial",
            get(routes::testimonials::list_testimonials)
                .post(routes::testimonials::create_testimonial),
        )
        .route(
            "/api/testimonial/{id}",
            patch(routes::testimonials::update_testimonial)
                .delete(routes::testimonials::delete_testimonial),
        )
        // Projects
        .route(
            "/api/projects",
            get(routes::projects::list_projects).post(routes::projects::create_project),
        )
        .route(
            "/api/projects/{id}",
            get(routes::projects::get_project)
                .put(routes::projects::update_project)
                .delete(routes::projects::delete_project),
        )
        // Video slots
        .route("/api/videos", get(routes::videos::list_slots))
        .route("/api/admin/videos/{slot}", put(routes::videos::update_slot))
        // Health
        .route("/health", get(routes::health::health_ping))
        .route("/health/detailed", get(routes::health::health_detailed))
        .route("/health/database", get(routes::health::health_database))
        .route("/health/ready", get(routes::health::health_ready));

    if let Some(dir) = &http.upload_dir {
        router = router.nest_service("/uploads", ServeDir::new(dir));
    }

    router
        .with_state(state)
        .layer(logging::middleware::propagate_request_id_layer())
        .layer(middleware::from_fn(logging::middleware::log_request))
        .layer(logging::middleware::request_id_layer())
        .layer(TraceLayer::new_for_http())
        // Compress responses with gzip/br/zstd automatically
        .layer(CompressionLayer::new())
        // Uploads are buffered in memory, so cap the body at the upload limit
        .layer(DefaultBodyLimit::max(http.max_upload_bytes))
        .layer(RequestBodyLimitLayer::new(http.max_upload_bytes))
        .layer(cors)
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("admin bootstrap failed: {0}")]
    Bootstrap(#[from] BootstrapError),

    #[error("media host setup failed: {0}")]
    Media(#[from] MediaError),

    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}

/// Media host for the configured backend.
pub fn media_host(config: &MediaConfig) -> Result<Arc<dyn MediaHost>, MediaError> {
    match config {
        MediaConfig::Cloudinary(cloudinary) => {
            tracing::info!(cloud = %cloudinary.cloud_name, "Using Cloudinary media host");
            Ok(Arc::new(CloudinaryHost::new(cloudinary.clone())?))
        }
        MediaConfig::Local {
            root,
            public_base_url,
        } => {
            tracing::warn!(
                root = %root.display(),
                "Cloudinary credentials not set. Storing media on local disk."
            );
            Ok(Arc::new(LocalDiskHost::new(root.clone(), public_base_url.clone())))
        }
    }
}

/// Open the configured store, running migrations for Postgres.
pub async fn open_store(config: &AppConfig) -> Result<Store, StartupError> {
    match &config.database {
        Some(db_config) => {
            tracing::info!(url = %db_config.redacted_url(), "Connecting to database");
            let pool = db::init_pool(db_config).await?;
            db::run_migrations(&pool).await?;
            Ok(Store::postgres(pool))
        }
        None => {
            tracing::warn!("No database connection string set. Using in-memory store; content is lost on restart.");
            Ok(Store::memory())
        }
    }
}

/// Create the configured admin if missing.
pub async fn seed_admin(config: &AppConfig, store: &Store) -> Result<(), StartupError> {
    match &config.admin {
        Some(seed) => match db::bootstrap_admin(store, seed).await? {
            BootstrapOutcome::Created(admin) => {
                tracing::info!(email = %admin.email, "Admin account created")
            }
            BootstrapOutcome::AlreadyPresent => {
                tracing::debug!(email = %seed.email, "Admin account already present")
            }
        },
        None => tracing::warn!(
            "ADMIN_EMAIL or admin password not set. No admin account will be bootstrapped."
        ),
    }
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
        tracing::info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
                tracing::info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Run the server (used by main).
pub async fn run() -> Result<(), StartupError> {
    dotenvy::dotenv().ok();

    // Read before logging exists; errors are reported by main.
    let config = AppConfig::from_env()?;

    // Guards MUST be held for the programme's lifetime; dropping them early
    // shuts down background log-writer threads and loses buffered log lines.
    let _log_guards = logging::init(config.environment, &config.log_level);

    routes::health::init_start_time();

    if config.jwt_secret == config::DEV_JWT_SECRET {
        tracing::warn!("JWT_SECRET_KEY not set. Using the insecure development secret.");
    }

    let store = open_store(&config).await?;
    seed_admin(&config, &store).await?;
    let media = media_host(&config.media)?;

    let state = AppState::new(
        store,
        media,
        AuthConfig::new(&config.jwt_secret, config.environment.is_production()),
        config.video_folder.clone(),
    );
    let app = create_app(state, &config.http);

    let addr = config.http.addr;
    tracing::info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server stopped");
    Ok(())
}
