//! Run migrations and create the configured admin account, then exit.
//! Safe to run repeatedly: an existing admin is left untouched.

use sochlabs_backend::{config::AppConfig, logging, open_store, seed_admin, StartupError};

async fn seed() -> Result<(), StartupError> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;
    let _log_guards = logging::init(config.environment, &config.log_level);

    if config.database.is_none() {
        tracing::warn!("No database configured; the seeded admin only lives for this process.");
    }
    let store = open_store(&config).await?;
    seed_admin(&config, &store).await
}

#[tokio::main]
async fn main() {
    if let Err(e) = seed().await {
        eprintln!("Admin seeding failed: {}", e);
        std::process::exit(1);
    }
}
