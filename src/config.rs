//! Process configuration, read once at startup.
//!
//! Everything is resolved through a lookup function so tests can feed a map
//! instead of mutating the process environment.

use axum::http::HeaderValue;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use thiserror::Error;

use crate::db::DbConfig;

/// Signing secret used only outside production when none is configured.
pub const DEV_JWT_SECRET: &str = "sochlabs-dev-secret-do-not-use-in-production";

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;
pub const DEFAULT_VIDEO_FOLDER: &str = "videos/slots";

/// Connection string variables in lookup order. The `MONGO_*` names are
/// legacy aliases kept so existing deployment environments keep working;
/// whatever they hold must be a Postgres URL.
const DEV_DATABASE_VARS: &[&str] = &["DATABASE_URL", "MONGO_URI"];
const PROD_DATABASE_VARS: &[&str] = &["DATABASE_URL_PROD", "DATABASE_URL", "MONGO_ATLAS_URI"];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set in production")]
    Missing(&'static str),

    #[error("{name} has an invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn is_production(self) -> bool {
        self == Environment::Production
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminPassword {
    Plain(String),
    /// Pre-computed bcrypt hash.
    Hashed(String),
}

/// Credentials of the admin created on first start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminSeed {
    pub email: String,
    pub password: AdminPassword,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaConfig {
    Cloudinary(CloudinaryConfig),
    Local {
        root: PathBuf,
        public_base_url: String,
    },
}

#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub addr: SocketAddr,
    pub allowed_origins: Vec<HeaderValue>,
    pub max_upload_bytes: usize,
    /// Directory served at `/uploads` when media is stored locally.
    pub upload_dir: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: Environment,
    pub log_level: String,
    pub database: Option<DbConfig>,
    pub jwt_secret: String,
    pub admin: Option<AdminSeed>,
    pub media: MediaConfig,
    pub video_folder: String,
    pub http: HttpConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Blank values count as unset.
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let first = |keys: &[&str]| keys.iter().find_map(|k| get(*k));

        let environment = match get("ENVIRONMENT").as_deref() {
            None | Some("development") | Some("dev") => Environment::Development,
            Some("production") | Some("prod") => Environment::Production,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: "ENVIRONMENT",
                    value: other.to_string(),
                })
            }
        };
        let production = environment.is_production();

        let default_level = if production { "info" } else { "debug" };
        let log_level = get("LOG_LEVEL").unwrap_or_else(|| default_level.to_string());

        let database_url = if production {
            first(PROD_DATABASE_VARS)
        } else {
            first(DEV_DATABASE_VARS)
        };
        let database = match database_url {
            Some(url) => {
                let mut db = DbConfig::new(url);
                db.max_connections = parse_or(&get, "DB_POOL_MAX", db.max_connections)?;
                db.min_connections = parse_or(&get, "DB_POOL_MIN", db.min_connections)?;
                db.connect_timeout_secs =
                    parse_or(&get, "DB_CONNECT_TIMEOUT", db.connect_timeout_secs)?;
                db.idle_timeout_secs = parse_or(&get, "DB_IDLE_TIMEOUT", db.idle_timeout_secs)?;
                Some(db)
            }
            None if production => return Err(ConfigError::Missing("DATABASE_URL_PROD")),
            None => None,
        };

        let jwt_secret = match first(&["JWT_SECRET_KEY", "JWT_SECRET"]) {
            Some(secret) if production && secret == DEV_JWT_SECRET => {
                return Err(ConfigError::Invalid {
                    name: "JWT_SECRET_KEY",
                    value: "<development default>".to_string(),
                })
            }
            Some(secret) => secret,
            None if production => return Err(ConfigError::Missing("JWT_SECRET_KEY")),
            None => DEV_JWT_SECRET.to_string(),
        };

        let admin = get("ADMIN_EMAIL").and_then(|email| {
            let password = get("ADMIN_HASH_PASSWORD")
                .map(AdminPassword::Hashed)
                .or_else(|| first(&["ADMIN_PASS", "ADMIN_PASSWORD"]).map(AdminPassword::Plain))?;
            Some(AdminSeed { email, password })
        });

        let upload_dir = PathBuf::from(get("UPLOAD_DIR").unwrap_or_else(|| "uploads".to_string()));
        let media = match (
            get("CLOUDINARY_CLOUD_NAME"),
            get("CLOUDINARY_API_KEY"),
            get("CLOUDINARY_API_SECRET"),
        ) {
            (Some(cloud_name), Some(api_key), Some(api_secret)) => {
                MediaConfig::Cloudinary(CloudinaryConfig {
                    cloud_name,
                    api_key,
                    api_secret,
                    timeout_secs: parse_or(&get, "CLOUDINARY_TIMEOUT", 120)?,
                })
            }
            _ => MediaConfig::Local {
                root: upload_dir.clone(),
                public_base_url: get("PUBLIC_BASE_URL")
                    .map(|url| url.trim_end_matches('/').to_string())
                    .unwrap_or_default(),
            },
        };
        let video_folder =
            get("CLOUDINARY_UPLOAD_FOLDER").unwrap_or_else(|| DEFAULT_VIDEO_FOLDER.to_string());

        let host: IpAddr = parse_or(&get, "HOST", IpAddr::from([127, 0, 0, 1]))?;
        let port: u16 = parse_or(&get, "PORT", 3001)?;
        let addr = SocketAddr::new(host, port);

        let http = HttpConfig {
            addr,
            allowed_origins: allowed_origins(&get),
            max_upload_bytes: parse_or(&get, "MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
            upload_dir: match media {
                MediaConfig::Local { .. } => Some(upload_dir),
                MediaConfig::Cloudinary(_) => None,
            },
        };

        Ok(Self {
            environment,
            log_level,
            database,
            jwt_secret,
            admin,
            media,
            video_folder,
            http,
        })
    }
}

fn parse_or<T, G>(get: &G, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(name) {
        Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid { name, value: raw }),
        None => Ok(default),
    }
}

/// ALLOWED_ORIGINS (comma-separated), else FRONTEND_ORIGIN, else local dev origins.
fn allowed_origins<G>(get: &G) -> Vec<HeaderValue>
where
    G: Fn(&str) -> Option<String>,
{
    let parse_all = |raw: String| -> Vec<HeaderValue> {
        raw.split(',')
            .filter_map(|origin| origin.trim().parse().ok())
            .collect()
    };

    get("ALLOWED_ORIGINS")
        .map(parse_all)
        .filter(|origins| !origins.is_empty())
        .or_else(|| get("FRONTEND_ORIGIN").map(parse_all))
        .filter(|origins| !origins.is_empty())
        .unwrap_or_else(|| {
            vec![
                HeaderValue::from_static("http://localhost:3000"),
                HeaderValue::from_static("http://127.0.0.1:3000"),
            ]
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_development_defaults() {
        let config = config(&[]).unwrap();
        assert_eq!(config.environment, Environment::Development);
        assert!(config.database.is_none());
        assert_eq!(config.jwt_secret, DEV_JWT_SECRET);
        assert!(config.admin.is_none());
        assert_eq!(config.video_folder, "videos/slots");
        assert_eq!(config.http.addr.port(), 3001);
        assert_eq!(config.http.max_upload_bytes, DEFAULT_MAX_UPLOAD_BYTES);
        assert_eq!(config.http.allowed_origins.len(), 2);
        assert!(matches!(config.media, MediaConfig::Local { .. }));
        assert_eq!(config.http.upload_dir, Some(PathBuf::from("uploads")));
    }

    #[test]
    fn test_production_requires_secret() {
        let err = config(&[
            ("ENVIRONMENT", "production"),
            ("DATABASE_URL_PROD", "postgres://db/cms"),
        ])
        .unwrap_err();
        assert_eq!(err, ConfigError::Missing("JWT_SECRET_KEY"));
    }

    #[test]
    fn test_production_requires_connection_string() {
        let err = config(&[("ENVIRONMENT", "production"), ("JWT_SECRET_KEY", "s3cret")])
            .unwrap_err();
        assert_eq!(err, ConfigError::Missing("DATABASE_URL_PROD"));
    }

    #[test]
    fn test_production_rejects_development_secret() {
        let err = config(&[
            ("ENVIRONMENT", "production"),
            ("MONGO_ATLAS_URI", "postgres://db/cms"),
            ("JWT_SECRET_KEY", DEV_JWT_SECRET),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "JWT_SECRET_KEY", .. }));
    }

    #[test]
    fn test_connection_string_follows_environment() {
        let dev = config(&[
            ("DATABASE_URL", "postgres://dev/cms"),
            ("DATABASE_URL_PROD", "postgres://prod/cms"),
        ])
        .unwrap();
        assert_eq!(dev.database.unwrap().url, "postgres://dev/cms");

        let prod = config(&[
            ("ENVIRONMENT", "production"),
            ("JWT_SECRET_KEY", "s3cret"),
            ("DATABASE_URL", "postgres://dev/cms"),
            ("DATABASE_URL_PROD", "postgres://prod/cms"),
            ("DB_POOL_MAX", "25"),
        ])
        .unwrap();
        let db = prod.database.unwrap();
        assert_eq!(db.url, "postgres://prod/cms");
        assert_eq!(db.max_connections, 25);
    }

    #[test]
    fn test_database_url_wins_over_legacy_alias() {
        let dev = config(&[
            ("MONGO_URI", "postgres://legacy/cms"),
            ("DATABASE_URL", "postgres://dev/cms"),
        ])
        .unwrap();
        assert_eq!(dev.database.unwrap().url, "postgres://dev/cms");

        let legacy = config(&[("MONGO_URI", "postgres://legacy/cms")]).unwrap();
        assert_eq!(legacy.database.unwrap().url, "postgres://legacy/cms");
    }

    #[test]
    fn test_ipv6_host_binds() {
        let config = config(&[("HOST", "::"), ("PORT", "8080")]).unwrap();
        assert!(config.http.addr.is_ipv6());
        assert_eq!(config.http.addr.port(), 8080);
    }

    #[test]
    fn test_invalid_host_is_rejected() {
        let err = config(&[("HOST", "not a host")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "HOST", .. }));
    }

    #[test]
    fn test_admin_seed_prefers_hash() {
        let config = config(&[
            ("ADMIN_EMAIL", "admin@sochlabs.com"),
            ("ADMIN_PASS", "plain"),
            ("ADMIN_HASH_PASSWORD", "$2b$10$abc"),
        ])
        .unwrap();
        assert_eq!(
            config.admin.unwrap().password,
            AdminPassword::Hashed("$2b$10$abc".to_string())
        );
    }

    #[test]
    fn test_admin_seed_needs_password() {
        let config = config(&[("ADMIN_EMAIL", "admin@sochlabs.com")]).unwrap();
        assert!(config.admin.is_none());
    }

    #[test]
    fn test_cloudinary_needs_all_credentials() {
        let partial = config(&[
            ("CLOUDINARY_CLOUD_NAME", "soch"),
            ("CLOUDINARY_API_KEY", "key"),
        ])
        .unwrap();
        assert!(matches!(partial.media, MediaConfig::Local { .. }));

        let full = config(&[
            ("CLOUDINARY_CLOUD_NAME", "soch"),
            ("CLOUDINARY_API_KEY", "key"),
            ("CLOUDINARY_API_SECRET", "secret"),
            ("CLOUDINARY_UPLOAD_FOLDER", "reels"),
        ])
        .unwrap();
        assert!(matches!(full.media, MediaConfig::Cloudinary(_)));
        assert_eq!(full.video_folder, "reels");
        assert!(full.http.upload_dir.is_none());
    }

    #[test]
    fn test_invalid_port_is_reported() {
        let err = config(&[("PORT", "eighty")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "PORT", .. }));
    }

    #[test]
    fn test_allowed_origins_from_env() {
        let config = config(&[(
            "ALLOWED_ORIGINS",
            "https://sochlabs.com, https://admin.sochlabs.com",
        )])
        .unwrap();
        assert_eq!(config.http.allowed_origins.len(), 2);
        assert_eq!(config.http.allowed_origins[0], "https://sochlabs.com");
    }
}
