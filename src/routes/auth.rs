/**
 * Authentication Routes
 * Cookie-based admin session: login, logout, current admin, and the
 * `AdminSession` guard every admin mutation goes through
 */
use axum::{
    extract::{FromRequestParts, State},
    http::{
        header::{COOKIE, SET_COOKIE},
        request::Parts,
        HeaderMap, StatusCode,
    },
    response::IntoResponse,
    Json,
};
use bcrypt::verify;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::models::Admin;
use crate::error::ApiError;
use crate::state::AppState;

// ============================================================================
// Configuration
// ============================================================================

/// Name of the session cookie.
pub const TOKEN_COOKIE: &str = "token";

/// Session lifetime in hours
const TOKEN_EXPIRY_HOURS: i64 = 24;

pub struct AuthConfig {
    encoding: EncodingKey,
    decoding: DecodingKey,
    secure_cookie: bool,
}

impl AuthConfig {
    pub fn new(secret: &str, secure_cookie: bool) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            secure_cookie,
        }
    }
}

// ============================================================================
// Types
// ============================================================================

/// JWT Claims structure
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Claims {
    pub id: String,    // Admin ID
    pub email: String, // Admin email
    pub iat: i64,      // Issued at timestamp
    pub exp: i64,      // Expiry timestamp
}

/// Admin info returned to frontend
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AdminInfo {
    pub id: Uuid,
    pub email: String,
}

impl From<&Admin> for AdminInfo {
    fn from(admin: &Admin) -> Self {
        Self {
            id: admin.id,
            email: admin.email.clone(),
        }
    }
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize, Serialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub success: bool,
    pub admin: AdminInfo,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct LogoutResponse {
    pub success: bool,
}

// ============================================================================
// Helper Functions
// ============================================================================

pub fn issue_token(config: &AuthConfig, admin: &Admin) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let exp = now + Duration::hours(TOKEN_EXPIRY_HOURS);

    let claims = Claims {
        id: admin.id.to_string(),
        email: admin.email.clone(),
        iat: now.timestamp(),
        exp: exp.timestamp(),
    };

    encode(&Header::default(), &claims, &config.encoding)
}

/// Verify signature and expiry, returning the decoded claims.
pub fn verify_token(config: &AuthConfig, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(token, &config.decoding, &Validation::default())?;
    Ok(token_data.claims)
}

/// Value of the `token` cookie, if any Cookie header carries one.
pub fn token_from_cookies(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == TOKEN_COOKIE)
        .map(|(_, value)| value.trim_matches('"').to_string())
        .filter(|value| !value.is_empty())
}

fn session_cookie(config: &AuthConfig, token: &str) -> String {
    let mut cookie = format!(
        "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
        TOKEN_COOKIE,
        token,
        TOKEN_EXPIRY_HOURS * 3600
    );
    if config.secure_cookie {
        cookie.push_str("; Secure");
    }
    cookie
}

fn cleared_cookie(config: &AuthConfig) -> String {
    let mut cookie = format!(
        "{}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0",
        TOKEN_COOKIE
    );
    if config.secure_cookie {
        cookie.push_str("; Secure");
    }
    cookie
}

// ============================================================================
// Guard
// ============================================================================

/// An authenticated admin. Handlers taking this never run for anonymous
/// callers: every failure is the same 403.
#[derive(Debug, Clone)]
pub struct AdminSession(pub Admin);

impl FromRequestParts<AppState> for AdminSession {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = token_from_cookies(&parts.headers).ok_or(ApiError::Forbidden)?;

        let claims = verify_token(&state.auth, &token).map_err(|e| {
            tracing::debug!("Rejected session token: {}", e);
            ApiError::Forbidden
        })?;

        let id = Uuid::parse_str(&claims.id).map_err(|_| ApiError::Forbidden)?;

        match state.store.admins.find_by_id(id).await {
            Ok(Some(admin)) => Ok(AdminSession(admin)),
            Ok(None) => {
                tracing::warn!(admin_id = %id, "Session token for unknown admin");
                Err(ApiError::Forbidden)
            }
            Err(e) => {
                tracing::error!("Admin lookup failed: {}", e);
                Err(ApiError::Forbidden)
            }
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/admin/login
/// Check credentials and set the session cookie
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = payload.email.trim().to_string();
    if email.is_empty() || payload.password.is_empty() {
        return Err(ApiError::BadRequest(
            "Email and password are required".to_string(),
        ));
    }

    let invalid = || ApiError::Unauthorized("Invalid email or password".to_string());

    let Some(admin) = state.store.admins.find_by_email(&email).await? else {
        tracing::warn!("Login attempt for unknown admin: {}", email);
        return Err(invalid());
    };

    // bcrypt is CPU-bound; keep the async executor free.
    let password = payload.password;
    let hash = admin.password_hash.clone();
    let password_ok = tokio::task::spawn_blocking(move || verify(&password, &hash).unwrap_or(false))
        .await
        .unwrap_or(false);
    if !password_ok {
        tracing::warn!("Failed login attempt for: {}", admin.email);
        return Err(invalid());
    }

    let token = issue_token(&state.auth, &admin).map_err(|e| {
        tracing::error!("Failed to create session token: {}", e);
        ApiError::Internal("token signing failed".to_string())
    })?;

    tracing::info!("Successful login for admin: {}", admin.email);

    Ok((
        StatusCode::OK,
        [(SET_COOKIE, session_cookie(&state.auth, &token))],
        Json(LoginResponse {
            success: true,
            admin: AdminInfo::from(&admin),
        }),
    ))
}

/// POST /api/logout, POST /api/admin/logout
/// Clear the session cookie. Always succeeds.
pub async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(SET_COOKIE, cleared_cookie(&state.auth))],
        Json(LogoutResponse { success: true }),
    )
}

/// GET /api/admin/me
pub async fn me(AdminSession(admin): AdminSession) -> Json<AdminInfo> {
    Json(AdminInfo::from(&admin))
}
