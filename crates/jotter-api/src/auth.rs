use std::sync::Arc;

use anyhow::anyhow;
use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use jsonwebtoken::{EncodingKey, Header, encode};
use uuid::Uuid;

use jotter_db::Database;
use jotter_types::api::{Claims, LoginRequest, LoginResponse, RegisterRequest, RegisterResponse};
use jotter_types::models::User;

use crate::error::ApiError;
use crate::{blocking, parse_uuid, time};

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let username_len = req.username.chars().count();
    if !(3..=32).contains(&username_len) {
        return Err(ApiError::Validation {
            field: "username",
            message: "must be 3 to 32 characters".into(),
        });
    }
    if req.password.chars().count() < 8 {
        return Err(ApiError::Validation {
            field: "password",
            message: "must be at least 8 characters".into(),
        });
    }

    // Hash password with Argon2id
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|e| ApiError::Internal(anyhow!("password hashing failed: {}", e)))?
        .to_string();

    let user_id = Uuid::new_v4();

    // The username UNIQUE constraint arbitrates concurrent registrations.
    let st = state.clone();
    let username = req.username.clone();
    let uid = user_id.to_string();
    let inserted = blocking(move || st.db.create_user(&uid, &username, &password_hash)).await;
    if let Err(e) = inserted {
        if jotter_db::is_unique_violation(&e) {
            return Err(ApiError::Conflict("username is taken".into()));
        }
        return Err(e.into());
    }

    let token = create_token(&state.jwt_secret, user_id, &req.username)?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse { user_id, token }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let st = state.clone();
    let username = req.username.clone();
    let user = blocking(move || st.db.get_user_by_username(&username))
        .await?
        .ok_or(ApiError::Unauthorized)?;

    // Verify password
    let parsed_hash = PasswordHash::new(&user.password)
        .map_err(|e| ApiError::Internal(anyhow!("stored password hash unreadable: {}", e)))?;

    Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .map_err(|_| ApiError::Unauthorized)?;

    let user_id: Uuid = user
        .id
        .parse()
        .map_err(|e| ApiError::Internal(anyhow!("corrupt user id '{}': {}", user.id, e)))?;

    let token = create_token(&state.jwt_secret, user_id, &user.username)?;

    Ok(Json(LoginResponse {
        user_id,
        username: user.username,
        token,
    }))
}

/// The authenticated principal's own profile.
pub async fn me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<User>, ApiError> {
    let st = state.clone();
    let uid = claims.sub.to_string();
    let user = blocking(move || st.db.get_user_by_id(&uid))
        .await?
        .ok_or(ApiError::NotFound)?;

    Ok(Json(User {
        id: parse_uuid(&user.id, "user id"),
        created_at: time::from_db_time(&user.created_at, "created_at", &user.id),
        username: user.username,
    }))
}

fn create_token(secret: &str, user_id: Uuid, username: &str) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user_id,
        username: username.to_string(),
        exp: (chrono::Utc::now() + chrono::Duration::days(30)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}
