use chrono::{DateTime, Utc};
use jotter_core::payload::PayloadKind;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Entry, LogBook};

// -- JWT Claims --

/// JWT claims shared between token issuance (auth handlers) and the
/// request-gating middleware. Canonical definition lives here in
/// jotter-types to eliminate duplication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user_id: Uuid,
    pub token: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user_id: Uuid,
    pub username: String,
    pub token: String,
}

// -- Log books --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateBookRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

/// Title and description only — the slug is immutable once assigned.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateBookRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Serialize)]
pub struct BookDetailResponse {
    #[serde(flatten)]
    pub book: LogBook,
    pub entries: Vec<Entry>,
}

// -- Entries --

/// Mirrors the entry input form: a kind selector plus one raw field per
/// kind. Only the field matching `kind` is read; the number array arrives
/// as the raw comma- or newline-separated text block the user typed.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EntryInput {
    pub kind: PayloadKind,
    pub occurred_at: Option<DateTime<Utc>>,
    pub number: Option<f64>,
    pub number_array: Option<String>,
    pub short_text: Option<String>,
    pub long_text: Option<String>,
}
