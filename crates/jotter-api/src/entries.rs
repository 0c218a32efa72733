use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use tracing::warn;
use uuid::Uuid;

use jotter_core::payload::{Payload, PayloadKind, SHORT_TEXT_MAX, parse_number_list};
use jotter_db::models::EntryRow;
use jotter_types::api::{Claims, EntryInput};
use jotter_types::models::Entry;

use crate::auth::AppState;
use crate::books::resolve_book;
use crate::error::ApiError;
use crate::{blocking, parse_uuid, time};

pub async fn create_entry(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Extension(claims): Extension<Claims>,
    Json(input): Json<EntryInput>,
) -> Result<impl IntoResponse, ApiError> {
    let payload = payload_from_input(&input)?;
    let book = resolve_book(&state, claims.sub, &slug).await?;

    let entry_id = Uuid::new_v4();
    let occurred_at = input.occurred_at.unwrap_or_else(Utc::now);

    let db = state.clone();
    let id = entry_id.to_string();
    let book_id = book.id.clone();
    let when = time::to_db_time(occurred_at);
    let stored = payload.clone();
    blocking(move || db.db.insert_entry(&id, &book_id, &when, &stored)).await?;

    let now = Utc::now();
    Ok((
        StatusCode::CREATED,
        Json(Entry {
            id: entry_id,
            book_id: parse_uuid(&book.id, "book id"),
            occurred_at,
            payload,
            created_at: now,
            updated_at: now,
        }),
    ))
}

pub async fn update_entry(
    State(state): State<AppState>,
    Path((slug, entry_id)): Path<(String, Uuid)>,
    Extension(claims): Extension<Claims>,
    Json(input): Json<EntryInput>,
) -> Result<Json<Entry>, ApiError> {
    let payload = payload_from_input(&input)?;
    let book = resolve_book(&state, claims.sub, &slug).await?;

    let db = state.clone();
    let book_id = book.id;
    let id = entry_id.to_string();
    let when = input.occurred_at.map(time::to_db_time);
    let row = blocking(move || {
        if !db.db.update_entry(&book_id, &id, when.as_deref(), &payload)? {
            return Ok(None);
        }
        db.db.get_entry(&book_id, &id)
    })
    .await?;

    let row = row.ok_or(ApiError::NotFound)?;
    Ok(Json(entry_model(row)))
}

pub async fn delete_entry(
    State(state): State<AppState>,
    Path((slug, entry_id)): Path<(String, Uuid)>,
    Extension(claims): Extension<Claims>,
) -> Result<StatusCode, ApiError> {
    let book = resolve_book(&state, claims.sub, &slug).await?;

    let db = state.clone();
    let book_id = book.id;
    let id = entry_id.to_string();
    let deleted = blocking(move || db.db.delete_entry(&book_id, &id)).await?;

    if !deleted {
        return Err(ApiError::NotFound);
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Build the payload from the form-shaped input: the selected kind decides
/// which single field is read, and a missing or malformed field fails the
/// whole request — nothing is persisted partially.
fn payload_from_input(input: &EntryInput) -> Result<Payload, ApiError> {
    match input.kind {
        PayloadKind::Number => {
            let n = input.number.ok_or(ApiError::Validation {
                field: "number",
                message: "required for kind \"number\"".into(),
            })?;
            Ok(Payload::Number(n))
        }
        PayloadKind::NumberArray => {
            let raw = input.number_array.as_deref().unwrap_or_default();
            let numbers = parse_number_list(raw).map_err(|e| ApiError::Validation {
                field: "number_array",
                message: e.to_string(),
            })?;
            Ok(Payload::NumberArray(numbers))
        }
        PayloadKind::ShortText => {
            let text = input.short_text.clone().ok_or(ApiError::Validation {
                field: "short_text",
                message: "required for kind \"short_text\"".into(),
            })?;
            if text.chars().count() > SHORT_TEXT_MAX {
                return Err(ApiError::Validation {
                    field: "short_text",
                    message: format!("must be at most {} characters", SHORT_TEXT_MAX),
                });
            }
            Ok(Payload::ShortText(text))
        }
        PayloadKind::LongText => {
            let text = input.long_text.clone().ok_or(ApiError::Validation {
                field: "long_text",
                message: "required for kind \"long_text\"".into(),
            })?;
            Ok(Payload::LongText(text))
        }
    }
}

pub(crate) fn entry_model(row: EntryRow) -> Entry {
    let payload = decode_payload(&row);

    Entry {
        id: parse_uuid(&row.id, "entry id"),
        book_id: parse_uuid(&row.book_id, "book id"),
        occurred_at: time::from_db_time(&row.occurred_at, "occurred_at", &row.id),
        created_at: time::from_db_time(&row.created_at, "created_at", &row.id),
        updated_at: time::from_db_time(&row.updated_at, "updated_at", &row.id),
        payload,
    }
}

fn decode_payload(row: &EntryRow) -> Payload {
    let numbers = row.number_array.as_deref().and_then(|raw| {
        serde_json::from_str::<Vec<f64>>(raw)
            .map_err(|e| warn!("Corrupt number_array on entry '{}': {}", row.id, e))
            .ok()
    });

    Payload::from_columns(
        row.kind.as_deref(),
        row.number,
        numbers,
        row.short_text.clone(),
        row.long_text.clone(),
    )
    .unwrap_or_else(|| {
        warn!("Entry '{}' has no decodable payload", row.id);
        Payload::LongText(String::new())
    })
}
