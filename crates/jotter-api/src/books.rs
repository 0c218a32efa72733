use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use tracing::warn;
use uuid::Uuid;

use jotter_core::payload::TITLE_MAX;
use jotter_core::slug;
use jotter_db::models::BookRow;
use jotter_types::api::{BookDetailResponse, Claims, CreateBookRequest, UpdateBookRequest};
use jotter_types::models::LogBook;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::{blocking, entries, parse_uuid, time};

/// How often the create path re-runs slug allocation after losing the
/// insert race before giving up with a conflict.
const SLUG_RETRY_LIMIT: u32 = 3;

pub async fn list_books(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<LogBook>>, ApiError> {
    let db = state.clone();
    let owner = claims.sub.to_string();
    let rows = blocking(move || db.db.list_books(&owner)).await?;

    Ok(Json(rows.into_iter().map(book_model).collect()))
}

pub async fn create_book(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateBookRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let title = validated_title(&req.title)?;
    let description = req.description;
    let owner_id = claims.sub;
    let base = slug::slugify(&title);

    for attempt in 0..SLUG_RETRY_LIMIT {
        let book_id = Uuid::new_v4();

        let db = state.clone();
        let owner = owner_id.to_string();
        let id = book_id.to_string();
        let slug_base = base.clone();
        let book_title = title.clone();
        let book_description = description.clone();

        // Allocation probe and insert run in the same blocking hop. A
        // concurrent creation that grabs the candidate first surfaces as a
        // unique violation, and allocation re-runs against the new state.
        let result = blocking(move || {
            let slug = slug::allocate(&slug_base, |candidate| {
                db.db.book_slug_exists(&owner, candidate)
            })?;
            db.db
                .insert_book(&id, &owner, &book_title, &slug, &book_description)?;
            Ok(slug)
        })
        .await;

        match result {
            Ok(slug) => {
                let now = Utc::now();
                return Ok((
                    StatusCode::CREATED,
                    Json(LogBook {
                        id: book_id,
                        owner_id,
                        title,
                        slug,
                        description,
                        created_at: now,
                        updated_at: now,
                    }),
                ));
            }
            Err(e) if jotter_db::is_unique_violation(&e) => {
                warn!(
                    "slug allocation for '{}' lost a concurrent race (attempt {})",
                    base,
                    attempt + 1
                );
            }
            Err(e) => return Err(e.into()),
        }
    }

    Err(ApiError::Conflict(
        "could not allocate a unique slug, retry the request".into(),
    ))
}

pub async fn get_book(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<BookDetailResponse>, ApiError> {
    let row = resolve_book(&state, claims.sub, &slug).await?;

    let db = state.clone();
    let book_id = row.id.clone();
    let entry_rows = blocking(move || db.db.list_entries(&book_id)).await?;

    let entries = entry_rows.into_iter().map(entries::entry_model).collect();
    Ok(Json(BookDetailResponse {
        book: book_model(row),
        entries,
    }))
}

pub async fn update_book(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateBookRequest>,
) -> Result<Json<LogBook>, ApiError> {
    let title = validated_title(&req.title)?;

    let db = state.clone();
    let owner = claims.sub.to_string();
    let book_slug = slug.clone();
    let description = req.description;
    let updated = blocking(move || {
        if !db.db.update_book(&owner, &book_slug, &title, &description)? {
            return Ok(None);
        }
        db.db.get_book(&owner, &book_slug)
    })
    .await?;

    let row = updated.ok_or(ApiError::NotFound)?;
    Ok(Json(book_model(row)))
}

pub async fn delete_book(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Extension(claims): Extension<Claims>,
) -> Result<StatusCode, ApiError> {
    let db = state.clone();
    let owner = claims.sub.to_string();
    let deleted = blocking(move || db.db.delete_book(&owner, &slug)).await?;

    if !deleted {
        return Err(ApiError::NotFound);
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Load a book owned by the current principal — the one gate every book
/// and entry operation passes through. A miss is NotFound regardless of
/// cause, so existence never leaks across owners.
pub(crate) async fn resolve_book(
    state: &AppState,
    owner_id: Uuid,
    slug: &str,
) -> Result<BookRow, ApiError> {
    let db = state.clone();
    let owner = owner_id.to_string();
    let slug = slug.to_string();

    blocking(move || db.db.get_book(&owner, &slug))
        .await?
        .ok_or(ApiError::NotFound)
}

pub(crate) fn book_model(row: BookRow) -> LogBook {
    LogBook {
        id: parse_uuid(&row.id, "book id"),
        owner_id: parse_uuid(&row.owner_id, "owner id"),
        created_at: time::from_db_time(&row.created_at, "created_at", &row.id),
        updated_at: time::from_db_time(&row.updated_at, "updated_at", &row.id),
        title: row.title,
        slug: row.slug,
        description: row.description,
    }
}

fn validated_title(raw: &str) -> Result<String, ApiError> {
    let title = raw.trim();
    if title.is_empty() {
        return Err(ApiError::Validation {
            field: "title",
            message: "must not be empty".into(),
        });
    }
    if title.chars().count() > TITLE_MAX {
        return Err(ApiError::Validation {
            field: "title",
            message: format!("must be at most {} characters", TITLE_MAX),
        });
    }
    Ok(title.to_string())
}
