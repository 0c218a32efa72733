use axum::{
    Json, Router,
    middleware::from_fn,
    routing::{get, post, put},
};

use crate::auth::{self, AppState};
use crate::middleware::require_auth;
use crate::{books, entries};

/// Public routes are structurally exempt from the login gate; everything
/// else sits behind require_auth.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/healthz", get(health))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/me", get(auth::me))
        .route("/books", get(books::list_books).post(books::create_book))
        .route(
            "/books/{slug}",
            get(books::get_book)
                .put(books::update_book)
                .delete(books::delete_book),
        )
        .route("/books/{slug}/entries", post(entries::create_entry))
        .route(
            "/books/{slug}/entries/{entry_id}",
            put(entries::update_entry).delete(entries::delete_entry),
        )
        .layer(from_fn(require_auth))
        .with_state(state);

    Router::new().merge(public_routes).merge(protected_routes)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
