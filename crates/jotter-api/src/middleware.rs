use axum::{
    extract::Request,
    http::header,
    middleware::Next,
    response::{Redirect, Response},
};
use jsonwebtoken::{DecodingKey, Validation, decode};

use jotter_types::api::Claims;

/// Extract and validate the bearer JWT from the Authorization header.
///
/// Requests without a valid principal are redirected to the login entry
/// point rather than answered with an error status. The auth routes and
/// the health probe live on the unprotected router and never pass through
/// here.
pub async fn require_auth(mut req: Request, next: Next) -> Result<Response, Redirect> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(login_redirect)?;

    let secret =
        std::env::var("JOTTER_JWT_SECRET").unwrap_or_else(|_| "dev-secret-change-me".into());

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| login_redirect())?;

    req.extensions_mut().insert(token_data.claims);
    Ok(next.run(req).await)
}

fn login_redirect() -> Redirect {
    Redirect::to("/auth/login")
}
