use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use chrono::Utc;

use crate::{
    error::{AppError, Result},
    services::access,
    state::AppState,
};

/// The header naming the menu a request is made against.
pub const MENU_HEADER: &str = "app-menu-id";

/// Extracts the bearer token from the `Authorization` header.
fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// A middleware that requires a valid token and a menu the token grants the
/// request method on.
///
/// On success the verified `SessionClaims` and the acting `Actor` are attached
/// as request extensions.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response> {
    tracing::debug!("🔐 Checking authentication...");

    let token = extract_bearer_token(request.headers()).ok_or_else(|| {
        tracing::warn!("❌ No bearer token found");
        AppError::Authentication("Missing bearer token".to_string())
    })?;

    let claims = state.tokens.verify(token, Utc::now())?;

    let menu_id = request
        .headers()
        .get(MENU_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    let actor = access::authorize(&claims, menu_id, request.method().as_str()).into_result()?;

    tracing::debug!("✅ {} authorized for {} {}", actor.username, request.method(), request.uri().path());

    request.extensions_mut().insert(claims);
    request.extensions_mut().insert(actor);

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_token_is_extracted() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(extract_bearer_token(&headers), Some("abc.def"));
    }

    #[test]
    fn other_schemes_are_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic YWxpY2U="));
        assert_eq!(extract_bearer_token(&headers), None);
        assert_eq!(extract_bearer_token(&HeaderMap::new()), None);
    }
}
