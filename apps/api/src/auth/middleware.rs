use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::errors::AppError;
use crate::state::AppState;

pub const SESSION_COOKIE: &str = "hireline_session";

/// Resolves the caller's session once per request and hands it to handlers as
/// an `Extension<Session>`. Requests without a live session stop here.
pub async fn require_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = session_token(request.headers()).ok_or(AppError::Unauthorized)?;
    let session = state
        .sessions
        .resolve(&token)
        .await?
        .ok_or(AppError::Unauthorized)?;

    tracing::debug!(user_id = %session.user_id, "Session resolved");
    request.extensions_mut().insert(session);
    Ok(next.run(request).await)
}

/// Bearer token first, then the session cookie.
fn session_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string())
}
