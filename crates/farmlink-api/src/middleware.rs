use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::debug;

use farmlink_types::models::User;

use crate::error::ApiError;
use crate::state::{AppState, run_blocking};

/// Header carrying the identity provider's opaque user id.
pub const IDENTITY_HEADER: &str = "x-clerk-user-id";

/// The caller, resolved once per request by [`require_user`].
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// Resolve the identity header to a stored user and attach it as an
/// extension. Missing header is 401; an unknown identity is 404.
pub async fn require_user(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let clerk_id = req
        .headers()
        .get(IDENTITY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(ApiError::Unauthorized)?
        .to_string();

    let user = run_blocking(&state, move |db| db.get_user_by_clerk_id(&clerk_id))
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;

    debug!("Resolved caller {} ({})", user.id, user.role);
    req.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(req).await)
}
