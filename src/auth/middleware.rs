use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use tracing::debug;

use super::IdentityClaims;
use crate::db::repository;
use crate::error::AppError;
use crate::models::Role;
use crate::state::AppState;

/// Validates the bearer token and stores its claims in the request
/// extensions. Missing or invalid tokens stop the request with 401.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AppError::Unauthorized)?;

    let claims = state.tokens.verify(token)?;
    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}

/// Must be layered inside `require_auth`.
pub async fn require_admin(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    require_role(&state, Role::Admin, req, next).await
}

/// Must be layered inside `require_auth`.
pub async fn require_instructor(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    require_role(&state, Role::Instructor, req, next).await
}

async fn require_role(
    state: &AppState,
    required: Role,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let email = req
        .extensions()
        .get::<IdentityClaims>()
        .map(|claims| claims.email.clone())
        .ok_or(AppError::Unauthorized)?;

    let user = repository::find_user_by_email(&state.db, &email).await?;
    if user.map(|u| u.role) != Some(required) {
        debug!("{} lacks role {}", email, required);
        return Err(AppError::Forbidden);
    }

    Ok(next.run(req).await)
}
