use axum::{Json, extract::State};

use crate::auth::{IdentityRequest, TokenResponse};
use crate::error::AppError;
use crate::state::AppState;

pub(super) async fn issue_token(
    State(state): State<AppState>,
    Json(identity): Json<IdentityRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let token = state.tokens.issue(identity)?;
    Ok(Json(TokenResponse { token }))
}
