use axum::extract::{Path, Query};
use axum::{Extension, Json, extract::State, http::StatusCode};
use serde::Deserialize;

use crate::auth::IdentityClaims;
use crate::db::repository;
use crate::error::AppError;
use crate::models::{CartEntry, NewCartEntryRequest};
use crate::state::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct CartQueryParams {
    student_email: Option<String>,
}

/// Students only see their own cart; naming anyone else yields `[]`.
pub(super) async fn list_cart(
    State(state): State<AppState>,
    Extension(claims): Extension<IdentityClaims>,
    Query(params): Query<CartQueryParams>,
) -> Result<Json<Vec<CartEntry>>, AppError> {
    let Some(email) = params.student_email.filter(|e| *e == claims.email) else {
        return Ok(Json(Vec::new()));
    };
    let entries = repository::fetch_cart_entries(&state.db, &email).await?;
    Ok(Json(entries))
}

pub(super) async fn add_to_cart(
    State(state): State<AppState>,
    Extension(claims): Extension<IdentityClaims>,
    Json(req): Json<NewCartEntryRequest>,
) -> Result<Json<CartEntry>, AppError> {
    let class = repository::find_class(&state.db, &req.class_id)
        .await?
        .ok_or(AppError::NotFound)?;
    let entry = repository::insert_cart_entry(&state.db, &claims.email, &class).await?;
    Ok(Json(entry))
}

pub(super) async fn remove_from_cart(
    State(state): State<AppState>,
    Extension(claims): Extension<IdentityClaims>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    if repository::delete_cart_entry(&state.db, &id, &claims.email).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound)
    }
}
