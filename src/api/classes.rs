use axum::extract::{Path, Query};
use axum::{Extension, Json, extract::State, http::StatusCode};

use super::payments::enrollment;
use crate::auth::IdentityClaims;
use crate::db::repository;
use crate::error::AppError;
use crate::models::{Class, ClassQueryParams, ClassStatus, NewClassRequest, UpdateStatusRequest};
use crate::state::AppState;

pub(super) async fn list_classes(
    State(state): State<AppState>,
    Query(params): Query<ClassQueryParams>,
) -> Result<Json<Vec<Class>>, AppError> {
    let classes = repository::fetch_classes(&state.db, &params).await?;
    Ok(Json(classes))
}

pub(super) async fn get_class(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Class>, AppError> {
    let class = repository::find_class(&state.db, &id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(class))
}

pub(super) async fn create_class(
    State(state): State<AppState>,
    Extension(claims): Extension<IdentityClaims>,
    Json(req): Json<NewClassRequest>,
) -> Result<Json<Class>, AppError> {
    if req.title.trim().is_empty() {
        return Err(AppError::BadRequest("title is required".to_string()));
    }
    if !req.price.is_finite() || req.price < 0.0 || req.available_seats < 0 {
        return Err(AppError::BadRequest("price and seats must not be negative".to_string()));
    }

    let class = repository::insert_class(&state.db, &claims.email, req).await?;
    Ok(Json(class))
}

/// Admin review. Only pending -> accepted is allowed.
pub(super) async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<Class>, AppError> {
    if req.status != ClassStatus::Accepted {
        return Err(AppError::BadRequest(
            "class status can only move from pending to accepted".to_string(),
        ));
    }

    let class = repository::accept_class(&state.db, &id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(class))
}

pub(super) async fn delete_class(
    State(state): State<AppState>,
    Extension(claims): Extension<IdentityClaims>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    if repository::delete_class_for_instructor(&state.db, &id, &claims.email).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound)
    }
}

pub(super) async fn increment_enrollment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Class>, AppError> {
    let class = enrollment(&state).increment_enrollment(&id).await?;
    Ok(Json(class))
}
