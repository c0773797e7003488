use axum::extract::Path;
use axum::{Extension, Json, extract::State, http::StatusCode};
use serde::Serialize;

use crate::auth::IdentityClaims;
use crate::db::repository;
use crate::error::AppError;
use crate::models::{InsertOutcome, NewUserRequest, Role, UpdateRoleRequest, User};
use crate::state::AppState;

#[derive(Serialize)]
pub(super) struct AdminCheck {
    admin: bool,
}

#[derive(Serialize)]
pub(super) struct InstructorCheck {
    instructor: bool,
}

pub(super) async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<User>>, AppError> {
    let users = repository::fetch_users(&state.db).await?;
    Ok(Json(users))
}

pub(super) async fn list_instructors(
    State(state): State<AppState>,
) -> Result<Json<Vec<User>>, AppError> {
    let users = repository::fetch_users_by_role(&state.db, Role::Instructor).await?;
    Ok(Json(users))
}

/// Called on every sign-in; registering an existing email is a no-op.
pub(super) async fn create_user(
    State(state): State<AppState>,
    Json(mut req): Json<NewUserRequest>,
) -> Result<Json<InsertOutcome<User>>, AppError> {
    req.email = req.email.trim().to_string();
    if req.email.is_empty() {
        return Err(AppError::BadRequest("email is required".to_string()));
    }

    let outcome = match repository::insert_user_if_absent(&state.db, req).await? {
        Some(user) => InsertOutcome::Inserted(user),
        None => InsertOutcome::already_exists("user"),
    };
    Ok(Json(outcome))
}

pub(super) async fn update_role(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateRoleRequest>,
) -> Result<Json<User>, AppError> {
    let user = repository::update_user_role(&state.db, &id, req.role)
        .await?
        .ok_or(AppError::NotFound)?;
    tracing::info!("User {} is now {}", user.email, user.role);
    Ok(Json(user))
}

pub(super) async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    if repository::delete_user(&state.db, &id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound)
    }
}

pub(super) async fn check_admin(
    State(state): State<AppState>,
    Extension(claims): Extension<IdentityClaims>,
    Path(email): Path<String>,
) -> Result<Json<AdminCheck>, AppError> {
    let admin = has_role(&state, &claims, &email, Role::Admin).await?;
    Ok(Json(AdminCheck { admin }))
}

pub(super) async fn check_instructor(
    State(state): State<AppState>,
    Extension(claims): Extension<IdentityClaims>,
    Path(email): Path<String>,
) -> Result<Json<InstructorCheck>, AppError> {
    let instructor = has_role(&state, &claims, &email, Role::Instructor).await?;
    Ok(Json(InstructorCheck { instructor }))
}

/// Callers may only ask about themselves; asking about anyone else answers
/// `false` without touching the store.
async fn has_role(
    state: &AppState,
    claims: &IdentityClaims,
    email: &str,
    role: Role,
) -> Result<bool, AppError> {
    if claims.email != email {
        return Ok(false);
    }
    let user = repository::find_user_by_email(&state.db, email).await?;
    Ok(user.is_some_and(|u| u.role == role))
}
