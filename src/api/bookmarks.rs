use axum::extract::Query;
use axum::{Extension, Json, extract::State};
use serde::Deserialize;

use crate::auth::IdentityClaims;
use crate::db::repository;
use crate::error::AppError;
use crate::models::{Bookmark, InsertOutcome, NewBookmarkRequest};
use crate::state::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct BookmarkQueryParams {
    student_email: Option<String>,
}

pub(super) async fn list_bookmarks(
    State(state): State<AppState>,
    Extension(claims): Extension<IdentityClaims>,
    Query(params): Query<BookmarkQueryParams>,
) -> Result<Json<Vec<Bookmark>>, AppError> {
    let Some(email) = params.student_email.filter(|e| *e == claims.email) else {
        return Ok(Json(Vec::new()));
    };
    let bookmarks = repository::fetch_bookmarks(&state.db, &email).await?;
    Ok(Json(bookmarks))
}

pub(super) async fn add_bookmark(
    State(state): State<AppState>,
    Extension(claims): Extension<IdentityClaims>,
    Json(req): Json<NewBookmarkRequest>,
) -> Result<Json<InsertOutcome<Bookmark>>, AppError> {
    let outcome = match repository::insert_bookmark_if_absent(&state.db, &claims.email, req).await? {
        Some(bookmark) => InsertOutcome::Inserted(bookmark),
        None => InsertOutcome::already_exists("bookmark"),
    };
    Ok(Json(outcome))
}
