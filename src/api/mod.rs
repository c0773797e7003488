mod bookmarks;
mod carts;
mod classes;
mod identity;
mod payments;
mod users;

use axum::routing::{delete, patch, post};
use axum::{Router, extract::State, http::StatusCode, middleware, routing::get};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::{require_admin, require_auth, require_instructor};
use crate::error::AppError;
use crate::state::AppState;

/// Builds the full route table once. Guards are attached per group so the
/// token check always runs before any role lookup.
pub fn router(state: AppState) -> Router {
    let admin = Router::new()
        .route("/users", get(users::list_users))
        .route("/users/{id}", delete(users::delete_user))
        .route("/users/{id}/role", patch(users::update_role))
        .route("/classes/{id}/status", patch(classes::update_status))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin));

    let instructor = Router::new()
        .route("/classes", post(classes::create_class))
        .route("/classes/{id}", delete(classes::delete_class))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_instructor));

    let authenticated = Router::new()
        .route("/users/admin/{email}", get(users::check_admin))
        .route("/users/instructor/{email}", get(users::check_instructor))
        .route("/carts", get(carts::list_cart).post(carts::add_to_cart))
        .route("/carts/{id}", delete(carts::remove_from_cart))
        .route("/bookmarks", get(bookmarks::list_bookmarks).post(bookmarks::add_bookmark))
        .route("/charge-intents", post(payments::create_charge_intent))
        .route("/classes/{id}/enrollment", patch(classes::increment_enrollment))
        .route(
            "/payments",
            get(payments::list_payments)
                .post(payments::finalize_payment)
                .delete(payments::delete_payments),
        )
        .route("/gateway-sessions", post(payments::initiate_gateway_session))
        .merge(admin)
        .merge(instructor)
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/health", get(health))
        .route("/identity-tokens", post(identity::issue_token))
        .route("/users", post(users::create_user))
        .route("/instructors", get(users::list_instructors))
        .route("/classes", get(classes::list_classes))
        .route("/classes/{id}", get(classes::get_class))
        .route(
            "/gateway-sessions/{transaction_id}/confirm",
            post(payments::confirm_gateway_session),
        )
        .merge(authenticated)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    sqlx::query("select 1").execute(&state.db).await?;
    Ok(StatusCode::OK)
}
