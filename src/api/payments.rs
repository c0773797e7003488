use axum::extract::{Path, Query};
use axum::response::{IntoResponse, Redirect, Response};
use axum::{Extension, Json, extract::State};
use serde::{Deserialize, Serialize};

use crate::auth::IdentityClaims;
use crate::db::repository;
use crate::error::AppError;
use crate::models::{NewPaymentRequest, PaymentFilter, PaymentRecord, class::default_currency};
use crate::services::{
    Confirmation, EnrollmentService, FinalizedPayment, GatewaySession, GatewaySessionRequest,
};
use crate::state::AppState;

#[derive(Deserialize)]
pub(super) struct ChargeIntentRequest {
    price: f64,
    #[serde(default = "default_currency")]
    currency: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ChargeIntentResponse {
    client_secret: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct DeleteResult {
    deleted_count: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ConfirmationStatus {
    transaction_id: String,
    paid_status: bool,
    duplicate: bool,
}

pub(super) fn enrollment(state: &AppState) -> EnrollmentService {
    EnrollmentService::new(
        state.db.clone(),
        state.card.clone(),
        state.gateway.clone(),
        state.urls.clone(),
    )
}

pub(super) async fn create_charge_intent(
    State(state): State<AppState>,
    Extension(claims): Extension<IdentityClaims>,
    Json(req): Json<ChargeIntentRequest>,
) -> Result<Json<ChargeIntentResponse>, AppError> {
    let client_secret = enrollment(&state)
        .create_charge_intent(&claims, req.price, &req.currency)
        .await?;
    Ok(Json(ChargeIntentResponse { client_secret }))
}

pub(super) async fn finalize_payment(
    State(state): State<AppState>,
    Extension(claims): Extension<IdentityClaims>,
    Json(req): Json<NewPaymentRequest>,
) -> Result<Json<FinalizedPayment>, AppError> {
    let finalized = enrollment(&state)
        .finalize_direct_payment(&claims.email, req)
        .await?;
    Ok(Json(finalized))
}

/// Payment history is scoped to the token subject whatever `studentEmail` the
/// query names.
pub(super) async fn list_payments(
    State(state): State<AppState>,
    Extension(claims): Extension<IdentityClaims>,
    Query(mut filter): Query<PaymentFilter>,
) -> Result<Json<Vec<PaymentRecord>>, AppError> {
    filter.student_email = Some(claims.email);
    let payments = repository::fetch_payments(&state.db, &filter).await?;
    Ok(Json(payments))
}

/// Bulk history removal. An empty filter is refused, and whatever it names
/// only the caller's own records are touched.
pub(super) async fn delete_payments(
    State(state): State<AppState>,
    Extension(claims): Extension<IdentityClaims>,
    Json(mut filter): Json<PaymentFilter>,
) -> Result<Json<DeleteResult>, AppError> {
    if filter.is_empty() {
        return Err(AppError::BadRequest("a payment filter is required".to_string()));
    }
    if filter.student_email.as_deref().is_some_and(|e| e != claims.email) {
        return Ok(Json(DeleteResult { deleted_count: 0 }));
    }
    filter.student_email = Some(claims.email);
    let deleted_count = repository::delete_payments(&state.db, &filter).await?;
    Ok(Json(DeleteResult { deleted_count }))
}

pub(super) async fn initiate_gateway_session(
    State(state): State<AppState>,
    Extension(claims): Extension<IdentityClaims>,
    Json(req): Json<GatewaySessionRequest>,
) -> Result<Json<GatewaySession>, AppError> {
    let session = enrollment(&state)
        .initiate_gateway_session(&claims, req)
        .await?;
    Ok(Json(session))
}

/// Standing callback the gateway posts to once the buyer has paid.
pub(super) async fn confirm_gateway_session(
    State(state): State<AppState>,
    Path(transaction_id): Path<String>,
) -> Result<Response, AppError> {
    let response = match enrollment(&state).confirm_gateway_session(&transaction_id).await? {
        Confirmation::Confirmed { redirect_url, .. } => Redirect::to(&redirect_url).into_response(),
        Confirmation::Duplicate { transaction_id } => Json(ConfirmationStatus {
            transaction_id,
            paid_status: true,
            duplicate: true,
        })
        .into_response(),
    };
    Ok(response)
}
