use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::{error, info, warn};

use crate::auth::IdentityClaims;
use crate::config::CheckoutUrls;
use crate::db::repository;
use crate::error::AppError;
use crate::models::{CartEntry, Class, GatewayTransaction, NewPaymentRequest, PaymentRecord};
use crate::payments::{
    Callbacks, Checkout, CheckoutRequest, Customer, PaymentProvider, new_transaction_id,
};

/// Body of `POST /gateway-sessions`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewaySessionRequest {
    pub cart_entry_id: String,
    pub name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewaySession {
    pub url: String,
    pub transaction_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalizedPayment {
    pub payment: PaymentRecord,
    pub cart_entry_removed: bool,
}

/// Result of a gateway confirmation callback.
#[derive(Debug)]
pub enum Confirmation {
    /// This call moved the transaction to paid and finalized the enrollment.
    Confirmed {
        payment: PaymentRecord,
        redirect_url: String,
    },
    /// The transaction was already paid; nothing changed.
    Duplicate { transaction_id: String },
}

/// Coordinates a seat purchase through either provider and owns the
/// bookkeeping both paths share: payment record, cart removal, seat count.
pub struct EnrollmentService {
    db: SqlitePool,
    card: Arc<dyn PaymentProvider>,
    gateway: Arc<dyn PaymentProvider>,
    urls: Arc<CheckoutUrls>,
}

impl EnrollmentService {
    pub fn new(
        db: SqlitePool,
        card: Arc<dyn PaymentProvider>,
        gateway: Arc<dyn PaymentProvider>,
        urls: Arc<CheckoutUrls>,
    ) -> Self {
        Self { db, card, gateway, urls }
    }

    /// Asks the card provider for a payment intent and returns its client
    /// secret. Nothing is stored; the client completes the charge and calls
    /// [`finalize_direct_payment`](Self::finalize_direct_payment).
    pub async fn create_charge_intent(
        &self,
        claims: &IdentityClaims,
        price: f64,
        currency: &str,
    ) -> Result<String, AppError> {
        validate_amount(price)?;

        let request = CheckoutRequest {
            transaction_id: new_transaction_id(),
            amount: price,
            currency: currency.to_string(),
            product_name: "Class enrollment".to_string(),
            customer: Customer {
                name: claims.name.clone(),
                email: claims.email.clone(),
                ..Customer::default()
            },
            callbacks: None,
        };

        match self.card.open_checkout(&request).await? {
            Checkout::ClientSecret { intent_id, client_secret } => {
                info!("Charge intent {} issued to {}", intent_id, claims.email);
                Ok(client_secret)
            }
            Checkout::Redirect { .. } => Err(AppError::Upstream(
                "card provider answered with a redirect checkout".to_string(),
            )),
        }
    }

    /// Records a card payment the client already completed and removes the
    /// cart entry it settles. The seat counter is left alone; clients call
    /// [`increment_enrollment`](Self::increment_enrollment) separately.
    pub async fn finalize_direct_payment(
        &self,
        student_email: &str,
        req: NewPaymentRequest,
    ) -> Result<FinalizedPayment, AppError> {
        validate_amount(req.amount)?;

        let payment = PaymentRecord {
            id: repository::new_id(),
            student_email: student_email.to_string(),
            class_id: req.class_id,
            class_title: req.class_title,
            amount: req.amount,
            currency: req.currency,
            method: self.card.method(),
            transaction_id: req.transaction_id,
            created_at: repository::now(),
        };

        let mut tx = self.db.begin().await?;
        repository::insert_payment(&mut *tx, &payment).await?;
        let cart_entry_removed =
            repository::delete_cart_entry(&mut *tx, &req.cart_entry_id, student_email).await?;
        tx.commit().await?;

        if !cart_entry_removed {
            warn!(
                "Payment {} recorded but cart entry {} was not found",
                payment.id, req.cart_entry_id
            );
        }
        info!("Recorded {} payment {} for {}", payment.method.as_str(), payment.id, student_email);

        Ok(FinalizedPayment { payment, cart_entry_removed })
    }

    pub async fn increment_enrollment(&self, class_id: &str) -> Result<Class, AppError> {
        let class = repository::increment_enrollment(&self.db, class_id)
            .await?
            .ok_or(AppError::NotFound)?;
        info!("Class {} now has {} enrolled", class.id, class.seats_enrolled);
        Ok(class)
    }

    /// Opens a hosted checkout for one of the caller's cart entries. The
    /// transaction is persisted only after the gateway accepted the session.
    pub async fn initiate_gateway_session(
        &self,
        claims: &IdentityClaims,
        req: GatewaySessionRequest,
    ) -> Result<GatewaySession, AppError> {
        let entry = repository::find_cart_entry(&self.db, &req.cart_entry_id)
            .await?
            .filter(|entry| entry.student_email == claims.email)
            .ok_or(AppError::NotFound)?;
        validate_amount(entry.price)?;

        let transaction_id = new_transaction_id();
        let request = CheckoutRequest {
            transaction_id: transaction_id.clone(),
            amount: entry.price,
            currency: entry.currency.clone(),
            product_name: entry.title.clone(),
            customer: Customer {
                name: req.name.or_else(|| claims.name.clone()),
                email: claims.email.clone(),
                address: req.address,
                phone: req.phone,
            },
            callbacks: Some(Callbacks {
                success_url: self.urls.confirm_url(&transaction_id),
                fail_url: self.urls.fail_url.clone(),
                cancel_url: self.urls.cancel_url.clone(),
                ipn_url: self.urls.ipn_url.clone(),
            }),
        };

        let url = match self.gateway.open_checkout(&request).await? {
            Checkout::Redirect { url, .. } => url,
            Checkout::ClientSecret { .. } => {
                return Err(AppError::Upstream(
                    "gateway answered with a client-secret checkout".to_string(),
                ));
            }
        };

        let txn = pending_transaction(&transaction_id, &entry)?;
        repository::insert_gateway_transaction(&self.db, &txn).await?;
        info!("Gateway session {} opened for cart entry {}", transaction_id, entry.id);

        Ok(GatewaySession { url, transaction_id })
    }

    /// Applies the gateway's confirmation callback. Only the call that flips
    /// `paid_status` from false to true records the payment, clears the cart
    /// entry and takes the seat; repeats are reported as duplicates. A class
    /// removed since checkout leaves the transaction unpaid.
    pub async fn confirm_gateway_session(
        &self,
        transaction_id: &str,
    ) -> Result<Confirmation, AppError> {
        let mut tx = self.db.begin().await?;

        let Some(txn) = repository::mark_gateway_transaction_paid(&mut *tx, transaction_id).await?
        else {
            let existing = repository::find_gateway_transaction(&mut *tx, transaction_id).await?;
            return match existing {
                Some(txn) if txn.paid_status => {
                    info!("Duplicate confirmation for {}", transaction_id);
                    Ok(Confirmation::Duplicate {
                        transaction_id: transaction_id.to_string(),
                    })
                }
                _ => Err(AppError::NotFound),
            };
        };

        let payment = PaymentRecord {
            id: repository::new_id(),
            student_email: txn.student_email.clone(),
            class_id: txn.class_id.clone(),
            class_title: txn
                .class_info
                .get("title")
                .and_then(|v| v.as_str())
                .map(str::to_string),
            amount: txn.amount,
            currency: txn.currency.clone(),
            method: self.gateway.method(),
            transaction_id: Some(txn.transaction_id.clone()),
            created_at: repository::now(),
        };

        repository::insert_payment(&mut *tx, &payment).await?;
        if !repository::delete_cart_entry(&mut *tx, &txn.cart_entry_id, &txn.student_email).await? {
            warn!("Cart entry {} already gone at confirmation", txn.cart_entry_id);
        }
        if repository::increment_enrollment(&mut *tx, &txn.class_id).await?.is_none() {
            // Dropping the transaction rolls back the paid flip and the payment.
            warn!("Class {} not found while confirming {}", txn.class_id, transaction_id);
            return Err(AppError::NotFound);
        }
        tx.commit().await?;

        info!("Gateway transaction {} confirmed", transaction_id);
        Ok(Confirmation::Confirmed {
            payment,
            redirect_url: self.urls.success_redirect(transaction_id),
        })
    }
}

fn validate_amount(amount: f64) -> Result<(), AppError> {
    if amount.is_finite() && amount > 0.0 {
        Ok(())
    } else {
        Err(AppError::BadRequest("amount must be a positive number".to_string()))
    }
}

fn pending_transaction(
    transaction_id: &str,
    entry: &CartEntry,
) -> Result<GatewayTransaction, AppError> {
    let class_info = serde_json::to_value(entry).map_err(|e| {
        error!("Failed to snapshot cart entry {}: {}", entry.id, e);
        AppError::InternalServerError
    })?;

    Ok(GatewayTransaction {
        transaction_id: transaction_id.to_string(),
        cart_entry_id: entry.id.clone(),
        class_id: entry.class_id.clone(),
        student_email: entry.student_email.clone(),
        class_info,
        amount: entry.price,
        currency: entry.currency.clone(),
        paid_status: false,
        created_at: repository::now(),
        paid_at: None,
    })
}
