pub mod card;
pub mod dto;
pub mod gateway;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::PaymentMethod;

pub use card::{CardConfig, CardProvider};
pub use gateway::{GatewayConfig, GatewayProvider};

#[derive(Debug, Clone, Default)]
pub struct Customer {
    pub name: Option<String>,
    pub email: String,
    pub address: Option<String>,
    pub phone: Option<String>,
}

/// Destinations a hosted checkout sends the buyer to.
#[derive(Debug, Clone)]
pub struct Callbacks {
    pub success_url: String,
    pub fail_url: String,
    pub cancel_url: String,
    pub ipn_url: String,
}

#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub transaction_id: String,
    /// Amount in major currency units, as stored on the class.
    pub amount: f64,
    pub currency: String,
    pub product_name: String,
    pub customer: Customer,
    pub callbacks: Option<Callbacks>,
}

/// What a provider hands back when it accepts a checkout.
#[derive(Debug, Clone, PartialEq)]
pub enum Checkout {
    /// The client finishes the charge itself with this secret.
    ClientSecret { intent_id: String, client_secret: String },
    /// The buyer is sent to the provider's hosted page.
    Redirect { url: String, session_key: Option<String> },
}

#[async_trait]
pub trait PaymentProvider: Send + Sync {
    fn method(&self) -> PaymentMethod;

    async fn open_checkout(&self, request: &CheckoutRequest) -> Result<Checkout, AppError>;
}

/// Converts a major-unit amount to minor units, truncating toward zero.
pub fn to_minor_units(amount: f64) -> i64 {
    (amount * 100.0).trunc() as i64
}

/// Fresh correlation id for a gateway checkout. 24 hex chars keeps it within
/// the gateway's `tran_id` length limit.
pub fn new_transaction_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(24);
    id
}

pub(crate) fn http_client(timeout: Duration) -> Result<Client, AppError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| AppError::Config(format!("Failed to build http client: {}", e)))
}
