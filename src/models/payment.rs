use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::UnknownVariant;
use super::class::default_currency;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Card charge completed client-side against a provider intent.
    Card,
    /// Hosted checkout confirmed by the gateway callback.
    Gateway,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Card => "card",
            PaymentMethod::Gateway => "gateway",
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "card" => Ok(PaymentMethod::Card),
            "gateway" => Ok(PaymentMethod::Gateway),
            other => Err(UnknownVariant { kind: "payment method", value: other.to_string() }),
        }
    }
}

impl TryFrom<String> for PaymentMethod {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Append-only record of a completed purchase.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRecord {
    pub id: String,
    pub student_email: String,
    pub class_id: String,
    pub class_title: Option<String>,
    pub amount: f64,
    pub currency: String,
    #[sqlx(try_from = "String")]
    pub method: PaymentMethod,
    pub transaction_id: Option<String>,
    pub created_at: String,
}

/// Body of `POST /payments`: the payment the client completed out-of-band plus
/// the cart entry it settles.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPaymentRequest {
    pub cart_entry_id: String,
    pub class_id: String,
    pub class_title: Option<String>,
    pub amount: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
    pub transaction_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentFilter {
    pub student_email: Option<String>,
    pub class_id: Option<String>,
}

impl PaymentFilter {
    pub fn is_empty(&self) -> bool {
        self.student_email.is_none() && self.class_id.is_none()
    }
}

/// Bookkeeping row for a hosted-gateway checkout, keyed by the transaction id
/// handed to the gateway.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct GatewayTransaction {
    pub transaction_id: String,
    pub cart_entry_id: String,
    pub class_id: String,
    pub student_email: String,
    #[sqlx(json)]
    pub class_info: serde_json::Value,
    pub amount: f64,
    pub currency: String,
    pub paid_status: bool,
    pub created_at: String,
    pub paid_at: Option<String>,
}
