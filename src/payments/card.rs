use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info};

use super::{Checkout, CheckoutRequest, PaymentProvider, dto, http_client, to_minor_units};
use crate::config;
use crate::error::AppError;
use crate::models::PaymentMethod;

const PROVIDER: &str = "card provider";

#[derive(Clone, Debug)]
pub struct CardConfig {
    pub secret_key: String,
    pub api_base: String,
    pub timeout: Duration,
}

impl CardConfig {
    pub fn new_from_env() -> Result<Self, AppError> {
        let secret_key = config::required("PAYMENT_SECRET_KEY")?;
        let api_base = config::var_or("CARD_API_BASE", "https://api.stripe.com");

        Ok(Self {
            secret_key,
            api_base: api_base.trim_end_matches('/').to_string(),
            timeout: config::provider_timeout()?,
        })
    }
}

/// Direct-charge provider speaking the Stripe payment-intent API.
pub struct CardProvider {
    client: Client,
    config: CardConfig,
}

impl CardProvider {
    pub fn new(config: CardConfig) -> Result<Self, AppError> {
        let client = http_client(config.timeout)?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl PaymentProvider for CardProvider {
    fn method(&self) -> PaymentMethod {
        PaymentMethod::Card
    }

    async fn open_checkout(&self, request: &CheckoutRequest) -> Result<Checkout, AppError> {
        let amount = to_minor_units(request.amount);
        if amount <= 0 {
            return Err(AppError::BadRequest("amount must be positive".to_string()));
        }

        let url = format!("{}/v1/payment_intents", self.config.api_base);
        let form = [
            ("amount", amount.to_string()),
            ("currency", request.currency.to_lowercase()),
            ("payment_method_types[]", "card".to_string()),
            ("receipt_email", request.customer.email.clone()),
            ("description", request.product_name.clone()),
            ("metadata[transaction_id]", request.transaction_id.clone()),
        ];

        debug!("Creating payment intent for {} {}", amount, request.currency);

        let response = self.client
            .post(&url)
            .bearer_auth(&self.config.secret_key)
            .form(&form)
            .send()
            .await
            .map_err(|e| AppError::from_provider(PROVIDER, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<dto::CardErrorEnvelope>(&body)
                .ok()
                .and_then(|envelope| envelope.error.message.or(envelope.error.kind))
                .unwrap_or(body);
            return Err(AppError::Upstream(format!("{} error {}: {}", PROVIDER, status, message)));
        }

        let intent: dto::PaymentIntent = response
            .json()
            .await
            .map_err(|e| AppError::from_provider(PROVIDER, e))?;

        let client_secret = intent.client_secret.ok_or_else(|| {
            AppError::Upstream(format!("{} returned intent {} without a client secret", PROVIDER, intent.id))
        })?;

        info!("Payment intent {} created", intent.id);
        Ok(Checkout::ClientSecret {
            intent_id: intent.id,
            client_secret,
        })
    }
}
