use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info, warn};

use super::{Checkout, CheckoutRequest, PaymentProvider, dto, http_client};
use crate::config;
use crate::error::AppError;
use crate::models::PaymentMethod;

const PROVIDER: &str = "payment gateway";
const SANDBOX_BASE: &str = "https://sandbox.sslcommerz.com";
const LIVE_BASE: &str = "https://securepay.sslcommerz.com";
const SESSION_PATH: &str = "/gwprocess/v4/api.php";

// Shipping and address fields the gateway insists on even for digital goods.
const DEFAULT_CITY: &str = "Dhaka";
const DEFAULT_POSTCODE: &str = "1000";
const DEFAULT_COUNTRY: &str = "Bangladesh";
const NOT_PROVIDED: &str = "N/A";

#[derive(Clone, Debug)]
pub struct GatewayConfig {
    pub store_id: String,
    pub store_passwd: String,
    pub is_live: bool,
    pub api_base: String,
    pub timeout: Duration,
}

impl GatewayConfig {
    pub fn new_from_env() -> Result<Self, AppError> {
        let store_id = config::required("STORE_ID")?;
        let store_passwd = config::required("STORE_PASS")?;
        let is_live = config::parse_var("GATEWAY_IS_LIVE", false)?;
        let default_base = if is_live { LIVE_BASE } else { SANDBOX_BASE };
        let api_base = config::var_or("GATEWAY_API_BASE", default_base);

        Ok(Self {
            store_id,
            store_passwd,
            is_live,
            api_base: api_base.trim_end_matches('/').to_string(),
            timeout: config::provider_timeout()?,
        })
    }
}

/// Redirect-based provider speaking the SSLCommerz session API.
pub struct GatewayProvider {
    client: Client,
    config: GatewayConfig,
}

impl GatewayProvider {
    pub fn new(config: GatewayConfig) -> Result<Self, AppError> {
        let client = http_client(config.timeout)?;
        Ok(Self { client, config })
    }

    fn session_form(&self, request: &CheckoutRequest) -> Result<Vec<(&'static str, String)>, AppError> {
        let callbacks = request.callbacks.as_ref().ok_or_else(|| {
            AppError::BadRequest("hosted checkout needs callback urls".to_string())
        })?;
        let customer = &request.customer;
        let name = customer.name.clone().unwrap_or_else(|| customer.email.clone());
        let address = customer.address.clone().unwrap_or_else(|| NOT_PROVIDED.to_string());
        let phone = customer.phone.clone().unwrap_or_else(|| NOT_PROVIDED.to_string());

        Ok(vec![
            ("store_id", self.config.store_id.clone()),
            ("store_passwd", self.config.store_passwd.clone()),
            ("total_amount", format!("{:.2}", request.amount)),
            ("currency", request.currency.to_uppercase()),
            ("tran_id", request.transaction_id.clone()),
            ("success_url", callbacks.success_url.clone()),
            ("fail_url", callbacks.fail_url.clone()),
            ("cancel_url", callbacks.cancel_url.clone()),
            ("ipn_url", callbacks.ipn_url.clone()),
            ("shipping_method", "NO".to_string()),
            ("product_name", request.product_name.clone()),
            ("product_category", "Education".to_string()),
            ("product_profile", "non-physical-goods".to_string()),
            ("num_of_item", "1".to_string()),
            ("cus_name", name.clone()),
            ("cus_email", customer.email.clone()),
            ("cus_add1", address.clone()),
            ("cus_city", DEFAULT_CITY.to_string()),
            ("cus_state", DEFAULT_CITY.to_string()),
            ("cus_postcode", DEFAULT_POSTCODE.to_string()),
            ("cus_country", DEFAULT_COUNTRY.to_string()),
            ("cus_phone", phone),
            ("ship_name", name),
            ("ship_add1", address),
            ("ship_city", DEFAULT_CITY.to_string()),
            ("ship_postcode", DEFAULT_POSTCODE.to_string()),
            ("ship_country", DEFAULT_COUNTRY.to_string()),
        ])
    }
}

#[async_trait]
impl PaymentProvider for GatewayProvider {
    fn method(&self) -> PaymentMethod {
        PaymentMethod::Gateway
    }

    async fn open_checkout(&self, request: &CheckoutRequest) -> Result<Checkout, AppError> {
        let form = self.session_form(request)?;
        let url = format!("{}{}", self.config.api_base, SESSION_PATH);

        debug!(
            "Opening gateway session {} (live: {})",
            request.transaction_id, self.config.is_live
        );

        let response = self.client
            .post(&url)
            .form(&form)
            .send()
            .await
            .map_err(|e| AppError::from_provider(PROVIDER, e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream(format!("{} error {}: {}", PROVIDER, status, body)));
        }

        let parsed: dto::GatewayInitResponse = response
            .json()
            .await
            .map_err(|e| AppError::from_provider(PROVIDER, e))?;

        if !parsed.is_success() {
            let reason = parsed.failedreason.unwrap_or_else(|| parsed.status.clone());
            warn!("Gateway rejected session {}: {}", request.transaction_id, reason);
            return Err(AppError::Upstream(format!("{} rejected the session: {}", PROVIDER, reason)));
        }

        let url = parsed
            .gateway_page_url
            .filter(|u| !u.is_empty())
            .ok_or_else(|| AppError::Upstream(format!("{} returned no redirect url", PROVIDER)))?;

        info!("Gateway session {} opened", request.transaction_id);
        Ok(Checkout::Redirect {
            url,
            session_key: parsed.sessionkey,
        })
    }
}
