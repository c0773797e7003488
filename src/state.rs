use std::sync::Arc;

use sqlx::SqlitePool;

use crate::auth::TokenKeys;
use crate::config::CheckoutUrls;
use crate::payments::PaymentProvider;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub tokens: Arc<TokenKeys>,
    /// Direct-charge provider (client secret flow).
    pub card: Arc<dyn PaymentProvider>,
    /// Hosted-checkout provider (redirect + callback flow).
    pub gateway: Arc<dyn PaymentProvider>,
    pub urls: Arc<CheckoutUrls>,
}
