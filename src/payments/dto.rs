use serde::Deserialize;

/// Subset of a card payment intent the backend reads.
#[derive(Debug, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    #[serde(default)]
    pub client_secret: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CardErrorEnvelope {
    pub error: CardError,
}

#[derive(Debug, Deserialize)]
pub struct CardError {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

/// Session-initiation answer from the hosted gateway.
#[derive(Debug, Deserialize)]
pub struct GatewayInitResponse {
    pub status: String,
    #[serde(default)]
    pub failedreason: Option<String>,
    #[serde(default)]
    pub sessionkey: Option<String>,
    #[serde(rename = "GatewayPageURL", default)]
    pub gateway_page_url: Option<String>,
}

impl GatewayInitResponse {
    pub fn is_success(&self) -> bool {
        self.status.eq_ignore_ascii_case("SUCCESS")
    }
}
