use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A class a student picked but has not paid for yet.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CartEntry {
    pub id: String,
    pub student_email: String,
    pub class_id: String,
    pub title: String,
    pub image_url: Option<String>,
    pub instructor_email: String,
    pub instructor_name: Option<String>,
    pub price: f64,
    pub currency: String,
    pub created_at: String,
}

/// Body of `POST /carts`. Everything else on the entry is copied from the
/// stored class.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCartEntryRequest {
    pub class_id: String,
}
