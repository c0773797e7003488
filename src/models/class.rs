use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::UnknownVariant;

/// Review state of a class. The only transition is pending -> accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassStatus {
    Pending,
    Accepted,
}

impl ClassStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClassStatus::Pending => "pending",
            ClassStatus::Accepted => "accepted",
        }
    }
}

impl FromStr for ClassStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ClassStatus::Pending),
            "accepted" => Ok(ClassStatus::Accepted),
            other => Err(UnknownVariant { kind: "class status", value: other.to_string() }),
        }
    }
}

impl TryFrom<String> for ClassStatus {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Class {
    pub id: String,
    pub title: String,
    pub image_url: Option<String>,
    pub instructor_email: String,
    pub instructor_name: Option<String>,
    pub price: f64,
    pub currency: String,
    pub available_seats: i64,
    pub seats_enrolled: i64,
    #[sqlx(try_from = "String")]
    pub status: ClassStatus,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewClassRequest {
    pub title: String,
    pub image_url: Option<String>,
    pub instructor_name: Option<String>,
    pub price: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub available_seats: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: ClassStatus,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassQueryParams {
    pub instructor_email: Option<String>,
    pub status: Option<ClassStatus>,
}

pub fn default_currency() -> String {
    "usd".to_string()
}
