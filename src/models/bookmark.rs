use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Bookmark {
    pub id: String,
    pub student_email: String,
    pub student_name: Option<String>,
    pub class_id: String,
    pub class_title: String,
    pub class_image_url: Option<String>,
    pub instructor_email: String,
    pub instructor_name: Option<String>,
    pub price: f64,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBookmarkRequest {
    pub student_name: Option<String>,
    pub class_id: String,
    pub class_title: String,
    pub class_image_url: Option<String>,
    pub instructor_email: String,
    pub instructor_name: Option<String>,
    pub price: f64,
}
