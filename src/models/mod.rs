pub mod bookmark;
pub mod cart;
pub mod class;
pub mod payment;
pub mod user;

pub use bookmark::{Bookmark, NewBookmarkRequest};
pub use cart::{CartEntry, NewCartEntryRequest};
pub use class::{Class, ClassQueryParams, ClassStatus, NewClassRequest, UpdateStatusRequest};
pub use payment::{
    GatewayTransaction, NewPaymentRequest, PaymentFilter, PaymentMethod, PaymentRecord,
};
pub use user::{NewUserRequest, Role, UpdateRoleRequest, User};

use serde::Serialize;

/// Outcome of an insert that is a no-op when the record already exists.
/// Duplicates are reported as a plain message with a 200 status.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum InsertOutcome<T> {
    Inserted(T),
    AlreadyExists { message: String },
}

impl<T> InsertOutcome<T> {
    pub fn already_exists(what: &str) -> Self {
        InsertOutcome::AlreadyExists {
            message: format!("{} already exists", what),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown {kind} value: {value}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}
