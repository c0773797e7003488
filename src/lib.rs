pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod payments;
pub mod services;
pub mod state;

pub use api::router;
pub use error::AppError;
pub use state::AppState;
