#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use classhub::auth::{IdentityRequest, TokenKeys};
use classhub::config::CheckoutUrls;
use classhub::db::repository;
use classhub::models::{
    CartEntry, Class, NewClassRequest, NewUserRequest, PaymentMethod, Role, User,
};
use classhub::payments::{Checkout, CheckoutRequest, PaymentProvider};
use classhub::{AppError, AppState, router};
use serde_json::Value;
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;
use tower::ServiceExt;

pub const SECRET: &[u8] = b"test-secret";

/// How a stub provider answers `open_checkout`.
#[derive(Clone)]
pub enum Behaviour {
    Accept(Checkout),
    Reject(String),
    TimeOut,
}

pub struct StubProvider {
    method: PaymentMethod,
    behaviour: Behaviour,
    calls: AtomicUsize,
    last_request: std::sync::Mutex<Option<CheckoutRequest>>,
}

impl StubProvider {
    pub fn new(method: PaymentMethod, behaviour: Behaviour) -> Arc<Self> {
        Arc::new(Self {
            method,
            behaviour,
            calls: AtomicUsize::new(0),
            last_request: std::sync::Mutex::new(None),
        })
    }

    pub fn card_secret(secret: &str) -> Arc<Self> {
        Self::new(
            PaymentMethod::Card,
            Behaviour::Accept(Checkout::ClientSecret {
                intent_id: "pi_test".to_string(),
                client_secret: secret.to_string(),
            }),
        )
    }

    pub fn gateway_redirect(url: &str) -> Arc<Self> {
        Self::new(
            PaymentMethod::Gateway,
            Behaviour::Accept(Checkout::Redirect {
                url: url.to_string(),
                session_key: Some("sess_test".to_string()),
            }),
        )
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<CheckoutRequest> {
        self.last_request.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentProvider for StubProvider {
    fn method(&self) -> PaymentMethod {
        self.method
    }

    async fn open_checkout(&self, request: &CheckoutRequest) -> Result<Checkout, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(request.clone());
        match &self.behaviour {
            Behaviour::Accept(checkout) => Ok(checkout.clone()),
            Behaviour::Reject(reason) => Err(AppError::Upstream(reason.clone())),
            Behaviour::TimeOut => Err(AppError::UpstreamTimeout("stub".to_string())),
        }
    }
}

pub struct TestApp {
    pub app: Router,
    pub db: SqlitePool,
    pub tokens: Arc<TokenKeys>,
    pub card: Arc<StubProvider>,
    pub gateway: Arc<StubProvider>,
}

pub async fn test_pool() -> SqlitePool {
    // A single connection that never expires keeps the in-memory database alive.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create database");
    classhub::db::migrate(&pool).await.expect("Failed to migrate");
    pool
}

pub fn urls() -> CheckoutUrls {
    CheckoutUrls {
        public_base_url: "http://api.test".to_string(),
        client_base_url: "http://app.test".to_string(),
        fail_url: "http://app.test/fail".to_string(),
        cancel_url: "http://app.test/cancel".to_string(),
        ipn_url: "http://app.test/ipn".to_string(),
    }
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(
        StubProvider::card_secret("pi_test_secret_123"),
        StubProvider::gateway_redirect("https://gateway.test/pay/abc"),
    )
    .await
}

pub async fn spawn_app_with(card: Arc<StubProvider>, gateway: Arc<StubProvider>) -> TestApp {
    let db = test_pool().await;
    let tokens = Arc::new(TokenKeys::new(SECRET));
    let state = AppState {
        db: db.clone(),
        tokens: tokens.clone(),
        card: card.clone(),
        gateway: gateway.clone(),
        urls: Arc::new(urls()),
    };

    TestApp {
        app: router(state),
        db,
        tokens,
        card,
        gateway,
    }
}

impl TestApp {
    pub fn token(&self, email: &str) -> String {
        self.tokens
            .issue(IdentityRequest {
                email: Some(email.to_string()),
                name: Some("Test User".to_string()),
            })
            .expect("Failed to issue token")
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self
            .app
            .clone()
            .oneshot(request)
            .await
            .expect("request failed");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, body)
    }

    pub async fn call(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        self.send(build_request(method, uri, token, body)).await
    }

    pub async fn seed_user(&self, email: &str, role: Role) -> User {
        let user = repository::insert_user_if_absent(
            &self.db,
            NewUserRequest {
                email: email.to_string(),
                name: Some(email.to_string()),
                photo_url: None,
            },
        )
        .await
        .expect("Failed to insert user")
        .expect("user already existed");

        repository::update_user_role(&self.db, &user.id, role)
            .await
            .expect("Failed to set role")
            .expect("user missing")
    }

    pub async fn seed_class(&self, instructor_email: &str, title: &str, price: f64) -> Class {
        repository::insert_class(
            &self.db,
            instructor_email,
            NewClassRequest {
                title: title.to_string(),
                image_url: None,
                instructor_name: Some("Instructor".to_string()),
                price,
                currency: "usd".to_string(),
                available_seats: 20,
            },
        )
        .await
        .expect("Failed to insert class")
    }

    pub async fn seed_cart_entry(&self, student_email: &str, class: &Class) -> CartEntry {
        repository::insert_cart_entry(&self.db, student_email, class)
            .await
            .expect("Failed to insert cart entry")
    }

    pub async fn count(&self, table: &str) -> i64 {
        sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {}", table))
            .fetch_one(&self.db)
            .await
            .expect("Failed to count rows")
    }
}

pub fn build_request(
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .expect("Failed to build request"),
        None => builder.body(Body::empty()).expect("Failed to build request"),
    }
}
