use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::http::{HeaderMap, StatusCode, header};
use axum::routing::post;
use axum::{Form, Json, Router};
use classhub::AppError;
use classhub::payments::{
    Callbacks, CardConfig, CardProvider, Checkout, CheckoutRequest, Customer, GatewayConfig,
    GatewayProvider, PaymentProvider,
};
use serde_json::json;
use tokio::net::TcpListener;

type SeenForm = Arc<Mutex<Option<HashMap<String, String>>>>;

async fn spawn_fake(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn card_provider(api_base: String, timeout: Duration) -> CardProvider {
    CardProvider::new(CardConfig {
        secret_key: "sk_test_123".to_string(),
        api_base,
        timeout,
    })
    .unwrap()
}

fn gateway_provider(api_base: String) -> GatewayProvider {
    GatewayProvider::new(GatewayConfig {
        store_id: "store".to_string(),
        store_passwd: "store@ssl".to_string(),
        is_live: false,
        api_base,
        timeout: Duration::from_secs(5),
    })
    .unwrap()
}

fn checkout(amount: f64, with_callbacks: bool) -> CheckoutRequest {
    CheckoutRequest {
        transaction_id: "0123456789abcdef01234567".to_string(),
        amount,
        currency: "USD".to_string(),
        product_name: "Watercolor Basics".to_string(),
        customer: Customer {
            name: Some("Ada".to_string()),
            email: "ada@example.com".to_string(),
            ..Customer::default()
        },
        callbacks: with_callbacks.then(|| Callbacks {
            success_url: "http://api.test/gateway-sessions/0123456789abcdef01234567/confirm"
                .to_string(),
            fail_url: "http://app.test/fail".to_string(),
            cancel_url: "http://app.test/cancel".to_string(),
            ipn_url: "http://app.test/ipn".to_string(),
        }),
    }
}

#[tokio::test]
async fn card_provider_sends_minor_units_and_returns_secret() {
    let seen: SeenForm = Arc::default();
    let captured = seen.clone();
    let fake = Router::new().route(
        "/v1/payment_intents",
        post(move |headers: HeaderMap, Form(form): Form<HashMap<String, String>>| {
            let captured = captured.clone();
            async move {
                if headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok())
                    != Some("Bearer sk_test_123")
                {
                    return (StatusCode::UNAUTHORIZED, Json(json!({ "error": {} })));
                }
                *captured.lock().unwrap() = Some(form);
                (
                    StatusCode::OK,
                    Json(json!({ "id": "pi_1", "client_secret": "pi_1_secret_abc" })),
                )
            }
        }),
    );
    let provider = card_provider(spawn_fake(fake).await, Duration::from_secs(5));

    let result = provider.open_checkout(&checkout(50.0, false)).await.unwrap();

    assert_eq!(
        result,
        Checkout::ClientSecret {
            intent_id: "pi_1".to_string(),
            client_secret: "pi_1_secret_abc".to_string(),
        }
    );
    let form = seen.lock().unwrap().clone().expect("no request reached the fake");
    assert_eq!(form["amount"], "5000");
    assert_eq!(form["currency"], "usd");
    assert_eq!(form["receipt_email"], "ada@example.com");
}

#[tokio::test]
async fn card_provider_surfaces_error_envelope() {
    let fake = Router::new().route(
        "/v1/payment_intents",
        post(|| async {
            (
                StatusCode::PAYMENT_REQUIRED,
                Json(json!({ "error": { "type": "card_error", "message": "Your card was declined." } })),
            )
        }),
    );
    let provider = card_provider(spawn_fake(fake).await, Duration::from_secs(5));

    let err = provider.open_checkout(&checkout(10.0, false)).await.unwrap_err();

    match err {
        AppError::Upstream(message) => assert!(message.contains("declined"), "{}", message),
        other => panic!("expected upstream error, got {:?}", other),
    }
}

#[tokio::test]
async fn card_provider_rejects_amount_below_one_minor_unit() {
    // Never reached; the amount check runs before any request.
    let provider = card_provider("http://127.0.0.1:9".to_string(), Duration::from_secs(1));

    let err = provider.open_checkout(&checkout(0.004, false)).await.unwrap_err();

    assert!(matches!(err, AppError::BadRequest(_)));
}

#[tokio::test]
async fn slow_provider_is_reported_as_timeout() {
    let fake = Router::new().route(
        "/v1/payment_intents",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(2)).await;
            Json(json!({ "id": "pi_late", "client_secret": "late" }))
        }),
    );
    let provider = card_provider(spawn_fake(fake).await, Duration::from_millis(100));

    let err = provider.open_checkout(&checkout(10.0, false)).await.unwrap_err();

    assert!(matches!(err, AppError::UpstreamTimeout(_)), "{:?}", err);
}

#[tokio::test]
async fn unreachable_provider_is_an_upstream_failure() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let provider = card_provider(format!("http://{}", addr), Duration::from_secs(2));

    let err = provider.open_checkout(&checkout(10.0, false)).await.unwrap_err();

    assert!(matches!(err, AppError::Upstream(_)), "{:?}", err);
}

#[tokio::test]
async fn gateway_session_returns_redirect_url() {
    let seen: SeenForm = Arc::default();
    let captured = seen.clone();
    let fake = Router::new().route(
        "/gwprocess/v4/api.php",
        post(move |Form(form): Form<HashMap<String, String>>| {
            let captured = captured.clone();
            async move {
                *captured.lock().unwrap() = Some(form);
                Json(json!({
                    "status": "SUCCESS",
                    "sessionkey": "SESS123",
                    "GatewayPageURL": "https://sandbox.example/pay/SESS123"
                }))
            }
        }),
    );
    let provider = gateway_provider(spawn_fake(fake).await);

    let result = provider.open_checkout(&checkout(40.0, true)).await.unwrap();

    assert_eq!(
        result,
        Checkout::Redirect {
            url: "https://sandbox.example/pay/SESS123".to_string(),
            session_key: Some("SESS123".to_string()),
        }
    );
    let form = seen.lock().unwrap().clone().expect("no request reached the fake");
    assert_eq!(form["store_id"], "store");
    assert_eq!(form["total_amount"], "40.00");
    assert_eq!(form["currency"], "USD");
    assert_eq!(form["tran_id"], "0123456789abcdef01234567");
    assert_eq!(
        form["success_url"],
        "http://api.test/gateway-sessions/0123456789abcdef01234567/confirm"
    );
    assert_eq!(form["cus_email"], "ada@example.com");
}

#[tokio::test]
async fn gateway_failure_status_is_upstream_error() {
    let fake = Router::new().route(
        "/gwprocess/v4/api.php",
        post(|| async {
            Json(json!({ "status": "FAILED", "failedreason": "Store Credential Error" }))
        }),
    );
    let provider = gateway_provider(spawn_fake(fake).await);

    let err = provider.open_checkout(&checkout(40.0, true)).await.unwrap_err();

    match err {
        AppError::Upstream(message) => {
            assert!(message.contains("Store Credential Error"), "{}", message)
        }
        other => panic!("expected upstream error, got {:?}", other),
    }
}

#[tokio::test]
async fn gateway_success_without_url_is_upstream_error() {
    let fake = Router::new().route(
        "/gwprocess/v4/api.php",
        post(|| async { Json(json!({ "status": "SUCCESS", "GatewayPageURL": "" })) }),
    );
    let provider = gateway_provider(spawn_fake(fake).await);

    let err = provider.open_checkout(&checkout(40.0, true)).await.unwrap_err();

    assert!(matches!(err, AppError::Upstream(_)), "{:?}", err);
}

#[tokio::test]
async fn gateway_requires_callbacks() {
    let provider = gateway_provider("http://127.0.0.1:9".to_string());

    let err = provider.open_checkout(&checkout(40.0, false)).await.unwrap_err();

    assert!(matches!(err, AppError::BadRequest(_)));
}
