//! Test utilities and fixtures for BeliBeli integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use serde_json::Value;
use sha2::{Digest, Sha512};
use tower::ServiceExt;

use std::sync::{Arc, Mutex};

pub use belibeli::db::{init_db, queries, AppState};
pub use belibeli::error::{AppError, Result};
pub use belibeli::id;
pub use belibeli::models::*;
pub use belibeli::payments::{PaymentGateway, SignatureVerifier, SnapToken, TokenRequest};

/// Server key shared by the test verifier and the signature helper.
pub const TEST_SERVER_KEY: &str = "SB-Mid-server-testkey";

/// Gateway double: issues deterministic tokens and records every request,
/// or refuses every call when constructed with `failing()`.
pub struct MockGateway {
    pub fail: bool,
    pub requests: Mutex<Vec<TokenRequest>>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self {
            fail: false,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            requests: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn create_transaction_token(&self, request: &TokenRequest) -> Result<SnapToken> {
        self.requests.lock().unwrap().push(request.clone());
        if self.fail {
            return Err(AppError::Gateway("mock gateway refused the request".into()));
        }
        Ok(SnapToken {
            token: format!("snap-{}", request.order_id),
            redirect_url: None,
        })
    }
}

/// Create an in-memory test database with schema initialized
pub fn setup_test_db() -> Connection {
    let conn = Connection::open_in_memory().expect("Failed to create in-memory database");
    init_db(&conn).expect("Failed to initialize schema");
    conn
}

/// Create an AppState over an in-memory database with the given gateway.
pub fn test_state_with(gateway: Arc<dyn PaymentGateway>) -> AppState {
    let manager = SqliteConnectionManager::memory();
    let pool = Pool::builder().max_size(1).build(manager).unwrap();
    {
        let conn = pool.get().unwrap();
        init_db(&conn).unwrap();
    }

    AppState {
        db: pool,
        gateway,
        verifier: SignatureVerifier::new(TEST_SERVER_KEY),
        base_url: "http://localhost:3000".to_string(),
    }
}

pub fn test_state() -> AppState {
    test_state_with(Arc::new(MockGateway::new()))
}

/// Create a Router with every route the server exposes.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(belibeli::handlers::api_router())
        .merge(belibeli::handlers::webhooks::router())
        .with_state(state)
}

/// Get the current timestamp
pub fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

pub fn create_test_product(conn: &Connection, name: &str, price: i64) -> Product {
    queries::create_product(
        conn,
        &CreateProduct {
            name: name.to_string(),
            price,
            image_url: None,
        },
    )
    .expect("Failed to create test product")
}

pub fn create_test_profile(conn: &Connection, user_id: &str) -> Profile {
    queries::upsert_profile(conn, user_id, "Test User", "test@example.com")
        .expect("Failed to create test profile")
}

/// Insert a pending order directly, bypassing the checkout flow.
pub fn insert_test_order(conn: &Connection, user_id: &str, total: i64) -> Order {
    let order_id = id::gen_order_id();
    let order = Order {
        id: order_id.clone(),
        midtrans_order_id: id::midtrans_order_id(&order_id),
        user_id: user_id.to_string(),
        total_amount: total,
        status: OrderStatus::Pending,
        items: vec![LineItem {
            product_id: "prod-1".to_string(),
            name: "Test Item".to_string(),
            price: total,
            quantity: 1,
        }],
        customer_details: CustomerDetails {
            display_name: "Test User".to_string(),
            email: "test@example.com".to_string(),
        },
        created_at: now(),
    };
    queries::insert_order(conn, &order).expect("Failed to insert test order");
    order
}

/// Sign the way Midtrans does:
/// `sha512(order_id + status_code + gross_amount + server_key)`, hex-encoded.
pub fn sign_notification(order_id: &str, status_code: &str, gross_amount: &str) -> String {
    let mut hasher = Sha512::new();
    hasher.update(order_id.as_bytes());
    hasher.update(status_code.as_bytes());
    hasher.update(gross_amount.as_bytes());
    hasher.update(TEST_SERVER_KEY.as_bytes());
    hex::encode(hasher.finalize())
}

/// Build a notification body with a valid signature.
pub fn signed_notification(
    midtrans_order_id: &str,
    transaction_status: &str,
    gross_amount: &str,
    fraud_status: Option<&str>,
) -> Value {
    let status_code = "200";
    let mut body = serde_json::json!({
        "order_id": midtrans_order_id,
        "status_code": status_code,
        "gross_amount": gross_amount,
        "signature_key": sign_notification(midtrans_order_id, status_code, gross_amount),
        "transaction_status": transaction_status,
    });
    if let Some(fraud) = fraud_status {
        body["fraud_status"] = serde_json::json!(fraud);
    }
    body
}

/// POST a JSON body, optionally as an authenticated user.
pub async fn post_json(
    app: &Router,
    uri: &str,
    user: Option<&str>,
    body: &Value,
) -> Response<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(user) = user {
        builder = builder.header("x-user-id", user);
    }

    app.clone()
        .oneshot(
            builder
                .body(Body::from(serde_json::to_string(body).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap()
}

/// GET a route, optionally as an authenticated (and possibly admin) user.
pub async fn get_as(app: &Router, uri: &str, user: Option<&str>, admin: bool) -> Response<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(user) = user {
        builder = builder.header("x-user-id", user);
    }
    if admin {
        builder = builder.header("x-user-role", "admin");
    }

    app.clone()
        .oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

/// Read a response body as JSON.
pub async fn response_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).expect("Response should be valid JSON")
}
