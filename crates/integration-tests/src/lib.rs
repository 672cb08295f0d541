//! Integration tests for Loomline Wholesale.
//!
//! # Running Tests
//!
//! ```bash
//! # Migrate and seed a database, then start the server
//! cargo run -p loomline-cli -- migrate
//! cargo run -p loomline-cli -- seed catalog
//! cargo run -p loomline-storefront
//!
//! # Run the ignored end-to-end tests
//! cargo test -p loomline-integration-tests -- --ignored
//! ```
//!
//! # Environment Variables
//!
//! - `STOREFRONT_TEST_URL` - Server origin (default: `http://localhost:3000`)
//! - `LOOMLINE_TEST_ADMIN_EMAIL`, `LOOMLINE_TEST_ADMIN_PASSWORD` - An admin
//!   created with `loomline-cli admin create`, for back-office tests

#![allow(clippy::missing_panics_doc, clippy::unwrap_used)]

use reqwest::{Client, Response, StatusCode};
use serde_json::{Value, json};
use uuid::Uuid;

/// Server origin under test.
#[must_use]
pub fn base_url() -> String {
    std::env::var("STOREFRONT_TEST_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// A client that keeps its session cookie, like a browser tab.
#[must_use]
pub fn session_client() -> Client {
    Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to create HTTP client")
}

/// `{base_url}/api{path}`
#[must_use]
pub fn api(path: &str) -> String {
    format!("{}/api{path}", base_url())
}

/// Registration details that don't collide with earlier runs.
#[must_use]
pub fn unique_registration(address: &str) -> Value {
    let id = Uuid::new_v4();
    // Ten digits starting with 9, derived from the uuid.
    let phone = format!("9{:09}", id.as_u128() % 1_000_000_000);

    json!({
        "email": format!("buyer-{}@example.in", id.simple()),
        "phone": phone,
        "name": "Test Buyer",
        "businessName": "Test Traders",
        "address": address,
        "password": "integration-pass-1"
    })
}

/// Register a fresh customer on `client` and return the user JSON.
pub async fn register_customer(client: &Client, address: &str) -> Value {
    let response = client
        .post(api("/auth/register"))
        .json(&unique_registration(address))
        .send()
        .await
        .expect("register request failed");
    assert_eq!(response.status(), StatusCode::CREATED);
    response.json().await.unwrap()
}

/// Log the configured admin in on `client`. `None` when no admin is configured.
pub async fn login_admin(client: &Client) -> Option<Value> {
    let email = std::env::var("LOOMLINE_TEST_ADMIN_EMAIL").ok()?;
    let password = std::env::var("LOOMLINE_TEST_ADMIN_PASSWORD").ok()?;

    let response = client
        .post(api("/auth/login"))
        .json(&json!({ "identifier": email, "password": password }))
        .send()
        .await
        .expect("admin login failed");
    assert_eq!(response.status(), StatusCode::OK);
    Some(response.json().await.unwrap())
}

/// Id of some product in the catalog (run `loomline-cli seed catalog` first).
pub async fn any_product_id(client: &Client) -> i64 {
    let products: Value = client
        .get(api("/products?limit=1"))
        .send()
        .await
        .expect("product list failed")
        .json()
        .await
        .unwrap();
    products[0]["id"]
        .as_i64()
        .expect("catalog is empty; run `loomline-cli seed catalog`")
}

/// The `code` of an error response.
pub async fn error_code(response: Response) -> String {
    let body: Value = response.json().await.unwrap();
    body["code"].as_str().unwrap_or_default().to_owned()
}
