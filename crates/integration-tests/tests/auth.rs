//! Account flows against a running storefront.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database (`loomline-cli migrate`)
//! - The storefront running (`cargo run -p loomline-storefront`)
//!
//! Run with: `cargo test -p loomline-integration-tests -- --ignored`

use reqwest::StatusCode;
use serde_json::{Value, json};

use loomline_integration_tests::{
    api, error_code, register_customer, session_client, unique_registration,
};

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_me_is_unauthorized_without_session() {
    let client = session_client();
    let response = client.get(api("/auth/me")).send().await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(response).await, "unauthorized");
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_register_logs_in_and_logout_ends_session() {
    let client = session_client();
    let user = register_customer(&client, "Lajpat Nagar, Delhi").await;
    assert_eq!(user["role"], "customer");

    let me: Value = client
        .get(api("/auth/me"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(me["id"], user["id"]);

    let response = client.post(api("/auth/logout")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = client.get(api("/auth/me")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_login_by_email_and_by_phone() {
    let registration = unique_registration("Lajpat Nagar, Delhi");
    let client = session_client();
    let response = client
        .post(api("/auth/register"))
        .json(&registration)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    for identifier in [&registration["email"], &registration["phone"]] {
        let client = session_client();
        let response = client
            .post(api("/auth/login"))
            .json(&json!({ "identifier": identifier, "password": registration["password"] }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK, "login with {identifier}");
    }
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_wrong_password_is_an_authentication_error() {
    let registration = unique_registration("Lajpat Nagar, Delhi");
    session_client()
        .post(api("/auth/register"))
        .json(&registration)
        .send()
        .await
        .unwrap();

    let response = session_client()
        .post(api("/auth/login"))
        .json(&json!({ "identifier": registration["email"], "password": "not-the-password" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(response).await, "authentication");
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_duplicate_email_is_a_conflict() {
    let registration = unique_registration("Lajpat Nagar, Delhi");
    session_client()
        .post(api("/auth/register"))
        .json(&registration)
        .send()
        .await
        .unwrap();

    let mut again = unique_registration("Lajpat Nagar, Delhi");
    again["email"] = registration["email"].clone();
    let response = session_client()
        .post(api("/auth/register"))
        .json(&again)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(error_code(response).await, "conflict");
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_forgot_password_does_not_reveal_accounts() {
    let response = session_client()
        .post(api("/auth/forgot-password"))
        .json(&json!({ "identifier": "nobody-here@example.in" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_reset_with_unknown_token() {
    let response = session_client()
        .post(api("/auth/reset-password"))
        .json(&json!({ "token": "definitely-not-issued", "password": "new-password-1" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(response).await, "invalid_token");
}
