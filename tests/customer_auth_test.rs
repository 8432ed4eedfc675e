mod common;

use assert_matches::assert_matches;
use axum::http::{Method, StatusCode};
use chrono::{Duration, Utc};
use common::{body_json, TestApp};
use farmstand_api::{
    entities::{customer, password_reset_token, PasswordResetToken},
    errors::ServiceError,
};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use serde_json::json;
use uuid::Uuid;

async fn latest_token_for(app: &TestApp, customer_id: Uuid) -> String {
    PasswordResetToken::find()
        .filter(password_reset_token::Column::CustomerId.eq(customer_id))
        .one(&*app.state.db)
        .await
        .unwrap()
        .expect("reset token was issued")
        .token
}

#[tokio::test]
async fn registration_returns_created_without_password_material() {
    let app = TestApp::new().await;
    let response = app
        .request(
            Method::POST,
            "/api/v1/auth/register",
            Some(json!({
                "name": "Ada Lovelace",
                "email": "Ada@Example.com",
                "phone": "+31 6 1234 5678",
                "password": "hunter2hunter2"
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = body_json(response).await;
    assert_eq!(body["email"], "ada@example.com");
    assert!(body.get("password_hash").is_none());
}

#[tokio::test]
async fn duplicate_email_is_rejected_case_insensitively() {
    let app = TestApp::new().await;
    app.seed_customer("Ada", "ada@example.com", "+31 6 1234 5678")
        .await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/auth/register",
            Some(json!({
                "name": "Other Ada",
                "email": "ADA@EXAMPLE.COM",
                "phone": "+31 6 9999 9999",
                "password": "hunter2hunter2"
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let body = body_json(response).await;
    assert_eq!(body["kind"], "duplicate_email");
}

#[tokio::test]
async fn duplicate_phone_is_rejected() {
    let app = TestApp::new().await;
    app.seed_customer("Ada", "ada@example.com", "+31 6 1234 5678")
        .await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/auth/register",
            Some(json!({
                "name": "Bob",
                "email": "bob@example.com",
                "phone": "+31 6 1234 5678",
                "password": "hunter2hunter2"
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn duplicate_phone_is_rejected_by_the_database_too() {
    let app = TestApp::new().await;
    app.seed_customer("Ada", "ada@example.com", "+31 6 1234 5678")
        .await;

    // Bypasses the service precheck; the unique index has to catch it.
    let now = Utc::now();
    let clash = customer::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set("Bob".into()),
        email: Set("bob@example.com".into()),
        phone: Set("+31 6 1234 5678".into()),
        password_hash: Set("not-a-real-hash".into()),
        created_at: Set(now),
        updated_at: Set(now),
    };
    assert!(clash.insert(&*app.state.db).await.is_err());
}

#[tokio::test]
async fn login_distinguishes_unknown_email_from_wrong_password() {
    let app = TestApp::new().await;
    app.seed_customer("Ada", "ada@example.com", "+31 6 1234 5678")
        .await;

    let wrong_password = app
        .request(
            Method::POST,
            "/api/v1/auth/login",
            Some(json!({ "email": "ada@example.com", "password": "wrong-password" })),
        )
        .await;
    let unknown_email = app
        .request(
            Method::POST,
            "/api/v1/auth/login",
            Some(json!({ "email": "ghost@example.com", "password": "whatever1" })),
        )
        .await;

    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_email.status(), StatusCode::NOT_FOUND);
    let body = body_json(wrong_password).await;
    assert_eq!(body["kind"], "invalid_credentials");
}

#[tokio::test]
async fn login_accepts_mixed_case_email() {
    let app = TestApp::new().await;
    app.seed_customer("Ada", "ada@example.com", "+31 6 1234 5678")
        .await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/auth/login",
            Some(json!({ "email": "Ada@Example.Com", "password": "hunter2hunter2" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn password_reset_happy_path() {
    let app = TestApp::new().await;
    let customer = app
        .seed_customer("Ada", "ada@example.com", "+31 6 1234 5678")
        .await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/auth/password-reset/request",
            Some(json!({ "email": "ada@example.com" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let token = latest_token_for(&app, customer).await;
    let response = app
        .request(
            Method::POST,
            "/api/v1/auth/password-reset/confirm",
            Some(json!({ "token": token, "password": "brand-new-secret" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    // Old password gone, new one works
    let old = app
        .state
        .services
        .customers
        .authenticate("ada@example.com", "hunter2hunter2")
        .await;
    assert_matches!(old, Err(ServiceError::InvalidCredentials));
    app.state
        .services
        .customers
        .authenticate("ada@example.com", "brand-new-secret")
        .await
        .expect("new password must work");
}

#[tokio::test]
async fn reset_tokens_are_single_use() {
    let app = TestApp::new().await;
    let customer = app
        .seed_customer("Ada", "ada@example.com", "+31 6 1234 5678")
        .await;
    app.state
        .services
        .customers
        .request_password_reset("ada@example.com")
        .await
        .unwrap();
    let token = latest_token_for(&app, customer).await;

    app.state
        .services
        .customers
        .reset_password(&token, "brand-new-secret")
        .await
        .unwrap();

    let err = app
        .state
        .services
        .customers
        .reset_password(&token, "another-secret1")
        .await
        .expect_err("second use must fail");
    assert_matches!(err, ServiceError::InvalidOrExpiredToken);
}

#[tokio::test]
async fn reset_tokens_expire_after_an_hour() {
    let app = TestApp::new().await;
    let customer = app
        .seed_customer("Ada", "ada@example.com", "+31 6 1234 5678")
        .await;
    app.state
        .services
        .customers
        .request_password_reset("ada@example.com")
        .await
        .unwrap();
    let token = latest_token_for(&app, customer).await;

    // Backdate issuance past the one-hour window
    let row = PasswordResetToken::find_by_id(token.clone())
        .one(&*app.state.db)
        .await
        .unwrap()
        .unwrap();
    let mut active: password_reset_token::ActiveModel = row.into();
    active.created_at = Set(Utc::now() - Duration::minutes(61));
    active.update(&*app.state.db).await.unwrap();

    let err = app
        .state
        .services
        .customers
        .reset_password(&token, "brand-new-secret")
        .await
        .expect_err("stale token must fail");
    assert_matches!(err, ServiceError::InvalidOrExpiredToken);
}

#[tokio::test]
async fn reset_request_for_unknown_email_says_not_found() {
    let app = TestApp::new().await;
    let response = app
        .request(
            Method::POST,
            "/api/v1/auth/password-reset/request",
            Some(json!({ "email": "ghost@example.com" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn deleting_a_customer_removes_everything_they_own() {
    use farmstand_api::{entities::address::AddressLabel, services::addresses::AddressInput};
    use rust_decimal_macros::dec;

    let app = TestApp::new().await;
    let product = app.seed_product("Okra", dec!(1.99), dec!(0), 10).await;
    let customer = app
        .seed_customer("Ada", "ada@example.com", "+31 6 1234 5678")
        .await;
    app.add_to_cart(customer, product.id, 1).await;
    app.state
        .services
        .addresses
        .create_address(
            customer,
            AddressInput {
                label: AddressLabel::Home,
                line: "12 Garden Row".into(),
                city: "Leiden".into(),
                postal_code: "2311 GJ".into(),
                phone: "+31 6 1234 5678".into(),
                is_default: true,
            },
        )
        .await
        .unwrap();
    app.state
        .services
        .customers
        .request_password_reset("ada@example.com")
        .await
        .unwrap();

    app.state
        .services
        .customers
        .delete_customer(customer)
        .await
        .unwrap();

    let err = app
        .state
        .services
        .customers
        .get_customer(customer)
        .await
        .expect_err("account is gone");
    assert_matches!(err, ServiceError::NotFound(_));
    assert!(app
        .state
        .services
        .addresses
        .list_addresses(customer)
        .await
        .unwrap()
        .is_empty());
    let cart = app.state.services.cart.view_cart(customer).await.unwrap();
    assert!(cart.items.is_empty());
    let tokens = PasswordResetToken::find()
        .filter(password_reset_token::Column::CustomerId.eq(customer))
        .all(&*app.state.db)
        .await
        .unwrap();
    assert!(tokens.is_empty());
}
