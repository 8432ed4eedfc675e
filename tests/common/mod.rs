use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request},
    Router,
};
use farmstand_api::{
    app_router,
    config::AppConfig,
    db,
    entities::product::{ProductCategory, Season},
    notifications::{LogMailer, Mailer},
    services::catalog::{CreateProductInput, ProductView},
    AppState,
};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

/// Harness backed by an in-memory SQLite database. The pool is pinned to
/// a single connection so the database lives for the whole test and
/// concurrent transactions serialize the way row locks would.
pub struct TestApp {
    router: Router,
    pub state: Arc<AppState>,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_mailer(Arc::new(LogMailer)).await
    }

    pub async fn with_mailer(mailer: Arc<dyn Mailer>) -> Self {
        let mut cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let state = Arc::new(AppState::with_mailer(Arc::new(pool), cfg, mailer));
        let router = app_router(state.clone());

        Self { router, state }
    }

    /// Send a JSON request against the router.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(uri);

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Seed a product with stock through the catalog service.
    pub async fn seed_product(
        &self,
        name: &str,
        price: Decimal,
        discount_percent: Decimal,
        stock: i32,
    ) -> ProductView {
        self.state
            .services
            .catalog
            .create_product(CreateProductInput {
                name: name.to_string(),
                local_name: None,
                category: ProductCategory::Vegetables,
                price: price.to_f64().expect("price fits f64"),
                discount_percent: Some(discount_percent.to_f64().expect("discount fits f64")),
                season: Season::AllYear,
                image_url: None,
                initial_stock: Some(stock),
            })
            .await
            .expect("seed product for tests")
    }

    /// Register a customer and return their id.
    pub async fn seed_customer(&self, name: &str, email: &str, phone: &str) -> Uuid {
        self.state
            .services
            .customers
            .register(farmstand_api::services::customers::RegisterInput {
                name: name.to_string(),
                email: email.to_string(),
                phone: phone.to_string(),
                password: "hunter2hunter2".to_string(),
            })
            .await
            .expect("seed customer for tests")
            .id
    }

    pub async fn add_to_cart(&self, customer_id: Uuid, product_id: Uuid, quantity: i32) {
        self.state
            .services
            .cart
            .add_item(customer_id, product_id, quantity)
            .await
            .expect("seed cart line for tests");
    }

    pub async fn stock_of(&self, product_id: Uuid) -> i32 {
        self.state
            .services
            .catalog
            .get_product(product_id)
            .await
            .expect("product exists")
            .stock_available
    }
}

/// Well-formed shipping block for checkout payloads.
pub fn shipping_json() -> Value {
    serde_json::json!({
        "name": "Ada Lovelace",
        "address": "12 Garden Row",
        "city": "Leiden",
        "postal_code": "2311 GJ",
        "phone": "+31 6 1234 5678"
    })
}

pub async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read response body");
    if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("response body is json")
    }
}
