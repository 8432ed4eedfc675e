//! Farmstand API Library
//!
//! Storefront backend for a fresh-produce shop: catalog, carts, checkout
//! with atomic inventory reservation, customer accounts and transactional
//! email.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod migrator;
pub mod notifications;
pub mod services;
pub mod validation;

use axum::{response::Json, routing::get, Router};
use chrono::Utc;
use http::HeaderValue;
use sea_orm::DatabaseConnection;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::notifications::Mailer;
use crate::services::{AddressService, CartService, CatalogService, CustomerService, OrderService};

/// All domain services, shared by the handler layer.
#[derive(Clone)]
pub struct AppServices {
    pub catalog: Arc<CatalogService>,
    pub cart: Arc<CartService>,
    pub customers: Arc<CustomerService>,
    pub addresses: Arc<AddressService>,
    pub orders: Arc<OrderService>,
}

impl AppServices {
    pub fn build(
        db: Arc<DatabaseConnection>,
        mailer: Arc<dyn Mailer>,
        public_base_url: &str,
    ) -> Self {
        Self {
            catalog: Arc::new(CatalogService::new(db.clone())),
            cart: Arc::new(CartService::new(db.clone())),
            customers: Arc::new(CustomerService::new(
                db.clone(),
                mailer.clone(),
                public_base_url.to_string(),
            )),
            addresses: Arc::new(AddressService::new(db.clone())),
            orders: Arc::new(OrderService::new(db, mailer)),
        }
    }
}

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub services: AppServices,
}

impl AppState {
    pub fn new(db: Arc<DatabaseConnection>, config: config::AppConfig) -> Self {
        let mailer: Arc<dyn Mailer> = Arc::new(notifications::LogMailer);
        Self::with_mailer(db, config, mailer)
    }

    pub fn with_mailer(
        db: Arc<DatabaseConnection>,
        config: config::AppConfig,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        let services = AppServices::build(db.clone(), mailer, &config.public_base_url);
        Self {
            db,
            config,
            services,
        }
    }
}

pub fn api_v1_routes() -> Router<Arc<AppState>> {
    Router::new()
        .nest("/products", handlers::products::products_routes())
        .nest("/auth", handlers::customers::auth_routes())
        .nest("/customers", handlers::customers::customers_routes())
        .nest(
            "/customers/:customer_id/cart",
            handlers::carts::carts_routes(),
        )
        .nest(
            "/customers/:customer_id/addresses",
            handlers::addresses::addresses_routes(),
        )
        .nest(
            "/customers/:customer_id/orders",
            handlers::orders::customer_orders_routes(),
        )
        .nest("/orders", handlers::orders::orders_routes())
}

/// The full application router with middleware attached.
pub fn app_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(state.config.cors_allowed_origins.as_deref());
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_v1_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
        .with_state(state)
}

fn cors_layer(allowed_origins: Option<&str>) -> CorsLayer {
    let origins: Vec<_> = allowed_origins
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .filter_map(|origin| origin.parse::<HeaderValue>().ok())
        .collect();
    if origins.is_empty() {
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
            .allow_origin(tower_http::cors::AllowOrigin::list(origins))
            .allow_methods(tower_http::cors::Any)
            .allow_headers(tower_http::cors::Any)
    }
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}
