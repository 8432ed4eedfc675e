mod common;

use axum::http::{Method, StatusCode};
use common::{body_json, TestApp};
use farmstand_api::{
    entities::product::{ProductCategory, Season},
    services::catalog::CreateProductInput,
};
use rust_decimal_macros::dec;

async fn seed_catalog(app: &TestApp) {
    let catalog = &app.state.services.catalog;
    let items = [
        ("Okra", Some("Bhindi"), ProductCategory::Vegetables, 1.99, Season::Summer, 10),
        ("Basil", Some("Tulsi"), ProductCategory::Herbs, 4.00, Season::AllYear, 5),
        ("Strawberries", None, ProductCategory::Fruits, 6.50, Season::Summer, 0),
        ("Winter Squash", None, ProductCategory::Vegetables, 3.25, Season::Winter, 7),
    ];
    for (name, local, category, price, season, stock) in items {
        catalog
            .create_product(CreateProductInput {
                name: name.to_string(),
                local_name: local.map(str::to_string),
                category,
                price,
                discount_percent: None,
                season,
                image_url: None,
                initial_stock: Some(stock),
            })
            .await
            .expect("seed catalog");
    }
}

#[tokio::test]
async fn category_filter_narrows_the_listing() {
    let app = TestApp::new().await;
    seed_catalog(&app).await;

    let response = app
        .request(Method::GET, "/api/v1/products?category=vegetables", None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let names: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Okra", "Winter Squash"]);
}

#[tokio::test]
async fn season_filter_accepts_hyphenated_vocabulary() {
    let app = TestApp::new().await;
    seed_catalog(&app).await;

    let response = app
        .request(Method::GET, "/api/v1/products?season=all-year", None)
        .await;
    let body = body_json(response).await;
    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0]["name"], "Basil");
}

#[tokio::test]
async fn garbage_numeric_filters_are_silently_ignored() {
    let app = TestApp::new().await;
    seed_catalog(&app).await;

    let response = app
        .request(
            Method::GET,
            "/api/v1/products?min_price=abc&max_price=&page=xyz",
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["pagination"]["total"], 4);
    assert_eq!(body["pagination"]["page"], 1);
}

#[tokio::test]
async fn price_window_filters_apply_when_valid() {
    let app = TestApp::new().await;
    seed_catalog(&app).await;

    let response = app
        .request(
            Method::GET,
            "/api/v1/products?min_price=2.00&max_price=5.00",
            None,
        )
        .await;
    let body = body_json(response).await;
    let names: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Basil", "Winter Squash"]);
}

#[tokio::test]
async fn in_stock_filter_hides_sold_out_products() {
    let app = TestApp::new().await;
    seed_catalog(&app).await;

    let response = app
        .request(Method::GET, "/api/v1/products?in_stock=true", None)
        .await;
    let body = body_json(response).await;
    let names: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect();
    assert!(!names.contains(&"Strawberries"));
    assert_eq!(names.len(), 3);
}

#[tokio::test]
async fn search_matches_the_local_name_too() {
    let app = TestApp::new().await;
    seed_catalog(&app).await;

    let response = app
        .request(Method::GET, "/api/v1/products?q=Bhindi", None)
        .await;
    let body = body_json(response).await;
    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0]["name"], "Okra");
}

#[tokio::test]
async fn search_ignores_case() {
    let app = TestApp::new().await;
    seed_catalog(&app).await;

    let response = app
        .request(Method::GET, "/api/v1/products?q=bhINDI", None)
        .await;
    let body = body_json(response).await;
    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0]["name"], "Okra");

    let response = app
        .request(Method::GET, "/api/v1/products?q=SQUASH", None)
        .await;
    let body = body_json(response).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["name"], "Winter Squash");
}

#[tokio::test]
async fn detail_stock_and_deactivate_share_the_product_path() {
    let app = TestApp::new().await;
    seed_catalog(&app).await;
    let okra = app
        .state
        .services
        .catalog
        .get_product_by_slug("okra")
        .await
        .unwrap();

    let response = app
        .request(
            Method::PUT,
            &format!("/api/v1/products/{}/stock", okra.id),
            Some(serde_json::json!({ "stock_available": 4 })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let detail = app
        .request(Method::GET, &format!("/api/v1/products/{}", okra.id), None)
        .await;
    assert_eq!(detail.status(), StatusCode::OK);
    assert_eq!(body_json(detail).await["stock_available"], 4);

    let response = app
        .request(
            Method::DELETE,
            &format!("/api/v1/products/{}", okra.id),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn price_sort_orders_the_page() {
    let app = TestApp::new().await;
    seed_catalog(&app).await;

    let response = app
        .request(Method::GET, "/api/v1/products?sort=price_desc", None)
        .await;
    let body = body_json(response).await;
    let first = &body["data"].as_array().unwrap()[0];
    assert_eq!(first["name"], "Strawberries");
}

#[tokio::test]
async fn product_detail_resolves_by_slug_with_image_fallback() {
    let app = TestApp::new().await;
    seed_catalog(&app).await;

    let response = app
        .request(Method::GET, "/api/v1/products/winter-squash", None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["slug"], "winter-squash");
    assert_eq!(body["image_url"], "/static/img/products/placeholder.png");
    assert_eq!(body["stock_available"], 7);

    let missing = app
        .request(Method::GET, "/api/v1/products/no-such-thing", None)
        .await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn deactivated_products_vanish_from_listings_but_not_orders() {
    let app = TestApp::new().await;
    seed_catalog(&app).await;

    let okra = app
        .state
        .services
        .catalog
        .get_product_by_slug("okra")
        .await
        .unwrap();
    app.state
        .services
        .catalog
        .deactivate_product(okra.id)
        .await
        .unwrap();

    let response = app.request(Method::GET, "/api/v1/products", None).await;
    let body = body_json(response).await;
    assert_eq!(body["pagination"]["total"], 3);
}

#[tokio::test]
async fn pagination_caps_and_reports_totals() {
    let app = TestApp::new().await;
    seed_catalog(&app).await;

    let response = app
        .request(Method::GET, "/api/v1/products?per_page=2&page=2", None)
        .await;
    let body = body_json(response).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
    assert_eq!(body["pagination"]["total"], 4);
    assert_eq!(body["pagination"]["total_pages"], 2);
    assert_eq!(body["pagination"]["page"], 2);
}

#[tokio::test]
async fn cart_view_totals_live_prices() {
    let app = TestApp::new().await;
    let okra = app.seed_product("Okra", dec!(1.99), dec!(0), 10).await;
    let customer = app
        .seed_customer("Ada", "ada@example.com", "+31 6 1234 5678")
        .await;

    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/customers/{customer}/cart/items"),
            Some(serde_json::json!({ "product_id": okra.id, "quantity": 3 })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["item_count"], 3);
    assert_eq!(body["total"], "5.97");

    // Adding the same product again merges lines
    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/customers/{customer}/cart/items"),
            Some(serde_json::json!({ "product_id": okra.id, "quantity": 2 })),
        )
        .await;
    let body = body_json(response).await;
    assert_eq!(body["items"].as_array().unwrap().len(), 1);
    assert_eq!(body["item_count"], 5);
}

#[tokio::test]
async fn cart_add_rejects_more_than_stock() {
    let app = TestApp::new().await;
    let okra = app.seed_product("Okra", dec!(1.99), dec!(0), 2).await;
    let customer = app
        .seed_customer("Ada", "ada@example.com", "+31 6 1234 5678")
        .await;

    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/customers/{customer}/cart/items"),
            Some(serde_json::json!({ "product_id": okra.id, "quantity": 3 })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert_eq!(body["kind"], "insufficient_stock");
}
