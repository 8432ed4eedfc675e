use crate::handlers::{
    created_response, map_service_error, no_content_response, parse_opt, success_response,
    PaginatedResponse, PaginationParams,
};
use crate::{
    errors::ApiError,
    services::catalog::{CreateProductInput, ProductFilter, ProductSort},
    AppState,
};
use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::{delete, get, post, put},
    Router,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

pub fn products_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_products))
        .route("/", post(create_product))
        .route("/:id", get(get_product_by_slug))
        .route("/:id", delete(deactivate_product))
        .route("/:id/stock", put(set_stock))
}

/// Catalog filters arrive as raw strings. Anything that does not parse
/// is treated as absent rather than an error, so a bad `min_price` never
/// breaks the product grid.
#[derive(Debug, Default, Deserialize)]
struct ProductListQuery {
    category: Option<String>,
    season: Option<String>,
    q: Option<String>,
    min_price: Option<String>,
    max_price: Option<String>,
    in_stock: Option<String>,
    sort: Option<String>,
    page: Option<String>,
    per_page: Option<String>,
}

impl ProductListQuery {
    fn filter(&self) -> ProductFilter {
        ProductFilter {
            category: self.category.as_deref().and_then(|c| c.parse().ok()),
            season: self.season.as_deref().and_then(|s| s.parse().ok()),
            search: self.q.clone(),
            min_price: parse_opt::<f64>(self.min_price.as_deref())
                .and_then(|v| Decimal::try_from(v).ok()),
            max_price: parse_opt::<f64>(self.max_price.as_deref())
                .and_then(|v| Decimal::try_from(v).ok()),
            in_stock_only: matches!(self.in_stock.as_deref(), Some("true") | Some("1")),
        }
    }

    fn sort(&self) -> ProductSort {
        match self.sort.as_deref() {
            Some("name_asc") => ProductSort::NameAsc,
            Some("name_desc") => ProductSort::NameDesc,
            Some("price_asc") => ProductSort::PriceAsc,
            Some("price_desc") => ProductSort::PriceDesc,
            Some("newest") => ProductSort::Newest,
            _ => ProductSort::CategoryThenName,
        }
    }

    fn pagination(&self) -> PaginationParams {
        PaginationParams {
            page: self.page.clone(),
            per_page: self.per_page.clone(),
        }
    }
}

async fn list_products(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ProductListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let pagination = query.pagination();
    let (page, per_page) = (pagination.page(), pagination.per_page());
    let (products, total) = state
        .services
        .catalog
        .list_products(query.filter(), query.sort(), page, per_page)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(PaginatedResponse::new(
        products, page, per_page, total,
    )))
}

async fn get_product_by_slug(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    // Slug routes double as id routes for convenience
    let product = match slug.parse::<Uuid>() {
        Ok(id) => state.services.catalog.get_product(id).await,
        Err(_) => state.services.catalog.get_product_by_slug(&slug).await,
    }
    .map_err(map_service_error)?;
    Ok(success_response(product))
}

async fn create_product(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateProductInput>,
) -> Result<impl IntoResponse, ApiError> {
    let product = state
        .services
        .catalog
        .create_product(payload)
        .await
        .map_err(map_service_error)?;
    Ok(created_response(product))
}

#[derive(Debug, Deserialize)]
struct SetStockRequest {
    stock_available: i32,
}

async fn set_stock(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SetStockRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .catalog
        .set_stock(id, payload.stock_available)
        .await
        .map_err(map_service_error)?;
    Ok(no_content_response())
}

async fn deactivate_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .catalog
        .deactivate_product(id)
        .await
        .map_err(map_service_error)?;
    Ok(no_content_response())
}
