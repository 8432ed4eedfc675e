use crate::handlers::{
    created_response, map_service_error, success_response, PaginatedResponse, PaginationParams,
};
use crate::{
    entities::order::OrderStatus,
    errors::ApiError,
    services::orders::PlaceOrderInput,
    AppState,
};
use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::{get, post, put},
    Router,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

/// Customer-scoped order history, nested under /customers/:customer_id.
pub fn customer_orders_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_orders))
        .route("/:order_id", get(get_order))
}

/// Checkout plus fulfilment-side routes.
pub fn orders_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(place_order))
        .route("/:order_id/status", put(update_status))
}

async fn place_order(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<PlaceOrderInput>,
) -> Result<impl IntoResponse, ApiError> {
    let result = state
        .services
        .orders
        .place_order(payload)
        .await
        .map_err(map_service_error)?;
    Ok(created_response(result))
}

async fn list_orders(
    State(state): State<Arc<AppState>>,
    Path(customer_id): Path<Uuid>,
    Query(pagination): Query<PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    let (page, per_page) = (pagination.page(), pagination.per_page());
    let (orders, total) = state
        .services
        .orders
        .list_orders(customer_id, page, per_page)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(PaginatedResponse::new(
        orders, page, per_page, total,
    )))
}

async fn get_order(
    State(state): State<Arc<AppState>>,
    Path((customer_id, order_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    let order = state
        .services
        .orders
        .get_order(customer_id, order_id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(order))
}

#[derive(Debug, Deserialize)]
struct UpdateStatusRequest {
    status: OrderStatus,
    tracking_number: Option<String>,
}

async fn update_status(
    State(state): State<Arc<AppState>>,
    Path(order_id): Path<Uuid>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let order = state
        .services
        .orders
        .update_status(order_id, payload.status, payload.tracking_number)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(order))
}
