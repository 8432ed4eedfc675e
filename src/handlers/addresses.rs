use crate::handlers::{created_response, map_service_error, no_content_response, success_response};
use crate::{errors::ApiError, services::addresses::AddressInput, AppState};
use axum::{
    extract::{Json, Path, State},
    response::IntoResponse,
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use uuid::Uuid;

pub fn addresses_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_addresses))
        .route("/", post(create_address))
        .route("/:address_id", put(update_address))
        .route("/:address_id", delete(delete_address))
        .route("/:address_id/default", post(set_default))
}

async fn list_addresses(
    State(state): State<Arc<AppState>>,
    Path(customer_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let addresses = state
        .services
        .addresses
        .list_addresses(customer_id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(addresses))
}

async fn create_address(
    State(state): State<Arc<AppState>>,
    Path(customer_id): Path<Uuid>,
    Json(payload): Json<AddressInput>,
) -> Result<impl IntoResponse, ApiError> {
    let address = state
        .services
        .addresses
        .create_address(customer_id, payload)
        .await
        .map_err(map_service_error)?;
    Ok(created_response(address))
}

async fn update_address(
    State(state): State<Arc<AppState>>,
    Path((customer_id, address_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<AddressInput>,
) -> Result<impl IntoResponse, ApiError> {
    let address = state
        .services
        .addresses
        .update_address(customer_id, address_id, payload)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(address))
}

async fn set_default(
    State(state): State<Arc<AppState>>,
    Path((customer_id, address_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    let address = state
        .services
        .addresses
        .set_default(customer_id, address_id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(address))
}

async fn delete_address(
    State(state): State<Arc<AppState>>,
    Path((customer_id, address_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .addresses
        .delete_address(customer_id, address_id)
        .await
        .map_err(map_service_error)?;
    Ok(no_content_response())
}
