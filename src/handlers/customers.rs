use crate::handlers::{
    created_response, map_service_error, no_content_response, success_response, validate_input,
};
use crate::{
    entities::customer,
    errors::ApiError,
    services::customers::{RegisterInput, UpdateProfileInput},
    AppState,
};
use axum::{
    extract::{Json, Path, State},
    response::IntoResponse,
    routing::{delete, get, post, put},
    Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

pub fn auth_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/password-reset/request", post(request_password_reset))
        .route("/password-reset/confirm", post(confirm_password_reset))
}

pub fn customers_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/:customer_id", get(get_customer))
        .route("/:customer_id", put(update_profile))
        .route("/:customer_id", delete(delete_customer))
}

/// Customer as returned by the API. The password hash never leaves the
/// service layer.
#[derive(Debug, Serialize)]
struct CustomerResponse {
    id: Uuid,
    name: String,
    email: String,
    phone: String,
    created_at: DateTime<Utc>,
}

impl From<customer::Model> for CustomerResponse {
    fn from(model: customer::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            email: model.email,
            phone: model.phone,
            created_at: model.created_at,
        }
    }
}

async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let customer = state
        .services
        .customers
        .register(payload)
        .await
        .map_err(map_service_error)?;
    Ok(created_response(CustomerResponse::from(customer)))
}

#[derive(Debug, Deserialize, Validate)]
struct LoginRequest {
    #[validate(email)]
    email: String,
    #[validate(length(min = 1))]
    password: String,
}

async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let customer = state
        .services
        .customers
        .authenticate(&payload.email, &payload.password)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(CustomerResponse::from(customer)))
}

#[derive(Debug, Deserialize, Validate)]
struct PasswordResetRequest {
    #[validate(email)]
    email: String,
}

async fn request_password_reset(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<PasswordResetRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    state
        .services
        .customers
        .request_password_reset(&payload.email)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(serde_json::json!({
        "message": "Password reset email sent"
    })))
}

#[derive(Debug, Deserialize, Validate)]
struct PasswordResetConfirm {
    #[validate(length(min = 1))]
    token: String,
    #[validate(length(min = 8, max = 128))]
    password: String,
}

async fn confirm_password_reset(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<PasswordResetConfirm>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    state
        .services
        .customers
        .reset_password(&payload.token, &payload.password)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(serde_json::json!({
        "message": "Password updated"
    })))
}

async fn get_customer(
    State(state): State<Arc<AppState>>,
    Path(customer_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let customer = state
        .services
        .customers
        .get_customer(customer_id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(CustomerResponse::from(customer)))
}

async fn update_profile(
    State(state): State<Arc<AppState>>,
    Path(customer_id): Path<Uuid>,
    Json(payload): Json<UpdateProfileInput>,
) -> Result<impl IntoResponse, ApiError> {
    let customer = state
        .services
        .customers
        .update_profile(customer_id, payload)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(CustomerResponse::from(customer)))
}

async fn delete_customer(
    State(state): State<Arc<AppState>>,
    Path(customer_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .customers
        .delete_customer(customer_id)
        .await
        .map_err(map_service_error)?;
    Ok(no_content_response())
}
