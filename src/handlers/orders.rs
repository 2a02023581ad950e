use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::{get, patch},
    Extension, Router,
};
use uuid::Uuid;

use super::{
    cart::cart_routes,
    common::{created_response, success_response, JsonBody},
};
use crate::{
    auth::{AuthRouterExt, AuthUser},
    errors::ApiError,
    services::orders::{PlaceOrderRequest, UpdateOrderStatusRequest},
    AppState,
};

pub async fn place_order(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    JsonBody(payload): JsonBody<PlaceOrderRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let order = state
        .services
        .orders
        .place_order(user.user_id, payload)
        .await?;
    Ok(created_response(order))
}

pub async fn list_my_orders(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse, ApiError> {
    let orders = state.services.orders.list_for_user(user.user_id).await?;
    Ok(success_response(orders))
}

pub async fn get_my_order(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let order = state.services.orders.get_for_user(user.user_id, id).await?;
    Ok(success_response(order))
}

pub async fn cancel_order(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let order = state.services.orders.cancel(user.user_id, id).await?;
    Ok(success_response(order))
}

pub async fn list_all_orders(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let orders = state.services.orders.list_all().await?;
    Ok(success_response(orders))
}

pub async fn update_order_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    JsonBody(payload): JsonBody<UpdateOrderStatusRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let order = state
        .services
        .orders
        .update_status(id, &payload.status)
        .await?;
    Ok(success_response(order))
}

/// Order and cart routes under `/orders`
pub fn orders_routes() -> Router<AppState> {
    let customer = Router::new()
        .route("/orders", get(list_my_orders).post(place_order))
        .route("/orders/:id", get(get_my_order))
        .route("/orders/:id/cancel", patch(cancel_order))
        .with_auth();

    let admin = Router::new()
        .route("/orders/admin/all", get(list_all_orders))
        .route("/orders/:id/status", patch(update_order_status))
        .with_role("ADMIN");

    customer.merge(admin).merge(cart_routes())
}
