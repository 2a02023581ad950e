use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::{get, post, put},
    Extension, Router,
};
use uuid::Uuid;

use super::common::{success_response, JsonBody};
use crate::{
    auth::{AuthRouterExt, AuthUser},
    errors::ApiError,
    services::{
        accounts::MessageResponse,
        cart::{AddCartItemRequest, UpdateCartItemRequest},
    },
    AppState,
};

pub async fn get_cart(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse, ApiError> {
    let cart = state.services.cart.get_cart(user.user_id).await?;
    Ok(success_response(cart))
}

pub async fn add_item(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    JsonBody(payload): JsonBody<AddCartItemRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let cart = state.services.cart.add_item(user.user_id, payload).await?;
    Ok(success_response(cart))
}

pub async fn update_item(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(item_id): Path<Uuid>,
    JsonBody(payload): JsonBody<UpdateCartItemRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let cart = state
        .services
        .cart
        .update_item(user.user_id, item_id, payload)
        .await?;
    Ok(success_response(cart))
}

pub async fn remove_item(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(item_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let cart = state.services.cart.remove_item(user.user_id, item_id).await?;
    Ok(success_response(cart))
}

pub async fn clear_cart(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse, ApiError> {
    state.services.cart.clear(user.user_id).await?;
    Ok(success_response(MessageResponse::new(
        "Cart cleared successfully",
    )))
}

/// Cart routes, one cart per authenticated user
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/orders/cart", get(get_cart).delete(clear_cart))
        .route("/orders/cart/items", post(add_item))
        .route(
            "/orders/cart/items/:item_id",
            put(update_item).delete(remove_item),
        )
        .with_auth()
}
