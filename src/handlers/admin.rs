use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{get, put},
    Router,
};
use uuid::Uuid;

use super::common::{
    created_response, no_content_response, success_response, JsonBody, PaginationParams,
};
use crate::{
    auth::AuthRouterExt,
    errors::ApiError,
    services::{
        admin::UpdateRoleRequest,
        packs::{CreatePackRequest, UpdatePackRequest},
    },
    AppState,
};

pub async fn dashboard_stats(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let stats = state.services.admin.dashboard().await?;
    Ok(success_response(stats))
}

pub async fn list_users(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let users = state.services.admin.list_users().await?;
    Ok(success_response(users))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.services.admin.get_user(id).await?;
    Ok(success_response(user))
}

pub async fn update_user_role(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    JsonBody(payload): JsonBody<UpdateRoleRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.services.admin.update_role(id, &payload.role).await?;
    Ok(success_response(user))
}

pub async fn list_packs(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    let page = state
        .services
        .packs
        .list_admin(params.page, params.limit, params.search)
        .await?;
    Ok(success_response(page))
}

pub async fn create_pack(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<CreatePackRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let pack = state.services.packs.create(payload).await?;
    Ok(created_response(pack))
}

pub async fn update_pack(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    JsonBody(payload): JsonBody<UpdatePackRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let pack = state.services.packs.update(id, payload).await?;
    Ok(success_response(pack))
}

pub async fn delete_pack(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.services.packs.delete(id).await?;
    Ok(no_content_response())
}

/// Routes mounted under `/admin`, all requiring the ADMIN role
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard/stats", get(dashboard_stats))
        .route("/users", get(list_users))
        .route("/users/:id", get(get_user))
        .route("/users/:id/role", put(update_user_role))
        .route("/packs", get(list_packs).post(create_pack))
        .route("/packs/:id", put(update_pack).delete(delete_pack))
        .with_role("ADMIN")
}
