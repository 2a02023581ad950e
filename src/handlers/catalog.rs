use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use uuid::Uuid;

use super::common::{
    created_response, no_content_response, success_response, JsonBody, PaginationParams,
    SearchParams,
};
use crate::{
    auth::AuthRouterExt,
    errors::ApiError,
    services::catalog::{
        CreateCategoryRequest, CreateProductRequest, ProductFilter, UpdateCategoryRequest,
        UpdateProductRequest,
    },
    AppState,
};

// Categories

pub async fn list_categories(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<impl IntoResponse, ApiError> {
    let categories = state.services.catalog.list_categories(params.search).await?;
    Ok(success_response(categories))
}

pub async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let category = state.services.catalog.get_category(id).await?;
    Ok(success_response(category))
}

pub async fn get_category_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let category = state.services.catalog.get_category_by_slug(&slug).await?;
    Ok(success_response(category))
}

pub async fn create_category(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<CreateCategoryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let category = state.services.catalog.create_category(payload).await?;
    Ok(created_response(category))
}

pub async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    JsonBody(payload): JsonBody<UpdateCategoryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let category = state.services.catalog.update_category(id, payload).await?;
    Ok(success_response(category))
}

pub async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.services.catalog.delete_category(id).await?;
    Ok(no_content_response())
}

// Products

pub async fn list_products(
    State(state): State<AppState>,
    Query(filter): Query<ProductFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let products = state.services.catalog.list_products(filter).await?;
    Ok(success_response(products))
}

pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let product = state.services.catalog.get_product(id).await?;
    Ok(success_response(product))
}

pub async fn get_product_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let product = state.services.catalog.get_product_by_slug(&slug).await?;
    Ok(success_response(product))
}

pub async fn create_product(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<CreateProductRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let product = state.services.catalog.create_product(payload).await?;
    Ok(created_response(product))
}

pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    JsonBody(payload): JsonBody<UpdateProductRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let product = state.services.catalog.update_product(id, payload).await?;
    Ok(success_response(product))
}

pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.services.catalog.delete_product(id).await?;
    Ok(no_content_response())
}

// Packs (storefront)

pub async fn list_packs(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    let page = state
        .services
        .packs
        .list_public(params.page, params.limit)
        .await?;
    Ok(success_response(page))
}

pub async fn get_pack(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let pack = state.services.packs.get_by_slug(&slug).await?;
    Ok(success_response(pack))
}

/// Routes mounted under `/catalog`: public reads, admin writes
pub fn catalog_routes() -> Router<AppState> {
    let public = Router::new()
        .route("/categories", get(list_categories))
        .route("/categories/:id", get(get_category))
        .route("/categories/slug/:slug", get(get_category_by_slug))
        .route("/products", get(list_products))
        .route("/products/:id", get(get_product))
        .route("/products/slug/:slug", get(get_product_by_slug))
        .route("/packs", get(list_packs))
        .route("/packs/:slug", get(get_pack));

    let admin = Router::new()
        .route("/categories", post(create_category))
        .route(
            "/categories/:id",
            axum::routing::put(update_category).delete(delete_category),
        )
        .route("/products", post(create_product))
        .route(
            "/products/:id",
            axum::routing::put(update_product).delete(delete_product),
        )
        .with_role("ADMIN");

    public.merge(admin)
}
