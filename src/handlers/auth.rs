use axum::{
    extract::State,
    response::IntoResponse,
    routing::{get, post},
    Extension, Router,
};

use super::common::{created_response, success_response, JsonBody};
use crate::{
    auth::{AuthRouterExt, AuthUser},
    errors::ApiError,
    services::accounts::{
        ChangePasswordRequest, ForgotPasswordRequest, LoginRequest, RegisterRequest,
        ResetPasswordRequest, UpdateProfileRequest,
    },
    AppState,
};

pub async fn register(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let response = state.services.accounts.register(payload).await?;
    Ok(created_response(response))
}

pub async fn login(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let response = state.services.accounts.login(payload).await?;
    Ok(success_response(response))
}

pub async fn forgot_password(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<ForgotPasswordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let response = state.services.accounts.forgot_password(payload).await?;
    Ok(success_response(response))
}

pub async fn reset_password(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<ResetPasswordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let response = state.services.accounts.reset_password(payload).await?;
    Ok(success_response(response))
}

pub async fn profile(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse, ApiError> {
    let profile = state.services.accounts.profile(user.user_id).await?;
    Ok(success_response(profile))
}

pub async fn update_profile(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    JsonBody(payload): JsonBody<UpdateProfileRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let profile = state
        .services
        .accounts
        .update_profile(user.user_id, payload)
        .await?;
    Ok(success_response(profile))
}

pub async fn change_password(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    JsonBody(payload): JsonBody<ChangePasswordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let response = state
        .services
        .accounts
        .change_password(user.user_id, payload)
        .await?;
    Ok(success_response(response))
}

/// Routes mounted under `/auth`
pub fn auth_routes() -> Router<AppState> {
    let public = Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/forgot-password", post(forgot_password))
        .route("/reset-password", post(reset_password));

    let authenticated = Router::new()
        .route("/profile", get(profile).put(update_profile))
        .route("/change-password", post(change_password))
        .with_auth();

    public.merge(authenticated)
}
