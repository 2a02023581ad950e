use axum::{extract::State, response::IntoResponse, routing::post, Router};

use super::common::{success_response, JsonBody};
use crate::{errors::ApiError, services::contact::ContactRequest, AppState};

pub async fn submit_contact(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<ContactRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let response = state.services.contact.submit(payload).await?;
    Ok(success_response(response))
}

pub fn contact_routes() -> Router<AppState> {
    Router::new().route("/contact", post(submit_contact))
}
