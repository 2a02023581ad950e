use axum::{response::IntoResponse, routing::get, Json, Router};

use crate::{shipping::governorates, AppState};

pub async fn list_governorates() -> impl IntoResponse {
    Json(governorates())
}

pub fn shipping_routes() -> Router<AppState> {
    Router::new().route("/shipping/governorates", get(list_governorates))
}
