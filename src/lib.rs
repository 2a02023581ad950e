//! L'Artistou API Library
//!
//! Storefront backend for the L'Artistou furniture shop: catalog, packs,
//! cart, orders, customer accounts and back office.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod health;
pub mod middleware_helpers;
pub mod notifications;
pub mod pricing;
pub mod services;
pub mod shipping;
pub mod tracing;
pub mod validation;

use axum::{routing::get, Extension, Router};
use http::HeaderValue;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
};

use crate::auth::{AuthConfig, AuthService};
use crate::config::{AppConfig, AppConfigError};
use crate::notifications::Mailer;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: Arc<AppConfig>,
    pub auth: Arc<AuthService>,
    pub services: handlers::AppServices,
}

impl AppState {
    pub fn new(db: Arc<DatabaseConnection>, config: AppConfig, mailer: Arc<dyn Mailer>) -> Self {
        let config = Arc::new(config);
        let auth = Arc::new(AuthService::new(
            AuthConfig::from(config.as_ref()),
            db.clone(),
        ));
        let services = handlers::AppServices::new(db.clone(), auth.clone(), mailer, config.clone());
        Self {
            db,
            config,
            auth,
            services,
        }
    }
}

/// Every API route; mounted under `/api`
pub fn api_routes(db: Arc<DatabaseConnection>) -> Router<AppState> {
    Router::new()
        .nest("/health", health::health_routes(db))
        .nest("/auth", handlers::auth::auth_routes())
        .nest("/catalog", handlers::catalog::catalog_routes())
        .nest("/admin", handlers::admin::admin_routes())
        .merge(handlers::orders::orders_routes())
        .merge(handlers::contact::contact_routes())
        .merge(handlers::shipping::shipping_routes())
}

/// Builds the CORS layer from configuration.
///
/// Explicit origins win; otherwise permissive CORS is only allowed in
/// development or when explicitly enabled.
pub fn cors_layer(cfg: &AppConfig) -> Result<CorsLayer, AppConfigError> {
    let configured_origins: Option<Vec<HeaderValue>> = cfg
        .cors_allowed_origins
        .as_ref()
        .map(|raw| {
            raw.split(',')
                .filter_map(|origin| {
                    let trimmed = origin.trim();
                    if trimmed.is_empty() {
                        None
                    } else {
                        HeaderValue::from_str(trimmed).ok()
                    }
                })
                .collect::<Vec<_>>()
        })
        .filter(|origins| !origins.is_empty());

    if let Some(origins) = configured_origins {
        Ok(CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
            .allow_credentials(cfg.cors_allow_credentials))
    } else if cfg.should_allow_permissive_cors() {
        ::tracing::info!(
            "Using permissive CORS because explicit origins were not configured ({})",
            if cfg.is_development() {
                "development environment"
            } else {
                "explicit override enabled"
            }
        );
        Ok(CorsLayer::permissive())
    } else {
        Err(AppConfigError::Load(::config::ConfigError::Message(
            "Missing CORS configuration: set APP__CORS_ALLOWED_ORIGINS or APP__CORS_ALLOW_ANY_ORIGIN=true"
                .to_string(),
        )))
    }
}

/// The complete application: banner, `/api` routes and the middleware stack.
pub fn app_router(state: AppState, cors: CorsLayer) -> Router {
    Router::<AppState>::new()
        .route("/", get(|| async { "L'Artistou API up" }))
        .nest("/api", api_routes(state.db.clone()))
        // HTTP tracing layer for consistent request/response telemetry
        .layer(crate::tracing::configure_http_tracing())
        .layer(CompressionLayer::new())
        .layer(cors)
        // Inject AuthService into request extensions for auth middleware
        .layer(Extension(state.auth.clone()))
        // Ensure every request carries a request id for traceability
        .layer(axum::middleware::from_fn(
            middleware_helpers::request_id::request_id_middleware,
        ))
        .with_state(state)
}
