#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use lartistou_api::{
    app_router,
    config::AppConfig,
    cors_layer, db,
    entities::{
        category, product,
        user::{self, UserRole},
    },
    notifications::{EmailMessage, MailError, Mailer},
    services::catalog::{CreateCategoryRequest, CreateProductRequest},
    AppState,
};

pub const TEST_JWT_SECRET: &str =
    "q8Zt3vL9mW2xR7nK4pY6bH1jF5sD0gC8aE3uI7oT2wQ9zX4cV6bN1mL5kJ8hG3fS";
pub const TEST_PASSWORD: &str = "secret123";

/// Keeps every message it is asked to send.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<EmailMessage>>,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, message: EmailMessage) -> Result<(), MailError> {
        self.sent.lock().unwrap().push(message);
        Ok(())
    }
}

/// Rejects every message, as a relay returning 503 would.
pub struct FailingMailer;

#[async_trait]
impl Mailer for FailingMailer {
    async fn send(&self, _message: EmailMessage) -> Result<(), MailError> {
        Err(MailError::Rejected(503))
    }
}

/// Helper harness for spinning up the application against an in-memory SQLite database.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    pub mailer: Arc<RecordingMailer>,
}

/// A registered account and its current bearer token.
pub struct TestUser {
    pub id: Uuid,
    pub email: String,
    pub token: String,
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        let mailer = Arc::new(RecordingMailer::default());
        Self::build(mailer.clone(), mailer).await
    }

    /// Same as [`TestApp::new`] but every outgoing mail fails.
    pub async fn with_failing_mailer() -> Self {
        Self::build(Arc::new(FailingMailer), Arc::new(RecordingMailer::default())).await
    }

    async fn build(mailer: Arc<dyn Mailer>, recorder: Arc<RecordingMailer>) -> Self {
        let mut cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            TEST_JWT_SECRET.to_string(),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        cfg.cors_allow_any_origin = true;
        // A single connection keeps the in-memory database alive and shared
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;
        cfg.password_reset_url = "https://lartistou.test/reset".to_string();
        cfg.contact_recipient = "atelier@lartistou.test".to_string();

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let cors = cors_layer(&cfg).expect("permissive cors for tests");
        let state = AppState::new(Arc::new(pool), cfg, mailer);
        let router = app_router(state.clone(), cors);

        Self {
            router,
            state,
            mailer: recorder,
        }
    }

    /// Send a request against the router with an optional bearer token.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(tok) = token {
            builder = builder.header("authorization", format!("Bearer {}", tok));
        }

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Sends a request and decodes the JSON body; empty bodies decode to `Null`.
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> (StatusCode, Value) {
        let response = self.request(method, uri, body, token).await;
        decode(response).await
    }

    /// Posts a raw JSON-typed body, for payloads `serde_json` cannot produce.
    pub async fn send_raw(&self, uri: &str, raw: &str, token: Option<&str>) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header("content-type", "application/json");
        if let Some(tok) = token {
            builder = builder.header("authorization", format!("Bearer {}", tok));
        }
        let request = builder
            .body(Body::from(raw.to_string()))
            .expect("failed to build request");
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request");
        decode(response).await
    }

    pub async fn register(&self, email: &str) -> TestUser {
        let (status, body) = self
            .send(
                Method::POST,
                "/api/auth/register",
                Some(json!({
                    "email": email,
                    "password": TEST_PASSWORD,
                    "first_name": "Amel",
                    "last_name": "Trabelsi",
                    "phone": "22123456"
                })),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
        TestUser {
            id: body["user"]["id"]
                .as_str()
                .and_then(|id| Uuid::parse_str(id).ok())
                .expect("user id in register response"),
            email: email.to_string(),
            token: body["access_token"]
                .as_str()
                .expect("access token in register response")
                .to_string(),
        }
    }

    pub async fn login(&self, email: &str, password: &str) -> (StatusCode, Value) {
        self.send(
            Method::POST,
            "/api/auth/login",
            Some(json!({ "email": email, "password": password })),
            None,
        )
        .await
    }

    /// Registers an account, promotes it to ADMIN and returns a fresh session.
    pub async fn admin(&self) -> TestUser {
        let mut admin = self.register("admin@lartistou.test").await;
        let found = user::Entity::find_by_id(admin.id)
            .one(self.state.db.as_ref())
            .await
            .expect("query admin")
            .expect("admin exists");
        let mut active: user::ActiveModel = found.into();
        active.role = Set(UserRole::Admin);
        active
            .update(self.state.db.as_ref())
            .await
            .expect("promote admin");

        let (status, body) = self.login(&admin.email, TEST_PASSWORD).await;
        assert_eq!(status, StatusCode::OK, "admin login failed: {body}");
        admin.token = body["access_token"].as_str().unwrap().to_string();
        admin
    }

    pub async fn seed_category(&self, slug: &str) -> category::Model {
        self.state
            .services
            .catalog
            .create_category(CreateCategoryRequest {
                name: slug.to_uppercase(),
                slug: slug.to_string(),
                image: None,
                show_in_home_page: Some(true),
            })
            .await
            .expect("seed category")
    }

    pub async fn seed_product(
        &self,
        category_id: Uuid,
        slug: &str,
        price: i64,
        discount_price: Option<i64>,
    ) -> product::Model {
        self.state
            .services
            .catalog
            .create_product(CreateProductRequest {
                name: format!("Produit {slug}"),
                slug: slug.to_string(),
                category_id,
                main_image: None,
                multi_images: Vec::new(),
                price_details: None,
                description: Some("Bois massif".to_string()),
                characteristics: None,
                price: Decimal::from(price),
                discount_price: discount_price.map(Decimal::from),
                show_in_menu: Some(true),
                video_link: None,
            })
            .await
            .expect("seed product")
            .product
    }

    /// One product in each of the `sam`, `cac` and `salon` categories.
    pub async fn seed_pack_components(&self) -> [product::Model; 3] {
        let sam = self.seed_category("sam").await;
        let cac = self.seed_category("cac").await;
        let salon = self.seed_category("salon").await;
        [
            self.seed_product(sam.id, "table-olivier", 1000, None).await,
            self.seed_product(cac.id, "lit-jasmin", 2000, Some(1500)).await,
            self.seed_product(salon.id, "canape-medina", 3000, None).await,
        ]
    }
}

/// Parses a JSON money value, which serialises as a string.
pub fn money(value: &Value) -> Decimal {
    match value {
        Value::String(s) => s.parse().expect("decimal string"),
        Value::Number(n) => n.to_string().parse().expect("decimal number"),
        other => panic!("not a money value: {other}"),
    }
}

/// Status plus JSON body; empty bodies decode to `Null`, non-JSON to a string.
async fn decode(response: axum::response::Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read response body");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, value)
}
