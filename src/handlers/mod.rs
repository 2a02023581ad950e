pub mod admin;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod common;
pub mod contact;
pub mod orders;
pub mod shipping;

use crate::{
    auth::AuthService,
    config::AppConfig,
    db::DbPool,
    notifications::Mailer,
    services::{
        accounts::AccountService, admin::AdminService, cart::CartService,
        catalog::CatalogService, contact::ContactService, orders::OrderService,
        packs::PackService,
    },
};
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub accounts: Arc<AccountService>,
    pub catalog: Arc<CatalogService>,
    pub packs: Arc<PackService>,
    pub cart: Arc<CartService>,
    pub orders: Arc<OrderService>,
    pub admin: Arc<AdminService>,
    pub contact: Arc<ContactService>,
}

impl AppServices {
    pub fn new(
        db_pool: Arc<DbPool>,
        auth_service: Arc<AuthService>,
        mailer: Arc<dyn Mailer>,
        config: Arc<AppConfig>,
    ) -> Self {
        Self {
            accounts: Arc::new(AccountService::new(
                db_pool.clone(),
                auth_service,
                mailer.clone(),
                config.clone(),
            )),
            catalog: Arc::new(CatalogService::new(db_pool.clone())),
            packs: Arc::new(PackService::new(db_pool.clone())),
            cart: Arc::new(CartService::new(db_pool.clone())),
            orders: Arc::new(OrderService::new(db_pool.clone())),
            admin: Arc::new(AdminService::new(db_pool)),
            contact: Arc::new(ContactService::new(mailer, config)),
        }
    }
}
