use crate::{
    entities::{category, order, product, user, OrderStatus, UserRole},
    errors::ServiceError,
    services::{
        accounts::UserProfile,
        catalog::ProductView,
        orders::{order_views, OrderView},
    },
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

const RECENT_LIMIT: u64 = 5;

#[derive(Debug, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_products: u64,
    pub total_categories: u64,
    pub total_users: u64,
    pub total_orders: u64,
    pub total_revenue: Decimal,
    pub pending_orders: u64,
    pub recent_orders: Vec<OrderView>,
    pub recent_products: Vec<ProductView>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserWithOrderCount {
    #[serde(flatten)]
    pub user: UserProfile,
    pub order_count: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserDetail {
    #[serde(flatten)]
    pub user: UserProfile,
    pub orders: Vec<OrderView>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    pub role: String,
}

pub fn parse_role(raw: &str) -> Result<UserRole, ServiceError> {
    UserRole::from_str(raw.trim().to_uppercase().as_str())
        .map_err(|_| ServiceError::ValidationError("Invalid role".to_string()))
}

/// Back-office statistics and user management
#[derive(Clone)]
pub struct AdminService {
    db: Arc<DatabaseConnection>,
}

impl AdminService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    async fn revenue(&self) -> Result<Decimal, sea_orm::DbErr> {
        let totals: Vec<Decimal> = order::Entity::find()
            .select_only()
            .column(order::Column::TotalPrice)
            .filter(order::Column::Status.is_in(OrderStatus::revenue_statuses()))
            .into_tuple()
            .all(&*self.db)
            .await?;
        Ok(totals.into_iter().sum())
    }

    /// Counts run concurrently.
    #[instrument(skip(self))]
    pub async fn dashboard(&self) -> Result<DashboardStats, ServiceError> {
        let db = &*self.db;
        let (
            total_products,
            total_categories,
            total_users,
            total_orders,
            pending_orders,
            total_revenue,
            recent_orders,
            recent_products,
        ) = futures::try_join!(
            product::Entity::find().count(db),
            category::Entity::find().count(db),
            user::Entity::find().count(db),
            order::Entity::find().count(db),
            order::Entity::find()
                .filter(order::Column::Status.eq(OrderStatus::Pending))
                .count(db),
            self.revenue(),
            order::Entity::find()
                .order_by_desc(order::Column::CreatedAt)
                .limit(RECENT_LIMIT)
                .all(db),
            product::Entity::find()
                .order_by_desc(product::Column::CreatedAt)
                .limit(RECENT_LIMIT)
                .find_also_related(category::Entity)
                .all(db),
        )?;

        Ok(DashboardStats {
            total_products,
            total_categories,
            total_users,
            total_orders,
            total_revenue,
            pending_orders,
            recent_orders: order_views(db, recent_orders, true).await?,
            recent_products: recent_products
                .into_iter()
                .map(|(product, category)| ProductView { product, category })
                .collect(),
        })
    }

    #[instrument(skip(self))]
    pub async fn list_users(&self) -> Result<Vec<UserWithOrderCount>, ServiceError> {
        let users = user::Entity::find()
            .order_by_desc(user::Column::CreatedAt)
            .all(&*self.db)
            .await?;

        let counts: HashMap<Uuid, i64> = order::Entity::find()
            .select_only()
            .column(order::Column::UserId)
            .column_as(order::Column::Id.count(), "order_count")
            .group_by(order::Column::UserId)
            .into_tuple::<(Uuid, i64)>()
            .all(&*self.db)
            .await?
            .into_iter()
            .collect();

        Ok(users
            .into_iter()
            .map(|user| UserWithOrderCount {
                order_count: counts.get(&user.id).copied().unwrap_or(0).max(0) as u64,
                user: user.into(),
            })
            .collect())
    }

    #[instrument(skip(self))]
    pub async fn get_user(&self, id: Uuid) -> Result<UserDetail, ServiceError> {
        let user = user::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("User not found".to_string()))?;

        let orders = order::Entity::find()
            .filter(order::Column::UserId.eq(id))
            .order_by_desc(order::Column::CreatedAt)
            .all(&*self.db)
            .await?;

        Ok(UserDetail {
            user: user.into(),
            orders: order_views(&*self.db, orders, false).await?,
        })
    }

    #[instrument(skip(self))]
    pub async fn update_role(&self, id: Uuid, role: &str) -> Result<UserProfile, ServiceError> {
        let role = parse_role(role)?;

        let user = user::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("User not found".to_string()))?;
        let previous = user.role;

        let mut active: user::ActiveModel = user.into();
        active.role = Set(role);
        active.updated_at = Set(Utc::now());
        let user = active.update(&*self.db).await?;

        info!(user_id = %id, from = %previous, to = %role, "user role changed");
        Ok(user.into())
    }
}
