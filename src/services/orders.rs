use crate::{
    entities::{cart_item, order, order_item, user, OrderStatus},
    errors::ServiceError,
    pricing::{compute_total, PricedLine, Priced},
    services::cart::{
        ensure_quantity, find_cart, load_cart_lines, load_purchasable, ItemRef, Purchasable,
    },
    shipping::shipping_cost_for_order,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, LoaderTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Deserialize)]
pub struct OrderItemInput {
    pub product_id: Option<Uuid>,
    pub pack_id: Option<Uuid>,
    pub quantity: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct PlaceOrderRequest {
    #[validate(length(min = 1, message = "First name is required"))]
    pub first_name: String,
    #[validate(length(min = 1, message = "Last name is required"))]
    pub last_name: String,
    #[validate(length(min = 8, message = "Phone number must be at least 8 characters"))]
    pub phone: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "Shipping address is required"))]
    pub shipping_address: String,
    #[validate(length(min = 1, message = "City is required"))]
    pub city: String,
    pub governorate: Option<String>,
    pub remarks: Option<String>,
    /// When absent the caller's cart is ordered.
    pub items: Option<Vec<OrderItemInput>>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateOrderStatusRequest {
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerSummary {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl From<user::Model> for CustomerSummary {
    fn from(user: user::Model) -> Self {
        Self {
            id: user.id,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderView {
    #[serde(flatten)]
    pub order: order::Model,
    pub items: Vec<order_item::Model>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer: Option<CustomerSummary>,
}

/// Attaches items, and optionally the customer, to each order.
pub(crate) async fn order_views<C: ConnectionTrait>(
    conn: &C,
    orders: Vec<order::Model>,
    with_customer: bool,
) -> Result<Vec<OrderView>, ServiceError> {
    let items = orders.load_many(order_item::Entity, conn).await?;
    let customers = if with_customer {
        orders.load_one(user::Entity, conn).await?
    } else {
        vec![None; orders.len()]
    };

    Ok(orders
        .into_iter()
        .zip(items)
        .zip(customers)
        .map(|((order, items), customer)| OrderView {
            order,
            items,
            customer: customer.map(CustomerSummary::from),
        })
        .collect())
}

/// Parses one of the five upper-case status names.
pub fn parse_status(raw: &str) -> Result<OrderStatus, ServiceError> {
    OrderStatus::from_str(raw.trim().to_uppercase().as_str())
        .map_err(|_| ServiceError::ValidationError("Invalid order status".to_string()))
}

/// Order placement and lifecycle
#[derive(Clone)]
pub struct OrderService {
    db: Arc<DatabaseConnection>,
}

impl OrderService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Prices the explicit item list (or the cart), snapshots unit prices and
    /// names, writes the order and clears the cart in one transaction.
    #[instrument(skip(self, request), fields(user_id = %user_id))]
    pub async fn place_order(
        &self,
        user_id: Uuid,
        request: PlaceOrderRequest,
    ) -> Result<OrderView, ServiceError> {
        request.validate()?;

        let txn = self.db.begin().await?;
        let cart = find_cart(&txn, user_id).await?;

        let lines: Vec<(Purchasable, i32)> = match request.items {
            Some(items) if items.is_empty() => {
                return Err(ServiceError::ValidationError("No items provided".to_string()));
            }
            Some(items) => {
                let mut lines = Vec::with_capacity(items.len());
                for input in items {
                    let item_ref = ItemRef::from_ids(input.product_id, input.pack_id)?;
                    let quantity = ensure_quantity(input.quantity)?;
                    lines.push((load_purchasable(&txn, item_ref).await?, quantity));
                }
                lines
            }
            None => {
                let cart_lines = match cart.as_ref() {
                    Some(cart) => load_cart_lines(&txn, cart.id).await?,
                    None => Vec::new(),
                };
                if cart_lines.is_empty() {
                    return Err(ServiceError::ValidationError("Cart is empty".to_string()));
                }
                cart_lines
                    .into_iter()
                    .map(|(item, target)| (target, item.quantity))
                    .collect()
            }
        };

        let shipping_cost = shipping_cost_for_order(request.governorate.as_deref());
        let priced: Vec<PricedLine> = lines
            .iter()
            .map(|(target, quantity)| PricedLine::new(target.effective_unit_price(), *quantity))
            .collect();
        let totals = compute_total(&priced, shipping_cost)?;

        let now = Utc::now();
        let order = order::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            first_name: Set(request.first_name),
            last_name: Set(request.last_name),
            phone: Set(request.phone),
            email: Set(request.email),
            shipping_address: Set(request.shipping_address),
            city: Set(request.city),
            governorate: Set(request.governorate),
            remarks: Set(request.remarks),
            subtotal: Set(totals.subtotal),
            shipping_cost: Set(totals.shipping_cost),
            total_price: Set(totals.total),
            status: Set(OrderStatus::Pending),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        let mut items = Vec::with_capacity(lines.len());
        for (target, quantity) in &lines {
            let item_ref = target.item_ref();
            let item = order_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                order_id: Set(order.id),
                product_id: Set(item_ref.product_id()),
                pack_id: Set(item_ref.pack_id()),
                item_name: Set(target.name().to_string()),
                quantity: Set(*quantity),
                price_at_time: Set(target.effective_unit_price()),
                created_at: Set(now),
            }
            .insert(&txn)
            .await?;
            items.push(item);
        }

        if let Some(cart) = cart {
            cart_item::Entity::delete_many()
                .filter(cart_item::Column::CartId.eq(cart.id))
                .exec(&txn)
                .await?;
        }

        txn.commit().await?;

        info!(
            order_id = %order.id,
            total = %order.total_price,
            shipping = %order.shipping_cost,
            lines = items.len(),
            "order placed"
        );
        Ok(OrderView {
            order,
            items,
            customer: None,
        })
    }

    #[instrument(skip(self))]
    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<OrderView>, ServiceError> {
        let orders = order::Entity::find()
            .filter(order::Column::UserId.eq(user_id))
            .order_by_desc(order::Column::CreatedAt)
            .all(&*self.db)
            .await?;
        order_views(&*self.db, orders, false).await
    }

    async fn find_owned(&self, user_id: Uuid, order_id: Uuid) -> Result<order::Model, ServiceError> {
        order::Entity::find_by_id(order_id)
            .filter(order::Column::UserId.eq(user_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Order not found".to_string()))
    }

    /// Another user's order is reported as missing.
    #[instrument(skip(self))]
    pub async fn get_for_user(&self, user_id: Uuid, order_id: Uuid) -> Result<OrderView, ServiceError> {
        let order = self.find_owned(user_id, order_id).await?;
        let mut views = order_views(&*self.db, vec![order], false).await?;
        views
            .pop()
            .ok_or_else(|| ServiceError::NotFound("Order not found".to_string()))
    }

    /// Customers may only cancel their own PENDING orders.
    #[instrument(skip(self))]
    pub async fn cancel(&self, user_id: Uuid, order_id: Uuid) -> Result<OrderView, ServiceError> {
        let order = self.find_owned(user_id, order_id).await?;
        if !order.status.can_cancel() {
            return Err(ServiceError::Conflict(format!(
                "Only pending orders can be cancelled, this order is {}",
                order.status
            )));
        }

        let mut active: order::ActiveModel = order.into();
        active.status = Set(OrderStatus::Cancelled);
        active.updated_at = Set(Utc::now());
        let order = active.update(&*self.db).await?;

        info!(order_id = %order_id, "order cancelled by customer");
        let mut views = order_views(&*self.db, vec![order], false).await?;
        views
            .pop()
            .ok_or_else(|| ServiceError::NotFound("Order not found".to_string()))
    }

    #[instrument(skip(self))]
    pub async fn list_all(&self) -> Result<Vec<OrderView>, ServiceError> {
        let orders = order::Entity::find()
            .order_by_desc(order::Column::CreatedAt)
            .all(&*self.db)
            .await?;
        order_views(&*self.db, orders, true).await
    }

    /// Admins may set any known status.
    #[instrument(skip(self))]
    pub async fn update_status(&self, order_id: Uuid, status: &str) -> Result<OrderView, ServiceError> {
        let status = parse_status(status)?;

        let order = order::Entity::find_by_id(order_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Order not found".to_string()))?;
        let previous = order.status;

        let mut active: order::ActiveModel = order.into();
        active.status = Set(status);
        active.updated_at = Set(Utc::now());
        let order = active.update(&*self.db).await?;

        info!(order_id = %order_id, from = %previous, to = %status, "order status changed");
        let mut views = order_views(&*self.db, vec![order], true).await?;
        views
            .pop()
            .ok_or_else(|| ServiceError::NotFound("Order not found".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rstest::rstest;

    #[rstest]
    #[case("PENDING", OrderStatus::Pending)]
    #[case("shipped", OrderStatus::Shipped)]
    #[case(" Delivered ", OrderStatus::Delivered)]
    fn parses_known_statuses(#[case] raw: &str, #[case] expected: OrderStatus) {
        assert_eq!(parse_status(raw).unwrap(), expected);
    }

    #[test]
    fn unknown_status_is_a_validation_error() {
        assert_matches!(
            parse_status("LOST"),
            Err(ServiceError::ValidationError(msg)) if msg == "Invalid order status"
        );
    }

    #[test]
    fn order_request_requires_valid_contact_details() {
        let request: PlaceOrderRequest = serde_json::from_value(serde_json::json!({
            "first_name": "Amira",
            "last_name": "Ben Salah",
            "phone": "123",
            "email": "not-an-email",
            "shipping_address": "12 rue de Marseille",
            "city": "Tunis"
        }))
        .unwrap();
        let errors = request.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("phone"));
        assert!(fields.contains_key("email"));
        assert!(request.items.is_none());
    }
}
