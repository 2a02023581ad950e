use crate::{
    entities::{cart, cart_item, pack, product},
    errors::ServiceError,
    pricing::{compute_line_total, compute_total, PricedLine, Priced, PricingError},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, ModelTrait,
    QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// What a cart or order line points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemRef {
    Product(Uuid),
    Pack(Uuid),
}

impl ItemRef {
    /// Exactly one of the two ids must be present.
    pub fn from_ids(product_id: Option<Uuid>, pack_id: Option<Uuid>) -> Result<Self, ServiceError> {
        match (product_id, pack_id) {
            (Some(id), None) => Ok(ItemRef::Product(id)),
            (None, Some(id)) => Ok(ItemRef::Pack(id)),
            _ => Err(ServiceError::ValidationError(
                "Exactly one of product_id or pack_id must be provided".to_string(),
            )),
        }
    }

    pub fn product_id(&self) -> Option<Uuid> {
        match self {
            ItemRef::Product(id) => Some(*id),
            ItemRef::Pack(_) => None,
        }
    }

    pub fn pack_id(&self) -> Option<Uuid> {
        match self {
            ItemRef::Pack(id) => Some(*id),
            ItemRef::Product(_) => None,
        }
    }
}

/// A product or pack loaded for pricing.
#[derive(Debug, Clone)]
pub enum Purchasable {
    Product(product::Model),
    Pack(pack::Model),
}

impl Purchasable {
    pub fn name(&self) -> &str {
        match self {
            Purchasable::Product(p) => &p.name,
            Purchasable::Pack(p) => &p.name,
        }
    }

    pub fn item_ref(&self) -> ItemRef {
        match self {
            Purchasable::Product(p) => ItemRef::Product(p.id),
            Purchasable::Pack(p) => ItemRef::Pack(p.id),
        }
    }
}

impl Priced for Purchasable {
    fn effective_unit_price(&self) -> Decimal {
        match self {
            Purchasable::Product(p) => p.effective_unit_price(),
            Purchasable::Pack(p) => p.effective_unit_price(),
        }
    }
}

pub(crate) async fn load_purchasable<C: ConnectionTrait>(
    conn: &C,
    item: ItemRef,
) -> Result<Purchasable, ServiceError> {
    match item {
        ItemRef::Product(id) => product::Entity::find_by_id(id)
            .one(conn)
            .await?
            .map(Purchasable::Product)
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", id))),
        ItemRef::Pack(id) => pack::Entity::find_by_id(id)
            .one(conn)
            .await?
            .map(Purchasable::Pack)
            .ok_or_else(|| ServiceError::NotFound(format!("Pack {} not found", id))),
    }
}

/// Upper bound on the quantity of a single cart or order line.
pub const MAX_LINE_QUANTITY: i32 = 1_000;

pub(crate) fn ensure_quantity(quantity: i32) -> Result<i32, ServiceError> {
    if quantity < 1 {
        return Err(PricingError::InvalidQuantity.into());
    }
    if quantity > MAX_LINE_QUANTITY {
        return Err(ServiceError::ValidationError(format!(
            "Quantity cannot exceed {}",
            MAX_LINE_QUANTITY
        )));
    }
    Ok(quantity)
}

#[derive(Debug, Deserialize)]
pub struct AddCartItemRequest {
    pub product_id: Option<Uuid>,
    pub pack_id: Option<Uuid>,
    pub quantity: i32,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCartItemRequest {
    pub quantity: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLine {
    pub id: Uuid,
    pub product: Option<product::Model>,
    pub pack: Option<pack::Model>,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartView {
    pub id: Uuid,
    pub items: Vec<CartLine>,
    pub subtotal: Decimal,
    pub item_count: i64,
}

pub(crate) async fn find_cart<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
) -> Result<Option<cart::Model>, ServiceError> {
    Ok(cart::Entity::find()
        .filter(cart::Column::UserId.eq(user_id))
        .one(conn)
        .await?)
}

/// Cart lines in insertion order, each with its product or pack.
pub(crate) async fn load_cart_lines<C: ConnectionTrait>(
    conn: &C,
    cart_id: Uuid,
) -> Result<Vec<(cart_item::Model, Purchasable)>, ServiceError> {
    let items = cart_item::Entity::find()
        .filter(cart_item::Column::CartId.eq(cart_id))
        .order_by_asc(cart_item::Column::CreatedAt)
        .all(conn)
        .await?;

    let product_ids: Vec<Uuid> = items.iter().filter_map(|i| i.product_id).collect();
    let pack_ids: Vec<Uuid> = items.iter().filter_map(|i| i.pack_id).collect();

    let products: HashMap<Uuid, product::Model> = if product_ids.is_empty() {
        HashMap::new()
    } else {
        product::Entity::find()
            .filter(product::Column::Id.is_in(product_ids))
            .all(conn)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect()
    };
    let packs: HashMap<Uuid, pack::Model> = if pack_ids.is_empty() {
        HashMap::new()
    } else {
        pack::Entity::find()
            .filter(pack::Column::Id.is_in(pack_ids))
            .all(conn)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect()
    };

    Ok(items
        .into_iter()
        .filter_map(|item| {
            let target = match (item.product_id, item.pack_id) {
                (Some(id), _) => products.get(&id).cloned().map(Purchasable::Product),
                (None, Some(id)) => packs.get(&id).cloned().map(Purchasable::Pack),
                (None, None) => None,
            }?;
            Some((item, target))
        })
        .collect())
}

/// Prices a loaded cart with live catalog prices.
pub fn price_cart(cart_id: Uuid, lines: Vec<(cart_item::Model, Purchasable)>) -> Result<CartView, ServiceError> {
    let priced: Vec<PricedLine> = lines
        .iter()
        .map(|(item, target)| PricedLine::new(target.effective_unit_price(), item.quantity))
        .collect();
    let totals = compute_total(&priced, Decimal::ZERO)?;

    let mut views = Vec::with_capacity(lines.len());
    let mut item_count = 0i64;
    for (item, target) in lines {
        let unit_price = target.effective_unit_price();
        let line_total = compute_line_total(unit_price, item.quantity)?;
        item_count += i64::from(item.quantity);
        let (product, pack) = match target {
            Purchasable::Product(p) => (Some(p), None),
            Purchasable::Pack(p) => (None, Some(p)),
        };
        views.push(CartLine {
            id: item.id,
            product,
            pack,
            quantity: item.quantity,
            unit_price,
            line_total,
        });
    }

    Ok(CartView {
        id: cart_id,
        items: views,
        subtotal: totals.subtotal,
        item_count,
    })
}

/// Per-user shopping cart
#[derive(Clone)]
pub struct CartService {
    db: Arc<DatabaseConnection>,
}

impl CartService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Returns the user's cart, creating it on first access.
    async fn get_or_create(&self, user_id: Uuid) -> Result<cart::Model, ServiceError> {
        if let Some(cart) = find_cart(&*self.db, user_id).await? {
            return Ok(cart);
        }

        let now = Utc::now();
        let inserted = cart::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db)
        .await;

        match inserted {
            Ok(cart) => {
                info!(user_id = %user_id, cart_id = %cart.id, "cart created");
                Ok(cart)
            }
            // Lost a race with a concurrent first access.
            Err(e) => find_cart(&*self.db, user_id)
                .await?
                .ok_or(ServiceError::DatabaseError(e)),
        }
    }

    async fn view(&self, cart: &cart::Model) -> Result<CartView, ServiceError> {
        let lines = load_cart_lines(&*self.db, cart.id).await?;
        price_cart(cart.id, lines)
    }

    async fn owned_item(&self, cart: &cart::Model, item_id: Uuid) -> Result<cart_item::Model, ServiceError> {
        cart_item::Entity::find_by_id(item_id)
            .filter(cart_item::Column::CartId.eq(cart.id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Cart item not found".to_string()))
    }

    #[instrument(skip(self))]
    pub async fn get_cart(&self, user_id: Uuid) -> Result<CartView, ServiceError> {
        let cart = self.get_or_create(user_id).await?;
        self.view(&cart).await
    }

    /// Adds a line, or bumps the quantity of the existing line for the same item.
    #[instrument(skip(self))]
    pub async fn add_item(
        &self,
        user_id: Uuid,
        request: AddCartItemRequest,
    ) -> Result<CartView, ServiceError> {
        let item_ref = ItemRef::from_ids(request.product_id, request.pack_id)?;
        let quantity = ensure_quantity(request.quantity)?;
        load_purchasable(&*self.db, item_ref).await?;

        let cart = self.get_or_create(user_id).await?;

        let mut query = cart_item::Entity::find().filter(cart_item::Column::CartId.eq(cart.id));
        query = match item_ref {
            ItemRef::Product(id) => query.filter(cart_item::Column::ProductId.eq(id)),
            ItemRef::Pack(id) => query.filter(cart_item::Column::PackId.eq(id)),
        };

        let now = Utc::now();
        match query.one(&*self.db).await? {
            Some(existing) => {
                let new_quantity = existing
                    .quantity
                    .checked_add(quantity)
                    .ok_or_else(|| {
                        ServiceError::ValidationError(format!(
                            "Quantity cannot exceed {}",
                            MAX_LINE_QUANTITY
                        ))
                    })
                    .and_then(ensure_quantity)?;
                let mut active: cart_item::ActiveModel = existing.into();
                active.quantity = Set(new_quantity);
                active.updated_at = Set(now);
                active.update(&*self.db).await?;
            }
            None => {
                cart_item::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    cart_id: Set(cart.id),
                    product_id: Set(item_ref.product_id()),
                    pack_id: Set(item_ref.pack_id()),
                    quantity: Set(quantity),
                    created_at: Set(now),
                    updated_at: Set(now),
                }
                .insert(&*self.db)
                .await?;
            }
        }

        info!(cart_id = %cart.id, ?item_ref, quantity, "item added to cart");
        self.view(&cart).await
    }

    #[instrument(skip(self))]
    pub async fn update_item(
        &self,
        user_id: Uuid,
        item_id: Uuid,
        request: UpdateCartItemRequest,
    ) -> Result<CartView, ServiceError> {
        let quantity = ensure_quantity(request.quantity)?;
        let cart = self.get_or_create(user_id).await?;
        let item = self.owned_item(&cart, item_id).await?;

        let mut active: cart_item::ActiveModel = item.into();
        active.quantity = Set(quantity);
        active.updated_at = Set(Utc::now());
        active.update(&*self.db).await?;

        self.view(&cart).await
    }

    #[instrument(skip(self))]
    pub async fn remove_item(&self, user_id: Uuid, item_id: Uuid) -> Result<CartView, ServiceError> {
        let cart = self.get_or_create(user_id).await?;
        let item = self.owned_item(&cart, item_id).await?;
        item.delete(&*self.db).await?;

        info!(cart_id = %cart.id, item_id = %item_id, "item removed from cart");
        self.view(&cart).await
    }

    #[instrument(skip(self))]
    pub async fn clear(&self, user_id: Uuid) -> Result<(), ServiceError> {
        if let Some(cart) = find_cart(&*self.db, user_id).await? {
            let removed = cart_item::Entity::delete_many()
                .filter(cart_item::Column::CartId.eq(cart.id))
                .exec(&*self.db)
                .await?
                .rows_affected;
            info!(cart_id = %cart.id, removed, "cart cleared");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn product(price: Decimal, discount: Option<Decimal>) -> product::Model {
        let now = Utc::now();
        product::Model {
            id: Uuid::new_v4(),
            name: "Chaise Zitouna".into(),
            slug: "chaise-zitouna".into(),
            main_image: None,
            multi_images: json!([]),
            price_details: None,
            description: None,
            characteristics: None,
            price,
            discount_price: discount,
            show_in_menu: true,
            video_link: None,
            category_id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
        }
    }

    fn line(quantity: i32) -> cart_item::Model {
        let now = Utc::now();
        cart_item::Model {
            id: Uuid::new_v4(),
            cart_id: Uuid::nil(),
            product_id: None,
            pack_id: None,
            quantity,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn item_ref_requires_exactly_one_id() {
        let id = Uuid::new_v4();
        assert_eq!(ItemRef::from_ids(Some(id), None).unwrap(), ItemRef::Product(id));
        assert_eq!(ItemRef::from_ids(None, Some(id)).unwrap(), ItemRef::Pack(id));
        assert_matches!(ItemRef::from_ids(None, None), Err(ServiceError::ValidationError(_)));
        assert_matches!(
            ItemRef::from_ids(Some(id), Some(id)),
            Err(ServiceError::ValidationError(_))
        );
    }

    #[test]
    fn zero_quantity_is_rejected() {
        assert_matches!(
            ensure_quantity(0),
            Err(ServiceError::ValidationError(msg)) if msg == "Quantity must be greater than 0"
        );
        assert_eq!(ensure_quantity(2).unwrap(), 2);
    }

    #[rstest::rstest]
    #[case(MAX_LINE_QUANTITY + 1)]
    #[case(i32::MAX)]
    fn oversized_quantity_is_rejected(#[case] quantity: i32) {
        assert_matches!(
            ensure_quantity(quantity),
            Err(ServiceError::ValidationError(msg)) if msg == "Quantity cannot exceed 1000"
        );
        assert_eq!(ensure_quantity(MAX_LINE_QUANTITY).unwrap(), MAX_LINE_QUANTITY);
    }

    #[test]
    fn cart_uses_discount_price_when_present() {
        let lines = vec![
            (line(2), Purchasable::Product(product(dec!(100), Some(dec!(80))))),
            (line(1), Purchasable::Product(product(dec!(50), None))),
        ];
        let view = price_cart(Uuid::nil(), lines).unwrap();
        assert_eq!(view.items[0].unit_price, dec!(80));
        assert_eq!(view.items[0].line_total, dec!(160));
        assert_eq!(view.subtotal, dec!(210));
        assert_eq!(view.item_count, 3);
    }
}
