use crate::{
    entities::{category, pack, product},
    errors::ServiceError,
    pricing::{compute_pack_price, validate_discount, Priced, DEFAULT_PACK_DISCOUNT},
    validation::validate_slug,
};
use chrono::Utc;
use sea_orm::{
    sea_query::{Expr, Func},
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    ModelTrait, PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

/// Role label and the category slug a pack component must come from.
pub const PACK_ROLES: [(&str, &str); 3] = [("SAM", "sam"), ("CAC", "cac"), ("Salon", "salon")];

const DEFAULT_PAGE_SIZE: u64 = 10;
const MAX_PAGE_SIZE: u64 = 100;

#[derive(Debug, Deserialize, Validate)]
pub struct CreatePackRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(custom = "validate_slug")]
    pub slug: String,
    pub description: Option<String>,
    pub main_image: Option<String>,
    pub discount_percentage: Option<i32>,
    pub show_in_menu: Option<bool>,
    pub product_sam_id: Uuid,
    pub product_cac_id: Uuid,
    pub product_salon_id: Uuid,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdatePackRequest {
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    pub name: Option<String>,
    #[validate(custom = "validate_slug")]
    pub slug: Option<String>,
    pub description: Option<String>,
    pub main_image: Option<String>,
    pub discount_percentage: Option<i32>,
    pub show_in_menu: Option<bool>,
    pub product_sam_id: Option<Uuid>,
    pub product_cac_id: Option<Uuid>,
    pub product_salon_id: Option<Uuid>,
}

/// A pack with its three component products
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackView {
    #[serde(flatten)]
    pub pack: pack::Model,
    pub product_sam: Option<product::Model>,
    pub product_cac: Option<product::Model>,
    pub product_salon: Option<product::Model>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PackPage {
    pub data: Vec<PackView>,
    pub total: u64,
    pub page: u64,
    pub last_page: u64,
}

/// Page number (1-based) and page size after defaults and clamping.
pub fn page_window(page: Option<u64>, limit: Option<u64>) -> (u64, u64) {
    let page = page.unwrap_or(1).max(1);
    let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    (page, limit)
}

pub fn last_page(total: u64, limit: u64) -> u64 {
    total.div_ceil(limit)
}

/// Checks each component's category slug against its role.
pub fn check_roles(category_slugs: [Option<&str>; 3]) -> Result<(), ServiceError> {
    for ((label, expected), actual) in PACK_ROLES.iter().zip(category_slugs) {
        if actual != Some(*expected) {
            return Err(ServiceError::ValidationError(format!(
                "Product {} must be from category \"{}\"",
                label, expected
            )));
        }
    }
    Ok(())
}

/// Fetches the three products in one query, in role order.
pub(crate) async fn load_components<C: ConnectionTrait>(
    conn: &C,
    ids: [Uuid; 3],
) -> Result<[product::Model; 3], ServiceError> {
    let found: HashMap<Uuid, product::Model> = product::Entity::find()
        .filter(product::Column::Id.is_in(ids))
        .all(conn)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();

    let missing = || ServiceError::NotFound("All 3 products must exist".to_string());
    if found.len() < 3 {
        return Err(missing());
    }
    let [sam, cac, salon] = ids;
    Ok([
        found.get(&sam).cloned().ok_or_else(missing)?,
        found.get(&cac).cloned().ok_or_else(missing)?,
        found.get(&salon).cloned().ok_or_else(missing)?,
    ])
}

async fn validate_component_roles<C: ConnectionTrait>(
    conn: &C,
    products: &[product::Model; 3],
) -> Result<(), ServiceError> {
    let slugs: HashMap<Uuid, String> = category::Entity::find()
        .filter(category::Column::Id.is_in(products.iter().map(|p| p.category_id)))
        .all(conn)
        .await?
        .into_iter()
        .map(|c| (c.id, c.slug))
        .collect();

    check_roles([
        slugs.get(&products[0].category_id).map(String::as_str),
        slugs.get(&products[1].category_id).map(String::as_str),
        slugs.get(&products[2].category_id).map(String::as_str),
    ])
}

fn price_components(products: &[product::Model; 3]) -> [rust_decimal::Decimal; 3] {
    [
        products[0].effective_unit_price(),
        products[1].effective_unit_price(),
        products[2].effective_unit_price(),
    ]
}

/// Recomputes the price of every pack that contains `product_id`.
pub(crate) async fn reprice_packs_for_product<C: ConnectionTrait>(
    conn: &C,
    product_id: Uuid,
) -> Result<usize, ServiceError> {
    let packs = pack::Entity::find()
        .filter(references_product(product_id))
        .all(conn)
        .await?;

    let count = packs.len();
    for existing in packs {
        let products = load_components(conn, existing.product_ids()).await?;
        let price = compute_pack_price(
            price_components(&products),
            Some(existing.discount_percentage),
        )?;
        let pack_id = existing.id;
        let mut active: pack::ActiveModel = existing.into();
        active.price = Set(price);
        active.updated_at = Set(Utc::now());
        active.update(conn).await?;
        info!(pack_id = %pack_id, %price, "pack price recomputed");
    }
    Ok(count)
}

pub(crate) fn references_product(product_id: Uuid) -> Condition {
    Condition::any()
        .add(pack::Column::ProductSamId.eq(product_id))
        .add(pack::Column::ProductCacId.eq(product_id))
        .add(pack::Column::ProductSalonId.eq(product_id))
}

/// Rejects moving `product_id` into `category_slug` while a pack holds it in
/// a slot reserved for another category.
pub(crate) async fn ensure_pack_slots_allow<C: ConnectionTrait>(
    conn: &C,
    product_id: Uuid,
    category_slug: &str,
) -> Result<(), ServiceError> {
    let packs = pack::Entity::find()
        .filter(references_product(product_id))
        .all(conn)
        .await?;

    for existing in packs {
        for ((label, expected), slot) in PACK_ROLES.iter().zip(existing.product_ids()) {
            if slot == product_id && category_slug != *expected {
                return Err(ServiceError::Conflict(format!(
                    "Product {} of pack \"{}\" must stay in category \"{}\"",
                    label, existing.slug, expected
                )));
            }
        }
    }
    Ok(())
}

/// Number of packs with at least one component in `category_id`.
pub(crate) async fn count_packs_using_category<C: ConnectionTrait>(
    conn: &C,
    category_id: Uuid,
) -> Result<u64, ServiceError> {
    let product_ids: Vec<Uuid> = product::Entity::find()
        .filter(product::Column::CategoryId.eq(category_id))
        .all(conn)
        .await?
        .into_iter()
        .map(|p| p.id)
        .collect();
    if product_ids.is_empty() {
        return Ok(0);
    }

    Ok(pack::Entity::find()
        .filter(
            Condition::any()
                .add(pack::Column::ProductSamId.is_in(product_ids.clone()))
                .add(pack::Column::ProductCacId.is_in(product_ids.clone()))
                .add(pack::Column::ProductSalonId.is_in(product_ids)),
        )
        .count(conn)
        .await?)
}

/// Pack catalog and administration
#[derive(Clone)]
pub struct PackService {
    db: Arc<DatabaseConnection>,
}

impl PackService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    async fn with_products(&self, packs: Vec<pack::Model>) -> Result<Vec<PackView>, ServiceError> {
        let ids: Vec<Uuid> = packs.iter().flat_map(|p| p.product_ids()).collect();
        let products: HashMap<Uuid, product::Model> = if ids.is_empty() {
            HashMap::new()
        } else {
            product::Entity::find()
                .filter(product::Column::Id.is_in(ids))
                .all(&*self.db)
                .await?
                .into_iter()
                .map(|p| (p.id, p))
                .collect()
        };

        Ok(packs
            .into_iter()
            .map(|pack| PackView {
                product_sam: products.get(&pack.product_sam_id).cloned(),
                product_cac: products.get(&pack.product_cac_id).cloned(),
                product_salon: products.get(&pack.product_salon_id).cloned(),
                pack,
            })
            .collect())
    }

    async fn page(
        &self,
        filter: Condition,
        page: Option<u64>,
        limit: Option<u64>,
    ) -> Result<PackPage, ServiceError> {
        let (page, limit) = page_window(page, limit);
        let paginator = pack::Entity::find()
            .filter(filter)
            .order_by_desc(pack::Column::CreatedAt)
            .paginate(&*self.db, limit);

        let total = paginator.num_items().await?;
        let packs = paginator.fetch_page(page - 1).await?;

        Ok(PackPage {
            data: self.with_products(packs).await?,
            total,
            page,
            last_page: last_page(total, limit),
        })
    }

    /// Visible packs only, newest first.
    #[instrument(skip(self))]
    pub async fn list_public(
        &self,
        page: Option<u64>,
        limit: Option<u64>,
    ) -> Result<PackPage, ServiceError> {
        self.page(
            Condition::all().add(pack::Column::ShowInMenu.eq(true)),
            page,
            limit,
        )
        .await
    }

    /// Every pack, optionally filtered by name or slug.
    #[instrument(skip(self))]
    pub async fn list_admin(
        &self,
        page: Option<u64>,
        limit: Option<u64>,
        search: Option<String>,
    ) -> Result<PackPage, ServiceError> {
        let mut filter = Condition::all();
        if let Some(term) = search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            let pattern = format!("%{}%", term.to_lowercase());
            filter = filter.add(
                Condition::any()
                    .add(
                        Expr::expr(Func::lower(Expr::col((pack::Entity, pack::Column::Name))))
                            .like(pattern.clone()),
                    )
                    .add(
                        Expr::expr(Func::lower(Expr::col((pack::Entity, pack::Column::Slug))))
                            .like(pattern),
                    ),
            );
        }
        self.page(filter, page, limit).await
    }

    #[instrument(skip(self))]
    pub async fn get_by_slug(&self, slug: &str) -> Result<PackView, ServiceError> {
        let pack = pack::Entity::find()
            .filter(pack::Column::Slug.eq(slug))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Pack '{}' not found", slug)))?;

        self.with_products(vec![pack])
            .await?
            .pop()
            .ok_or_else(|| ServiceError::NotFound(format!("Pack '{}' not found", slug)))
    }

    async fn slug_taken<C: ConnectionTrait>(
        conn: &C,
        slug: &str,
        except: Option<Uuid>,
    ) -> Result<bool, ServiceError> {
        let mut query = pack::Entity::find().filter(pack::Column::Slug.eq(slug));
        if let Some(id) = except {
            query = query.filter(pack::Column::Id.ne(id));
        }
        Ok(query.one(conn).await?.is_some())
    }

    /// Validates the three components, prices the bundle and stores it.
    #[instrument(skip(self, request), fields(slug = %request.slug))]
    pub async fn create(&self, request: CreatePackRequest) -> Result<PackView, ServiceError> {
        request.validate()?;
        let discount =
            validate_discount(request.discount_percentage.unwrap_or(DEFAULT_PACK_DISCOUNT))?;

        let txn = self.db.begin().await?;

        if Self::slug_taken(&txn, &request.slug, None).await? {
            return Err(ServiceError::Conflict(
                "Pack with this slug already exists".to_string(),
            ));
        }

        let products = load_components(
            &txn,
            [
                request.product_sam_id,
                request.product_cac_id,
                request.product_salon_id,
            ],
        )
        .await?;
        validate_component_roles(&txn, &products).await?;
        let price = compute_pack_price(price_components(&products), Some(discount))?;

        let now = Utc::now();
        let pack = pack::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(request.name),
            slug: Set(request.slug),
            description: Set(request.description),
            main_image: Set(request.main_image),
            price: Set(price),
            discount_percentage: Set(discount),
            show_in_menu: Set(request.show_in_menu.unwrap_or(true)),
            product_sam_id: Set(request.product_sam_id),
            product_cac_id: Set(request.product_cac_id),
            product_salon_id: Set(request.product_salon_id),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(|e| ServiceError::conflict_on_unique(e, "Pack with this slug already exists"))?;

        txn.commit().await?;

        info!(pack_id = %pack.id, %price, discount, "pack created");
        let [sam, cac, salon] = products;
        Ok(PackView {
            pack,
            product_sam: Some(sam),
            product_cac: Some(cac),
            product_salon: Some(salon),
        })
    }

    /// Applies a partial update and always recomputes the price.
    #[instrument(skip(self, request))]
    pub async fn update(
        &self,
        id: Uuid,
        request: UpdatePackRequest,
    ) -> Result<PackView, ServiceError> {
        request.validate()?;

        let txn = self.db.begin().await?;

        let existing = pack::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Pack not found".to_string()))?;

        if let Some(slug) = request.slug.as_deref() {
            if slug != existing.slug && Self::slug_taken(&txn, slug, Some(id)).await? {
                return Err(ServiceError::Conflict(
                    "Pack with this slug already exists".to_string(),
                ));
            }
        }

        let ids = [
            request.product_sam_id.unwrap_or(existing.product_sam_id),
            request.product_cac_id.unwrap_or(existing.product_cac_id),
            request.product_salon_id.unwrap_or(existing.product_salon_id),
        ];
        let products = load_components(&txn, ids).await?;
        if ids != existing.product_ids() {
            validate_component_roles(&txn, &products).await?;
        }

        let discount =
            validate_discount(request.discount_percentage.unwrap_or(existing.discount_percentage))?;
        let price = compute_pack_price(price_components(&products), Some(discount))?;

        let mut active: pack::ActiveModel = existing.into();
        if let Some(name) = request.name {
            active.name = Set(name);
        }
        if let Some(slug) = request.slug {
            active.slug = Set(slug);
        }
        if let Some(description) = request.description {
            active.description = Set(Some(description));
        }
        if let Some(main_image) = request.main_image {
            active.main_image = Set(Some(main_image));
        }
        if let Some(show_in_menu) = request.show_in_menu {
            active.show_in_menu = Set(show_in_menu);
        }
        active.product_sam_id = Set(ids[0]);
        active.product_cac_id = Set(ids[1]);
        active.product_salon_id = Set(ids[2]);
        active.discount_percentage = Set(discount);
        active.price = Set(price);
        active.updated_at = Set(Utc::now());

        let pack = active
            .update(&txn)
            .await
            .map_err(|e| ServiceError::conflict_on_unique(e, "Pack with this slug already exists"))?;

        txn.commit().await?;

        info!(pack_id = %pack.id, %price, discount, "pack updated");
        let [sam, cac, salon] = products;
        Ok(PackView {
            pack,
            product_sam: Some(sam),
            product_cac: Some(cac),
            product_salon: Some(salon),
        })
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        let pack = pack::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Pack not found".to_string()))?;

        pack.delete(&*self.db).await?;
        info!(pack_id = %id, "pack deleted");
        Ok(())
    }
}
