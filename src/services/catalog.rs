use crate::{
    entities::{category, pack, product},
    errors::ServiceError,
    services::packs::{
        count_packs_using_category, ensure_pack_slots_allow, references_product,
        reprice_packs_for_product,
    },
    validation::{validate_non_negative_decimal, validate_slug},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::{Expr, Func},
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    ModelTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

/// Distinguishes an absent field from an explicit `null`.
fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

fn lower_like(column: impl sea_orm::sea_query::IntoColumnRef, term: &str) -> sea_orm::sea_query::SimpleExpr {
    Expr::expr(Func::lower(Expr::col(column))).like(format!("%{}%", term.to_lowercase()))
}

fn search_term(search: Option<&str>) -> Option<&str> {
    search.map(str::trim).filter(|t| !t.is_empty())
}

// Categories

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCategoryRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(custom = "validate_slug")]
    pub slug: String,
    pub image: Option<String>,
    pub show_in_home_page: Option<bool>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateCategoryRequest {
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    pub name: Option<String>,
    #[validate(custom = "validate_slug")]
    pub slug: Option<String>,
    pub image: Option<String>,
    pub show_in_home_page: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategorySummary {
    #[serde(flatten)]
    pub category: category::Model,
    pub product_count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryDetail {
    #[serde(flatten)]
    pub category: category::Model,
    pub products: Vec<product::Model>,
}

// Products

#[derive(Debug, Default, Deserialize)]
pub struct ProductFilter {
    pub search: Option<String>,
    pub category_id: Option<Uuid>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub visible: Option<bool>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateProductRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(custom = "validate_slug")]
    pub slug: String,
    pub category_id: Uuid,
    pub main_image: Option<String>,
    #[serde(default)]
    pub multi_images: Vec<String>,
    pub price_details: Option<String>,
    pub description: Option<String>,
    pub characteristics: Option<String>,
    #[validate(custom = "validate_non_negative_decimal")]
    pub price: Decimal,
    #[validate(custom = "validate_non_negative_decimal")]
    pub discount_price: Option<Decimal>,
    pub show_in_menu: Option<bool>,
    pub video_link: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateProductRequest {
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    pub name: Option<String>,
    #[validate(custom = "validate_slug")]
    pub slug: Option<String>,
    pub category_id: Option<Uuid>,
    pub main_image: Option<String>,
    pub multi_images: Option<Vec<String>>,
    pub price_details: Option<String>,
    pub description: Option<String>,
    pub characteristics: Option<String>,
    #[validate(custom = "validate_non_negative_decimal")]
    pub price: Option<Decimal>,
    /// Absent leaves it unchanged, `null` clears it.
    #[serde(default, deserialize_with = "deserialize_some")]
    pub discount_price: Option<Option<Decimal>>,
    pub show_in_menu: Option<bool>,
    pub video_link: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductView {
    #[serde(flatten)]
    pub product: product::Model,
    pub category: Option<category::Model>,
}

/// Categories and products
#[derive(Clone)]
pub struct CatalogService {
    db: Arc<DatabaseConnection>,
}

impl CatalogService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    async fn product_counts(&self) -> Result<HashMap<Uuid, u64>, ServiceError> {
        let rows: Vec<(Uuid, i64)> = product::Entity::find()
            .select_only()
            .column(product::Column::CategoryId)
            .column_as(product::Column::Id.count(), "product_count")
            .group_by(product::Column::CategoryId)
            .into_tuple()
            .all(&*self.db)
            .await?;
        Ok(rows
            .into_iter()
            .map(|(id, count)| (id, count.max(0) as u64))
            .collect())
    }

    #[instrument(skip(self))]
    pub async fn list_categories(
        &self,
        search: Option<String>,
    ) -> Result<Vec<CategorySummary>, ServiceError> {
        let mut query = category::Entity::find().order_by_desc(category::Column::CreatedAt);
        if let Some(term) = search_term(search.as_deref()) {
            query = query.filter(lower_like((category::Entity, category::Column::Name), term));
        }
        let categories = query.all(&*self.db).await?;
        let counts = self.product_counts().await?;

        Ok(categories
            .into_iter()
            .map(|category| CategorySummary {
                product_count: counts.get(&category.id).copied().unwrap_or(0),
                category,
            })
            .collect())
    }

    async fn category_detail(&self, category: category::Model) -> Result<CategoryDetail, ServiceError> {
        let products = product::Entity::find()
            .filter(product::Column::CategoryId.eq(category.id))
            .filter(product::Column::ShowInMenu.eq(true))
            .order_by_desc(product::Column::CreatedAt)
            .all(&*self.db)
            .await?;
        Ok(CategoryDetail { category, products })
    }

    #[instrument(skip(self))]
    pub async fn get_category(&self, id: Uuid) -> Result<CategoryDetail, ServiceError> {
        let category = category::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Category not found".to_string()))?;
        self.category_detail(category).await
    }

    #[instrument(skip(self))]
    pub async fn get_category_by_slug(&self, slug: &str) -> Result<CategoryDetail, ServiceError> {
        let category = category::Entity::find()
            .filter(category::Column::Slug.eq(slug))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Category '{}' not found", slug)))?;
        self.category_detail(category).await
    }

    async fn category_slug_taken(&self, slug: &str, except: Option<Uuid>) -> Result<bool, ServiceError> {
        let mut query = category::Entity::find().filter(category::Column::Slug.eq(slug));
        if let Some(id) = except {
            query = query.filter(category::Column::Id.ne(id));
        }
        Ok(query.one(&*self.db).await?.is_some())
    }

    #[instrument(skip(self, request), fields(slug = %request.slug))]
    pub async fn create_category(
        &self,
        request: CreateCategoryRequest,
    ) -> Result<category::Model, ServiceError> {
        request.validate()?;

        if self.category_slug_taken(&request.slug, None).await? {
            return Err(ServiceError::Conflict(
                "Category with this slug already exists".to_string(),
            ));
        }

        let now = Utc::now();
        let category = category::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(request.name),
            slug: Set(request.slug),
            image: Set(request.image),
            show_in_home_page: Set(request.show_in_home_page.unwrap_or(false)),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db)
        .await
        .map_err(|e| ServiceError::conflict_on_unique(e, "Category with this slug already exists"))?;

        info!(category_id = %category.id, "category created");
        Ok(category)
    }

    #[instrument(skip(self, request))]
    pub async fn update_category(
        &self,
        id: Uuid,
        request: UpdateCategoryRequest,
    ) -> Result<category::Model, ServiceError> {
        request.validate()?;

        let existing = category::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Category not found".to_string()))?;

        if let Some(slug) = request.slug.as_deref() {
            if slug != existing.slug {
                if self.category_slug_taken(slug, Some(id)).await? {
                    return Err(ServiceError::Conflict(
                        "Category with this slug already exists".to_string(),
                    ));
                }
                let pack_count = count_packs_using_category(&*self.db, id).await?;
                if pack_count > 0 {
                    return Err(ServiceError::Conflict(format!(
                        "Cannot change the slug of a category used by {} pack(s)",
                        pack_count
                    )));
                }
            }
        }

        let mut active: category::ActiveModel = existing.into();
        if let Some(name) = request.name {
            active.name = Set(name);
        }
        if let Some(slug) = request.slug {
            active.slug = Set(slug);
        }
        if let Some(image) = request.image {
            active.image = Set(Some(image));
        }
        if let Some(show) = request.show_in_home_page {
            active.show_in_home_page = Set(show);
        }
        active.updated_at = Set(Utc::now());

        let category = active
            .update(&*self.db)
            .await
            .map_err(|e| ServiceError::conflict_on_unique(e, "Category with this slug already exists"))?;
        info!(category_id = %id, "category updated");
        Ok(category)
    }

    /// Refuses while the category still owns products.
    #[instrument(skip(self))]
    pub async fn delete_category(&self, id: Uuid) -> Result<(), ServiceError> {
        let category = category::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Category not found".to_string()))?;

        let product_count = product::Entity::find()
            .filter(product::Column::CategoryId.eq(id))
            .count(&*self.db)
            .await?;
        if product_count > 0 {
            return Err(ServiceError::Conflict(format!(
                "Cannot delete category with {} product(s)",
                product_count
            )));
        }

        category.delete(&*self.db).await?;
        info!(category_id = %id, "category deleted");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn list_products(&self, filter: ProductFilter) -> Result<Vec<ProductView>, ServiceError> {
        let mut condition = Condition::all();
        if let Some(term) = search_term(filter.search.as_deref()) {
            condition = condition.add(
                Condition::any()
                    .add(lower_like((product::Entity, product::Column::Name), term))
                    .add(lower_like((product::Entity, product::Column::Description), term)),
            );
        }
        if let Some(category_id) = filter.category_id {
            condition = condition.add(product::Column::CategoryId.eq(category_id));
        }
        if let Some(min) = filter.min_price {
            condition = condition.add(product::Column::Price.gte(min));
        }
        if let Some(max) = filter.max_price {
            condition = condition.add(product::Column::Price.lte(max));
        }
        if let Some(visible) = filter.visible {
            condition = condition.add(product::Column::ShowInMenu.eq(visible));
        }

        let rows = product::Entity::find()
            .filter(condition)
            .order_by_desc(product::Column::CreatedAt)
            .find_also_related(category::Entity)
            .all(&*self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(product, category)| ProductView { product, category })
            .collect())
    }

    async fn product_view(&self, product: product::Model) -> Result<ProductView, ServiceError> {
        let category = product.find_related(category::Entity).one(&*self.db).await?;
        Ok(ProductView { product, category })
    }

    #[instrument(skip(self))]
    pub async fn get_product(&self, id: Uuid) -> Result<ProductView, ServiceError> {
        let product = product::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Product not found".to_string()))?;
        self.product_view(product).await
    }

    #[instrument(skip(self))]
    pub async fn get_product_by_slug(&self, slug: &str) -> Result<ProductView, ServiceError> {
        let product = product::Entity::find()
            .filter(product::Column::Slug.eq(slug))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product '{}' not found", slug)))?;
        self.product_view(product).await
    }

    async fn ensure_category<C: ConnectionTrait>(conn: &C, id: Uuid) -> Result<category::Model, ServiceError> {
        category::Entity::find_by_id(id)
            .one(conn)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Category not found".to_string()))
    }

    async fn product_slug_taken<C: ConnectionTrait>(
        conn: &C,
        slug: &str,
        except: Option<Uuid>,
    ) -> Result<bool, ServiceError> {
        let mut query = product::Entity::find().filter(product::Column::Slug.eq(slug));
        if let Some(id) = except {
            query = query.filter(product::Column::Id.ne(id));
        }
        Ok(query.one(conn).await?.is_some())
    }

    #[instrument(skip(self, request), fields(slug = %request.slug))]
    pub async fn create_product(&self, request: CreateProductRequest) -> Result<ProductView, ServiceError> {
        request.validate()?;

        if Self::product_slug_taken(&*self.db, &request.slug, None).await? {
            return Err(ServiceError::Conflict(
                "Product with this slug already exists".to_string(),
            ));
        }
        let category = Self::ensure_category(&*self.db, request.category_id).await?;

        let now = Utc::now();
        let product = product::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(request.name),
            slug: Set(request.slug),
            main_image: Set(request.main_image),
            multi_images: Set(serde_json::json!(request.multi_images)),
            price_details: Set(request.price_details),
            description: Set(request.description),
            characteristics: Set(request.characteristics),
            price: Set(request.price),
            discount_price: Set(request.discount_price),
            show_in_menu: Set(request.show_in_menu.unwrap_or(true)),
            video_link: Set(request.video_link),
            category_id: Set(request.category_id),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db)
        .await
        .map_err(|e| ServiceError::conflict_on_unique(e, "Product with this slug already exists"))?;

        info!(product_id = %product.id, price = %product.price, "product created");
        Ok(ProductView {
            product,
            category: Some(category),
        })
    }

    /// Partial update. A price change reprices every pack containing the
    /// product in the same transaction; placed orders keep their snapshot.
    #[instrument(skip(self, request))]
    pub async fn update_product(
        &self,
        id: Uuid,
        request: UpdateProductRequest,
    ) -> Result<ProductView, ServiceError> {
        request.validate()?;
        if let Some(Some(discount)) = request.discount_price.as_ref() {
            validate_non_negative_decimal(discount).map_err(|e| {
                ServiceError::ValidationError(format!(
                    "discount_price: {}",
                    e.message.unwrap_or_default()
                ))
            })?;
        }

        let txn = self.db.begin().await?;

        let existing = product::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Product not found".to_string()))?;

        if let Some(slug) = request.slug.as_deref() {
            if slug != existing.slug && Self::product_slug_taken(&txn, slug, Some(id)).await? {
                return Err(ServiceError::Conflict(
                    "Product with this slug already exists".to_string(),
                ));
            }
        }
        let category_id = request.category_id.unwrap_or(existing.category_id);
        let category = Self::ensure_category(&txn, category_id).await?;
        if category_id != existing.category_id {
            ensure_pack_slots_allow(&txn, id, &category.slug).await?;
        }

        let price_changed = request.price.is_some_and(|p| p != existing.price)
            || request
                .discount_price
                .is_some_and(|d| d != existing.discount_price);

        let mut active: product::ActiveModel = existing.into();
        if let Some(name) = request.name {
            active.name = Set(name);
        }
        if let Some(slug) = request.slug {
            active.slug = Set(slug);
        }
        active.category_id = Set(category_id);
        if let Some(main_image) = request.main_image {
            active.main_image = Set(Some(main_image));
        }
        if let Some(images) = request.multi_images {
            active.multi_images = Set(serde_json::json!(images));
        }
        if let Some(price_details) = request.price_details {
            active.price_details = Set(Some(price_details));
        }
        if let Some(description) = request.description {
            active.description = Set(Some(description));
        }
        if let Some(characteristics) = request.characteristics {
            active.characteristics = Set(Some(characteristics));
        }
        if let Some(price) = request.price {
            active.price = Set(price);
        }
        if let Some(discount_price) = request.discount_price {
            active.discount_price = Set(discount_price);
        }
        if let Some(show_in_menu) = request.show_in_menu {
            active.show_in_menu = Set(show_in_menu);
        }
        if let Some(video_link) = request.video_link {
            active.video_link = Set(Some(video_link));
        }
        active.updated_at = Set(Utc::now());

        let product = active
            .update(&txn)
            .await
            .map_err(|e| ServiceError::conflict_on_unique(e, "Product with this slug already exists"))?;

        if price_changed {
            let repriced = reprice_packs_for_product(&txn, id).await?;
            if repriced > 0 {
                info!(product_id = %id, repriced, "packs repriced after product price change");
            }
        }

        txn.commit().await?;

        info!(product_id = %id, "product updated");
        Ok(ProductView {
            product,
            category: Some(category),
        })
    }

    /// Refuses while any pack references the product.
    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: Uuid) -> Result<(), ServiceError> {
        let product = product::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Product not found".to_string()))?;

        let pack_count = pack::Entity::find()
            .filter(references_product(id))
            .count(&*self.db)
            .await?;
        if pack_count > 0 {
            return Err(ServiceError::Conflict(format!(
                "Product is part of {} pack(s)",
                pack_count
            )));
        }

        product.delete(&*self.db).await?;
        info!(product_id = %id, "product deleted");
        Ok(())
    }
}
