use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::pricing::Priced;

/// A bundle of one product from each of the `sam`, `cac` and `salon` categories.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "packs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    #[sea_orm(unique)]
    pub slug: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub main_image: Option<String>,
    /// Derived from the three products and the discount at last write
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub price: Decimal,
    pub discount_percentage: i32,
    pub show_in_menu: bool,
    pub product_sam_id: Uuid,
    pub product_cac_id: Uuid,
    pub product_salon_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductSamId",
        to = "super::product::Column::Id"
    )]
    ProductSam,
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductCacId",
        to = "super::product::Column::Id"
    )]
    ProductCac,
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductSalonId",
        to = "super::product::Column::Id"
    )]
    ProductSalon,
}

impl ActiveModelBehavior for ActiveModel {}

impl Priced for Model {
    fn effective_unit_price(&self) -> Decimal {
        self.price
    }
}

impl Model {
    pub fn product_ids(&self) -> [Uuid; 3] {
        [self.product_sam_id, self.product_cac_id, self.product_salon_id]
    }
}
