pub use sea_orm_migration::prelude::*;

mod m20250101_000001_create_users_table;
mod m20250101_000002_create_catalog_tables;
mod m20250101_000003_create_packs_table;
mod m20250101_000004_create_cart_tables;
mod m20250101_000005_create_order_tables;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_000001_create_users_table::Migration),
            Box::new(m20250101_000002_create_catalog_tables::Migration),
            Box::new(m20250101_000003_create_packs_table::Migration),
            Box::new(m20250101_000004_create_cart_tables::Migration),
            Box::new(m20250101_000005_create_order_tables::Migration),
        ]
    }
}
