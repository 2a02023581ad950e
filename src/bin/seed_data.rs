//! Seed data script - bootstraps an administrator and the pack categories
//!
//! Run with: cargo run --bin seed-data -- --email admin@example.com --password secret123
//!
//! This creates (or leaves untouched when already present):
//! - the administrator account, promoting it to ADMIN if it already exists
//! - the `sam`, `cac` and `salon` categories packs are built from

use chrono::Utc;
use clap::Parser;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use tracing::info;
use uuid::Uuid;

use lartistou_api::{
    auth::password::hash_password,
    config, db,
    entities::{
        category,
        user::{self, UserRole},
    },
    services::accounts::normalize_email,
};

const PACK_CATEGORIES: [(&str, &str); 3] = [
    ("sam", "Salle à manger"),
    ("cac", "Chambre à coucher"),
    ("salon", "Salon"),
];

#[derive(Parser)]
#[command(name = "seed-data", about = "Bootstrap the L'Artistou database", version)]
struct Cli {
    #[arg(long, help = "Email address for the administrator account")]
    email: String,
    #[arg(long, help = "Password for the administrator account")]
    password: String,
    #[arg(long, default_value = "Admin", help = "Administrator first name")]
    first_name: String,
    #[arg(long, default_value = "L'Artistou", help = "Administrator last name")]
    last_name: String,
    #[arg(long, help = "Skip running pending migrations first")]
    skip_migrations: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config()?;
    config::init_tracing(cfg.log_level(), cfg.log_json);

    info!("=== L'Artistou Seed Data ===");
    let db = db::establish_connection_from_app_config(&cfg).await?;
    if !cli.skip_migrations {
        db::run_migrations(&db).await?;
    }

    seed_admin(&db, &cli).await?;
    let created = seed_categories(&db).await?;
    info!("  Created {} categories", created);

    info!("=== Seed Data Complete ===");
    Ok(())
}

async fn seed_admin(db: &db::DbPool, cli: &Cli) -> anyhow::Result<()> {
    let email = normalize_email(&cli.email);
    let existing = user::Entity::find()
        .filter(user::Column::Email.eq(email.clone()))
        .one(db)
        .await?;

    match existing {
        Some(found) if found.role == UserRole::Admin => {
            info!("  {} is already an administrator", email);
        }
        Some(found) => {
            let mut active: user::ActiveModel = found.into();
            active.role = Set(UserRole::Admin);
            active.updated_at = Set(Utc::now());
            active.update(db).await?;
            info!("  Promoted {} to ADMIN", email);
        }
        None => {
            let now = Utc::now();
            user::ActiveModel {
                id: Set(Uuid::new_v4()),
                email: Set(email.clone()),
                password_hash: Set(hash_password(&cli.password)?),
                first_name: Set(cli.first_name.clone()),
                last_name: Set(cli.last_name.clone()),
                phone: Set(None),
                role: Set(UserRole::Admin),
                current_session_token: Set(None),
                reset_password_token: Set(None),
                reset_password_expires: Set(None),
                created_at: Set(now),
                updated_at: Set(now),
            }
            .insert(db)
            .await?;
            info!("  Created administrator {}", email);
        }
    }
    Ok(())
}

async fn seed_categories(db: &db::DbPool) -> anyhow::Result<usize> {
    let mut created = 0;
    for (slug, name) in PACK_CATEGORIES {
        let exists = category::Entity::find()
            .filter(category::Column::Slug.eq(slug))
            .one(db)
            .await?
            .is_some();
        if exists {
            continue;
        }
        let now = Utc::now();
        category::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            slug: Set(slug.to_string()),
            image: Set(None),
            show_in_home_page: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await?;
        created += 1;
    }
    Ok(created)
}
