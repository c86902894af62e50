//! Demo data seeding command.
//!
//! Inserts a demo shopper, a demo administrator, and a handful of products.
//! Idempotent: existing rows (matched by email / name) are left alone.

use secrecy::ExposeSecret;
use sqlx::PgPool;

use super::{CommandError, database_url};

const DEMO_PRODUCTS: &[(&str, &str, &str, i32)] = &[
    (
        "Sea Grape Tote",
        "Canvas tote with rope handles.",
        "24.00",
        25,
    ),
    (
        "Tide Jar",
        "Hand-blown glass storage jar.",
        "18.50",
        12,
    ),
    (
        "Kelp Crisps",
        "Salted kelp snacks, 6-pack.",
        "9.99",
        60,
    ),
    (
        "Driftwood Hook Set",
        "Four wall hooks on reclaimed driftwood.",
        "32.00",
        8,
    ),
];

/// Seed the database with demo users and products.
///
/// # Errors
///
/// Returns [`CommandError`] if the connection or an insert fails.
pub async fn run() -> Result<(), CommandError> {
    dotenvy::dotenv().ok();

    let database_url = database_url()?;
    let pool = PgPool::connect(database_url.expose_secret()).await?;

    sqlx::query(
        r"
        INSERT INTO users (email, api_token, is_admin)
        VALUES
            ('shopper@example.com', 'dev-token-shopper', FALSE),
            ('admin@example.com', 'dev-token-admin', TRUE)
        ON CONFLICT (email) DO NOTHING
        ",
    )
    .execute(&pool)
    .await?;

    for (name, description, price, stock) in DEMO_PRODUCTS {
        sqlx::query(
            r"
            INSERT INTO products (name, description, price, stock_quantity)
            SELECT $1, $2, $3::numeric, $4
            WHERE NOT EXISTS (SELECT 1 FROM products WHERE name = $1)
            ",
        )
        .bind(name)
        .bind(description)
        .bind(price)
        .bind(stock)
        .execute(&pool)
        .await?;
    }

    tracing::info!("Seed data inserted");
    Ok(())
}
