// Not every test binary uses every helper.
#![allow(dead_code)]

use axum_storefront_api::{
    config::AppConfig, db::create_pool, middleware::auth::AuthUser, state::AppState,
};
use rust_decimal::Decimal;
use uuid::Uuid;

/// Connect to the test database, or `None` to skip when no DB is configured
/// in the environment.
pub async fn setup_state() -> anyhow::Result<Option<AppState>> {
    let database_url =
        match std::env::var("TEST_DATABASE_URL").or_else(|_| std::env::var("DATABASE_URL")) {
            Ok(url) => url,
            Err(_) => {
                eprintln!(
                    "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
                );
                return Ok(None);
            }
        };

    let pool = create_pool(&database_url).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let config = AppConfig {
        database_url,
        host: "127.0.0.1".to_string(),
        port: 0,
        jwt_secret: "integration-test-secret".to_string(),
        cdn_upload_url: None,
        cdn_api_key: None,
    };

    Ok(Some(AppState::new(pool, config)))
}

/// Every test builds its own users and catalog rows with unique identities,
/// so suites can run concurrently against one database.
pub async fn create_user(state: &AppState, role: &str) -> anyhow::Result<AuthUser> {
    let id = Uuid::new_v4();
    let email = format!("user-{}@example.com", id.simple());
    sqlx::query(
        "INSERT INTO users (id, name, email, password_hash, role) VALUES ($1, $2, $3, 'x', $4)",
    )
    .bind(id)
    .bind("Test User")
    .bind(email.as_str())
    .bind(role)
    .execute(&state.pool)
    .await?;

    Ok(AuthUser {
        user_id: id,
        name: "Test User".to_string(),
        email,
        role: role.to_string(),
        is_email_verified: false,
        token: String::new(),
    })
}

/// Category, product and one variant priced at `price`; returns the variant id.
pub async fn create_variant(state: &AppState, price: Decimal) -> anyhow::Result<Uuid> {
    let tag = Uuid::new_v4().simple().to_string();

    let category_id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO categories (id, name, description, depth, path) VALUES ($1, $2, '', 0, '{}')",
    )
    .bind(category_id)
    .bind(format!("cat-{tag}"))
    .execute(&state.pool)
    .await?;

    let product_id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO products (id, name, description, sku, price, category_id)
        VALUES ($1, $2, '', $3, $4, $5)
        "#,
    )
    .bind(product_id)
    .bind(format!("product-{tag}"))
    .bind(format!("SKU-{tag}"))
    .bind(price)
    .bind(category_id)
    .execute(&state.pool)
    .await?;

    let variant_id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO product_variants (id, product_id, color, sku, price)
        VALUES ($1, $2, 'Black', $3, $4)
        "#,
    )
    .bind(variant_id)
    .bind(product_id)
    .bind(format!("SKU-{tag}-BLK"))
    .bind(price)
    .execute(&state.pool)
    .await?;

    Ok(variant_id)
}
