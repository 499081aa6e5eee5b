use argon2::{
    Argon2, PasswordHasher,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum_storefront_api::{config::AppConfig, db::create_pool};
use rust_decimal::Decimal;
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let admin_id = ensure_user(&pool, "Admin", "admin@example.com", "admin123", "admin").await?;
    let user_id = ensure_user(&pool, "User", "user@example.com", "user123", "user").await?;
    seed_catalog(&pool).await?;

    println!("Seed completed. Admin ID: {admin_id}, User ID: {user_id}");
    Ok(())
}

async fn ensure_user(
    pool: &sqlx::PgPool,
    name: &str,
    email: &str,
    password: &str,
    role: &str,
) -> anyhow::Result<Uuid> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .to_string();

    let (user_id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO users (id, name, email, password_hash, role)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (email) DO UPDATE SET role = EXCLUDED.role
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(email)
    .bind(password_hash)
    .bind(role)
    .fetch_one(pool)
    .await?;

    println!("Ensured user {email} (role={role})");
    Ok(user_id)
}

async fn seed_catalog(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let existing: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM categories WHERE name = $1")
        .bind("Shoes")
        .fetch_optional(pool)
        .await?;
    let category_id = match existing {
        Some((id,)) => id,
        None => {
            let (id,): (Uuid,) = sqlx::query_as(
                r#"
                INSERT INTO categories (id, name, description, depth, path)
                VALUES ($1, 'Shoes', 'Footwear of all kinds', 0, '{}')
                RETURNING id
                "#,
            )
            .bind(Uuid::new_v4())
            .fetch_one(pool)
            .await?;
            id
        }
    };

    let products = [
        ("Air Runner", "Lightweight daily trainer", "RUN-2025-0001", 120),
        ("Trail Blazer", "Grippy trail shoe", "TRA-2025-0001", 140),
        ("Court Classic", "Leather court sneaker", "COU-2025-0001", 90),
    ];

    for (name, desc, sku, price) in products {
        let existing: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM products WHERE sku = $1")
            .bind(sku)
            .fetch_optional(pool)
            .await?;
        if existing.is_some() {
            continue;
        }

        let product_id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO products (id, name, description, sku, price, category_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(product_id)
        .bind(name)
        .bind(desc)
        .bind(sku)
        .bind(Decimal::from(price))
        .bind(category_id)
        .execute(pool)
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
        .bind(format!("{sku}-BLK"))
        .bind(Decimal::from(price))
        .execute(pool)
        .await?;

        for size in ["40", "41", "42", "43"] {
            sqlx::query(
                r#"
                INSERT INTO inventory (id, variant_id, size, stock, reserved_stock, available_stock)
                VALUES ($1, $2, $3, 25, 0, 25)
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(variant_id)
            .bind(size)
            .execute(pool)
            .await?;
        }
    }

    println!("Seeded catalog");
    Ok(())
}
