use std::collections::HashMap;

use chrono::{DateTime, Datelike, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use sqlx::FromRow;
use uuid::Uuid;

use crate::{
    dto::products::{
        AddProductImageRequest, CreateProductRequest, CreateVariantRequest, DeleteResponse,
        ListProductsParams, ProductList, UpdateProductRequest, UpdateVariantRequest, VariantList,
    },
    error::{AppError, AppResult},
    models::{Product, ProductImage, ProductVariant},
    response::ApiResponse,
    state::AppState,
};

/// `XXX-<year>-<4 digits>`: three letters from the cleaned name, padded with X.
fn generate_sku(name: &str) -> String {
    let mut prefix: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_uppercase())
        .take(3)
        .collect();
    while prefix.len() < 3 {
        prefix.push('X');
    }
    let year = Utc::now().year();
    let number: u32 = rand::rng().random_range(1000..10000);
    format!("{prefix}-{year}-{number:04}")
}

pub async fn create_product(
    state: &AppState,
    payload: CreateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    if payload.name.is_empty() {
        return Err(AppError::Validation("name is required".to_string()));
    }

    let category: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM categories WHERE id = $1")
        .bind(payload.category_id)
        .fetch_optional(&state.pool)
        .await?;
    if category.is_none() {
        return Err(AppError::NotFound("category"));
    }

    let sku = payload.sku.unwrap_or_else(|| generate_sku(&payload.name));

    let product: Product = sqlx::query_as(
        r#"
        INSERT INTO products (id, name, sub_title, description, sku, price, category_id)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(payload.name.as_str())
    .bind(payload.sub_title.as_deref())
    .bind(payload.description.as_str())
    .bind(sku)
    .bind(payload.price)
    .bind(payload.category_id)
    .fetch_one(&state.pool)
    .await?;

    Ok(ApiResponse::success("Product created", product, None))
}

pub async fn get_product(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Product>> {
    let product: Option<Product> = sqlx::query_as("SELECT * FROM products WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?;
    let mut product = product.ok_or(AppError::NotFound("product"))?;

    let variants: Vec<ProductVariant> =
        sqlx::query_as("SELECT * FROM product_variants WHERE product_id = $1")
            .bind(id)
            .fetch_all(&state.pool)
            .await?;

    product.variants = enrich_variants(state, variants).await?;

    Ok(ApiResponse::success("Get product success", product, None))
}

/// Attach images and per-size inventory to a set of variants in two queries.
async fn enrich_variants(
    state: &AppState,
    variants: Vec<ProductVariant>,
) -> AppResult<Vec<ProductVariant>> {
    if variants.is_empty() {
        return Ok(variants);
    }

    let variant_ids: Vec<Uuid> = variants.iter().map(|v| v.id).collect();
    let mut by_id: HashMap<Uuid, ProductVariant> =
        variants.into_iter().map(|v| (v.id, v)).collect();

    let images: Vec<ProductImage> =
        sqlx::query_as("SELECT * FROM product_images WHERE variant_id = ANY($1)")
            .bind(&variant_ids)
            .fetch_all(&state.pool)
            .await?;
    for image in images {
        if let Some(variant) = by_id.get_mut(&image.variant_id) {
            variant.images.push(image);
        }
    }

    let inventory: Vec<crate::models::Inventory> =
        sqlx::query_as("SELECT * FROM inventory WHERE variant_id = ANY($1) ORDER BY size")
            .bind(&variant_ids)
            .fetch_all(&state.pool)
            .await?;
    for row in inventory {
        if let Some(variant) = by_id.get_mut(&row.variant_id) {
            variant.inventory.push(row);
        }
    }

    let mut enriched: Vec<ProductVariant> = by_id.into_values().collect();
    enriched.sort_by_key(|v| v.created_at);
    Ok(enriched)
}

#[derive(FromRow)]
struct ProductListRow {
    id: Uuid,
    name: String,
    sub_title: Option<String>,
    description: String,
    sku: String,
    price: Decimal,
    category_id: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    variants: serde_json::Value,
}

/// Offset paging behind an opaque token: the token is the page index, the
/// offset is `page_size * token`.
pub async fn list_products(
    state: &AppState,
    params: ListProductsParams,
) -> AppResult<ApiResponse<ProductList>> {
    let page_size = params.page_size.unwrap_or(10).clamp(1, 100);
    let page_token = params.page_token.as_deref().unwrap_or("0");
    let page: i64 = page_token
        .parse()
        .map_err(|_| AppError::Validation("invalid page token".to_string()))?;

    let rows: Vec<ProductListRow> = sqlx::query_as(
        r#"
        SELECT p.id, p.name, p.sub_title, p.description, p.sku, p.price,
               p.category_id, p.created_at, p.updated_at,
               (
                   SELECT COALESCE(JSON_AGG(
                       json_build_object(
                           'id', v.id,
                           'product_id', v.product_id,
                           'color', v.color,
                           'sku', v.sku,
                           'price', v.price,
                           'images', (
                               SELECT COALESCE(JSON_AGG(
                                   json_build_object(
                                       'id', i.id,
                                       'variant_id', i.variant_id,
                                       'url', i.url,
                                       'is_main', i.is_main
                                   )
                               ), '[]'::json)
                               FROM product_images i
                               WHERE i.variant_id = v.id
                           )
                       )
                   ), '[]'::json)
                   FROM product_variants v
                   WHERE v.product_id = p.id
               ) AS variants
        FROM products p
        ORDER BY p.created_at DESC
        LIMIT $1 OFFSET ($1 * $2)
        "#,
    )
    .bind(page_size)
    .bind(page)
    .fetch_all(&state.pool)
    .await?;

    let mut products = Vec::with_capacity(rows.len());
    for row in rows {
        let variants: Vec<ProductVariant> = serde_json::from_value(row.variants)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("failed to parse variants: {e}")))?;
        products.push(Product {
            id: row.id,
            name: row.name,
            sub_title: row.sub_title,
            description: row.description,
            sku: row.sku,
            price: row.price,
            category_id: row.category_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
            variants,
        });
    }

    let next_page_token =
        (products.len() as i64 == page_size).then(|| (page + 1).to_string());

    Ok(ApiResponse::success(
        "Get products successfully",
        ProductList {
            products,
            next_page_token,
        },
        None,
    ))
}

pub async fn update_product(
    state: &AppState,
    id: Uuid,
    payload: UpdateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    let existing: Option<Product> = sqlx::query_as("SELECT * FROM products WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?;
    let existing = existing.ok_or(AppError::NotFound("product"))?;

    let name = payload.name.unwrap_or(existing.name);
    let sub_title = payload.sub_title.or(existing.sub_title);
    let description = payload.description.unwrap_or(existing.description);
    let price = payload.price.unwrap_or(existing.price);
    let category_id = payload.category_id.unwrap_or(existing.category_id);
    let sku = payload.sku.unwrap_or(existing.sku);

    let product: Product = sqlx::query_as(
        r#"
        UPDATE products
        SET name = $2, sub_title = $3, description = $4, sku = $5,
            price = $6, category_id = $7, updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(name)
    .bind(sub_title)
    .bind(description)
    .bind(sku)
    .bind(price)
    .bind(category_id)
    .fetch_one(&state.pool)
    .await?;

    Ok(ApiResponse::success("Product updated", product, None))
}

pub async fn delete_product(
    state: &AppState,
    id: Uuid,
) -> AppResult<ApiResponse<DeleteResponse>> {
    let result = sqlx::query("DELETE FROM products WHERE id = $1")
        .bind(id)
        .execute(&state.pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("product"));
    }

    Ok(ApiResponse::success(
        "Product deleted",
        DeleteResponse { success: true },
        None,
    ))
}

pub async fn create_variant(
    state: &AppState,
    product_id: Uuid,
    payload: CreateVariantRequest,
) -> AppResult<ApiResponse<ProductVariant>> {
    let product: Option<Product> = sqlx::query_as("SELECT * FROM products WHERE id = $1")
        .bind(product_id)
        .fetch_optional(&state.pool)
        .await?;
    let product = product.ok_or(AppError::NotFound("product"))?;

    let sku = payload.sku.unwrap_or_else(|| generate_sku(&product.name));
    let price = payload.price.unwrap_or(product.price);

    let variant: ProductVariant = sqlx::query_as(
        r#"
        INSERT INTO product_variants (id, product_id, color, sku, price)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(product_id)
    .bind(payload.color.as_str())
    .bind(sku)
    .bind(price)
    .fetch_one(&state.pool)
    .await?;

    Ok(ApiResponse::success("Variant created", variant, None))
}

pub async fn update_variant(
    state: &AppState,
    variant_id: Uuid,
    payload: UpdateVariantRequest,
) -> AppResult<ApiResponse<ProductVariant>> {
    let existing: Option<ProductVariant> =
        sqlx::query_as("SELECT * FROM product_variants WHERE id = $1")
            .bind(variant_id)
            .fetch_optional(&state.pool)
            .await?;
    let existing = existing.ok_or(AppError::NotFound("product variant"))?;

    let color = payload.color.unwrap_or(existing.color);
    let sku = payload.sku.unwrap_or(existing.sku);
    let price = payload.price.unwrap_or(existing.price);

    let variant: ProductVariant = sqlx::query_as(
        r#"
        UPDATE product_variants
        SET color = $2, sku = $3, price = $4
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(variant_id)
    .bind(color)
    .bind(sku)
    .bind(price)
    .fetch_one(&state.pool)
    .await?;

    Ok(ApiResponse::success("Variant updated", variant, None))
}

pub async fn get_variant(
    state: &AppState,
    variant_id: Uuid,
) -> AppResult<ApiResponse<ProductVariant>> {
    let variant: Option<ProductVariant> =
        sqlx::query_as("SELECT * FROM product_variants WHERE id = $1")
            .bind(variant_id)
            .fetch_optional(&state.pool)
            .await?;
    let variant = variant.ok_or(AppError::NotFound("product variant"))?;

    let mut enriched = enrich_variants(state, vec![variant]).await?;
    let variant = enriched
        .pop()
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("variant enrichment dropped the row")))?;

    Ok(ApiResponse::success("Get variant success", variant, None))
}

pub async fn list_variants(
    state: &AppState,
    product_id: Uuid,
) -> AppResult<ApiResponse<VariantList>> {
    let variants: Vec<ProductVariant> =
        sqlx::query_as("SELECT * FROM product_variants WHERE product_id = $1")
            .bind(product_id)
            .fetch_all(&state.pool)
            .await?;

    let variants = enrich_variants(state, variants).await?;
    Ok(ApiResponse::success("OK", VariantList { variants }, None))
}

pub async fn delete_variant(
    state: &AppState,
    variant_id: Uuid,
) -> AppResult<ApiResponse<DeleteResponse>> {
    let result = sqlx::query("DELETE FROM product_variants WHERE id = $1")
        .bind(variant_id)
        .execute(&state.pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("product variant"));
    }

    Ok(ApiResponse::success(
        "Variant deleted",
        DeleteResponse { success: true },
        None,
    ))
}

pub async fn add_image(
    state: &AppState,
    payload: AddProductImageRequest,
) -> AppResult<ApiResponse<ProductImage>> {
    // Referential check before the insert.
    let variant: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM product_variants WHERE id = $1")
        .bind(payload.variant_id)
        .fetch_optional(&state.pool)
        .await?;
    if variant.is_none() {
        return Err(AppError::NotFound("product variant"));
    }

    let image: ProductImage = sqlx::query_as(
        r#"
        INSERT INTO product_images (id, variant_id, url, is_main)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(payload.variant_id)
    .bind(payload.url.as_str())
    .bind(payload.is_main)
    .fetch_one(&state.pool)
    .await?;

    Ok(ApiResponse::success("Image added", image, None))
}

pub async fn delete_image(
    state: &AppState,
    image_id: Uuid,
) -> AppResult<ApiResponse<DeleteResponse>> {
    let result = sqlx::query("DELETE FROM product_images WHERE id = $1")
        .bind(image_id)
        .execute(&state.pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("product image"));
    }

    Ok(ApiResponse::success(
        "Image deleted",
        DeleteResponse { success: true },
        None,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sku_has_prefix_year_and_number() {
        let sku = generate_sku("Air Max 90");
        let parts: Vec<&str> = sku.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "AIR");
        assert_eq!(parts[1], Utc::now().year().to_string());
        assert_eq!(parts[2].len(), 4);
    }

    #[test]
    fn sku_pads_short_names() {
        let sku = generate_sku("go");
        assert!(sku.starts_with("GOX-"));
        let sku = generate_sku("");
        assert!(sku.starts_with("XXX-"));
    }
}
