use rust_decimal::Decimal;
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use crate::{
    audit,
    dto::cart::{AddToCartRequest, CartItemCount, UpdateQuantityRequest},
    error::{AppError, AppResult},
    events::Event,
    middleware::auth::AuthUser,
    models::{Cart, CartItem},
    response::ApiResponse,
    state::AppState,
};

/// Unit price is read from the variant at mutation time, never cached on the
/// line item.
async fn variant_price(
    tx: &mut Transaction<'_, Postgres>,
    variant_id: Uuid,
) -> AppResult<Decimal> {
    let row: Option<(Decimal,)> =
        sqlx::query_as("SELECT price FROM product_variants WHERE id = $1")
            .bind(variant_id)
            .fetch_optional(&mut **tx)
            .await?;
    row.map(|(price,)| price)
        .ok_or(AppError::NotFound("product variant"))
}

/// Exactly one cart per user, resolved atomically. The no-op update lets the
/// insert return the surviving row id on conflict.
async fn resolve_cart(tx: &mut Transaction<'_, Postgres>, user_id: Uuid) -> AppResult<Uuid> {
    let (cart_id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO carts (id, user_id, total)
        VALUES ($1, $2, 0)
        ON CONFLICT (user_id) DO UPDATE SET updated_at = NOW()
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .fetch_one(&mut **tx)
    .await?;
    Ok(cart_id)
}

/// Re-derive the denormalized total from the lines. Always a full SUM, never
/// an incremental adjustment.
async fn recompute_total(tx: &mut Transaction<'_, Postgres>, cart_id: Uuid) -> AppResult<Decimal> {
    let (total,): (Decimal,) = sqlx::query_as(
        r#"
        UPDATE carts
        SET total = (
            SELECT COALESCE(SUM(sub_total), 0)
            FROM cart_items
            WHERE cart_id = $1
        ),
        updated_at = NOW()
        WHERE id = $1
        RETURNING total
        "#,
    )
    .bind(cart_id)
    .fetch_one(&mut **tx)
    .await?;
    Ok(total)
}

/// Lock the owning cart row first, then the line. All mutation paths take
/// locks in this order.
async fn lock_cart_then_item(
    tx: &mut Transaction<'_, Postgres>,
    item_id: Uuid,
) -> AppResult<CartItem> {
    let row: Option<(Uuid,)> = sqlx::query_as("SELECT cart_id FROM cart_items WHERE id = $1")
        .bind(item_id)
        .fetch_optional(&mut **tx)
        .await?;
    let (cart_id,) = row.ok_or(AppError::NotFound("cart item"))?;

    sqlx::query("SELECT id FROM carts WHERE id = $1 FOR UPDATE")
        .bind(cart_id)
        .execute(&mut **tx)
        .await?;

    // Re-read under the cart lock; the line may have gone in the meantime.
    let item: Option<CartItem> =
        sqlx::query_as("SELECT * FROM cart_items WHERE id = $1 FOR UPDATE")
            .bind(item_id)
            .fetch_optional(&mut **tx)
            .await?;
    item.ok_or(AppError::NotFound("cart item"))
}

pub async fn add_to_cart(
    state: &AppState,
    user: &AuthUser,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<CartItem>> {
    if payload.quantity <= 0 {
        return Err(AppError::Validation(
            "quantity must be greater than 0".to_string(),
        ));
    }

    let mut tx = state.pool.begin().await?;

    let price = variant_price(&mut tx, payload.variant_id).await?;
    let cart_id = resolve_cart(&mut tx, user.user_id).await?;

    let sub_total = (price * Decimal::from(payload.quantity)).round_dp(2);

    // Atomic upsert on the (cart, variant, size) identity: concurrent adds
    // serialize on the row and fold into one line.
    let item: CartItem = sqlx::query_as(
        r#"
        INSERT INTO cart_items (id, cart_id, variant_id, size, quantity, sub_total)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (cart_id, variant_id, size) DO UPDATE
        SET quantity = cart_items.quantity + EXCLUDED.quantity,
            sub_total = (cart_items.quantity + EXCLUDED.quantity) * $7,
            updated_at = NOW()
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(cart_id)
    .bind(payload.variant_id)
    .bind(payload.size.as_str())
    .bind(payload.quantity)
    .bind(sub_total)
    .bind(price)
    .fetch_one(&mut *tx)
    .await?;

    recompute_total(&mut tx, cart_id).await?;

    tx.commit().await?;

    state.events.publish(&Event::cart_updated(
        user.user_id,
        serde_json::json!({ "item_id": item.id, "quantity": item.quantity }),
    ));

    if let Err(err) = audit::record(
        &state.pool,
        Some(user.user_id),
        "cart_add",
        Some("cart_items"),
        Some(serde_json::json!({ "variant_id": payload.variant_id, "size": payload.size, "quantity": payload.quantity })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success("Added to cart", item, None))
}

pub async fn update_quantity(
    state: &AppState,
    user: &AuthUser,
    item_id: Uuid,
    payload: UpdateQuantityRequest,
) -> AppResult<ApiResponse<CartItem>> {
    if payload.quantity < 0 {
        return Err(AppError::Validation(
            "quantity must not be negative".to_string(),
        ));
    }

    let mut tx = state.pool.begin().await?;

    // Every cart mutation locks the cart row before touching lines, so
    // concurrent adds and updates cannot deadlock on lock order.
    let item = lock_cart_then_item(&mut tx, item_id).await?;

    // Quantity zero removes the line entirely.
    if payload.quantity == 0 {
        sqlx::query("DELETE FROM cart_items WHERE id = $1")
            .bind(item_id)
            .execute(&mut *tx)
            .await?;
        recompute_total(&mut tx, item.cart_id).await?;
        tx.commit().await?;

        state.events.publish(&Event::cart_updated(
            user.user_id,
            serde_json::json!({ "item_id": item_id, "quantity": 0 }),
        ));

        return Ok(ApiResponse::success_empty("Cart item removed"));
    }

    // Price can drift between add and update; always re-read it.
    let price = variant_price(&mut tx, item.variant_id).await?;
    let size = payload.size.unwrap_or(item.size);
    let sub_total = (price * Decimal::from(payload.quantity)).round_dp(2);

    let updated: CartItem = sqlx::query_as(
        r#"
        UPDATE cart_items
        SET quantity = $2, size = $3, sub_total = $4, updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(item_id)
    .bind(payload.quantity)
    .bind(size.as_str())
    .bind(sub_total)
    .fetch_one(&mut *tx)
    .await?;

    recompute_total(&mut tx, updated.cart_id).await?;

    tx.commit().await?;

    state.events.publish(&Event::cart_updated(
        user.user_id,
        serde_json::json!({ "item_id": updated.id, "quantity": updated.quantity }),
    ));

    if let Err(err) = audit::record(
        &state.pool,
        Some(user.user_id),
        "cart_update",
        Some("cart_items"),
        Some(serde_json::json!({ "item_id": item_id, "quantity": payload.quantity })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success("Cart item updated", updated, None))
}

pub async fn remove_item(
    state: &AppState,
    user: &AuthUser,
    item_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let mut tx = state.pool.begin().await?;

    let item = lock_cart_then_item(&mut tx, item_id).await?;

    // The ownership check must precede the delete: a line in another user's
    // cart is untouchable.
    let (owner_id,): (Uuid,) = sqlx::query_as("SELECT user_id FROM carts WHERE id = $1")
        .bind(item.cart_id)
        .fetch_one(&mut *tx)
        .await?;
    if owner_id != user.user_id {
        return Err(AppError::Ownership);
    }

    sqlx::query("DELETE FROM cart_items WHERE id = $1")
        .bind(item_id)
        .execute(&mut *tx)
        .await?;

    recompute_total(&mut tx, item.cart_id).await?;

    tx.commit().await?;

    state.events.publish(&Event::cart_updated(
        user.user_id,
        serde_json::json!({ "item_id": item_id, "removed": true }),
    ));

    if let Err(err) = audit::record(
        &state.pool,
        Some(user.user_id),
        "cart_remove",
        Some("cart_items"),
        Some(serde_json::json!({ "item_id": item_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Removed from cart",
        serde_json::json!({ "success": true }),
        None,
    ))
}

/// Drops the whole aggregate; the items go with the cart row via cascade.
pub async fn clear_cart(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<serde_json::Value>> {
    sqlx::query("DELETE FROM carts WHERE user_id = $1")
        .bind(user.user_id)
        .execute(&state.pool)
        .await?;

    state.events.publish(&Event::cart_updated(
        user.user_id,
        serde_json::json!({ "cleared": true }),
    ));

    if let Err(err) = audit::record(
        &state.pool,
        Some(user.user_id),
        "cart_clear",
        Some("carts"),
        None,
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Cart cleared",
        serde_json::json!({ "success": true }),
        None,
    ))
}

pub async fn get_cart(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<Cart>> {
    let cart: Option<Cart> = sqlx::query_as("SELECT * FROM carts WHERE user_id = $1")
        .bind(user.user_id)
        .fetch_optional(&state.pool)
        .await?;
    let mut cart = cart.ok_or(AppError::NotFound("cart"))?;

    // Display fields are joined on read and never written back.
    cart.items = sqlx::query_as::<_, CartItem>(
        r#"
        SELECT ci.id, ci.cart_id, ci.variant_id, ci.size, ci.quantity, ci.sub_total,
               ci.created_at, ci.updated_at,
               pi.url AS image_url, pv.color, pv.sku, p.name AS product_name
        FROM cart_items ci
        LEFT JOIN product_variants pv ON ci.variant_id = pv.id
        LEFT JOIN products p ON pv.product_id = p.id
        LEFT JOIN product_images pi ON pv.id = pi.variant_id AND pi.is_main = TRUE
        WHERE ci.cart_id = $1
        ORDER BY ci.created_at
        "#,
    )
    .bind(cart.id)
    .fetch_all(&state.pool)
    .await?;

    Ok(ApiResponse::success("Get cart successfully", cart, None))
}

pub async fn count_items(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<CartItemCount>> {
    let (count,): (i64,) = sqlx::query_as(
        r#"
        SELECT COUNT(*)
        FROM cart_items ci
        JOIN carts c ON ci.cart_id = c.id
        WHERE c.user_id = $1
        "#,
    )
    .bind(user.user_id)
    .fetch_one(&state.pool)
    .await?;

    Ok(ApiResponse::success("OK", CartItemCount { count }, None))
}
