use uuid::Uuid;

use crate::{
    dto::inventory::{
        AvailabilityParams, AvailabilityResponse, CreateInventoryRequest, InventoryList,
        UpdateInventoryRequest,
    },
    error::{AppError, AppResult},
    models::Inventory,
    response::ApiResponse,
    state::AppState,
};

pub async fn create_inventory(
    state: &AppState,
    payload: CreateInventoryRequest,
) -> AppResult<ApiResponse<Inventory>> {
    // Intake validation; available_stock starts equal to stock.
    if payload.stock < 0 {
        return Err(AppError::Validation(format!(
            "invalid stock value: {}",
            payload.stock
        )));
    }
    if payload.size.is_empty() {
        return Err(AppError::Validation("size is required".to_string()));
    }

    let variant: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM product_variants WHERE id = $1")
        .bind(payload.variant_id)
        .fetch_optional(&state.pool)
        .await?;
    if variant.is_none() {
        return Err(AppError::NotFound("product variant"));
    }

    let inventory: Inventory = sqlx::query_as(
        r#"
        INSERT INTO inventory (id, variant_id, size, stock, reserved_stock, available_stock)
        VALUES ($1, $2, $3, $4, 0, $4)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(payload.variant_id)
    .bind(payload.size.as_str())
    .bind(payload.stock)
    .fetch_one(&state.pool)
    .await?;

    Ok(ApiResponse::success("Inventory created", inventory, None))
}

pub async fn get_by_variant(
    state: &AppState,
    variant_id: Uuid,
) -> AppResult<ApiResponse<InventoryList>> {
    let inventory: Vec<Inventory> =
        sqlx::query_as("SELECT * FROM inventory WHERE variant_id = $1 ORDER BY size")
            .bind(variant_id)
            .fetch_all(&state.pool)
            .await?;

    Ok(ApiResponse::success("OK", InventoryList { inventory }, None))
}

pub async fn update_inventory(
    state: &AppState,
    id: Uuid,
    payload: UpdateInventoryRequest,
) -> AppResult<ApiResponse<Inventory>> {
    let inventory: Option<Inventory> = sqlx::query_as(
        r#"
        UPDATE inventory
        SET size = $2, stock = $3, reserved_stock = $4, available_stock = $5,
            updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(payload.size.as_str())
    .bind(payload.stock)
    .bind(payload.reserved_stock)
    .bind(payload.available_stock)
    .fetch_optional(&state.pool)
    .await?;

    let inventory = inventory.ok_or(AppError::NotFound("inventory"))?;
    Ok(ApiResponse::success("Inventory updated", inventory, None))
}

/// Availability comes from `stock - reserved_stock`; a variant with no rows
/// is simply unavailable, not an error.
pub async fn check_availability(
    state: &AppState,
    params: AvailabilityParams,
) -> AppResult<ApiResponse<AvailabilityResponse>> {
    let (available_stock,): (Option<i64>,) = sqlx::query_as(
        "SELECT SUM(stock - reserved_stock)::BIGINT FROM inventory WHERE variant_id = $1",
    )
    .bind(params.variant_id)
    .fetch_one(&state.pool)
    .await?;

    let available_stock = available_stock.unwrap_or(0);
    let resp = AvailabilityResponse {
        available: available_stock >= params.quantity,
        available_stock,
    };

    Ok(ApiResponse::success("OK", resp, None))
}
