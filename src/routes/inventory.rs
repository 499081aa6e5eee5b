use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post, put},
};
use uuid::Uuid;

use crate::{
    dto::inventory::{
        AvailabilityParams, AvailabilityResponse, CreateInventoryRequest, InventoryList,
        UpdateInventoryRequest,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::Inventory,
    response::ApiResponse,
    services::inventory_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_inventory))
        .route("/check", get(check_availability))
        .route("/{id}", get(get_by_variant).put(update_inventory))
}

#[utoipa::path(
    post,
    path = "/api/v1/stock",
    request_body = CreateInventoryRequest,
    responses(
        (status = 200, description = "Create inventory row", body = ApiResponse<Inventory>),
        (status = 400, description = "Negative stock or empty size"),
        (status = 409, description = "Row for (variant, size) already exists"),
    ),
    security(("bearer_auth" = [])),
    tag = "Inventory"
)]
pub async fn create_inventory(
    State(state): State<AppState>,
    _user: AuthUser,
    Json(payload): Json<CreateInventoryRequest>,
) -> AppResult<Json<ApiResponse<Inventory>>> {
    let resp = inventory_service::create_inventory(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/v1/stock/{id}",
    params(("id" = Uuid, Path, description = "Variant ID")),
    responses(
        (status = 200, description = "Inventory rows for a variant", body = ApiResponse<InventoryList>),
    ),
    security(("bearer_auth" = [])),
    tag = "Inventory"
)]
pub async fn get_by_variant(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(variant_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<InventoryList>>> {
    let resp = inventory_service::get_by_variant(&state, variant_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/v1/stock/{id}",
    params(("id" = Uuid, Path, description = "Inventory ID")),
    request_body = UpdateInventoryRequest,
    responses(
        (status = 200, description = "Updated inventory", body = ApiResponse<Inventory>),
        (status = 404, description = "Inventory not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Inventory"
)]
pub async fn update_inventory(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateInventoryRequest>,
) -> AppResult<Json<ApiResponse<Inventory>>> {
    let resp = inventory_service::update_inventory(&state, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/v1/stock/check",
    params(AvailabilityParams),
    responses(
        (status = 200, description = "Stock availability for a quantity", body = ApiResponse<AvailabilityResponse>),
    ),
    security(("bearer_auth" = [])),
    tag = "Inventory"
)]
pub async fn check_availability(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(params): Query<AvailabilityParams>,
) -> AppResult<Json<ApiResponse<AvailabilityResponse>>> {
    let resp = inventory_service::check_availability(&state, params).await?;
    Ok(Json(resp))
}
