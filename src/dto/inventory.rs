use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::models::Inventory;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateInventoryRequest {
    pub variant_id: Uuid,
    pub size: String,
    pub stock: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateInventoryRequest {
    pub size: String,
    pub stock: i32,
    pub reserved_stock: i32,
    pub available_stock: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct InventoryList {
    pub inventory: Vec<Inventory>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct AvailabilityParams {
    pub variant_id: Uuid,
    pub quantity: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AvailabilityResponse {
    pub available: bool,
    pub available_stock: i64,
}
