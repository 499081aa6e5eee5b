use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::models::Category;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCategoryRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub parent_id: Option<Uuid>,
    /// Set by the handler after a successful upload.
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateCategoryRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub parent_id: Option<Uuid>,
    pub image: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct DeleteCategoryParams {
    /// Delete the whole subtree instead of rejecting when children exist.
    pub cascade: Option<bool>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DeleteCategoryResponse {
    pub success: bool,
    pub deleted_count: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CategoryList {
    pub categories: Vec<Category>,
    pub total: i64,
}
