use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::models::{Product, ProductVariant};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateProductRequest {
    pub name: String,
    pub sub_title: Option<String>,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    pub category_id: Uuid,
    /// Generated from the name when absent.
    pub sku: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub sub_title: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub category_id: Option<Uuid>,
    pub sku: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListProductsParams {
    /// Defaults to 10, capped at 100.
    pub page_size: Option<i64>,
    /// Opaque token from a previous page, interpreted as an offset multiplier.
    pub page_token: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductList {
    pub products: Vec<Product>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateVariantRequest {
    pub color: String,
    /// Generated alongside the product SKU convention when absent.
    pub sku: Option<String>,
    /// Falls back to the product price when absent.
    pub price: Option<Decimal>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateVariantRequest {
    pub color: Option<String>,
    pub sku: Option<String>,
    pub price: Option<Decimal>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct VariantList {
    pub variants: Vec<ProductVariant>,
}

/// Built by the image handler once the upload has succeeded.
#[derive(Debug)]
pub struct AddProductImageRequest {
    pub variant_id: Uuid,
    pub url: String,
    pub is_main: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DeleteResponse {
    pub success: bool,
}
