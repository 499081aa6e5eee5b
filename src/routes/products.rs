use axum::{
    Json, Router,
    extract::{Multipart, Path, Query, State},
    routing::{delete, get, post, put},
};
use uuid::Uuid;

use crate::{
    dto::products::{
        AddProductImageRequest, CreateProductRequest, CreateVariantRequest, DeleteResponse,
        ListProductsParams, ProductList, UpdateProductRequest, UpdateVariantRequest, VariantList,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Product, ProductImage, ProductVariant},
    response::ApiResponse,
    services::product_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_product))
        .route("/all", get(list_products))
        .route("/{id}", get(get_product))
        .route("/{id}", put(update_product))
        .route("/{id}", delete(delete_product))
        .route("/{id}/variant", post(create_variant))
        .route("/{id}/variants", get(list_variants))
        .route("/variant/{variant_id}", get(get_variant))
        .route("/variant/{variant_id}", put(update_variant))
        .route("/variant/{variant_id}", delete(delete_variant))
        .route("/variant/{variant_id}/images", post(add_image))
        .route("/variant/images/{image_id}", delete(delete_image))
}

#[utoipa::path(
    post,
    path = "/api/v1/product",
    request_body = CreateProductRequest,
    responses(
        (status = 200, description = "Create product", body = ApiResponse<Product>),
        (status = 404, description = "Category not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Products"
)]
pub async fn create_product(
    State(state): State<AppState>,
    _user: AuthUser,
    Json(payload): Json<CreateProductRequest>,
) -> AppResult<Json<ApiResponse<Product>>> {
    let resp = product_service::create_product(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/v1/product/all",
    params(ListProductsParams),
    responses(
        (status = 200, description = "List products with nested variants", body = ApiResponse<ProductList>),
    ),
    security(("bearer_auth" = [])),
    tag = "Products"
)]
pub async fn list_products(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(params): Query<ListProductsParams>,
) -> AppResult<Json<ApiResponse<ProductList>>> {
    let resp = product_service::list_products(&state, params).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/v1/product/{id}",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product aggregate", body = ApiResponse<Product>),
        (status = 404, description = "Product not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Products"
)]
pub async fn get_product(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Product>>> {
    let resp = product_service::get_product(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/v1/product/{id}",
    params(("id" = Uuid, Path, description = "Product ID")),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Updated product", body = ApiResponse<Product>),
        (status = 404, description = "Product not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Products"
)]
pub async fn update_product(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProductRequest>,
) -> AppResult<Json<ApiResponse<Product>>> {
    let resp = product_service::update_product(&state, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/v1/product/{id}",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Deleted product", body = ApiResponse<DeleteResponse>),
        (status = 404, description = "Product not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Products"
)]
pub async fn delete_product(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<DeleteResponse>>> {
    let resp = product_service::delete_product(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/v1/product/{id}/variant",
    params(("id" = Uuid, Path, description = "Product ID")),
    request_body = CreateVariantRequest,
    responses(
        (status = 200, description = "Create variant", body = ApiResponse<ProductVariant>),
        (status = 404, description = "Product not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Products"
)]
pub async fn create_variant(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<CreateVariantRequest>,
) -> AppResult<Json<ApiResponse<ProductVariant>>> {
    let resp = product_service::create_variant(&state, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/v1/product/{id}/variants",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Variants of a product", body = ApiResponse<VariantList>),
    ),
    security(("bearer_auth" = [])),
    tag = "Products"
)]
pub async fn list_variants(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<VariantList>>> {
    let resp = product_service::list_variants(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/v1/product/variant/{variant_id}",
    params(("variant_id" = Uuid, Path, description = "Variant ID")),
    responses(
        (status = 200, description = "Variant with images and inventory", body = ApiResponse<ProductVariant>),
        (status = 404, description = "Variant not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Products"
)]
pub async fn get_variant(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(variant_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<ProductVariant>>> {
    let resp = product_service::get_variant(&state, variant_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/v1/product/variant/{variant_id}",
    params(("variant_id" = Uuid, Path, description = "Variant ID")),
    request_body = UpdateVariantRequest,
    responses(
        (status = 200, description = "Updated variant", body = ApiResponse<ProductVariant>),
        (status = 404, description = "Variant not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Products"
)]
pub async fn update_variant(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(variant_id): Path<Uuid>,
    Json(payload): Json<UpdateVariantRequest>,
) -> AppResult<Json<ApiResponse<ProductVariant>>> {
    let resp = product_service::update_variant(&state, variant_id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/v1/product/variant/{variant_id}",
    params(("variant_id" = Uuid, Path, description = "Variant ID")),
    responses(
        (status = 200, description = "Deleted variant", body = ApiResponse<DeleteResponse>),
        (status = 404, description = "Variant not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Products"
)]
pub async fn delete_variant(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(variant_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<DeleteResponse>>> {
    let resp = product_service::delete_variant(&state, variant_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/v1/product/variant/{variant_id}/images",
    params(("variant_id" = Uuid, Path, description = "Variant ID")),
    responses(
        (status = 200, description = "Add image (multipart: file, is_main)", body = ApiResponse<ProductImage>),
        (status = 404, description = "Variant not found"),
        (status = 502, description = "Upload failed"),
    ),
    security(("bearer_auth" = [])),
    tag = "Products"
)]
pub async fn add_image(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(variant_id): Path<Uuid>,
    mut multipart: Multipart,
) -> AppResult<Json<ApiResponse<ProductImage>>> {
    let mut url: Option<String> = None;
    let mut is_main = false;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(e.to_string()))?
    {
        let Some(field_name) = field.name().map(str::to_string) else {
            continue;
        };
        match field_name.as_str() {
            "file" => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(e.to_string()))?;
                let public_id = format!("IMG-{}", Uuid::new_v4().simple());
                let uploaded = state
                    .uploader
                    .upload(bytes.to_vec(), "products", &public_id)
                    .await?;
                url = Some(uploaded.url);
            }
            "is_main" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(e.to_string()))?;
                is_main = text == "true" || text == "1";
            }
            _ => {}
        }
    }

    let url = url.ok_or_else(|| AppError::Validation("file is required".to_string()))?;
    let resp = product_service::add_image(
        &state,
        AddProductImageRequest {
            variant_id,
            url,
            is_main,
        },
    )
    .await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/v1/product/variant/images/{image_id}",
    params(("image_id" = Uuid, Path, description = "Image ID")),
    responses(
        (status = 200, description = "Deleted image", body = ApiResponse<DeleteResponse>),
        (status = 404, description = "Image not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Products"
)]
pub async fn delete_image(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(image_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<DeleteResponse>>> {
    let resp = product_service::delete_image(&state, image_id).await?;
    Ok(Json(resp))
}
