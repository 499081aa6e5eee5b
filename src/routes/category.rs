use axum::{
    Json, Router,
    extract::{Multipart, Path, Query, State},
    routing::{delete, get, post, put},
};
use uuid::Uuid;

use crate::{
    dto::category::{
        CategoryList, CreateCategoryRequest, DeleteCategoryParams, DeleteCategoryResponse,
        UpdateCategoryRequest,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Category,
    response::ApiResponse,
    services::category_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_category))
        .route("/list-categories", get(list_categories))
        .route("/update/{id}", put(update_category))
        .route("/{id}", delete(delete_category))
}

struct CategoryForm {
    name: Option<String>,
    description: Option<String>,
    parent_id: Option<Uuid>,
    image: Option<String>,
}

/// Shared multipart reader for create and update; a `file` part goes through
/// the uploader and comes back as an image URL.
async fn read_category_form(state: &AppState, mut multipart: Multipart) -> AppResult<CategoryForm> {
    let mut form = CategoryForm {
        name: None,
        description: None,
        parent_id: None,
        image: None,
    };

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(e.to_string()))?
    {
        let Some(field_name) = field.name().map(str::to_string) else {
            continue;
        };
        match field_name.as_str() {
            "name" => {
                form.name = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| AppError::Validation(e.to_string()))?,
                );
            }
            "description" => {
                form.description = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| AppError::Validation(e.to_string()))?,
                );
            }
            "parent_id" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(e.to_string()))?;
                if !text.is_empty() {
                    let parent_id = Uuid::parse_str(&text)
                        .map_err(|_| AppError::Validation("invalid parent_id".to_string()))?;
                    form.parent_id = Some(parent_id);
                }
            }
            "file" => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(e.to_string()))?;
                let public_id = format!("CAT-{}", Uuid::new_v4().simple());
                let uploaded = state
                    .uploader
                    .upload(bytes.to_vec(), "categories", &public_id)
                    .await?;
                form.image = Some(uploaded.url);
            }
            _ => {}
        }
    }

    Ok(form)
}

#[utoipa::path(
    post,
    path = "/api/v1/category",
    responses(
        (status = 200, description = "Create category (multipart: name, description, parent_id, file)", body = ApiResponse<Category>),
        (status = 404, description = "Parent category not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Category"
)]
pub async fn create_category(
    State(state): State<AppState>,
    _user: AuthUser,
    multipart: Multipart,
) -> AppResult<Json<ApiResponse<Category>>> {
    let form = read_category_form(&state, multipart).await?;
    let payload = CreateCategoryRequest {
        name: form
            .name
            .ok_or_else(|| AppError::Validation("name is required".to_string()))?,
        description: form.description.unwrap_or_default(),
        parent_id: form.parent_id,
        image: form.image,
    };

    let resp = category_service::create_category(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/v1/category/list-categories",
    responses(
        (status = 200, description = "Whole category tree", body = ApiResponse<CategoryList>),
    ),
    security(("bearer_auth" = [])),
    tag = "Category"
)]
pub async fn list_categories(
    State(state): State<AppState>,
    _user: AuthUser,
) -> AppResult<Json<ApiResponse<CategoryList>>> {
    let resp = category_service::list_categories(&state).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/v1/category/update/{id}",
    params(("id" = Uuid, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Update category (multipart, partial)", body = ApiResponse<Category>),
        (status = 404, description = "Category not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Category"
)]
pub async fn update_category(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> AppResult<Json<ApiResponse<Category>>> {
    let form = read_category_form(&state, multipart).await?;
    let payload = UpdateCategoryRequest {
        name: form.name,
        description: form.description,
        parent_id: form.parent_id,
        image: form.image,
    };

    let resp = category_service::update_category(&state, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/v1/category/{id}",
    params(
        ("id" = Uuid, Path, description = "Category ID"),
        DeleteCategoryParams,
    ),
    responses(
        (status = 200, description = "Delete category", body = ApiResponse<DeleteCategoryResponse>),
        (status = 404, description = "Category not found"),
        (status = 409, description = "Category has children and cascade was not set"),
    ),
    security(("bearer_auth" = [])),
    tag = "Category"
)]
pub async fn delete_category(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<Uuid>,
    Query(params): Query<DeleteCategoryParams>,
) -> AppResult<Json<ApiResponse<DeleteCategoryResponse>>> {
    let resp =
        category_service::delete_category(&state, id, params.cascade.unwrap_or(false)).await?;
    Ok(Json(resp))
}
