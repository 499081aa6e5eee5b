use std::collections::HashMap;

use uuid::Uuid;

use crate::{
    dto::category::{
        CategoryList, CreateCategoryRequest, DeleteCategoryResponse, UpdateCategoryRequest,
    },
    error::{AppError, AppResult},
    models::Category,
    response::ApiResponse,
    state::AppState,
};

async fn parent_depth_and_path(
    state: &AppState,
    parent_id: Uuid,
) -> AppResult<(i32, Vec<Uuid>)> {
    let row: Option<(i32, Vec<Uuid>)> =
        sqlx::query_as("SELECT depth, path FROM categories WHERE id = $1")
            .bind(parent_id)
            .fetch_optional(&state.pool)
            .await?;
    // A missing parent is a hard error, never auto-corrected to a root.
    row.ok_or(AppError::NotFound("parent category"))
}

pub async fn create_category(
    state: &AppState,
    payload: CreateCategoryRequest,
) -> AppResult<ApiResponse<Category>> {
    if payload.name.is_empty() {
        return Err(AppError::Validation("name is required".to_string()));
    }

    let (depth, path) = match payload.parent_id {
        Some(parent_id) => {
            let (parent_depth, mut parent_path) = parent_depth_and_path(state, parent_id).await?;
            parent_path.push(parent_id);
            (parent_depth + 1, parent_path)
        }
        None => (0, Vec::new()),
    };

    let category: Category = sqlx::query_as(
        r#"
        INSERT INTO categories (id, name, description, image, parent_id, depth, path)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(payload.name.as_str())
    .bind(payload.description.as_str())
    .bind(payload.image.as_deref())
    .bind(payload.parent_id)
    .bind(depth)
    .bind(&path)
    .fetch_one(&state.pool)
    .await?;

    Ok(ApiResponse::success("Category created", category, None))
}

/// One recursive query materializes the whole tree; the parent→children map
/// is assembled in a single client-side pass (deepest rows first, so every
/// node's children are complete before it is attached to its own parent).
pub async fn list_categories(state: &AppState) -> AppResult<ApiResponse<CategoryList>> {
    let rows: Vec<Category> = sqlx::query_as(
        r#"
        WITH RECURSIVE category_tree AS (
            SELECT c.*, 0 AS level
            FROM categories c
            WHERE c.parent_id IS NULL
            UNION ALL
            SELECT c.*, ct.level + 1
            FROM categories c
            INNER JOIN category_tree ct ON ct.id = c.parent_id
        )
        SELECT id, name, description, image, parent_id, depth, path, created_at, updated_at
        FROM category_tree
        ORDER BY level, created_at
        "#,
    )
    .fetch_all(&state.pool)
    .await?;

    let total = rows.len() as i64;
    let mut children_of: HashMap<Uuid, Vec<Category>> = HashMap::new();
    let mut roots: Vec<Category> = Vec::new();

    for mut category in rows.into_iter().rev() {
        if let Some(mut children) = children_of.remove(&category.id) {
            children.reverse();
            category.children = children;
        }
        match category.parent_id {
            Some(parent_id) => children_of.entry(parent_id).or_default().push(category),
            None => roots.push(category),
        }
    }
    roots.reverse();

    Ok(ApiResponse::success(
        "OK",
        CategoryList {
            categories: roots,
            total,
        },
        None,
    ))
}

pub async fn update_category(
    state: &AppState,
    id: Uuid,
    payload: UpdateCategoryRequest,
) -> AppResult<ApiResponse<Category>> {
    let existing: Option<Category> = sqlx::query_as("SELECT * FROM categories WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?;
    let existing = existing.ok_or(AppError::NotFound("category"))?;

    let name = payload.name.unwrap_or(existing.name);
    let description = payload.description.unwrap_or(existing.description);
    let image = payload.image.or(existing.image);

    // Re-parenting recomputes this node's depth and path.
    let (parent_id, depth, path) = match payload.parent_id {
        Some(parent_id) => {
            if parent_id == id {
                return Err(AppError::Validation(
                    "category cannot be its own parent".to_string(),
                ));
            }
            let (parent_depth, mut parent_path) = parent_depth_and_path(state, parent_id).await?;
            parent_path.push(parent_id);
            (Some(parent_id), parent_depth + 1, parent_path)
        }
        None => (existing.parent_id, existing.depth, existing.path),
    };

    let category: Category = sqlx::query_as(
        r#"
        UPDATE categories
        SET name = $2, description = $3, image = $4, parent_id = $5,
            depth = $6, path = $7, updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(name)
    .bind(description)
    .bind(image)
    .bind(parent_id)
    .bind(depth)
    .bind(&path)
    .fetch_one(&state.pool)
    .await?;

    Ok(ApiResponse::success("Category updated", category, None))
}

/// Single-node delete refuses when children exist; the cascade flag removes
/// the whole subtree and reports how many rows went.
pub async fn delete_category(
    state: &AppState,
    id: Uuid,
    cascade: bool,
) -> AppResult<ApiResponse<DeleteCategoryResponse>> {
    let mut tx = state.pool.begin().await?;

    let exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM categories WHERE id = $1")
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
    if exists.is_none() {
        return Err(AppError::NotFound("category"));
    }

    let deleted_count = if cascade {
        let result = sqlx::query(
            r#"
            WITH RECURSIVE category_tree AS (
                SELECT id FROM categories WHERE id = $1
                UNION ALL
                SELECT c.id
                FROM categories c
                INNER JOIN category_tree ct ON c.parent_id = ct.id
            )
            DELETE FROM categories
            WHERE id IN (SELECT id FROM category_tree)
            "#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;
        result.rows_affected() as i64
    } else {
        let (has_children,): (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM categories WHERE parent_id = $1)")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;
        if has_children {
            return Err(AppError::Conflict(
                "category has children; pass cascade=true to delete the subtree".to_string(),
            ));
        }

        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        result.rows_affected() as i64
    };

    tx.commit().await?;

    Ok(ApiResponse::success(
        "Category deleted",
        DeleteCategoryResponse {
            success: true,
            deleted_count,
        },
        None,
    ))
}
