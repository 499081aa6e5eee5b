mod common;

use axum_storefront_api::{
    dto::category::{CreateCategoryRequest, UpdateCategoryRequest},
    error::AppError,
    services::category_service,
};
use uuid::Uuid;

fn create_request(name: &str, parent_id: Option<Uuid>) -> CreateCategoryRequest {
    CreateCategoryRequest {
        name: format!("{name}-{}", Uuid::new_v4().simple()),
        description: String::new(),
        parent_id,
        image: None,
    }
}

#[tokio::test]
async fn child_depth_is_parent_plus_one_and_path_materializes() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };

    let root = category_service::create_category(&state, create_request("root", None))
        .await?
        .data
        .unwrap();
    assert_eq!(root.depth, 0);
    assert!(root.path.is_empty());

    let child = category_service::create_category(&state, create_request("child", Some(root.id)))
        .await?
        .data
        .unwrap();
    assert_eq!(child.depth, 1);
    assert_eq!(child.path, vec![root.id]);

    let grandchild =
        category_service::create_category(&state, create_request("grandchild", Some(child.id)))
            .await?
            .data
            .unwrap();
    assert_eq!(grandchild.depth, 2);
    assert_eq!(grandchild.path, vec![root.id, child.id]);

    Ok(())
}

#[tokio::test]
async fn missing_parent_is_a_hard_error() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };

    let err =
        category_service::create_category(&state, create_request("orphan", Some(Uuid::new_v4())))
            .await
            .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    Ok(())
}

#[tokio::test]
async fn tree_fetch_assembles_children_under_parents() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };

    let root = category_service::create_category(&state, create_request("tree-root", None))
        .await?
        .data
        .unwrap();
    let child_a =
        category_service::create_category(&state, create_request("tree-a", Some(root.id)))
            .await?
            .data
            .unwrap();
    category_service::create_category(&state, create_request("tree-b", Some(root.id))).await?;
    category_service::create_category(&state, create_request("tree-a-1", Some(child_a.id)))
        .await?;

    let list = category_service::list_categories(&state).await?.data.unwrap();
    let fetched_root = list
        .categories
        .iter()
        .find(|c| c.id == root.id)
        .expect("root should be in the tree");
    assert_eq!(fetched_root.children.len(), 2);

    let fetched_a = fetched_root
        .children
        .iter()
        .find(|c| c.id == child_a.id)
        .expect("child should hang under root");
    assert_eq!(fetched_a.children.len(), 1);

    Ok(())
}

// Delete without the cascade flag refuses when children exist; with it, the
// whole subtree goes and the count matches its size.
#[tokio::test]
async fn delete_respects_the_cascade_flag() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };

    let root = category_service::create_category(&state, create_request("del-root", None))
        .await?
        .data
        .unwrap();
    let child = category_service::create_category(&state, create_request("del-child", Some(root.id)))
        .await?
        .data
        .unwrap();
    category_service::create_category(&state, create_request("del-grand", Some(child.id))).await?;

    let err = category_service::delete_category(&state, root.id, false)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let deleted = category_service::delete_category(&state, root.id, true)
        .await?
        .data
        .unwrap();
    assert!(deleted.success);
    assert_eq!(deleted.deleted_count, 3);

    let err = category_service::delete_category(&state, root.id, false)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    Ok(())
}

#[tokio::test]
async fn leaf_delete_without_cascade_succeeds() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };

    let leaf = category_service::create_category(&state, create_request("leaf", None))
        .await?
        .data
        .unwrap();
    let deleted = category_service::delete_category(&state, leaf.id, false)
        .await?
        .data
        .unwrap();
    assert_eq!(deleted.deleted_count, 1);

    Ok(())
}

#[tokio::test]
async fn reparenting_recomputes_depth_and_path() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };

    let root = category_service::create_category(&state, create_request("move-root", None))
        .await?
        .data
        .unwrap();
    let node = category_service::create_category(&state, create_request("move-node", None))
        .await?
        .data
        .unwrap();
    assert_eq!(node.depth, 0);

    let moved = category_service::update_category(
        &state,
        node.id,
        UpdateCategoryRequest {
            parent_id: Some(root.id),
            ..Default::default()
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(moved.depth, 1);
    assert_eq!(moved.path, vec![root.id]);

    let err = category_service::update_category(
        &state,
        node.id,
        UpdateCategoryRequest {
            parent_id: Some(node.id),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    Ok(())
}
