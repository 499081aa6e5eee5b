mod common;

use axum_storefront_api::{
    dto::cart::{AddToCartRequest, UpdateQuantityRequest},
    error::AppError,
    services::cart_service,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

// Add qty 2 at 50.0 -> total 100; add qty 1 more -> one line, qty 3, total 150.
#[tokio::test]
async fn add_twice_folds_into_one_line_and_total_tracks_sum() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let user = common::create_user(&state, "user").await?;
    let variant_id = common::create_variant(&state, dec!(50.00)).await?;

    let first = cart_service::add_to_cart(
        &state,
        &user,
        AddToCartRequest {
            variant_id,
            size: "M".into(),
            quantity: 2,
        },
    )
    .await?;
    let first = first.data.unwrap();
    assert_eq!(first.quantity, 2);
    assert_eq!(first.sub_total, dec!(100.00));

    let cart = cart_service::get_cart(&state, &user).await?.data.unwrap();
    assert_eq!(cart.total, dec!(100.00));
    assert_eq!(cart.items.len(), 1);

    let second = cart_service::add_to_cart(
        &state,
        &user,
        AddToCartRequest {
            variant_id,
            size: "M".into(),
            quantity: 1,
        },
    )
    .await?;
    let second = second.data.unwrap();
    assert_eq!(second.id, first.id, "expected the same line, not a new one");
    assert_eq!(second.quantity, 3);

    let cart = cart_service::get_cart(&state, &user).await?.data.unwrap();
    assert_eq!(cart.total, dec!(150.00));
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.items[0].quantity, 3);

    Ok(())
}

#[tokio::test]
async fn different_sizes_are_separate_lines() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let user = common::create_user(&state, "user").await?;
    let variant_id = common::create_variant(&state, dec!(20.00)).await?;

    for size in ["M", "L"] {
        cart_service::add_to_cart(
            &state,
            &user,
            AddToCartRequest {
                variant_id,
                size: size.into(),
                quantity: 1,
            },
        )
        .await?;
    }

    let cart = cart_service::get_cart(&state, &user).await?.data.unwrap();
    assert_eq!(cart.items.len(), 2);
    assert_eq!(cart.total, dec!(40.00));

    Ok(())
}

// The invariant: total == sum of sub_totals after every operation, including
// a price drift between add and update.
#[tokio::test]
async fn set_quantity_reprices_from_current_variant_price() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let user = common::create_user(&state, "user").await?;
    let variant_id = common::create_variant(&state, dec!(10.00)).await?;

    let added = cart_service::add_to_cart(
        &state,
        &user,
        AddToCartRequest {
            variant_id,
            size: "M".into(),
            quantity: 2,
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(added.sub_total, dec!(20.00));

    sqlx::query("UPDATE product_variants SET price = $1 WHERE id = $2")
        .bind(dec!(12.50))
        .bind(variant_id)
        .execute(&state.pool)
        .await?;

    let updated = cart_service::update_quantity(
        &state,
        &user,
        added.id,
        UpdateQuantityRequest {
            size: None,
            quantity: 4,
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(updated.quantity, 4);
    assert_eq!(updated.sub_total, dec!(50.00));

    let cart = cart_service::get_cart(&state, &user).await?.data.unwrap();
    assert_eq!(cart.total, dec!(50.00));

    Ok(())
}

// Boundary decision under test: quantity zero deletes the line.
#[tokio::test]
async fn set_quantity_to_zero_deletes_the_line() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let user = common::create_user(&state, "user").await?;
    let variant_id = common::create_variant(&state, dec!(15.00)).await?;

    let added = cart_service::add_to_cart(
        &state,
        &user,
        AddToCartRequest {
            variant_id,
            size: "M".into(),
            quantity: 3,
        },
    )
    .await?
    .data
    .unwrap();

    let resp = cart_service::update_quantity(
        &state,
        &user,
        added.id,
        UpdateQuantityRequest {
            size: None,
            quantity: 0,
        },
    )
    .await?;
    assert!(resp.data.is_none());

    let cart = cart_service::get_cart(&state, &user).await?.data.unwrap();
    assert!(cart.items.is_empty());
    assert_eq!(cart.total, Decimal::ZERO);

    Ok(())
}

#[tokio::test]
async fn update_missing_item_is_not_found() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let user = common::create_user(&state, "user").await?;

    let err = cart_service::update_quantity(
        &state,
        &user,
        Uuid::new_v4(),
        UpdateQuantityRequest {
            size: None,
            quantity: 1,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    Ok(())
}

// Removal as the wrong user must fail before the delete and leave the owner's
// cart untouched.
#[tokio::test]
async fn remove_checks_ownership_before_delete() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let owner = common::create_user(&state, "user").await?;
    let intruder = common::create_user(&state, "user").await?;
    let variant_id = common::create_variant(&state, dec!(30.00)).await?;

    let added = cart_service::add_to_cart(
        &state,
        &owner,
        AddToCartRequest {
            variant_id,
            size: "M".into(),
            quantity: 1,
        },
    )
    .await?
    .data
    .unwrap();

    let err = cart_service::remove_item(&state, &intruder, added.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Ownership));

    let cart = cart_service::get_cart(&state, &owner).await?.data.unwrap();
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.total, dec!(30.00));

    cart_service::remove_item(&state, &owner, added.id).await?;
    let cart = cart_service::get_cart(&state, &owner).await?.data.unwrap();
    assert!(cart.items.is_empty());
    assert_eq!(cart.total, Decimal::ZERO);

    Ok(())
}

#[tokio::test]
async fn clear_removes_the_aggregate() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let user = common::create_user(&state, "user").await?;
    let variant_id = common::create_variant(&state, dec!(5.00)).await?;

    cart_service::add_to_cart(
        &state,
        &user,
        AddToCartRequest {
            variant_id,
            size: "S".into(),
            quantity: 2,
        },
    )
    .await?;

    cart_service::clear_cart(&state, &user).await?;

    let err = cart_service::get_cart(&state, &user).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    // Clearing an absent cart still succeeds.
    cart_service::clear_cart(&state, &user).await?;

    Ok(())
}

#[tokio::test]
async fn add_unknown_variant_is_not_found() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let user = common::create_user(&state, "user").await?;

    let err = cart_service::add_to_cart(
        &state,
        &user,
        AddToCartRequest {
            variant_id: Uuid::new_v4(),
            size: "M".into(),
            quantity: 1,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    // Nothing was left behind by the rolled-back transaction.
    let err = cart_service::get_cart(&state, &user).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    Ok(())
}

// N concurrent adds for the same (user, variant, size) must converge to
// quantity == N: no duplicate lines, no lost updates.
#[tokio::test]
async fn concurrent_adds_converge_without_lost_updates() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let user = common::create_user(&state, "user").await?;
    let variant_id = common::create_variant(&state, dec!(10.00)).await?;

    const N: usize = 8;
    let mut handles = Vec::with_capacity(N);
    for _ in 0..N {
        let state = state.clone();
        let user = user.clone();
        handles.push(tokio::spawn(async move {
            cart_service::add_to_cart(
                &state,
                &user,
                AddToCartRequest {
                    variant_id,
                    size: "M".into(),
                    quantity: 1,
                },
            )
            .await
        }));
    }
    for handle in handles {
        handle.await??;
    }

    let cart = cart_service::get_cart(&state, &user).await?.data.unwrap();
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.items[0].quantity, N as i32);
    assert_eq!(cart.total, dec!(10.00) * Decimal::from(N as i64));

    let count = cart_service::count_items(&state, &user).await?.data.unwrap();
    assert_eq!(count.count, 1);

    Ok(())
}

#[tokio::test]
async fn get_cart_enriches_items_with_display_fields() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let user = common::create_user(&state, "user").await?;
    let variant_id = common::create_variant(&state, dec!(25.00)).await?;

    sqlx::query(
        "INSERT INTO product_images (id, variant_id, url, is_main) VALUES ($1, $2, $3, TRUE)",
    )
    .bind(Uuid::new_v4())
    .bind(variant_id)
    .bind("https://cdn.example.com/main.jpg")
    .execute(&state.pool)
    .await?;

    cart_service::add_to_cart(
        &state,
        &user,
        AddToCartRequest {
            variant_id,
            size: "M".into(),
            quantity: 1,
        },
    )
    .await?;

    let cart = cart_service::get_cart(&state, &user).await?.data.unwrap();
    let item = &cart.items[0];
    assert_eq!(item.image_url.as_deref(), Some("https://cdn.example.com/main.jpg"));
    assert_eq!(item.color.as_deref(), Some("Black"));
    assert!(item.product_name.is_some());
    assert!(item.sku.is_some());

    Ok(())
}
