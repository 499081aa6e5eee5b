mod common;

use axum_storefront_api::{
    dto::auth::{
        LoginRequest, PasswordResetConfirm, PasswordResetRequest, RegisterRequest,
        VerifyEmailParams,
    },
    error::AppError,
    middleware::auth::AuthUser,
    services::auth_service,
};
use uuid::Uuid;

fn unique_email() -> String {
    format!("alice-{}@example.com", Uuid::new_v4().simple())
}

#[tokio::test]
async fn register_then_login_reuses_the_device_session() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let email = unique_email();

    let registered = auth_service::register_user(
        &state,
        RegisterRequest {
            name: "Alice".into(),
            email: email.clone(),
            password: "s3cret-pass".into(),
        },
        "10.0.0.1",
        "device-a",
    )
    .await?
    .data
    .unwrap();
    assert!(!registered.access_token.is_empty());
    assert!(!registered.refresh_token.is_empty());

    // Same (user, device) logs in again: the session row is refreshed in
    // place, not duplicated.
    let logged_in = auth_service::login_user(
        &state,
        LoginRequest {
            email: email.clone(),
            password: "s3cret-pass".into(),
        },
        "10.0.0.2",
        "device-a",
    )
    .await?
    .data
    .unwrap();
    assert_eq!(logged_in.session.id, registered.session.id);

    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM sessions WHERE user_id = $1")
        .bind(registered.user_id)
        .fetch_one(&state.pool)
        .await?;
    assert_eq!(count, 1);

    // A different device gets its own row.
    auth_service::login_user(
        &state,
        LoginRequest {
            email: email.clone(),
            password: "s3cret-pass".into(),
        },
        "10.0.0.3",
        "device-b",
    )
    .await?;
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM sessions WHERE user_id = $1")
        .bind(registered.user_id)
        .fetch_one(&state.pool)
        .await?;
    assert_eq!(count, 2);

    Ok(())
}

#[tokio::test]
async fn duplicate_registration_conflicts() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let email = unique_email();

    let request = || RegisterRequest {
        name: "Alice".into(),
        email: email.clone(),
        password: "s3cret-pass".into(),
    };
    auth_service::register_user(&state, request(), "", "device-a").await?;
    let err = auth_service::register_user(&state, request(), "", "device-a")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    Ok(())
}

#[tokio::test]
async fn bad_credentials_are_an_auth_error() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let email = unique_email();

    auth_service::register_user(
        &state,
        RegisterRequest {
            name: "Alice".into(),
            email: email.clone(),
            password: "right-password".into(),
        },
        "",
        "device-a",
    )
    .await?;

    let err = auth_service::login_user(
        &state,
        LoginRequest {
            email,
            password: "wrong-password".into(),
        },
        "",
        "device-a",
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Auth(_)));

    Ok(())
}

// Token refresh validates the presented value against the stored one; a
// mismatch is a hard failure.
#[tokio::test]
async fn refresh_token_mismatch_is_rejected() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let email = unique_email();

    let registered = auth_service::register_user(
        &state,
        RegisterRequest {
            name: "Alice".into(),
            email,
            password: "s3cret-pass".into(),
        },
        "",
        "device-a",
    )
    .await?
    .data
    .unwrap();

    let err = auth_service::refresh_token(&state, registered.session.id, "forged-token")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Auth(_)));

    let refreshed =
        auth_service::refresh_token(&state, registered.session.id, &registered.refresh_token)
            .await?
            .data
            .unwrap();
    assert!(!refreshed.access_token.is_empty());
    assert_eq!(refreshed.refresh_token, registered.refresh_token);

    // The new access token is persisted on the session row.
    let (stored,): (String,) = sqlx::query_as("SELECT access_token FROM sessions WHERE id = $1")
        .bind(registered.session.id)
        .fetch_one(&state.pool)
        .await?;
    assert_eq!(stored, refreshed.access_token);

    Ok(())
}

#[tokio::test]
async fn verification_token_is_single_use() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let user = common::create_user(&state, "user").await?;

    let issued = auth_service::resend_verification(&state, &user)
        .await?
        .data
        .unwrap();

    let verified = auth_service::verify_email(
        &state,
        VerifyEmailParams {
            token: issued.verification_token.clone(),
            code: issued.verify_code.clone(),
        },
    )
    .await?
    .data
    .unwrap();
    assert!(verified.success);
    assert_eq!(verified.user_id, user.user_id);

    let (flag,): (bool,) = sqlx::query_as("SELECT is_email_verified FROM users WHERE id = $1")
        .bind(user.user_id)
        .fetch_one(&state.pool)
        .await?;
    assert!(flag);

    // Consumed exactly once.
    let err = auth_service::verify_email(
        &state,
        VerifyEmailParams {
            token: issued.verification_token,
            code: issued.verify_code,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Auth(_)));

    Ok(())
}

#[tokio::test]
async fn wrong_code_does_not_verify() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let user = common::create_user(&state, "user").await?;

    let issued = auth_service::resend_verification(&state, &user)
        .await?
        .data
        .unwrap();

    let wrong_code = if issued.verify_code == "000000" {
        "000001".to_string()
    } else {
        "000000".to_string()
    };
    let err = auth_service::verify_email(
        &state,
        VerifyEmailParams {
            token: issued.verification_token,
            code: wrong_code,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Auth(_)));

    Ok(())
}

#[tokio::test]
async fn password_reset_flow_changes_the_credential() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let email = unique_email();

    auth_service::register_user(
        &state,
        RegisterRequest {
            name: "Alice".into(),
            email: email.clone(),
            password: "old-password".into(),
        },
        "",
        "device-a",
    )
    .await?;

    // Unknown email: quiet success=false, no token.
    let quiet = auth_service::request_password_reset(
        &state,
        PasswordResetRequest {
            email: unique_email(),
        },
    )
    .await?
    .data
    .unwrap();
    assert!(!quiet.success);
    assert!(quiet.reset_token.is_none());

    let issued = auth_service::request_password_reset(
        &state,
        PasswordResetRequest {
            email: email.clone(),
        },
    )
    .await?
    .data
    .unwrap();
    assert!(issued.success);
    let reset_token = issued.reset_token.unwrap();

    auth_service::reset_password(
        &state,
        PasswordResetConfirm {
            token: reset_token.clone(),
            new_password: "new-password".into(),
        },
    )
    .await?;

    // Old credential dead, new one works.
    let err = auth_service::login_user(
        &state,
        LoginRequest {
            email: email.clone(),
            password: "old-password".into(),
        },
        "",
        "device-a",
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Auth(_)));

    auth_service::login_user(
        &state,
        LoginRequest {
            email,
            password: "new-password".into(),
        },
        "",
        "device-a",
    )
    .await?;

    // The reset token is single use.
    let err = auth_service::reset_password(
        &state,
        PasswordResetConfirm {
            token: reset_token,
            new_password: "another-password".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Auth(_)));

    Ok(())
}

#[tokio::test]
async fn logout_and_revoke_drop_session_rows() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let email = unique_email();

    let registered = auth_service::register_user(
        &state,
        RegisterRequest {
            name: "Alice".into(),
            email,
            password: "s3cret-pass".into(),
        },
        "",
        "device-a",
    )
    .await?
    .data
    .unwrap();

    let user = AuthUser {
        user_id: registered.user_id,
        name: registered.name.clone(),
        email: registered.email.clone(),
        role: registered.role.clone(),
        is_email_verified: false,
        token: registered.access_token.clone(),
    };

    auth_service::logout(&state, &user).await?;
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM sessions WHERE user_id = $1")
        .bind(registered.user_id)
        .fetch_one(&state.pool)
        .await?;
    assert_eq!(count, 0);

    let err = auth_service::revoke_session(&state, &user, registered.session.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    Ok(())
}
