mod common;

use axum::extract::State;
use axum_storefront_api::routes::health::health_check;

#[tokio::test]
async fn health_check_reports_ready() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };

    let response = health_check(State(state)).await;
    assert_eq!(response.0.status, "success");
    assert_eq!(response.0.message, "Health check");

    let data = response.0.data.expect("health data");
    assert!(data.ready);

    Ok(())
}
