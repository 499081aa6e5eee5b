use axum::{Router, middleware as axum_middleware};

use crate::{middleware::auth::require_auth, state::AppState};

pub mod auth;
pub mod cart;
pub mod category;
pub mod doc;
pub mod health;
pub mod inventory;
pub mod live;
pub mod products;
pub mod user;

/// `/api/v1`: public auth endpoints plus the authenticated surface behind the
/// bearer/cookie gate.
pub fn create_api_router(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .nest("/user", user::router())
        .nest("/category", category::router())
        .nest("/product", products::router())
        .nest("/stock", inventory::router())
        .nest("/cart", cart::router())
        .merge(live::router())
        .layer(axum_middleware::from_fn_with_state(state, require_auth));

    Router::new().nest("/auth", auth::router()).merge(protected)
}
