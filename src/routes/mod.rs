use axum::{Router, routing::get};

use crate::state::AppState;

pub mod auth;
pub mod doc;
pub mod health;
pub mod orders;
pub mod products;
pub mod reviews;

// Build the API router without binding state; it is provided at the top
// level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .merge(reviews::router())
        .nest("/products", products::router())
        .nest("/orders", orders::router())
        .route("/health", get(health::health_check))
}
