use axum::{routing::get, Router};

use crate::state::AppState;

pub mod health;
pub mod heating_bills;

pub fn v1_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .merge(heating_bills::router())
}
