use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::routes::kpi;
use crate::state::AppState;

pub fn create_app(state: AppState) -> Router {
    Router::<AppState>::new()
        .route("/health", get(health))
        .nest("/api/kpis", kpi::router())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> &'static str {
    "atelier-backend OK"
}
