mod app;
mod db;
mod errors;
mod logging;
mod models;
mod routes;
mod services;
mod state;
mod store;

use std::net::SocketAddr;
use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;

use crate::logging::{init_logging, LoggingConfig};
use crate::services::kpi_policy::KpiPolicy;
use crate::state::AppState;
use crate::store::PgKpiStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    init_logging(LoggingConfig::from_env())?;

    let database_url = std::env::var("DATABASE_URL")?;
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await?;

    let state = AppState {
        kpi_store: Arc::new(PgKpiStore::new(pool)),
        kpi_policy: Arc::new(KpiPolicy::default()),
    };
    let app = app::create_app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], 3000));
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("🚀 Atelier backend running at http://{}/", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
