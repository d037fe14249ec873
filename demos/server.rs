//! Demo server: loads the gateway config from `GATEWAY_CONFIG` (JSON
//! file) or the built-in deployment table, connects the relational
//! pool, and mounts common + gateway routes.

use axum::Router;
use tokio::net::TcpListener;
use wastegate::{common_routes_with_ready, default_config, gateway_routes, load_from_file, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("wastegate=info")),
        )
        .init();

    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| "postgres://localhost/wastegate".into());
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;

    let config = match std::env::var("GATEWAY_CONFIG") {
        Ok(path) => load_from_file(path)?,
        Err(_) => default_config(),
    };
    let state = AppState::from_config(pool, &config)?;
    tracing::info!(routes = state.routing.len(), "routing table frozen");

    let app = Router::new()
        .merge(common_routes_with_ready(state.clone()))
        .merge(gateway_routes(state));

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".into());
    let listener = TcpListener::bind(format!("0.0.0.0:{port}")).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
