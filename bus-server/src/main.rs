use std::net::SocketAddr;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use bus_server::board::{BoardConfig, DepartureBoard};
use bus_server::cache::{CacheConfig, Caches};
use bus_server::odpt::{OdptClient, OdptConfig};
use bus_server::web::{AppState, create_router};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Get the upstream credential from the environment
    let token = std::env::var("ODPT_TOKEN").unwrap_or_else(|_| {
        warn!("ODPT_TOKEN not set; upstream requests will fail");
        String::new()
    });

    let client = OdptClient::new(OdptConfig::new(&token)).expect("Failed to create ODPT client");
    let caches = Caches::new(&CacheConfig::default());
    let board = DepartureBoard::new(client, caches, BoardConfig::default());

    let state = AppState::new(board);
    let app = create_router(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], 3000));
    info!("Bus departure board listening on http://{addr}");
    info!("  GET /health          - Health check");
    info!("  GET /api/bus/stops   - Stop suggestions (query, anchor, limit)");
    info!("  GET /api/bus/search  - Next departures (origin, dest)");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listener");
    axum::serve(listener, app).await.expect("Server error");
}
