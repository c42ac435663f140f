use mock_igdb::{seed_catalog, MockIgdb, DEFAULT_API_KEY};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let api_key =
        std::env::var("MOCK_IGDB_API_KEY").unwrap_or_else(|_| DEFAULT_API_KEY.to_string());
    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await?;
    info!(%addr, "mock IGDB listening");
    mock_igdb::run_with(listener, MockIgdb::new(api_key, seed_catalog())).await
}
