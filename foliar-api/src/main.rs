use foliar_api::{app, ServerConfig, TempStore};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "foliar_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env();

    // Interrupted requests can leave temp files behind; sweep them on boot.
    let removed = TempStore::new(&config.temp_dir).sweep_stale(config.stale_after);
    if removed > 0 {
        info!("removed {removed} stale temp files");
    }

    let app = app(&config);

    let listener = tokio::net::TcpListener::bind(&config.bind).await.unwrap();

    info!("foliar API listening on http://{}", config.bind);

    axum::serve(listener, app).await.unwrap();
}
