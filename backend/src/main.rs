//! AgriSmart yield advisory server

use std::net::SocketAddr;

use agrismart_backend::{create_app, AppState, Config};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::load()?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "agrismart_backend={level},agrismart_server={level},tower_http=info,sqlx=warn",
            level = config.log_level
        )
        .into()
    });
    let registry = tracing_subscriber::registry().with(filter);
    if config.log_json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!("Starting AgriSmart server");
    tracing::info!("Environment: {}", config.environment);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let state = AppState::from_config(config).await?;

    // Preload the model; on failure the first prediction retries
    match state.predictions.estimator().preload().await {
        Ok(()) => tracing::info!("Model loaded successfully"),
        Err(e) => tracing::error!("Model loading failed; API will run in degraded mode: {}", e),
    }

    let app = create_app(state);

    tracing::info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
