use bookrec_api::{
    api::{create_router, AppState},
    config::Config,
    error::AppError,
    services::{CsvDataset, RecommendationEngine},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("bookrec_api=info,tower_http=info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    // Build every derived structure before accepting queries
    let source = CsvDataset::new(
        &config.books_path,
        &config.users_path,
        &config.ratings_path,
    );
    let settings = config.engine_settings();
    let engine = tokio::task::spawn_blocking(move || {
        RecommendationEngine::from_source(&source, settings)
    })
    .await
    .map_err(|e| AppError::Internal(format!("engine build task failed: {e}")))
    .and_then(|built| built)
    .map_err(|e| {
        tracing::error!(error = %e, "Failed to build recommendation engine");
        e
    })?;

    let state = AppState::new(engine, config.query_limits());
    let app = create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");
    axum::serve(listener, app).await?;

    Ok(())
}
