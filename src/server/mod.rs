pub mod handlers;
pub mod types;

use crate::{Error, Result, config::Config, service::PredictionService};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{get, post},
};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tower_http::{
    cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

pub async fn run(config: Config) -> Result<()> {
    // Initialize the prediction service (labels eagerly, model lazily)
    let service = PredictionService::new(&config.model)?;

    // Create application state
    let app_state = handlers::AppState {
        service: Arc::new(service),
        model_config: Arc::new(config.model.clone()),
    };

    // Create router with CORS, body limit and request tracing
    let app = build_router(app_state)
        .layer(DefaultBodyLimit::max(config.server.max_upload_bytes))
        .layer(build_cors_layer(&config.server.cors_origins)?)
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);

    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Routes only; layers are applied by `run` so tests can drive the bare
/// router.
pub fn build_router(state: handlers::AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/classes", get(handlers::classes))
        .route("/predict", post(handlers::predict))
        .with_state(state)
}

fn build_cors_layer(origins: &[String]) -> Result<CorsLayer> {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .map(|origin| {
            origin
                .parse()
                .map_err(|_| Error::config(format!("invalid CORS origin: {}", origin)))
        })
        .collect::<Result<_>>()?;

    // Credentials are allowed, so methods/headers mirror the request
    // instead of using a wildcard.
    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600)))
}
