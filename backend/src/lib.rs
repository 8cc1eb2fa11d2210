//! AgriSmart yield advisory backend
//!
//! Predicts crop yield from growing conditions, classifies production risk,
//! assesses food security, plans planting and writes a farmer advisory.

use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method},
    routing::get,
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod config;
pub mod error;
pub mod external;
pub mod handlers;
pub mod ml;
pub mod routes;
pub mod services;

pub use crate::config::Config;
pub use crate::error::{AppError, AppResult};

use external::LlmBackend;
use ml::{FileArtifactStore, TreeParams};
use services::{
    AdvisoryService, CropRanker, PredictionService, PredictionStore, SqlitePredictionStore,
    YieldEstimator,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub predictions: Arc<PredictionService>,
}

impl AppState {
    /// Wire every service from configuration. Fails only on an unknown LLM
    /// provider; an unavailable database leaves history disabled.
    pub async fn from_config(config: Config) -> AppResult<Self> {
        let generator = Arc::new(LlmBackend::from_config(&config.llm)?);

        let artifacts = FileArtifactStore::new(&config.model.artifact_path, &config.model.dataset_path)
            .with_params(TreeParams::with_max_depth(config.model.max_depth));
        let estimator = YieldEstimator::new(Arc::new(artifacts));

        let store: Arc<dyn PredictionStore> = Arc::new(
            SqlitePredictionStore::open(&config.database.path, config.database.max_connections).await,
        );

        let advisory = AdvisoryService::new(
            generator,
            CropRanker::new(estimator.clone()),
            config.llm.timeout(),
        );

        Ok(Self {
            config: Arc::new(config),
            predictions: Arc::new(PredictionService::new(estimator, advisory, store)),
        })
    }
}

/// Create the application router with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    let origins: Vec<HeaderValue> = state
        .config
        .cors_origins()
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true);

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health_check))
        .nest("/api/v1", routes::api_routes())
        // Unversioned paths used by the existing web client
        .merge(routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
