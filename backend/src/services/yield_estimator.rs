//! Yield estimation backed by a lazily loaded model artifact

use std::sync::{Arc, Mutex};

use shared::{PredictionInput, YieldEstimate};
use tokio::sync::OnceCell;

use crate::ml::{ArtifactStore, ModelArtifact, ModelError, YieldFeatures};

/// Loads the model on first use and serves predictions from it.
///
/// Concurrent first calls wait on the same initialization, so the artifact
/// is loaded (or trained) exactly once. A failed initialization leaves the
/// cell empty and the next call tries again.
///
/// The blocking loader keeps running when its caller is dropped, so loads
/// are serialized behind `loader`. A caller that gives up mid-training
/// leaves the artifact on disk for the next one to pick up.
#[derive(Clone)]
pub struct YieldEstimator {
    store: Arc<dyn ArtifactStore>,
    model: Arc<OnceCell<Arc<ModelArtifact>>>,
    loader: Arc<Mutex<()>>,
}

impl YieldEstimator {
    pub fn new(store: Arc<dyn ArtifactStore>) -> Self {
        Self {
            store,
            model: Arc::new(OnceCell::new()),
            loader: Arc::new(Mutex::new(())),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.model.initialized()
    }

    /// Make sure the model is in memory, training it if needed
    pub async fn preload(&self) -> Result<(), ModelError> {
        self.model().await.map(|_| ())
    }

    /// Predicted yield for the input's six model features
    pub async fn estimate(&self, input: &PredictionInput) -> Result<YieldEstimate, ModelError> {
        let features = YieldFeatures::from_input(input)?;
        let model = self.model().await?;
        Ok(YieldEstimate::from_hg_per_ha(model.predict(&features)))
    }

    async fn model(&self) -> Result<&Arc<ModelArtifact>, ModelError> {
        self.model
            .get_or_try_init(|| {
                let store = Arc::clone(&self.store);
                let loader = Arc::clone(&self.loader);
                async move {
                    tokio::task::spawn_blocking(move || {
                        // A poisoned lock only means an earlier loader panicked
                        let _guard = loader.lock().unwrap_or_else(|e| e.into_inner());
                        load_or_train(store.as_ref())
                    })
                        .await
                        .map_err(|e| ModelError::Unavailable(format!("model loader panicked: {}", e)))?
                        .map(Arc::new)
                }
            })
            .await
    }
}

/// Load the artifact, training it first when it is missing and retraining
/// once when its recorded schema does not match the expected features.
fn load_or_train(store: &dyn ArtifactStore) -> Result<ModelArtifact, ModelError> {
    let artifact = match store.load() {
        Ok(artifact) => artifact,
        Err(ModelError::NotFound(path)) => {
            tracing::warn!("Model artifact missing at {}, training a new one", path.display());
            store.train()?;
            store.load()?
        }
        Err(e) => return Err(e),
    };

    if artifact.has_expected_schema() {
        tracing::info!("Yield model loaded from {}", store.describe());
        return Ok(artifact);
    }

    tracing::warn!(
        "Model artifact at {} has features {:?}, retraining",
        store.describe(),
        artifact.feature_names
    );
    store.train()?;
    let artifact = store.load()?;
    if !artifact.has_expected_schema() {
        return Err(ModelError::Unavailable(
            "retrained artifact still has an unexpected feature schema".to_string(),
        ));
    }
    Ok(artifact)
}
