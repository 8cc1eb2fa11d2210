//! Helpers shared by the backend integration tests
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use agrismart_backend::config::{
    Config, CorsConfig, DatabaseConfig, GroqConfig, LlmConfig, ModelConfig, OllamaConfig,
    ServerConfig,
};
use agrismart_backend::error::{AppError, AppResult};
use agrismart_backend::external::{LlmError, TextGenerator};
use agrismart_backend::ml::{ArtifactStore, FileArtifactStore, ModelArtifact, ModelError, TrainingMetrics};
use agrismart_backend::services::{
    AdvisoryService, CropRanker, PredictionService, PredictionStore, YieldEstimator,
};
use async_trait::async_trait;
use shared::{HistoryItem, PredictionInput, PredictionRecord};

pub fn fixture_dataset() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/yield_sample.csv")
}

pub fn india_maize() -> PredictionInput {
    PredictionInput::new("India", "Maize", 2013, 1083.0, 121.0, 26.5)
}

/// File store that counts how often it is loaded and trained
pub struct CountingStore {
    inner: FileArtifactStore,
    pub loads: AtomicUsize,
    pub trains: AtomicUsize,
}

impl CountingStore {
    pub fn new(artifact_path: &Path, dataset_path: &Path) -> Self {
        Self {
            inner: FileArtifactStore::new(artifact_path, dataset_path),
            loads: AtomicUsize::new(0),
            trains: AtomicUsize::new(0),
        }
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    pub fn trains(&self) -> usize {
        self.trains.load(Ordering::SeqCst)
    }
}

impl ArtifactStore for CountingStore {
    fn load(&self) -> Result<ModelArtifact, ModelError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        self.inner.load()
    }

    fn train(&self) -> Result<TrainingMetrics, ModelError> {
        self.trains.fetch_add(1, Ordering::SeqCst);
        // Widen the window in which concurrent callers could race
        std::thread::sleep(Duration::from_millis(50));
        self.inner.train()
    }

    fn describe(&self) -> String {
        self.inner.describe()
    }
}

/// Estimator trained from the fixture dataset into `dir`
pub fn fixture_estimator(dir: &Path) -> YieldEstimator {
    let store = FileArtifactStore::new(dir.join("model.json"), fixture_dataset());
    YieldEstimator::new(Arc::new(store))
}

/// Generator returning a fixed text and recording prompts
#[derive(Default)]
pub struct StaticGenerator {
    pub text: String,
    pub prompts: Mutex<Vec<String>>,
}

impl StaticGenerator {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            prompts: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl TextGenerator for StaticGenerator {
    async fn complete(&self, prompt: &str, _timeout: Duration) -> Result<String, LlmError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(self.text.clone())
    }

    fn name(&self) -> &'static str {
        "static"
    }
}

/// Generator that always fails
#[derive(Default)]
pub struct FailingGenerator {
    pub calls: AtomicUsize,
}

#[async_trait]
impl TextGenerator for FailingGenerator {
    async fn complete(&self, _prompt: &str, _timeout: Duration) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(LlmError::Status {
            status: 502,
            body: "bad gateway".to_string(),
        })
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}

/// Generator that ignores its timeout and answers late
pub struct SlowGenerator(pub Duration);

#[async_trait]
impl TextGenerator for SlowGenerator {
    async fn complete(&self, _prompt: &str, _timeout: Duration) -> Result<String, LlmError> {
        tokio::time::sleep(self.0).await;
        Ok("too late".to_string())
    }

    fn name(&self) -> &'static str {
        "slow"
    }
}

/// History store whose database is permanently unavailable
#[derive(Default)]
pub struct FailingStore {
    pub saves: AtomicUsize,
}

#[async_trait]
impl PredictionStore for FailingStore {
    async fn save(&self, _record: &PredictionRecord) -> AppResult<i64> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        Err(AppError::StorageError("disk full".to_string()))
    }

    async fn recent(&self, _limit: u32) -> AppResult<Vec<HistoryItem>> {
        Err(AppError::StorageError("disk full".to_string()))
    }

    fn is_ready(&self) -> bool {
        false
    }
}

pub fn prediction_service(
    estimator: YieldEstimator,
    generator: Arc<dyn TextGenerator>,
    store: Arc<dyn PredictionStore>,
) -> PredictionService {
    let advisory = AdvisoryService::new(
        generator,
        CropRanker::new(estimator.clone()),
        Duration::from_secs(5),
    );
    PredictionService::new(estimator, advisory, store)
}

pub fn test_config(dir: &Path) -> Config {
    Config {
        environment: "test".to_string(),
        server: ServerConfig {
            port: 0,
            host: "127.0.0.1".to_string(),
        },
        database: DatabaseConfig {
            path: dir.join("agrismart.db"),
            max_connections: 1,
        },
        model: ModelConfig {
            artifact_path: dir.join("model.json"),
            dataset_path: fixture_dataset(),
            max_depth: None,
        },
        llm: LlmConfig {
            provider: "ollama".to_string(),
            timeout_seconds: 5,
            ollama: OllamaConfig {
                base_url: "http://127.0.0.1:9".to_string(),
                model: "llama3.1:8b".to_string(),
            },
            groq: GroqConfig {
                api_key: None,
                model: "llama-3.1-8b-instant".to_string(),
                base_url: "https://api.groq.com/openai/v1".to_string(),
            },
        },
        cors: CorsConfig {
            origins: "http://localhost:5173".to_string(),
        },
        log_level: "info".to_string(),
        log_json: false,
    }
}
