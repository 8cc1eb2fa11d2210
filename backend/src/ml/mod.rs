//! Yield regression model: dataset loading, feature encoding, tree fitting
//! and the on-disk artifact consumed by the yield estimator.

pub mod artifact;
pub mod dataset;
pub mod encoder;
pub mod tree;

use std::path::PathBuf;

use shared::PredictionInput;
use thiserror::Error;

pub use artifact::{train_model, ArtifactStore, FileArtifactStore, ModelArtifact, TrainingMetrics};
pub use dataset::{load_dataset, YieldRecord};
pub use encoder::{FeatureEncoder, EXPECTED_FEATURES};
pub use tree::{RegressionTree, TreeParams};

/// Errors raised while loading, training or evaluating the yield model
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Model artifact not found at {0}")]
    NotFound(PathBuf),

    #[error("Training dataset {0} contains no rows")]
    EmptyDataset(PathBuf),

    #[error("Invalid features: {0}")]
    InvalidFeatures(String),

    #[error("Model unavailable: {0}")]
    Unavailable(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Dataset error: {0}")]
    Dataset(#[from] csv::Error),

    #[error("Artifact serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// The six inputs the regressor is trained on
#[derive(Debug, Clone, PartialEq)]
pub struct YieldFeatures {
    pub area: String,
    pub item: String,
    pub year: i32,
    pub rainfall_mm: f64,
    pub pesticides_tonnes: f64,
    pub avg_temp_c: f64,
}

impl YieldFeatures {
    pub fn from_input(input: &PredictionInput) -> Result<Self, ModelError> {
        let area = input.area.trim();
        let item = input.item.trim();
        if area.is_empty() {
            return Err(ModelError::InvalidFeatures("area is required".to_string()));
        }
        if item.is_empty() {
            return Err(ModelError::InvalidFeatures("item is required".to_string()));
        }

        let numeric = [
            ("average_rain_fall_mm_per_year", input.avg_rainfall_mm_per_year),
            ("pesticides_tonnes", input.pesticides_tonnes),
            ("avg_temp", input.avg_temp_c),
        ];
        if let Some((name, _)) = numeric.iter().find(|(_, v)| !v.is_finite()) {
            return Err(ModelError::InvalidFeatures(format!("{} must be a finite number", name)));
        }

        Ok(Self {
            area: area.to_string(),
            item: item.to_string(),
            year: input.year,
            rainfall_mm: input.avg_rainfall_mm_per_year,
            pesticides_tonnes: input.pesticides_tonnes,
            avg_temp_c: input.avg_temp_c,
        })
    }
}

impl From<&YieldRecord> for YieldFeatures {
    fn from(record: &YieldRecord) -> Self {
        Self {
            area: record.area.clone(),
            item: record.item.clone(),
            year: record.year,
            rainfall_mm: record.average_rain_fall_mm_per_year,
            pesticides_tonnes: record.pesticides_tonnes,
            avg_temp_c: record.avg_temp,
        }
    }
}
