//! Model artifact persistence and offline training

use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use super::dataset::{load_dataset, YieldRecord};
use super::encoder::{FeatureEncoder, EXPECTED_FEATURES};
use super::tree::{RegressionTree, TreeParams};
use super::{ModelError, YieldFeatures};

/// Fraction of rows held out for evaluation
pub const TEST_FRACTION: f64 = 0.2;
/// Seed for the train/test shuffle
pub const SPLIT_SEED: u64 = 0;

/// Hold-out evaluation of a freshly trained model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrainingMetrics {
    pub mae: f64,
    pub rmse: f64,
    pub r2: f64,
    pub train_rows: usize,
    pub test_rows: usize,
}

/// Everything needed to reproduce predictions: the input schema, the fitted
/// encoder and the tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub feature_names: Vec<String>,
    pub encoder: FeatureEncoder,
    pub tree: RegressionTree,
    pub metrics: TrainingMetrics,
    pub trained_at: DateTime<Utc>,
}

impl ModelArtifact {
    /// An artifact that records no schema is accepted as-is
    pub fn has_expected_schema(&self) -> bool {
        if self.feature_names.is_empty() {
            return true;
        }
        let mut names: Vec<&str> = self.feature_names.iter().map(String::as_str).collect();
        let mut expected = EXPECTED_FEATURES.to_vec();
        names.sort_unstable();
        expected.sort_unstable();
        names == expected
    }

    /// Predicted yield in hg/ha
    pub fn predict(&self, features: &YieldFeatures) -> f64 {
        self.tree.predict(&self.encoder.encode(features))
    }

    pub fn read(path: &Path) -> Result<Self, ModelError> {
        if !path.exists() {
            return Err(ModelError::NotFound(path.to_path_buf()));
        }
        let file = fs::File::open(path)?;
        Ok(serde_json::from_reader(std::io::BufReader::new(file))?)
    }

    /// Write through a uniquely named sibling temp file so readers never see
    /// a partial artifact and concurrent writers never share one
    pub fn write(&self, path: &Path) -> Result<(), ModelError> {
        let parent = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(parent) => {
                fs::create_dir_all(parent)?;
                parent
            }
            None => Path::new("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            serde_json::to_writer(&mut writer, self)?;
            writer.flush()?;
        }
        tmp.persist(path).map_err(|e| ModelError::Io(e.error))?;
        Ok(())
    }
}

/// Train on `records` with a seeded 80/20 split
pub fn fit_artifact(records: &[YieldRecord], params: TreeParams) -> ModelArtifact {
    let mut order: Vec<usize> = (0..records.len()).collect();
    order.shuffle(&mut StdRng::seed_from_u64(SPLIT_SEED));

    // Too few rows to hold any out: evaluate on the training rows instead
    let test_len = if records.len() >= 5 {
        (records.len() as f64 * TEST_FRACTION).ceil() as usize
    } else {
        0
    };
    let (test_idx, train_idx) = order.split_at(test_len);

    let features: Vec<YieldFeatures> = records.iter().map(YieldFeatures::from).collect();
    let train_features: Vec<&YieldFeatures> = train_idx.iter().map(|&i| &features[i]).collect();
    let encoder = FeatureEncoder::fit(train_features.iter().copied());

    let train_rows: Vec<Vec<f64>> = train_features.iter().map(|f| encoder.encode(f)).collect();
    let train_targets: Vec<f64> = train_idx.iter().map(|&i| records[i].hg_per_ha).collect();
    let tree = RegressionTree::fit(&train_rows, &train_targets, params);

    let eval_idx = if test_idx.is_empty() { train_idx } else { test_idx };
    let (predicted, actual): (Vec<f64>, Vec<f64>) = eval_idx
        .iter()
        .map(|&i| (tree.predict(&encoder.encode(&features[i])), records[i].hg_per_ha))
        .unzip();

    let metrics = TrainingMetrics {
        train_rows: train_idx.len(),
        test_rows: test_idx.len(),
        ..evaluate(&predicted, &actual)
    };

    ModelArtifact {
        feature_names: EXPECTED_FEATURES.iter().map(|s| s.to_string()).collect(),
        encoder,
        tree,
        metrics,
        trained_at: Utc::now(),
    }
}

/// MAE, RMSE and R² of `predicted` against `actual`
pub fn evaluate(predicted: &[f64], actual: &[f64]) -> TrainingMetrics {
    let n = actual.len().max(1) as f64;
    let mean = actual.iter().sum::<f64>() / n;

    let mut abs_err = 0.0;
    let mut ss_res = 0.0;
    let mut ss_tot = 0.0;
    for (p, a) in predicted.iter().zip(actual) {
        abs_err += (p - a).abs();
        ss_res += (p - a).powi(2);
        ss_tot += (a - mean).powi(2);
    }

    let r2 = if ss_tot > 0.0 {
        1.0 - ss_res / ss_tot
    } else if ss_res == 0.0 {
        1.0
    } else {
        0.0
    };

    TrainingMetrics {
        mae: abs_err / n,
        rmse: (ss_res / n).sqrt(),
        r2,
        train_rows: 0,
        test_rows: actual.len(),
    }
}

/// Train from `dataset_path` and write the artifact to `output_path`
pub fn train_model(
    dataset_path: &Path,
    output_path: &Path,
    params: TreeParams,
) -> Result<TrainingMetrics, ModelError> {
    let records = load_dataset(dataset_path)?;
    let artifact = fit_artifact(&records, params);
    artifact.write(output_path)?;

    tracing::info!(
        "Trained yield model on {} rows (MAE {:.2}, RMSE {:.2}, R2 {:.4}), saved to {}",
        artifact.metrics.train_rows,
        artifact.metrics.mae,
        artifact.metrics.rmse,
        artifact.metrics.r2,
        output_path.display()
    );
    Ok(artifact.metrics)
}

/// Where the yield estimator gets its model from
pub trait ArtifactStore: Send + Sync {
    fn load(&self) -> Result<ModelArtifact, ModelError>;

    /// (Re)train and persist, replacing any existing artifact
    fn train(&self) -> Result<TrainingMetrics, ModelError>;

    fn describe(&self) -> String;
}

/// Artifact stored as JSON next to the CSV it is trained from
#[derive(Debug, Clone)]
pub struct FileArtifactStore {
    artifact_path: PathBuf,
    dataset_path: PathBuf,
    params: TreeParams,
}

impl FileArtifactStore {
    pub fn new(artifact_path: impl Into<PathBuf>, dataset_path: impl Into<PathBuf>) -> Self {
        Self {
            artifact_path: artifact_path.into(),
            dataset_path: dataset_path.into(),
            params: TreeParams::default(),
        }
    }

    pub fn with_params(mut self, params: TreeParams) -> Self {
        self.params = params;
        self
    }

    pub fn artifact_path(&self) -> &Path {
        &self.artifact_path
    }
}

impl ArtifactStore for FileArtifactStore {
    fn load(&self) -> Result<ModelArtifact, ModelError> {
        ModelArtifact::read(&self.artifact_path)
    }

    fn train(&self) -> Result<TrainingMetrics, ModelError> {
        train_model(&self.dataset_path, &self.artifact_path, self.params)
    }

    fn describe(&self) -> String {
        self.artifact_path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(area: &str, item: &str, rainfall: f64, hg: f64) -> YieldRecord {
        YieldRecord {
            area: area.to_string(),
            item: item.to_string(),
            year: 2000,
            hg_per_ha: hg,
            average_rain_fall_mm_per_year: rainfall,
            pesticides_tonnes: 10.0,
            avg_temp: 20.0,
        }
    }

    #[test]
    fn test_evaluate_perfect_and_constant() {
        let m = evaluate(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]);
        assert_eq!(m.mae, 0.0);
        assert_eq!(m.r2, 1.0);

        let m = evaluate(&[2.0, 2.0], &[1.0, 3.0]);
        assert_eq!(m.mae, 1.0);
        assert_eq!(m.rmse, 1.0);
        assert_eq!(m.r2, 0.0);
    }

    #[test]
    fn test_split_is_deterministic() {
        let records: Vec<YieldRecord> = (0..20)
            .map(|i| record("Kenya", "Maize", 100.0 * i as f64, 1000.0 * i as f64))
            .collect();
        let a = fit_artifact(&records, TreeParams::default());
        let b = fit_artifact(&records, TreeParams::default());
        assert_eq!(a.tree, b.tree);
        assert_eq!(a.metrics.test_rows, 4);
        assert_eq!(a.metrics.train_rows, 16);
    }

    #[test]
    fn test_schema_check_ignores_order() {
        let records = vec![record("Kenya", "Maize", 500.0, 20000.0), record("Chad", "Wheat", 800.0, 30000.0)];
        let mut artifact = fit_artifact(&records, TreeParams::default());
        assert!(artifact.has_expected_schema());

        artifact.feature_names.reverse();
        assert!(artifact.has_expected_schema());

        artifact.feature_names.pop();
        assert!(!artifact.has_expected_schema());

        artifact.feature_names.clear();
        assert!(artifact.has_expected_schema());
    }

    #[test]
    fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("model.json");
        let records = vec![record("Kenya", "Maize", 500.0, 20000.0), record("Chad", "Wheat", 800.0, 30000.0)];
        let artifact = fit_artifact(&records, TreeParams::default());
        artifact.write(&path).unwrap();

        let restored = ModelArtifact::read(&path).unwrap();
        assert_eq!(restored.tree, artifact.tree);
        assert!(matches!(
            ModelArtifact::read(&dir.path().join("missing.json")),
            Err(ModelError::NotFound(_))
        ));
    }

    #[test]
    fn test_concurrent_writes_leave_a_readable_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        let records = vec![record("Kenya", "Maize", 500.0, 20000.0), record("Chad", "Wheat", 800.0, 30000.0)];
        let artifact = fit_artifact(&records, TreeParams::default());

        std::thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| artifact.write(&path).unwrap());
            }
        });

        let restored = ModelArtifact::read(&path).unwrap();
        assert_eq!(restored.tree, artifact.tree);
        let leftovers = fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(leftovers, 1);
    }
}
