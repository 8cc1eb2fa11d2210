//! Yield estimator integration tests
//!
//! Covers artifact bootstrap, schema-mismatch retraining, single
//! initialization under concurrency and inference properties.

mod common;

use std::sync::Arc;
use std::time::Duration;

use agrismart_backend::ml::{ModelArtifact, ModelError};
use agrismart_backend::services::YieldEstimator;
use common::{fixture_dataset, fixture_estimator, india_maize, CountingStore};
use proptest::prelude::*;
use shared::PredictionInput;

#[tokio::test]
async fn test_missing_artifact_is_trained_then_loaded() {
    let dir = tempfile::tempdir().unwrap();
    let artifact_path = dir.path().join("models").join("model.json");
    let store = Arc::new(CountingStore::new(&artifact_path, &fixture_dataset()));
    let estimator = YieldEstimator::new(store.clone());

    assert!(!estimator.is_loaded());
    let estimate = estimator.estimate(&india_maize()).await.unwrap();

    assert!(estimator.is_loaded());
    assert!(artifact_path.exists());
    assert_eq!(store.trains(), 1);
    assert_eq!(store.loads(), 2);
    assert!(estimate.hg_per_ha > 0.0);
    assert_eq!(estimate.t_per_ha, estimate.hg_per_ha / 10_000.0);
}

#[tokio::test]
async fn test_existing_artifact_is_not_retrained() {
    let dir = tempfile::tempdir().unwrap();
    let artifact_path = dir.path().join("model.json");
    fixture_estimator(dir.path()).preload().await.unwrap();

    let store = Arc::new(CountingStore::new(&artifact_path, &fixture_dataset()));
    let estimator = YieldEstimator::new(store.clone());
    estimator.preload().await.unwrap();

    assert_eq!(store.trains(), 0);
    assert_eq!(store.loads(), 1);
}

#[tokio::test]
async fn test_schema_mismatch_triggers_one_retrain() {
    let dir = tempfile::tempdir().unwrap();
    let artifact_path = dir.path().join("model.json");
    fixture_estimator(dir.path()).preload().await.unwrap();

    let mut artifact = ModelArtifact::read(&artifact_path).unwrap();
    artifact.feature_names = vec!["Area".to_string(), "Item".to_string(), "Year".to_string()];
    artifact.write(&artifact_path).unwrap();

    let store = Arc::new(CountingStore::new(&artifact_path, &fixture_dataset()));
    let estimator = YieldEstimator::new(store.clone());
    estimator.estimate(&india_maize()).await.unwrap();

    assert_eq!(store.trains(), 1);
    assert_eq!(store.loads(), 2);
    assert!(ModelArtifact::read(&artifact_path).unwrap().has_expected_schema());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_first_calls_load_once() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(CountingStore::new(&dir.path().join("model.json"), &fixture_dataset()));
    let estimator = YieldEstimator::new(store.clone());

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let estimator = estimator.clone();
            tokio::spawn(async move { estimator.estimate(&india_maize()).await })
        })
        .collect();

    let mut values = Vec::new();
    for task in tasks {
        values.push(task.await.unwrap().unwrap().hg_per_ha);
    }

    assert_eq!(store.trains(), 1);
    assert_eq!(store.loads(), 2);
    assert!(values.windows(2).all(|w| w[0] == w[1]));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_abandoned_first_call_does_not_train_twice() {
    let dir = tempfile::tempdir().unwrap();
    let artifact_path = dir.path().join("model.json");
    let store = Arc::new(CountingStore::new(&artifact_path, &fixture_dataset()));
    let estimator = YieldEstimator::new(store.clone());

    let first = tokio::time::timeout(Duration::from_millis(5), estimator.estimate(&india_maize())).await;
    assert!(first.is_err(), "training should outlast the timeout");
    assert!(!estimator.is_loaded());

    let estimate = estimator.estimate(&india_maize()).await.unwrap();
    assert!(estimate.hg_per_ha > 0.0);
    assert_eq!(store.trains(), 1);
    assert!(ModelArtifact::read(&artifact_path).unwrap().has_expected_schema());
}

#[tokio::test]
async fn test_failed_initialization_is_retried() {
    let dir = tempfile::tempdir().unwrap();
    let dataset = dir.path().join("yield_df.csv");
    let store = Arc::new(CountingStore::new(&dir.path().join("model.json"), &dataset));
    let estimator = YieldEstimator::new(store.clone());

    let err = estimator.estimate(&india_maize()).await.unwrap_err();
    assert!(matches!(err, ModelError::Dataset(_) | ModelError::Io(_)), "unexpected {:?}", err);
    assert!(!estimator.is_loaded());

    std::fs::copy(fixture_dataset(), &dataset).unwrap();
    estimator.estimate(&india_maize()).await.unwrap();
    assert!(estimator.is_loaded());
    assert_eq!(store.trains(), 2);
}

#[tokio::test]
async fn test_unknown_categories_still_predict() {
    let dir = tempfile::tempdir().unwrap();
    let estimator = fixture_estimator(dir.path());

    let input = PredictionInput::new("Atlantis", "Quinoa", 2020, 900.0, 10.0, 22.0);
    let estimate = estimator.estimate(&input).await.unwrap();
    assert!(estimate.hg_per_ha.is_finite());
}

#[tokio::test]
async fn test_blank_categorical_is_invalid() {
    let dir = tempfile::tempdir().unwrap();
    let estimator = fixture_estimator(dir.path());

    let mut input = india_maize();
    input.item = String::new();
    let err = estimator.estimate(&input).await.unwrap_err();
    assert!(matches!(err, ModelError::InvalidFeatures(_)));

    let mut input = india_maize();
    input.avg_temp_c = f64::NAN;
    let err = estimator.estimate(&input).await.unwrap_err();
    assert!(matches!(err, ModelError::InvalidFeatures(_)));
}

#[tokio::test]
async fn test_farm_area_does_not_affect_yield() {
    let dir = tempfile::tempdir().unwrap();
    let estimator = fixture_estimator(dir.path());

    let small = estimator.estimate(&india_maize()).await.unwrap();
    let large = estimator.estimate(&india_maize().with_farm_area(500.0)).await.unwrap();
    assert_eq!(small, large);
}

#[test]
fn test_estimates_are_deterministic() {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let estimator = fixture_estimator(dir.path());
    runtime.block_on(estimator.preload()).unwrap();

    proptest!(|(
        rainfall in 0.0f64..3000.0,
        pesticides in 0.0f64..100_000.0,
        temp in -5.0f64..45.0,
        year in 1990i32..2030
    )| {
        let input = PredictionInput::new("Kenya", "Sorghum", year, rainfall, pesticides, temp);
        let first = runtime.block_on(estimator.estimate(&input)).unwrap();
        let second = runtime.block_on(estimator.estimate(&input)).unwrap();
        prop_assert_eq!(first, second);
        prop_assert!(first.hg_per_ha >= 0.0);
    });
}
