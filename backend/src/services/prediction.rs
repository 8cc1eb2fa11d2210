//! Prediction pipeline orchestration

use std::sync::Arc;

use shared::{
    assess_food_security, build_planting_schedule, classify_risk, clamp_history_limit,
    HealthResponse, HistoryItem, PredictionInput, PredictionRecord, PredictionResponse,
};
use validator::Validate;

use super::advisory::{AdvisoryContext, AdvisoryService};
use super::history::PredictionStore;
use super::yield_estimator::YieldEstimator;
use crate::error::{AppError, AppResult};
use crate::ml::ModelError;

/// Runs estimation, the rule engines and advisory generation for one
/// request, then records the result.
#[derive(Clone)]
pub struct PredictionService {
    estimator: YieldEstimator,
    advisory: AdvisoryService,
    store: Arc<dyn PredictionStore>,
}

impl PredictionService {
    pub fn new(
        estimator: YieldEstimator,
        advisory: AdvisoryService,
        store: Arc<dyn PredictionStore>,
    ) -> Self {
        Self {
            estimator,
            advisory,
            store,
        }
    }

    pub fn estimator(&self) -> &YieldEstimator {
        &self.estimator
    }

    pub async fn predict(&self, input: PredictionInput) -> AppResult<PredictionResponse> {
        input.validate()?;

        let estimate = self.estimator.estimate(&input).await.map_err(|e| match e {
            ModelError::InvalidFeatures(msg) => AppError::ValidationError(msg),
            other => AppError::EstimationUnavailable(other.to_string()),
        })?;

        let risk = classify_risk(&input);
        let schedule = build_planting_schedule(&input);
        let food_security = assess_food_security(&input, estimate.t_per_ha, risk.level);

        let advisory = self
            .advisory
            .generate(AdvisoryContext {
                input: &input,
                predicted_yield_t_ha: estimate.t_per_ha,
                risk_level: risk.level,
                schedule: &schedule,
                food_security_level: food_security.level,
            })
            .await;

        tracing::info!(
            area = %input.area,
            item = %input.item,
            yield_t_ha = estimate.t_per_ha,
            risk = %risk.level,
            advisory_source = %advisory.source,
            "Prediction completed"
        );

        let response = PredictionResponse {
            predicted_yield_hg_ha: estimate.hg_per_ha,
            predicted_yield_t_ha: estimate.t_per_ha,
            risk_level: risk.level,
            warnings: risk.warnings,
            expected_production_tons: food_security.expected_production_tons,
            food_security_level: food_security.level,
            food_security_notes: food_security.notes,
            planting_schedule: schedule,
            advisory: advisory.text,
        };

        let record = PredictionRecord::new(input, response);
        if let Err(e) = self.store.save(&record).await {
            tracing::warn!("Prediction was generated but could not be persisted: {}", e);
        }

        Ok(record.response)
    }

    /// Most recent predictions, newest first
    pub async fn history(&self, limit: Option<i64>) -> Vec<HistoryItem> {
        let limit = clamp_history_limit(limit);
        match self.store.recent(limit).await {
            Ok(items) => items,
            Err(e) => {
                tracing::warn!("Failed to read prediction history: {}", e);
                Vec::new()
            }
        }
    }

    pub fn health(&self) -> HealthResponse {
        HealthResponse::new(self.estimator.is_loaded(), self.store.is_ready())
    }
}
