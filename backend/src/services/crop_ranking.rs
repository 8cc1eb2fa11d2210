//! Re-ranks the reference grains under the conditions of a request

use futures::future::join_all;
use shared::{CropRanking, PredictionInput, GRAIN_CANDIDATES};

use super::yield_estimator::YieldEstimator;

#[derive(Clone)]
pub struct CropRanker {
    estimator: YieldEstimator,
    candidates: Vec<String>,
}

impl CropRanker {
    pub fn new(estimator: YieldEstimator) -> Self {
        Self::with_candidates(estimator, GRAIN_CANDIDATES.iter().map(|c| c.to_string()))
    }

    pub fn with_candidates<I>(estimator: YieldEstimator, candidates: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        Self {
            estimator,
            candidates: candidates.into_iter().collect(),
        }
    }

    /// Estimate every candidate with only the crop swapped. Candidates that
    /// fail to estimate are left out of the ranking.
    pub async fn rank(&self, input: &PredictionInput) -> CropRanking {
        let estimates = join_all(self.candidates.iter().map(|crop| {
            let candidate = input.with_item(crop);
            async move {
                match self.estimator.estimate(&candidate).await {
                    Ok(estimate) => Some(estimate.t_per_ha),
                    Err(e) => {
                        tracing::debug!("Unable to score candidate grain {}: {}", crop, e);
                        None
                    }
                }
            }
        }))
        .await;

        let ranking = CropRanking::from_candidates(self.candidates.iter().cloned().zip(estimates));
        if ranking.skipped > 0 {
            tracing::debug!(
                "Ranked {} candidate grains, skipped {}",
                ranking.entries.len(),
                ranking.skipped
            );
        }
        ranking
    }
}
