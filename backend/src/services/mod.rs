//! Business logic services for the AgriSmart yield advisory platform

pub mod advisory;
pub mod crop_ranking;
pub mod history;
pub mod prediction;
pub mod yield_estimator;

pub use advisory::{Advisory, AdvisoryContext, AdvisoryService, AdvisorySource};
pub use crop_ranking::CropRanker;
pub use history::{PredictionStore, SqlitePredictionStore};
pub use prediction::PredictionService;
pub use yield_estimator::YieldEstimator;
