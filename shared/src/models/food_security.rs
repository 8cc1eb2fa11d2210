//! Food security assessment

use serde::{Deserialize, Serialize};

use super::prediction::PredictionInput;
use super::risk::RiskLevel;

/// Default baseline yield for crops without a reference value (t/ha)
pub const DEFAULT_BASELINE_T_HA: f64 = 3.5;

/// Reference yields per crop (t/ha)
const BASELINE_YIELDS_T_HA: &[(&str, f64)] = &[
    ("maize", 4.0),
    ("rice", 4.5),
    ("wheat", 3.8),
    ("soybeans", 2.8),
    ("potatoes", 20.0),
];

/// Food security tier
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum FoodSecurityLevel {
    Secure,
    Watch,
    Critical,
}

impl FoodSecurityLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            FoodSecurityLevel::Secure => "Secure",
            FoodSecurityLevel::Watch => "Watch",
            FoodSecurityLevel::Critical => "Critical",
        }
    }

    /// The two advisory notes attached to each tier
    pub fn notes(&self) -> [&'static str; 2] {
        match self {
            FoodSecurityLevel::Critical => [
                "Projected output is vulnerable; local food supply risk is elevated.",
                "Prioritize water, pest, and crop-diversification contingency measures.",
            ],
            FoodSecurityLevel::Watch => [
                "Projected output needs close monitoring to avoid seasonal shortages.",
                "Apply timely interventions in irrigation, pest control, and planting window.",
            ],
            FoodSecurityLevel::Secure => [
                "Projected output supports stable contribution to local food availability.",
                "Maintain current practices and continue preventive monitoring.",
            ],
        }
    }
}

impl std::fmt::Display for FoodSecurityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FoodSecurityAssessment {
    pub level: FoodSecurityLevel,
    pub expected_production_tons: f64,
    pub notes: Vec<String>,
}

/// Baseline yield for a crop, matched case-insensitively
pub fn baseline_yield_t_ha(item: &str) -> f64 {
    let key = item.to_lowercase();
    BASELINE_YIELDS_T_HA
        .iter()
        .find(|(crop, _)| *crop == key)
        .map(|(_, baseline)| *baseline)
        .unwrap_or(DEFAULT_BASELINE_T_HA)
}

/// Combine the yield estimate, farm area and risk tier into a food security tier
pub fn assess_food_security(
    input: &PredictionInput,
    predicted_yield_t_ha: f64,
    risk: RiskLevel,
) -> FoodSecurityAssessment {
    let expected_production_tons = predicted_yield_t_ha * input.farm_area_hectares;

    let baseline = baseline_yield_t_ha(&input.item);
    let adequacy = if baseline > 0.0 {
        predicted_yield_t_ha / baseline
    } else {
        0.0
    };

    let level = if risk == RiskLevel::High || adequacy < 0.6 {
        FoodSecurityLevel::Critical
    } else if risk == RiskLevel::Medium || adequacy < 0.85 {
        FoodSecurityLevel::Watch
    } else {
        FoodSecurityLevel::Secure
    };

    FoodSecurityAssessment {
        level,
        expected_production_tons,
        notes: level.notes().iter().map(|n| n.to_string()).collect(),
    }
}
