//! Production risk classification

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::prediction::PredictionInput;

/// Production risk tier
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Tier for an accumulated risk score
    pub fn from_score(score: u32) -> Self {
        match score {
            0 => RiskLevel::Low,
            1..=2 => RiskLevel::Medium,
            _ => RiskLevel::High,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Unknown risk level: {0}")]
pub struct ParseRiskLevelError(pub String);

impl std::str::FromStr for RiskLevel {
    type Err = ParseRiskLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Low" => Ok(RiskLevel::Low),
            "Medium" => Ok(RiskLevel::Medium),
            "High" => Ok(RiskLevel::High),
            other => Err(ParseRiskLevelError(other.to_string())),
        }
    }
}

/// Risk tier plus the warnings that raised it, in rule order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RiskAssessment {
    pub level: RiskLevel,
    pub score: u32,
    pub warnings: Vec<String>,
}

pub const DROUGHT_WARNING: &str =
    "Rainfall is below recommended level; drought stress may reduce yield.";
pub const IRRIGATION_BACKUP_WARNING: &str = "Rainfall is moderate; irrigation backup is advised.";
pub const TEMPERATURE_WARNING: &str =
    "Average temperature is outside the optimal range for many crops.";
pub const PEST_SCOUTING_WARNING: &str =
    "Very low pesticide usage detected; strengthen pest scouting and IPM plan.";

/// Score rainfall, temperature and pesticide inputs.
///
/// Rules are evaluated in a fixed order and warnings keep that order:
/// rainfall (<500 mm: +2, <800 mm: +1), temperature outside 12-35 °C (+1),
/// pesticides below 2 tonnes (+1).
pub fn classify_risk(input: &PredictionInput) -> RiskAssessment {
    let mut score = 0;
    let mut warnings = Vec::new();

    if input.avg_rainfall_mm_per_year < 500.0 {
        score += 2;
        warnings.push(DROUGHT_WARNING.to_string());
    } else if input.avg_rainfall_mm_per_year < 800.0 {
        score += 1;
        warnings.push(IRRIGATION_BACKUP_WARNING.to_string());
    }

    if input.avg_temp_c > 35.0 || input.avg_temp_c < 12.0 {
        score += 1;
        warnings.push(TEMPERATURE_WARNING.to_string());
    }

    if input.pesticides_tonnes < 2.0 {
        score += 1;
        warnings.push(PEST_SCOUTING_WARNING.to_string());
    }

    RiskAssessment {
        level: RiskLevel::from_score(score),
        score,
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn input(rainfall: f64, temp: f64, pesticides: f64) -> PredictionInput {
        PredictionInput::new("Kenya", "Maize", 2012, rainfall, pesticides, temp)
    }

    #[test]
    fn test_drought_alone_is_medium() {
        let risk = classify_risk(&input(400.0, 20.0, 5.0));
        assert_eq!(risk.score, 2);
        assert_eq!(risk.level, RiskLevel::Medium);
        assert_eq!(risk.warnings, vec![DROUGHT_WARNING.to_string()]);
    }

    #[test]
    fn test_all_rules_trigger_in_order() {
        let risk = classify_risk(&input(400.0, 40.0, 1.0));
        assert_eq!(risk.score, 4);
        assert_eq!(risk.level, RiskLevel::High);
        assert_eq!(
            risk.warnings,
            vec![
                DROUGHT_WARNING.to_string(),
                TEMPERATURE_WARNING.to_string(),
                PEST_SCOUTING_WARNING.to_string(),
            ]
        );
    }

    #[test]
    fn test_good_conditions_are_low() {
        let risk = classify_risk(&input(1200.0, 24.0, 50.0));
        assert_eq!(risk.level, RiskLevel::Low);
        assert!(risk.warnings.is_empty());
    }

    #[test]
    fn test_boundaries() {
        // 500 mm is moderate, 800 mm is fine
        assert_eq!(classify_risk(&input(500.0, 20.0, 5.0)).score, 1);
        assert_eq!(classify_risk(&input(800.0, 20.0, 5.0)).score, 0);
        // 35 and 12 °C are inside the optimal range
        assert_eq!(classify_risk(&input(900.0, 35.0, 5.0)).score, 0);
        assert_eq!(classify_risk(&input(900.0, 12.0, 5.0)).score, 0);
        assert_eq!(classify_risk(&input(900.0, 20.0, 2.0)).score, 0);
    }

    #[test]
    fn test_round_trip_level_names() {
        for level in [RiskLevel::Low, RiskLevel::Medium, RiskLevel::High] {
            assert_eq!(level.as_str().parse::<RiskLevel>().unwrap(), level);
        }
        assert!("Severe".parse::<RiskLevel>().is_err());
    }

    proptest! {
        #[test]
        fn prop_level_follows_score(
            rainfall in 0.0f64..3000.0,
            temp in -10.0f64..50.0,
            pesticides in 0.0f64..20.0,
        ) {
            let risk = classify_risk(&input(rainfall, temp, pesticides));
            prop_assert_eq!(risk.level, RiskLevel::from_score(risk.score));
            prop_assert!(risk.score <= 4);
            prop_assert!(risk.warnings.len() <= 3);
            prop_assert_eq!(risk.warnings.is_empty(), risk.score == 0);
        }
    }
}
