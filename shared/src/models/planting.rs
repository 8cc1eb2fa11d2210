//! Planting and irrigation schedule

use serde::{Deserialize, Serialize};

use super::prediction::PredictionInput;

pub const WEEKLY_REVIEW_ACTION: &str =
    "Review weather forecast weekly and adjust irrigation/fertilizer timing.";

/// Recommended sowing window, irrigation plan and follow-up actions
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlantingSchedule {
    pub recommended_window: String,
    pub irrigation_plan: String,
    pub actions: Vec<String>,
}

/// Build a planting schedule from the rainfall band and temperature/pesticide flags
pub fn build_planting_schedule(input: &PredictionInput) -> PlantingSchedule {
    let rainfall = input.avg_rainfall_mm_per_year;

    let (window, irrigation) = if rainfall >= 1000.0 {
        (
            "Plan sowing 2 to 3 weeks before your main rainy period.",
            "Use supplemental irrigation only during dry spells.",
        )
    } else if rainfall >= 700.0 {
        (
            "Use normal sowing calendar and stagger planting across 2 rounds.",
            "Schedule irrigation at critical growth stages.",
        )
    } else {
        (
            "Delay sowing until moisture is secured through rainfall or assured irrigation.",
            "Adopt pre-sowing irrigation and mulching to conserve water.",
        )
    };

    let mut actions = Vec::new();
    if input.avg_temp_c > 34.0 {
        actions.push("Choose heat-tolerant varieties and avoid late sowing.".to_string());
    }
    if input.avg_temp_c < 14.0 {
        actions.push("Advance seedbed preparation and use early-vigor varieties.".to_string());
    }
    if input.pesticides_tonnes < 2.0 {
        actions.push(
            "Increase field scouting frequency and integrated pest management steps.".to_string(),
        );
    }
    actions.push(WEEKLY_REVIEW_ACTION.to_string());

    PlantingSchedule {
        recommended_window: window.to_string(),
        irrigation_plan: irrigation.to_string(),
        actions,
    }
}
