//! Prediction request, response and history models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use validator::{Validate, ValidationErrors};

use super::food_security::FoodSecurityLevel;
use super::planting::PlantingSchedule;
use super::risk::RiskLevel;
use crate::validation::{check_range, normalize_text};

/// Hectograms per hectare in one tonne per hectare
pub const HG_PER_TONNE: f64 = 10_000.0;

/// Agronomic inputs for a single yield prediction
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PredictionInput {
    /// Country or region
    #[serde(deserialize_with = "deserialize_normalized")]
    pub area: String,
    /// Crop item as named in the training dataset
    #[serde(deserialize_with = "deserialize_normalized")]
    pub item: String,
    pub year: i32,
    #[serde(alias = "average_rain_fall_mm_per_year")]
    pub avg_rainfall_mm_per_year: f64,
    pub pesticides_tonnes: f64,
    #[serde(alias = "avg_temp")]
    pub avg_temp_c: f64,
    #[serde(default = "default_farm_area")]
    pub farm_area_hectares: f64,
}

fn default_farm_area() -> f64 {
    1.0
}

fn deserialize_normalized<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(normalize_text(&raw))
}

impl PredictionInput {
    /// Build an input, normalizing the free-text fields
    pub fn new(
        area: &str,
        item: &str,
        year: i32,
        avg_rainfall_mm_per_year: f64,
        pesticides_tonnes: f64,
        avg_temp_c: f64,
    ) -> Self {
        Self {
            area: normalize_text(area),
            item: normalize_text(item),
            year,
            avg_rainfall_mm_per_year,
            pesticides_tonnes,
            avg_temp_c,
            farm_area_hectares: default_farm_area(),
        }
    }

    pub fn with_farm_area(mut self, farm_area_hectares: f64) -> Self {
        self.farm_area_hectares = farm_area_hectares;
        self
    }

    /// Copy of this input with only the crop replaced
    pub fn with_item(&self, item: &str) -> Self {
        Self {
            item: normalize_text(item),
            ..self.clone()
        }
    }
}

impl Validate for PredictionInput {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        for (field, value) in [("area", &self.area), ("item", &self.item)] {
            let len = value.chars().count();
            if len == 0 {
                errors.add(field, crate::validation::error("blank", "Value cannot be blank"));
            } else if !(2..=100).contains(&len) {
                errors.add(
                    field,
                    crate::validation::error("length", "Must be between 2 and 100 characters"),
                );
            }
        }

        if !(1990..=2100).contains(&self.year) {
            errors.add(
                "year",
                crate::validation::error("range", "Year must be between 1990 and 2100"),
            );
        }

        check_range(
            &mut errors,
            "avg_rainfall_mm_per_year",
            self.avg_rainfall_mm_per_year,
            0.0,
            10_000.0,
        );
        check_range(
            &mut errors,
            "pesticides_tonnes",
            self.pesticides_tonnes,
            0.0,
            1_000_000.0,
        );
        check_range(&mut errors, "avg_temp_c", self.avg_temp_c, -30.0, 60.0);

        // Zero hectares is rejected, the upper bound is inclusive
        if !(self.farm_area_hectares > 0.0 && self.farm_area_hectares <= 100_000.0) {
            errors.add(
                "farm_area_hectares",
                crate::validation::error("range", "Farm area must be in (0, 100000] hectares"),
            );
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Yield predicted by the model for one (input, crop) pair
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct YieldEstimate {
    pub hg_per_ha: f64,
    pub t_per_ha: f64,
}

impl YieldEstimate {
    pub fn from_hg_per_ha(hg_per_ha: f64) -> Self {
        Self {
            hg_per_ha,
            t_per_ha: hg_per_ha / HG_PER_TONNE,
        }
    }
}

/// Response body of a prediction call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub predicted_yield_hg_ha: f64,
    pub predicted_yield_t_ha: f64,
    pub risk_level: RiskLevel,
    pub warnings: Vec<String>,
    pub expected_production_tons: f64,
    pub food_security_level: FoodSecurityLevel,
    pub food_security_notes: Vec<String>,
    pub planting_schedule: PlantingSchedule,
    pub advisory: String,
}

/// Everything produced by one prediction, as written to history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub input: PredictionInput,
    pub response: PredictionResponse,
    pub created_at: DateTime<Utc>,
}

impl PredictionRecord {
    pub fn new(input: PredictionInput, response: PredictionResponse) -> Self {
        Self {
            input,
            response,
            created_at: Utc::now(),
        }
    }
}

/// Summary of a stored prediction
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryItem {
    pub area: String,
    pub item: String,
    pub year: i32,
    pub predicted_yield_hg_ha: f64,
    pub predicted_yield_t_ha: f64,
    pub risk_level: RiskLevel,
    pub created_at: DateTime<Utc>,
}

/// Overall service status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Ok,
    Degraded,
}

/// Response body of a health call
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub model_loaded: bool,
    pub db_ready: bool,
}

impl HealthResponse {
    pub fn new(model_loaded: bool, db_ready: bool) -> Self {
        let status = if model_loaded {
            HealthStatus::Ok
        } else {
            HealthStatus::Degraded
        };
        Self {
            status,
            model_loaded,
            db_ready,
        }
    }
}
