//! WebAssembly bindings for the AgriSmart rule engines
//!
//! Lets the browser preview risk, food security and planting advice while
//! the farmer fills in the form, before any request reaches the server.

use wasm_bindgen::prelude::*;

use shared::{
    assess_food_security, build_planting_schedule, classify_risk, PredictionInput, RiskLevel,
    HG_PER_TONNE,
};

fn input(
    area: &str,
    item: &str,
    year: i32,
    rainfall_mm: f64,
    pesticides_tonnes: f64,
    avg_temp_c: f64,
) -> PredictionInput {
    PredictionInput::new(area, item, year, rainfall_mm, pesticides_tonnes, avg_temp_c)
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, JsValue> {
    serde_json::to_string(value).map_err(|e| JsValue::from_str(&format!("Serialization failed: {}", e)))
}

/// Risk tier ("Low", "Medium" or "High") for the given conditions
#[wasm_bindgen]
pub fn risk_level(rainfall_mm: f64, avg_temp_c: f64, pesticides_tonnes: f64) -> String {
    classify_risk(&input("", "", 2000, rainfall_mm, pesticides_tonnes, avg_temp_c))
        .level
        .to_string()
}

/// Full risk assessment as JSON: `{level, score, warnings}`
#[wasm_bindgen]
pub fn risk_assessment_json(
    rainfall_mm: f64,
    avg_temp_c: f64,
    pesticides_tonnes: f64,
) -> Result<String, JsValue> {
    to_json(&classify_risk(&input(
        "",
        "",
        2000,
        rainfall_mm,
        pesticides_tonnes,
        avg_temp_c,
    )))
}

/// Planting schedule as JSON: `{recommended_window, irrigation_plan, actions}`
#[wasm_bindgen]
pub fn planting_schedule_json(
    rainfall_mm: f64,
    avg_temp_c: f64,
    pesticides_tonnes: f64,
) -> Result<String, JsValue> {
    to_json(&build_planting_schedule(&input(
        "",
        "",
        2000,
        rainfall_mm,
        pesticides_tonnes,
        avg_temp_c,
    )))
}

/// Food security tier for a yield estimate, given the risk tier name
#[wasm_bindgen]
pub fn food_security_level(
    item: &str,
    predicted_yield_t_ha: f64,
    risk_level: &str,
) -> Result<String, JsValue> {
    let risk: RiskLevel = risk_level
        .parse()
        .map_err(|e: shared::ParseRiskLevelError| JsValue::from_str(&e.to_string()))?;
    let assessment = assess_food_security(
        &input("", item, 2000, 0.0, 0.0, 0.0),
        predicted_yield_t_ha,
        risk,
    );
    Ok(assessment.level.to_string())
}

/// Expected production in tonnes
#[wasm_bindgen]
pub fn expected_production_tons(predicted_yield_t_ha: f64, farm_area_hectares: f64) -> f64 {
    predicted_yield_t_ha * farm_area_hectares
}

/// Convert hg/ha to t/ha
#[wasm_bindgen]
pub fn hg_to_tonnes_per_hectare(hg_per_ha: f64) -> f64 {
    hg_per_ha / HG_PER_TONNE
}
