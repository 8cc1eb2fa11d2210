//! Farmer advisory generation
//!
//! The configured text generator writes the advisory from a fixed prompt.
//! Any backend failure falls back to a deterministic template, so an
//! advisory is always produced. The grain ranking block is appended to
//! either text.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use shared::{FoodSecurityLevel, PlantingSchedule, PredictionInput, RiskLevel};

use super::crop_ranking::CropRanker;
use crate::external::{LlmError, TextGenerator};

/// Which path produced the advisory text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvisorySource {
    Llm,
    Fallback,
}

impl fmt::Display for AdvisorySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdvisorySource::Llm => f.write_str("llm"),
            AdvisorySource::Fallback => f.write_str("fallback"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Advisory {
    pub text: String,
    pub source: AdvisorySource,
}

/// Derived facts the advisory is written from
#[derive(Debug, Clone, Copy)]
pub struct AdvisoryContext<'a> {
    pub input: &'a PredictionInput,
    pub predicted_yield_t_ha: f64,
    pub risk_level: RiskLevel,
    pub schedule: &'a PlantingSchedule,
    pub food_security_level: FoodSecurityLevel,
}

#[derive(Clone)]
pub struct AdvisoryService {
    generator: Arc<dyn TextGenerator>,
    ranker: CropRanker,
    timeout: Duration,
}

impl AdvisoryService {
    pub fn new(generator: Arc<dyn TextGenerator>, ranker: CropRanker, timeout: Duration) -> Self {
        Self {
            generator,
            ranker,
            timeout,
        }
    }

    pub async fn generate(&self, ctx: AdvisoryContext<'_>) -> Advisory {
        let prompt = build_prompt(&ctx);
        let (ranking, completion) =
            tokio::join!(self.ranker.rank(ctx.input), self.complete(&prompt));

        let (body, source) = match completion {
            Ok(text) => (text, AdvisorySource::Llm),
            Err(e) => {
                tracing::warn!(
                    "LLM advisory unavailable from {}; using fallback advice: {}",
                    self.generator.name(),
                    e
                );
                (fallback_advisory(&ctx), AdvisorySource::Fallback)
            }
        };

        let text = match ranking.suggestion_block(ctx.input, ctx.predicted_yield_t_ha) {
            Some(block) => format!("{}\n\n{}", body, block),
            None => body,
        };
        Advisory { text, source }
    }

    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        tokio::time::timeout(self.timeout, self.generator.complete(prompt, self.timeout))
            .await
            .map_err(|_| LlmError::Timeout(self.timeout))?
    }
}

pub fn build_prompt(ctx: &AdvisoryContext<'_>) -> String {
    let input = ctx.input;
    format!(
        "You are an agricultural expert. Based on the following data:\n\
         Area: {area}\n\
         Crop: {crop}\n\
         Year: {year}\n\
         Predicted Yield: {yield_t_ha:.2} tons/hectare\n\
         Average Rainfall: {rainfall:?}\n\
         Pesticides (tonnes): {pesticides:?}\n\
         Average Temperature: {temp:?}\n\
         Risk Level: {risk}\n\
         Recommended Planting Window: {window}\n\
         Food Security Level: {food}\n\
         \n\
         Write a professional advisory for farmers and field officers.\n\
         Use clear, practical language and avoid vague advice.\n\
         Keep the response concise but specific.\n\
         Use the following structure with section titles:\n\
         1) Executive Summary\n\
         2) Key Risks\n\
         3) Recommended Actions (next 2-4 weeks)\n\
         4) Nutrient and Crop Strategy\n\
         5) Food Security and Contingency Plan\n\
         Include at least 6 actionable bullet points total.\n",
        area = input.area,
        crop = input.item,
        year = input.year,
        yield_t_ha = ctx.predicted_yield_t_ha,
        rainfall = input.avg_rainfall_mm_per_year,
        pesticides = input.pesticides_tonnes,
        temp = input.avg_temp_c,
        risk = ctx.risk_level,
        window = ctx.schedule.recommended_window,
        food = ctx.food_security_level,
    )
}

/// Deterministic five-section advisory used when no backend text is available
pub fn fallback_advisory(ctx: &AdvisoryContext<'_>) -> String {
    let input = ctx.input;
    let actions = &ctx.schedule.actions;
    let first_action = actions
        .first()
        .map(String::as_str)
        .unwrap_or("Review field conditions weekly and update operations accordingly.");
    let second_action = actions
        .get(1)
        .map(String::as_str)
        .unwrap_or("Coordinate irrigation and nutrient timing with forecast rainfall.");

    format!(
        "Executive Summary:\n\
         - Predicted yield for {item} in {area} is {yield_t_ha:.2} t/ha.\n\
         - Current production risk is {risk}; food security status is {food}.\n\
         \n\
         Key Risks:\n\
         - Rainfall profile ({rainfall:?} mm/year) and temperature ({temp:?} C) may affect yield stability.\n\
         - Pesticide intensity ({pesticides:?} tonnes) should be aligned with integrated pest management.\n\
         \n\
         Recommended Actions (next 2-4 weeks):\n\
         - {window}\n\
         - {irrigation}\n\
         - {first_action}\n\
         - {second_action}\n\
         \n\
         Nutrient and Crop Strategy:\n\
         - Apply nutrient doses in split applications and verify with local soil-test guidance.\n\
         - Keep a backup seed plan with a short-duration alternative crop for adverse weather scenarios.\n\
         \n\
         Food Security and Contingency Plan:\n\
         - Track expected output against household or local demand and review every 2 weeks.\n\
         - If risk rises, prioritize water access, pest surveillance, and diversified planting blocks.",
        item = input.item,
        area = input.area,
        yield_t_ha = ctx.predicted_yield_t_ha,
        risk = ctx.risk_level,
        food = ctx.food_security_level,
        rainfall = input.avg_rainfall_mm_per_year,
        temp = input.avg_temp_c,
        pesticides = input.pesticides_tonnes,
        window = ctx.schedule.recommended_window,
        irrigation = ctx.schedule.irrigation_plan,
        first_action = first_action,
        second_action = second_action,
    )
}
