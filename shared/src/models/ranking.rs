//! Alternative crop ranking under identical growing conditions

use serde::{Deserialize, Serialize};

use super::prediction::PredictionInput;

/// Reference grains re-evaluated for every prediction, in tie-break order
pub const GRAIN_CANDIDATES: [&str; 5] = ["Maize", "Rice, paddy", "Sorghum", "Wheat", "Soybeans"];

/// Estimated yield for one candidate crop
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CropYield {
    pub crop: String,
    pub yield_t_per_ha: f64,
}

/// Candidates sorted by estimated yield, best first
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CropRanking {
    pub entries: Vec<CropYield>,
    /// Candidates that could not be estimated
    pub skipped: usize,
}

impl CropRanking {
    /// Rank candidates given in candidate order. `None` marks a failed estimate.
    pub fn from_candidates<I>(candidates: I) -> Self
    where
        I: IntoIterator<Item = (String, Option<f64>)>,
    {
        let mut entries = Vec::new();
        let mut skipped = 0;
        for (crop, estimate) in candidates {
            match estimate {
                Some(yield_t_per_ha) => entries.push(CropYield {
                    crop,
                    yield_t_per_ha,
                }),
                None => skipped += 1,
            }
        }

        // sort_by is stable, equal yields keep candidate order
        entries.sort_by(|a, b| b.yield_t_per_ha.total_cmp(&a.yield_t_per_ha));

        Self { entries, skipped }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn top(&self) -> Option<&CropYield> {
        self.entries.first()
    }

    /// Switch proposal against the entered crop, if the best candidate beats it
    pub fn switch_suggestion(&self, current_crop: &str, current_t_ha: f64) -> Option<SwitchSuggestion> {
        let top = self.top()?;
        let gain = top.yield_t_per_ha - current_t_ha;
        if top.crop.to_lowercase() == current_crop.to_lowercase() || gain <= 0.0 {
            return None;
        }
        let gain_percent = if current_t_ha > 0.0 {
            gain / current_t_ha * 100.0
        } else {
            0.0
        };
        Some(SwitchSuggestion {
            crop: top.crop.clone(),
            yield_t_per_ha: top.yield_t_per_ha,
            gain_t_per_ha: gain,
            gain_percent,
        })
    }

    /// Point-wise grain suggestion text, `None` when nothing could be ranked
    pub fn suggestion_block(&self, input: &PredictionInput, current_t_ha: f64) -> Option<String> {
        let top = self.top()?;
        let current = &input.item;

        let (recommendation, switch_line) = match self.switch_suggestion(current, current_t_ha) {
            Some(switch) => (
                format!(
                    "- Best grain for current conditions is {} with estimated yield {:.2} t/ha.",
                    top.crop, top.yield_t_per_ha
                ),
                format!(
                    "- Switching from {} to {} may add about {:.2} t/ha ({:.1}% improvement).",
                    current, switch.crop, switch.gain_t_per_ha, switch.gain_percent
                ),
            ),
            None => (
                format!(
                    "- Your selected grain {} is already near the top for the given condition ({:.2} t/ha).",
                    current, current_t_ha
                ),
                format!(
                    "- Keep optimizing {} with the same condition profile to protect yield stability.",
                    current
                ),
            ),
        };

        let top_lines: Vec<String> = self
            .entries
            .iter()
            .take(3)
            .enumerate()
            .map(|(i, entry)| format!("- {}. {}: {:.2} t/ha", i + 1, entry.crop, entry.yield_t_per_ha))
            .collect();

        Some(format!(
            "Grain Suggestion (Point-wise):\n\
             - Entered grain: {current}.\n\
             - Condition summary: {rain_band} ({rainfall:?} mm/year), {temp_band} ({temp:?} C), pesticides {pesticides:?} tonnes.\n\
             - Estimated yield for entered grain: {current_t_ha:.2} t/ha.\n\
             {recommendation}\n\
             {switch_line}\n\
             - Top grain options for the same condition:\n\
             {top}",
            current = current,
            rain_band = rainfall_band(input.avg_rainfall_mm_per_year),
            rainfall = input.avg_rainfall_mm_per_year,
            temp_band = temperature_band(input.avg_temp_c),
            temp = input.avg_temp_c,
            pesticides = input.pesticides_tonnes,
            current_t_ha = current_t_ha,
            recommendation = recommendation,
            switch_line = switch_line,
            top = top_lines.join("\n"),
        ))
    }
}

/// Proposed crop change with its expected gain
#[derive(Debug, Clone, PartialEq)]
pub struct SwitchSuggestion {
    pub crop: String,
    pub yield_t_per_ha: f64,
    pub gain_t_per_ha: f64,
    pub gain_percent: f64,
}

pub fn rainfall_band(rainfall_mm: f64) -> &'static str {
    if rainfall_mm < 500.0 {
        "low rainfall"
    } else if rainfall_mm < 1000.0 {
        "moderate rainfall"
    } else {
        "high rainfall"
    }
}

pub fn temperature_band(avg_temp_c: f64) -> &'static str {
    if avg_temp_c < 18.0 {
        "cool temperature"
    } else if avg_temp_c <= 30.0 {
        "moderate-to-warm temperature"
    } else {
        "high temperature"
    }
}
