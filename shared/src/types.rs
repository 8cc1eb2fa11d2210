//! Common types used across the platform

use serde::{Deserialize, Serialize};

pub const DEFAULT_HISTORY_LIMIT: u32 = 20;
pub const MAX_HISTORY_LIMIT: u32 = 100;

/// Query parameters for prediction history
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<i64>,
}

impl HistoryQuery {
    /// Requested limit clamped to 1..=100, 20 when absent
    pub fn effective_limit(&self) -> u32 {
        clamp_history_limit(self.limit)
    }
}

pub fn clamp_history_limit(limit: Option<i64>) -> u32 {
    match limit {
        None => DEFAULT_HISTORY_LIMIT,
        Some(value) => value.clamp(1, MAX_HISTORY_LIMIT as i64) as u32,
    }
}
