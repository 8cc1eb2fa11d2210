//! Training dataset loading

use std::path::Path;

use serde::Deserialize;

use super::ModelError;

/// One row of the yield dataset. Unknown columns (such as the unnamed
/// index column) are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct YieldRecord {
    #[serde(rename = "Area")]
    pub area: String,
    #[serde(rename = "Item")]
    pub item: String,
    #[serde(rename = "Year")]
    pub year: i32,
    #[serde(rename = "hg/ha_yield")]
    pub hg_per_ha: f64,
    pub average_rain_fall_mm_per_year: f64,
    pub pesticides_tonnes: f64,
    pub avg_temp: f64,
}

/// Read every record from a CSV file with a header row
pub fn load_dataset(path: &Path) -> Result<Vec<YieldRecord>, ModelError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)?;

    let records = reader
        .deserialize::<YieldRecord>()
        .collect::<Result<Vec<_>, _>>()?;

    if records.is_empty() {
        return Err(ModelError::EmptyDataset(path.to_path_buf()));
    }

    tracing::debug!("Loaded {} training rows from {}", records.len(), path.display());
    Ok(records)
}
