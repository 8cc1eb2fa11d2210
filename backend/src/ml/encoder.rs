//! Feature encoding for the yield regressor
//!
//! Numeric features pass through unchanged. `Area` and `Item` are one-hot
//! encoded against the categories seen during training, with the first
//! (alphabetical) category of each dropped as the reference level.
//! Categories never seen during training encode to all zeros.

use serde::{Deserialize, Serialize};

use super::YieldFeatures;

/// Input columns, in the order the model was trained on
pub const EXPECTED_FEATURES: [&str; 6] = [
    "Area",
    "Item",
    "Year",
    "average_rain_fall_mm_per_year",
    "pesticides_tonnes",
    "avg_temp",
];

const NUMERIC_WIDTH: usize = 4;

/// Sorted, de-duplicated category values of one column
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CategoryIndex {
    categories: Vec<String>,
}

impl CategoryIndex {
    pub fn fit<'a, I>(values: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut categories: Vec<String> = values.into_iter().map(str::to_string).collect();
        categories.sort();
        categories.dedup();
        Self { categories }
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn contains(&self, value: &str) -> bool {
        self.categories.binary_search_by(|c| c.as_str().cmp(value)).is_ok()
    }

    /// Encoded columns contributed by this index
    pub fn width(&self) -> usize {
        self.categories.len().saturating_sub(1)
    }

    /// Position of the indicator column set for `value`, if any
    fn indicator(&self, value: &str) -> Option<usize> {
        match self.categories.binary_search_by(|c| c.as_str().cmp(value)) {
            Ok(0) | Err(_) => None,
            Ok(position) => Some(position - 1),
        }
    }
}

/// Fitted encoder turning [`YieldFeatures`] into a dense feature row
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FeatureEncoder {
    pub areas: CategoryIndex,
    pub items: CategoryIndex,
}

impl FeatureEncoder {
    pub fn fit<'a, I>(rows: I) -> Self
    where
        I: IntoIterator<Item = &'a YieldFeatures> + Clone,
    {
        Self {
            areas: CategoryIndex::fit(rows.clone().into_iter().map(|r| r.area.as_str())),
            items: CategoryIndex::fit(rows.into_iter().map(|r| r.item.as_str())),
        }
    }

    pub fn width(&self) -> usize {
        NUMERIC_WIDTH + self.areas.width() + self.items.width()
    }

    pub fn encode(&self, features: &YieldFeatures) -> Vec<f64> {
        let mut row = vec![0.0; self.width()];
        row[0] = f64::from(features.year);
        row[1] = features.rainfall_mm;
        row[2] = features.pesticides_tonnes;
        row[3] = features.avg_temp_c;

        let area_offset = NUMERIC_WIDTH;
        let item_offset = area_offset + self.areas.width();
        if let Some(i) = self.areas.indicator(&features.area) {
            row[area_offset + i] = 1.0;
        }
        if let Some(i) = self.items.indicator(&features.item) {
            row[item_offset + i] = 1.0;
        }
        row
    }
}
