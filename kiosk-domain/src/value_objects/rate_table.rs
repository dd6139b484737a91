// Reward rate value object

use serde::{Deserialize, Serialize};

use super::WasteCategory;

pub const DEFAULT_DRY_RATE: f64 = 0.02;
pub const DEFAULT_WET_RATE: f64 = 0.005;

/// Monetary reward per gram for each category.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateTable {
    pub dry: f64,
    pub wet: f64,
}

impl Default for RateTable {
    fn default() -> Self {
        Self {
            dry: DEFAULT_DRY_RATE,
            wet: DEFAULT_WET_RATE,
        }
    }
}

impl RateTable {
    pub fn rate_for(&self, category: WasteCategory) -> f64 {
        match category {
            WasteCategory::Dry => self.dry,
            WasteCategory::Wet => self.wet,
        }
    }
}
