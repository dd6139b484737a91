// Waste category value objects

use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use serde::{Deserialize, Serialize};

/// Top-level waste class the sorter understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WasteCategory {
    Dry,
    Wet,
}

impl WasteCategory {
    /// Token sent to the sorter and returned by the HTTP surface.
    pub fn as_str(&self) -> &'static str {
        match self {
            WasteCategory::Dry => "DRY",
            WasteCategory::Wet => "WET",
        }
    }

    /// Form stored in the record's `wasteType` field.
    pub fn as_record_str(&self) -> &'static str {
        match self {
            WasteCategory::Dry => "dry",
            WasteCategory::Wet => "wet",
        }
    }

    /// Main-category token the vision model is asked to emit.
    pub fn reply_token(&self) -> &'static str {
        match self {
            WasteCategory::Dry => "dry-waste",
            WasteCategory::Wet => "wet-waste",
        }
    }
}

impl fmt::Display for WasteCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WasteCategory {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "DRY" | "DRY-WASTE" => Ok(WasteCategory::Dry),
            "WET" | "WET-WASTE" => Ok(WasteCategory::Wet),
            other => Err(anyhow!("unknown waste type '{}', expected dry or wet", other)),
        }
    }
}

/// Outcome of reducing a classifier reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum WasteLabel {
    Dry,
    Wet,
    Unknown,
}

impl WasteLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            WasteLabel::Dry => "DRY",
            WasteLabel::Wet => "WET",
            WasteLabel::Unknown => "UNKNOWN",
        }
    }

    pub fn category(&self) -> Option<WasteCategory> {
        match self {
            WasteLabel::Dry => Some(WasteCategory::Dry),
            WasteLabel::Wet => Some(WasteCategory::Wet),
            WasteLabel::Unknown => None,
        }
    }
}

impl From<WasteCategory> for WasteLabel {
    fn from(category: WasteCategory) -> Self {
        match category {
            WasteCategory::Dry => WasteLabel::Dry,
            WasteCategory::Wet => WasteLabel::Wet,
        }
    }
}
