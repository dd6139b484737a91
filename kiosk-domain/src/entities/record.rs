// Redeemable record entity
// One completed sort-and-weigh cycle, keyed by its QR identifier

use serde::{Deserialize, Serialize};

use crate::value_objects::{RecordId, WasteCategory};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedeemableRecord {
    pub waste_type: WasteCategory,
    pub weight: f64,
    pub amount: f64,
    pub claimed: bool,
    pub claimed_by: Option<String>,
    pub claimed_at: Option<String>,
}

impl RedeemableRecord {
    /// Fresh, unclaimed record. Claim fields are only ever set by the
    /// redemption side.
    pub fn unclaimed(waste_type: WasteCategory, weight: f64, amount: f64) -> Self {
        Self {
            waste_type,
            weight,
            amount,
            claimed: false,
            claimed_by: None,
            claimed_at: None,
        }
    }
}

/// Rendered QR code for a record identifier.
#[derive(Debug, Clone)]
pub struct QrArtifact {
    pub png: Vec<u8>,
    pub text: String,
    pub saved_to: Option<String>,
}

/// Result reported to the caller once a record exists.
#[derive(Debug, Clone)]
pub struct IssuedReward {
    pub id: RecordId,
    pub waste_type: WasteCategory,
    pub weight: f64,
    pub amount: f64,
    pub qr: QrArtifact,
}
