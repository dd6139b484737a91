// Identifier value objects

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

const RECORD_ID_PREFIX: &str = "QR_";
const RECORD_ID_HEX_LEN: usize = 8;

/// Key of a redeemable record; also the sole QR payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub String);

impl RecordId {
    pub fn generate() -> Self {
        let hex = Uuid::new_v4().simple().to_string();
        RecordId(format!(
            "{}{}",
            RECORD_ID_PREFIX,
            hex[..RECORD_ID_HEX_LEN].to_uppercase()
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
