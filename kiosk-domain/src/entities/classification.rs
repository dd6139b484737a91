// Classification entity

use serde::{Deserialize, Serialize};

use crate::value_objects::WasteLabel;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub label: WasteLabel,
    pub subcategory: Option<String>,
    /// Reply exactly as the model produced it.
    pub reply: String,
}

impl Classification {
    /// `<subcategory>, <main-category>` for a decided reply, the trimmed reply
    /// otherwise.
    pub fn summary(&self) -> String {
        match (self.label.category(), &self.subcategory) {
            (Some(category), Some(subcategory)) => {
                format!("{}, {}", subcategory, category.reply_token())
            }
            (Some(category), None) => category.reply_token().to_string(),
            (None, _) => self.reply.trim().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classification(label: WasteLabel, subcategory: Option<&str>, reply: &str) -> Classification {
        Classification {
            label,
            subcategory: subcategory.map(str::to_string),
            reply: reply.to_string(),
        }
    }

    #[test]
    fn summary_reads_like_the_free_text_format() {
        let structured = classification(
            WasteLabel::Wet,
            Some("organic"),
            r#"{"subcategory": "organic", "category": "wet-waste"}"#,
        );
        assert_eq!(structured.summary(), "organic, wet-waste");
        assert_eq!(
            classification(WasteLabel::Dry, None, "dry-waste").summary(),
            "dry-waste"
        );
        assert_eq!(
            classification(WasteLabel::Unknown, None, "  no idea \n").summary(),
            "no idea"
        );
    }
}
