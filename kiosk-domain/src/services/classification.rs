// Reduction of vision-model replies to a waste label.

use serde::Deserialize;

use crate::entities::Classification;
use crate::value_objects::{WasteCategory, WasteLabel};

pub const CLASSIFICATION_PROMPT: &str = "In the given image, identify the waste category.

Dry waste categories:
- batteries
- metal
- paper
- plastic
- cardboard
- glass
- shoes
- clothes
- others

Wet waste categories:
- organic
- biological
- others

Rules:
- Choose ONLY ONE sub-category
- Choose ONLY ONE main category (dry-waste or wet-waste)
- Output format MUST be:
<subcategory>, <main-category>

Example outputs:
banana peel -> organic, wet-waste
plastic bottle -> plastic, dry-waste
";

/// Variant used when the model is constrained to a JSON schema.
pub const STRUCTURED_CLASSIFICATION_PROMPT: &str = "In the given image, identify the waste category.

Dry waste sub-categories: batteries, metal, paper, plastic, cardboard, glass, shoes, clothes, others.
Wet waste sub-categories: organic, biological, others.

Choose exactly one sub-category and exactly one main category.
Answer with a JSON object: {\"subcategory\": \"<subcategory>\", \"category\": \"dry-waste\" | \"wet-waste\"}.

Example: a banana peel is {\"subcategory\": \"organic\", \"category\": \"wet-waste\"}.
";

#[derive(Debug, Deserialize)]
struct StructuredReply {
    #[serde(default)]
    subcategory: Option<String>,
    category: String,
}

/// Reduces a reply to DRY, WET or UNKNOWN.
///
/// A JSON reply of the form `{"subcategory": .., "category": ..}` is decided
/// by its `category` field. Anything else falls back to case-insensitive
/// containment of `dry-waste` / `wet-waste`; a reply naming both, or neither,
/// is UNKNOWN.
pub fn parse_reply(reply: &str) -> Classification {
    if let Some(structured) = parse_structured(reply) {
        let label = label_by_containment(&structured.category);
        let subcategory = structured
            .subcategory
            .map(|value| value.trim().to_lowercase())
            .filter(|value| !value.is_empty());
        return Classification {
            label,
            subcategory,
            reply: reply.to_string(),
        };
    }

    let label = label_by_containment(reply);
    let subcategory = label
        .category()
        .and_then(|category| subcategory_before(reply, category));
    Classification {
        label,
        subcategory,
        reply: reply.to_string(),
    }
}

pub fn label_by_containment(text: &str) -> WasteLabel {
    let lowered = text.to_lowercase();
    let dry = lowered.contains(WasteCategory::Dry.reply_token());
    let wet = lowered.contains(WasteCategory::Wet.reply_token());
    match (dry, wet) {
        (true, false) => WasteLabel::Dry,
        (false, true) => WasteLabel::Wet,
        _ => WasteLabel::Unknown,
    }
}

fn parse_structured(reply: &str) -> Option<StructuredReply> {
    let trimmed = reply.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.trim_end().strip_suffix("```"))
        .unwrap_or(trimmed)
        .trim();
    if !body.starts_with('{') {
        return None;
    }
    serde_json::from_str(body).ok()
}

fn subcategory_before(reply: &str, category: WasteCategory) -> Option<String> {
    let lowered = reply.to_lowercase();
    let segments: Vec<&str> = lowered.split(',').map(str::trim).collect();
    let position = segments
        .iter()
        .position(|segment| segment.contains(category.reply_token()))?;
    if position == 0 {
        return None;
    }
    let candidate = segments[position - 1];
    let candidate = candidate
        .rsplit("->")
        .next()
        .unwrap_or(candidate)
        .trim();
    if candidate.is_empty() {
        None
    } else {
        Some(candidate.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn free_text_reply_with_dry_token() {
        let result = parse_reply("this looks like a plastic bottle, plastic, dry-waste");
        assert_eq!(result.label, WasteLabel::Dry);
        assert_eq!(result.subcategory.as_deref(), Some("plastic"));
    }

    #[test]
    fn containment_is_case_insensitive() {
        assert_eq!(parse_reply("Organic, WET-WASTE\n").label, WasteLabel::Wet);
        assert_eq!(parse_reply("Glass, Dry-Waste").label, WasteLabel::Dry);
    }

    #[test]
    fn both_or_neither_token_is_unknown() {
        assert_eq!(
            parse_reply("could be dry-waste or wet-waste").label,
            WasteLabel::Unknown
        );
        assert_eq!(parse_reply("a banana").label, WasteLabel::Unknown);
        assert_eq!(parse_reply("dry waste").label, WasteLabel::Unknown);
        assert_eq!(parse_reply("").label, WasteLabel::Unknown);
    }

    #[test]
    fn structured_reply_uses_category_field() {
        let result = parse_reply(r#"{"subcategory": "Organic", "category": "wet-waste"}"#);
        assert_eq!(result.label, WasteLabel::Wet);
        assert_eq!(result.subcategory.as_deref(), Some("organic"));
    }

    #[test]
    fn structured_reply_in_code_fence() {
        let reply = "```json\n{\"subcategory\": \"metal\", \"category\": \"dry-waste\"}\n```";
        let result = parse_reply(reply);
        assert_eq!(result.label, WasteLabel::Dry);
        assert_eq!(result.subcategory.as_deref(), Some("metal"));
    }

    #[test]
    fn structured_reply_with_unexpected_category_is_unknown() {
        let result = parse_reply(r#"{"subcategory": "rock", "category": "hazardous"}"#);
        assert_eq!(result.label, WasteLabel::Unknown);
    }

    #[test]
    fn arrow_form_keeps_only_subcategory() {
        let result = parse_reply("banana peel -> organic, wet-waste");
        assert_eq!(result.label, WasteLabel::Wet);
        assert_eq!(result.subcategory.as_deref(), Some("organic"));
    }
}
