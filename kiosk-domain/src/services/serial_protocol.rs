// Line protocol spoken by the scale/actuator board.
// Outbound: BASE, DRY, WET, NONE. Inbound: <PREFIX>:<number>.

use std::fmt;

use crate::value_objects::WasteCategory;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerialCommand {
    /// Request a tare reading.
    Base,
    /// Rotate the sorter towards the category's bin.
    Sort(WasteCategory),
    /// Park the servo.
    Stop,
}

impl SerialCommand {
    pub fn token(&self) -> &'static str {
        match self {
            SerialCommand::Base => "BASE",
            SerialCommand::Sort(category) => category.as_str(),
            SerialCommand::Stop => "NONE",
        }
    }

    pub fn to_line(&self) -> String {
        format!("{}\n", self.token())
    }
}

impl fmt::Display for SerialCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadingKind {
    BaseWeight,
    ItemWeight,
}

impl ReadingKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            ReadingKind::BaseWeight => "BASE_WEIGHT",
            ReadingKind::ItemWeight => "ITEM_WEIGHT",
        }
    }

    pub fn stage(&self) -> &'static str {
        match self {
            ReadingKind::BaseWeight => "base weight",
            ReadingKind::ItemWeight => "item weight",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LineMatch {
    /// Empty, or carries another prefix.
    Ignored,
    /// Right prefix, but the value is not a finite number.
    Malformed,
    Value(f64),
}

/// Classifies one already-trimmed line against the expected reading.
pub fn match_reading(line: &str, kind: ReadingKind) -> LineMatch {
    if line.is_empty() || !line.starts_with(kind.prefix()) {
        return LineMatch::Ignored;
    }
    let Some((_, raw)) = line.split_once(':') else {
        return LineMatch::Malformed;
    };
    let raw = raw.split(':').next().unwrap_or(raw);
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => LineMatch::Value(value),
        _ => LineMatch::Malformed,
    }
}
