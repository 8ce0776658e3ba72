use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use ts_rs::TS;

use crate::core::features::unit_converter::parse_quantity;
use crate::shared::error::{AppError, AppResult};

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ConvertUnitsRequest {
    pub amount: f64,
    pub from_unit: String,
    pub to_unit: String,
    /// Measurement category key; inferred from `from_unit` when absent
    pub category: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ConvertUnitsResponse {
    pub result: f64,
    pub formatted_result: String,
    pub from_unit: String,
    pub to_unit: String,
    pub category: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ParseUnitResponse {
    pub amount: f64,
    pub unit: String,
    pub category: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct GetUnitsResponse {
    pub units: Vec<UnitDTO>,
}

// Rich Unit Data Transfer Object for frontend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct UnitDTO {
    pub id: String,       // Unit key (e.g., "m", "kg", "celsius")
    pub label: String,    // Display name (e.g., "Meters", "Kilograms")
    pub category: String, // Category key (e.g., "length", "weight")
}

/// Chrome metadata for one tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ToolDTO {
    pub key: String,
    pub name_key: String,
    pub label: String,
    pub icon: String,
    pub category: String,
}

/// One category block of the home grid
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CategorySection {
    pub key: String,
    pub name_key: String,
    pub label: String,
    pub color: String,
    pub icon: String,
    pub tools: Vec<ToolDTO>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PreferencesSnapshot {
    pub favorites: Vec<String>,
    pub recents: Vec<String>,
    pub category_order: Vec<String>,
}

// ============================================================================
// Widget I/O
// ============================================================================

/// Kind of input control a widget field renders as
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "type", content = "options")]
#[ts(export)]
pub enum FieldKind {
    Number,
    Date,
    Text,
    Choice(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct FieldSpec {
    pub key: String,
    pub label: String,
    pub kind: FieldKind,
    pub default: Option<String>,
}

impl FieldSpec {
    pub fn number(key: &str, label: &str) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            kind: FieldKind::Number,
            default: None,
        }
    }

    pub fn date(key: &str, label: &str) -> Self {
        Self {
            kind: FieldKind::Date,
            ..Self::number(key, label)
        }
    }

    pub fn text(key: &str, label: &str) -> Self {
        Self {
            kind: FieldKind::Text,
            ..Self::number(key, label)
        }
    }

    pub fn choice(key: &str, label: &str, options: &[&str], default: &str) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            kind: FieldKind::Choice(options.iter().map(|o| o.to_string()).collect()),
            default: Some(default.to_string()),
        }
    }

    pub fn with_default(mut self, default: &str) -> Self {
        self.default = Some(default.to_string());
        self
    }

    /// Fields the user types into (choices always carry a selection)
    pub fn is_free_input(&self) -> bool {
        !matches!(self.kind, FieldKind::Choice(_))
    }
}

/// Raw text the user entered into a widget's fields
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct WidgetInput {
    pub values: HashMap<String, String>,
}

impl WidgetInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self {
            values: pairs
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    pub fn set(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
    }

    /// Trimmed text of a field, `None` when missing or blank
    pub fn text(&self, key: &str) -> Option<&str> {
        self.values
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    pub fn text_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.text(key).unwrap_or(default)
    }

    /// Parse a required numeric field
    pub fn number(&self, key: &str) -> AppResult<f64> {
        let raw = self
            .text(key)
            .ok_or_else(|| AppError::Validation(format!("Missing '{}' parameter", key)))?;
        Ok(parse_quantity(raw)?)
    }

    /// Parse an optional numeric field, falling back when blank
    pub fn number_or(&self, key: &str, default: f64) -> AppResult<f64> {
        match self.text(key) {
            Some(raw) => Ok(parse_quantity(raw)?),
            None => Ok(default),
        }
    }

    pub fn is_blank(&self, key: &str) -> bool {
        self.text(key).is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OutputLine {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct WidgetOutput {
    /// Headline result, already formatted for display
    pub primary: String,
    /// Raw numeric results keyed by name
    pub values: BTreeMap<String, f64>,
    pub details: Vec<OutputLine>,
    pub disclaimer: Option<String>,
}

impl WidgetOutput {
    pub fn new(primary: impl Into<String>) -> Self {
        Self {
            primary: primary.into(),
            values: BTreeMap::new(),
            details: Vec::new(),
            disclaimer: None,
        }
    }

    pub fn value(mut self, key: &str, value: f64) -> Self {
        self.values.insert(key.to_string(), value);
        self
    }

    pub fn detail(mut self, label: &str, value: impl Into<String>) -> Self {
        self.details.push(OutputLine {
            label: label.to_string(),
            value: value.into(),
        });
        self
    }
}

/// What a widget shows after evaluating its current input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "state", content = "data")]
#[ts(export)]
pub enum WidgetState {
    /// Nothing entered yet
    Empty,
    /// Input rejected; the message key resolves to a localized string
    Invalid { message_key: String, detail: String },
    /// Units could not be resolved
    CannotConvert { message_key: String },
    Ready(WidgetOutput),
}
