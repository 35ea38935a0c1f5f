//! Field and form descriptors produced by a scan.
//!
//! Wire field names stay camelCase so saved profiles and export files keep
//! the shape the browser surfaces already use.

use serde::{Deserialize, Serialize};

/// Input kind, one variant per distinct extraction/fill behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Textarea,
    Select,
    Checkbox,
    Radio,
    Number,
    Email,
    Password,
    /// Any other text-like input type (tel, url, date, search, ...),
    /// carrying the raw type string.
    #[serde(untagged)]
    Other(String),
}

impl FieldKind {
    /// Classify an element by tag and input type.
    pub fn from_element(tag: &str, input_type: &str) -> FieldKind {
        match tag {
            "select" => FieldKind::Select,
            "textarea" => FieldKind::Textarea,
            _ => match input_type {
                "checkbox" => FieldKind::Checkbox,
                "radio" => FieldKind::Radio,
                "number" => FieldKind::Number,
                "email" => FieldKind::Email,
                "password" => FieldKind::Password,
                "text" | "" => FieldKind::Text,
                other => FieldKind::Other(other.to_string()),
            },
        }
    }

    /// True for every kind filled by writing a string value directly.
    pub fn is_text_like(&self) -> bool {
        !matches!(
            self,
            FieldKind::Select | FieldKind::Checkbox | FieldKind::Radio
        )
    }
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldKind::Text => write!(f, "text"),
            FieldKind::Textarea => write!(f, "textarea"),
            FieldKind::Select => write!(f, "select"),
            FieldKind::Checkbox => write!(f, "checkbox"),
            FieldKind::Radio => write!(f, "radio"),
            FieldKind::Number => write!(f, "number"),
            FieldKind::Email => write!(f, "email"),
            FieldKind::Password => write!(f, "password"),
            FieldKind::Other(raw) => write!(f, "{}", raw),
        }
    }
}

/// A field's current or saved value: boolean for checkbox/radio, string
/// otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Text(String),
}

impl FieldValue {
    /// Truthiness rule used when applying checkbox/radio values: boolean
    /// `true` or the literal string `"true"`.
    pub fn is_truthy(&self) -> bool {
        match self {
            FieldValue::Bool(b) => *b,
            FieldValue::Text(s) => s == "true",
        }
    }

    pub fn as_text(&self) -> &str {
        match self {
            FieldValue::Text(s) => s,
            FieldValue::Bool(_) => "",
        }
    }

    pub fn is_empty_text(&self) -> bool {
        matches!(self, FieldValue::Text(s) if s.is_empty())
    }
}

impl Default for FieldValue {
    fn default() -> Self {
        FieldValue::Text(String::new())
    }
}

/// One `<option>` of a select field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectOption {
    pub value: String,
    pub text: String,
    pub selected: bool,
}

/// One detected input-like control with its current (or saved) value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub kind: FieldKind,
    pub selector: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub placeholder: String,
    #[serde(default)]
    pub value: FieldValue,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,
    #[serde(default)]
    pub pattern: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<SelectOption>>,
    /// Literal value attribute, present for checkbox/radio.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_value: Option<String>,
    /// Shared group name, present for radio.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radio_group: Option<String>,
    /// Select-state snapshot used as fallback when value-based restore fails.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_index: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_text: Option<String>,
}

/// One detected container of fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Form {
    pub id: String,
    pub selector: String,
    pub fields: Vec<Field>,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub is_orphan: bool,
}

/// Result of one scan pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanOutcome {
    pub forms: Vec<Form>,
    pub total_fields: usize,
    pub total_inputs: usize,
}
