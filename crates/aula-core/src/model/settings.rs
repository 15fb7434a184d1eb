// ── Server configuration entries ──

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::Display;

use crate::error::CoreError;

/// Value type of a configuration entry; picks the input widget and how
/// the edited text is submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ConfigKind {
    Integer,
    Boolean,
    Text,
}

impl ConfigKind {
    pub fn from_wire(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("integer" | "int") => Self::Integer,
            Some("boolean" | "bool") => Self::Boolean,
            _ => Self::Text,
        }
    }

    /// Validate edited text and turn it into the JSON value to submit.
    pub fn parse_value(self, key: &str, input: &str) -> Result<Value, CoreError> {
        match self {
            Self::Integer => input
                .trim()
                .parse::<i64>()
                .map(Value::from)
                .map_err(|_| CoreError::ValidationFailed {
                    message: format!("{key} expects a whole number, got '{}'", input.trim()),
                }),
            Self::Boolean => match input.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => Ok(Value::Bool(true)),
                "false" | "0" | "no" | "off" => Ok(Value::Bool(false)),
                _ => Err(CoreError::ValidationFailed {
                    message: format!("{key} expects true or false, got '{}'", input.trim()),
                }),
            },
            Self::Text => Ok(Value::String(input.to_owned())),
        }
    }
}

/// One server-side configuration entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigEntry {
    pub id: i64,
    pub key: String,
    pub value: String,
    pub kind: ConfigKind,
    pub description: Option<String>,
    pub category: Option<String>,
    pub updated_at: Option<String>,
    pub updated_by: Option<String>,
}

impl ConfigEntry {
    /// Boolean entries read as on when stored as `true`/`1`.
    pub fn is_enabled(&self) -> bool {
        matches!(self.value.trim().to_ascii_lowercase().as_str(), "true" | "1")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn integer_entries_submit_numbers() {
        let value = ConfigKind::Integer.parse_value("max_volumen", " 85 ").unwrap();
        assert_eq!(value, Value::from(85));
        assert!(ConfigKind::Integer.parse_value("max_volumen", "loud").is_err());
    }

    #[test]
    fn boolean_entries_accept_common_spellings() {
        assert_eq!(
            ConfigKind::Boolean.parse_value("modo_debug", "on").unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            ConfigKind::Boolean.parse_value("modo_debug", "False").unwrap(),
            Value::Bool(false)
        );
        assert!(ConfigKind::Boolean.parse_value("modo_debug", "maybe").is_err());
    }

    #[test]
    fn text_entries_keep_surrounding_spaces() {
        assert_eq!(
            ConfigKind::Text.parse_value("mensaje_bienvenida", "  Bienvenidos ").unwrap(),
            Value::String("  Bienvenidos ".into())
        );
    }

    #[test]
    fn unknown_types_are_text() {
        assert_eq!(ConfigKind::from_wire(Some("string")), ConfigKind::Text);
        assert_eq!(ConfigKind::from_wire(None), ConfigKind::Text);
        assert_eq!(ConfigKind::from_wire(Some("INTEGER")), ConfigKind::Integer);
    }
}
