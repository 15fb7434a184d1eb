// ── System state domain types ──

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// Operating mode of the auditorium AV system.
///
/// The wire name is the upper-case variant name. The server may label
/// the active mode with extra text (`"CINE 3D"`); [`Mode::from_label`]
/// recovers the mode from such labels.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
    IntoStaticStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum Mode {
    Conferencia,
    Cine,
    Standby,
    Off,
}

impl Mode {
    /// Name sent in `{modo}` request bodies.
    pub fn wire_name(self) -> &'static str {
        self.into()
    }

    /// Switching to this mode needs explicit confirmation first.
    pub fn is_destructive(self) -> bool {
        matches!(self, Self::Off)
    }

    /// Parse a served mode label such as `"CINE 3D"`.
    pub fn from_label(label: &str) -> Option<Self> {
        let first = label.split_whitespace().next()?;
        first.parse().ok()
    }
}

/// Status indicator class derived from the served mode label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Indicator {
    On,
    Standby,
    Off,
}

impl Indicator {
    /// `OFF` and `STANDBY` get their own classes; any other label is "on".
    pub fn for_label(label: &str) -> Self {
        match label.trim().to_ascii_uppercase().as_str() {
            "OFF" => Self::Off,
            "STANDBY" => Self::Standby,
            _ => Self::On,
        }
    }
}

/// A reported metric: the text exactly as served, plus its numeric part
/// when one could be read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub value: Option<f64>,
    pub display: String,
}

impl Metric {
    pub fn from_number(value: f64) -> Self {
        Self {
            value: Some(value),
            display: format_number(value),
        }
    }

    /// Keep `text` verbatim; read a leading number out of it (`"88%"` -> 88).
    pub fn from_text(text: &str) -> Self {
        let numeric: String = text
            .trim()
            .chars()
            .take_while(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
            .collect();
        Self {
            value: numeric.parse().ok(),
            display: text.to_owned(),
        }
    }
}

fn format_number(value: f64) -> String {
    if value.fract().abs() < f64::EPSILON && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        value.to_string()
    }
}

/// Server-owned system state. Replaced wholesale on every poll or
/// successful command, never patched field by field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemState {
    /// Mode label as served (`"CINE 3D"`).
    pub mode_label: String,
    /// Parsed mode, if the label names a known one.
    pub mode: Option<Mode>,
    pub cpu_load: Metric,
    pub latency: Metric,
}

impl SystemState {
    pub fn indicator(&self) -> Indicator {
        Indicator::for_label(&self.mode_label)
    }
}
