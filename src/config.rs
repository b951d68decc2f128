use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Severity a rule reports at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Off,
    Warn,
    Error,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Off => "off",
            Severity::Warn => "warn",
            Severity::Error => "error",
        }
    }

    /// Map the legacy numeric constants (`0`, `1`, `2`).
    pub fn from_level(level: i64) -> Option<Self> {
        match level {
            0 => Some(Severity::Off),
            1 => Some(Severity::Warn),
            2 => Some(Severity::Error),
            _ => None,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown severity '{0}' (expected off, warn, error, 0, 1 or 2)")]
pub struct UnknownSeverity(pub String);

impl FromStr for Severity {
    type Err = UnknownSeverity;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "off" | "0" => Ok(Severity::Off),
            "warn" | "warning" | "1" => Ok(Severity::Warn),
            "error" | "2" => Ok(Severity::Error),
            _ => Err(UnknownSeverity(s.to_string())),
        }
    }
}

impl Serialize for Severity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// One rule's configured state.
///
/// `options` is owned by the rule implementation; the engine never looks
/// inside it. An empty vector means the rule runs with its defaults.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleSetting {
    pub id: String,
    pub severity: Severity,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<serde_json::Value>,
}

impl RuleSetting {
    pub fn new(id: impl Into<String>, severity: Severity) -> Self {
        Self {
            id: id.into(),
            severity,
            options: Vec::new(),
        }
    }

    pub fn with_options(mut self, options: Vec<serde_json::Value>) -> Self {
        self.options = options;
        self
    }
}

/// The rules and shared settings in force for one file.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EffectiveConfig {
    pub rules: BTreeMap<String, RuleSetting>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub settings: BTreeMap<String, serde_json::Value>,
}

impl EffectiveConfig {
    pub fn rule(&self, id: &str) -> Option<&RuleSetting> {
        self.rules.get(id)
    }

    pub fn severity(&self, id: &str) -> Option<Severity> {
        self.rules.get(id).map(|r| r.severity)
    }

    /// Rules that will actually run, i.e. not `off`.
    pub fn active(&self) -> impl Iterator<Item = &RuleSetting> {
        self.rules.values().filter(|r| r.severity != Severity::Off)
    }
}
