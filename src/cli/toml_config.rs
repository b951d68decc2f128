use crate::compile::AssemblyInput;
use crate::config::{RuleSetting, Severity, UnknownSeverity};
use crate::rules::{LayerSpec, PatchEntry};
use serde::Deserialize;
use std::collections::BTreeMap;
use thiserror::Error;

/// Top-level TOML config file structure.
#[derive(Debug, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub lintlayers: LintlayersSection,
    #[serde(default)]
    pub settings: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub rules: BTreeMap<String, TomlRuleValue>,
    #[serde(default)]
    pub plugin: Vec<TomlPlugin>,
    #[serde(default, rename = "override")]
    pub overrides: Vec<TomlOverride>,
}

/// The `[lintlayers]` section.
#[derive(Debug, Default, Deserialize)]
pub struct LintlayersSection {
    pub name: Option<String>,
    #[serde(default)]
    pub ignores: Vec<String>,
}

/// A single `[[plugin]]` entry.
#[derive(Debug, Deserialize)]
pub struct TomlPlugin {
    pub name: String,
    #[serde(default)]
    pub rules: BTreeMap<String, TomlRuleValue>,
}

/// A single `[[override]]` entry.
#[derive(Debug, Deserialize)]
pub struct TomlOverride {
    pub name: Option<String>,
    #[serde(default)]
    pub files: Vec<String>,
    #[serde(default)]
    pub rules: BTreeMap<String, TomlRuleValue>,
    #[serde(default)]
    pub settings: BTreeMap<String, serde_json::Value>,
}

/// How a rule may be written: `2`, `"error"`, `"unset"` or
/// `["error", option, ...]`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TomlRuleValue {
    Level(i64),
    Name(String),
    Full(Vec<serde_json::Value>),
}

#[derive(Debug, Error)]
pub enum RuleValueError {
    #[error("rule '{rule}': {source}")]
    Severity {
        rule: String,
        #[source]
        source: UnknownSeverity,
    },
    #[error("rule '{rule}': \"unset\" is only allowed inside [[override]]")]
    UnsetOutsideOverride { rule: String },
    #[error("rule '{rule}': expected [severity, options...]")]
    Shape { rule: String },
}

fn parse_severity(rule: &str, raw: &serde_json::Value) -> Result<Severity, RuleValueError> {
    let parsed = match raw {
        serde_json::Value::Number(n) => n
            .as_i64()
            .and_then(Severity::from_level)
            .ok_or_else(|| UnknownSeverity(n.to_string())),
        serde_json::Value::String(s) => s.parse(),
        _ => return Err(RuleValueError::Shape { rule: rule.into() }),
    };
    parsed.map_err(|source| RuleValueError::Severity {
        rule: rule.into(),
        source,
    })
}

impl TomlRuleValue {
    /// Convert to a patch entry; `"unset"` is recognized here.
    pub fn to_patch_entry(&self, rule: &str) -> Result<PatchEntry, RuleValueError> {
        match self {
            TomlRuleValue::Name(name) if name == "unset" => Ok(PatchEntry::Unset(rule.into())),
            _ => self.to_rule_setting(rule).map(PatchEntry::Set),
        }
    }

    pub fn to_rule_setting(&self, rule: &str) -> Result<RuleSetting, RuleValueError> {
        match self {
            TomlRuleValue::Level(level) => {
                parse_severity(rule, &serde_json::Value::from(*level)).map(|s| RuleSetting::new(rule, s))
            }
            TomlRuleValue::Name(name) if name == "unset" => {
                Err(RuleValueError::UnsetOutsideOverride { rule: rule.into() })
            }
            TomlRuleValue::Name(name) => parse_severity(rule, &serde_json::Value::from(name.as_str()))
                .map(|s| RuleSetting::new(rule, s)),
            TomlRuleValue::Full(parts) => {
                let (head, options) = parts
                    .split_first()
                    .ok_or_else(|| RuleValueError::Shape { rule: rule.into() })?;
                let severity = parse_severity(rule, head)?;
                Ok(RuleSetting::new(rule, severity).with_options(options.to_vec()))
            }
        }
    }
}

fn to_settings(
    rules: &BTreeMap<String, TomlRuleValue>,
) -> Result<Vec<RuleSetting>, RuleValueError> {
    rules
        .iter()
        .map(|(id, value)| value.to_rule_setting(id))
        .collect()
}

impl TomlConfig {
    /// Convert to the plain data the assembler consumes.
    pub fn to_assembly_input(&self) -> Result<AssemblyInput, RuleValueError> {
        let plugins = self
            .plugin
            .iter()
            .map(|p| Ok((p.name.clone(), to_settings(&p.rules)?)))
            .collect::<Result<Vec<_>, RuleValueError>>()?;

        let overrides = self
            .overrides
            .iter()
            .map(|o| {
                let rules = o
                    .rules
                    .iter()
                    .map(|(id, value)| value.to_patch_entry(id))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(LayerSpec {
                    name: o.name.clone(),
                    files: o.files.clone(),
                    rules,
                    settings: o.settings.clone(),
                })
            })
            .collect::<Result<Vec<_>, RuleValueError>>()?;

        Ok(AssemblyInput {
            base: to_settings(&self.rules)?,
            plugins,
            settings: self.settings.clone(),
            overrides,
            ignores: self.lintlayers.ignores.clone(),
        })
    }
}
