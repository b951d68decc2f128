use crate::config::RuleSetting;
use crate::diagnostics::{AssemblyError, Warning};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

/// Where a rule definition came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RuleSource {
    Base,
    Plugin(String),
}

impl fmt::Display for RuleSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleSource::Base => f.write_str("base"),
            RuleSource::Plugin(name) => write!(f, "plugin '{}'", name),
        }
    }
}

#[derive(Debug, Clone)]
struct CatalogEntry {
    setting: RuleSetting,
    source: RuleSource,
}

/// Default settings for every known rule, merged across the base set and
/// plugin sets in registration order.
#[derive(Debug, Clone, Default)]
pub struct RuleCatalog {
    entries: BTreeMap<String, CatalogEntry>,
    sources: Vec<RuleSource>,
}

impl RuleCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one source's rules.
    ///
    /// A repeated id inside `settings` is fatal. A repeated id across
    /// sources replaces the earlier definition and yields a warning.
    pub fn register(
        &mut self,
        source: RuleSource,
        settings: Vec<RuleSetting>,
    ) -> Result<Vec<Warning>, AssemblyError> {
        if self.sources.contains(&source) {
            return Err(AssemblyError::DuplicateSource(source.to_string()));
        }

        let mut seen = HashSet::new();
        for setting in &settings {
            if !seen.insert(setting.id.as_str()) {
                return Err(AssemblyError::DuplicateRule {
                    source_name: source.to_string(),
                    rule: setting.id.clone(),
                });
            }
        }

        let mut warnings = Vec::new();
        for setting in settings {
            let id = setting.id.clone();
            let previous = self.entries.insert(
                id.clone(),
                CatalogEntry {
                    setting,
                    source: source.clone(),
                },
            );
            match (previous.map(|p| p.source), &source) {
                (Some(RuleSource::Base), RuleSource::Plugin(plugin)) => {
                    warnings.push(Warning::BaseRuleOverridden {
                        rule: id,
                        plugin: plugin.clone(),
                    });
                }
                (Some(RuleSource::Plugin(first)), RuleSource::Plugin(second)) => {
                    warnings.push(Warning::AmbiguousPluginRule {
                        rule: id,
                        first,
                        second: second.clone(),
                    });
                }
                _ => {}
            }
        }

        tracing::debug!(source = %source, rules = self.entries.len(), "registered rule source");
        self.sources.push(source);
        Ok(warnings)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&RuleSetting> {
        self.entries.get(id).map(|e| &e.setting)
    }

    pub fn source_of(&self, id: &str) -> Option<&RuleSource> {
        self.entries.get(id).map(|e| &e.source)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The merged defaults, keyed by rule id.
    pub fn defaults(&self) -> BTreeMap<String, RuleSetting> {
        self.entries
            .iter()
            .map(|(id, e)| (id.clone(), e.setting.clone()))
            .collect()
    }
}
