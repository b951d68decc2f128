//! Assembly outcomes: fatal structural errors and non-fatal warnings.

use crate::glob::GlobError;
use thiserror::Error;

/// A structural problem that aborts assembly.
#[derive(Debug, Error)]
pub enum AssemblyError {
    #[error("{context}: {source}")]
    Glob {
        context: String,
        #[source]
        source: GlobError,
    },
    #[error("rule '{rule}' is declared twice in {source_name}")]
    DuplicateRule { source_name: String, rule: String },
    #[error("rule source '{0}' is registered twice")]
    DuplicateSource(String),
    #[error("override {layer} sets rule '{rule}' twice")]
    DuplicatePatchEntry { layer: String, rule: String },
}

/// A non-fatal finding recorded while assembling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    BaseRuleOverridden {
        rule: String,
        plugin: String,
    },
    AmbiguousPluginRule {
        rule: String,
        first: String,
        second: String,
    },
    UnignoreWithoutIgnore {
        pattern: String,
    },
    DeadSelectorNegation {
        layer: String,
        pattern: String,
    },
    UnknownRule {
        layer: String,
        rule: String,
    },
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Warning::BaseRuleOverridden { rule, plugin } => {
                write!(f, "plugin '{}' redefines base rule '{}'", plugin, rule)
            }
            Warning::AmbiguousPluginRule {
                rule,
                first,
                second,
            } => write!(
                f,
                "rule '{}' is defined by both '{}' and '{}'; '{}' wins",
                rule, first, second, second
            ),
            Warning::UnignoreWithoutIgnore { pattern } => {
                write!(f, "ignore entry '{}' cannot un-ignore anything", pattern)
            }
            Warning::DeadSelectorNegation { layer, pattern } => write!(
                f,
                "override {}: '{}' excludes nothing an earlier pattern selects",
                layer, pattern
            ),
            Warning::UnknownRule { layer, rule } => {
                write!(f, "override {} sets unregistered rule '{}'", layer, rule)
            }
        }
    }
}

/// Collects warnings and logs each one as it is recorded.
#[derive(Debug, Default)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    pub fn push(&mut self, warning: Warning) {
        tracing::warn!("{}", warning);
        self.warnings.push(warning);
    }

    pub fn extend(&mut self, warnings: impl IntoIterator<Item = Warning>) {
        for w in warnings {
            self.push(w);
        }
    }

    pub fn into_warnings(self) -> Vec<Warning> {
        self.warnings
    }
}
