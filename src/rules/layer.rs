use crate::config::{EffectiveConfig, RuleSetting};
use crate::diagnostics::{AssemblyError, Warning};
use crate::glob::{self, GlobSelector};
use std::collections::{BTreeMap, HashSet};

/// One change an override makes to a rule.
#[derive(Debug, Clone, PartialEq)]
pub enum PatchEntry {
    /// Replace the rule's setting outright, options included.
    Set(RuleSetting),
    /// Drop the rule from the result.
    Unset(String),
}

impl PatchEntry {
    pub fn rule_id(&self) -> &str {
        match self {
            PatchEntry::Set(setting) => &setting.id,
            PatchEntry::Unset(id) => id,
        }
    }
}

/// Uncompiled override layer as handed over by the host.
#[derive(Debug, Clone, Default)]
pub struct LayerSpec {
    pub name: Option<String>,
    pub files: Vec<String>,
    pub rules: Vec<PatchEntry>,
    pub settings: BTreeMap<String, serde_json::Value>,
}

/// A file selector plus the rule and settings patch applied to matching
/// files.
#[derive(Debug, Clone)]
pub struct OverrideLayer {
    label: String,
    selector: GlobSelector,
    rules: Vec<PatchEntry>,
    settings: BTreeMap<String, serde_json::Value>,
}

impl OverrideLayer {
    /// Compile a layer. `index` is its zero-based position in the chain and
    /// names unnamed layers in messages.
    pub fn compile(spec: LayerSpec, index: usize) -> Result<(Self, Vec<Warning>), AssemblyError> {
        let label = match &spec.name {
            Some(name) => format!("'{}'", name),
            None => format!("#{}", index + 1),
        };

        let selector = GlobSelector::new(&spec.files).map_err(|source| AssemblyError::Glob {
            context: format!("override {} files", label),
            source,
        })?;

        let mut seen = HashSet::new();
        for entry in &spec.rules {
            if !seen.insert(entry.rule_id()) {
                return Err(AssemblyError::DuplicatePatchEntry {
                    layer: label,
                    rule: entry.rule_id().to_string(),
                });
            }
        }

        let warnings = glob::dead_negations(selector.patterns())
            .map(|p| Warning::DeadSelectorNegation {
                layer: label.clone(),
                pattern: p.raw().to_string(),
            })
            .collect();

        Ok((
            Self {
                label,
                selector,
                rules: spec.rules,
                settings: spec.settings,
            },
            warnings,
        ))
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn rules(&self) -> &[PatchEntry] {
        &self.rules
    }

    pub fn applies_to(&self, normalized: &str) -> bool {
        self.selector.is_match(normalized)
    }

    /// Apply this layer to `base` for the given normalized path. A layer
    /// whose selector does not match returns `base` untouched.
    pub fn apply(&self, mut base: EffectiveConfig, normalized: &str) -> EffectiveConfig {
        if !self.applies_to(normalized) {
            return base;
        }

        for entry in &self.rules {
            match entry {
                PatchEntry::Set(setting) => {
                    base.rules.insert(setting.id.clone(), setting.clone());
                }
                PatchEntry::Unset(id) => {
                    base.rules.remove(id);
                }
            }
        }
        for (key, value) in &self.settings {
            base.settings.insert(key.clone(), value.clone());
        }
        base
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Severity;
    use serde_json::json;

    fn layer(files: &[&str], rules: Vec<PatchEntry>) -> OverrideLayer {
        let spec = LayerSpec {
            files: files.iter().map(|f| f.to_string()).collect(),
            rules,
            ..Default::default()
        };
        OverrideLayer::compile(spec, 0).unwrap().0
    }

    fn base() -> EffectiveConfig {
        let mut config = EffectiveConfig::default();
        config.rules.insert(
            "quotes".into(),
            RuleSetting::new("quotes", Severity::Error)
                .with_options(vec![json!("single"), json!({ "avoidEscape": true })]),
        );
        config
    }

    #[test]
    fn replaces_options_wholesale() {
        let l = layer(
            &["**/*.ts"],
            vec![PatchEntry::Set(
                RuleSetting::new("quotes", Severity::Warn).with_options(vec![json!("double")]),
            )],
        );
        let out = l.apply(base(), "src/a.ts");
        let quotes = out.rule("quotes").unwrap();
        assert_eq!(quotes.severity, Severity::Warn);
        assert_eq!(quotes.options, vec![json!("double")]);
    }

    #[test]
    fn non_matching_layer_is_noop() {
        let l = layer(&["**/*.md"], vec![PatchEntry::Unset("quotes".into())]);
        assert_eq!(l.apply(base(), "src/a.ts"), base());
    }

    #[test]
    fn unset_removes_rule() {
        let l = layer(&["**/*.ts"], vec![PatchEntry::Unset("quotes".into())]);
        let out = l.apply(base(), "src/a.ts");
        assert!(out.rule("quotes").is_none());
    }

    #[test]
    fn settings_are_replaced_per_key() {
        let mut start = base();
        start
            .settings
            .insert("react".into(), json!({ "version": "detect", "pragma": "h" }));
        let spec = LayerSpec {
            files: vec!["legacy/**".into()],
            settings: BTreeMap::from([("react".to_string(), json!({ "version": "16.0" }))]),
            ..Default::default()
        };
        let (l, _) = OverrideLayer::compile(spec, 3).unwrap();
        assert_eq!(l.label(), "#4");
        let out = l.apply(start, "legacy/old.jsx");
        assert_eq!(out.settings["react"], json!({ "version": "16.0" }));
    }

    #[test]
    fn duplicate_patch_entry_is_fatal() {
        let spec = LayerSpec {
            name: Some("tests".into()),
            files: vec!["**/*.test.ts".into()],
            rules: vec![
                PatchEntry::Unset("semi".into()),
                PatchEntry::Set(RuleSetting::new("semi", Severity::Off)),
            ],
            ..Default::default()
        };
        let err = OverrideLayer::compile(spec, 0).unwrap_err();
        assert_eq!(err.to_string(), "override 'tests' sets rule 'semi' twice");
    }

    #[test]
    fn malformed_selector_names_layer() {
        let spec = LayerSpec {
            files: vec!["src/{a,b".into()],
            ..Default::default()
        };
        let err = OverrideLayer::compile(spec, 1).unwrap_err();
        assert!(err.to_string().starts_with("override #2 files:"), "{}", err);
    }

    #[test]
    fn leading_negation_warns() {
        let spec = LayerSpec {
            files: vec!["!**/*.d.ts".into(), "**/*.ts".into()],
            ..Default::default()
        };
        let (_, warnings) = OverrideLayer::compile(spec, 0).unwrap();
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn negating_unselected_file_warns() {
        let spec = LayerSpec {
            name: Some("stories".into()),
            files: vec!["**/*.stories.tsx".into(), "!src/Legacy.tsx".into()],
            ..Default::default()
        };
        let (_, warnings) = OverrideLayer::compile(spec, 0).unwrap();
        assert_eq!(
            warnings,
            vec![Warning::DeadSelectorNegation {
                layer: "'stories'".into(),
                pattern: "!src/Legacy.tsx".into()
            }]
        );
    }
}
