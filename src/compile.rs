//! Assembly of a compiled configuration and per-path resolution.

use crate::config::{EffectiveConfig, RuleSetting};
use crate::diagnostics::{AssemblyError, Diagnostics, Warning};
use crate::glob::normalize_path;
use crate::ignore_list::IgnoreList;
use crate::rules::{LayerSpec, OverrideLayer, PatchEntry, RuleCatalog, RuleSource};
use serde::Serialize;
use std::collections::BTreeMap;

/// Everything the host hands over for assembly, as plain data.
#[derive(Debug, Clone, Default)]
pub struct AssemblyInput {
    pub base: Vec<RuleSetting>,
    /// Plugin rule sets in declaration order.
    pub plugins: Vec<(String, Vec<RuleSetting>)>,
    pub settings: BTreeMap<String, serde_json::Value>,
    pub overrides: Vec<LayerSpec>,
    pub ignores: Vec<String>,
}

/// A successfully assembled configuration and the warnings found on the way.
#[derive(Debug)]
pub struct Assembled {
    pub config: CompiledConfig,
    pub warnings: Vec<Warning>,
}

/// Outcome of resolving one path.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Resolution {
    Ignored,
    Active(EffectiveConfig),
}

impl Resolution {
    pub fn is_ignored(&self) -> bool {
        matches!(self, Resolution::Ignored)
    }

    pub fn config(&self) -> Option<&EffectiveConfig> {
        match self {
            Resolution::Ignored => None,
            Resolution::Active(config) => Some(config),
        }
    }
}

/// Immutable result of assembly. Safe to share across threads and query
/// concurrently.
#[derive(Debug, Clone)]
pub struct CompiledConfig {
    catalog: RuleCatalog,
    base: EffectiveConfig,
    layers: Vec<OverrideLayer>,
    ignores: IgnoreList,
}

/// Build a compiled configuration. Fails on the first structural error;
/// nothing partially built escapes.
pub fn assemble(input: AssemblyInput) -> Result<Assembled, AssemblyError> {
    let mut diags = Diagnostics::default();

    let mut catalog = RuleCatalog::new();
    diags.extend(catalog.register(RuleSource::Base, input.base)?);
    for (name, settings) in input.plugins {
        diags.extend(catalog.register(RuleSource::Plugin(name), settings)?);
    }

    let (ignores, ignore_warnings) =
        IgnoreList::new(&input.ignores).map_err(|source| AssemblyError::Glob {
            context: "ignores".to_string(),
            source,
        })?;
    diags.extend(ignore_warnings);

    let mut layers = Vec::with_capacity(input.overrides.len());
    for (index, spec) in input.overrides.into_iter().enumerate() {
        let (layer, warnings) = OverrideLayer::compile(spec, index)?;
        diags.extend(warnings);
        for entry in layer.rules() {
            if let PatchEntry::Set(setting) = entry {
                if !catalog.contains(&setting.id) {
                    diags.push(Warning::UnknownRule {
                        layer: layer.label().to_string(),
                        rule: setting.id.clone(),
                    });
                }
            }
        }
        layers.push(layer);
    }

    let base = EffectiveConfig {
        rules: catalog.defaults(),
        settings: input.settings,
    };

    tracing::debug!(
        rules = catalog.len(),
        layers = layers.len(),
        ignores = ignores.len(),
        "assembled configuration"
    );

    Ok(Assembled {
        config: CompiledConfig {
            catalog,
            base,
            layers,
            ignores,
        },
        warnings: diags.into_warnings(),
    })
}

impl CompiledConfig {
    pub fn catalog(&self) -> &RuleCatalog {
        &self.catalog
    }

    pub fn layers(&self) -> &[OverrideLayer] {
        &self.layers
    }

    pub fn is_ignored(&self, path: &str) -> bool {
        self.ignores.is_ignored(path)
    }

    /// Resolve the rules in force for `path`.
    pub fn effective_config(&self, path: &str) -> Resolution {
        let normalized = normalize_path(path);
        if self.ignores.is_ignored_normalized(&normalized) {
            return Resolution::Ignored;
        }
        let config = self
            .layers
            .iter()
            .fold(self.base.clone(), |acc, layer| layer.apply(acc, &normalized));
        Resolution::Active(config)
    }

    /// Labels of the override layers whose selectors match `path`, in
    /// application order.
    pub fn matching_layers(&self, path: &str) -> Vec<&str> {
        let normalized = normalize_path(path);
        self.layers
            .iter()
            .filter(|l| l.applies_to(&normalized))
            .map(|l| l.label())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Severity;
    use serde_json::json;

    fn set(id: &str, severity: Severity) -> PatchEntry {
        PatchEntry::Set(RuleSetting::new(id, severity))
    }

    fn layer(files: &[&str], rules: Vec<PatchEntry>) -> LayerSpec {
        LayerSpec {
            files: files.iter().map(|f| f.to_string()).collect(),
            rules,
            ..Default::default()
        }
    }

    fn scenario() -> AssemblyInput {
        AssemblyInput {
            base: vec![RuleSetting::new("semi", Severity::Error)],
            plugins: vec![(
                "react".into(),
                vec![RuleSetting::new("react/jsx-uses-react", Severity::Error)],
            )],
            overrides: vec![layer(
                &["**/*.test.ts"],
                vec![set("jest/valid-expect", Severity::Off)],
            )],
            ..Default::default()
        }
    }

    fn rules_of(resolution: &Resolution) -> Vec<(String, Severity)> {
        resolution
            .config()
            .expect("path should not be ignored")
            .rules
            .values()
            .map(|r| (r.id.clone(), r.severity))
            .collect()
    }

    #[test]
    fn base_plugin_and_test_override() {
        let assembled = assemble(scenario()).unwrap();
        let config = assembled.config;

        assert_eq!(
            rules_of(&config.effective_config("src/app.ts")),
            vec![
                ("react/jsx-uses-react".to_string(), Severity::Error),
                ("semi".to_string(), Severity::Error),
            ]
        );
        assert_eq!(
            rules_of(&config.effective_config("src/app.test.ts")),
            vec![
                ("jest/valid-expect".to_string(), Severity::Off),
                ("react/jsx-uses-react".to_string(), Severity::Error),
                ("semi".to_string(), Severity::Error),
            ]
        );
        assert_eq!(
            assembled.warnings,
            vec![Warning::UnknownRule {
                layer: "#1".into(),
                rule: "jest/valid-expect".into()
            }]
        );
    }

    #[test]
    fn resolution_is_deterministic() {
        let config = assemble(scenario()).unwrap().config;
        assert_eq!(
            config.effective_config("./src/app.test.ts"),
            config.effective_config("src/app.test.ts")
        );
    }

    #[test]
    fn later_layer_wins() {
        let mut input = scenario();
        input.overrides = vec![
            layer(&["*.ts"], vec![set("semi", Severity::Warn)]),
            layer(&["*.ts"], vec![set("semi", Severity::Error)]),
        ];
        let config = assemble(input).unwrap().config;
        let res = config.effective_config("src/deep/file.ts");
        assert_eq!(res.config().unwrap().severity("semi"), Some(Severity::Error));
        assert_eq!(config.matching_layers("src/deep/file.ts"), vec!["#1", "#2"]);
    }

    #[test]
    fn unset_after_set_removes() {
        let mut input = scenario();
        input.overrides = vec![
            layer(&["**/*.ts"], vec![set("curly", Severity::Error)]),
            layer(&["**/*.ts"], vec![PatchEntry::Unset("curly".into())]),
        ];
        let config = assemble(input).unwrap().config;
        let res = config.effective_config("a.ts");
        assert!(res.config().unwrap().rule("curly").is_none());
    }

    #[test]
    fn ignore_beats_every_layer() {
        let mut input = scenario();
        input.ignores = vec!["node_modules/".into()];
        input.overrides = vec![layer(&["**/*.ts"], vec![set("semi", Severity::Off)])];
        let config = assemble(input).unwrap().config;
        assert_eq!(
            config.effective_config("node_modules/x/y.ts"),
            Resolution::Ignored
        );
        assert!(config.is_ignored("node_modules/x/y.ts"));
        assert!(!config.effective_config("src/y.ts").is_ignored());
    }

    #[test]
    fn settings_flow_through_layers() {
        let mut input = scenario();
        input.settings = BTreeMap::from([("react".to_string(), json!({ "version": "detect" }))]);
        let mut legacy = layer(&["legacy/**"], vec![]);
        legacy
            .settings
            .insert("react".into(), json!({ "version": "16.14" }));
        input.overrides = vec![legacy];
        let config = assemble(input).unwrap().config;

        let modern = config.effective_config("src/a.tsx");
        assert_eq!(modern.config().unwrap().settings["react"]["version"], "detect");
        let old = config.effective_config("legacy/a.jsx");
        assert_eq!(old.config().unwrap().settings["react"]["version"], "16.14");
    }

    #[test]
    fn structural_error_aborts_assembly() {
        let mut input = scenario();
        input.ignores = vec!["logs".into(), "{dist,build".into()];
        let err = assemble(input).unwrap_err();
        assert!(matches!(err, AssemblyError::Glob { ref context, .. } if context == "ignores"));

        let mut input = scenario();
        input.base.push(RuleSetting::new("semi", Severity::Warn));
        assert!(matches!(
            assemble(input).unwrap_err(),
            AssemblyError::DuplicateRule { .. }
        ));
    }

    #[test]
    fn json_shape_of_resolutions() {
        let config = assemble(scenario()).unwrap().config;
        let active = serde_json::to_value(config.effective_config("src/app.ts")).unwrap();
        assert_eq!(active["status"], "active");
        assert_eq!(active["rules"]["semi"]["severity"], "error");
        assert_eq!(
            serde_json::to_value(Resolution::Ignored).unwrap(),
            json!({ "status": "ignored" })
        );
    }
}
