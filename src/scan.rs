use crate::cache::MemoizedConfig;
use crate::cli::toml_config::{RuleValueError, TomlConfig};
use crate::compile::{self, CompiledConfig, Resolution};
use crate::diagnostics::{AssemblyError, Warning};
use crate::glob::normalize_path;
use ignore::WalkBuilder;
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("failed to read config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),
    #[error("invalid rule: {0}")]
    RuleValue(#[from] RuleValueError),
    #[error("invalid configuration: {0}")]
    Assembly(#[from] AssemblyError),
}

/// A config file loaded and assembled.
#[derive(Debug)]
pub struct LoadedConfig {
    pub name: Option<String>,
    pub config: CompiledConfig,
    pub warnings: Vec<Warning>,
}

/// Read, parse and assemble a TOML config file.
pub fn load_config(config_path: &Path) -> Result<LoadedConfig, ScanError> {
    let text = fs::read_to_string(config_path).map_err(|source| ScanError::ConfigRead {
        path: config_path.to_path_buf(),
        source,
    })?;
    let toml_config: TomlConfig = toml::from_str(&text)?;
    let input = toml_config.to_assembly_input()?;
    let assembled = compile::assemble(input)?;

    Ok(LoadedConfig {
        name: toml_config.lintlayers.name,
        config: assembled.config,
        warnings: assembled.warnings,
    })
}

#[derive(Debug)]
pub struct FileResolution {
    /// Path relative to the pattern root, `/`-separated.
    pub file: String,
    pub resolution: Resolution,
    /// Labels of the override layers applied to the file. Empty when ignored.
    pub layers: Vec<String>,
}

#[derive(Debug)]
pub struct ScanResult {
    pub config_name: Option<String>,
    pub files: Vec<FileResolution>,
    pub warnings: Vec<Warning>,
}

impl ScanResult {
    pub fn ignored_count(&self) -> usize {
        self.files
            .iter()
            .filter(|f| f.resolution.is_ignored())
            .count()
    }
}

/// Resolve every file under `target_paths` against the config at
/// `config_path`. Patterns are matched relative to `root`, or to the config
/// file's directory when `root` is `None`.
pub fn run_scan(
    config_path: &Path,
    target_paths: &[PathBuf],
    root: Option<&Path>,
) -> Result<ScanResult, ScanError> {
    let loaded = load_config(config_path)?;

    let root = match root {
        Some(r) => r.to_path_buf(),
        None => match config_path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        },
    };
    let root_abs = fs::canonicalize(&root).unwrap_or(root);

    // Every file is collected, including ones the config ignores, so the
    // report can show them as ignored.
    let mut files: Vec<PathBuf> = Vec::new();
    for target in target_paths {
        if target.is_file() {
            files.push(target.clone());
            continue;
        }
        let walker = WalkBuilder::new(target)
            .standard_filters(false)
            .filter_entry(|e| e.file_name() != ".git")
            .build();
        for entry in walker {
            match entry {
                Ok(e) if e.file_type().is_some_and(|t| t.is_file()) => files.push(e.into_path()),
                Ok(_) => {}
                Err(err) => tracing::warn!("skipping unreadable entry: {}", err),
            }
        }
    }

    let memo = MemoizedConfig::new(Arc::new(loaded.config));
    let mut resolved: Vec<FileResolution> = files
        .par_iter()
        .map(|path| {
            let file = relative_to(&root_abs, path);
            let resolution = memo.effective_config(&file);
            let layers = if resolution.is_ignored() {
                Vec::new()
            } else {
                memo.config()
                    .matching_layers(&file)
                    .into_iter()
                    .map(String::from)
                    .collect()
            };
            FileResolution {
                file,
                resolution,
                layers,
            }
        })
        .collect();
    resolved.sort_by(|a, b| a.file.cmp(&b.file));
    resolved.dedup_by(|a, b| a.file == b.file);

    let (hits, misses) = memo.stats();
    tracing::debug!(files = resolved.len(), hits, misses, "resolved files");

    Ok(ScanResult {
        config_name: loaded.name,
        files: resolved,
        warnings: loaded.warnings,
    })
}

fn relative_to(root_abs: &Path, path: &Path) -> String {
    let abs = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    let rel = abs.strip_prefix(root_abs).unwrap_or(path);
    normalize_path(&rel.to_string_lossy())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Severity;
    use tempfile::TempDir;

    const CONFIG: &str = r#"
[lintlayers]
name = "fixture"
ignores = ["node_modules/", "*.log", "!keep.log"]

[rules]
semi = "error"

[[override]]
name = "tests"
files = ["**/*.test.ts"]
rules = { semi = "warn" }
"#;

    fn fixture() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::write(root.join("lintlayers.toml"), CONFIG).unwrap();
        fs::create_dir_all(root.join("src")).unwrap();
        fs::create_dir_all(root.join("node_modules/pkg")).unwrap();
        fs::write(root.join("src/app.ts"), "").unwrap();
        fs::write(root.join("src/app.test.ts"), "").unwrap();
        fs::write(root.join("node_modules/pkg/index.ts"), "").unwrap();
        fs::write(root.join("debug.log"), "").unwrap();
        fs::write(root.join("keep.log"), "").unwrap();
        dir
    }

    fn entry<'a>(result: &'a ScanResult, file: &str) -> &'a FileResolution {
        result
            .files
            .iter()
            .find(|f| f.file == file)
            .unwrap_or_else(|| panic!("{} not scanned", file))
    }

    fn find<'a>(result: &'a ScanResult, file: &str) -> &'a Resolution {
        &entry(result, file).resolution
    }

    #[test]
    fn resolves_a_directory_tree() {
        let dir = fixture();
        let root = dir.path();
        let result = run_scan(&root.join("lintlayers.toml"), &[root.to_path_buf()], None).unwrap();

        assert_eq!(result.config_name.as_deref(), Some("fixture"));
        assert!(result.warnings.is_empty());

        let app = find(&result, "src/app.ts").config().unwrap();
        assert_eq!(app.severity("semi"), Some(Severity::Error));
        let test = find(&result, "src/app.test.ts").config().unwrap();
        assert_eq!(test.severity("semi"), Some(Severity::Warn));

        assert!(find(&result, "node_modules/pkg/index.ts").is_ignored());
        assert!(find(&result, "debug.log").is_ignored());
        assert!(!find(&result, "keep.log").is_ignored());
        assert_eq!(result.ignored_count(), 2);

        assert_eq!(entry(&result, "src/app.test.ts").layers, vec!["'tests'"]);
        assert!(entry(&result, "src/app.ts").layers.is_empty());
    }

    #[test]
    fn single_file_target() {
        let dir = fixture();
        let root = dir.path();
        let result = run_scan(
            &root.join("lintlayers.toml"),
            &[root.join("src/app.test.ts")],
            Some(root),
        )
        .unwrap();
        assert_eq!(result.files.len(), 1);
        assert_eq!(result.files[0].file, "src/app.test.ts");
    }

    #[test]
    fn missing_config_is_an_error() {
        let dir = TempDir::new().unwrap();
        let err = run_scan(&dir.path().join("nope.toml"), &[], None).unwrap_err();
        assert!(matches!(err, ScanError::ConfigRead { .. }));
    }

    #[test]
    fn structural_errors_surface() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("lintlayers.toml");
        fs::write(&path, "[lintlayers]\nignores = [\"{a,b\"]\n").unwrap();
        let err = load_config(&path).unwrap_err();
        assert!(matches!(err, ScanError::Assembly(_)), "got {:?}", err);
        assert!(err.to_string().starts_with("invalid configuration: ignores:"));
    }
}
