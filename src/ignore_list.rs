use crate::diagnostics::Warning;
use crate::glob::{self, normalize_path, GlobError, Pattern, PatternMode};

/// Ordered ignore patterns, evaluated before any rule layer.
#[derive(Debug, Clone, Default)]
pub struct IgnoreList {
    patterns: Vec<Pattern>,
}

impl IgnoreList {
    /// Compile the list. Negated entries that can never un-ignore a path are
    /// reported as warnings: those before every positive entry, and those
    /// naming one path (no wildcards) that no earlier entry ignores. A
    /// wildcard negation after a positive entry is not checked.
    pub fn new<S: AsRef<str>>(entries: &[S]) -> Result<(Self, Vec<Warning>), GlobError> {
        let patterns = entries
            .iter()
            .map(|e| Pattern::parse(e.as_ref(), PatternMode::Ignore))
            .collect::<Result<Vec<_>, _>>()?;

        let warnings = glob::dead_negations(&patterns)
            .map(|p| Warning::UnignoreWithoutIgnore {
                pattern: p.raw().to_string(),
            })
            .collect();

        Ok((Self { patterns }, warnings))
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn is_ignored(&self, path: &str) -> bool {
        self.is_ignored_normalized(&normalize_path(path))
    }

    pub(crate) fn is_ignored_normalized(&self, normalized: &str) -> bool {
        glob::evaluate(&self.patterns, normalized)
    }
}
