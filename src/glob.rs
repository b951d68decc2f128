//! Glob patterns and selectors over normalized, `/`-separated paths.
//!
//! Patterns follow ignore-file conventions on top of `globset` syntax:
//! a pattern with no inner `/` matches at any depth, a leading `/` anchors
//! it to the root, and a trailing `/` restricts it to directory contents.
//! A leading `!` negates the pattern.

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GlobError {
    #[error("empty glob pattern")]
    Empty,
    #[error("invalid glob pattern '{pattern}': {source}")]
    Invalid {
        pattern: String,
        #[source]
        source: globset::Error,
    },
}

/// Where a pattern is used. Ignore entries also cover everything beneath a
/// matched directory; selector entries match only what they name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternMode {
    Selector,
    Ignore,
}

/// Normalize a path to `/` separators with no `.` or empty segments.
pub fn normalize_path(path: &str) -> String {
    path.replace('\\', "/")
        .split('/')
        .filter(|seg| !seg.is_empty() && *seg != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// Rewrite `**` that shares a segment with other characters, which
/// `globset` would read as `*`. Each such `**` becomes either `*` or
/// `*/**/*`, so `src/**.ts` yields `src/*.ts` and `src/*/**/*.ts`.
fn expand_inline_double_star(glob: &str) -> Vec<String> {
    let mut variants = vec![String::new()];
    for (i, segment) in glob.split('/').enumerate() {
        let options: Vec<String> = if segment == "**" || !segment.contains("**") {
            vec![segment.to_string()]
        } else {
            let mut pieces = segment.split("**");
            let mut acc = vec![pieces.next().unwrap_or_default().to_string()];
            for piece in pieces {
                acc = acc
                    .into_iter()
                    .flat_map(|a| [format!("{}*{}", a, piece), format!("{}*/**/*{}", a, piece)])
                    .collect();
            }
            acc
        };
        variants = variants
            .iter()
            .flat_map(|v| {
                options.iter().map(move |o| {
                    if i == 0 {
                        o.clone()
                    } else {
                        format!("{}/{}", v, o)
                    }
                })
            })
            .collect();
    }
    variants
}

/// A single compiled pattern, possibly negated.
#[derive(Debug, Clone)]
pub struct Pattern {
    raw: String,
    negated: bool,
    /// The normalized body when it names exactly one root-relative path.
    literal: Option<String>,
    set: GlobSet,
}

impl Pattern {
    pub fn parse(raw: &str, mode: PatternMode) -> Result<Self, GlobError> {
        let (negated, body) = match raw.strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (false, raw),
        };

        // Patterns use the same separator convention as normalized paths.
        let body = body.replace('\\', "/");
        let dir_only = body.ends_with('/');
        let anchored = body.starts_with('/') || body.starts_with("./");
        let body = normalize_path(&body);
        if body.is_empty() {
            return Err(GlobError::Empty);
        }

        let base = if anchored || body.contains('/') || body == "**" || body.starts_with("**/") {
            body.clone()
        } else {
            format!("**/{}", body)
        };

        let mut globs = Vec::with_capacity(2);
        if !dir_only {
            globs.push(base.clone());
        }
        if dir_only || (mode == PatternMode::Ignore && !base.ends_with("/**")) {
            globs.push(format!("{}/**", base));
        }

        let mut builder = GlobSetBuilder::new();
        for glob in globs.iter().flat_map(|g| expand_inline_double_star(g)) {
            let compiled = GlobBuilder::new(&glob)
                .literal_separator(true)
                .backslash_escape(false)
                .build()
                .map_err(|source| GlobError::Invalid {
                    pattern: raw.to_string(),
                    source,
                })?;
            builder.add(compiled);
        }
        let set = builder.build().map_err(|source| GlobError::Invalid {
            pattern: raw.to_string(),
            source,
        })?;

        let literal = (!dir_only
            && (anchored || body.contains('/'))
            && !body.contains(['*', '?', '[', ']', '{', '}']))
        .then_some(body);

        Ok(Self {
            raw: raw.to_string(),
            negated,
            literal,
            set,
        })
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn is_negated(&self) -> bool {
        self.negated
    }

    /// Match against an already-normalized path, ignoring negation.
    pub fn is_match(&self, normalized: &str) -> bool {
        self.set.is_match(normalized)
    }
}

/// Evaluate an ordered pattern list against a normalized path.
///
/// State starts `false`. A positive match sets it, a negated match clears
/// it, but only once it has been set.
pub(crate) fn evaluate<'a, I>(patterns: I, normalized: &str) -> bool
where
    I: IntoIterator<Item = &'a Pattern>,
{
    let mut state = false;
    for pattern in patterns {
        if pattern.negated {
            if state && pattern.is_match(normalized) {
                state = false;
            }
        } else if !state && pattern.is_match(normalized) {
            state = true;
        }
    }
    state
}

/// Negated patterns that can never clear anything: those with no positive
/// pattern before them, and those naming a single path that no earlier
/// positive pattern matches. Negations with wildcards are only checked for
/// the first condition.
pub(crate) fn dead_negations(patterns: &[Pattern]) -> impl Iterator<Item = &Pattern> {
    patterns.iter().enumerate().filter_map(move |(i, p)| {
        if !p.negated {
            return None;
        }
        let mut earlier = patterns[..i].iter().filter(|e| !e.negated).peekable();
        let dead = match &p.literal {
            _ if earlier.peek().is_none() => true,
            Some(path) => !earlier.any(|e| e.is_match(path)),
            None => false,
        };
        dead.then_some(p)
    })
}

/// Match one pattern against one path.
pub fn matches(pattern: &str, path: &str) -> Result<bool, GlobError> {
    let compiled = Pattern::parse(pattern, PatternMode::Selector)?;
    Ok(!compiled.negated && compiled.is_match(&normalize_path(path)))
}

/// The file selector of an override layer. An empty selector matches
/// every path.
#[derive(Debug, Clone, Default)]
pub struct GlobSelector {
    patterns: Vec<Pattern>,
}

impl GlobSelector {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, GlobError> {
        let patterns = patterns
            .iter()
            .map(|p| Pattern::parse(p.as_ref(), PatternMode::Selector))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// `path` must already be normalized.
    pub fn is_match(&self, normalized: &str) -> bool {
        self.patterns.is_empty() || evaluate(&self.patterns, normalized)
    }
}
