//! Invocation-scoped registries filled in by hooks: paths that must not be
//! overwritten, and content transforms applied before a staged file lands.

use anyhow::Result;
use glob::{MatchOptions, Pattern};
use tracing::{debug, warn};

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Exact relative path, or a glob when the text contains glob metacharacters.
#[derive(Debug, Clone)]
pub enum PathMatcher {
    Exact(String),
    Glob(Pattern),
}

impl PathMatcher {
    pub fn parse(path: &str) -> Result<Self> {
        let path = path.trim().trim_start_matches("./");
        if path.contains(['*', '?', '[']) {
            Ok(PathMatcher::Glob(Pattern::new(path)?))
        } else {
            Ok(PathMatcher::Exact(path.to_string()))
        }
    }

    pub fn matches(&self, rel: &str) -> bool {
        match self {
            PathMatcher::Exact(p) => p == rel,
            PathMatcher::Glob(p) => p.matches_with(rel, MATCH_OPTIONS),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProtectionSet {
    matchers: Vec<PathMatcher>,
}

impl ProtectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_patterns<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        let mut set = Self::new();
        for p in patterns {
            set.add(p.as_ref())?;
        }
        Ok(set)
    }

    pub fn add(&mut self, path: &str) -> Result<()> {
        self.matchers.push(PathMatcher::parse(path)?);
        Ok(())
    }

    pub fn is_protected(&self, rel: &str) -> bool {
        self.matchers.iter().any(|m| m.matches(rel))
    }

    pub fn len(&self) -> usize {
        self.matchers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matchers.is_empty()
    }
}

pub type Transform = Box<dyn Fn(String) -> Result<String>>;

struct Modifier {
    matcher: PathMatcher,
    transform: Transform,
}

/// Ordered list of transforms; every matching one runs, in registration order.
#[derive(Default)]
pub struct ModifierRegistry {
    modifiers: Vec<Modifier>,
}

impl std::fmt::Debug for ModifierRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.modifiers.iter().map(|m| &m.matcher))
            .finish()
    }
}

impl ModifierRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, path: &str, transform: Transform) -> Result<()> {
        self.modifiers.push(Modifier {
            matcher: PathMatcher::parse(path)?,
            transform,
        });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.modifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modifiers.is_empty()
    }

    pub fn matches(&self, rel: &str) -> bool {
        self.modifiers.iter().any(|m| m.matcher.matches(rel))
    }

    pub fn apply(&self, rel: &str, content: String) -> Result<String> {
        let mut content = content;
        for (idx, m) in self.modifiers.iter().enumerate() {
            if m.matcher.matches(rel) {
                content = (m.transform)(content)?;
                debug!(path = rel, modifier = idx, "modifier applied");
            }
        }
        Ok(content)
    }

    /// Byte-level entry point. Non-UTF-8 content is returned unchanged.
    pub fn apply_bytes(&self, rel: &str, content: Vec<u8>) -> Result<Vec<u8>> {
        if !self.matches(rel) {
            return Ok(content);
        }
        match String::from_utf8(content) {
            Ok(text) => Ok(self.apply(rel, text)?.into_bytes()),
            Err(e) => {
                warn!(path = rel, "content is not UTF-8; modifiers skipped");
                Ok(e.into_bytes())
            }
        }
    }
}
