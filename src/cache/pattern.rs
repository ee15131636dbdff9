//! Key patterns for bulk invalidation.

use regex::Regex;
use serde::Deserialize;

use crate::cache::CacheKey;
use crate::error::{CacheError, Result};

/// How an admin-supplied pattern string is interpreted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternKind {
    #[default]
    Prefix,
    Regex,
}

// == Key Pattern ==
/// Matches cache keys during bulk invalidation.
#[derive(Debug, Clone)]
pub enum KeyPattern {
    /// Keys starting with the given string
    Prefix(String),
    /// Keys matched anywhere by the regex
    Regex(Regex),
}

impl KeyPattern {
    pub fn prefix(prefix: impl Into<String>) -> Self {
        KeyPattern::Prefix(prefix.into())
    }

    pub fn regex(pattern: &str) -> Result<Self> {
        Regex::new(pattern)
            .map(KeyPattern::Regex)
            .map_err(|e| CacheError::InvalidPattern(e.to_string()))
    }

    pub fn parse(kind: PatternKind, pattern: &str) -> Result<Self> {
        match kind {
            PatternKind::Prefix => Ok(Self::prefix(pattern)),
            PatternKind::Regex => Self::regex(pattern),
        }
    }

    pub fn is_match(&self, candidate: &str) -> bool {
        match self {
            KeyPattern::Prefix(prefix) => candidate.starts_with(prefix.as_str()),
            KeyPattern::Regex(regex) => regex.is_match(candidate),
        }
    }

    /// Tests `key` against the pattern.
    ///
    /// With a namespace, only keys in exactly that namespace are considered
    /// and the pattern sees the caller key alone; without one the pattern
    /// sees the full `namespace:key` form.
    pub fn matches_key(&self, key: &CacheKey, namespace: Option<&str>) -> bool {
        match namespace {
            Some(ns) => key.namespace() == ns && self.is_match(key.key()),
            None => self.is_match(&key.composite()),
        }
    }
}
