//! Request DTOs for the admin API

use serde::Deserialize;

use crate::cache::{KeyPattern, PatternKind};
use crate::error::{CacheError, Result};

/// Request body for pattern invalidation (POST /caches/:name/invalidate)
///
/// # Fields
/// - `pattern`: prefix or regex to match keys against
/// - `kind`: `prefix` (default) or `regex`
/// - `namespace`: restrict matching to one namespace; without it the pattern
///   sees full `namespace:key` strings
#[derive(Debug, Clone, Deserialize)]
pub struct InvalidateRequest {
    pub pattern: String,
    #[serde(default)]
    pub kind: PatternKind,
    #[serde(default)]
    pub namespace: Option<String>,
}

impl InvalidateRequest {
    /// Validates the request and compiles its pattern.
    pub fn to_pattern(&self) -> Result<KeyPattern> {
        if self.pattern.is_empty() && self.namespace.is_none() {
            return Err(CacheError::InvalidRequest(
                "Empty pattern without a namespace would match every entry; use DELETE /caches/:name"
                    .to_string(),
            ));
        }
        KeyPattern::parse(self.kind, &self.pattern)
    }
}
