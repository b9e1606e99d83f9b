//! Compiled path expressions.
//!
//! Two path forms exist in the rule language: plain dot-separated field
//! paths (`"price.amount"`) and wildcard array paths containing exactly one
//! `[*].` segment (`"categories[*].name"`). Both are compiled once when the
//! rule set is built and reused across every `extract` call.

use serde_json::{Map, Value};

use crate::error::{RuleError, RuleResult};

/// Marker for the wildcard segment inside an array path.
pub const WILDCARD: &str = "[*].";

/// A compiled dot-separated field path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    raw: String,
    segments: Vec<String>,
}

impl FieldPath {
    /// Compile a dotted path. Empty paths and empty segments are rejected.
    pub fn parse(raw: &str) -> RuleResult<Self> {
        if raw.is_empty() {
            return Err(RuleError::InvalidPath {
                path: raw.to_string(),
                reason: "path is empty".to_string(),
            });
        }
        if raw.contains("[*]") {
            return Err(RuleError::InvalidPath {
                path: raw.to_string(),
                reason: "unexpected wildcard segment".to_string(),
            });
        }

        let segments: Vec<String> = raw.split('.').map(str::to_string).collect();
        if segments.iter().any(String::is_empty) {
            return Err(RuleError::InvalidPath {
                path: raw.to_string(),
                reason: "empty path segment".to_string(),
            });
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    /// The path as written in the rule set.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The individual path segments, in order.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Walk the path through nested objects.
    ///
    /// Returns `None` when any segment is missing, when a non-object is hit
    /// mid-path, or when the resolved value is an explicit null; an absent
    /// path and a null value are the same "nothing" to the extraction rules.
    pub fn resolve<'a>(&self, record: &'a Value) -> Option<&'a Value> {
        self.resolve_in(record.as_object()?)
    }

    /// Like [`resolve`](Self::resolve), starting from an already-unwrapped
    /// object.
    pub fn resolve_in<'a>(&self, record: &'a Map<String, Value>) -> Option<&'a Value> {
        let (first, rest) = self.segments.split_first()?;
        let mut current = record.get(first)?;
        for segment in rest {
            current = current.as_object()?.get(segment)?;
        }
        (!current.is_null()).then_some(current)
    }
}

/// A compiled wildcard array path: `prefix[*].suffix`.
///
/// The prefix locates an array; the suffix is extracted from every array
/// element. Only one wildcard segment per path is supported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WildcardPath {
    raw: String,
    prefix: FieldPath,
    suffix: FieldPath,
}

impl WildcardPath {
    /// Compile a wildcard path. Rejects paths with more than one `[*].`,
    /// an empty prefix or suffix, or a `[*]` not followed by `.`.
    pub fn parse(raw: &str) -> RuleResult<Self> {
        let invalid = |reason: &str| RuleError::InvalidPath {
            path: raw.to_string(),
            reason: reason.to_string(),
        };

        let (prefix, suffix) = raw
            .split_once(WILDCARD)
            .ok_or_else(|| invalid("wildcard `[*]` must be followed by `.field`"))?;
        if suffix.contains("[*]") {
            return Err(invalid("only one `[*].` segment is supported"));
        }
        if prefix.is_empty() {
            return Err(invalid("wildcard path has no array prefix"));
        }

        Ok(Self {
            raw: raw.to_string(),
            prefix: FieldPath::parse(prefix)?,
            suffix: FieldPath::parse(suffix)?,
        })
    }

    /// The path as written in the rule set.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Path to the array being flattened.
    pub fn prefix(&self) -> &FieldPath {
        &self.prefix
    }

    /// Path extracted from each array element.
    pub fn suffix(&self) -> &FieldPath {
        &self.suffix
    }

    /// Output key for the flattened list.
    ///
    /// A `name` suffix collapses to the array's own field name
    /// (`categories[*].name` → `categories`); any other suffix appends
    /// (`assets[*].url` → `assets_url`).
    pub fn output_key(&self) -> String {
        if self.suffix.as_str() == "name" {
            self.prefix.as_str().to_string()
        } else {
            format!("{}_{}", self.prefix.as_str(), self.suffix.as_str())
        }
    }
}
