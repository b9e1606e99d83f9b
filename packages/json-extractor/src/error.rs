//! Typed errors for the extraction engine.
//!
//! Uses `thiserror` for library errors (not `anyhow`) to provide
//! strongly-typed, composable error handling. Rule-language problems are
//! rejected when a rule set is compiled; extraction itself never fails.

use thiserror::Error;

/// Errors raised while compiling a rule set.
///
/// Every malformed rule is caught here, at construction time, so that
/// `extract` can stay infallible.
#[derive(Debug, Error)]
pub enum RuleError {
    /// The rule set root was not a JSON object
    #[error("rule set must be a JSON object, got {found}")]
    NotAnObject { found: &'static str },

    /// A path expression could not be compiled
    #[error("invalid path {path:?}: {reason}")]
    InvalidPath { path: String, reason: String },

    /// A rule's instruction was not a recognized form
    #[error("invalid instruction for rule {rule:?}: {reason}")]
    InvalidInstruction { rule: String, reason: String },

    /// A directive key exists in the rule language but is not supported
    #[error("unsupported directive {directive:?} in rule {rule:?}")]
    UnsupportedDirective { rule: String, directive: String },

    /// A directive carried sub-rules without a `fields` list
    #[error("rule {rule:?} has sub-rules but no \"fields\" list")]
    MixedWithoutFields { rule: String },

    /// The root rule `"@"` was not a plain field projection
    #[error("root rule \"@\" requires a \"fields\" list of plain field names")]
    InvalidRootRule,

    /// A regex directive failed to compile
    #[error("invalid regex in rule {rule:?}")]
    InvalidRegex {
        rule: String,
        #[source]
        source: regex::Error,
    },

    /// Rule set JSON failed to parse
    #[error("rule set JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

/// Errors that can reach callers of the extraction entry points.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// Rule compilation failed
    #[error("rule compilation failed: {0}")]
    Rule(#[from] RuleError),

    /// Output-model conversion failed; propagated unchanged to the caller
    #[error("output model conversion failed: {0}")]
    Model(#[source] serde_json::Error),
}

/// Result type alias for extraction operations.
pub type Result<T> = std::result::Result<T, ExtractError>;

/// Result type alias for rule compilation.
pub type RuleResult<T> = std::result::Result<T, RuleError>;
