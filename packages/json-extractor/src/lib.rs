//! Declarative JSON Extraction Engine
//!
//! A small rule-interpretation engine that walks arbitrary nested JSON and
//! produces a normalized projection. Store search endpoints return wildly
//! different response shapes; a per-store rule set (plain JSON, loaded from
//! configuration) describes what to keep, and the engine does the rest.
//!
//! # Design Philosophy
//!
//! - Rules are data: everything comes from configuration, nothing executable
//! - Compile once, extract many: paths, regexes, and instruction
//!   classification are resolved at construction
//! - Fail loud at load, degrade quiet at runtime: a malformed rule set never
//!   makes it to an extractor, and extraction itself never raises; absent
//!   data is simply omitted
//! - No nulls in output, ever
//!
//! # Usage
//!
//! ```rust
//! use json_extractor::Extractor;
//! use serde_json::json;
//!
//! let extractor = Extractor::new(&json!({
//!     "name": true,
//!     "price.amount": true,
//!     "categories[*].name": true
//! }))
//! .unwrap();
//!
//! let record = json!({
//!     "name": "Cherry Tomatoes 400g",
//!     "price": {"amount": 139, "comparisonDisplay": "$3.48 per 1 kg"},
//!     "categories": [{"name": "Pantry"}, {"name": "Canned Food"}]
//! });
//!
//! assert_eq!(
//!     extractor.extract(&record),
//!     json!({
//!         "name": "Cherry Tomatoes 400g",
//!         "price": {"amount": 139},
//!         "categories": ["Pantry", "Canned Food"]
//!     })
//! );
//! ```
//!
//! # Rule language
//!
//! A rule set maps keys to instructions:
//!
//! - `"name": true` copies the field verbatim
//! - `"price.amount": true` resolves a dotted path; dotted paths nest in
//!   the output
//! - `"price.amount": "cost"` renames the output key
//! - `"categories[*].name": true` flattens a field out of every array
//!   element (a `name` suffix keeps the array's key; others become
//!   `{array}_{suffix}`)
//! - `"assets": {"limit": 1, "fields": ["url"], "regex": "...", "default": []}`
//!   filters and projects the value at that key
//! - `"@": {"fields": ["sku"]}` copies fields from the record root
//! - a directive with extra keys is a mixed instruction: the extra keys are
//!   sub-rules applied to the already-selected value, merged element-wise
//!   for arrays
//!
//! # Modules
//!
//! - [`rules`] - The rule language and its compiler
//! - [`engine`] - The extraction walker and public entry point
//! - [`types`] - Store profile configuration
//! - [`error`] - Typed errors

pub mod engine;
pub mod error;
pub mod rules;
pub mod types;

// Re-export core types at crate root
pub use engine::Extractor;
pub use error::{ExtractError, Result, RuleError, RuleResult};
pub use rules::{
    Directive, FieldPath, FieldSpec, Instruction, Rule, RuleKey, RuleSet, SubKey, SubRule,
    WildcardPath,
};
pub use types::profile::{StoreProfile, StoreRegion};
