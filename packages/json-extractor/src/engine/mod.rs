//! The extraction engine: compiled rules plus the public entry point.
//!
//! [`Extractor`] is built once per rule set and reused; each `extract` call
//! only reads the compiled rules and allocates fresh output, so a shared
//! extractor is safe to use from any number of threads.

mod process;
mod prune;
mod walker;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{ExtractError, Result, RuleResult};
use crate::rules::RuleSet;

use self::prune::prune_nulls;
use self::walker::extract_record;

/// A compiled, immutable extraction engine.
///
/// Construction compiles and validates the whole rule set (paths, regexes,
/// instruction classification); extraction itself cannot fail.
#[derive(Debug, Clone)]
pub struct Extractor {
    rules: RuleSet,
}

impl Extractor {
    /// Compile a rule set from its JSON representation.
    pub fn new(rules: &Value) -> RuleResult<Self> {
        Ok(Self {
            rules: RuleSet::parse(rules)?,
        })
    }

    /// Build an extractor from an already-compiled rule set.
    pub fn with_rule_set(rules: RuleSet) -> Self {
        Self { rules }
    }

    /// The compiled rule set.
    pub fn rule_set(&self) -> &RuleSet {
        &self.rules
    }

    /// Extract according to the configured rules.
    ///
    /// The output mirrors the input shape: an array of records produces an
    /// array of output records in the same order; a single record produces a
    /// single output record. Anything else produces an empty record. Output
    /// records never contain nulls at any depth.
    pub fn extract(&self, data: &Value) -> Value {
        match data {
            Value::Array(records) => Value::Array(
                records
                    .iter()
                    .map(|record| self.extract_one(record))
                    .collect(),
            ),
            record => self.extract_one(record),
        }
    }

    /// Extract and convert into a typed output model.
    ///
    /// Runs [`extract`](Self::extract) and deserializes the result; pass a
    /// `Vec<T>` for sequence inputs. Conversion failures propagate to the
    /// caller unchanged; there is no fallback here.
    pub fn extract_as<T: DeserializeOwned>(&self, data: &Value) -> Result<T> {
        serde_json::from_value(self.extract(data)).map_err(ExtractError::Model)
    }

    fn extract_one(&self, record: &Value) -> Value {
        prune_nulls(Value::Object(extract_record(&self.rules, record)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[test]
    fn test_shape_mirroring() {
        let extractor = Extractor::new(&json!({"name": true})).unwrap();

        let single = extractor.extract(&json!({"name": "A"}));
        assert_eq!(single, json!({"name": "A"}));

        let many = extractor.extract(&json!([{"name": "A"}, {"name": "B"}, {}]));
        assert_eq!(many, json!([{"name": "A"}, {"name": "B"}, {}]));
    }

    #[test]
    fn test_repeated_extraction_is_identical() {
        let extractor = Extractor::new(&json!({
            "name": true,
            "price": {"fields": ["amount"]},
            "categories[*].name": true
        }))
        .unwrap();
        let record = json!({
            "name": "Cherry Tomatoes",
            "price": {"amount": 139, "display": "$1.39"},
            "categories": [{"name": "Pantry"}]
        });

        let first = extractor.extract(&record);
        let second = extractor.extract(&record);
        let third = extractor.extract(&record);
        assert_eq!(first, second);
        assert_eq!(second, third);
    }

    #[test]
    fn test_null_fields_are_omitted_not_nulled() {
        let extractor = Extractor::new(&json!({"name": true, "brandName": true})).unwrap();
        let output = extractor.extract(&json!({"name": "Tomatoes 800g", "brandName": null}));
        assert_eq!(output, json!({"name": "Tomatoes 800g"}));
    }

    #[test]
    fn test_empty_rules_empty_output() {
        let extractor = Extractor::new(&json!({})).unwrap();
        assert_eq!(extractor.extract(&json!({"anything": 1})), json!({}));
    }

    #[test]
    fn test_extract_as_typed_model() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct Product {
            name: String,
            categories: Vec<String>,
        }

        let extractor = Extractor::new(&json!({
            "name": true,
            "categories[*].name": true
        }))
        .unwrap();

        let product: Product = extractor
            .extract_as(&json!({
                "name": "Tomatoes",
                "categories": [{"name": "Fruits & Vegetables"}]
            }))
            .unwrap();
        assert_eq!(
            product,
            Product {
                name: "Tomatoes".to_string(),
                categories: vec!["Fruits & Vegetables".to_string()],
            }
        );

        let products: Vec<Product> = extractor
            .extract_as(&json!([
                {"name": "A", "categories": []},
                {"name": "B", "categories": [{"name": "Pantry"}]}
            ]))
            .unwrap();
        assert_eq!(products.len(), 2);
    }

    #[test]
    fn test_extract_as_conversion_failure_propagates() {
        #[derive(Debug, Deserialize)]
        struct Strict {
            #[allow(dead_code)]
            name: String,
        }

        let extractor = Extractor::new(&json!({"name": true})).unwrap();
        // "name" is absent, so the model cannot be built.
        let err = extractor.extract_as::<Strict>(&json!({"sku": "1"})).unwrap_err();
        assert!(matches!(err, ExtractError::Model(_)));
    }
}
