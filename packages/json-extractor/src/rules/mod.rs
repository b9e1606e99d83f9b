//! The rule language and its compiler.
//!
//! A rule set is a JSON object mapping rule keys to instructions:
//!
//! ```json
//! {
//!     "@": {"fields": ["sku", "brandName"]},
//!     "name": true,
//!     "price.amount": "cost",
//!     "categories[*].name": true,
//!     "data": {
//!         "fields": ["name", "price"],
//!         "assets": {"limit": 1, "fields": ["url"]}
//!     }
//! }
//! ```
//!
//! Everything is classified and compiled here, once, when the rule set is
//! built: path expressions, regex patterns, and the simple/mixed instruction
//! split. The walker never re-inspects raw JSON on a per-record basis.

pub mod path;

use indexmap::IndexMap;
use regex::Regex;
use serde_json::Value;

use crate::error::{RuleError, RuleResult};

pub use self::path::{FieldPath, WildcardPath};

/// Directive keys reserved by the rule language. Any other key inside a
/// directive object is a sub-rule.
const DIRECTIVE_KEYS: [&str; 4] = ["fields", "limit", "regex", "default"];

/// How a rule key addresses the record.
#[derive(Debug, Clone)]
pub enum RuleKey {
    /// The literal key `"@"`: project fields from the record root.
    Root,
    /// A plain dotted path.
    Path(FieldPath),
    /// A wildcard array path (`prefix[*].suffix`).
    Wildcard(WildcardPath),
}

impl RuleKey {
    fn parse(raw: &str) -> RuleResult<Self> {
        if raw == "@" {
            Ok(Self::Root)
        } else if raw.contains("[*]") {
            Ok(Self::Wildcard(WildcardPath::parse(raw)?))
        } else {
            Ok(Self::Path(FieldPath::parse(raw)?))
        }
    }
}

/// A single entry of a `fields` projection list.
#[derive(Debug, Clone)]
pub enum FieldSpec {
    /// Copy one named field.
    Name(String),
    /// Project a nested object down to named subfields:
    /// `{"price": ["amount", "display"]}`.
    Nested {
        field: String,
        subfields: Vec<String>,
    },
    /// Flatten an array field: `"categories[*].name"`.
    Wildcard(WildcardPath),
}

/// A compiled rule instruction.
#[derive(Debug, Clone)]
pub enum Instruction {
    /// `true`: copy the resolved value verbatim.
    Copy,
    /// A string: store the resolved value under this key instead of the
    /// derived one.
    Rename(String),
    /// A directive object (possibly with sub-rules, making it "mixed").
    Directive(Directive),
}

/// The directive part of an instruction: projection and filtering knobs,
/// plus any sub-rules for mixed instructions.
#[derive(Debug, Clone, Default)]
pub struct Directive {
    /// Field projection applied to objects and to array elements.
    pub fields: Option<Vec<FieldSpec>>,
    /// Truncate an array to its first N elements.
    pub limit: Option<usize>,
    /// Keep a scalar string (or array string elements) only when this
    /// pattern matches somewhere in the value.
    pub regex: Option<Regex>,
    /// Fallback value when the rule's key is absent from the record.
    pub default: Option<Value>,
    /// Sub-rules applied to the value this directive selected. Non-empty
    /// makes this a mixed instruction.
    pub sub_rules: Vec<SubRule>,
}

impl Directive {
    /// A directive with `fields` plus sub-rules is a mixed instruction.
    pub fn is_mixed(&self) -> bool {
        !self.sub_rules.is_empty()
    }
}

/// How a sub-rule key addresses the parent value.
#[derive(Debug, Clone)]
pub enum SubKey {
    /// A literal field name of the parent object / array element.
    Field(String),
    /// A wildcard path flattened out of each element.
    Wildcard(WildcardPath),
}

/// A sub-rule inside a mixed instruction.
#[derive(Debug, Clone)]
pub struct SubRule {
    pub key: SubKey,
    pub instruction: Instruction,
}

/// One compiled top-level rule.
#[derive(Debug, Clone)]
pub struct Rule {
    /// The rule key as written; directive rules look this up literally.
    pub raw_key: String,
    pub key: RuleKey,
    pub instruction: Instruction,
}

/// An immutable, compiled rule set.
///
/// Rules apply in declaration order; compiling is a one-time cost shared by
/// every subsequent `extract` call.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    /// Compile a rule set from its JSON representation.
    pub fn parse(value: &Value) -> RuleResult<Self> {
        let map = value.as_object().ok_or(RuleError::NotAnObject {
            found: json_type_name(value),
        })?;

        let mut rules = Vec::with_capacity(map.len());
        for (raw_key, raw_instruction) in map {
            rules.push(parse_rule(raw_key, raw_instruction)?);
        }
        Ok(Self { rules })
    }

    /// Compile a rule set from a JSON string.
    pub fn parse_str(json: &str) -> RuleResult<Self> {
        let value: Value = serde_json::from_str(json)?;
        Self::parse(&value)
    }

    /// Iterate rules in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }

    /// Number of top-level rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the rule set has no rules at all.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

fn parse_rule(raw_key: &str, raw_instruction: &Value) -> RuleResult<Rule> {
    let key = RuleKey::parse(raw_key)?;
    let instruction = parse_instruction(raw_key, raw_instruction)?;

    match (&key, &instruction) {
        // "@" must be a pure projection of named root fields.
        (RuleKey::Root, Instruction::Directive(d)) => {
            let plain_names = d
                .fields
                .as_ref()
                .is_some_and(|fields| fields.iter().all(|f| matches!(f, FieldSpec::Name(_))));
            if !plain_names
                || d.is_mixed()
                || d.limit.is_some()
                || d.regex.is_some()
                || d.default.is_some()
            {
                return Err(RuleError::InvalidRootRule);
            }
        }
        (RuleKey::Root, _) => return Err(RuleError::InvalidRootRule),
        // A wildcard already flattens its array; sub-rules have no parent
        // value to attach to.
        (RuleKey::Wildcard(_), Instruction::Directive(d)) if d.is_mixed() => {
            return Err(RuleError::InvalidInstruction {
                rule: raw_key.to_string(),
                reason: "wildcard rules cannot carry sub-rules".to_string(),
            });
        }
        _ => {}
    }

    Ok(Rule {
        raw_key: raw_key.to_string(),
        key,
        instruction,
    })
}

fn parse_instruction(rule: &str, value: &Value) -> RuleResult<Instruction> {
    let invalid = |reason: &str| RuleError::InvalidInstruction {
        rule: rule.to_string(),
        reason: reason.to_string(),
    };

    match value {
        Value::Bool(true) => Ok(Instruction::Copy),
        Value::Bool(false) => Err(invalid("`false` is not a valid instruction; use `true`")),
        Value::String(name) => {
            if name.is_empty() {
                Err(invalid("rename target is empty"))
            } else {
                Ok(Instruction::Rename(name.clone()))
            }
        }
        // Bare list is shorthand for {"fields": [...]}.
        Value::Array(_) => Ok(Instruction::Directive(Directive {
            fields: Some(parse_field_specs(rule, value)?),
            ..Directive::default()
        })),
        Value::Object(map) => {
            let mut directive = Directive::default();
            let mut sub_rules = IndexMap::new();

            for (key, val) in map {
                match key.as_str() {
                    "fields" => directive.fields = Some(parse_field_specs(rule, val)?),
                    "limit" => {
                        let limit = val
                            .as_u64()
                            .ok_or_else(|| invalid("\"limit\" must be a non-negative integer"))?;
                        directive.limit = Some(limit as usize);
                    }
                    "regex" => {
                        let pattern = val
                            .as_str()
                            .ok_or_else(|| invalid("\"regex\" must be a string pattern"))?;
                        directive.regex =
                            Some(Regex::new(pattern).map_err(|source| RuleError::InvalidRegex {
                                rule: rule.to_string(),
                                source,
                            })?);
                    }
                    "default" => directive.default = Some(val.clone()),
                    // Callable predicates cannot come from configuration;
                    // callers post-process the extracted structure instead.
                    "filter" => {
                        return Err(RuleError::UnsupportedDirective {
                            rule: rule.to_string(),
                            directive: "filter".to_string(),
                        });
                    }
                    sub_key => {
                        sub_rules.insert(sub_key.to_string(), parse_sub_rule(sub_key, val)?);
                    }
                }
            }

            if !sub_rules.is_empty() && directive.fields.is_none() {
                return Err(RuleError::MixedWithoutFields {
                    rule: rule.to_string(),
                });
            }
            if sub_rules.is_empty()
                && directive.fields.is_none()
                && directive.limit.is_none()
                && directive.regex.is_none()
                && directive.default.is_none()
            {
                return Err(invalid("directive object has no recognized keys"));
            }

            directive.sub_rules = sub_rules.into_values().collect();
            Ok(Instruction::Directive(directive))
        }
        Value::Null => Err(invalid("instruction is null")),
        Value::Number(_) => Err(invalid("a number is not a valid instruction")),
    }
}

fn parse_sub_rule(raw_key: &str, raw_instruction: &Value) -> RuleResult<SubRule> {
    let key = if raw_key.contains("[*]") {
        SubKey::Wildcard(WildcardPath::parse(raw_key)?)
    } else if raw_key.is_empty() {
        return Err(RuleError::InvalidPath {
            path: raw_key.to_string(),
            reason: "sub-rule key is empty".to_string(),
        });
    } else {
        SubKey::Field(raw_key.to_string())
    };

    Ok(SubRule {
        key,
        instruction: parse_instruction(raw_key, raw_instruction)?,
    })
}

fn parse_field_specs(rule: &str, value: &Value) -> RuleResult<Vec<FieldSpec>> {
    let invalid = |reason: &str| RuleError::InvalidInstruction {
        rule: rule.to_string(),
        reason: reason.to_string(),
    };

    let entries = value
        .as_array()
        .ok_or_else(|| invalid("\"fields\" must be a list"))?;

    let mut specs = Vec::with_capacity(entries.len());
    for entry in entries {
        match entry {
            Value::String(name) if name.contains("[*]") => {
                specs.push(FieldSpec::Wildcard(WildcardPath::parse(name)?));
            }
            Value::String(name) if !name.is_empty() => {
                specs.push(FieldSpec::Name(name.clone()));
            }
            Value::String(_) => return Err(invalid("field name is empty")),
            // Nested projection: {"price": ["amount", "display"]}
            Value::Object(map) => {
                for (field, subfields) in map {
                    let subfields = subfields
                        .as_array()
                        .ok_or_else(|| invalid("nested field spec must map to a list of names"))?
                        .iter()
                        .map(|sf| {
                            sf.as_str()
                                .map(str::to_string)
                                .ok_or_else(|| invalid("nested field names must be strings"))
                        })
                        .collect::<RuleResult<Vec<_>>>()?;
                    specs.push(FieldSpec::Nested {
                        field: field.clone(),
                        subfields,
                    });
                }
            }
            _ => return Err(invalid("field specs must be strings or nested-field objects")),
        }
    }
    Ok(specs)
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
