//! Value processing: regex gating, array slicing, and field projection.
//!
//! `process` takes a value the walker has already resolved and applies the
//! directive part of an instruction to it. Shape dispatch is an exhaustive
//! match on the JSON variant; a value a directive cannot apply to passes
//! through unchanged rather than erroring.

use serde_json::{Map, Value};

use crate::rules::{Directive, FieldSpec, Instruction};

use super::walker::flatten_wildcard;

/// Apply an instruction's processing to a resolved value.
///
/// `Copy` and `Rename` carry no processing; only directives transform the
/// value.
pub(crate) fn process(value: Value, instruction: &Instruction) -> Value {
    match instruction {
        Instruction::Directive(directive) => process_directive(value, directive),
        Instruction::Copy | Instruction::Rename(_) => value,
    }
}

/// Apply a directive in its fixed order: scalar regex gate, then per-shape
/// projection and filtering.
///
/// A rejected scalar comes back as `Value::Null`, which the walker treats
/// as "produce no key".
pub(crate) fn process_directive(value: Value, directive: &Directive) -> Value {
    // Regex on a scalar string gates the whole value.
    if let (Some(regex), Value::String(s)) = (&directive.regex, &value) {
        if !regex.is_match(s) {
            return Value::Null;
        }
    }

    match value {
        Value::Object(map) => match &directive.fields {
            Some(specs) => Value::Object(project_object(&map, specs)),
            None => Value::Object(map),
        },
        Value::Array(items) => process_array(items, directive),
        other => other,
    }
}

/// Sequence processing, in order: regex element filter, limit truncation,
/// per-element field projection.
fn process_array(mut items: Vec<Value>, directive: &Directive) -> Value {
    if let Some(regex) = &directive.regex {
        // Only string elements can match; everything else is dropped.
        items.retain(|item| matches!(item, Value::String(s) if regex.is_match(s)));
    }

    if let Some(limit) = directive.limit {
        items.truncate(limit);
    }

    if let Some(specs) = &directive.fields {
        items = items
            .into_iter()
            .map(|item| match item {
                Value::Object(map) => Value::Object(project_object(&map, specs)),
                other => other,
            })
            .collect();
    }

    Value::Array(items)
}

/// Project an object down to the named fields.
///
/// Missing fields are omitted, never an error. Nested specs project one
/// level further; wildcard specs flatten an array field under its derived
/// key.
pub(crate) fn project_object(map: &Map<String, Value>, specs: &[FieldSpec]) -> Map<String, Value> {
    let mut projected = Map::new();

    for spec in specs {
        match spec {
            FieldSpec::Name(name) => {
                if let Some(value) = map.get(name) {
                    if !value.is_null() {
                        projected.insert(name.clone(), value.clone());
                    }
                }
            }
            FieldSpec::Nested { field, subfields } => match map.get(field) {
                Some(Value::Object(inner)) => {
                    let mut sub = Map::new();
                    for name in subfields {
                        if let Some(value) = inner.get(name) {
                            if !value.is_null() {
                                sub.insert(name.clone(), value.clone());
                            }
                        }
                    }
                    projected.insert(field.clone(), Value::Object(sub));
                }
                // A non-object under a nested spec is copied as-is.
                Some(value) if !value.is_null() => {
                    projected.insert(field.clone(), value.clone());
                }
                _ => {}
            },
            FieldSpec::Wildcard(wildcard) => {
                if let Some(values) = flatten_wildcard(map, wildcard) {
                    projected.insert(wildcard.output_key(), Value::Array(values));
                }
            }
        }
    }

    projected
}
