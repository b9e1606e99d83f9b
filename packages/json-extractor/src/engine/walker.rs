//! The extraction walker: applies every compiled rule to one record.
//!
//! Absent paths and shape mismatches degrade to "rule produced nothing";
//! the walker never fails. How much a rule set actually captured is
//! surfaced through `tracing` rather than errors.

use serde_json::map::Entry;
use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::rules::{
    Directive, FieldSpec, Instruction, Rule, RuleKey, RuleSet, SubKey, SubRule, WildcardPath,
};

use super::process::{process, process_directive};

/// Apply a rule set to a single record, producing one (unpruned) output map.
pub(crate) fn extract_record(rules: &RuleSet, record: &Value) -> Map<String, Value> {
    let mut output = Map::new();

    let Some(record) = record.as_object() else {
        debug!("record is not a JSON object; producing an empty output");
        return output;
    };

    for rule in rules.iter() {
        apply_rule(record, rule, &mut output);
    }
    output
}

fn apply_rule(record: &Map<String, Value>, rule: &Rule, out: &mut Map<String, Value>) {
    match (&rule.key, &rule.instruction) {
        (RuleKey::Root, Instruction::Directive(directive)) => {
            extract_root_fields(record, directive, out);
        }
        (RuleKey::Wildcard(wildcard), instruction) => {
            apply_wildcard(record, wildcard, instruction, out);
        }
        // Directive rules look their key up literally, dots and all.
        (RuleKey::Path(_), Instruction::Directive(directive)) => {
            apply_directive_rule(record, &rule.raw_key, directive, out);
        }
        (RuleKey::Path(path), Instruction::Copy) => match path.resolve_in(record) {
            Some(value) => assign_path(out, path.segments(), value.clone()),
            None => trace!(rule = rule.raw_key.as_str(), "path resolved to nothing"),
        },
        (RuleKey::Path(path), Instruction::Rename(name)) => {
            if let Some(value) = path.resolve_in(record) {
                out.insert(name.clone(), value.clone());
            }
        }
        // "@" with a non-directive instruction is rejected at compile time.
        (RuleKey::Root, _) => {}
    }
}

/// `"@"` rule: copy named fields straight from the record root.
fn extract_root_fields(record: &Map<String, Value>, directive: &Directive, out: &mut Map<String, Value>) {
    let Some(specs) = &directive.fields else {
        return;
    };
    for spec in specs {
        if let FieldSpec::Name(name) = spec {
            if let Some(value) = record.get(name) {
                if !value.is_null() {
                    out.insert(name.clone(), value.clone());
                }
            }
        }
    }
}

/// Flatten `prefix[*].suffix` out of a record.
///
/// Returns `None` when the prefix is absent or not an array; an existing
/// empty array flattens to an (empty) list. Non-object elements and elements
/// missing the suffix are skipped.
pub(crate) fn flatten_wildcard(
    record: &Map<String, Value>,
    wildcard: &WildcardPath,
) -> Option<Vec<Value>> {
    let array = wildcard.prefix().resolve_in(record)?.as_array()?;
    Some(
        array
            .iter()
            .filter_map(|element| {
                element
                    .as_object()
                    .and_then(|map| wildcard.suffix().resolve_in(map))
                    .cloned()
            })
            .collect(),
    )
}

/// Apply a wildcard rule (top-level or sub-rule; the target map differs,
/// the behavior does not).
fn apply_wildcard(
    record: &Map<String, Value>,
    wildcard: &WildcardPath,
    instruction: &Instruction,
    out: &mut Map<String, Value>,
) {
    let resolved = match flatten_wildcard(record, wildcard) {
        Some(values) => Some(Value::Array(values)),
        None => {
            let default = default_of(instruction);
            if default.is_some() {
                debug!(rule = wildcard.as_str(), "array absent; using default");
            }
            default
        }
    };
    let Some(value) = resolved else {
        trace!(rule = wildcard.as_str(), "array absent");
        return;
    };

    let key = match instruction {
        Instruction::Rename(name) => name.clone(),
        _ => wildcard.output_key(),
    };
    let processed = process(value, instruction);
    if !processed.is_null() {
        out.insert(key, processed);
    }
}

/// Apply a directive rule at a literal key: resolve, default, process, and
/// recurse into sub-rules for mixed instructions.
fn apply_directive_rule(
    record: &Map<String, Value>,
    key: &str,
    directive: &Directive,
    out: &mut Map<String, Value>,
) {
    let value = match record.get(key) {
        Some(value) if !value.is_null() => value.clone(),
        _ => match &directive.default {
            Some(default) => {
                debug!(rule = key, "key absent; using default");
                default.clone()
            }
            None => {
                trace!(rule = key, "key absent");
                return;
            }
        },
    };

    // Sub-rules see the raw parent value, not the projected seed.
    let parent = directive.is_mixed().then(|| value.clone());

    let processed = process_directive(value, directive);
    if !processed.is_null() {
        out.insert(key.to_string(), processed);
    }

    if let Some(parent) = parent {
        for sub_rule in &directive.sub_rules {
            apply_sub_rule(&parent, sub_rule, key, out);
        }
    }
}

/// Apply one sub-rule against the parent value already selected by the
/// directive part of a mixed instruction.
fn apply_sub_rule(parent: &Value, sub_rule: &SubRule, key: &str, out: &mut Map<String, Value>) {
    match parent {
        Value::Array(elements) => apply_array_sub_rule(elements, sub_rule, key, out),
        Value::Object(map) => {
            let target = out
                .entry(key.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !target.is_object() {
                *target = Value::Object(Map::new());
            }
            if let Value::Object(target_map) = target {
                apply_sub_rule_to_item(map, sub_rule, target_map);
            }
        }
        _ => trace!(rule = key, "sub-rule parent is neither array nor object"),
    }
}

/// Array parent: run the sub-rule over every element, then merge the
/// per-element results into whatever the directive part already produced,
/// matched by positional index.
fn apply_array_sub_rule(
    elements: &[Value],
    sub_rule: &SubRule,
    key: &str,
    out: &mut Map<String, Value>,
) {
    let mut new_items = Vec::with_capacity(elements.len());
    for element in elements {
        match element {
            Value::Object(element_map) => {
                let mut item = Map::new();
                apply_sub_rule_to_item(element_map, sub_rule, &mut item);
                new_items.push(Value::Object(item));
            }
            other => new_items.push(other.clone()),
        }
    }
    merge_by_index(out, key, new_items);
}

/// Positional merge: extend already-extracted elements rather than replacing
/// them. Elements past the existing list's length (e.g. cut by a `limit`
/// directive) are dropped; existing elements past the new list are kept.
fn merge_by_index(out: &mut Map<String, Value>, key: &str, new_items: Vec<Value>) {
    match out.entry(key.to_string()) {
        Entry::Occupied(mut entry) => match entry.get_mut() {
            Value::Array(existing) => {
                for (slot, new_item) in existing.iter_mut().zip(new_items.iter()) {
                    match (slot, new_item) {
                        (Value::Object(slot_map), Value::Object(new_map)) => {
                            for (k, v) in new_map {
                                slot_map.insert(k.clone(), v.clone());
                            }
                        }
                        (slot, new_item) => *slot = new_item.clone(),
                    }
                }
            }
            other => *other = Value::Array(new_items),
        },
        Entry::Vacant(entry) => {
            entry.insert(Value::Array(new_items));
        }
    }
}

/// Apply a sub-rule to one object (an array element or the parent itself).
fn apply_sub_rule_to_item(
    item: &Map<String, Value>,
    sub_rule: &SubRule,
    target: &mut Map<String, Value>,
) {
    match (&sub_rule.key, &sub_rule.instruction) {
        (SubKey::Wildcard(wildcard), instruction) => {
            apply_wildcard(item, wildcard, instruction, target);
        }
        // Nested directives (including deeper mixed instructions) recurse.
        (SubKey::Field(field), Instruction::Directive(directive)) => {
            apply_directive_rule(item, field, directive, target);
        }
        (SubKey::Field(field), Instruction::Copy) => {
            if let Some(value) = item.get(field) {
                if !value.is_null() {
                    target.insert(field.clone(), value.clone());
                }
            }
        }
        (SubKey::Field(field), Instruction::Rename(name)) => {
            if let Some(value) = item.get(field) {
                if !value.is_null() {
                    target.insert(name.clone(), value.clone());
                }
            }
        }
    }
}

/// Write a value at a dotted path, creating intermediate objects.
/// A non-object in the way means the value has nowhere to go.
fn assign_path(out: &mut Map<String, Value>, segments: &[String], value: Value) {
    let Some((last, parents)) = segments.split_last() else {
        return;
    };

    let mut current = out;
    for segment in parents {
        let slot = current
            .entry(segment.clone())
            .or_insert_with(|| Value::Object(Map::new()));
        match slot {
            Value::Object(map) => current = map,
            _ => return,
        }
    }
    current.insert(last.clone(), value);
}

fn default_of(instruction: &Instruction) -> Option<Value> {
    match instruction {
        Instruction::Directive(directive) => directive.default.clone(),
        Instruction::Copy | Instruction::Rename(_) => None,
    }
}
