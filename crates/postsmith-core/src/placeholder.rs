use std::collections::{BTreeMap, HashSet};

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::Value;
use tracing::warn;

use crate::error::UnresolvedPlaceholders;
use crate::template::{FieldDefinition, Transform};

/// Placeholder key to value. Ordered so repeated renders are byte-identical.
pub type ValueMap = BTreeMap<String, String>;

static PLACEHOLDER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\{\s*([a-zA-Z0-9_]+)\s*\}\}").expect("placeholder pattern is valid")
});

/// Unique placeholder identifiers in first-seen order.
pub fn extract_placeholders(template: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    PLACEHOLDER_RE
        .captures_iter(template)
        .filter_map(|caps| caps.get(1))
        .map(|key| key.as_str())
        .filter(|key| seen.insert(*key))
        .map(str::to_string)
        .collect()
}

/// Placeholders covered by neither a provided value nor a field definition.
pub fn compute_missing_fields(
    placeholders: &[String],
    fields: &[FieldDefinition],
    provided: &ValueMap,
) -> Vec<String> {
    placeholders
        .iter()
        .filter(|key| !provided.contains_key(key.as_str()))
        .filter(|key| !fields.iter().any(|field| &field.field_key == *key))
        .cloned()
        .collect()
}

pub fn apply_transform(raw_value: &str, transform: Transform) -> String {
    match transform {
        Transform::Raw => raw_value.to_string(),
        Transform::BbcList => {
            let items: Vec<&str> = raw_value
                .split('\n')
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .collect();
            if items.is_empty() {
                return "N/A".to_string();
            }
            let mut out = String::from("[LIST]\n");
            for item in items {
                out.push_str("[*] ");
                out.push_str(item);
                out.push('\n');
            }
            out.push_str("[/LIST]");
            out
        }
    }
}

/// Resolves every placeholder of `template`.
///
/// Provided values win and are used verbatim. Otherwise the field's input,
/// default or empty string is passed through the field's transform.
/// Placeholders with neither a provided value nor a field are left out; run
/// [`compute_missing_fields`] first (or use [`generate`]) to catch them.
pub fn build_value_map(
    template: &str,
    fields: &[FieldDefinition],
    inputs: &ValueMap,
    provided: &ValueMap,
) -> ValueMap {
    let mut values = ValueMap::new();
    for key in extract_placeholders(template) {
        if let Some(value) = provided.get(&key) {
            values.insert(key, value.clone());
            continue;
        }
        let Some(field) = fields.iter().find(|field| field.field_key == key) else {
            continue;
        };
        let raw = inputs
            .get(&key)
            .or(field.default_value.as_ref())
            .map(String::as_str)
            .unwrap_or("");
        let value = apply_transform(raw, field.transform);
        values.insert(key, value);
    }
    values
}

/// Substitutes placeholders in one pass; substituted text is not re-scanned.
pub fn fill_template(template: &str, values: &ValueMap) -> String {
    PLACEHOLDER_RE
        .replace_all(template, |caps: &Captures| {
            let key = &caps[1];
            match values.get(key) {
                Some(value) => value.clone(),
                None => {
                    warn!(key, "placeholder has no value; leaving it in place");
                    caps[0].to_string()
                }
            }
        })
        .into_owned()
}

/// Checked generation: refuses while any placeholder is unresolved.
pub fn generate(
    template: &str,
    fields: &[FieldDefinition],
    inputs: &ValueMap,
    provided: &ValueMap,
) -> Result<String, UnresolvedPlaceholders> {
    let placeholders = extract_placeholders(template);
    let missing = compute_missing_fields(&placeholders, fields, provided);
    if !missing.is_empty() {
        return Err(UnresolvedPlaceholders { keys: missing });
    }
    let values = build_value_map(template, fields, inputs, provided);
    Ok(fill_template(template, &values))
}

/// Lenient conversion for values arriving as JSON: anything that is not a
/// string becomes empty.
pub fn coerce_input(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        _ => String::new(),
    }
}

pub fn coerce_values<'a, I>(entries: I) -> ValueMap
where
    I: IntoIterator<Item = (&'a String, &'a Value)>,
{
    entries
        .into_iter()
        .map(|(key, value)| (key.clone(), coerce_input(value)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(pairs: &[(&str, &str)]) -> ValueMap {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    #[test]
    fn extraction_ignores_malformed_tokens() {
        let keys = extract_placeholders("{{ a }} {{a}} {{b-c}} {{ d e }} {{}} {{f_1}}");
        assert_eq!(keys, ["a", "f_1"]);
    }

    #[test]
    fn bbc_list_drops_blank_lines() {
        assert_eq!(
            apply_transform("a\n\n  b \n", Transform::BbcList),
            "[LIST]\n[*] a\n[*] b\n[/LIST]"
        );
        assert_eq!(apply_transform(" \n\n", Transform::BbcList), "N/A");
        assert_eq!(apply_transform("", Transform::BbcList), "N/A");
    }

    #[test]
    fn raw_is_identity() {
        assert_eq!(apply_transform(" x\n y ", Transform::Raw), " x\n y ");
    }

    #[test]
    fn unknown_keys_survive_fill() {
        let filled = fill_template("{{a}} {{ b }}", &values(&[("a", "1")]));
        assert_eq!(filled, "1 {{ b }}");
    }

    #[test]
    fn substituted_values_are_not_rescanned() {
        let filled = fill_template("{{a}}", &values(&[("a", "{{b}}"), ("b", "x")]));
        assert_eq!(filled, "{{b}}");
    }

    #[test]
    fn coerce_non_strings_to_empty() {
        assert_eq!(coerce_input(&Value::from("late")), "late");
        assert_eq!(coerce_input(&Value::from(3)), "");
        assert_eq!(coerce_input(&Value::Null), "");
        assert_eq!(coerce_input(&serde_json::json!(["a"])), "");
    }
}
