use std::collections::HashSet;

use crate::diagnostic::{
    DiagnosticSeverity, E_FIELD_OPTION, E_FIELD_REQUIRED, FieldIssue, W_FIELD_DUPLICATE,
    W_FIELD_UNUSED,
};
use crate::placeholder::{ValueMap, extract_placeholders};
use crate::template::{FieldDefinition, FieldType, sorted_fields};

/// Operator-facing checks on collected values, in form order.
pub fn validate_inputs(
    fields: &[FieldDefinition],
    inputs: &ValueMap,
    provided: &ValueMap,
) -> Vec<FieldIssue> {
    let mut issues = Vec::new();
    for field in sorted_fields(fields) {
        let key = field.field_key.as_str();
        // Auto-filled values are outside the operator's control.
        if provided.contains_key(key) {
            continue;
        }
        let value = inputs
            .get(key)
            .or(field.default_value.as_ref())
            .map(|value| value.trim())
            .unwrap_or("");

        if value.is_empty() {
            if field.required {
                issues.push(FieldIssue::new(
                    key,
                    DiagnosticSeverity::Error,
                    E_FIELD_REQUIRED,
                    format!("{} is required", display_name(field)),
                ));
            }
            continue;
        }

        if field.field_type == FieldType::Select {
            let options = field.options.as_deref().unwrap_or_default();
            if !options.iter().any(|option| option.trim() == value) {
                issues.push(FieldIssue::new(
                    key,
                    DiagnosticSeverity::Error,
                    E_FIELD_OPTION,
                    format!("'{}' is not an option for {}", value, display_name(field)),
                ));
            }
        }
    }
    issues
}

/// Administrator-facing schema checks between a template body and its fields.
pub fn lint_template(template: &str, fields: &[FieldDefinition]) -> Vec<FieldIssue> {
    let placeholders: HashSet<String> = extract_placeholders(template).into_iter().collect();
    let mut seen = HashSet::new();
    let mut issues = Vec::new();
    for field in sorted_fields(fields) {
        let key = field.field_key.as_str();
        if !seen.insert(key) {
            issues.push(FieldIssue::new(
                key,
                DiagnosticSeverity::Warning,
                W_FIELD_DUPLICATE,
                format!("field key '{}' is defined more than once", key),
            ));
            continue;
        }
        if !placeholders.contains(key) {
            issues.push(FieldIssue::new(
                key,
                DiagnosticSeverity::Warning,
                W_FIELD_UNUSED,
                format!("field '{}' is not used by the template", key),
            ));
        }
    }
    issues
}

fn display_name(field: &FieldDefinition) -> &str {
    if field.label.trim().is_empty() {
        field.field_key.as_str()
    } else {
        field.label.as_str()
    }
}
