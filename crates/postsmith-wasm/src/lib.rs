use std::collections::BTreeMap;

use postsmith_core::{FieldDefinition, FieldIssue, Template, UnresolvedPlaceholders};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use wasm_bindgen::prelude::*;

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct RenderOptions {
    max_depth: Option<usize>,
    link_new_tab: Option<bool>,
    sanitized: Option<bool>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RenderResult {
    html: String,
    diagnostics: Vec<JsDiagnostic>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsDiagnostic {
    code: String,
    message: String,
    severity: String,
    range: JsRange,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsRange {
    start_line: usize,
    start_col: usize,
    end_line: usize,
    end_col: usize,
}

/// Template plus the values collected by the form.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    #[serde(deserialize_with = "template_or_body")]
    template: Template,
    #[serde(default)]
    fields: Vec<FieldDefinition>,
    #[serde(default)]
    inputs: BTreeMap<String, Value>,
    #[serde(default)]
    provided: BTreeMap<String, Value>,
}

#[derive(Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
enum GenerateResponse {
    Filled { text: String },
    Missing { missing: Vec<String> },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsFieldIssue {
    field_key: String,
    code: String,
    message: String,
    severity: String,
}

#[wasm_bindgen]
pub fn render_markup(source: &str) -> Result<JsValue, JsValue> {
    render_markup_with_options(source, JsValue::UNDEFINED)
}

#[wasm_bindgen]
pub fn render_markup_with_options(source: &str, options: JsValue) -> Result<JsValue, JsValue> {
    let options = options_from_js(options)?;
    to_js(&render_result(source, &options))
}

#[wasm_bindgen]
pub fn strip_markup(source: &str) -> String {
    postsmith_core::strip_markup(source)
}

#[wasm_bindgen]
pub fn extract_placeholders(body: &str) -> Vec<String> {
    postsmith_core::extract_placeholders(body)
}

#[wasm_bindgen]
pub fn generate(request: JsValue) -> Result<JsValue, JsValue> {
    let request: GenerateRequest = from_js(request)?;
    to_js(&generate_response(&request))
}

/// Form-level checks: schema lint followed by input validation.
#[wasm_bindgen]
pub fn validate_fields(request: JsValue) -> Result<JsValue, JsValue> {
    let request: GenerateRequest = from_js(request)?;
    to_js(&field_issues(&request))
}

fn render_result(source: &str, options: &RenderOptions) -> RenderResult {
    let mut render_options = postsmith_core::RenderOptions::default();
    if let Some(max_depth) = options.max_depth {
        render_options.max_depth = max_depth;
    }
    if let Some(link_new_tab) = options.link_new_tab {
        render_options.link_new_tab = link_new_tab;
    }

    let mut rendered = postsmith_core::render(source, &render_options);
    if options.sanitized.unwrap_or(false) {
        rendered = rendered.sanitized();
    }

    let diagnostics = rendered
        .diagnostics
        .into_iter()
        .map(|diag| JsDiagnostic {
            code: diag.code.to_string(),
            message: diag.message,
            severity: diag.severity.as_str().to_string(),
            range: JsRange {
                start_line: diag.range.start.line,
                start_col: diag.range.start.character,
                end_line: diag.range.end.line,
                end_col: diag.range.end.character,
            },
        })
        .collect();

    RenderResult {
        html: rendered.html,
        diagnostics,
    }
}

fn generate_response(request: &GenerateRequest) -> GenerateResponse {
    let inputs = postsmith_core::coerce_values(&request.inputs);
    let provided = postsmith_core::coerce_values(&request.provided);
    match postsmith_core::generate(&request.template.body, &request.fields, &inputs, &provided) {
        Ok(text) => GenerateResponse::Filled { text },
        Err(UnresolvedPlaceholders { keys }) => GenerateResponse::Missing { missing: keys },
    }
}

fn field_issues(request: &GenerateRequest) -> Vec<JsFieldIssue> {
    let inputs = postsmith_core::coerce_values(&request.inputs);
    let provided = postsmith_core::coerce_values(&request.provided);
    let mut issues = postsmith_core::lint_template(&request.template.body, &request.fields);
    issues.extend(postsmith_core::validate_inputs(
        &request.fields,
        &inputs,
        &provided,
    ));
    issues.into_iter().map(js_issue).collect()
}

fn js_issue(issue: FieldIssue) -> JsFieldIssue {
    JsFieldIssue {
        field_key: issue.field_key,
        code: issue.code.to_string(),
        message: issue.message,
        severity: issue.severity.as_str().to_string(),
    }
}

// The UI sometimes only has the body string at hand.
fn template_or_body<'de, D>(deserializer: D) -> Result<Template, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum TemplateInput {
        Body(String),
        Full(Template),
    }

    Ok(match TemplateInput::deserialize(deserializer)? {
        TemplateInput::Body(body) => Template::new(body),
        TemplateInput::Full(template) => template,
    })
}

fn options_from_js(value: JsValue) -> Result<RenderOptions, JsValue> {
    if value.is_null() || value.is_undefined() {
        return Ok(RenderOptions::default());
    }
    from_js(value)
}

fn from_js<T: serde::de::DeserializeOwned>(value: JsValue) -> Result<T, JsValue> {
    serde_wasm_bindgen::from_value(value).map_err(|err| JsValue::from_str(&err.to_string()))
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(|err| JsValue::from_str(&err.to_string()))
}
