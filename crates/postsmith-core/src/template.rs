use serde::{Deserialize, Serialize};

/// A stored post template. The body may reference `{{identifier}}`
/// placeholders that are resolved against the template's field definitions.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Template {
    pub id: String,
    /// Group or process key the template belongs to (e.g. `promotion`).
    pub group: String,
    /// Status or variant within the group (e.g. `approved`).
    pub variant: String,
    pub body: String,
}

impl Template {
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            ..Self::default()
        }
    }

    pub fn placeholders(&self) -> Vec<String> {
        crate::placeholder::extract_placeholders(&self.body)
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldDefinition {
    pub id: String,
    pub template_id: String,
    pub field_key: String,
    pub label: String,
    pub field_type: FieldType,
    pub required: bool,
    pub placeholder: Option<String>,
    pub default_value: Option<String>,
    pub transform: Transform,
    pub options: Option<Vec<String>>,
    pub sort_order: i32,
}

impl FieldDefinition {
    pub fn new(field_key: impl Into<String>) -> Self {
        let field_key = field_key.into();
        Self {
            label: field_key.clone(),
            field_key,
            ..Self::default()
        }
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn select<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.field_type = FieldType::Select;
        self.options = Some(options.into_iter().map(Into::into).collect());
        self
    }
}

/// Input widget used to collect a field's value.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldType {
    #[default]
    Text,
    Textarea,
    Select,
}

impl FieldType {
    pub fn as_str(self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Textarea => "textarea",
            FieldType::Select => "select",
        }
    }
}

// Rows written by older admin tools may carry types we no longer know.
impl From<String> for FieldType {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "textarea" => FieldType::Textarea,
            "select" => FieldType::Select,
            _ => FieldType::Text,
        }
    }
}

impl From<FieldType> for String {
    fn from(value: FieldType) -> Self {
        value.as_str().to_string()
    }
}

/// Value-shaping rule applied to user input before substitution.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Transform {
    #[default]
    Raw,
    /// One list item per non-empty input line.
    BbcList,
}

impl Transform {
    pub fn as_str(self) -> &'static str {
        match self {
            Transform::Raw => "raw",
            Transform::BbcList => "bbc_list",
        }
    }
}

impl From<String> for Transform {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "bbc_list" => Transform::BbcList,
            _ => Transform::Raw,
        }
    }
}

impl From<Transform> for String {
    fn from(value: Transform) -> Self {
        value.as_str().to_string()
    }
}

/// Field definitions in form order. Ties keep their original order.
pub fn sorted_fields(fields: &[FieldDefinition]) -> Vec<&FieldDefinition> {
    let mut sorted: Vec<&FieldDefinition> = fields.iter().collect();
    sorted.sort_by_key(|field| field.sort_order);
    sorted
}
