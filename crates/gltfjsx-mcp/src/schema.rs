//! Tool parameter schemas
//!
//! A [`ParamSchema`] is plain data: it validates incoming arguments and renders
//! itself as the JSON Schema advertised to clients, so the two can never drift
//! apart.

use std::path::Path;

use serde_json::{Map, Value, json};

use crate::error::ToolError;

/// Extra condition on a field's value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constraint {
    /// A string holding an absolute file-system path
    AbsolutePath,
}

/// JSON type a field accepts
#[derive(Debug, Clone)]
pub enum FieldKind {
    String,
    Boolean,
    Number,
    Object(ParamSchema),
}

impl FieldKind {
    fn json_type(&self) -> &'static str {
        match self {
            FieldKind::String => "string",
            FieldKind::Boolean => "boolean",
            FieldKind::Number => "number",
            FieldKind::Object(_) => "object",
        }
    }
}

#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub description: &'static str,
    pub constraint: Option<Constraint>,
}

impl FieldSpec {
    pub fn required(name: &'static str, kind: FieldKind, description: &'static str) -> Self {
        Self {
            name,
            kind,
            required: true,
            description,
            constraint: None,
        }
    }

    pub fn optional(name: &'static str, kind: FieldKind, description: &'static str) -> Self {
        Self {
            required: false,
            ..Self::required(name, kind, description)
        }
    }

    pub fn with_constraint(mut self, constraint: Constraint) -> Self {
        self.constraint = Some(constraint);
        self
    }
}

/// Ordered set of fields making up an object's parameters
#[derive(Debug, Clone, Default)]
pub struct ParamSchema {
    fields: Vec<FieldSpec>,
}

impl ParamSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Check `args` against the schema.
    ///
    /// Unknown keys are ignored. Optional fields may be absent but not `null`.
    pub fn validate(&self, args: &Map<String, Value>) -> Result<(), ToolError> {
        self.validate_at(args, "").map_err(ToolError::Validation)
    }

    fn validate_at(&self, args: &Map<String, Value>, prefix: &str) -> Result<(), String> {
        for field in &self.fields {
            let path = format!("{prefix}{}", field.name);
            let Some(value) = args.get(field.name) else {
                if field.required {
                    return Err(format!("missing required field '{path}'"));
                }
                continue;
            };

            match (&field.kind, value) {
                (FieldKind::String, Value::String(_))
                | (FieldKind::Boolean, Value::Bool(_))
                | (FieldKind::Number, Value::Number(_)) => {}
                (FieldKind::Object(nested), Value::Object(map)) => {
                    nested.validate_at(map, &format!("{path}."))?;
                }
                (kind, other) => {
                    return Err(format!(
                        "field '{path}' expected {}, got {}",
                        kind.json_type(),
                        json_type(other)
                    ));
                }
            }

            if let (Some(Constraint::AbsolutePath), Value::String(text)) = (field.constraint, value) {
                if !Path::new(text).is_absolute() {
                    return Err(format!("field '{path}' must be an absolute path, got '{text}'"));
                }
            }
        }

        for key in args.keys() {
            if !self.fields.iter().any(|field| field.name == key) {
                tracing::debug!("Ignoring unknown argument '{}{}'", prefix, key);
            }
        }
        Ok(())
    }

    /// Render as a JSON Schema object
    pub fn to_json_schema(&self) -> Map<String, Value> {
        let mut properties = Map::new();
        let mut required = Vec::new();

        for field in &self.fields {
            let mut property = match &field.kind {
                FieldKind::Object(nested) => nested.to_json_schema(),
                kind => {
                    let mut property = Map::new();
                    property.insert("type".into(), kind.json_type().into());
                    property
                }
            };
            property.insert("description".into(), field.description.into());
            properties.insert(field.name.to_string(), Value::Object(property));
            if field.required {
                required.push(Value::from(field.name));
            }
        }

        let mut schema = Map::new();
        schema.insert("type".into(), json!("object"));
        schema.insert("properties".into(), Value::Object(properties));
        if !required.is_empty() {
            schema.insert("required".into(), Value::Array(required));
        }
        schema
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
