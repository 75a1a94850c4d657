//! Tool protocol types shared by the registry, the agent, and the transports.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use super::ToolError;

/// Value kinds a tool parameter may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamKind {
    String,
    Number,
    Boolean,
}

impl ParamKind {
    /// JSON-schema type name.
    pub fn schema_type(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
        }
    }
}

/// A single argument value. Closed set: no arrays or objects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArgValue {
    Bool(bool),
    Number(f64),
    String(String),
}

impl ArgValue {
    /// Convert a JSON value. `Ok(None)` for null; arrays and objects are rejected.
    pub fn from_json(value: &Value) -> Result<Option<Self>, String> {
        match value {
            Value::Null => Ok(None),
            Value::Bool(b) => Ok(Some(Self::Bool(*b))),
            Value::Number(n) => n
                .as_f64()
                .map(|f| Some(Self::Number(f)))
                .ok_or_else(|| format!("number out of range: {}", n)),
            Value::String(s) => Ok(Some(Self::String(s.clone()))),
            Value::Array(_) => Err("arrays are not supported".to_string()),
            Value::Object(_) => Err("objects are not supported".to_string()),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Self::Bool(b) => Value::Bool(*b),
            Self::Number(n) => json!(n),
            Self::String(s) => Value::String(s.clone()),
        }
    }

    /// Render for URLs and headers. Integral numbers print without a fraction.
    pub fn as_text(&self) -> String {
        match self {
            Self::Bool(b) => b.to_string(),
            Self::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
            Self::Number(n) => n.to_string(),
            Self::String(s) => s.clone(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Coerce into `kind`, or explain why not.
    pub fn coerce(&self, kind: ParamKind) -> Result<Self, String> {
        match (kind, self) {
            (ParamKind::String, Self::String(s)) => Ok(Self::String(s.clone())),
            (ParamKind::String, other) => Ok(Self::String(other.as_text())),
            (ParamKind::Number, Self::Number(n)) => Ok(Self::Number(*n)),
            (ParamKind::Number, Self::String(s)) => s
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .map(Self::Number)
                .ok_or_else(|| format!("expected a number, got {:?}", s)),
            (ParamKind::Number, Self::Bool(_)) => Err("expected a number, got a boolean".to_string()),
            (ParamKind::Boolean, Self::Bool(b)) => Ok(Self::Bool(*b)),
            (ParamKind::Boolean, Self::String(s)) => match s.trim().to_lowercase().as_str() {
                "true" | "yes" => Ok(Self::Bool(true)),
                "false" | "no" => Ok(Self::Bool(false)),
                _ => Err(format!("expected a boolean, got {:?}", s)),
            },
            (ParamKind::Boolean, Self::Number(_)) => {
                Err("expected a boolean, got a number".to_string())
            }
        }
    }
}

impl From<&str> for ArgValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for ArgValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<f64> for ArgValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<bool> for ArgValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Parameter name to value.
pub type ToolArguments = BTreeMap<String, ArgValue>;

/// Convert a JSON object into tool arguments, dropping nulls.
pub fn arguments_from_json(object: &Map<String, Value>) -> Result<ToolArguments, String> {
    let mut args = ToolArguments::new();
    for (name, value) in object {
        if let Some(v) = ArgValue::from_json(value).map_err(|e| format!("{}: {}", name, e))? {
            args.insert(name.clone(), v);
        }
    }
    Ok(args)
}

/// One entry of a tool's argument schema.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParamSpec {
    pub name: String,
    pub kind: ParamKind,
    pub description: String,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<ArgValue>,
}

impl ParamSpec {
    pub fn required(name: &str, kind: ParamKind, description: &str) -> Self {
        Self {
            name: name.to_string(),
            kind,
            description: description.to_string(),
            required: true,
            default: None,
        }
    }

    pub fn optional(name: &str, kind: ParamKind, description: &str) -> Self {
        Self {
            required: false,
            ..Self::required(name, kind, description)
        }
    }

    pub fn with_default(mut self, value: impl Into<ArgValue>) -> Self {
        self.default = Some(value.into());
        self
    }
}

/// Catalog entry for a callable operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub params: Vec<ParamSpec>,
    /// Instructions for turning a raw payload into prose. Tools without one
    /// have their payload rendered as JSON.
    #[serde(skip)]
    pub summary_brief: Option<String>,
}

impl ToolDefinition {
    pub fn required_params(&self) -> impl Iterator<Item = &ParamSpec> {
        self.params.iter().filter(|p| p.required)
    }

    /// Required parameters absent from `args`, in schema order.
    pub fn missing_arguments(&self, args: &ToolArguments) -> Vec<String> {
        self.required_params()
            .filter(|p| !args.contains_key(&p.name))
            .map(|p| p.name.clone())
            .collect()
    }

    /// Check completeness, coerce every known argument to its declared kind,
    /// and fill defaults. Unknown arguments pass through untouched.
    pub fn validate(&self, args: &ToolArguments) -> Result<ToolArguments, ToolError> {
        let missing = self.missing_arguments(args);
        if !missing.is_empty() {
            return Err(ToolError::MissingArgument(missing));
        }

        let mut validated = args.clone();
        for param in &self.params {
            match args.get(&param.name) {
                Some(value) => {
                    let coerced =
                        value
                            .coerce(param.kind)
                            .map_err(|reason| ToolError::InvalidArgument {
                                name: param.name.clone(),
                                reason,
                            })?;
                    validated.insert(param.name.clone(), coerced);
                }
                None => {
                    if let Some(default) = &param.default {
                        validated.insert(param.name.clone(), default.clone());
                    }
                }
            }
        }
        Ok(validated)
    }

    /// JSON-schema object describing the arguments.
    pub fn input_schema(&self) -> Value {
        let mut properties = Map::new();
        for param in &self.params {
            let mut prop = json!({
                "type": param.kind.schema_type(),
                "description": param.description,
            });
            if let Some(default) = &param.default {
                prop["default"] = default.to_json();
            }
            properties.insert(param.name.clone(), prop);
        }
        let required: Vec<&str> = self.required_params().map(|p| p.name.as_str()).collect();
        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    /// `name(required*, optional)` signature used in prompts.
    pub fn signature(&self) -> String {
        let params = self
            .params
            .iter()
            .map(|p| {
                if p.required {
                    format!("{}*", p.name)
                } else {
                    p.name.clone()
                }
            })
            .collect::<Vec<_>>()
            .join(", ");
        format!("{}({})", self.name, params)
    }
}

/// A request to run one tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    pub tool_name: String,
    #[serde(default)]
    pub arguments: ToolArguments,
}

impl ToolCallRequest {
    pub fn new(tool_name: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
            arguments: ToolArguments::new(),
        }
    }

    pub fn arg(mut self, name: &str, value: impl Into<ArgValue>) -> Self {
        self.arguments.insert(name.to_string(), value.into());
        self
    }
}

/// Outcome of one tool call. Failures are values, not errors.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ToolCallResult {
    Success { payload: Value },
    Failure { message: String },
}

impl ToolCallResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}
