//! Payload schemas
//!
//! A [`Schema`] turns the merged request payload into validated parameters or
//! a [`SchemaRejection`]. [`ObjectSchema`] covers the common case of a flat
//! object with typed fields; [`TypedSchema`] deserializes into a struct.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Number, Value};
use std::fmt;
use std::marker::PhantomData;
use type_mapping::{value_from_json, Parameters, PostgresValue};
use uuid::Uuid;

/// One field that failed validation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldViolation {
    pub path: String,
    pub code: &'static str,
    pub message: String,
}

impl FieldViolation {
    pub fn new(path: impl Into<String>, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            code,
            message: message.into(),
        }
    }
}

/// Why a payload was rejected
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaRejection {
    Violations(Vec<FieldViolation>),
    Message(String),
}

impl SchemaRejection {
    /// Structured form placed into the error's `details`
    pub fn details(&self) -> Value {
        match self {
            Self::Violations(violations) => serde_json::to_value(violations).unwrap_or(Value::Null),
            Self::Message(message) => Value::String(message.clone()),
        }
    }
}

impl fmt::Display for SchemaRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Violations(violations) => {
                let paths: Vec<&str> = violations.iter().map(|v| v.path.as_str()).collect();
                write!(f, "invalid fields: {}", paths.join(", "))
            }
            Self::Message(message) => f.write_str(message),
        }
    }
}

/// Parses a merged payload into parameters
#[async_trait]
pub trait Schema: Send + Sync {
    type Output: Send;

    async fn parse(&self, payload: Map<String, Value>) -> Result<Self::Output, SchemaRejection>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Integer,
    Number,
    Boolean,
    StringList,
    Uuid,
    DateTime,
}

impl FieldKind {
    fn name(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::StringList => "array",
            Self::Uuid => "uuid",
            Self::DateTime => "datetime",
        }
    }
}

fn received(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// RFC 3339, or a bare date taken as midnight UTC
fn parse_datetime(input: &str) -> Option<DateTime<Utc>> {
    if let Ok(at) = DateTime::parse_from_rfc3339(input) {
        return Some(at.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc())
}

/// Field definition for [`ObjectSchema`]
#[derive(Debug, Clone)]
pub struct Field {
    name: String,
    kind: FieldKind,
    required: bool,
    default: Option<Value>,
    min: Option<f64>,
    max: Option<f64>,
    min_len: Option<usize>,
    max_len: Option<usize>,
    one_of: Option<Vec<String>>,
}

impl Field {
    fn new(name: &str, kind: FieldKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            required: true,
            default: None,
            min: None,
            max: None,
            min_len: None,
            max_len: None,
            one_of: None,
        }
    }

    pub fn string(name: &str) -> Self {
        Self::new(name, FieldKind::String)
    }

    pub fn integer(name: &str) -> Self {
        Self::new(name, FieldKind::Integer)
    }

    pub fn number(name: &str) -> Self {
        Self::new(name, FieldKind::Number)
    }

    pub fn boolean(name: &str) -> Self {
        Self::new(name, FieldKind::Boolean)
    }

    pub fn string_list(name: &str) -> Self {
        Self::new(name, FieldKind::StringList)
    }

    pub fn uuid(name: &str) -> Self {
        Self::new(name, FieldKind::Uuid)
    }

    pub fn datetime(name: &str) -> Self {
        Self::new(name, FieldKind::DateTime)
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Value used when the field is absent; implies optional
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.required = false;
        self.default = Some(value.into());
        self
    }

    pub fn min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    pub fn max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }

    /// Minimum characters for strings, minimum entries for lists
    pub fn min_len(mut self, len: usize) -> Self {
        self.min_len = Some(len);
        self
    }

    /// Maximum characters for strings, maximum entries for lists
    pub fn max_len(mut self, len: usize) -> Self {
        self.max_len = Some(len);
        self
    }

    pub fn one_of<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.one_of = Some(values.into_iter().map(Into::into).collect());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn invalid_type(&self, value: &Value) -> FieldViolation {
        FieldViolation::new(
            &self.name,
            "invalid_type",
            format!("Expected {}, received {}", self.kind.name(), received(value)),
        )
    }

    fn unparsable_string(&self) -> FieldViolation {
        FieldViolation::new(
            &self.name,
            "invalid_type",
            format!("Expected {}, received string", self.kind.name()),
        )
    }

    /// Coerce string inputs from path and query into the declared type
    fn coerce(&self, value: Value) -> Result<Value, FieldViolation> {
        match (self.kind, value) {
            (FieldKind::String, v @ Value::String(_)) => Ok(v),
            (FieldKind::Integer, Value::Number(n)) => match n.as_i64() {
                Some(i) => Ok(Value::from(i)),
                None => match n.as_f64() {
                    Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Ok(Value::from(f as i64)),
                    _ => Err(FieldViolation::new(&self.name, "invalid_type", "Expected integer, received float")),
                },
            },
            (FieldKind::Integer, Value::String(s)) => s
                .trim()
                .parse::<i64>()
                .map(Value::from)
                .map_err(|_| self.unparsable_string()),
            (FieldKind::Number, v @ Value::Number(_)) => Ok(v),
            (FieldKind::Number, Value::String(s)) => s
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number)
                .ok_or_else(|| self.unparsable_string()),
            (FieldKind::Boolean, v @ Value::Bool(_)) => Ok(v),
            (FieldKind::Boolean, Value::String(s)) => match s.trim() {
                "true" | "1" => Ok(Value::Bool(true)),
                "false" | "0" => Ok(Value::Bool(false)),
                _ => Err(self.unparsable_string()),
            },
            (FieldKind::StringList, Value::String(s)) => Ok(Value::Array(
                s.split(',')
                    .map(str::trim)
                    .filter(|part| !part.is_empty())
                    .map(|part| Value::String(part.to_string()))
                    .collect(),
            )),
            (FieldKind::StringList, Value::Array(items)) => {
                if items.iter().all(Value::is_string) {
                    Ok(Value::Array(items))
                } else {
                    Err(FieldViolation::new(
                        &self.name,
                        "invalid_type",
                        "Expected array of strings",
                    ))
                }
            }
            (FieldKind::Uuid, Value::String(s)) => match Uuid::parse_str(s.trim()) {
                Ok(id) => Ok(Value::String(id.to_string())),
                Err(_) => Err(FieldViolation::new(&self.name, "invalid_string", "Invalid uuid")),
            },
            (FieldKind::DateTime, Value::String(s)) => match parse_datetime(s.trim()) {
                Some(at) => Ok(Value::String(at.to_rfc3339_opts(SecondsFormat::AutoSi, true))),
                None => Err(FieldViolation::new(&self.name, "invalid_string", "Invalid datetime")),
            },
            (_, other) => Err(self.invalid_type(&other)),
        }
    }

    /// Routine argument for a validated value
    ///
    /// The bound type follows the declared kind, never the content of a string.
    pub fn argument(&self, value: Value) -> PostgresValue {
        match (self.kind, value) {
            (_, Value::Null) => PostgresValue::Null,
            (FieldKind::String, Value::String(s)) => PostgresValue::Text(s),
            (FieldKind::Number, Value::Number(n)) => match n.as_f64() {
                Some(f) => PostgresValue::Float(f),
                None => value_from_json(Value::Number(n)),
            },
            (FieldKind::Uuid, Value::String(s)) => match Uuid::parse_str(&s) {
                Ok(id) => PostgresValue::Uuid(id),
                Err(_) => PostgresValue::Text(s),
            },
            (FieldKind::DateTime, Value::String(s)) => match parse_datetime(&s) {
                Some(at) => PostgresValue::Timestamp(at),
                None => PostgresValue::Text(s),
            },
            (_, other) => value_from_json(other),
        }
    }

    fn check(&self, value: &Value) -> Option<FieldViolation> {
        let length = match value {
            Value::String(s) => Some(s.chars().count()),
            Value::Array(items) => Some(items.len()),
            _ => None,
        };
        if let (Some(len), Some(min)) = (length, self.min_len) {
            if len < min {
                return Some(FieldViolation::new(
                    &self.name,
                    "too_small",
                    format!("Must contain at least {} element(s)", min),
                ));
            }
        }
        if let (Some(len), Some(max)) = (length, self.max_len) {
            if len > max {
                return Some(FieldViolation::new(
                    &self.name,
                    "too_big",
                    format!("Must contain at most {} element(s)", max),
                ));
            }
        }

        if let Some(n) = value.as_f64() {
            if let Some(min) = self.min {
                if n < min {
                    return Some(FieldViolation::new(
                        &self.name,
                        "too_small",
                        format!("Must be greater than or equal to {}", min),
                    ));
                }
            }
            if let Some(max) = self.max {
                if n > max {
                    return Some(FieldViolation::new(
                        &self.name,
                        "too_big",
                        format!("Must be less than or equal to {}", max),
                    ));
                }
            }
        }

        if let Some(allowed) = &self.one_of {
            let candidates: Vec<&str> = match value {
                Value::String(s) => vec![s.as_str()],
                Value::Array(items) => items.iter().filter_map(Value::as_str).collect(),
                _ => Vec::new(),
            };
            if candidates.iter().any(|c| !allowed.iter().any(|a| a == c)) {
                return Some(FieldViolation::new(
                    &self.name,
                    "invalid_enum_value",
                    format!("Expected one of: {}", allowed.join(", ")),
                ));
            }
        }

        None
    }
}

/// Flat object schema
///
/// Keys not declared as fields are stripped from the output. Every field is
/// checked; all violations are reported together.
///
/// ```ignore
/// let schema = ObjectSchema::new()
///     .field(Field::integer("id").min(1.0))
///     .field(Field::string("title").min_len(1).max_len(200))
///     .field(Field::boolean("published").default_value(false));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ObjectSchema {
    fields: Vec<Field>,
}

impl ObjectSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_fields(mut self, fields: impl IntoIterator<Item = Field>) -> Self {
        self.fields.extend(fields);
        self
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Convert validated output into routine arguments, typed by field kind
    pub fn arguments(&self, params: Map<String, Value>) -> Parameters {
        params
            .into_iter()
            .map(|(name, value)| {
                let argument = match self.fields.iter().find(|field| field.name == name) {
                    Some(field) => field.argument(value),
                    None => value_from_json(value),
                };
                (name, argument)
            })
            .collect()
    }

    pub fn validate(&self, mut payload: Map<String, Value>) -> Result<Map<String, Value>, SchemaRejection> {
        let mut output = Map::new();
        let mut violations = Vec::new();

        for field in &self.fields {
            match payload.remove(&field.name) {
                None | Some(Value::Null) => {
                    if let Some(default) = &field.default {
                        output.insert(field.name.clone(), default.clone());
                    } else if field.required {
                        violations.push(FieldViolation::new(&field.name, "required", "Required"));
                    }
                }
                Some(value) => match field.coerce(value) {
                    Ok(coerced) => match field.check(&coerced) {
                        Some(violation) => violations.push(violation),
                        None => {
                            output.insert(field.name.clone(), coerced);
                        }
                    },
                    Err(violation) => violations.push(violation),
                },
            }
        }

        if violations.is_empty() {
            Ok(output)
        } else {
            Err(SchemaRejection::Violations(violations))
        }
    }
}

#[async_trait]
impl Schema for ObjectSchema {
    type Output = Map<String, Value>;

    async fn parse(&self, payload: Map<String, Value>) -> Result<Self::Output, SchemaRejection> {
        self.validate(payload)
    }
}

/// Validates with an [`ObjectSchema`], then deserializes into `T`
pub struct TypedSchema<T> {
    object: ObjectSchema,
    _marker: PhantomData<fn() -> T>,
}

impl<T> TypedSchema<T> {
    pub fn new(object: ObjectSchema) -> Self {
        Self {
            object,
            _marker: PhantomData,
        }
    }
}

#[async_trait]
impl<T> Schema for TypedSchema<T>
where
    T: DeserializeOwned + Send,
{
    type Output = T;

    async fn parse(&self, payload: Map<String, Value>) -> Result<T, SchemaRejection> {
        let validated = self.object.validate(payload)?;
        serde_json::from_value(Value::Object(validated)).map_err(|e| SchemaRejection::Message(e.to_string()))
    }
}
