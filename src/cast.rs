use crate::literal;
use crate::value::Value;
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

/// Raw strings that cast to `true`, compared after lowercasing
pub const TRUE_STRINGS: [&str; 6] = ["1", "true", "yes", "on", "ok", "y"];

/// User-supplied value transform; the error string becomes the failure reason
pub type ValueFn = Arc<dyn Fn(Value) -> Result<Value, String> + Send + Sync>;

/// User-supplied transform applied to the raw string before casting
pub type Preprocessor = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// How a raw environment string becomes a [`Value`]
#[derive(Clone, Default)]
pub enum Cast {
    /// Keep the raw string
    #[default]
    Str,
    /// Match against [`TRUE_STRINGS`], anything else is false
    Bool,
    Int,
    Float,
    /// Structural literal: lists, tuples, dicts, quoted strings, numbers
    Literal,
    Json,
    /// UTF-8 bytes of the raw string
    Bytes,
    Custom(ValueFn),
}

impl Cast {
    /// Wrap a pure function as a cast
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(Value) -> Result<Value, String> + Send + Sync + 'static,
    {
        Cast::Custom(Arc::new(f))
    }

    /// Short name, used in docs and logs
    pub fn name(&self) -> &'static str {
        match self {
            Cast::Str => "str",
            Cast::Bool => "bool",
            Cast::Int => "int",
            Cast::Float => "float",
            Cast::Literal => "literal",
            Cast::Json => "json",
            Cast::Bytes => "bytes",
            Cast::Custom(_) => "custom",
        }
    }

    pub fn is_bool(&self) -> bool {
        matches!(self, Cast::Bool)
    }

    /// Cast a raw string
    pub fn apply(&self, raw: &str) -> Result<Value, String> {
        match self {
            Cast::Str => Ok(Value::Str(raw.to_string())),
            Cast::Bool => Ok(Value::Bool(
                TRUE_STRINGS.contains(&raw.to_lowercase().as_str()),
            )),
            Cast::Int => raw
                .trim()
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|e| format!("not an integer: {}", e)),
            Cast::Float => raw
                .trim()
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|e| format!("not a float: {}", e)),
            Cast::Literal => literal::parse(raw),
            Cast::Json => serde_json::from_str::<serde_json::Value>(raw)
                .map(Value::from)
                .map_err(|e| format!("not valid JSON: {}", e)),
            Cast::Bytes => Ok(Value::Bytes(raw.as_bytes().to_vec())),
            Cast::Custom(f) => f(Value::Str(raw.to_string())),
        }
    }

    /// Cast an already-resolved value, as done for container elements
    ///
    /// Built-in casts work on the textual form of non-string values.
    pub fn apply_value(&self, value: Value) -> Result<Value, String> {
        match (self, value) {
            (Cast::Custom(f), value) => f(value),
            (_, Value::Str(s)) => self.apply(&s),
            (_, other) => self.apply(&other.to_string()),
        }
    }

    /// Cast every element of a container, preserving its shape; scalars pass through
    pub fn apply_each(&self, value: Value) -> Result<Value, String> {
        match value {
            Value::List(items) => items
                .into_iter()
                .map(|item| self.apply_value(item))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::List),
            Value::Tuple(items) => items
                .into_iter()
                .map(|item| self.apply_value(item))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Tuple),
            Value::Map(map) => map
                .into_iter()
                .map(|(key, item)| self.apply_value(item).map(|v| (key, v)))
                .collect::<Result<IndexMap<_, _>, _>>()
                .map(Value::Map),
            scalar => Ok(scalar),
        }
    }
}

impl fmt::Debug for Cast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Cast::{}", self.name())
    }
}

/// Postprocessor splitting a string value on `sep` into a list of strings
pub fn tokenize(sep: &str) -> impl Fn(Value) -> Result<Value, String> + Send + Sync + 'static {
    let sep = sep.to_string();
    move |value: Value| match value {
        Value::Str(s) => Ok(Value::List(
            s.split(sep.as_str())
                .map(|part| Value::Str(part.to_string()))
                .collect(),
        )),
        other => Err(format!("cannot tokenize non-string value {}", other)),
    }
}

/// Cast producing the UTF-8 bytes of a string value
pub fn to_bytes(value: Value) -> Result<Value, String> {
    match value {
        Value::Str(s) => Ok(Value::Bytes(s.into_bytes())),
        Value::Bytes(b) => Ok(Value::Bytes(b)),
        other => Ok(Value::Bytes(other.to_string().into_bytes())),
    }
}
