use std::fmt;

use indexmap::IndexMap;

/// An ordered mapping of parameter keys to loosely-typed values.
///
/// Iteration order is the order in which entries were inserted, which is also the order diagnostics refer to when
/// reporting an entry's position.
pub type ParamMap = IndexMap<ParamKey, ParamValue>;

/// A parameter key.
///
/// Hosts hand over keys as text, as raw bytes, or occasionally as something else entirely (a YAML document can use an
/// integer or a sequence as a mapping key). Only textual keys can name a parameter.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum ParamKey {
    /// A UTF-8 string key.
    Text(String),

    /// A byte-string key.
    ///
    /// Treated as textual if it holds valid UTF-8.
    Bytes(Vec<u8>),

    /// A key of any other type.
    Other {
        /// Description of the key's type.
        ty: String,

        /// Rendering of the key, used to keep distinct keys of the same type apart.
        repr: String,
    },
}

impl ParamKey {
    /// Returns the key as a string slice, if it is textual.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s.as_str()),
            Self::Bytes(b) => std::str::from_utf8(b).ok(),
            Self::Other { .. } => None,
        }
    }
}

impl From<&str> for ParamKey {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for ParamKey {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl fmt::Display for ParamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => write!(f, "{}", s),
            Self::Bytes(b) => write!(f, "{}", String::from_utf8_lossy(b)),
            Self::Other { ty, repr } => write!(f, "<{} {}>", ty, repr),
        }
    }
}

/// A loosely-typed parameter value.
#[derive(Clone, Debug, PartialEq)]
pub enum ParamValue {
    /// A boolean.
    Bool(bool),

    /// A signed integer.
    Integer(i64),

    /// A string.
    Text(String),

    /// A nested mapping.
    Mapping(ParamMap),

    /// A value of a type that no parameter accepts.
    Unsupported {
        /// Description of the value's type.
        ty: String,
    },
}

impl ParamValue {
    /// Creates an unsupported value of the given type.
    pub fn unsupported<S: Into<String>>(ty: S) -> Self {
        Self::Unsupported { ty: ty.into() }
    }

    /// Returns a short name for the type of this value.
    pub fn type_name(&self) -> &str {
        match self {
            Self::Bool(_) => "bool",
            Self::Integer(_) => "integer",
            Self::Text(_) => "string",
            Self::Mapping(_) => "mapping",
            Self::Unsupported { ty } => ty.as_str(),
        }
    }

    /// Returns a reference to the inner mapping, if this value is a mapping.
    pub fn as_mapping(&self) -> Option<&ParamMap> {
        match self {
            Self::Mapping(map) => Some(map),
            _ => None,
        }
    }
}

impl From<bool> for ParamValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for ParamValue {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<ParamMap> for ParamValue {
    fn from(map: ParamMap) -> Self {
        Self::Mapping(map)
    }
}

impl<K, V> FromIterator<(K, V)> for ParamValue
where
    K: Into<ParamKey>,
    V: Into<ParamValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::Mapping(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

fn json_number_to_value(n: &serde_json::Number) -> ParamValue {
    match n.as_i64() {
        Some(i) => ParamValue::Integer(i),
        None if n.is_u64() => ParamValue::unsupported("integer (out of range)"),
        None => ParamValue::unsupported("float"),
    }
}

impl From<serde_json::Value> for ParamValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;

        match value {
            Value::Null => Self::unsupported("null"),
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => json_number_to_value(&n),
            Value::String(s) => Self::Text(s),
            Value::Array(_) => Self::unsupported("sequence"),
            Value::Object(obj) => Self::Mapping(
                obj.into_iter()
                    .map(|(k, v)| (ParamKey::Text(k), ParamValue::from(v)))
                    .collect(),
            ),
        }
    }
}

fn yaml_number_to_value(n: &serde_yaml::Number) -> ParamValue {
    match n.as_i64() {
        Some(i) => ParamValue::Integer(i),
        None if n.is_u64() => ParamValue::unsupported("integer (out of range)"),
        None => ParamValue::unsupported("float"),
    }
}

fn yaml_type_name(value: &serde_yaml::Value) -> &'static str {
    use serde_yaml::Value;

    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Sequence(_) => "sequence",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged",
    }
}

impl From<serde_yaml::Value> for ParamKey {
    fn from(value: serde_yaml::Value) -> Self {
        match value {
            serde_yaml::Value::String(s) => Self::Text(s),
            other => Self::Other {
                ty: yaml_type_name(&other).to_string(),
                repr: serde_yaml::to_string(&other)
                    .map(|s| s.trim_end().to_string())
                    .unwrap_or_default(),
            },
        }
    }
}

impl From<serde_yaml::Value> for ParamValue {
    fn from(value: serde_yaml::Value) -> Self {
        use serde_yaml::Value;

        match value {
            Value::Null => Self::unsupported("null"),
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => yaml_number_to_value(&n),
            Value::String(s) => Self::Text(s),
            Value::Sequence(_) => Self::unsupported("sequence"),
            Value::Mapping(map) => Self::Mapping(
                map.into_iter()
                    .map(|(k, v)| (ParamKey::from(k), ParamValue::from(v)))
                    .collect(),
            ),
            // Tags carry no meaning for parameters, so we look straight through them.
            Value::Tagged(tagged) => Self::from(tagged.value),
        }
    }
}
