use serde_json::Value;

use super::Model;

/// Current value of one field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Scalar(Value),
    Model(Box<Model>),
    Models(Vec<Model>),
}

impl FieldValue {
    pub fn as_scalar(&self) -> Option<&Value> {
        match self {
            Self::Scalar(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        self.as_scalar().and_then(Value::as_str)
    }

    pub fn as_bool(&self) -> Option<bool> {
        self.as_scalar().and_then(Value::as_bool)
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.as_scalar().and_then(Value::as_i64)
    }

    pub fn as_model(&self) -> Option<&Model> {
        match self {
            Self::Model(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_models(&self) -> Option<&[Model]> {
        match self {
            Self::Models(ms) => Some(ms),
            _ => None,
        }
    }

    /// Absent-equivalent values are never written to the wire.
    pub(crate) fn is_blank(&self) -> bool {
        match self {
            Self::Scalar(v) => v.is_null(),
            Self::Model(_) => false,
            Self::Models(ms) => ms.is_empty(),
        }
    }
}

impl From<Value> for FieldValue {
    fn from(v: Value) -> Self {
        Self::Scalar(v)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::Scalar(Value::from(s))
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        Self::Scalar(Value::String(s))
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        Self::Scalar(Value::Bool(b))
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        Self::Scalar(Value::from(n))
    }
}

impl From<Model> for FieldValue {
    fn from(m: Model) -> Self {
        Self::Model(Box::new(m))
    }
}

impl From<Vec<Model>> for FieldValue {
    fn from(ms: Vec<Model>) -> Self {
        Self::Models(ms)
    }
}
