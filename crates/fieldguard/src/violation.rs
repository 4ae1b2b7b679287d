use std::fmt;

use serde::Serialize;
use uuid::Uuid;

/// A single instance where a validation rule was not met.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[non_exhaustive]
pub struct Violation {
    /// Translated, human-readable message.
    message: String,

    /// Rendered path of the violated field.
    location: String,

    /// The offending value, kept for diagnostics.
    value: FieldValue,
}

impl Violation {
    /// Create a violation directly, bypassing translation.
    ///
    /// Custom rules normally go through [`Helper::violation`](crate::Helper::violation)
    /// instead so the message is localized and the location filled in.
    pub fn new(
        location: impl Into<String>,
        message: impl Into<String>,
        value: impl Into<FieldValue>,
    ) -> Self {
        Self {
            message: message.into(),
            location: location.into(),
            value: value.into(),
        }
    }

    /// Returns the translated message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the rendered field location.
    #[must_use]
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Returns the value that failed validation.
    #[must_use]
    pub fn value(&self) -> &FieldValue {
        &self.value
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "{}", self.location)
        } else {
            write!(f, "{}: {}", self.location, self.message)
        }
    }
}

/// Snapshot of a field value attached to a [`Violation`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Absent value (`None`).
    Null,
    /// Boolean value.
    Bool(bool),
    /// Signed integer value.
    Int(i64),
    /// Unsigned integer value.
    UInt(u64),
    /// Floating point value.
    Float(f64),
    /// String value.
    String(String),
    /// Identifier value.
    Uuid(Uuid),
    /// Slice value.
    List(Vec<FieldValue>),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::UInt(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::String(v) => write!(f, "{v:?}"),
            Self::Uuid(v) => write!(f, "{v}"),
            Self::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
        }
    }
}

macro_rules! from_lossless {
    ($variant:ident, $target:ty, $($source:ty),*) => {
        $(
            impl From<$source> for FieldValue {
                fn from(v: $source) -> Self {
                    Self::$variant(<$target>::from(v))
                }
            }
        )*
    };
}

from_lossless!(Int, i64, i8, i16, i32, i64);
from_lossless!(UInt, u64, u8, u16, u32, u64);
from_lossless!(Float, f64, f32, f64);

impl From<isize> for FieldValue {
    #[allow(clippy::cast_possible_truncation)]
    fn from(v: isize) -> Self {
        Self::Int(v as i64)
    }
}

impl From<usize> for FieldValue {
    #[allow(clippy::cast_possible_truncation)]
    fn from(v: usize) -> Self {
        Self::UInt(v as u64)
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_owned())
    }
}

impl From<&String> for FieldValue {
    fn from(v: &String) -> Self {
        Self::String(v.clone())
    }
}

impl From<Uuid> for FieldValue {
    fn from(v: Uuid) -> Self {
        Self::Uuid(v)
    }
}

impl<V: Into<FieldValue>> From<Option<V>> for FieldValue {
    fn from(v: Option<V>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

impl<V: Into<FieldValue>> From<Vec<V>> for FieldValue {
    fn from(v: Vec<V>) -> Self {
        Self::List(v.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::{FieldValue, Violation};
    use pretty_assertions::assert_eq;

    #[test]
    fn violation_serializes_with_plain_values() {
        let v = Violation::new("templates", "must match the pattern", "bad!");
        let json = serde_json::to_value(&v).expect("violation serializes");
        assert_eq!(
            json,
            serde_json::json!({
                "message": "must match the pattern",
                "location": "templates",
                "value": "bad!",
            })
        );

        let absent = Violation::new("port", "value is required", Option::<u16>::None);
        let json = serde_json::to_value(&absent).expect("violation serializes");
        assert_eq!(json["value"], serde_json::Value::Null);
    }

    #[test]
    fn field_value_display_quotes_strings_only() {
        let list = FieldValue::from(vec![Some(1_i32), None]);
        assert_eq!(list.to_string(), "[1, null]");
        assert_eq!(FieldValue::from("x").to_string(), "\"x\"");
        assert_eq!(FieldValue::from(2.5_f64).to_string(), "2.5");
    }

    #[test]
    fn violation_display_omits_empty_message() {
        assert_eq!(Violation::new("host", "", "").to_string(), "host");
        assert_eq!(
            Violation::new("host", "value is required", "").to_string(),
            "host: value is required"
        );
    }
}
