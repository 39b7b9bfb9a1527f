// src/data/value.rs

//! Typed values extracted from capture groups, and the converters that
//! produce them.

use crate::data::datetime::{datetime_from_str, DateTimeL};
use crate::error::{Error, Result};

use std::fmt;
use std::str::FromStr;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// ScalarType
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// The declared type of a capture group. Selects the converter.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum ScalarType {
    #[default]
    String,
    Int,
    Float,
    Date,
}

impl ScalarType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ScalarType::String => "string",
            ScalarType::Int => "int",
            ScalarType::Float => "float",
            ScalarType::Date => "date",
        }
    }

    /// Convert captured `text` to a [`Value`] of this type.
    ///
    /// Returns `None` if `text` is not a valid instance of this type.
    pub fn convert(
        &self,
        text: &str,
    ) -> Option<Value> {
        match self {
            ScalarType::String => Some(Value::String(String::from(text))),
            ScalarType::Int => text.trim().parse::<i64>().ok().map(Value::Int),
            ScalarType::Float => text.trim().parse::<f64>().ok().map(Value::Float),
            ScalarType::Date => datetime_from_str(text).map(Value::Date),
        }
    }
}

impl FromStr for ScalarType {
    type Err = Error;

    fn from_str(s: &str) -> Result<ScalarType> {
        match s {
            "string" => Ok(ScalarType::String),
            "int" => Ok(ScalarType::Int),
            "float" => Ok(ScalarType::Float),
            "date" => Ok(ScalarType::Date),
            _ => Err(Error::UnsupportedConverter(String::from(s))),
        }
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Value
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// One converted capture group value.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// An optional capture group that did not participate in the match.
    Null,
    String(String),
    Int(i64),
    Float(f64),
    Date(DateTimeL),
}

pub type Values = Vec<Value>;

impl Value {
    /// The [`ScalarType`] of this value, `None` for [`Value::Null`].
    pub const fn scalar_type(&self) -> Option<ScalarType> {
        match self {
            Value::Null => None,
            Value::String(_) => Some(ScalarType::String),
            Value::Int(_) => Some(ScalarType::Int),
            Value::Float(_) => Some(ScalarType::Float),
            Value::Date(_) => Some(ScalarType::Date),
        }
    }

    pub const fn type_name(&self) -> &'static str {
        match self.scalar_type() {
            Some(scalar_type) => scalar_type.as_str(),
            None => "null",
        }
    }

    /// Numeric values as `f64`; `None` for other types.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub const fn as_datetime(&self) -> Option<&DateTimeL> {
        match self {
            Value::Date(dt) => Some(dt),
            _ => None,
        }
    }

    pub const fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Convert `literal` to the type of `self`.
    ///
    /// A [`Value::Null`] takes the literal as a string.
    pub fn literal_like(
        &self,
        literal: &str,
    ) -> Option<Value> {
        self.scalar_type()
            .unwrap_or_default()
            .convert(literal)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::String(s) => write!(f, "{:?}", s),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(fl) => write!(f, "{}", fl),
            Value::Date(dt) => write!(f, "{}", dt),
        }
    }
}
