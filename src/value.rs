use core::fmt;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::ast::DataType;
use crate::eval::evaluator::{EvalError, EvalResult};

/// Input row: field name to loosely typed value.
pub type Row = HashMap<String, Value>;

/// Evaluation result: output name to value.
pub type Outputs = HashMap<String, Value>;

// 値の型システム
#[derive(Clone, Debug, PartialEq, Default, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Value {
    Number(f64),
    Boolean(bool),
    Text(String),
    #[default]
    Absent,
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", n),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Text(s) => write!(f, "{}", s),
            Value::Absent => write!(f, "<absent>"),
        }
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl Value {
    /// Reads a PMML attribute literal: numbers become `Number`, anything else `Text`.
    pub fn from_literal(literal: &str) -> Self {
        match literal.trim().parse::<f64>() {
            Ok(n) => Value::Number(n),
            Err(_) => Value::Text(literal.to_string()),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "number",
            Value::Boolean(_) => "boolean",
            Value::Text(_) => "text",
            Value::Absent => "absent",
        }
    }

    /// Absent values and empty strings both count as missing.
    pub fn is_missing(&self) -> bool {
        match self {
            Value::Absent => true,
            Value::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Numeric view of the value; numeric-looking text parses.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Text(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            Value::Text(s) => parse_bool(s),
            Value::Number(n) if *n == 0.0 => Some(false),
            Value::Number(n) if *n == 1.0 => Some(true),
            _ => None,
        }
    }

    pub fn to_number(&self) -> EvalResult<f64> {
        self.as_number()
            .ok_or_else(|| EvalError::coercion(self, DataType::Double))
    }

    /// Coerces to the declared data type. `Absent` stays absent.
    pub fn coerce(&self, data_type: DataType) -> EvalResult<Value> {
        if matches!(self, Value::Absent) {
            return Ok(Value::Absent);
        }
        match data_type {
            DataType::Double | DataType::Float => self.to_number().map(Value::Number),
            DataType::Integer => self.to_number().map(|n| Value::Number(n.trunc())),
            DataType::Boolean => self
                .as_bool()
                .map(Value::Boolean)
                .ok_or_else(|| EvalError::coercion(self, data_type)),
            DataType::String => Ok(Value::Text(self.to_string())),
        }
    }

    /// Equality against a PMML literal: numeric when both sides are numeric,
    /// boolean for boolean values, exact text otherwise.
    pub fn matches_literal(&self, literal: &str) -> bool {
        match self {
            Value::Number(n) => literal
                .trim()
                .parse::<f64>()
                .map(|l| l == *n)
                .unwrap_or(false),
            Value::Boolean(b) => parse_bool(literal) == Some(*b),
            Value::Text(s) => {
                s == literal
                    || matches!(
                        (s.trim().parse::<f64>(), literal.trim().parse::<f64>()),
                        (Ok(a), Ok(b)) if a == b
                    )
            }
            Value::Absent => false,
        }
    }
}

pub(crate) fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

/// Looks a field up; unknown names read as `Absent`.
pub fn lookup<'a>(row: &'a Row, field: &str) -> &'a Value {
    static ABSENT: Value = Value::Absent;
    row.get(field).unwrap_or(&ABSENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_untagged_deserialize() {
        let row: Row =
            serde_json::from_str(r#"{"a": 1.5, "b": "x", "c": true, "d": null}"#).unwrap();
        assert_eq!(row["a"], Value::Number(1.5));
        assert_eq!(row["b"], Value::Text("x".to_string()));
        assert_eq!(row["c"], Value::Boolean(true));
        assert_eq!(row["d"], Value::Absent);
    }

    #[test]
    fn test_numeric_coercion() {
        assert_eq!(Value::from("75").as_number(), Some(75.0));
        assert_eq!(Value::from(" 2.5 ").as_number(), Some(2.5));
        assert_eq!(Value::from("sunny").as_number(), None);
        assert_eq!(Value::Boolean(true).as_number(), None);
        assert!(Value::from("sunny").to_number().is_err());
    }

    #[test]
    fn test_coerce_to_declared_type() {
        assert_eq!(
            Value::from("10").coerce(DataType::Double).unwrap(),
            Value::Number(10.0)
        );
        assert_eq!(
            Value::Number(3.7).coerce(DataType::Integer).unwrap(),
            Value::Number(3.0)
        );
        assert_eq!(
            Value::Number(3.0).coerce(DataType::String).unwrap(),
            Value::from("3")
        );
        assert_eq!(
            Value::Absent.coerce(DataType::Double).unwrap(),
            Value::Absent
        );
        assert!(Value::from("maybe").coerce(DataType::Boolean).is_err());
    }

    #[test]
    fn test_missing_and_literal_matching() {
        assert!(Value::Absent.is_missing());
        assert!(Value::from("").is_missing());
        assert!(!Value::Number(0.0).is_missing());

        assert!(Value::Number(0.0).matches_literal("0"));
        assert!(Value::from("0").matches_literal("0.0"));
        assert!(Value::from("carpark").matches_literal("carpark"));
        assert!(!Value::from("carpark").matches_literal("street"));
        assert!(Value::Boolean(false).matches_literal("false"));
        assert!(!Value::Absent.matches_literal(""));
    }
}
