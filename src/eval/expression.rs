use tracing::debug;

use crate::ast::{Apply, Constant, DerivedField, Expression, FieldRef, Function};
use crate::value::{lookup, Row, Value};

use super::evaluator::{EvalError, EvalResult};

/// Evaluates `DerivedField` expression trees.
///
/// Missing inputs flow through as [`Value::Absent`] instead of failing:
/// arithmetic and comparisons over an absent operand are themselves absent,
/// and only `isMissing`/`isNotMissing` turn absence into a definite answer.
pub struct ExpressionEvaluator;

impl Default for ExpressionEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl ExpressionEvaluator {
    pub fn new() -> Self {
        Self
    }

    pub fn eval_expression(&self, expr: &Expression, row: &Row) -> EvalResult<Value> {
        match expr {
            Expression::FieldRef(field_ref) => self.eval_field_ref(field_ref, row),
            Expression::Constant(constant) => self.eval_constant(constant),
            Expression::Apply(apply) => self.eval_apply(apply, row),
        }
    }

    /// Evaluates a derived field and applies its declared data type.
    pub fn eval_derived_field(&self, field: &DerivedField, row: &Row) -> EvalResult<Value> {
        let wrap = |err| EvalError::DerivedField {
            name: field.name.clone(),
            source: Box::new(err),
        };
        let value = self.eval_expression(&field.expression, row).map_err(wrap)?;
        match field.data_type {
            Some(data_type) => value.coerce(data_type).map_err(wrap),
            None => Ok(value),
        }
    }

    /// Appends every derived field to `row` in declaration order, so later
    /// fields can read earlier ones. Absent results are not inserted.
    pub fn apply_derived_fields(&self, fields: &[DerivedField], row: &mut Row) -> EvalResult<()> {
        for field in fields {
            let value = self.eval_derived_field(field, row)?;
            debug!(field = %field.name, %value, "derived field");
            if !matches!(value, Value::Absent) {
                row.insert(field.name.clone(), value);
            }
        }
        Ok(())
    }

    fn eval_field_ref(&self, field_ref: &FieldRef, row: &Row) -> EvalResult<Value> {
        let value = match (lookup(row, &field_ref.field), &field_ref.map_missing_to) {
            (Value::Absent, Some(replacement)) => Value::from_literal(replacement),
            (value, _) => value.clone(),
        };
        match field_ref.data_type {
            Some(data_type) => value.coerce(data_type),
            None => Ok(value),
        }
    }

    fn eval_constant(&self, constant: &Constant) -> EvalResult<Value> {
        match constant.data_type {
            Some(data_type) => constant.value.coerce(data_type),
            None => Ok(constant.value.clone()),
        }
    }

    fn eval_apply(&self, apply: &Apply, row: &Row) -> EvalResult<Value> {
        let args = &apply.children;
        match apply.function {
            Function::Add | Function::Subtract | Function::Multiply | Function::Divide => {
                expect_arity(apply, 2)?;
                let lhs = self.eval_expression(&args[0], row)?;
                let rhs = self.eval_expression(&args[1], row)?;
                self.eval_arithmetic(apply.function, &lhs, &rhs)
            }
            Function::IsMissing | Function::IsNotMissing => {
                expect_arity(apply, 1)?;
                let missing = self.eval_expression(&args[0], row)?.is_missing();
                Ok(Value::Boolean(missing == (apply.function == Function::IsMissing)))
            }
            Function::Equal | Function::NotEqual => {
                expect_arity(apply, 2)?;
                let lhs = self.eval_expression(&args[0], row)?;
                let rhs = self.eval_expression(&args[1], row)?;
                if matches!(lhs, Value::Absent) || matches!(rhs, Value::Absent) {
                    return Ok(Value::Absent);
                }
                let equal = values_equal(&lhs, &rhs);
                Ok(Value::Boolean(equal == (apply.function == Function::Equal)))
            }
            Function::IsIn | Function::IsNotIn => {
                if args.is_empty() {
                    return Err(EvalError::InvalidArity {
                        function: apply.function.to_string(),
                        expected: 1,
                        actual: 0,
                    });
                }
                let needle = self.eval_expression(&args[0], row)?;
                if matches!(needle, Value::Absent) {
                    return Ok(Value::Absent);
                }
                let mut found = false;
                for candidate in &args[1..] {
                    if values_equal(&needle, &self.eval_expression(candidate, row)?) {
                        found = true;
                        break;
                    }
                }
                Ok(Value::Boolean(found == (apply.function == Function::IsIn)))
            }
        }
    }

    // 二項演算子の実装
    fn eval_arithmetic(&self, function: Function, lhs: &Value, rhs: &Value) -> EvalResult<Value> {
        if matches!(lhs, Value::Absent) || matches!(rhs, Value::Absent) {
            return Ok(Value::Absent);
        }
        let (a, b) = (lhs.to_number()?, rhs.to_number()?);
        let result = match function {
            Function::Add => a + b,
            Function::Subtract => a - b,
            Function::Multiply => a * b,
            Function::Divide if b == 0.0 => return Ok(Value::Absent),
            Function::Divide => a / b,
            other => {
                return Err(EvalError::malformed(format!(
                    "{} is not an arithmetic function",
                    other
                )))
            }
        };
        Ok(Value::Number(result))
    }
}

fn expect_arity(apply: &Apply, expected: usize) -> EvalResult<()> {
    if apply.children.len() == expected {
        Ok(())
    } else {
        Err(EvalError::InvalidArity {
            function: apply.function.to_string(),
            expected,
            actual: apply.children.len(),
        })
    }
}

/// Numeric comparison when both sides read as numbers, boolean when either
/// side is boolean, text otherwise.
fn values_equal(lhs: &Value, rhs: &Value) -> bool {
    match (lhs, rhs) {
        (Value::Boolean(_), _) | (_, Value::Boolean(_)) => {
            lhs.as_bool().is_some() && lhs.as_bool() == rhs.as_bool()
        }
        _ => match (lhs.as_number(), rhs.as_number()) {
            (Some(a), Some(b)) => a == b,
            _ => lhs.to_string() == rhs.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::DataType;

    fn field(name: &str) -> Expression {
        Expression::FieldRef(FieldRef {
            field: name.to_string(),
            data_type: None,
            map_missing_to: None,
        })
    }

    fn constant(value: Value) -> Expression {
        Expression::Constant(Constant {
            value,
            data_type: None,
        })
    }

    fn apply(function: Function, children: Vec<Expression>) -> Expression {
        Expression::Apply(Apply { function, children })
    }

    fn eval(expr: &Expression, row: &Row) -> EvalResult<Value> {
        ExpressionEvaluator::new().eval_expression(expr, row)
    }

    fn sample_row() -> Row {
        let mut row = Row::new();
        row.insert("a".to_string(), Value::Number(6.0));
        row.insert("b".to_string(), Value::from("1.5"));
        row.insert("name".to_string(), Value::from("iris"));
        row
    }

    #[test]
    fn test_arithmetic() {
        let row = sample_row();
        let cases = [
            (Function::Add, 7.5),
            (Function::Subtract, 4.5),
            (Function::Multiply, 9.0),
            (Function::Divide, 4.0),
        ];
        for (function, expected) in cases {
            let expr = apply(function, vec![field("a"), field("b")]);
            assert_eq!(eval(&expr, &row).unwrap(), Value::Number(expected));
        }
    }

    #[test]
    fn test_arithmetic_with_absent_or_bad_operand() {
        let row = sample_row();
        let expr = apply(Function::Multiply, vec![field("a"), field("nope")]);
        assert_eq!(eval(&expr, &row).unwrap(), Value::Absent);

        let expr = apply(Function::Subtract, vec![field("a"), field("name")]);
        let err = eval(&expr, &row).unwrap_err();
        assert!(matches!(err, EvalError::Coercion { .. }));

        let expr = apply(Function::Divide, vec![field("a"), constant(Value::Number(0.0))]);
        assert_eq!(eval(&expr, &row).unwrap(), Value::Absent);

        let expr = apply(Function::Add, vec![field("a")]);
        assert!(matches!(
            eval(&expr, &row).unwrap_err(),
            EvalError::InvalidArity { expected: 2, actual: 1, .. }
        ));
    }

    #[test]
    fn test_missing_checks() {
        let row = sample_row();
        let expr = apply(Function::IsMissing, vec![field("nope")]);
        assert_eq!(eval(&expr, &row).unwrap(), Value::Boolean(true));
        let expr = apply(Function::IsNotMissing, vec![field("a")]);
        assert_eq!(eval(&expr, &row).unwrap(), Value::Boolean(true));
    }

    #[test]
    fn test_equality_and_membership() {
        let row = sample_row();
        let expr = apply(Function::Equal, vec![field("b"), constant(Value::Number(1.5))]);
        assert_eq!(eval(&expr, &row).unwrap(), Value::Boolean(true));
        let expr = apply(Function::NotEqual, vec![field("name"), constant("iris".into())]);
        assert_eq!(eval(&expr, &row).unwrap(), Value::Boolean(false));

        let expr = apply(
            Function::IsIn,
            vec![field("name"), constant("rose".into()), constant("iris".into())],
        );
        assert_eq!(eval(&expr, &row).unwrap(), Value::Boolean(true));
        let expr = apply(Function::IsNotIn, vec![field("a"), constant(Value::Number(6.0))]);
        assert_eq!(eval(&expr, &row).unwrap(), Value::Boolean(false));
    }

    #[test]
    fn test_field_ref_type_and_map_missing_to() {
        let row = sample_row();
        let expr = Expression::FieldRef(FieldRef {
            field: "b".to_string(),
            data_type: Some(DataType::Double),
            map_missing_to: None,
        });
        assert_eq!(eval(&expr, &row).unwrap(), Value::Number(1.5));

        let expr = Expression::FieldRef(FieldRef {
            field: "nope".to_string(),
            data_type: None,
            map_missing_to: Some("42".to_string()),
        });
        assert_eq!(eval(&expr, &row).unwrap(), Value::Number(42.0));
    }

    #[test]
    fn test_derived_fields_chain() {
        let fields = vec![
            DerivedField {
                name: "double_a".to_string(),
                optype: None,
                data_type: Some(DataType::Double),
                expression: apply(Function::Multiply, vec![field("a"), constant(Value::Number(2.0))]),
            },
            DerivedField {
                name: "plus_one".to_string(),
                optype: None,
                data_type: Some(DataType::Integer),
                expression: apply(Function::Add, vec![field("double_a"), field("b")]),
            },
            DerivedField {
                name: "ghost".to_string(),
                optype: None,
                data_type: None,
                expression: field("nope"),
            },
        ];
        let mut row = sample_row();
        ExpressionEvaluator::new()
            .apply_derived_fields(&fields, &mut row)
            .unwrap();
        assert_eq!(row["double_a"], Value::Number(12.0));
        assert_eq!(row["plus_one"], Value::Number(13.0));
        assert!(!row.contains_key("ghost"));
    }

    #[test]
    fn test_derived_field_errors_carry_name() {
        let fields = vec![DerivedField {
            name: "broken".to_string(),
            optype: None,
            data_type: None,
            expression: apply(Function::Divide, vec![field("name"), field("a")]),
        }];
        let mut row = sample_row();
        let err = ExpressionEvaluator::new()
            .apply_derived_fields(&fields, &mut row)
            .unwrap_err();
        assert!(matches!(err, EvalError::DerivedField { ref name, .. } if name == "broken"));
    }
}
