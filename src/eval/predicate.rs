use std::cmp::Ordering;

use tracing::trace;

use crate::ast::{
    BooleanOperator, CompoundPredicate, Operator, Predicate, SetOperator, SimplePredicate,
    SimpleSetPredicate,
};
use crate::value::{lookup, parse_bool, Row, Value};

use super::evaluator::{EvalError, EvalResult};

/// Three-valued predicate outcome. `Unknown` stands for "could not be
/// decided from this row" (absent or uncoercible data).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriBool {
    True,
    False,
    Unknown,
}

impl TriBool {
    pub fn is_true(self) -> bool {
        self == TriBool::True
    }

    pub fn is_unknown(self) -> bool {
        self == TriBool::Unknown
    }
}

impl From<bool> for TriBool {
    fn from(value: bool) -> Self {
        if value {
            TriBool::True
        } else {
            TriBool::False
        }
    }
}

#[derive(Default)]
pub struct PredicateEvaluator;

impl PredicateEvaluator {
    pub fn new() -> Self {
        Self
    }

    pub fn eval_predicate(&self, predicate: &Predicate, row: &Row) -> EvalResult<TriBool> {
        match predicate {
            Predicate::True => Ok(TriBool::True),
            Predicate::False => Ok(TriBool::False),
            Predicate::Simple(simple) => self.eval_simple(simple, row),
            Predicate::SimpleSet(set) => Ok(self.eval_simple_set(set, row)),
            Predicate::Compound(compound) => self.eval_compound(compound, row),
        }
    }

    /// Conjunction of several predicates, as used by segment guards.
    /// An empty list is `True`.
    pub fn eval_all(&self, predicates: &[Predicate], row: &Row) -> EvalResult<TriBool> {
        self.eval_and(predicates, row)
    }

    fn eval_simple(&self, predicate: &SimplePredicate, row: &Row) -> EvalResult<TriBool> {
        let value = lookup(row, &predicate.field);
        match predicate.operator {
            Operator::IsMissing => return Ok(value.is_missing().into()),
            Operator::IsNotMissing => return Ok((!value.is_missing()).into()),
            _ => {}
        }
        if matches!(value, Value::Absent) {
            trace!(field = %predicate.field, "field absent, predicate unknown");
            return Ok(TriBool::Unknown);
        }

        let literal = predicate.value.as_deref().ok_or_else(|| {
            EvalError::malformed(format!(
                "{} predicate on {} has no value",
                predicate.operator, predicate.field
            ))
        })?;
        let invalid_literal = || EvalError::InvalidLiteral {
            field: predicate.field.clone(),
            literal: literal.to_string(),
        };
        let unsupported = || EvalError::UnsupportedOperator {
            operator: predicate.operator.to_string(),
            value_type: value.type_name(),
        };

        match (value, predicate.operator) {
            (_, Operator::IsIn | Operator::IsNotIn) => Err(unsupported()),
            (Value::Boolean(b), Operator::Equal | Operator::NotEqual) => {
                let expected = parse_bool(literal).ok_or_else(invalid_literal)?;
                let equal = *b == expected;
                Ok((equal == (predicate.operator == Operator::Equal)).into())
            }
            (Value::Boolean(_), _) => Err(unsupported()),
            (Value::Text(text), Operator::Equal | Operator::NotEqual) => {
                let equal = text_equals(text, literal);
                Ok((equal == (predicate.operator == Operator::Equal)).into())
            }
            (Value::Number(n), Operator::Equal | Operator::NotEqual) => {
                // A number never equals a non-numeric literal.
                let equal = literal.trim().parse::<f64>().map_or(false, |l| l == *n);
                Ok((equal == (predicate.operator == Operator::Equal)).into())
            }
            (value, operator) => {
                let bound = literal
                    .trim()
                    .parse::<f64>()
                    .map_err(|_| invalid_literal())?;
                let Some(n) = value.as_number() else {
                    return Ok(TriBool::Unknown);
                };
                Ok(compare(operator, n, bound).into())
            }
        }
    }

    fn eval_simple_set(&self, predicate: &SimpleSetPredicate, row: &Row) -> TriBool {
        let value = lookup(row, &predicate.field);
        if matches!(value, Value::Absent) {
            return TriBool::Unknown;
        }
        // Membership is exact, unlike simple equality.
        let member = predicate
            .array
            .iter()
            .any(|literal| value.matches_literal(literal));
        match predicate.boolean_operator {
            SetOperator::IsIn => member.into(),
            SetOperator::IsNotIn => (!member).into(),
        }
    }

    fn eval_compound(&self, predicate: &CompoundPredicate, row: &Row) -> EvalResult<TriBool> {
        let children = &predicate.predicates;
        match predicate.boolean_operator {
            BooleanOperator::And => self.eval_and(children, row),
            BooleanOperator::Or => {
                let mut unknown = false;
                for child in children {
                    match self.eval_predicate(child, row)? {
                        TriBool::True => return Ok(TriBool::True),
                        TriBool::Unknown => unknown = true,
                        TriBool::False => {}
                    }
                }
                Ok(if unknown {
                    TriBool::Unknown
                } else {
                    TriBool::False
                })
            }
            BooleanOperator::Xor => {
                // Unknown children count as not-true.
                let mut odd = false;
                for child in children {
                    if self.eval_predicate(child, row)?.is_true() {
                        odd = !odd;
                    }
                }
                Ok(odd.into())
            }
            BooleanOperator::Surrogate => {
                for child in children {
                    let result = self.eval_predicate(child, row)?;
                    if !result.is_unknown() {
                        return Ok(result);
                    }
                }
                Ok(TriBool::Unknown)
            }
        }
    }

    fn eval_and(&self, children: &[Predicate], row: &Row) -> EvalResult<TriBool> {
        let mut unknown = false;
        for child in children {
            match self.eval_predicate(child, row)? {
                TriBool::False => return Ok(TriBool::False),
                TriBool::Unknown => unknown = true,
                TriBool::True => {}
            }
        }
        Ok(if unknown {
            TriBool::Unknown
        } else {
            TriBool::True
        })
    }
}

fn compare(operator: Operator, value: f64, bound: f64) -> bool {
    let ordering = value.partial_cmp(&bound);
    match operator {
        Operator::LessThan => ordering == Some(Ordering::Less),
        Operator::LessOrEqual => matches!(ordering, Some(Ordering::Less | Ordering::Equal)),
        Operator::GreaterThan => ordering == Some(Ordering::Greater),
        Operator::GreaterOrEqual => matches!(ordering, Some(Ordering::Greater | Ordering::Equal)),
        Operator::Equal => ordering == Some(Ordering::Equal),
        Operator::NotEqual => ordering != Some(Ordering::Equal),
        _ => false,
    }
}

// 文字列比較は大文字小文字を区別しない
fn text_equals(text: &str, literal: &str) -> bool {
    text.eq_ignore_ascii_case(literal)
        || matches!(
            (text.trim().parse::<f64>(), literal.trim().parse::<f64>()),
            (Ok(a), Ok(b)) if a == b
        )
}
