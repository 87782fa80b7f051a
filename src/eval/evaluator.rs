use std::borrow::Cow;

use thiserror::Error;
use tracing::debug;

use crate::ast::{DataType, MiningSchema, ModelElement, MissingValueStrategy, MultipleModelMethod};
use crate::value::{Outputs, Row, Value};

use super::{
    expression::ExpressionEvaluator, predicate::PredicateEvaluator,
    regression::RegressionEvaluator, tree::TreeEvaluator,
};

/// Coarse classification of evaluation failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum ErrorKind {
    /// The model itself is malformed or uses unsupported features.
    Structural,
    /// An operand could not be coerced to the type an operation needs.
    Value,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("terminal node without score, node id: {node_id}")]
    TerminalNodeWithoutScore { node_id: String },
    #[error("node {node_id} has no default child")]
    MissingDefaultChild { node_id: String },
    #[error("node {node_id} names default child {child_id}, which is not one of its children")]
    InvalidDefaultChild { node_id: String, child_id: String },
    #[error("operator {operator} is not supported for {value_type} values")]
    UnsupportedOperator {
        operator: String,
        value_type: &'static str,
    },
    #[error("invalid literal for {field}: {literal:?}")]
    InvalidLiteral { field: String, literal: String },
    #[error("function {function} expects {expected} arguments, got {actual}")]
    InvalidArity {
        function: String,
        expected: usize,
        actual: usize,
    },
    #[error("missing value strategy {0} is not supported")]
    UnsupportedStrategy(MissingValueStrategy),
    #[error("multiple model method {0} is not supported")]
    UnsupportedCombination(MultipleModelMethod),
    #[error("malformed model: {0}")]
    MalformedModel(String),
    #[error("cannot coerce {value} to {data_type}")]
    Coercion { value: String, data_type: DataType },
    // 文脈付きのエラー
    #[error("segment {id}: {source}")]
    Segment {
        id: String,
        #[source]
        source: Box<EvalError>,
    },
    #[error("model {name}: {source}")]
    Model {
        name: String,
        #[source]
        source: Box<EvalError>,
    },
    #[error("derived field {name}: {source}")]
    DerivedField {
        name: String,
        #[source]
        source: Box<EvalError>,
    },
}

pub type EvalResult<T> = Result<T, EvalError>;

impl EvalError {
    pub fn coercion(value: &Value, data_type: DataType) -> Self {
        EvalError::Coercion {
            value: format!("{} {:?}", value.type_name(), value.to_string()),
            data_type,
        }
    }

    pub fn malformed<S: Into<String>>(message: S) -> Self {
        EvalError::MalformedModel(message.into())
    }

    /// Kind of the innermost error; context wrappers are transparent.
    pub fn kind(&self) -> ErrorKind {
        match self {
            EvalError::Coercion { .. } => ErrorKind::Value,
            EvalError::Segment { source, .. }
            | EvalError::Model { source, .. }
            | EvalError::DerivedField { source, .. } => source.kind(),
            _ => ErrorKind::Structural,
        }
    }

    /// The innermost error with all context stripped.
    pub fn root_cause(&self) -> &EvalError {
        match self {
            EvalError::Segment { source, .. }
            | EvalError::Model { source, .. }
            | EvalError::DerivedField { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

/// Scores any [`ModelElement`] against a row.
///
/// Tree and regression models are delegated to their component evaluators;
/// mining models are handled in `mining.rs` and `segmentation.rs`, which
/// recurse back into [`Evaluator::eval_model`] for every segment.
#[derive(Default)]
pub struct Evaluator {
    pub(super) predicate_evaluator: PredicateEvaluator,
    pub(super) expression_evaluator: ExpressionEvaluator,
    tree_evaluator: TreeEvaluator,
    regression_evaluator: RegressionEvaluator,
}

impl Evaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Top level entry point. `Ok(None)` means the model produced no
    /// prediction for this row, which is not an error.
    #[tracing::instrument(skip_all, fields(model = model.kind()), level = "debug")]
    pub fn eval_model(&self, model: &ModelElement, row: &Row) -> EvalResult<Option<Outputs>> {
        let row = replace_missing_values(model.mining_schema(), row);
        let result = match model {
            ModelElement::Tree(tree) => self.tree_evaluator.eval_tree(tree, &row),
            ModelElement::Regression(regression) => {
                self.regression_evaluator.eval_regression(regression, &row)
            }
            ModelElement::Mining(mining) => self.eval_mining(mining, &row),
        };

        result.map_err(|err| match model.model_name() {
            Some(name) => EvalError::Model {
                name: name.to_string(),
                source: Box::new(err),
            },
            None => err,
        })
    }
}

/// Fills absent mining fields that declare a `missingValueReplacement`.
/// The caller's row is only copied when something is filled in.
pub(crate) fn replace_missing_values<'a>(schema: &MiningSchema, row: &'a Row) -> Cow<'a, Row> {
    let mut row = Cow::Borrowed(row);
    for field in &schema.mining_fields {
        let Some(replacement) = field.missing_value_replacement.as_deref() else {
            continue;
        };
        if row.get(&field.name).map_or(true, Value::is_missing) {
            debug!(field = %field.name, replacement, "replacing missing value");
            row.to_mut()
                .insert(field.name.clone(), Value::from_literal(replacement));
        }
    }
    row
}
