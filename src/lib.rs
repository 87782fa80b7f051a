//! # pmml-eval
//!
//! An evaluation engine for predictive models described in PMML: decision
//! trees, regression models and mining-model ensembles that nest them.
//!
//! ## Architecture
//!
//! * **Model tree** ([`ast`]): typed, immutable representation of a model
//!   definition. Loaded with serde from a JSON document whose element and
//!   attribute names mirror PMML. All PMML vocabulary is closed enums.
//! * **Values** ([`value`]): a feature row maps field names to
//!   [`Value`]s (`Number`, `Text`, `Boolean` or `Absent`) with total,
//!   fallible coercions.
//! * **Evaluation** ([`eval`]): one component per model part, composed by
//!   [`Evaluator`]. Missing data is handled in-band; only malformed models
//!   and uncoercible values are errors.
//! * **Engine** ([`engine`]): owns a loaded model and evaluates batches of
//!   rows in parallel with rayon.
//!
//! ## Example
//!
//! ```no_run
//! use pmml_eval::{Engine, EngineConfig, Row, Value};
//!
//! let engine = Engine::from_file("model.json", EngineConfig::default())?;
//! let row = Row::from([("petal_length".to_string(), Value::Number(2.5))]);
//! if let Some(outputs) = engine.evaluate(&row)? {
//!     println!("{}", outputs[engine.output_name()]);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod ast;
pub mod config;
pub mod engine;
pub mod error;
pub mod eval;
pub mod value;

// Re-exports
pub use ast::{ModelDocument, ModelElement};
pub use config::EngineConfig;
pub use engine::{Engine, Parallelism};
pub use error::*;
pub use eval::{ErrorKind, EvalError, EvalResult, Evaluator, TriBool};
pub use value::{Outputs, Row, Value};

impl ModelElement {
    /// Scores `row` with a default [`Evaluator`].
    pub fn evaluate(&self, row: &Row) -> EvalResult<Option<Outputs>> {
        Evaluator::new().eval_model(self, row)
    }
}

impl ast::Predicate {
    pub fn evaluate(&self, row: &Row) -> EvalResult<TriBool> {
        eval::predicate::PredicateEvaluator::new().eval_predicate(self, row)
    }
}

impl ast::Expression {
    pub fn evaluate(&self, row: &Row) -> EvalResult<Value> {
        eval::expression::ExpressionEvaluator::new().eval_expression(self, row)
    }
}
