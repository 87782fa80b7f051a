//! PMML Evaluation System
//!
//! Scores a feature row against a typed model tree. Evaluation is a pure,
//! synchronous walk: the model is never mutated, and every intermediate row
//! is owned by the evaluation that created it.
//!
//! # Core Components
//!
//! ## Evaluator
//! The entry point. Dispatches a `ModelElement` to the matching component
//! and recurses into nested models for ensembles.
//!
//! ## Predicate Evaluator
//! Three-valued (`True`/`False`/`Unknown`) evaluation of node and segment
//! guards.
//!
//! ## Tree Evaluator
//! Descends a decision tree, applying the model's missing-value and
//! no-true-child strategies, and builds outputs from the terminal node.
//!
//! ## Regression Evaluator
//! Scores regression tables and applies softmax/logit normalisation.
//!
//! ## Expression Evaluator
//! Computes derived fields for a mining model's local transformations.
//!
//! ## Segmentation and Mining
//! Combine segment results (`selectFirst`, `majorityVote`, `average`,
//! `weightedAverage`, `sum`, `modelChain`) and post-process the combined
//! outputs.
//!
//! # Missing data
//!
//! Absent data is never an error. It surfaces as `TriBool::Unknown`,
//! `Value::Absent` or `Ok(None)` ("no prediction") and each component
//! handles it by its documented policy. Errors are reserved for malformed
//! models and values that cannot be coerced.

pub mod evaluator;
pub mod expression;
mod mining;
pub mod output;
pub mod predicate;
pub mod regression;
mod segmentation;
pub mod tree;

pub use evaluator::{ErrorKind, EvalError, EvalResult, Evaluator};
pub use predicate::TriBool;
