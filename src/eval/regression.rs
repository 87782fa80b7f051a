use tracing::debug;

use crate::ast::{
    MiningFunction, NormalizationMethod, Predictor, RegressionModel, RegressionTable,
};
use crate::value::{lookup, Outputs, Row, Value};

use super::{
    evaluator::{EvalError, EvalResult},
    output,
};

/// Scores regression tables and turns them into model outputs.
#[derive(Default)]
pub struct RegressionEvaluator;

impl RegressionEvaluator {
    pub fn new() -> Self {
        Self
    }

    pub fn eval_regression(
        &self,
        model: &RegressionModel,
        row: &Row,
    ) -> EvalResult<Option<Outputs>> {
        let outputs = match model.function_name {
            MiningFunction::Regression => self.eval_numeric(model, row)?,
            MiningFunction::Classification => self.eval_classification(model, row)?,
        };
        Ok(Some(outputs))
    }

    /// Intercept plus the contribution of every predictor.
    pub fn eval_table(&self, table: &RegressionTable, row: &Row) -> EvalResult<f64> {
        let mut total = table.intercept;
        for predictor in &table.predictors {
            total += self.eval_predictor(predictor, row)?;
        }
        Ok(total)
    }

    fn eval_predictor(&self, predictor: &Predictor, row: &Row) -> EvalResult<f64> {
        match predictor {
            Predictor::Numeric(numeric) => {
                let value = lookup(row, &numeric.name);
                if value.is_missing() {
                    return Ok(0.0);
                }
                Ok(numeric.coefficient * value.to_number()?.powi(numeric.exponent))
            }
            Predictor::Categorical(categorical) => {
                let matched = lookup(row, &categorical.name).matches_literal(&categorical.value);
                Ok(if matched { categorical.coefficient } else { 0.0 })
            }
            Predictor::Term(term) => {
                // A term with any missing factor contributes nothing.
                let mut product = 1.0;
                for field_ref in &term.field_refs {
                    let value = match (lookup(row, &field_ref.field), &field_ref.map_missing_to) {
                        (v, Some(replacement)) if v.is_missing() => Value::from_literal(replacement),
                        (v, _) => v.clone(),
                    };
                    if value.is_missing() {
                        return Ok(0.0);
                    }
                    product *= value.to_number()?;
                }
                Ok(term.coefficient * product)
            }
        }
    }

    fn eval_numeric(&self, model: &RegressionModel, row: &Row) -> EvalResult<Outputs> {
        let [table] = model.regression_tables.as_slice() else {
            return Err(EvalError::malformed(format!(
                "regression model needs exactly one table, found {}",
                model.regression_tables.len()
            )));
        };
        let predicted = Value::Number(self.eval_table(table, row)?);
        debug!(%predicted, "regression score");

        let mut outputs = Outputs::new();
        output::fill_predicted_values(model.output.as_ref(), &predicted, &mut outputs);
        outputs.insert(model.output_field_name().to_string(), predicted);
        Ok(outputs)
    }

    fn eval_classification(&self, model: &RegressionModel, row: &Row) -> EvalResult<Outputs> {
        if model.regression_tables.is_empty() {
            return Err(EvalError::malformed("classification model has no tables"));
        }

        let mut categories = Vec::with_capacity(model.regression_tables.len());
        let mut scores = Vec::with_capacity(model.regression_tables.len());
        for table in &model.regression_tables {
            let category = table.target_category.as_deref().ok_or_else(|| {
                EvalError::malformed("classification table without targetCategory")
            })?;
            categories.push(category);
            scores.push(self.eval_table(table, row)?);
        }

        // Winner is picked on raw scores; ties keep the earliest table.
        let mut winner = 0;
        for (i, score) in scores.iter().enumerate() {
            if *score > scores[winner] {
                winner = i;
            }
        }

        normalize(model.normalization_method, &mut scores);
        debug!(winner = categories[winner], ?scores, "regression classification");

        let mut outputs = Outputs::new();
        for (category, score) in categories.iter().zip(&scores) {
            outputs.insert(category.to_string(), Value::Number(*score));
        }
        if let Some(output) = model.output.as_ref() {
            for field in output.probability_fields() {
                if let Some(i) = field
                    .value
                    .as_deref()
                    .and_then(|v| categories.iter().position(|c| *c == v))
                {
                    outputs.insert(field.name.clone(), Value::Number(scores[i]));
                }
            }
        }

        let predicted = Value::from(categories[winner]);
        output::fill_predicted_values(model.output.as_ref(), &predicted, &mut outputs);
        outputs.insert(model.output_field_name().to_string(), predicted);
        Ok(outputs)
    }
}

/// Applies the model's normalisation to the score vector in place.
pub fn normalize(method: NormalizationMethod, scores: &mut [f64]) {
    match method {
        NormalizationMethod::None => {}
        NormalizationMethod::Softmax => {
            let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let mut sum = 0.0;
            for score in scores.iter_mut() {
                *score = (*score - max).exp();
                sum += *score;
            }
            for score in scores.iter_mut() {
                *score /= sum;
            }
        }
        NormalizationMethod::Logit => {
            for score in scores.iter_mut() {
                *score = (*score / (1.0 - *score)).ln();
            }
        }
    }
}
