//! Output construction shared by the model evaluators.

use crate::ast::{DataType, MiningFunction, Node, Output, TreeModel};
use crate::value::{Outputs, Value};

use super::evaluator::{EvalError, EvalResult};

/// Builds the outputs of a tree's terminal node: the score under the target
/// field, the normalised score distribution, and any `predictedValue`
/// output fields.
pub fn tree_outputs(tree: &TreeModel, node: &Node, score: &str) -> EvalResult<Outputs> {
    let mut outputs = Outputs::new();
    let predicted = match tree.function_name {
        MiningFunction::Regression => score
            .trim()
            .parse::<f64>()
            .map(Value::Number)
            .map_err(|_| EvalError::coercion(&Value::from(score), DataType::Double))?,
        MiningFunction::Classification => Value::from(score),
    };

    let total: f64 = node.score_distributions.iter().map(|d| d.record_count).sum();
    if total > 0.0 {
        for distribution in &node.score_distributions {
            let name = tree
                .output
                .as_ref()
                .and_then(|o| o.field_for_value(&distribution.value))
                .map_or(distribution.value.as_str(), |f| f.name.as_str());
            outputs.insert(
                name.to_string(),
                Value::Number(distribution.record_count / total),
            );
        }
    }

    fill_predicted_values(tree.output.as_ref(), &predicted, &mut outputs);
    outputs.insert(tree.output_field_name().to_string(), predicted);
    Ok(outputs)
}

/// Copies the prediction into every `predictedValue` output field that has no
/// explicit `targetField`, or whose target is already present in `outputs`.
pub fn fill_predicted_values(output: Option<&Output>, predicted: &Value, outputs: &mut Outputs) {
    let Some(output) = output else {
        return;
    };
    for field in output.predicted_value_fields() {
        let value = field
            .target_field
            .as_ref()
            .and_then(|target| outputs.get(target))
            .unwrap_or(predicted)
            .clone();
        outputs.insert(field.name.clone(), value);
    }
}

/// Post-processing of a mining model's combined result.
///
/// Keys that match an output field's `value` are renamed to the field's
/// name. Continuous fields renamed this way add up to a total that every
/// `probability` field is then divided by. Finally the `predictedValue`
/// fields are filled from the primary output.
pub fn mining_outputs(output: Option<&Output>, primary: &str, mut results: Outputs) -> Outputs {
    let Some(output) = output else {
        return results;
    };

    let mut total = 0.0;
    for field in &output.output_fields {
        let Some(key) = field.value.as_deref() else {
            continue;
        };
        let Some(value) = results.remove(key) else {
            continue;
        };
        if field.is_continuous() {
            total += value.as_number().unwrap_or(0.0);
        }
        results.insert(field.name.clone(), value);
    }

    for field in output.probability_fields() {
        let value = results
            .get(&field.name)
            .and_then(Value::as_number)
            .unwrap_or(0.0);
        let normalised = if total > 0.0 { value / total } else { value };
        results.insert(field.name.clone(), Value::Number(normalised));
    }

    if let Some(predicted) = results.get(primary).cloned() {
        fill_predicted_values(Some(output), &predicted, &mut results);
    }
    results
}
