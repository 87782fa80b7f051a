use tracing::{debug, trace};

use crate::ast::{MiningModel, MultipleModelMethod, Segment, Target};
use crate::value::{Outputs, Row, Value};

use super::evaluator::{EvalError, EvalResult, Evaluator};

impl Evaluator {
    /// Combines the segments of a mining model according to its
    /// `multipleModelMethod`. Segments whose guard is not satisfied abstain.
    pub fn eval_segmentation(&self, model: &MiningModel, row: &Row) -> EvalResult<Option<Outputs>> {
        let segmentation = &model.segmentation;
        let output_name = model.output_field_name();
        let result = match segmentation.multiple_model_method {
            MultipleModelMethod::SelectFirst => self.select_first(&segmentation.segments, row)?,
            MultipleModelMethod::MajorityVote => {
                self.majority_vote(&segmentation.segments, row, output_name)?
            }
            MultipleModelMethod::Average => {
                self.average(&segmentation.segments, row, output_name, false)?
            }
            MultipleModelMethod::WeightedAverage => {
                self.average(&segmentation.segments, row, output_name, true)?
            }
            MultipleModelMethod::Sum => {
                let target = model.targets.first().cloned().unwrap_or_default();
                self.sum(&segmentation.segments, row, output_name, &target)?
            }
            MultipleModelMethod::ModelChain => self.model_chain(&segmentation.segments, row)?,
            method @ (MultipleModelMethod::WeightedMajorityVote
            | MultipleModelMethod::Median
            | MultipleModelMethod::Max
            | MultipleModelMethod::SelectAll) => {
                return Err(EvalError::UnsupportedCombination(method))
            }
        };
        debug!(
            method = %segmentation.multiple_model_method,
            produced = result.is_some(),
            "segmentation combined"
        );
        Ok(result)
    }

    /// Scores one segment. `Ok(None)` when the guard is not `True` or the
    /// segment's model makes no prediction.
    pub fn eval_segment(&self, segment: &Segment, row: &Row) -> EvalResult<Option<Outputs>> {
        let with_context = |err| EvalError::Segment {
            id: segment_label(segment),
            source: Box::new(err),
        };
        let guard = self
            .predicate_evaluator
            .eval_all(&segment.predicates, row)
            .map_err(with_context)?;
        if !guard.is_true() {
            trace!(segment = %segment_label(segment), ?guard, "segment abstains");
            return Ok(None);
        }
        self.eval_model(&segment.model, row).map_err(with_context)
    }

    fn select_first(&self, segments: &[Segment], row: &Row) -> EvalResult<Option<Outputs>> {
        for segment in segments {
            if let Some(outputs) = self.eval_segment(segment, row)? {
                debug!(segment = %segment_label(segment), "selected");
                return Ok(Some(outputs));
            }
        }
        Ok(None)
    }

    fn majority_vote(
        &self,
        segments: &[Segment],
        row: &Row,
        output_name: &str,
    ) -> EvalResult<Option<Outputs>> {
        // (category, votes) in first-seen order
        let mut votes: Vec<(String, f64)> = Vec::new();
        for segment in segments {
            let Some(outputs) = self.eval_segment(segment, row)? else {
                continue;
            };
            let Some(prediction) = outputs
                .get(segment.model.primary_output_name())
                .filter(|v| !v.is_missing())
            else {
                continue;
            };
            let category = prediction.to_string();
            match votes.iter_mut().find(|(c, _)| *c == category) {
                Some((_, count)) => *count += 1.0,
                None => votes.push((category, 1.0)),
            }
        }

        let mut winner: Option<&(String, f64)> = None;
        for entry in &votes {
            if winner.map_or(true, |(_, best)| entry.1 > *best) {
                winner = Some(entry);
            }
        }
        let Some((category, _)) = winner else {
            return Ok(None);
        };

        let mut outputs = Outputs::new();
        outputs.insert(output_name.to_string(), Value::from(category.as_str()));
        for (category, count) in &votes {
            outputs.insert(category.clone(), Value::Number(*count));
        }
        Ok(Some(outputs))
    }

    /// `average` divides the summed predictions by the number of segments,
    /// abstaining ones included. `weightedAverage` is the plain weighted
    /// sum; weights are not normalised.
    fn average(
        &self,
        segments: &[Segment],
        row: &Row,
        output_name: &str,
        weighted: bool,
    ) -> EvalResult<Option<Outputs>> {
        let mut total = 0.0;
        let mut contributed = false;
        for segment in segments {
            let Some(value) = self.numeric_prediction(segment, row)? else {
                continue;
            };
            let weight = if weighted { segment.weight } else { 1.0 };
            total += weight * value;
            contributed = true;
        }
        if !contributed {
            return Ok(None);
        }
        let combined = if weighted {
            total
        } else {
            total / segments.len() as f64
        };
        Ok(Some(Outputs::from([(
            output_name.to_string(),
            Value::Number(combined),
        )])))
    }

    fn sum(
        &self,
        segments: &[Segment],
        row: &Row,
        output_name: &str,
        target: &Target,
    ) -> EvalResult<Option<Outputs>> {
        let mut total = 0.0;
        let mut contributed = false;
        for segment in segments {
            if let Some(value) = self.numeric_prediction(segment, row)? {
                total += value;
                contributed = true;
            }
        }
        if !contributed {
            return Ok(None);
        }

        total += target.rescale_constant;
        if target.rescale_factor != 0.0 {
            total *= target.rescale_factor;
        }
        Ok(Some(Outputs::from([(
            output_name.to_string(),
            Value::Number(total),
        )])))
    }

    /// Runs segments in order over a private copy of the row; every output
    /// becomes an input of the segments after it.
    fn model_chain(&self, segments: &[Segment], row: &Row) -> EvalResult<Option<Outputs>> {
        let mut working = row.clone();
        let mut accumulated = Outputs::new();
        for segment in segments {
            let Some(outputs) = self.eval_segment(segment, &working)? else {
                continue;
            };
            for (name, value) in outputs {
                working.insert(name.clone(), value.clone());
                accumulated.insert(name, value);
            }
        }
        Ok(if accumulated.is_empty() {
            None
        } else {
            Some(accumulated)
        })
    }

    fn numeric_prediction(&self, segment: &Segment, row: &Row) -> EvalResult<Option<f64>> {
        let Some(outputs) = self.eval_segment(segment, row)? else {
            return Ok(None);
        };
        match outputs.get(segment.model.primary_output_name()) {
            None | Some(Value::Absent) => Ok(None),
            Some(value) => value
                .to_number()
                .map(Some)
                .map_err(|err| EvalError::Segment {
                    id: segment_label(segment),
                    source: Box::new(err),
                }),
        }
    }
}

fn segment_label(segment: &Segment) -> String {
    segment
        .id
        .clone()
        .unwrap_or_else(|| "<unnamed>".to_string())
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::ast::{
        MiningFunction, MiningSchema, ModelElement, Node, NoTrueChildStrategy,
        MissingValueStrategy, Operator, Predicate, RegressionModel, RegressionTable,
        NormalizationMethod, NumericPredictor, Predictor, Segmentation, SimplePredicate,
        TreeModel, MiningField, UsageType,
    };

    fn schema(target: &str) -> MiningSchema {
        MiningSchema {
            mining_fields: vec![MiningField {
                name: target.to_string(),
                usage_type: UsageType::Target,
                optype: None,
                missing_value_replacement: None,
            }],
        }
    }

    fn constant_tree(target: &str, score: &str, function_name: MiningFunction) -> ModelElement {
        ModelElement::Tree(TreeModel {
            model_name: None,
            function_name,
            mining_schema: schema(target),
            output: None,
            missing_value_strategy: MissingValueStrategy::None,
            no_true_child_strategy: NoTrueChildStrategy::ReturnLastPrediction,
            node: Node {
                id: Some("root".to_string()),
                score: Some(score.to_string()),
                record_count: None,
                default_child: None,
                predicate: Predicate::True,
                score_distributions: vec![],
                children: vec![],
            },
        })
    }

    fn linear(target: &str, input: &str, coefficient: f64) -> ModelElement {
        ModelElement::Regression(RegressionModel {
            model_name: None,
            function_name: MiningFunction::Regression,
            normalization_method: NormalizationMethod::None,
            target_field_name: Some(target.to_string()),
            mining_schema: MiningSchema::default(),
            output: None,
            regression_tables: vec![RegressionTable {
                intercept: 0.0,
                target_category: None,
                predictors: vec![Predictor::Numeric(NumericPredictor {
                    name: input.to_string(),
                    exponent: 1,
                    coefficient,
                })],
            }],
        })
    }

    fn segment(id: &str, weight: f64, predicates: Vec<Predicate>, model: ModelElement) -> Segment {
        Segment {
            id: Some(id.to_string()),
            weight,
            predicates,
            model,
        }
    }

    fn mining(
        target: &str,
        method: MultipleModelMethod,
        segments: Vec<Segment>,
        targets: Vec<Target>,
    ) -> MiningModel {
        MiningModel {
            model_name: None,
            function_name: MiningFunction::Regression,
            mining_schema: schema(target),
            output: None,
            local_transformations: vec![],
            targets,
            segmentation: Segmentation {
                multiple_model_method: method,
                segments,
            },
        }
    }

    fn day_before(limit: &str) -> Predicate {
        Predicate::Simple(SimplePredicate {
            field: "day".to_string(),
            operator: Operator::LessThan,
            value: Some(limit.to_string()),
        })
    }

    fn row(pairs: &[(&str, f64)]) -> Row {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), Value::Number(*v)))
            .collect()
    }

    #[test]
    fn test_select_first_skips_inactive() {
        let model = mining(
            "y",
            MultipleModelMethod::SelectFirst,
            vec![
                segment("early", 1.0, vec![day_before("10")], constant_tree("y", "a", MiningFunction::Classification)),
                segment("any", 1.0, vec![], constant_tree("y", "b", MiningFunction::Classification)),
            ],
            vec![],
        );
        let evaluator = Evaluator::new();
        let out = evaluator.eval_segmentation(&model, &row(&[("day", 3.0)])).unwrap().unwrap();
        assert_eq!(out["y"], Value::from("a"));
        let out = evaluator.eval_segmentation(&model, &row(&[("day", 30.0)])).unwrap().unwrap();
        assert_eq!(out["y"], Value::from("b"));
        // unknown guard abstains too
        let out = evaluator.eval_segmentation(&model, &Row::new()).unwrap().unwrap();
        assert_eq!(out["y"], Value::from("b"));
    }

    #[test]
    fn test_majority_vote_ties_go_to_first_seen() {
        let model = mining(
            "y",
            MultipleModelMethod::MajorityVote,
            vec![
                segment("1", 1.0, vec![], constant_tree("y", "b", MiningFunction::Classification)),
                segment("2", 1.0, vec![], constant_tree("y", "a", MiningFunction::Classification)),
                segment("3", 1.0, vec![], constant_tree("y", "a", MiningFunction::Classification)),
                segment("4", 1.0, vec![], constant_tree("y", "b", MiningFunction::Classification)),
            ],
            vec![],
        );
        let out = Evaluator::new().eval_segmentation(&model, &Row::new()).unwrap().unwrap();
        assert_eq!(
            out,
            Outputs::from([
                ("y".to_string(), Value::from("b")),
                ("a".to_string(), Value::Number(2.0)),
                ("b".to_string(), Value::Number(2.0)),
            ])
        );
    }

    #[test]
    fn test_average_and_weighted_average() {
        let segments = vec![
            segment("1", 3.0, vec![], constant_tree("y", "2", MiningFunction::Regression)),
            segment("2", 1.0, vec![], constant_tree("y", "6", MiningFunction::Regression)),
            segment("3", 1.0, vec![day_before("0")], constant_tree("y", "100", MiningFunction::Regression)),
        ];
        let evaluator = Evaluator::new();
        let r = row(&[("day", 5.0)]);

        // the inactive segment still counts towards the divisor
        let model = mining("y", MultipleModelMethod::Average, segments.clone(), vec![]);
        let out = evaluator.eval_segmentation(&model, &r).unwrap().unwrap();
        assert_relative_eq!(out["y"].as_number().unwrap(), 8.0 / 3.0);

        // weights sum to 4 and are not divided out
        let model = mining("y", MultipleModelMethod::WeightedAverage, segments.clone(), vec![]);
        let out = evaluator.eval_segmentation(&model, &r).unwrap().unwrap();
        assert_relative_eq!(out["y"].as_number().unwrap(), 12.0);

        let model = mining("y", MultipleModelMethod::WeightedAverage, segments[2..].to_vec(), vec![]);
        assert_eq!(evaluator.eval_segmentation(&model, &r).unwrap(), None);
    }

    #[test]
    fn test_sum_with_rescaling() {
        let segments = vec![
            segment("1", 1.0, vec![], constant_tree("y", "1.5", MiningFunction::Regression)),
            segment("2", 1.0, vec![], constant_tree("y", "2.5", MiningFunction::Regression)),
        ];
        let target = Target {
            field: Some("y".to_string()),
            rescale_constant: 1.0,
            rescale_factor: 2.0,
        };
        let model = mining("y", MultipleModelMethod::Sum, segments.clone(), vec![target]);
        let out = Evaluator::new().eval_segmentation(&model, &Row::new()).unwrap().unwrap();
        assert_relative_eq!(out["y"].as_number().unwrap(), 10.0);

        let target = Target {
            rescale_factor: 0.0,
            ..Target::default()
        };
        let model = mining("y", MultipleModelMethod::Sum, segments, vec![target]);
        let out = Evaluator::new().eval_segmentation(&model, &Row::new()).unwrap().unwrap();
        assert_relative_eq!(out["y"].as_number().unwrap(), 4.0);
    }

    #[test]
    fn test_model_chain_feeds_outputs_forward() {
        let model = mining(
            "z",
            MultipleModelMethod::ModelChain,
            vec![
                segment("1", 1.0, vec![], linear("y", "x", 2.0)),
                segment("2", 1.0, vec![], linear("z", "y", 10.0)),
            ],
            vec![],
        );
        let input = row(&[("x", 3.0)]);
        let out = Evaluator::new().eval_segmentation(&model, &input).unwrap().unwrap();
        assert_relative_eq!(out["y"].as_number().unwrap(), 6.0);
        assert_relative_eq!(out["z"].as_number().unwrap(), 60.0);
        assert!(!input.contains_key("y"));
    }

    #[test]
    fn test_unsupported_methods_error() {
        for method in [
            MultipleModelMethod::WeightedMajorityVote,
            MultipleModelMethod::Median,
            MultipleModelMethod::Max,
            MultipleModelMethod::SelectAll,
        ] {
            let model = mining("y", method, vec![], vec![]);
            let err = Evaluator::new().eval_segmentation(&model, &Row::new()).unwrap_err();
            assert_eq!(err, EvalError::UnsupportedCombination(method));
        }
    }

    #[test]
    fn test_segment_errors_carry_segment_id() {
        let model = mining(
            "y",
            MultipleModelMethod::Average,
            vec![segment("broken", 1.0, vec![], linear("y", "x", 1.0))],
            vec![],
        );
        let mut input = Row::new();
        input.insert("x".to_string(), Value::from("not a number"));
        let err = Evaluator::new().eval_segmentation(&model, &input).unwrap_err();
        assert!(matches!(err, EvalError::Segment { ref id, .. } if id == "broken"));
        assert_eq!(err.kind(), crate::eval::ErrorKind::Value);
    }
}
