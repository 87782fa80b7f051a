//! Typed PMML model tree.
//!
//! These types are the in-memory form of a model definition. They are built
//! once by a loader (serde, from a JSON document whose element and attribute
//! names mirror PMML) and are read-only during evaluation. Every piece of
//! vocabulary that PMML spells as a string is a closed enum here, so the
//! evaluators match on variants and never on raw strings.

use serde::{Deserialize, Deserializer, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::value::Value;

/// Output name used when a model declares neither `targetFieldName` nor a
/// target mining field.
pub const DEFAULT_TARGET_FIELD: &str = "predicted";

// ドキュメントのルート
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelDocument {
    #[serde(default)]
    pub header: Option<Header>,
    pub model: ModelElement,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Header {
    #[serde(default)]
    pub copyright: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Any scorable model. A segment may hold any of these, including another
/// mining model, so ensembles nest arbitrarily.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub enum ModelElement {
    #[serde(rename = "TreeModel")]
    Tree(TreeModel),
    #[serde(rename = "RegressionModel")]
    Regression(RegressionModel),
    #[serde(rename = "MiningModel")]
    Mining(Box<MiningModel>),
}

impl ModelElement {
    /// Name of the output field that carries this model's prediction.
    pub fn primary_output_name(&self) -> &str {
        match self {
            ModelElement::Tree(tree) => tree.output_field_name(),
            ModelElement::Regression(regression) => regression.output_field_name(),
            ModelElement::Mining(mining) => mining.output_field_name(),
        }
    }

    pub fn model_name(&self) -> Option<&str> {
        match self {
            ModelElement::Tree(tree) => tree.model_name.as_deref(),
            ModelElement::Regression(regression) => regression.model_name.as_deref(),
            ModelElement::Mining(mining) => mining.model_name.as_deref(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ModelElement::Tree(_) => "TreeModel",
            ModelElement::Regression(_) => "RegressionModel",
            ModelElement::Mining(_) => "MiningModel",
        }
    }

    pub fn mining_schema(&self) -> &MiningSchema {
        match self {
            ModelElement::Tree(tree) => &tree.mining_schema,
            ModelElement::Regression(regression) => &regression.mining_schema,
            ModelElement::Mining(mining) => &mining.mining_schema,
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, EnumString, Display, AsRefStr,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum MiningFunction {
    #[default]
    Classification,
    Regression,
}

// ---------------------------------------------------------------------------
// MiningSchema / Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MiningSchema {
    #[serde(default)]
    pub mining_fields: Vec<MiningField>,
}

impl MiningSchema {
    /// First field used as the target (`target`, or the deprecated `predicted`).
    pub fn target_field(&self) -> Option<&str> {
        self.mining_fields
            .iter()
            .find(|f| matches!(f.usage_type, UsageType::Target | UsageType::Predicted))
            .map(|f| f.name.as_str())
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MiningField {
    pub name: String,
    #[serde(default)]
    pub usage_type: UsageType,
    #[serde(default)]
    pub optype: Option<OpType>,
    #[serde(default, deserialize_with = "literal::option")]
    pub missing_value_replacement: Option<String>,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, EnumString, Display, AsRefStr,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum UsageType {
    #[default]
    Active,
    Predicted,
    Target,
    Supplementary,
    Group,
    Order,
    FrequencyWeight,
    AnalysisWeight,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, EnumString, Display, AsRefStr,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum OpType {
    Categorical,
    Ordinal,
    Continuous,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, EnumString, Display, AsRefStr,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum DataType {
    String,
    Integer,
    Float,
    Double,
    Boolean,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Output {
    #[serde(default)]
    pub output_fields: Vec<OutputField>,
}

impl Output {
    /// Output field declared for a category `value`.
    pub fn field_for_value(&self, value: &str) -> Option<&OutputField> {
        self.output_fields
            .iter()
            .find(|f| f.value.as_deref() == Some(value))
    }

    pub fn predicted_value_fields(&self) -> impl Iterator<Item = &OutputField> {
        self.output_fields.iter().filter(|f| {
            matches!(
                f.feature,
                ResultFeature::PredictedValue | ResultFeature::PredictedDisplayValue
            )
        })
    }

    pub fn probability_fields(&self) -> impl Iterator<Item = &OutputField> {
        self.output_fields
            .iter()
            .filter(|f| f.feature == ResultFeature::Probability)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputField {
    pub name: String,
    #[serde(default)]
    pub optype: Option<OpType>,
    #[serde(default)]
    pub data_type: Option<DataType>,
    #[serde(default)]
    pub feature: ResultFeature,
    #[serde(default, deserialize_with = "literal::option")]
    pub value: Option<String>,
    #[serde(default)]
    pub target_field: Option<String>,
    #[serde(default)]
    pub segment_id: Option<String>,
}

impl OutputField {
    /// Continuous or floating point fields take part in probability sums.
    pub fn is_continuous(&self) -> bool {
        self.optype == Some(OpType::Continuous)
            || matches!(self.data_type, Some(DataType::Double | DataType::Float))
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, EnumString, Display, AsRefStr,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum ResultFeature {
    #[default]
    PredictedValue,
    PredictedDisplayValue,
    Probability,
}

// ---------------------------------------------------------------------------
// Predicates
// ---------------------------------------------------------------------------

/// Boolean guard evaluated against a row with three-valued logic.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub enum Predicate {
    True,
    False,
    #[serde(rename = "SimplePredicate")]
    Simple(SimplePredicate),
    #[serde(rename = "SimpleSetPredicate")]
    SimpleSet(SimpleSetPredicate),
    #[serde(rename = "CompoundPredicate")]
    Compound(CompoundPredicate),
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimplePredicate {
    pub field: String,
    pub operator: Operator,
    #[serde(default, deserialize_with = "literal::option")]
    pub value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimpleSetPredicate {
    pub field: String,
    pub boolean_operator: SetOperator,
    #[serde(deserialize_with = "literal::list")]
    pub array: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompoundPredicate {
    pub boolean_operator: BooleanOperator,
    pub predicates: Vec<Predicate>,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, EnumString, Display, AsRefStr,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum Operator {
    Equal,
    NotEqual,
    LessThan,
    LessOrEqual,
    GreaterThan,
    GreaterOrEqual,
    IsIn,
    IsNotIn,
    IsMissing,
    IsNotMissing,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, EnumString, Display, AsRefStr,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum SetOperator {
    IsIn,
    IsNotIn,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, EnumString, Display, AsRefStr,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum BooleanOperator {
    And,
    Or,
    Xor,
    Surrogate,
}

// ---------------------------------------------------------------------------
// TreeModel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeModel {
    #[serde(default)]
    pub model_name: Option<String>,
    pub function_name: MiningFunction,
    #[serde(default)]
    pub mining_schema: MiningSchema,
    #[serde(default)]
    pub output: Option<Output>,
    #[serde(default)]
    pub missing_value_strategy: MissingValueStrategy,
    #[serde(default)]
    pub no_true_child_strategy: NoTrueChildStrategy,
    pub node: Node,
}

impl TreeModel {
    pub fn output_field_name(&self) -> &str {
        self.mining_schema
            .target_field()
            .unwrap_or(DEFAULT_TARGET_FIELD)
    }
}

/// A scored tree node. Children are owned, so the tree has no sharing and no
/// cycles; `default_child` may only name an immediate child.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    #[serde(default, deserialize_with = "literal::option")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "literal::option")]
    pub score: Option<String>,
    #[serde(default)]
    pub record_count: Option<f64>,
    #[serde(default, deserialize_with = "literal::option")]
    pub default_child: Option<String>,
    pub predicate: Predicate,
    #[serde(default)]
    pub score_distributions: Vec<ScoreDistribution>,
    #[serde(default, rename = "nodes")]
    pub children: Vec<Node>,
}

impl Node {
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Display id used in errors and logs.
    pub fn label(&self) -> &str {
        self.id.as_deref().unwrap_or("<unnamed>")
    }

    pub fn find_child(&self, id: &str) -> Option<&Node> {
        self.children
            .iter()
            .find(|child| child.id.as_deref() == Some(id))
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreDistribution {
    #[serde(deserialize_with = "literal::string")]
    pub value: String,
    pub record_count: f64,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub probability: Option<f64>,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, EnumString, Display, AsRefStr,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum MissingValueStrategy {
    /// Stop descending; the current node is the result.
    LastPrediction,
    /// Abort with no prediction.
    NullPrediction,
    /// Continue with the node's `defaultChild`.
    DefaultChild,
    WeightedConfidence,
    AggregateNodes,
    /// Unknown guards count as not matching.
    #[default]
    None,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, EnumString, Display, AsRefStr,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum NoTrueChildStrategy {
    ReturnNullPrediction,
    #[default]
    ReturnLastPrediction,
}

// ---------------------------------------------------------------------------
// Transformations
// ---------------------------------------------------------------------------

/// Named transform appended to the row before the model runs.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedField {
    pub name: String,
    #[serde(default)]
    pub optype: Option<OpType>,
    #[serde(default)]
    pub data_type: Option<DataType>,
    pub expression: Expression,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub enum Expression {
    FieldRef(FieldRef),
    Constant(Constant),
    Apply(Apply),
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldRef {
    pub field: String,
    #[serde(default)]
    pub data_type: Option<DataType>,
    #[serde(default, deserialize_with = "literal::option")]
    pub map_missing_to: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Constant {
    pub value: Value,
    #[serde(default)]
    pub data_type: Option<DataType>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Apply {
    pub function: Function,
    #[serde(default)]
    pub children: Vec<Expression>,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, EnumString, Display, AsRefStr,
)]
pub enum Function {
    #[serde(rename = "+")]
    #[strum(serialize = "+")]
    Add,
    #[serde(rename = "-")]
    #[strum(serialize = "-")]
    Subtract,
    #[serde(rename = "*")]
    #[strum(serialize = "*")]
    Multiply,
    #[serde(rename = "/")]
    #[strum(serialize = "/")]
    Divide,
    #[serde(rename = "isMissing")]
    #[strum(serialize = "isMissing")]
    IsMissing,
    #[serde(rename = "isNotMissing")]
    #[strum(serialize = "isNotMissing")]
    IsNotMissing,
    #[serde(rename = "equal")]
    #[strum(serialize = "equal")]
    Equal,
    #[serde(rename = "notEqual")]
    #[strum(serialize = "notEqual")]
    NotEqual,
    #[serde(rename = "isIn")]
    #[strum(serialize = "isIn")]
    IsIn,
    #[serde(rename = "isNotIn")]
    #[strum(serialize = "isNotIn")]
    IsNotIn,
}

// ---------------------------------------------------------------------------
// RegressionModel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegressionModel {
    #[serde(default)]
    pub model_name: Option<String>,
    pub function_name: MiningFunction,
    #[serde(default)]
    pub normalization_method: NormalizationMethod,
    #[serde(default)]
    pub target_field_name: Option<String>,
    #[serde(default)]
    pub mining_schema: MiningSchema,
    #[serde(default)]
    pub output: Option<Output>,
    pub regression_tables: Vec<RegressionTable>,
}

impl RegressionModel {
    pub fn output_field_name(&self) -> &str {
        self.target_field_name
            .as_deref()
            .or_else(|| self.mining_schema.target_field())
            .unwrap_or(DEFAULT_TARGET_FIELD)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegressionTable {
    #[serde(default)]
    pub intercept: f64,
    #[serde(default, deserialize_with = "literal::option")]
    pub target_category: Option<String>,
    #[serde(default)]
    pub predictors: Vec<Predictor>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub enum Predictor {
    #[serde(rename = "NumericPredictor")]
    Numeric(NumericPredictor),
    #[serde(rename = "CategoricalPredictor")]
    Categorical(CategoricalPredictor),
    #[serde(rename = "PredictorTerm")]
    Term(PredictorTerm),
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NumericPredictor {
    pub name: String,
    #[serde(default = "default_exponent")]
    pub exponent: i32,
    pub coefficient: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoricalPredictor {
    pub name: String,
    #[serde(deserialize_with = "literal::string")]
    pub value: String,
    pub coefficient: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictorTerm {
    #[serde(default)]
    pub name: Option<String>,
    pub coefficient: f64,
    pub field_refs: Vec<FieldRef>,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, EnumString, Display, AsRefStr,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum NormalizationMethod {
    #[default]
    None,
    Softmax,
    Logit,
}

fn default_exponent() -> i32 {
    1
}

// ---------------------------------------------------------------------------
// MiningModel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MiningModel {
    #[serde(default)]
    pub model_name: Option<String>,
    pub function_name: MiningFunction,
    #[serde(default)]
    pub mining_schema: MiningSchema,
    #[serde(default)]
    pub output: Option<Output>,
    #[serde(default)]
    pub local_transformations: Vec<DerivedField>,
    #[serde(default)]
    pub targets: Vec<Target>,
    pub segmentation: Segmentation,
}

impl MiningModel {
    /// Schema target, falling back to the first segment's output.
    pub fn output_field_name(&self) -> &str {
        self.mining_schema
            .target_field()
            .or_else(|| {
                self.segmentation
                    .segments
                    .first()
                    .map(|s| s.model.primary_output_name())
            })
            .unwrap_or(DEFAULT_TARGET_FIELD)
    }
}

/// Rescaling applied to a summed ensemble score.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Target {
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default)]
    pub rescale_constant: f64,
    #[serde(default = "default_rescale_factor")]
    pub rescale_factor: f64,
}

impl Default for Target {
    fn default() -> Self {
        Self {
            field: None,
            rescale_constant: 0.0,
            rescale_factor: default_rescale_factor(),
        }
    }
}

fn default_rescale_factor() -> f64 {
    1.0
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Segmentation {
    pub multiple_model_method: MultipleModelMethod,
    pub segments: Vec<Segment>,
}

/// A guarded sub-model. The guard is the conjunction of `predicates`; an
/// empty list is always active.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    #[serde(default, deserialize_with = "literal::option")]
    pub id: Option<String>,
    #[serde(default = "default_weight")]
    pub weight: f64,
    #[serde(default)]
    pub predicates: Vec<Predicate>,
    pub model: ModelElement,
}

fn default_weight() -> f64 {
    1.0
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, EnumString, Display, AsRefStr,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum MultipleModelMethod {
    MajorityVote,
    WeightedMajorityVote,
    Average,
    WeightedAverage,
    Median,
    Max,
    Sum,
    SelectFirst,
    SelectAll,
    ModelChain,
}

/// PMML attributes are strings, but JSON writers often emit numbers or
/// booleans for them. These accept any scalar and keep its text form.
mod literal {
    use super::*;

    pub fn string<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        Value::deserialize(deserializer).map(|v| v.to_string())
    }

    pub fn option<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::Absent => None,
            v => Some(v.to_string()),
        })
    }

    pub fn list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let values = Vec::<Value>::deserialize(deserializer)?;
        Ok(values.into_iter().map(|v| v.to_string()).collect())
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn test_vocabulary_spelling() {
        assert_eq!(Operator::LessOrEqual.to_string(), "lessOrEqual");
        assert_eq!(
            Operator::from_str("greaterOrEqual").unwrap(),
            Operator::GreaterOrEqual
        );
        assert_eq!(
            MultipleModelMethod::from_str("weightedMajorityVote").unwrap(),
            MultipleModelMethod::WeightedMajorityVote
        );
        assert_eq!(MissingValueStrategy::None.as_ref(), "none");
        assert_eq!(Function::from_str("/").unwrap(), Function::Divide);
        assert!(BooleanOperator::from_str("nand").is_err());
    }

    #[test]
    fn test_predicate_from_json() {
        let predicate: Predicate = serde_json::from_str(
            r#"{"CompoundPredicate": {"booleanOperator": "and", "predicates": [
                "True",
                {"SimplePredicate": {"field": "day", "operator": "lessThan", "value": 60}},
                {"SimpleSetPredicate": {"field": "c", "booleanOperator": "isIn", "array": ["a", 1]}}
            ]}}"#,
        )
        .unwrap();

        let Predicate::Compound(compound) = predicate else {
            panic!("expected compound predicate");
        };
        assert_eq!(compound.boolean_operator, BooleanOperator::And);
        assert_eq!(compound.predicates[0], Predicate::True);
        assert_eq!(
            compound.predicates[1],
            Predicate::Simple(SimplePredicate {
                field: "day".to_string(),
                operator: Operator::LessThan,
                value: Some("60".to_string()),
            })
        );
        match &compound.predicates[2] {
            Predicate::SimpleSet(set) => assert_eq!(set.array, vec!["a", "1"]),
            other => panic!("unexpected predicate {:?}", other),
        }
    }

    #[test]
    fn test_unknown_vocabulary_is_rejected() {
        let result: Result<Segmentation, _> = serde_json::from_str(
            r#"{"multipleModelMethod": "vote", "segments": []}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_output_field_names() {
        let model: ModelElement = serde_json::from_str(
            r#"{"RegressionModel": {
                "functionName": "regression",
                "miningSchema": {"miningFields": [
                    {"name": "x"},
                    {"name": "y", "usageType": "target"}
                ]},
                "regressionTables": [{"intercept": 1.0}]
            }}"#,
        )
        .unwrap();
        assert_eq!(model.primary_output_name(), "y");
        assert_eq!(model.kind(), "RegressionModel");

        let model: ModelElement = serde_json::from_str(
            r#"{"TreeModel": {
                "functionName": "classification",
                "node": {"predicate": "True", "score": "a"}
            }}"#,
        )
        .unwrap();
        assert_eq!(model.primary_output_name(), DEFAULT_TARGET_FIELD);
    }
}
