use tracing::{debug, trace};

use crate::ast::{MissingValueStrategy, NoTrueChildStrategy, Node, TreeModel};
use crate::value::{Outputs, Row};

use super::{
    evaluator::{EvalError, EvalResult},
    output,
    predicate::{PredicateEvaluator, TriBool},
};

/// Walks a decision tree from the root to the node that scores the row.
#[derive(Default)]
pub struct TreeEvaluator {
    predicate_evaluator: PredicateEvaluator,
}

impl TreeEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eval_tree(&self, tree: &TreeModel, row: &Row) -> EvalResult<Option<Outputs>> {
        let Some(node) = self.find_terminal(tree, row)? else {
            debug!("tree produced no prediction");
            return Ok(None);
        };
        let score = node
            .score
            .as_deref()
            .ok_or_else(|| EvalError::TerminalNodeWithoutScore {
                node_id: node.label().to_string(),
            })?;
        debug!(node = node.label(), score, "terminal node");
        output::tree_outputs(tree, node, score).map(Some)
    }

    /// Returns the node whose score applies, or `None` when the tree makes
    /// no prediction. Each step moves to a direct child, so the walk ends
    /// after at most `depth` steps.
    pub fn find_terminal<'a>(&self, tree: &'a TreeModel, row: &Row) -> EvalResult<Option<&'a Node>> {
        let root = &tree.node;
        if !self
            .predicate_evaluator
            .eval_predicate(&root.predicate, row)?
            .is_true()
        {
            return Ok(None);
        }

        let mut current = root;
        'descend: loop {
            if current.is_leaf() {
                return Ok(Some(current));
            }
            for child in &current.children {
                match self.predicate_evaluator.eval_predicate(&child.predicate, row)? {
                    TriBool::True => {
                        trace!(node = child.label(), "descending");
                        current = child;
                        continue 'descend;
                    }
                    TriBool::False => {}
                    TriBool::Unknown => {
                        trace!(
                            node = child.label(),
                            strategy = %tree.missing_value_strategy,
                            "guard unknown"
                        );
                        match tree.missing_value_strategy {
                            MissingValueStrategy::LastPrediction => return Ok(Some(current)),
                            MissingValueStrategy::NullPrediction => return Ok(None),
                            MissingValueStrategy::DefaultChild => {
                                current = default_child(current)?;
                                continue 'descend;
                            }
                            MissingValueStrategy::None => {}
                            strategy @ (MissingValueStrategy::WeightedConfidence
                            | MissingValueStrategy::AggregateNodes) => {
                                return Err(EvalError::UnsupportedStrategy(strategy))
                            }
                        }
                    }
                }
            }

            return Ok(match tree.no_true_child_strategy {
                NoTrueChildStrategy::ReturnLastPrediction => Some(current),
                NoTrueChildStrategy::ReturnNullPrediction => None,
            });
        }
    }
}

fn default_child(node: &Node) -> EvalResult<&Node> {
    let child_id = node
        .default_child
        .as_deref()
        .ok_or_else(|| EvalError::MissingDefaultChild {
            node_id: node.label().to_string(),
        })?;
    node.find_child(child_id)
        .ok_or_else(|| EvalError::InvalidDefaultChild {
            node_id: node.label().to_string(),
            child_id: child_id.to_string(),
        })
}
