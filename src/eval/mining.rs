use std::borrow::Cow;

use tracing::debug;

use crate::ast::MiningModel;
use crate::value::{Outputs, Row};

use super::{
    evaluator::{EvalResult, Evaluator},
    output,
};

impl Evaluator {
    /// Local transformations, then segmentation, then output post-processing.
    #[tracing::instrument(skip_all, fields(model = model.model_name.as_deref()), level = "debug")]
    pub fn eval_mining(&self, model: &MiningModel, row: &Row) -> EvalResult<Option<Outputs>> {
        let mut row = Cow::Borrowed(row);
        if !model.local_transformations.is_empty() {
            self.expression_evaluator
                .apply_derived_fields(&model.local_transformations, row.to_mut())?;
        }

        let Some(results) = self.eval_segmentation(model, &row)? else {
            debug!("no segment produced a result");
            return Ok(None);
        };
        Ok(Some(output::mining_outputs(
            model.output.as_ref(),
            model.output_field_name(),
            results,
        )))
    }
}
