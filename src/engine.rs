//! Loaded model plus batch evaluation.
//!
//! The model tree is immutable once loaded, so rows are scored independently
//! and in parallel with no synchronisation between them.

use std::path::Path;

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::{debug, info};

use crate::ast::{ModelDocument, ModelElement};
use crate::config::{self, EngineConfig};
use crate::eval::{EvalResult, Evaluator};
use crate::value::{Outputs, Row};
use crate::InternalResult;

/// Parallelism strategy for batch evaluation.
///
/// A hint: [`Engine::evaluate_batch`] downgrades it when the batch is too
/// small to be worth splitting.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Parallelism {
    #[default]
    Sequential,
    /// Up to `n` threads.
    Parallel(usize),
}

impl Parallelism {
    /// `0` → rayon's current thread count, `1` → sequential, `n` → n threads.
    pub fn from_threads(n_threads: usize) -> Self {
        match n_threads {
            0 => Self::Parallel(rayon::current_num_threads()),
            1 => Self::Sequential,
            n => Self::Parallel(n),
        }
    }

    pub fn allows_parallel(self) -> bool {
        matches!(self, Self::Parallel(n) if n > 1)
    }

    pub fn n_threads(self) -> usize {
        match self {
            Self::Sequential => 1,
            Self::Parallel(n) => n.max(1),
        }
    }

    /// Downgrades to fewer threads (or sequential) when there are fewer than
    /// `min_items_per_thread` items for each thread.
    pub fn correct_for_workload(self, n_items: usize, min_items_per_thread: usize) -> Self {
        match self {
            Self::Sequential => Self::Sequential,
            Self::Parallel(n) => {
                let effective = n.min(n_items / min_items_per_thread.max(1)).max(1);
                if effective <= 1 {
                    Self::Sequential
                } else {
                    Self::Parallel(effective)
                }
            }
        }
    }

    /// Smallest chunk rayon may split `n_items` into, so that at most
    /// `n_threads()` chunks are scored concurrently.
    pub fn min_chunk_len(self, n_items: usize) -> usize {
        n_items.div_ceil(self.n_threads()).max(1)
    }
}

pub struct Engine {
    document: ModelDocument,
    evaluator: Evaluator,
    config: EngineConfig,
    // only built for n_threads > 1
    pool: Option<ThreadPool>,
}

impl Engine {
    pub fn new(document: ModelDocument, config: EngineConfig) -> InternalResult<Self> {
        let pool = match config.n_threads {
            0 | 1 => None,
            n => Some(ThreadPoolBuilder::new().num_threads(n).build()?),
        };
        info!(
            model = document.model.kind(),
            name = document.model.model_name(),
            n_threads = config.n_threads,
            "engine ready"
        );
        Ok(Self {
            document,
            evaluator: Evaluator::new(),
            config,
            pool,
        })
    }

    pub fn from_file<P: AsRef<Path>>(path: P, config: EngineConfig) -> InternalResult<Self> {
        let document: ModelDocument = config::from_file(path)?;
        Self::new(document, config)
    }

    pub fn from_json(s: &str, config: EngineConfig) -> InternalResult<Self> {
        let document: ModelDocument = config::from_str(s)?;
        Self::new(document, config)
    }

    pub fn model(&self) -> &ModelElement {
        &self.document.model
    }

    pub fn document(&self) -> &ModelDocument {
        &self.document
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Name of the output that carries the model's prediction.
    pub fn output_name(&self) -> &str {
        self.document.model.primary_output_name()
    }

    pub fn evaluate(&self, row: &Row) -> EvalResult<Option<Outputs>> {
        self.evaluator.eval_model(&self.document.model, row)
    }

    /// Scores every row; results keep the order of `rows`. One failing row
    /// does not affect the others.
    pub fn evaluate_batch(&self, rows: &[Row]) -> Vec<EvalResult<Option<Outputs>>> {
        let parallelism = Parallelism::from_threads(self.config.n_threads)
            .correct_for_workload(rows.len(), self.config.min_rows_per_thread);
        debug!(rows = rows.len(), ?parallelism, "evaluating batch");

        if !parallelism.allows_parallel() {
            return rows.iter().map(|row| self.evaluate(row)).collect();
        }
        let min_len = parallelism.min_chunk_len(rows.len());
        let run = || -> Vec<_> {
            rows.par_iter()
                .with_min_len(min_len)
                .map(|row| self.evaluate(row))
                .collect()
        };
        match &self.pool {
            Some(pool) => pool.install(run),
            None => run(),
        }
    }
}
