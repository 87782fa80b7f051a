use serde::{Deserialize, Serialize};
use std::{fs::File, io::BufReader, path::Path};

use crate::{Error, InternalResult};

/// Settings for [`crate::Engine`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// 0 uses rayon's global pool, 1 evaluates sequentially, n > 1 builds a
    /// dedicated pool of n threads.
    #[serde(default = "default_n_threads")]
    pub n_threads: usize,

    /// Batches smaller than this many rows per thread run on fewer threads.
    #[serde(default = "default_min_rows_per_thread")]
    pub min_rows_per_thread: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            n_threads: default_n_threads(),
            min_rows_per_thread: default_min_rows_per_thread(),
        }
    }
}

pub fn from_file<T: for<'de> Deserialize<'de>, P: AsRef<Path>>(path: P) -> InternalResult<T> {
    let target = path.as_ref().display().to_string();
    let file = File::open(&path)
        .map_err(|e| Error::load(&target, format!("Failed to open file: {}", e)))?;
    let reader = BufReader::new(file);
    let config = serde_json::from_reader(reader)
        .map_err(|e| Error::load(&target, format!("Failed to parse file: {}", e)))?;
    Ok(config)
}

pub fn from_str<T: for<'de> Deserialize<'de>>(s: &str) -> InternalResult<T> {
    let config = serde_json::from_str(s)
        .map_err(|e| Error::load("<string>", format!("Failed to parse: {}", e)))?;
    Ok(config)
}

fn default_n_threads() -> usize {
    0
}

fn default_min_rows_per_thread() -> usize {
    64
}
