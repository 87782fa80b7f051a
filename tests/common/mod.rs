#![allow(dead_code)]

use std::path::PathBuf;

use pmml_eval::{config, ModelDocument, Row, Value};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[ctor::ctor]
fn init_tests() {
    // テストの前に一度だけ実行したい処理
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(format!("{}.json", name))
}

pub fn load(name: &str) -> ModelDocument {
    config::from_file(fixture_path(name)).expect("fixture should load")
}

pub fn row<const N: usize>(pairs: [(&str, Value); N]) -> Row {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

pub fn number(value: &Value) -> f64 {
    value
        .as_number()
        .unwrap_or_else(|| panic!("expected a number, got {:?}", value))
}
