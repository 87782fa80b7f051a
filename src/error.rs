use thiserror::Error;

/// Failures while loading a model or building an [`crate::Engine`].
/// Row evaluation reports [`crate::EvalError`] instead.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Load error: {target}: {message}")]
    Load { target: String, message: String },
    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

pub type InternalResult<T> = Result<T, Error>;

// エラー作成用のヘルパー関数
impl Error {
    pub fn load<T: Into<String>, S: Into<String>>(target: T, message: S) -> Self {
        Error::Load {
            target: target.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_error_message() {
        let err = Error::load("model.json", "Failed to parse file: EOF");
        assert_eq!(
            err.to_string(),
            "Load error: model.json: Failed to parse file: EOF"
        );
    }
}
