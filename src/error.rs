//! Closed error taxonomy for the simulation result analysis core.
//!
//! Every fallible operation in this crate returns `Result<T, Error>`. The
//! variants mirror the kinds enumerated in the analysis-core specification:
//! malformed input, missing data, numeric failure, a composite metric's
//! dependency failing, expression-evaluation failure, export I/O failure,
//! and cooperative cancellation. Metric extractors never let these escape
//! to the caller — see `metrics::MetricResult::err`.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("missing data: {0}")]
    MissingData(String),

    #[error("numeric failure: {0}")]
    NumericFailure(String),

    #[error("dependency failure: {metric} failed because {cause}")]
    DependencyFailure { metric: String, cause: String },

    #[error("evaluation error at position {position}: {message}")]
    EvaluationError { message: String, position: usize },

    #[error("io error: {0}")]
    IoError(String),

    #[error("cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Error::InvalidInput(msg.into())
    }

    pub fn missing_data(msg: impl Into<String>) -> Self {
        Error::MissingData(msg.into())
    }

    pub fn numeric_failure(msg: impl Into<String>) -> Self {
        Error::NumericFailure(msg.into())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::IoError(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::IoError(err.to_string())
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        Error::IoError(err.to_string())
    }
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        Error::IoError(err.to_string())
    }
}
