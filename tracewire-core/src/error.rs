use thiserror::Error;

#[derive(Debug, Error)]
pub enum TracewireError {
    #[error("value is not JSON-serializable: {0}")]
    Serialization(#[source] serde_json::Error),
    #[error("stream payload is malformed: {0}")]
    MalformedStream(String),
    #[error("malformed server-sent event: {0}")]
    Sse(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<StreamError> for TracewireError {
    fn from(err: StreamError) -> Self {
        TracewireError::MalformedStream(err.to_string())
    }
}

/// Failure to reduce a stream into its final value.
///
/// Cloneable so the outcome can be memoized alongside successful values.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum StreamError {
    #[error("json deltas do not form a valid document: {0}")]
    InvalidJson(String),
}
