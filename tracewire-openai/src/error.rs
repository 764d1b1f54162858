use thiserror::Error;
use tracewire_core::TracewireError;

/// Failure of a traced call.
///
/// Provider errors are handed back untouched; the only error the tracing
/// layer adds is a response that cannot be turned into a log payload.
#[derive(Debug, Error)]
pub enum CallError<E> {
    #[error("provider call failed: {0}")]
    Provider(E),
    #[error(transparent)]
    Serialization(#[from] TracewireError),
}

impl<E> CallError<E> {
    pub fn provider(&self) -> Option<&E> {
        match self {
            CallError::Provider(err) => Some(err),
            CallError::Serialization(_) => None,
        }
    }

    pub fn into_provider(self) -> Option<E> {
        match self {
            CallError::Provider(err) => Some(err),
            CallError::Serialization(_) => None,
        }
    }
}
