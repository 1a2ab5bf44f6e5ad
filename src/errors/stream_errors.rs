use std::{any::Any, error::Error, sync::Arc};

use thiserror::Error;

/// Error value carried by `on_error` signals.
pub type Cause = Arc<dyn Error + Send + Sync>;

/// Errors raised by the kernel itself rather than by a user source.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StreamError {
    /// `request(n)` was called with `n <= 0`.
    #[error("invalid demand {0}: request(n) requires n > 0")]
    InvalidDemand(i64),

    /// A producer or consumer broke the subscriber/subscription contract.
    #[error("reactive streams protocol violation: {0}")]
    ProtocolViolation(&'static str),

    /// The source panicked before delivering a terminal signal.
    #[error("source panicked before terminating: {0}")]
    SourcePanicked(String),

    /// A user function running inside an operator panicked.
    #[error("operator function panicked: {0}")]
    OperatorPanicked(String),

    /// A single-subscription source was subscribed to more than once.
    #[error("source only supports a single subscriber")]
    AlreadySubscribed,

    /// An asynchronous source was subscribed outside of a Tokio runtime.
    #[error("asynchronous source subscribed outside of a Tokio runtime")]
    NoRuntime,

    /// The source dropped its subscriber without a terminal signal.
    #[error("source dropped the subscriber without a terminal signal")]
    Abandoned,
}

impl StreamError {
    /// Wraps the error into a [`Cause`] suitable for `on_error`.
    #[must_use]
    pub fn into_cause(self) -> Cause {
        Arc::new(self)
    }

    /// Returns a short stable label (snake_case) for use in logs.
    #[must_use]
    pub fn as_label(&self) -> &'static str {
        match self {
            StreamError::InvalidDemand(_) => "invalid_demand",
            StreamError::ProtocolViolation(_) => "protocol_violation",
            StreamError::SourcePanicked(_) => "source_panicked",
            StreamError::OperatorPanicked(_) => "operator_panicked",
            StreamError::AlreadySubscribed => "already_subscribed",
            StreamError::NoRuntime => "no_runtime",
            StreamError::Abandoned => "abandoned",
        }
    }
}

/// Extracts a printable message from a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
