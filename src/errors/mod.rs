//! Error types signalled through `on_error`.
//!
//! Upstream failures travel as a [`Cause`] and are never rewritten by generic
//! operators. Failures raised by the kernel itself are [`StreamError`] values
//! converted into a `Cause` with [`StreamError::into_cause`].
mod stream_errors;

pub use stream_errors::*;
