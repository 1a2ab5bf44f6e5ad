use std::{error::Error, sync::Arc};

use rxr_streams::Cause;

#[derive(Debug)]
pub struct CustomError(pub &'static str);

impl std::fmt::Display for CustomError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "custom error: {}", self.0)
    }
}

impl Error for CustomError {}

pub fn custom_cause(msg: &'static str) -> Cause {
    Arc::new(CustomError(msg))
}
