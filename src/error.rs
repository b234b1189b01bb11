//! Harness error types

use std::time::Duration;
use thiserror::Error;

/// Errors raised by the harness, the turn handler, or a flow step
///
/// `Clone` because a flow's completion is shared: every awaiter of
/// `start_test` receives the same first failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HarnessError {
    /// A required argument was missing or malformed
    #[error("invalid argument `{argument}`: {reason}")]
    Validation {
        argument: &'static str,
        reason: String,
    },
    /// A reply arrived but did not match the expectation
    #[error("{0}")]
    Assertion(String),
    /// No reply arrived within the bound
    #[error("{timeout_ms}ms timed out waiting for: {description}")]
    Timeout { timeout_ms: u64, description: String },
    /// The harness models exactly one fixed conversation
    #[error("{0} is not supported by the test harness")]
    NotImplemented(&'static str),
    /// Failure raised by the turn handler or a middleware
    #[error("turn failed: {0}")]
    Turn(String),
}

impl HarnessError {
    pub fn validation(argument: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation {
            argument,
            reason: reason.into(),
        }
    }

    pub fn assertion(message: impl Into<String>) -> Self {
        Self::Assertion(message.into())
    }

    pub fn timeout(timeout: Duration, description: impl Into<String>) -> Self {
        Self::Timeout {
            timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            description: description.into(),
        }
    }

    pub fn turn(message: impl Into<String>) -> Self {
        Self::Turn(message.into())
    }

    /// "No answer" as opposed to "wrong answer"
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    pub fn is_assertion(&self) -> bool {
        matches!(self, Self::Assertion(_))
    }
}
