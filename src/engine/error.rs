use std::{collections::TryReserveError, error::Error as StdError};

use thiserror::Error;

/// Raised when a template cannot hand out another independent copy.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("request body is not replayable")]
    BodyNotReplayable,
}

/// Failures that stop a run before any execution is launched.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("concurrency cap must be at least 1")]
    ZeroConcurrency,
    #[error("cannot allocate result set for {requested} executions")]
    Allocation {
        requested: usize,
        #[source]
        source: TryReserveError,
    },
}

/// Why a single execution did not produce a clean response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Template,
    Timeout,
    Connect,
    Request,
    Read,
    Aborted,
}

impl FailureKind {
    pub fn label(self) -> &'static str {
        match self {
            FailureKind::Template => "template",
            FailureKind::Timeout => "timeout",
            FailureKind::Connect => "connection",
            FailureKind::Request => "request",
            FailureKind::Read => "read",
            FailureKind::Aborted => "aborted",
        }
    }

    pub fn classify(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            return FailureKind::Timeout;
        }
        if err.is_connect() {
            return FailureKind::Connect;
        }

        let message = describe(err).to_ascii_lowercase();
        if message.contains("dns") || message.contains("failed to lookup address") {
            return FailureKind::Connect;
        }

        FailureKind::Request
    }

    pub fn describe(self, detail: impl AsRef<str>) -> String {
        format!("{}: {}", self.label(), detail.as_ref())
    }
}

/// Flattens an error and its source chain into one line.
pub(crate) fn describe(err: &(dyn StdError + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}
