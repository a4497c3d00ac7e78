use serde::{Deserialize, Serialize};

use super::error::FailureKind;

/// Outcome of one execution, written once into the slot for its index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExecutionResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(default)]
    pub body: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error: String,
}

impl ExecutionResult {
    pub(crate) fn completed(status: u16, body: &[u8]) -> Self {
        Self {
            status_code: Some(status),
            body: String::from_utf8_lossy(body).into_owned(),
            error: String::new(),
        }
    }

    pub(crate) fn failed(kind: FailureKind, detail: impl AsRef<str>) -> Self {
        Self {
            status_code: None,
            body: String::new(),
            error: kind.describe(detail),
        }
    }

    /// Status is known but the body stopped short.
    pub(crate) fn interrupted(
        status: u16,
        partial: &[u8],
        kind: FailureKind,
        detail: impl AsRef<str>,
    ) -> Self {
        Self {
            status_code: Some(status),
            body: String::from_utf8_lossy(partial).into_owned(),
            error: kind.describe(detail),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_empty() && matches!(self.status_code, Some(200..=299))
    }

    /// The (status, body, error) triple used for deduplication.
    pub fn signature(&self) -> (Option<u16>, &str, &str) {
        (self.status_code, self.body.as_str(), self.error.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub total: usize,
    pub success: usize,
    pub fail: usize,
    pub unique_results: Vec<ExecutionResult>,
    pub all_results: Vec<ExecutionResult>,
}
