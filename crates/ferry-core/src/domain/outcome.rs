//! Outcome model: the result one upload task reports to its callback.

use serde::{Deserialize, Serialize};

use crate::error::UploadError;

/// Classification of an upload result.
///
/// Serialized as SCREAMING_SNAKE_CASE (SUCCESS / FAILURE).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutcomeKind {
    Success,
    Failure,
}

/// What happened to one work item.
#[derive(Debug)]
pub enum UploadOutcome {
    Success,
    Failure(UploadError),
}

impl UploadOutcome {
    pub fn kind(&self) -> OutcomeKind {
        match self {
            UploadOutcome::Success => OutcomeKind::Success,
            UploadOutcome::Failure(_) => OutcomeKind::Failure,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, UploadOutcome::Success)
    }

    pub fn error(&self) -> Option<&UploadError> {
        match self {
            UploadOutcome::Success => None,
            UploadOutcome::Failure(e) => Some(e),
        }
    }
}

impl From<Result<(), UploadError>> for UploadOutcome {
    fn from(result: Result<(), UploadError>) -> Self {
        match result {
            Ok(()) => UploadOutcome::Success,
            Err(e) => UploadOutcome::Failure(e),
        }
    }
}
