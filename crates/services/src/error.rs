//! Shared error types for the services crate.

use thiserror::Error;

use fold_core::model::{ImageRefError, QuestionError, ReportError};
use storage::repository::StorageError;

/// Errors loading the question resource.
///
/// A failed load is fatal to session start; there is no automatic retry and
/// the caller is expected to surface a reload affordance.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoadError {
    #[error("failed to read question resource: {0}")]
    Io(#[from] std::io::Error),

    #[error("question resource request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("malformed question document: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("unrecognized option letter in question {id}: {raw}")]
    InvalidLetter { id: String, raw: String },

    #[error(transparent)]
    Image(#[from] ImageRefError),

    #[error(transparent)]
    Question(#[from] QuestionError),

    #[error("question resource contains no questions")]
    Empty,
}

/// Errors emitted by test sessions and the session workflow.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("no questions match the active filter")]
    NoQuestions,

    #[error("cannot submit: {answered} of {total} questions answered")]
    Incomplete { answered: usize, total: usize },

    #[error("question number {requested} is outside the filtered range 1-{len}")]
    OutOfRange { requested: usize, len: usize },

    #[error(transparent)]
    Report(#[from] ReportError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Load(#[from] LoadError),
}
