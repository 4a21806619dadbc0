use thiserror::Error;

use crate::model::{AnswerSheetError, ImageRefError, QuestionError, ReportError};

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Answer(#[from] AnswerSheetError),
    #[error(transparent)]
    Image(#[from] ImageRefError),
    #[error(transparent)]
    Report(#[from] ReportError),
}
