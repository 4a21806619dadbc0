mod answer;
mod filter;
mod ids;
mod image;
mod question;
mod report;
mod variant;

pub use answer::{AnswerSheet, AnswerSheetError};
pub use filter::{FilterParseError, StepFilter};
pub use ids::{ParseIdError, QuestionId, SessionId};
pub use image::{ImageRef, ImageRefError};
pub use question::{OptionLetter, ParseLetterError, Question, QuestionError, QuestionSet};
pub use report::{QuestionOutcome, ReportError, ScoreReport};
pub use variant::QuizVariant;
