use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::answer::AnswerSheet;
use crate::model::ids::{QuestionId, SessionId};
use crate::model::question::{OptionLetter, QuestionSet};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ReportError {
    #[error("sheet covers {sheet} questions but the set has {set}")]
    SheetMismatch { set: usize, sheet: usize },

    #[error("correct count ({correct}) exceeds total ({total})")]
    CountMismatch { total: u32, correct: u32 },

    #[error("too many questions for a single report: {len}")]
    TooManyQuestions { len: usize },
}

/// Outcome of a single question after grading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionOutcome {
    pub question_index: usize,
    pub question_id: QuestionId,
    pub chosen: Option<OptionLetter>,
    pub correct: OptionLetter,
    pub is_correct: bool,
}

/// Aggregate result of a submitted test.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreReport {
    session_id: SessionId,
    total: u32,
    correct: u32,
    accuracy: f64,
    completed_at: DateTime<Utc>,
    outcomes: Vec<QuestionOutcome>,
}

impl ScoreReport {
    /// Grade an answer sheet against its question set.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::SheetMismatch` if the sheet does not cover the
    /// set, and `ReportError::TooManyQuestions` if the count cannot fit in
    /// `u32`.
    pub fn grade(
        session_id: SessionId,
        questions: &QuestionSet,
        answers: &AnswerSheet,
        completed_at: DateTime<Utc>,
    ) -> Result<Self, ReportError> {
        if answers.len() != questions.len() {
            return Err(ReportError::SheetMismatch {
                set: questions.len(),
                sheet: answers.len(),
            });
        }
        let total = u32::try_from(questions.len()).map_err(|_| ReportError::TooManyQuestions {
            len: questions.len(),
        })?;

        let mut correct = 0_u32;
        let mut outcomes = Vec::with_capacity(questions.len());
        for (index, question) in questions.questions().iter().enumerate() {
            let chosen = answers.answer(index);
            let is_correct = chosen == Some(question.correct_answer());
            if is_correct {
                correct = correct.saturating_add(1);
            }
            outcomes.push(QuestionOutcome {
                question_index: index,
                question_id: question.id().clone(),
                chosen,
                correct: question.correct_answer(),
                is_correct,
            });
        }

        Ok(Self {
            session_id,
            total,
            correct,
            accuracy: Self::percentage(correct, total),
            completed_at,
            outcomes,
        })
    }

    /// Rehydrate a report from persisted storage.
    ///
    /// The accuracy is recomputed from the counts rather than trusted.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::CountMismatch` if `correct` exceeds `total`.
    pub fn from_persisted(
        session_id: SessionId,
        total: u32,
        correct: u32,
        completed_at: DateTime<Utc>,
        outcomes: Vec<QuestionOutcome>,
    ) -> Result<Self, ReportError> {
        if correct > total {
            return Err(ReportError::CountMismatch { total, correct });
        }
        Ok(Self {
            session_id,
            total,
            correct,
            accuracy: Self::percentage(correct, total),
            completed_at,
            outcomes,
        })
    }

    /// Percentage of correct answers, rounded to exactly one decimal place.
    ///
    /// Report consumers compare against this rounding, so it must not change.
    #[must_use]
    pub fn percentage(correct: u32, total: u32) -> f64 {
        if total == 0 {
            return 0.0;
        }
        (f64::from(correct) / f64::from(total) * 1000.0).round() / 10.0
    }

    #[must_use]
    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        self.total
    }

    #[must_use]
    pub fn correct(&self) -> u32 {
        self.correct
    }

    #[must_use]
    pub fn accuracy(&self) -> f64 {
        self.accuracy
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }

    #[must_use]
    pub fn outcomes(&self) -> &[QuestionOutcome] {
        &self.outcomes
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
