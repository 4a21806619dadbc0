use chrono::{DateTime, Utc};
use std::fmt;

use fold_core::hooks::{HookBus, SessionEvent};
use fold_core::model::{
    AnswerSheet, OptionLetter, Question, QuestionSet, ScoreReport, SessionId, StepFilter,
};

use crate::error::SessionError;
use super::progress::SessionProgress;

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// In-memory paper-folding test session.
///
/// Owns the immutable question set, the answer sheet keyed by original
/// question index, and the filtered navigation view. Every operation runs to
/// completion synchronously; durable persistence is layered on by
/// [`QuizFlowService`](super::QuizFlowService). The session only exists once
/// the question resource has loaded, so nothing can be invoked mid-load.
///
/// The session is terminal after [`submit`](Self::submit): later selections
/// are no-ops and later submits return the cached report.
pub struct TestSession {
    session_id: SessionId,
    questions: QuestionSet,
    answers: AnswerSheet,
    filter: StepFilter,
    /// Original indices of the questions matching `filter`, in original order.
    view: Vec<usize>,
    /// Position within `view`.
    position: usize,
    started_at: DateTime<Utc>,
    report: Option<ScoreReport>,
    report_row: Option<i64>,
    hooks: HookBus,
}

impl TestSession {
    /// Start a fresh session over a loaded question set.
    ///
    /// Emits `after_init` with the question count.
    #[must_use]
    pub fn new(questions: QuestionSet, hooks: HookBus, started_at: DateTime<Utc>) -> Self {
        let answers = AnswerSheet::new(questions.len());
        Self::start(questions, answers, hooks, started_at)
    }

    /// Resume a session from persisted answer slots.
    ///
    /// A snapshot that does not cover the current question count is ignored
    /// and the session starts fresh, so a changed question set never
    /// misattributes old answers.
    #[must_use]
    pub fn resume(
        questions: QuestionSet,
        persisted: Vec<Option<OptionLetter>>,
        hooks: HookBus,
        started_at: DateTime<Utc>,
    ) -> Self {
        let len = questions.len();
        let answers = match AnswerSheet::from_persisted(persisted, len) {
            Ok(sheet) => sheet,
            Err(err) => {
                tracing::warn!(error = %err, "ignoring persisted answers");
                AnswerSheet::new(len)
            }
        };
        Self::start(questions, answers, hooks, started_at)
    }

    fn start(
        questions: QuestionSet,
        answers: AnswerSheet,
        hooks: HookBus,
        started_at: DateTime<Utc>,
    ) -> Self {
        let view = questions.indices_matching(&StepFilter::All);
        let session = Self {
            session_id: SessionId::random(),
            questions,
            answers,
            filter: StepFilter::All,
            view,
            position: 0,
            started_at,
            report: None,
            report_row: None,
            hooks,
        };
        session.hooks.emit(&SessionEvent::AfterInit {
            question_count: session.questions.len(),
        });
        session
    }

    #[must_use]
    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn question_set(&self) -> &QuestionSet {
        &self.questions
    }

    #[must_use]
    pub fn filter(&self) -> StepFilter {
        self.filter
    }

    /// Position within the filtered view, zero-based.
    #[must_use]
    pub fn position(&self) -> usize {
        self.position
    }

    /// Original indices of the questions in the filtered view.
    #[must_use]
    pub fn view_indices(&self) -> &[usize] {
        &self.view
    }

    #[must_use]
    pub fn hooks(&self) -> &HookBus {
        &self.hooks
    }

    pub fn hooks_mut(&mut self) -> &mut HookBus {
        &mut self.hooks
    }

    /// The answer slots in original question order, for persistence.
    #[must_use]
    pub fn answer_slots(&self) -> Vec<Option<OptionLetter>> {
        self.answers.slots().to_vec()
    }

    /// The current question under the active filter.
    ///
    /// Emits `before_question_display` with the question and its position
    /// before returning.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NoQuestions` when the filtered view is empty.
    pub fn display_current(&self) -> Result<&Question, SessionError> {
        let original_index = *self
            .view
            .get(self.position)
            .ok_or(SessionError::NoQuestions)?;
        let question = self
            .questions
            .get(original_index)
            .ok_or(SessionError::NoQuestions)?;
        self.hooks.emit(&SessionEvent::BeforeQuestionDisplay {
            position: self.position,
            original_index,
            question: question.clone(),
        });
        Ok(question)
    }

    /// Record an answer for the currently displayed question.
    ///
    /// The answer is keyed by the question's index in the *original* set, so
    /// switching filters never loses it, and the position does not advance.
    /// Emits `before_answer_select` (with the previous answer) and
    /// `after_answer_select` around the mutation.
    ///
    /// Returns `true` when the answer was recorded. Selecting after
    /// submission, or while the filtered view is empty, is a silent no-op.
    pub fn select_option(&mut self, letter: OptionLetter) -> bool {
        if self.is_submitted() {
            return false;
        }
        let Some(&original_index) = self.view.get(self.position) else {
            return false;
        };

        let previous = self.answers.answer(original_index);
        self.hooks.emit(&SessionEvent::BeforeAnswerSelect {
            question_index: original_index,
            previous,
            candidate: letter,
        });

        if self.answers.record(original_index, letter).is_err() {
            return false;
        }

        self.hooks.emit(&SessionEvent::AfterAnswerSelect {
            question_index: original_index,
            selected: letter,
            answered_count: self.answers.answered_count(),
        });
        true
    }

    /// Move to the previous question in the filtered view.
    ///
    /// Clamped at the first question; returns whether the position moved.
    pub fn go_previous(&mut self) -> bool {
        if self.position == 0 {
            return false;
        }
        self.position -= 1;
        true
    }

    /// Move to the next question in the filtered view.
    ///
    /// Clamped at the last question, no wraparound; returns whether the
    /// position moved.
    pub fn go_next(&mut self) -> bool {
        if self.position + 1 >= self.view.len() {
            return false;
        }
        self.position += 1;
        true
    }

    /// Jump to a question by its 1-based number within the filtered view.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::OutOfRange` for zero or numbers past the view.
    pub fn jump_to(&mut self, number: usize) -> Result<(), SessionError> {
        if number == 0 || number > self.view.len() {
            return Err(SessionError::OutOfRange {
                requested: number,
                len: self.view.len(),
            });
        }
        self.position = number - 1;
        Ok(())
    }

    /// Re-derive the filtered view for `filter` and reset the position to 0.
    ///
    /// An empty result is a valid, reportable state: `display_current` fails
    /// with `NoQuestions` until another filter is applied, and recorded
    /// answers are untouched. Emits `after_filter_apply` with before/after
    /// counts.
    pub fn apply_filter(&mut self, filter: StepFilter) {
        let before = self.view.len();
        self.filter = filter;
        self.view = self.questions.indices_matching(&filter);
        self.position = 0;
        self.hooks.emit(&SessionEvent::AfterFilterApply {
            filter,
            before,
            after: self.view.len(),
        });
    }

    /// True when every question in the *original* set has a recorded answer,
    /// regardless of the active filter.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.answers.is_complete()
    }

    #[must_use]
    pub fn is_submitted(&self) -> bool {
        self.report.is_some()
    }

    /// The cached report, present once the session has been submitted.
    #[must_use]
    pub fn report(&self) -> Option<&ScoreReport> {
        self.report.as_ref()
    }

    #[must_use]
    pub fn report_row(&self) -> Option<i64> {
        self.report_row
    }

    pub(crate) fn set_report_row(&mut self, id: i64) {
        self.report_row = Some(id);
    }

    /// Returns a summary of the current session progress.
    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        SessionProgress {
            total: self.questions.len(),
            answered: self.answers.answered_count(),
            position: self.position,
            filtered_total: self.view.len(),
            is_complete: self.is_complete(),
            is_submitted: self.is_submitted(),
        }
    }

    /// Grade the session and enter the terminal submitted state.
    ///
    /// Submitting an already-submitted session returns the cached report and
    /// does not re-emit `before_submit`/`after_submit`. Completeness is
    /// re-validated here even though callers gate their submit control on
    /// [`is_complete`](Self::is_complete).
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Incomplete` when any question in the original
    /// set is still unanswered.
    pub fn submit(&mut self, completed_at: DateTime<Utc>) -> Result<ScoreReport, SessionError> {
        if let Some(report) = &self.report {
            return Ok(report.clone());
        }

        let answered = self.answers.answered_count();
        let total = self.answers.len();
        if !self.answers.is_complete() {
            return Err(SessionError::Incomplete { answered, total });
        }

        self.hooks
            .emit(&SessionEvent::BeforeSubmit { answered, total });

        let report = ScoreReport::grade(self.session_id, &self.questions, &self.answers, completed_at)?;

        self.hooks.emit(&SessionEvent::AfterSubmit {
            report: report.clone(),
        });
        self.report = Some(report.clone());
        Ok(report)
    }
}

impl fmt::Debug for TestSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestSession")
            .field("session_id", &self.session_id)
            .field("questions_len", &self.questions.len())
            .field("filter", &self.filter)
            .field("view_len", &self.view.len())
            .field("position", &self.position)
            .field("answered", &self.answers.answered_count())
            .field("started_at", &self.started_at)
            .field("is_submitted", &self.is_submitted())
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
