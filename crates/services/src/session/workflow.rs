use std::sync::Arc;

use fold_core::Clock;
use fold_core::hooks::HookBus;
use fold_core::model::{OptionLetter, QuizVariant, ScoreReport};
use storage::repository::{AnswerSnapshot, AnswerStore, ReportRecord, ReportStore};

use crate::error::SessionError;
use crate::question_store::QuestionStore;
use super::service::TestSession;

/// Result of answering through the workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionResult {
    /// Whether the session accepted the answer.
    pub recorded: bool,
    pub answered: usize,
    pub is_complete: bool,
}

/// Orchestrates session start, persisted answering, and submission.
///
/// The pure [`TestSession`] transitions stay synchronous; this service adds
/// the durable-storage edges around them. Answer-sheet writes are advisory
/// resumption data and therefore fire-and-forget: a failed write is logged
/// and the transition still succeeds. Report persistence is checked.
#[derive(Clone)]
pub struct QuizFlowService {
    clock: Clock,
    variant: QuizVariant,
    answers: Arc<dyn AnswerStore>,
    reports: Arc<dyn ReportStore>,
}

impl QuizFlowService {
    #[must_use]
    pub fn new(
        clock: Clock,
        variant: QuizVariant,
        answers: Arc<dyn AnswerStore>,
        reports: Arc<dyn ReportStore>,
    ) -> Self {
        Self {
            clock,
            variant,
            answers,
            reports,
        }
    }

    #[must_use]
    pub fn variant(&self) -> QuizVariant {
        self.variant
    }

    /// Load the question resource and start a session, resuming the
    /// variant's persisted answer sheet when one matches.
    ///
    /// A failed or mismatched restore degrades to a fresh sheet; only the
    /// load itself can fail.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Load` when the question resource cannot be
    /// loaded or validated.
    pub async fn start_session(
        &self,
        store: &QuestionStore,
        hooks: HookBus,
    ) -> Result<TestSession, SessionError> {
        let set = store.load().await.map_err(SessionError::Load)?;
        let set = match self.variant.question_cap() {
            Some(cap) => set.limited(cap),
            None => set,
        };

        let namespace = self.variant.storage_namespace();
        let now = self.clock.now();
        match self.answers.load_sheet(namespace).await {
            Ok(Some(snapshot)) => Ok(TestSession::resume(set, snapshot.answers, hooks, now)),
            Ok(None) => Ok(TestSession::new(set, hooks, now)),
            Err(err) => {
                tracing::warn!(namespace, error = %err, "failed to load persisted answers; starting fresh");
                Ok(TestSession::new(set, hooks, now))
            }
        }
    }

    /// Record an answer and persist the whole sheet under the variant's
    /// namespace.
    ///
    /// The sheet is overwritten wholesale on every recorded answer. A storage
    /// failure is logged and never fails the selection.
    pub async fn select_option(
        &self,
        session: &mut TestSession,
        letter: OptionLetter,
    ) -> SelectionResult {
        let recorded = session.select_option(letter);
        if recorded {
            let namespace = self.variant.storage_namespace();
            let snapshot = AnswerSnapshot::new(session.answer_slots(), self.clock.now());
            if let Err(err) = self.answers.save_sheet(namespace, &snapshot).await {
                tracing::warn!(namespace, error = %err, "failed to persist answer sheet");
            }
        }
        let progress = session.progress();
        SelectionResult {
            recorded,
            answered: progress.answered,
            is_complete: progress.is_complete,
        }
    }

    /// Submit the session: grade it, delete the persisted sheet, and append
    /// the report to history.
    ///
    /// Session artifacts are ephemeral after submission, so the sheet is
    /// deleted wholesale; a failed delete is logged and ignored. The report
    /// append is performed once per session (re-submitting does not append
    /// again) and its failure is surfaced for [`finalize_report`](Self::finalize_report).
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Incomplete` when unanswered questions remain
    /// and `SessionError::Storage` when the report cannot be appended.
    pub async fn submit(&self, session: &mut TestSession) -> Result<ScoreReport, SessionError> {
        let report = session.submit(self.clock.now())?;
        let namespace = self.variant.storage_namespace();

        if let Err(err) = self.answers.clear_sheet(namespace).await {
            tracing::warn!(namespace, error = %err, "failed to clear persisted answer sheet");
        }

        if session.report_row().is_none() {
            let record = ReportRecord::from_report(namespace, &report);
            let row = self.reports.append_report(&record).await?;
            session.set_report_row(row);
        }

        Ok(report)
    }

    /// Retry report persistence after a submit whose append failed.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Incomplete` if the session has not been
    /// submitted, and `SessionError::Storage` if the append fails again.
    pub async fn finalize_report(&self, session: &mut TestSession) -> Result<i64, SessionError> {
        if let Some(row) = session.report_row() {
            return Ok(row);
        }

        let progress = session.progress();
        let Some(report) = session.report().cloned() else {
            return Err(SessionError::Incomplete {
                answered: progress.answered,
                total: progress.total,
            });
        };

        let record = ReportRecord::from_report(self.variant.storage_namespace(), &report);
        let row = self.reports.append_report(&record).await?;
        session.set_report_row(row);
        Ok(row)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use fold_core::model::OptionLetter;
    use fold_core::time::fixed_clock;
    use std::io::Write;
    use storage::repository::{InMemoryStore, StorageError};

    const DOC: &str = r#"
        {
          "questions": [
            {
              "stemImages": ["s1a.png", "s1b.png", "s1c.png"],
              "options": {"A": "o1a.png", "B": "o1b.png", "C": "o1c.png", "D": "o1d.png"},
              "correctAnswer": "A"
            },
            {
              "stemImages": ["s2a.png", "s2b.png", "s2c.png"],
              "options": {"A": "o2a.png", "B": "o2b.png", "C": "o2c.png", "D": "o2d.png"},
              "correctAnswer": "B"
            }
          ]
        }
    "#;

    struct FailingAnswerStore;

    #[async_trait]
    impl AnswerStore for FailingAnswerStore {
        async fn save_sheet(
            &self,
            _namespace: &str,
            _snapshot: &AnswerSnapshot,
        ) -> Result<(), StorageError> {
            Err(StorageError::Connection("disk on fire".to_string()))
        }

        async fn load_sheet(
            &self,
            _namespace: &str,
        ) -> Result<Option<AnswerSnapshot>, StorageError> {
            Err(StorageError::Connection("disk on fire".to_string()))
        }

        async fn clear_sheet(&self, _namespace: &str) -> Result<(), StorageError> {
            Err(StorageError::Connection("disk on fire".to_string()))
        }
    }

    fn question_file() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(DOC.as_bytes()).unwrap();
        file
    }

    fn flow(store: &InMemoryStore) -> QuizFlowService {
        QuizFlowService::new(
            fixed_clock(),
            QuizVariant::Full,
            Arc::new(store.clone()),
            Arc::new(store.clone()),
        )
    }

    #[tokio::test]
    async fn answers_persist_and_survive_a_reload() {
        let store = InMemoryStore::new();
        let service = flow(&store);
        let file = question_file();
        let questions = QuestionStore::from_file(file.path());

        let mut session = service
            .start_session(&questions, HookBus::new())
            .await
            .unwrap();
        let result = service.select_option(&mut session, OptionLetter::A).await;
        assert!(result.recorded);
        assert_eq!(result.answered, 1);

        // simulate a reload: a new session restores the persisted sheet
        let resumed = service
            .start_session(&questions, HookBus::new())
            .await
            .unwrap();
        assert_eq!(resumed.answer_slots(), session.answer_slots());
        assert_eq!(resumed.progress().answered, 1);
    }

    #[tokio::test]
    async fn submit_clears_sheet_and_appends_report_once() {
        let store = InMemoryStore::new();
        let service = flow(&store);
        let file = question_file();
        let questions = QuestionStore::from_file(file.path());

        let mut session = service
            .start_session(&questions, HookBus::new())
            .await
            .unwrap();
        service.select_option(&mut session, OptionLetter::A).await;
        session.go_next();
        service.select_option(&mut session, OptionLetter::C).await;

        let report = service.submit(&mut session).await.unwrap();
        assert_eq!(report.total(), 2);
        assert_eq!(report.correct(), 1);
        assert_eq!(report.accuracy(), 50.0);

        // the persisted sheet is gone: a fresh start has no answers
        let fresh = service
            .start_session(&questions, HookBus::new())
            .await
            .unwrap();
        assert_eq!(fresh.progress().answered, 0);

        // re-submitting returns the same report and appends nothing
        let again = service.submit(&mut session).await.unwrap();
        assert_eq!(again, report);
        let listed = store
            .list_reports(QuizVariant::Full.storage_namespace(), 10)
            .await
            .unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, session.report_row());
    }

    #[tokio::test]
    async fn incomplete_submit_is_rejected_and_nothing_is_cleared() {
        let store = InMemoryStore::new();
        let service = flow(&store);
        let file = question_file();
        let questions = QuestionStore::from_file(file.path());

        let mut session = service
            .start_session(&questions, HookBus::new())
            .await
            .unwrap();
        service.select_option(&mut session, OptionLetter::A).await;

        let err = service.submit(&mut session).await.unwrap_err();
        assert!(matches!(
            err,
            SessionError::Incomplete {
                answered: 1,
                total: 2
            }
        ));

        // the sheet is still there for resumption
        let resumed = service
            .start_session(&questions, HookBus::new())
            .await
            .unwrap();
        assert_eq!(resumed.progress().answered, 1);
    }

    #[tokio::test]
    async fn storage_failures_never_fail_selection_or_start() {
        let store = InMemoryStore::new();
        let service = QuizFlowService::new(
            fixed_clock(),
            QuizVariant::Full,
            Arc::new(FailingAnswerStore),
            Arc::new(store),
        );
        let file = question_file();
        let questions = QuestionStore::from_file(file.path());

        let mut session = service
            .start_session(&questions, HookBus::new())
            .await
            .unwrap();
        let result = service.select_option(&mut session, OptionLetter::B).await;
        assert!(result.recorded);
        assert_eq!(session.answer_slots()[0], Some(OptionLetter::B));
    }

    #[tokio::test]
    async fn demo_variant_caps_the_set_and_uses_its_own_namespace() {
        let store = InMemoryStore::new();
        let demo = QuizFlowService::new(
            fixed_clock(),
            QuizVariant::Demo,
            Arc::new(store.clone()),
            Arc::new(store.clone()),
        );
        let file = question_file();
        let questions = QuestionStore::from_file(file.path());

        let mut session = demo
            .start_session(&questions, HookBus::new())
            .await
            .unwrap();
        demo.select_option(&mut session, OptionLetter::D).await;

        assert!(
            store
                .load_sheet(QuizVariant::Demo.storage_namespace())
                .await
                .unwrap()
                .is_some()
        );
        assert!(
            store
                .load_sheet(QuizVariant::Full.storage_namespace())
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn finalize_report_retries_a_failed_append() {
        let store = InMemoryStore::new();
        let service = flow(&store);
        let file = question_file();
        let questions = QuestionStore::from_file(file.path());

        let mut session = service
            .start_session(&questions, HookBus::new())
            .await
            .unwrap();

        // not submitted yet: nothing to finalize
        let err = service.finalize_report(&mut session).await.unwrap_err();
        assert!(matches!(err, SessionError::Incomplete { .. }));

        service.select_option(&mut session, OptionLetter::A).await;
        session.go_next();
        service.select_option(&mut session, OptionLetter::B).await;
        service.submit(&mut session).await.unwrap();

        let row = session.report_row().unwrap();
        assert_eq!(service.finalize_report(&mut session).await.unwrap(), row);
    }
}
