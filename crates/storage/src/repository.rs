use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fold_core::model::{OptionLetter, QuestionOutcome, ReportError, ScoreReport, SessionId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Persisted shape of an in-progress answer sheet.
///
/// The payload is one entry per question in original set order, `None` for
/// unanswered. It is overwritten wholesale on every change and deleted
/// wholesale when a submission completes, so readers never see a partial
/// sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerSnapshot {
    pub answers: Vec<Option<OptionLetter>>,
    pub saved_at: DateTime<Utc>,
}

impl AnswerSnapshot {
    #[must_use]
    pub fn new(answers: Vec<Option<OptionLetter>>, saved_at: DateTime<Utc>) -> Self {
        Self { answers, saved_at }
    }

    #[must_use]
    pub fn question_count(&self) -> usize {
        self.answers.len()
    }
}

/// Persisted shape of a submitted score report.
///
/// This mirrors the domain `ScoreReport` so repositories can
/// serialize/deserialize without leaking storage concerns into the domain
/// layer.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRecord {
    pub id: Option<i64>,
    pub namespace: String,
    pub session_id: SessionId,
    pub total: u32,
    pub correct: u32,
    pub accuracy: f64,
    pub completed_at: DateTime<Utc>,
    pub outcomes: Vec<QuestionOutcome>,
}

impl ReportRecord {
    #[must_use]
    pub fn from_report(namespace: &str, report: &ScoreReport) -> Self {
        Self {
            id: None,
            namespace: namespace.to_string(),
            session_id: report.session_id(),
            total: report.total(),
            correct: report.correct(),
            accuracy: report.accuracy(),
            completed_at: report.completed_at(),
            outcomes: report.outcomes().to_vec(),
        }
    }

    /// Convert the record back into a domain `ScoreReport`.
    ///
    /// # Errors
    ///
    /// Returns `ReportError` if the persisted counts fail validation.
    pub fn into_report(self) -> Result<ScoreReport, ReportError> {
        ScoreReport::from_persisted(
            self.session_id,
            self.total,
            self.correct,
            self.completed_at,
            self.outcomes,
        )
    }
}

/// Contract for the durable answer sheet of an in-progress test.
///
/// The sheet is advisory resumption data: callers treat writes as
/// fire-and-forget and a lost sheet only costs re-answering.
#[async_trait]
pub trait AnswerStore: Send + Sync {
    /// Overwrite the sheet stored under `namespace`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the write fails.
    async fn save_sheet(
        &self,
        namespace: &str,
        snapshot: &AnswerSnapshot,
    ) -> Result<(), StorageError>;

    /// Fetch the sheet stored under `namespace`, `None` when absent.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the read fails.
    async fn load_sheet(&self, namespace: &str) -> Result<Option<AnswerSnapshot>, StorageError>;

    /// Delete the sheet stored under `namespace`; deleting an absent sheet
    /// succeeds.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the delete fails.
    async fn clear_sheet(&self, namespace: &str) -> Result<(), StorageError>;
}

/// Contract for submitted score-report history.
#[async_trait]
pub trait ReportStore: Send + Sync {
    /// Append a report, returning its row id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the report cannot be stored.
    async fn append_report(&self, record: &ReportRecord) -> Result<i64, StorageError>;

    /// Fetch a report by row id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn get_report(&self, id: i64) -> Result<ReportRecord, StorageError>;

    /// List reports for a namespace, most recent first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the read fails.
    async fn list_reports(
        &self,
        namespace: &str,
        limit: u32,
    ) -> Result<Vec<ReportRecord>, StorageError>;
}

/// Simple in-memory store implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    sheets: Arc<Mutex<HashMap<String, AnswerSnapshot>>>,
    reports: Arc<Mutex<Vec<ReportRecord>>>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AnswerStore for InMemoryStore {
    async fn save_sheet(
        &self,
        namespace: &str,
        snapshot: &AnswerSnapshot,
    ) -> Result<(), StorageError> {
        let mut guard = self
            .sheets
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(namespace.to_string(), snapshot.clone());
        Ok(())
    }

    async fn load_sheet(&self, namespace: &str) -> Result<Option<AnswerSnapshot>, StorageError> {
        let guard = self
            .sheets
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(namespace).cloned())
    }

    async fn clear_sheet(&self, namespace: &str) -> Result<(), StorageError> {
        let mut guard = self
            .sheets
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.remove(namespace);
        Ok(())
    }
}

#[async_trait]
impl ReportStore for InMemoryStore {
    async fn append_report(&self, record: &ReportRecord) -> Result<i64, StorageError> {
        let mut guard = self
            .reports
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let id = i64::try_from(guard.len() + 1)
            .map_err(|_| StorageError::Serialization("report id overflow".to_string()))?;
        let mut stored = record.clone();
        stored.id = Some(id);
        guard.push(stored);
        Ok(id)
    }

    async fn get_report(&self, id: i64) -> Result<ReportRecord, StorageError> {
        let guard = self
            .reports
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard
            .iter()
            .find(|record| record.id == Some(id))
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    async fn list_reports(
        &self,
        namespace: &str,
        limit: u32,
    ) -> Result<Vec<ReportRecord>, StorageError> {
        let guard = self
            .reports
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard
            .iter()
            .rev()
            .filter(|record| record.namespace == namespace)
            .take(limit as usize)
            .cloned()
            .collect())
    }
}

/// Aggregates the stores behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub answers: Arc<dyn AnswerStore>,
    pub reports: Arc<dyn ReportStore>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let store = InMemoryStore::new();
        let answers: Arc<dyn AnswerStore> = Arc::new(store.clone());
        let reports: Arc<dyn ReportStore> = Arc::new(store);
        Self { answers, reports }
    }
}
