use sqlx::Row;

use super::SqliteStore;
use crate::mapping::{decode_answers, encode_answers, ser};
use crate::repository::{AnswerSnapshot, AnswerStore, StorageError};

#[async_trait::async_trait]
impl AnswerStore for SqliteStore {
    async fn save_sheet(
        &self,
        namespace: &str,
        snapshot: &AnswerSnapshot,
    ) -> Result<(), StorageError> {
        let payload = encode_answers(&snapshot.answers)?;
        let question_count = i64::try_from(snapshot.question_count())
            .map_err(|_| StorageError::Serialization("question_count overflow".to_string()))?;

        sqlx::query(
            r"
                INSERT INTO answer_sheets (namespace, question_count, payload, saved_at)
                VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT(namespace) DO UPDATE SET
                    question_count = excluded.question_count,
                    payload = excluded.payload,
                    saved_at = excluded.saved_at
            ",
        )
        .bind(namespace)
        .bind(question_count)
        .bind(payload)
        .bind(snapshot.saved_at)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(())
    }

    async fn load_sheet(&self, namespace: &str) -> Result<Option<AnswerSnapshot>, StorageError> {
        let row = sqlx::query(
            r"
                SELECT question_count, payload, saved_at
                FROM answer_sheets
                WHERE namespace = ?1
            ",
        )
        .bind(namespace)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let question_count: i64 = row.try_get("question_count").map_err(ser)?;
        let payload: String = row.try_get("payload").map_err(ser)?;
        let saved_at = row.try_get("saved_at").map_err(ser)?;

        let answers = decode_answers(&payload)?;
        if i64::try_from(answers.len()).ok() != Some(question_count) {
            return Err(StorageError::Serialization(format!(
                "payload covers {} answers but question_count is {question_count}",
                answers.len()
            )));
        }

        Ok(Some(AnswerSnapshot { answers, saved_at }))
    }

    async fn clear_sheet(&self, namespace: &str) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM answer_sheets WHERE namespace = ?1")
            .bind(namespace)
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(())
    }
}
