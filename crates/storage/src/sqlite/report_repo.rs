use sqlx::Row;

use super::SqliteStore;
use crate::mapping::{
    decode_outcomes, encode_outcomes, ser, session_id_from_str, u32_from_i64,
};
use crate::repository::{ReportRecord, ReportStore, StorageError};

fn map_report_row(row: &sqlx::sqlite::SqliteRow) -> Result<ReportRecord, StorageError> {
    let id: i64 = row.try_get("id").map_err(ser)?;
    let namespace: String = row.try_get("namespace").map_err(ser)?;
    let session_id: String = row.try_get("session_id").map_err(ser)?;
    let total = u32_from_i64("total", row.try_get::<i64, _>("total").map_err(ser)?)?;
    let correct = u32_from_i64("correct", row.try_get::<i64, _>("correct").map_err(ser)?)?;
    let accuracy: f64 = row.try_get("accuracy").map_err(ser)?;
    let completed_at = row.try_get("completed_at").map_err(ser)?;
    let detail: String = row.try_get("detail").map_err(ser)?;

    Ok(ReportRecord {
        id: Some(id),
        namespace,
        session_id: session_id_from_str(&session_id)?,
        total,
        correct,
        accuracy,
        completed_at,
        outcomes: decode_outcomes(&detail)?,
    })
}

#[async_trait::async_trait]
impl ReportStore for SqliteStore {
    async fn append_report(&self, record: &ReportRecord) -> Result<i64, StorageError> {
        let detail = encode_outcomes(&record.outcomes)?;

        let res = sqlx::query(
            r"
                INSERT INTO score_reports (
                    namespace, session_id, total, correct, accuracy, completed_at, detail
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ",
        )
        .bind(&record.namespace)
        .bind(record.session_id.to_string())
        .bind(i64::from(record.total))
        .bind(i64::from(record.correct))
        .bind(record.accuracy)
        .bind(record.completed_at)
        .bind(detail)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(res.last_insert_rowid())
    }

    async fn get_report(&self, id: i64) -> Result<ReportRecord, StorageError> {
        let row = sqlx::query(
            r"
                SELECT id, namespace, session_id, total, correct, accuracy, completed_at, detail
                FROM score_reports
                WHERE id = ?1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?
        .ok_or(StorageError::NotFound)?;

        map_report_row(&row)
    }

    async fn list_reports(
        &self,
        namespace: &str,
        limit: u32,
    ) -> Result<Vec<ReportRecord>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT id, namespace, session_id, total, correct, accuracy, completed_at, detail
                FROM score_reports
                WHERE namespace = ?1
                ORDER BY completed_at DESC, id DESC
                LIMIT ?2
            ",
        )
        .bind(namespace)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_report_row(&row)?);
        }

        Ok(out)
    }
}
