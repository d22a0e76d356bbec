//! Job write operations: insert, batch save, state, remove.

use anyhow::Result;

use super::super::db::{unix_timestamp, ResumeDb};
use super::super::types::{JobId, JobRecord, JobState};

impl ResumeDb {
    /// Insert a new job row and return the id assigned by the database.
    ///
    /// `record.id` is ignored.
    pub async fn insert_job(&self, record: &JobRecord) -> Result<JobId> {
        let headers_json = serde_json::to_string(&record.custom_headers)?;
        let chunks_json = serde_json::to_string(&record.chunks)?;

        let row_id = sqlx::query(
            r#"
            INSERT INTO jobs (
                url, path, filename, resumable, state,
                downloaded_size, total_size, last_modified,
                created_at, finished_at, error_msg, headers_json, chunks_json
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
        )
        .bind(&record.url)
        .bind(&record.path)
        .bind(&record.filename)
        .bind(record.resumable)
        .bind(record.state.as_str())
        .bind(record.downloaded_size as i64)
        .bind(record.total_size as i64)
        .bind(&record.last_modified)
        .bind(record.created_at)
        .bind(record.finished_at)
        .bind(&record.error_msg)
        .bind(headers_json)
        .bind(chunks_json)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        Ok(row_id)
    }

    /// Write back every mutable column of the given records in one transaction.
    pub async fn save_jobs(&self, records: &[JobRecord]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for record in records {
            let headers_json = serde_json::to_string(&record.custom_headers)?;
            let chunks_json = serde_json::to_string(&record.chunks)?;
            sqlx::query(
                r#"
                UPDATE jobs
                SET filename = ?1,
                    resumable = ?2,
                    state = ?3,
                    downloaded_size = ?4,
                    total_size = ?5,
                    last_modified = ?6,
                    finished_at = ?7,
                    error_msg = ?8,
                    headers_json = ?9,
                    chunks_json = ?10
                WHERE id = ?11
                "#,
            )
            .bind(&record.filename)
            .bind(record.resumable)
            .bind(record.state.as_str())
            .bind(record.downloaded_size as i64)
            .bind(record.total_size as i64)
            .bind(&record.last_modified)
            .bind(record.finished_at)
            .bind(&record.error_msg)
            .bind(headers_json)
            .bind(chunks_json)
            .bind(record.id)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    /// Update the state of an existing job. Entering `Finished` stamps `finished_at`.
    pub async fn set_state(&self, id: JobId, state: JobState) -> Result<()> {
        let finished_at = (state == JobState::Finished).then(unix_timestamp);
        sqlx::query(
            r#"
            UPDATE jobs
            SET state = ?1,
                finished_at = COALESCE(?2, finished_at)
            WHERE id = ?3
            "#,
        )
        .bind(state.as_str())
        .bind(finished_at)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Permanently remove a job row from the database.
    ///
    /// File cleanup is handled separately (see `delete_job_file`).
    pub async fn remove_job(&self, id: JobId) -> Result<()> {
        sqlx::query(
            r#"
            DELETE FROM jobs
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
