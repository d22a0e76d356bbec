//! Job read operations: recovery loads, single lookups and summaries.

use anyhow::Result;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use super::super::db::ResumeDb;
use super::super::types::{ChunkCursor, CustomHeader, JobId, JobRecord, JobState, JobSummary};

const RECORD_COLUMNS: &str = r#"
    id, url, path, filename, resumable, state, downloaded_size, total_size,
    last_modified, created_at, finished_at, error_msg, headers_json, chunks_json
"#;

fn record_from_row(row: &SqliteRow) -> Result<JobRecord> {
    let state_str: String = row.get("state");
    let downloaded_size: i64 = row.get("downloaded_size");
    let total_size: i64 = row.get("total_size");
    let headers_json: String = row.get("headers_json");
    let chunks_json: String = row.get("chunks_json");

    let custom_headers: Vec<CustomHeader> = if headers_json.is_empty() {
        Vec::new()
    } else {
        serde_json::from_str(&headers_json)?
    };
    let chunks: Vec<ChunkCursor> = if chunks_json.is_empty() {
        Vec::new()
    } else {
        serde_json::from_str(&chunks_json)?
    };

    Ok(JobRecord {
        id: row.get("id"),
        url: row.get("url"),
        path: row.get("path"),
        filename: row.get("filename"),
        resumable: row.get("resumable"),
        state: JobState::from_str(&state_str),
        downloaded_size: downloaded_size.max(0) as u64,
        total_size: total_size.max(0) as u64,
        last_modified: row.get("last_modified"),
        created_at: row.get("created_at"),
        finished_at: row.get("finished_at"),
        error_msg: row.get("error_msg"),
        custom_headers,
        chunks,
    })
}

/// Decode each row on its own; a row that fails to decode is logged and skipped.
fn records_from_rows(rows: &[SqliteRow]) -> Vec<JobRecord> {
    rows.iter()
        .filter_map(|row| match record_from_row(row) {
            Ok(record) => Some(record),
            Err(e) => {
                let id: JobId = row.get("id");
                tracing::warn!(job_id = id, "skipping unreadable job row: {:#}", e);
                None
            }
        })
        .collect()
}

impl ResumeDb {
    /// Jobs that are neither finished nor canceled, newest first. Rows with
    /// corrupt JSON columns are left out.
    pub async fn load_active_jobs(&self) -> Result<Vec<JobRecord>> {
        let sql = format!(
            "SELECT {RECORD_COLUMNS} FROM jobs
             WHERE state NOT IN ('finished', 'canceled')
             ORDER BY created_at DESC, id DESC"
        );
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        Ok(records_from_rows(&rows))
    }

    /// Finished jobs, most recently finished first.
    pub async fn load_finished_jobs(&self) -> Result<Vec<JobRecord>> {
        let sql = format!(
            "SELECT {RECORD_COLUMNS} FROM jobs
             WHERE state = 'finished'
             ORDER BY finished_at DESC, id DESC"
        );
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        Ok(records_from_rows(&rows))
    }

    /// Fetch a single job row.
    pub async fn get_job(&self, id: JobId) -> Result<Option<JobRecord>> {
        let sql = format!("SELECT {RECORD_COLUMNS} FROM jobs WHERE id = ?1");
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        record_from_row(&row).map(Some)
    }

    /// List all jobs in the database, newest first.
    pub async fn list_jobs(&self) -> Result<Vec<JobSummary>> {
        let rows = sqlx::query(
            r#"
            SELECT id, url, state, filename, downloaded_size, total_size
            FROM jobs
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let state_str: String = row.get("state");
            let downloaded_size: i64 = row.get("downloaded_size");
            let total_size: i64 = row.get("total_size");

            out.push(JobSummary {
                id: row.get("id"),
                url: row.get("url"),
                state: JobState::from_str(&state_str),
                filename: row.get("filename"),
                downloaded_size: downloaded_size.max(0) as u64,
                total_size: total_size.max(0) as u64,
            });
        }

        Ok(out)
    }
}
