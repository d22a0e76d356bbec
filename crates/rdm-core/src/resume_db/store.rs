//! Store seam used by the engine.
//!
//! The engine only talks to persistence through [`JobStore`] so recovery and
//! submission can be exercised against any backend. [`ResumeDb`] is the
//! SQLite implementation.

use anyhow::Result;
use async_trait::async_trait;

use super::db::ResumeDb;
use super::types::{JobId, JobRecord};

/// Persistent-store collaborator of the engine.
///
/// Every call may fail; the engine logs failures and never lets them unwind
/// into its in-memory state.
#[async_trait]
pub trait JobStore: Send + Sync + 'static {
    /// Jobs not in `Finished`/`Canceled`, newest created first.
    async fn load_active(&self) -> Result<Vec<JobRecord>>;

    /// `Finished` jobs, most recently finished first.
    async fn load_finished(&self) -> Result<Vec<JobRecord>>;

    async fn load_by_id(&self, id: JobId) -> Result<Option<JobRecord>>;

    /// Persist all records atomically.
    async fn save_batch(&self, records: &[JobRecord]) -> Result<()>;

    /// Insert a new record; returns the id the store assigned.
    async fn insert(&self, record: &JobRecord) -> Result<JobId>;

    async fn delete(&self, record: &JobRecord) -> Result<()>;
}

#[async_trait]
impl JobStore for ResumeDb {
    async fn load_active(&self) -> Result<Vec<JobRecord>> {
        self.load_active_jobs().await
    }

    async fn load_finished(&self) -> Result<Vec<JobRecord>> {
        self.load_finished_jobs().await
    }

    async fn load_by_id(&self, id: JobId) -> Result<Option<JobRecord>> {
        self.get_job(id).await
    }

    async fn save_batch(&self, records: &[JobRecord]) -> Result<()> {
        self.save_jobs(records).await
    }

    async fn insert(&self, record: &JobRecord) -> Result<JobId> {
        self.insert_job(record).await
    }

    async fn delete(&self, record: &JobRecord) -> Result<()> {
        self.remove_job(record.id).await
    }
}

/// Delete the downloaded file of a job. A file that is already gone is not an error.
pub async fn delete_job_file(record: &JobRecord) -> Result<()> {
    let Some(path) = record.destination() else {
        return Ok(());
    };
    match tokio::fs::remove_file(&path).await {
        Ok(()) => {
            tracing::debug!(job_id = record.id, path = %path.display(), "deleted file");
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}
