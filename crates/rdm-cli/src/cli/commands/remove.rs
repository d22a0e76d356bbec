//! `rdm remove <id>` – remove a job; optionally delete its file with --delete-file.

use anyhow::Result;
use rdm_core::resume_db::{delete_job_file, ResumeDb};

pub async fn run_remove(db: &ResumeDb, id: i64, delete_file: bool) -> Result<()> {
    if delete_file {
        if let Some(job) = db.get_job(id).await? {
            if let Err(e) = delete_job_file(&job).await {
                tracing::warn!(job_id = id, "could not delete file: {:#}", e);
            }
        }
    }

    db.remove_job(id).await?;
    println!("Removed job {id}");
    Ok(())
}
