//! `rdm status` – show all jobs.

use anyhow::Result;
use rdm_core::resume_db::{JobSummary, ResumeDb};

pub async fn run_status(db: &ResumeDb) -> Result<()> {
    let jobs = db.list_jobs().await?;
    if jobs.is_empty() {
        println!("No jobs in database.");
        return Ok(());
    }
    println!("{:<6} {:<12} {:<20} {}", "ID", "STATE", "PROGRESS", "URL");
    for j in jobs {
        println!(
            "{:<6} {:<12} {:<20} {}",
            j.id,
            j.state.as_str(),
            progress(&j),
            j.url
        );
    }
    Ok(())
}

fn progress(job: &JobSummary) -> String {
    if job.total_size == 0 {
        return format!("{}/-", job.downloaded_size);
    }
    let pct = job.downloaded_size as f64 * 100.0 / job.total_size as f64;
    format!("{}/{} {:.0}%", job.downloaded_size, job.total_size, pct)
}
