//! `rdm add <url>` – store a new download, paused until the engine resumes it.

use anyhow::{bail, Result};
use rdm_core::resume_db::{unix_timestamp, CustomHeader, JobId, JobRecord, JobState, ResumeDb};

/// Split a `Name: value` header argument.
pub fn parse_header(raw: &str) -> Result<CustomHeader> {
    let Some((name, value)) = raw.split_once(':') else {
        bail!("header {raw:?} is not of the form `Name: value`");
    };
    let name = name.trim();
    if name.is_empty() {
        bail!("header {raw:?} has an empty name");
    }
    Ok(CustomHeader {
        name: name.to_string(),
        value: value.trim().to_string(),
    })
}

pub async fn run_add(
    db: &ResumeDb,
    url: &str,
    dir: &str,
    filename: Option<&str>,
    headers: &[String],
) -> Result<JobId> {
    if url.trim().is_empty() {
        bail!("empty url");
    }
    let mut record = JobRecord::new_waiting(url, dir, filename, unix_timestamp());
    // Recovery brings every interrupted job back paused; store it that way.
    record.state = JobState::Paused;
    record.custom_headers = headers
        .iter()
        .map(|h| parse_header(h))
        .collect::<Result<_>>()?;
    let id = db.insert_job(&record).await?;
    println!("Added job {id} (paused) for URL: {url}");
    Ok(id)
}
