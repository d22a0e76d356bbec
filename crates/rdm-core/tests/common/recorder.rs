//! Observer that keeps every notification it receives.

use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;
use rdm_core::engine::{JobEvent, JobObserver, JobSetChange, JobSetObserver};
use rdm_core::resume_db::JobId;

#[derive(Default)]
pub struct Recorder {
    events: Mutex<Vec<JobEvent>>,
    changes: Mutex<Vec<JobSetChange>>,
}

impl Recorder {
    pub fn events(&self) -> Vec<JobEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Events of one job with progress left out.
    pub fn events_of(&self, id: JobId) -> Vec<JobEvent> {
        self.events()
            .into_iter()
            .filter(|e| e.job_id() == id && !matches!(e, JobEvent::Progress { .. }))
            .collect()
    }

    pub fn changes(&self) -> Vec<JobSetChange> {
        self.changes.lock().unwrap().clone()
    }

    pub fn saw_started(&self, id: JobId) -> bool {
        self.events()
            .iter()
            .any(|e| matches!(e, JobEvent::Started(r) if r.id == id))
    }

    pub fn saw_removed(&self, id: JobId) -> bool {
        self.changes()
            .iter()
            .any(|c| matches!(c, JobSetChange::Removed(removed) if *removed == id))
    }
}

#[async_trait]
impl JobObserver for Recorder {
    async fn on_job_event(&self, event: &JobEvent) -> Result<()> {
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }
}

#[async_trait]
impl JobSetObserver for Recorder {
    async fn on_job_set_change(&self, change: &JobSetChange) -> Result<()> {
        self.changes.lock().unwrap().push(change.clone());
        Ok(())
    }
}
