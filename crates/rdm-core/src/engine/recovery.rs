//! Startup load of persisted jobs.
//!
//! The load runs off the serialized context. A job that was mid-transfer when
//! the previous process stopped comes back `Paused`, never auto-started;
//! errored jobs keep their error state. Store failures are logged and leave
//! the engine empty rather than stuck behind a closed gate.

use crate::resume_db::{JobRecord, JobState, JobStore};

use super::machine::Core;

/// Result of the startup load, handed to the serialized context.
#[derive(Debug, Default)]
pub(crate) struct RecoveredJobs {
    /// Newest created first.
    pub(crate) active: Vec<JobRecord>,
    /// Most recently finished first.
    pub(crate) finished: Vec<JobRecord>,
}

/// Read every persisted job and normalize states for a fresh start.
pub(crate) async fn load_jobs(store: &dyn JobStore) -> RecoveredJobs {
    let mut active = match store.load_active().await {
        Ok(records) => records,
        Err(e) => {
            tracing::warn!("loading active jobs failed: {:#}", e);
            Vec::new()
        }
    };
    let finished = match store.load_finished().await {
        Ok(records) => records,
        Err(e) => {
            tracing::warn!("loading finished jobs failed: {:#}", e);
            Vec::new()
        }
    };

    let mut forced = Vec::new();
    for record in active.iter_mut() {
        if record.state.is_error() || record.state == JobState::Paused {
            continue;
        }
        tracing::debug!(job_id = record.id, from = record.state.as_str(), "recovered job forced to paused");
        record.state = JobState::Paused;
        forced.push(record.clone());
    }
    if !forced.is_empty() {
        if let Err(e) = store.save_batch(&forced).await {
            tracing::warn!(count = forced.len(), "persisting recovered states failed: {:#}", e);
        }
    }

    RecoveredJobs { active, finished }
}

impl Core {
    /// Register the startup load, open the gate, then replay requests that
    /// arrived early.
    pub(super) fn finish_recovery(&mut self, jobs: RecoveredJobs) {
        let RecoveredJobs { active, finished } = jobs;
        let (active_count, finished_count) = (active.len(), finished.len());

        for record in active {
            let id = record.id;
            let errored = record.state.is_error();
            self.register(record);
            if errored {
                self.queues.error.offer(id);
            } else {
                self.queues.paused.offer(id);
            }
        }
        for record in finished {
            self.register(record);
        }

        self.gate.open();
        tracing::info!(
            active = active_count,
            finished = finished_count,
            registered = self.registry.len(),
            "recovery complete"
        );

        for api in std::mem::take(&mut self.deferred) {
            self.on_api(api);
        }
        self.schedule();
    }
}
