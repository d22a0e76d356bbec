//! In-process transfer engine whose jobs only move when a test tells them to.
//!
//! `start` reports `started` right away; finishing, failing and progress are
//! driven from the test through [`FakeTransfers`].

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use rdm_core::resume_db::{JobId, JobRecord, JobState};
use rdm_core::transfer::{TransferEvents, TransferFactory, TransferHandle};

struct FakeJob {
    events: TransferEvents,
    record: JobRecord,
    state: JobState,
    speed_limit: Option<u64>,
}

#[derive(Clone, Default)]
pub struct FakeTransfers {
    jobs: Arc<Mutex<HashMap<JobId, FakeJob>>>,
}

impl FakeTransfers {
    pub fn factory(&self) -> Arc<dyn TransferFactory> {
        Arc::new(self.clone())
    }

    pub fn state(&self, id: JobId) -> Option<JobState> {
        self.jobs.lock().unwrap().get(&id).map(|j| j.state)
    }

    pub fn speed_limit(&self, id: JobId) -> Option<u64> {
        self.jobs.lock().unwrap().get(&id).and_then(|j| j.speed_limit)
    }

    /// Report `downloaded` of `total` bytes.
    pub fn progress(&self, id: JobId, total: u64, downloaded: u64) {
        let jobs = self.jobs.lock().unwrap();
        jobs[&id].events.progress(total, downloaded, 1024.0);
    }

    /// Complete the transfer of `id` with `size` bytes.
    pub fn finish(&self, id: JobId, size: u64) {
        let mut jobs = self.jobs.lock().unwrap();
        let job = jobs.get_mut(&id).expect("job has a transfer");
        job.state = JobState::Finished;
        job.record.apply_progress(size, size);
        job.record.state = JobState::Finished;
        job.events.finished(job.record.clone());
    }

    pub fn fail(&self, id: JobId, code: i32, fatal: bool) {
        let mut jobs = self.jobs.lock().unwrap();
        let job = jobs.get_mut(&id).expect("job has a transfer");
        job.state = if fatal {
            JobState::FatalError
        } else {
            JobState::Error
        };
        job.events.error(code, Some(format!("fake failure {code}")), fatal);
    }
}

impl TransferFactory for FakeTransfers {
    fn create(&self, record: &JobRecord, events: TransferEvents) -> Box<dyn TransferHandle> {
        let id = events.job_id();
        self.jobs.lock().unwrap().insert(
            id,
            FakeJob {
                events,
                record: record.clone(),
                state: record.state,
                speed_limit: None,
            },
        );
        Box::new(FakeHandle {
            id,
            jobs: self.jobs.clone(),
        })
    }
}

struct FakeHandle {
    id: JobId,
    jobs: Arc<Mutex<HashMap<JobId, FakeJob>>>,
}

impl FakeHandle {
    fn with<R>(&self, f: impl FnOnce(&mut FakeJob) -> R) -> R {
        let mut jobs = self.jobs.lock().unwrap();
        f(jobs.get_mut(&self.id).expect("job has a transfer"))
    }
}

impl TransferHandle for FakeHandle {
    fn start(&mut self) -> bool {
        self.with(|job| {
            job.state = JobState::Running;
            job.record.state = JobState::Running;
            job.events.connecting();
            job.events.started(job.record.clone());
            true
        })
    }

    fn pause(&mut self) {
        self.with(|job| {
            job.state = JobState::Paused;
            job.events.stopping();
            job.events.paused();
        })
    }

    fn cancel(&mut self) {
        self.with(|job| {
            job.state = JobState::Canceled;
            job.events.canceled();
        })
    }

    fn delete(&mut self, _delete_file: bool) {
        self.with(|job| job.state = JobState::Canceled)
    }

    fn to_wait(&mut self, restart: bool) -> bool {
        self.with(|job| {
            if restart {
                job.record.reset_progress();
            }
            job.state = JobState::Waiting;
            true
        })
    }

    fn state(&self) -> JobState {
        self.with(|job| job.state)
    }

    fn set_speed_limit(&mut self, limit: Option<u64>) {
        self.with(|job| job.speed_limit = limit)
    }
}
