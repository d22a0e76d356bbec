//! Admission control.
//!
//! `schedule` is the only place that starts transfers or asks them to yield.
//! It runs after every transition that can change who is eligible and never
//! waits for a handle to confirm anything: a job told to yield reports back
//! through the router like any other event.

use crate::resume_db::{JobId, JobState};

use super::machine::Core;
use super::observer::JobEvent;

impl Core {
    pub(super) fn schedule(&mut self) {
        let cap = self.config.effective_cap();

        while self.queues.running.len() > cap {
            let Some(id) = self.queues.running.poll() else {
                break;
            };
            if !self.registry.contains(id) {
                tracing::debug!(job_id = id, "dropping running id without handle");
                continue;
            }
            tracing::debug!(job_id = id, cap, "over capacity, asking job to yield");
            if !self.enqueue(id, false, false) {
                tracing::debug!(job_id = id, "job refused to yield, left unqueued");
            }
        }

        // Handles that still need a probe go back to the tail once this pass is done,
        // otherwise they would be polled again in the same loop.
        let mut not_ready = Vec::new();
        while self.queues.running.len() < cap {
            let Some(id) = self.queues.waiting.poll() else {
                break;
            };
            let Some(entry) = self.registry.get_mut(id) else {
                tracing::debug!(job_id = id, "dropping waiting id without handle");
                continue;
            };
            if entry.handle.start() {
                entry.record.state = JobState::Running;
                self.queues.running.offer(id);
                tracing::debug!(job_id = id, "job started");
            } else if entry.handle.state() == JobState::Waiting {
                not_ready.push(id);
            } else {
                // The handle reports the failure itself as an error event.
                tracing::debug!(job_id = id, state = ?entry.handle.state(), "job failed to start");
            }
        }
        for id in not_ready {
            self.enqueue(id, false, false);
        }

        self.apply_speed_limits();
    }

    /// Hand every running job its share of the aggregate limit. Recomputed on
    /// every pass so shares follow the number of running jobs.
    pub(super) fn apply_speed_limits(&mut self) {
        let share = self.config.per_job_speed_limit(self.queues.running.len());
        for id in self.queues.running.ids() {
            if let Some(entry) = self.registry.get_mut(id) {
                entry.handle.set_speed_limit(share);
            }
        }
    }

    /// Move a job to the waiting queue through its handle's `to_wait`.
    ///
    /// Returns false when the job is unknown or its handle refused. Observers
    /// hear about it only if the job was not already waiting.
    pub(super) fn enqueue(&mut self, id: JobId, restart: bool, schedule_after: bool) -> bool {
        let Some(entry) = self.registry.get_mut(id) else {
            return false;
        };
        if !entry.handle.to_wait(restart) {
            return false;
        }
        entry.record.state = JobState::Waiting;

        self.queues.running.remove(id);
        self.queues.paused.remove(id);
        self.queues.error.remove(id);
        if self.queues.waiting.offer(id) {
            self.notify(JobEvent::Waiting { id });
            if schedule_after {
                self.schedule();
            }
        }
        true
    }

    /// Ask every waiting and running transfer to pause.
    pub(super) fn pause_all(&mut self) {
        let ids: Vec<JobId> = self
            .queues
            .waiting
            .ids()
            .into_iter()
            .chain(self.queues.running.ids())
            .collect();
        for id in ids {
            if let Some(entry) = self.registry.get_mut(id) {
                entry.handle.pause();
            }
        }
    }
}
