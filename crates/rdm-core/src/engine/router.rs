//! Event routing: every transfer report and API request becomes a queue
//! transition plus side effects.
//!
//! Handlers only notify when a queue actually changed, which makes duplicate
//! deliveries of the same report harmless.

use std::time::Instant;

use crate::resume_db::{unix_timestamp, JobId, JobRecord, JobState};
use crate::transfer::TransferEvent;

use super::command::{ApiCommand, Effect};
use super::machine::Core;
use super::observer::{JobEvent, JobSetChange};

impl Core {
    pub(super) fn on_transfer_event(&mut self, id: JobId, event: TransferEvent) {
        if !self.registry.contains(id) {
            tracing::debug!(job_id = id, ?event, "report for unknown job ignored");
            return;
        }
        match event {
            TransferEvent::Connecting => self.notify(JobEvent::Connecting { id }),
            TransferEvent::Progress {
                total,
                downloaded,
                bps,
            } => self.on_progress(id, total, downloaded, bps),
            TransferEvent::Started(record) => self.on_started(id, record),
            TransferEvent::Waiting => self.on_waiting(id),
            TransferEvent::Stopping => {
                if let Some(entry) = self.registry.get_mut(id) {
                    entry.record.state = JobState::Pausing;
                }
                self.notify(JobEvent::Stopping { id });
            }
            TransferEvent::Paused => self.on_paused(id),
            TransferEvent::Error {
                code,
                message,
                fatal,
            } => self.on_error(id, code, message, fatal),
            TransferEvent::Finished(record) => self.on_finished(id, record),
            TransferEvent::Canceled => self.on_canceled(id),
            TransferEvent::InfoUpdated(record) => {
                if let Some(entry) = self.registry.get_mut(id) {
                    entry.record = record.clone();
                }
                self.notify(JobEvent::InfoUpdated(record));
            }
        }
    }

    fn on_progress(&mut self, id: JobId, total: u64, downloaded: u64, bps: f64) {
        let Some(entry) = self.registry.get_mut(id) else {
            return;
        };
        entry.record.apply_progress(total, downloaded);
        let downloaded = entry.record.downloaded_size;
        if self.throttle.should_deliver(id, Instant::now()) {
            self.notify(JobEvent::Progress {
                id,
                total,
                downloaded,
                bps,
            });
        }
    }

    fn on_started(&mut self, id: JobId, mut record: JobRecord) {
        record.id = id;
        record.state = JobState::Running;
        if let Some(entry) = self.registry.get_mut(id) {
            entry.record = record.clone();
        }
        self.queues.waiting.remove(id);
        self.queues.paused.remove(id);
        self.queues.error.remove(id);
        self.queues.running.offer(id);
        self.notify(JobEvent::Started(record));
    }

    fn on_waiting(&mut self, id: JobId) {
        if self.queues.waiting.contains(id) {
            return;
        }
        self.queues.running.remove(id);
        self.queues.paused.remove(id);
        self.queues.error.remove(id);
        self.queues.waiting.offer(id);
        if let Some(entry) = self.registry.get_mut(id) {
            entry.record.state = JobState::Waiting;
        }
        self.notify(JobEvent::Waiting { id });
        self.schedule();
    }

    fn on_paused(&mut self, id: JobId) {
        self.throttle.forget(id);
        let was_active = self.queues.running.remove(id) | self.queues.waiting.remove(id);
        if let Some(entry) = self.registry.get_mut(id) {
            if entry.record.state == JobState::Pausing || was_active {
                entry.record.state = JobState::Paused;
            }
        }
        if !was_active {
            return;
        }
        self.queues.paused.offer(id);
        self.notify(JobEvent::Paused { id });
        self.schedule();
    }

    fn on_error(&mut self, id: JobId, code: i32, message: Option<String>, fatal: bool) {
        self.throttle.forget(id);
        let was_queued = self.queues.running.remove(id)
            | self.queues.paused.remove(id)
            | self.queues.waiting.remove(id);
        if !was_queued {
            return;
        }
        if let Some(entry) = self.registry.get_mut(id) {
            entry.record.state = if fatal {
                JobState::FatalError
            } else {
                JobState::Error
            };
            entry.record.error_msg = message;
        }
        self.queues.error.offer(id);
        tracing::debug!(job_id = id, code, fatal, "job failed");
        self.notify(JobEvent::Error { id, code, fatal });
        self.schedule();
    }

    fn on_finished(&mut self, id: JobId, mut record: JobRecord) {
        self.throttle.forget(id);
        if !self.queues.remove_everywhere(id) {
            return;
        }
        record.id = id;
        record.state = JobState::Finished;
        record.finished_at.get_or_insert_with(unix_timestamp);
        if let Some(entry) = self.registry.get_mut(id) {
            entry.record = record.clone();
        }
        tracing::info!(job_id = id, "job finished");
        self.notify(JobEvent::Finished(record));
        self.schedule();
    }

    fn on_canceled(&mut self, id: JobId) {
        self.throttle.forget(id);
        if !self.queues.remove_everywhere(id) {
            return;
        }
        let announced = self
            .registry
            .remove(id)
            .is_some_and(|entry| entry.removal_announced);
        tracing::info!(job_id = id, "job canceled");
        self.notify(JobEvent::Canceled { id });
        if !announced {
            self.notify_set(JobSetChange::Removed(id));
        }
        self.schedule();
    }

    pub(super) fn on_api(&mut self, api: ApiCommand) {
        match api {
            ApiCommand::StartOrResume { id, restart } => self.start_or_resume(id, restart),
            ApiCommand::Pause(id) => {
                if let Some(entry) = self.registry.get_mut(id) {
                    entry.handle.pause();
                }
            }
            ApiCommand::Cancel(id) => {
                let Some(entry) = self.registry.get_mut(id) else {
                    return;
                };
                entry.handle.cancel();
                entry.removal_announced = true;
                self.notify_set(JobSetChange::Removed(id));
            }
            ApiCommand::Delete { id, delete_file } => self.delete(id, delete_file),
            ApiCommand::PauseAll => self.pause_all(),
            ApiCommand::StartAll => self.start_all(),
            ApiCommand::SetMaxRunning(n) => {
                if self.config.set_max_running(n) {
                    tracing::info!(max_running = n, "max running jobs changed");
                    self.schedule();
                }
            }
            ApiCommand::SetAllowDownload(allow) => {
                if self.config.set_allow_download(allow) {
                    tracing::info!(allow, "global download switch changed");
                    self.schedule();
                }
            }
            ApiCommand::SetSpeedLimit(limit) => {
                if self.config.set_speed_limit(limit) {
                    self.apply_speed_limits();
                }
            }
            ApiCommand::SetAvoidFrameDrop(enabled) => {
                self.throttle.set_enabled(enabled);
            }
            ApiCommand::SetProgressInterval(interval) => {
                self.throttle.set_interval(interval);
            }
        }
    }

    fn start_or_resume(&mut self, id: JobId, restart: bool) {
        let Some(entry) = self.registry.get(id) else {
            if restart {
                tracing::debug!(job_id = id, "job not registered, reloading from store");
                self.push_effect(Effect::Reload(id));
            }
            return;
        };
        let finished = entry.handle.state() == JobState::Finished;

        let was_paused = self.queues.paused.remove(id);
        let was_error = self.queues.error.remove(id);
        if !(was_paused || was_error || finished) {
            tracing::debug!(job_id = id, queue = ?self.queues.kind_of(id), "start request ignored");
            return;
        }

        if restart {
            if let Some(entry) = self.registry.get_mut(id) {
                entry.record.reset_progress();
                let record = entry.record.clone();
                self.notify(JobEvent::InfoUpdated(record));
            }
        }
        if !self.enqueue(id, restart, true) {
            // Handle refused; keep the job where it was.
            if was_paused {
                self.queues.paused.offer(id);
            } else if was_error {
                self.queues.error.offer(id);
            }
        }
    }

    fn start_all(&mut self) {
        let mut parked: Vec<(i64, JobId)> = self
            .registry
            .records()
            .filter(|r| self.queues.paused.contains(r.id) || self.queues.error.contains(r.id))
            .map(|r| (r.created_at, r.id))
            .collect();
        // Newest first, like the recovery order.
        parked.sort_by(|a, b| b.cmp(a));
        for (_, id) in parked {
            self.enqueue(id, false, false);
        }
        self.schedule();
    }

    fn delete(&mut self, id: JobId, delete_file: bool) {
        let Some(mut entry) = self.registry.remove(id) else {
            tracing::warn!(job_id = id, "delete of unregistered job, removing it from the store");
            self.push_effect(Effect::DeleteStored { id, delete_file });
            return;
        };
        self.queues.remove_everywhere(id);
        self.throttle.forget(id);
        entry.handle.delete(delete_file);
        tracing::info!(job_id = id, delete_file, "job deleted");
        self.notify_set(JobSetChange::Removed(id));
        self.schedule();
    }

    pub(super) fn on_submitted(&mut self, record: JobRecord) {
        let id = record.id;
        self.register(record.clone());
        self.queues.waiting.offer(id);
        tracing::info!(job_id = id, url = %record.url, "job submitted");
        self.notify_set(JobSetChange::Arrived(record));
        self.notify(JobEvent::Waiting { id });
        self.schedule();
    }

    pub(super) fn on_reloaded(&mut self, record: JobRecord) {
        let id = record.id;
        if !self.registry.contains(id) {
            self.register(record.clone());
            self.notify_set(JobSetChange::Arrived(record));
        }
        self.enqueue(id, true, true);
    }
}
