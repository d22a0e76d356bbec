//! Transfer-engine seam.
//!
//! The engine never moves bytes itself. For every job it asks a
//! [`TransferFactory`] for a [`TransferHandle`] and drives it with
//! start/yield/pause/cancel requests. The handle reports back through the
//! [`TransferEvents`] it was created with; every report is queued onto the
//! engine's serialized context and handled in arrival order.
//!
//! Handles must not block in any of their methods: they are called from the
//! serialized context. Pause and cancel are requests; the confirmation comes
//! later as a `paused` / `canceled` report and must arrive in bounded time,
//! otherwise the job stays parked outside every queue.

use tokio::sync::mpsc;

use crate::engine::Command;
use crate::resume_db::{JobId, JobRecord, JobState};

/// Per-job transfer driven by the scheduler.
pub trait TransferHandle: Send {
    /// Begin transferring. Returns false if the handle cannot start yet; a
    /// handle that still needs a probe request leaves its state at `Waiting`.
    fn start(&mut self) -> bool;

    /// Ask the transfer to stop; confirmed later by a `paused` report.
    fn pause(&mut self);

    /// Ask the transfer to stop for good; confirmed later by a `canceled` report.
    fn cancel(&mut self);

    /// Drop the transfer and its persisted record, and the file if `delete_file`.
    fn delete(&mut self, delete_file: bool);

    /// Yield back to the waiting state (stopping an active transfer first).
    /// `restart` discards previous progress. Returns false when the current
    /// state does not allow waiting.
    fn to_wait(&mut self, restart: bool) -> bool;

    fn state(&self) -> JobState;

    /// Bandwidth share for this job in bytes per second; `None` is unlimited.
    fn set_speed_limit(&mut self, limit: Option<u64>);
}

/// Builds transfer handles for recovered and newly submitted jobs.
pub trait TransferFactory: Send + Sync + 'static {
    fn create(&self, record: &JobRecord, events: TransferEvents) -> Box<dyn TransferHandle>;
}

/// A lifecycle report from a transfer handle.
#[derive(Debug, Clone)]
pub enum TransferEvent {
    Connecting,
    Progress { total: u64, downloaded: u64, bps: f64 },
    Started(JobRecord),
    Waiting,
    Stopping,
    Paused,
    Error { code: i32, message: Option<String>, fatal: bool },
    Finished(JobRecord),
    Canceled,
    InfoUpdated(JobRecord),
}

/// Sender a transfer handle uses to report its lifecycle.
///
/// Reports sent after the engine shut down are dropped.
#[derive(Debug, Clone)]
pub struct TransferEvents {
    id: JobId,
    tx: mpsc::UnboundedSender<Command>,
}

impl TransferEvents {
    pub(crate) fn new(id: JobId, tx: mpsc::UnboundedSender<Command>) -> Self {
        Self { id, tx }
    }

    pub fn job_id(&self) -> JobId {
        self.id
    }

    pub fn send(&self, event: TransferEvent) {
        if self.tx.send(Command::Transfer(self.id, event)).is_err() {
            tracing::debug!(job_id = self.id, "engine gone, transfer report dropped");
        }
    }

    pub fn connecting(&self) {
        self.send(TransferEvent::Connecting);
    }

    pub fn progress(&self, total: u64, downloaded: u64, bps: f64) {
        self.send(TransferEvent::Progress {
            total,
            downloaded,
            bps,
        });
    }

    pub fn started(&self, record: JobRecord) {
        self.send(TransferEvent::Started(record));
    }

    pub fn waiting(&self) {
        self.send(TransferEvent::Waiting);
    }

    pub fn stopping(&self) {
        self.send(TransferEvent::Stopping);
    }

    pub fn paused(&self) {
        self.send(TransferEvent::Paused);
    }

    pub fn error(&self, code: i32, message: Option<String>, fatal: bool) {
        self.send(TransferEvent::Error {
            code,
            message,
            fatal,
        });
    }

    pub fn finished(&self, record: JobRecord) {
        self.send(TransferEvent::Finished(record));
    }

    pub fn canceled(&self) {
        self.send(TransferEvent::Canceled);
    }

    pub fn info_updated(&self, record: JobRecord) {
        self.send(TransferEvent::InfoUpdated(record));
    }
}
