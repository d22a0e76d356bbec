//! Messages into the serialized context and the effects it hands back.

use std::time::Duration;

use tokio::sync::oneshot;

use crate::config::EngineConfig;
use crate::resume_db::{JobId, JobRecord};
use crate::transfer::TransferEvent;

use super::observer::Notification;
use super::queues::QueueSnapshot;
use super::recovery::RecoveredJobs;

/// Everything the serialized context reacts to.
#[derive(Debug)]
pub(crate) enum Command {
    /// Report from the transfer handle of a job.
    Transfer(JobId, TransferEvent),
    Api(ApiCommand),
    Query(Query),
    /// Startup load finished.
    Recovered(RecoveredJobs),
    /// A submitted record was inserted by the store.
    Submitted {
        record: JobRecord,
        reply: oneshot::Sender<JobRecord>,
    },
    /// A record re-read from the store for a restart.
    Reloaded(JobRecord),
    Shutdown,
}

/// Fire-and-forget API requests.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ApiCommand {
    StartOrResume { id: JobId, restart: bool },
    Pause(JobId),
    Cancel(JobId),
    Delete { id: JobId, delete_file: bool },
    PauseAll,
    StartAll,
    SetMaxRunning(usize),
    SetAllowDownload(bool),
    SetSpeedLimit(i64),
    SetAvoidFrameDrop(bool),
    SetProgressInterval(Duration),
}

impl ApiCommand {
    /// Requests that act on registered jobs or admission state wait for the
    /// startup load; they are deferred, in order, until it lands.
    pub(crate) fn needs_recovery(&self) -> bool {
        !matches!(
            self,
            ApiCommand::SetSpeedLimit(_)
                | ApiCommand::SetAvoidFrameDrop(_)
                | ApiCommand::SetProgressInterval(_)
        )
    }
}

/// Read-only requests answered over a oneshot.
#[derive(Debug)]
pub(crate) enum Query {
    Job {
        id: JobId,
        reply: oneshot::Sender<Option<JobRecord>>,
    },
    /// Every registered record, in no particular order.
    Jobs(oneshot::Sender<Vec<JobRecord>>),
    Queues(oneshot::Sender<QueueSnapshot>),
    Config(oneshot::Sender<EngineConfig>),
}

/// Side effects the actor performs after a command was applied.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Effect {
    Notify(Notification),
    /// Load the record from the store and send it back as `Command::Reloaded`.
    Reload(JobId),
    /// Remove a job that is not registered straight from the store.
    DeleteStored { id: JobId, delete_file: bool },
}
